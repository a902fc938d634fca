//! Per-service fan-out with failure isolation.

use serde::Serialize;

use crate::error::DomainResult;

use super::service::{Service, Services};
use super::tag::Tag;

/// Outcome of a multi-service request, both lists in request order.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct BatchOutcome {
    pub succeeded: Vec<Tag>,
    pub failed: Vec<String>,
}

impl BatchOutcome {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Resolve every name and run `op` on it. A failure for one name is logged
/// and recorded; it never stops the rest of the batch.
pub fn run_batch<F>(services: &dyn Services, names: &[String], mut op: F) -> BatchOutcome
where
    F: FnMut(&Service) -> DomainResult<Tag>,
{
    let results: Vec<Result<Tag, String>> = names
        .iter()
        .map(|name| {
            services
                .service(name)
                .and_then(|service| op(&service))
                .map_err(|e| {
                    tracing::error!(service = %name, error = %e, "service failed");
                    name.clone()
                })
        })
        .collect();

    let mut outcome = BatchOutcome::default();
    for result in results {
        match result {
            Ok(tag) => outcome.succeeded.push(tag),
            Err(name) => outcome.failed.push(name),
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::service::GroupServices;
    use crate::domain::tags::Tags;
    use crate::domain::testing::{FakeHosting, tag_record};
    use crate::error::DomainError;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn failed_resolution_does_not_abort_batch() {
        let mut hosting = FakeHosting::default().with_projects(&[(1, "a"), (3, "c")]);
        hosting.tags = vec![tag_record("1.0.0", "c1")];
        let services = GroupServices::new(&hosting, "platform", "_");
        let tags = Tags::new(&hosting);

        let outcome = run_batch(&services, &names(&["a", "b", "c"]), |svc| {
            tags.build_new(&svc.id, "develop", "1.0.*")
                .map(|tag| tag.in_repo(&svc.name))
        });

        let built: Vec<&str> = outcome.succeeded.iter().map(|t| t.repo.as_str()).collect();
        assert_eq!(built, vec!["a", "c"]);
        assert_eq!(outcome.failed, vec!["b"]);
        assert!(!outcome.is_clean());
    }

    #[test]
    fn operation_failures_are_collected_in_order() {
        let hosting = FakeHosting::default().with_projects(&[(1, "a"), (2, "b"), (3, "c")]);
        let services = GroupServices::new(&hosting, "platform", "_");

        let outcome = run_batch(&services, &names(&["c", "a", "b"]), |svc| {
            Err(DomainError::NotFound(svc.name.clone()))
        });
        assert!(outcome.succeeded.is_empty());
        assert_eq!(outcome.failed, vec!["c", "a", "b"]);
    }
}
