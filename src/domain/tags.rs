//! Tag workflow: find the current tag for a pattern and cut the next one.

use crate::error::{DomainError, DomainResult};
use crate::hosting::{Hosting, NewTag};

use super::changelog::Changelog;
use super::tag::Tag;
use super::version;

/// Upper bound on the tag message length, in characters.
pub const MESSAGE_LIMIT: usize = 5000;
const MESSAGE_CONTINUATION: &str = "\n...";

pub struct Tags<'a> {
    hosting: &'a dyn Hosting,
}

impl<'a> Tags<'a> {
    pub fn new(hosting: &'a dyn Hosting) -> Self {
        Self { hosting }
    }

    /// Most recent tag (by version) whose name starts with the literal
    /// prefix of `pattern`.
    pub fn current(&self, service_id: &str, branch: &str, pattern: &str) -> DomainResult<Tag> {
        let search = format!("^{}", version::literal_prefix(pattern));
        let records = self.hosting.tags(service_id, &search).map_err(|e| {
            DomainError::resolution(
                format!("fetching tags with prefix '{pattern}' for service '{service_id}'"),
                e,
            )
        })?;
        // TODO: check that the tag commit is reachable from `branch` once the
        // hosting trait exposes commit refs.
        let latest = records.first().ok_or_else(|| {
            DomainError::NotFound(format!(
                "no tag with prefix '{pattern}' for service '{service_id}'"
            ))
        })?;
        Ok(Tag::from_record(service_id, branch, latest))
    }

    /// Create the tag that follows the current one.
    ///
    /// The new tag points at the commit of the current tag. Changelog
    /// failures only cost the message body; creation still proceeds.
    pub fn build_new(&self, service_id: &str, branch: &str, pattern: &str) -> DomainResult<Tag> {
        let span = tracing::info_span!("build_tag", service = service_id, branch, pattern);
        let _enter = span.enter();

        tracing::debug!(state = "resolving-current");
        let current = self.current(service_id, branch, pattern)?;

        tracing::debug!(state = "computing-next", current = %current.name);
        let next = version::next(&current.name, pattern)?;

        tracing::debug!(state = "collecting-changelog", next = %next);
        let changes = match Changelog::new(self.hosting).summarize(
            service_id,
            &current.from_commit,
            current.created,
            &current.branch,
        ) {
            Ok(changes) => changes,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    from = %current.name,
                    to = %next,
                    "failed to collect merge requests, tagging without changelog"
                );
                String::new()
            }
        };
        let message = tag_message(&current.name, &next, &changes);

        tracing::debug!(state = "creating");
        let created = self
            .hosting
            .create_tag(
                service_id,
                &NewTag {
                    name: next.clone(),
                    reference: current.from_commit.clone(),
                    message: message.clone(),
                },
            )
            .map_err(|e| {
                if e.already_exists() {
                    return DomainError::Conflict(format!(
                        "tag '{next}' already exists for service '{service_id}'"
                    ));
                }
                DomainError::resolution(
                    format!(
                        "creating tag '{next}' for service '{service_id}' from '{}'",
                        current.name
                    ),
                    e,
                )
            })?;

        tracing::info!(state = "done", tag = %created.name, commit = %created.commit.id, "tag created");
        Ok(Tag {
            repo: service_id.to_string(),
            name: created.name,
            branch: branch.to_string(),
            from_commit: created.commit.id,
            message,
            created: created.commit.created_at,
        })
    }
}

fn tag_message(current: &str, next: &str, changes: &str) -> String {
    let message =
        format!("Generated automatically.\nChanges '{current}' -> '{next}':\n{changes}");
    truncate_message(message)
}

fn truncate_message(message: String) -> String {
    if message.chars().count() <= MESSAGE_LIMIT {
        return message;
    }
    let keep = MESSAGE_LIMIT - MESSAGE_CONTINUATION.chars().count();
    let mut cut: String = message.chars().take(keep).collect();
    cut.push_str(MESSAGE_CONTINUATION);
    cut
}
