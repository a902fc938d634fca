//! Stands (deployment environments). Each stand is a branch of the release
//! project; its services are the directories on that branch.

use crate::error::{DomainError, DomainResult};
use crate::hosting::Hosting;

use super::service::BranchServices;

/// A stand whose branch is known and whose services are fetched on demand.
pub struct Stand<'a> {
    name: String,
    hosting: &'a dyn Hosting,
    project: &'a str,
    hidden_prefix: &'a str,
}

impl<'a> Stand<'a> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn services(&self) -> BranchServices<'a> {
        BranchServices::new(self.hosting, self.project, &self.name, self.hidden_prefix)
    }
}

impl std::fmt::Debug for Stand<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stand").field("name", &self.name).finish()
    }
}

pub trait Stands<'a> {
    fn stands(&self) -> DomainResult<Vec<Stand<'a>>>;

    fn stand(&self, name: &str) -> DomainResult<Stand<'a>>;
}

/// Stands backed by the branches of the release project.
pub struct ReleaseStands<'a> {
    hosting: &'a dyn Hosting,
    project: &'a str,
    hidden_prefix: &'a str,
}

impl<'a> ReleaseStands<'a> {
    pub fn new(hosting: &'a dyn Hosting, project: &'a str, hidden_prefix: &'a str) -> Self {
        Self {
            hosting,
            project,
            hidden_prefix,
        }
    }

    fn stand_for(&self, branch: String) -> Stand<'a> {
        Stand {
            name: branch,
            hosting: self.hosting,
            project: self.project,
            hidden_prefix: self.hidden_prefix,
        }
    }
}

impl<'a> Stands<'a> for ReleaseStands<'a> {
    fn stands(&self) -> DomainResult<Vec<Stand<'a>>> {
        let branches = self.hosting.branches(self.project).map_err(|e| {
            DomainError::resolution(format!("listing stands of project '{}'", self.project), e)
        })?;
        Ok(branches
            .into_iter()
            .map(|b| self.stand_for(b.name))
            .collect())
    }

    fn stand(&self, name: &str) -> DomainResult<Stand<'a>> {
        match self.hosting.branch(self.project, name) {
            Ok(branch) => Ok(self.stand_for(branch.name)),
            Err(e) if e.status() == Some(404) => {
                Err(DomainError::NotFound(format!("no stand '{name}'")))
            }
            Err(e) => Err(DomainError::resolution(format!("fetching stand '{name}'"), e)),
        }
    }
}
