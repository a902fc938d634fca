//! Service resolution: group projects, and the services deployed on a stand.

use base64::Engine as _;
use serde::Serialize;

use crate::error::{DomainError, DomainResult};
use crate::hosting::{Hosting, HostingError, Project};

/// Default prefix of directories and projects that are not services.
pub const HIDDEN_PREFIX: &str = "_";

/// File inside a service directory that records the deployed image.
const VALUES_FILE: &str = "values.yaml";

/// A deployable unit. `id` is what the hosting API addresses it by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Service {
    pub id: String,
    pub name: String,
    pub tag: String,
}

pub trait Services {
    fn services(&self) -> DomainResult<Vec<Service>>;

    /// Exactly one service named `name`, or `NotFound`.
    fn service(&self, name: &str) -> DomainResult<Service>;
}

/// Every project of a hosting group is a service.
pub struct GroupServices<'a> {
    hosting: &'a dyn Hosting,
    group: &'a str,
    hidden_prefix: &'a str,
}

impl<'a> GroupServices<'a> {
    pub fn new(hosting: &'a dyn Hosting, group: &'a str, hidden_prefix: &'a str) -> Self {
        Self {
            hosting,
            group,
            hidden_prefix,
        }
    }

    fn visible(&self, project: &Project) -> bool {
        let key = if project.path.is_empty() {
            &project.name
        } else {
            &project.path
        };
        self.hidden_prefix.is_empty() || !key.starts_with(self.hidden_prefix)
    }
}

fn from_project(project: Project) -> Service {
    Service {
        id: project.id.to_string(),
        name: project.name,
        tag: String::new(),
    }
}

impl Services for GroupServices<'_> {
    fn services(&self) -> DomainResult<Vec<Service>> {
        let projects = self.hosting.group_projects(self.group, None).map_err(|e| {
            DomainError::resolution(format!("listing services of group '{}'", self.group), e)
        })?;
        Ok(projects
            .into_iter()
            .filter(|p| self.visible(p))
            .map(from_project)
            .collect())
    }

    fn service(&self, name: &str) -> DomainResult<Service> {
        let projects = self
            .hosting
            .group_projects(self.group, Some(name))
            .map_err(|e| DomainError::resolution(format!("looking up service '{name}'"), e))?;
        // search is a substring match server-side
        projects
            .into_iter()
            .find(|p| p.name == name && self.visible(p))
            .map(from_project)
            .ok_or_else(|| {
                DomainError::NotFound(format!("no service '{name}' in group '{}'", self.group))
            })
    }
}

/// Services deployed on one branch of the release project: its top-level,
/// non-hidden directories.
pub struct BranchServices<'a> {
    hosting: &'a dyn Hosting,
    project: &'a str,
    branch: String,
    hidden_prefix: &'a str,
}

impl<'a> BranchServices<'a> {
    pub fn new(
        hosting: &'a dyn Hosting,
        project: &'a str,
        branch: impl Into<String>,
        hidden_prefix: &'a str,
    ) -> Self {
        Self {
            hosting,
            project,
            branch: branch.into(),
            hidden_prefix,
        }
    }

    fn hidden(&self, name: &str) -> bool {
        !self.hidden_prefix.is_empty() && name.starts_with(self.hidden_prefix)
    }

    /// Read `image.tag` from the service's values file. A missing file or
    /// key yields `None`.
    fn deployed_tag(&self, name: &str) -> DomainResult<Option<String>> {
        let path = format!("{name}/{VALUES_FILE}");
        let file = match self.hosting.file(self.project, &path, &self.branch) {
            Ok(file) => file,
            Err(e) if e.status() == Some(404) => return Ok(None),
            Err(e) => {
                return Err(DomainError::resolution(
                    format!("reading {path} on '{}'", self.branch),
                    e,
                ));
            }
        };
        let raw = if file.encoding == "base64" {
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(file.content.replace('\n', ""))
                .map_err(|e| decode_error(&path, e.to_string()))?;
            String::from_utf8(bytes).map_err(|e| decode_error(&path, e.to_string()))?
        } else {
            file.content
        };
        image_tag(&raw).map_err(|message| decode_error(&path, message))
    }
}

fn decode_error(path: &str, message: String) -> DomainError {
    DomainError::resolution(
        format!("parsing {path}"),
        HostingError::Decode {
            url: path.to_string(),
            message,
        },
    )
}

/// Extract `image.tag` from a Helm-style values document.
fn image_tag(yaml: &str) -> Result<Option<String>, String> {
    let doc: serde_yaml::Value = serde_yaml::from_str(yaml).map_err(|e| e.to_string())?;
    let tag = doc.get("image").and_then(|image| image.get("tag"));
    Ok(match tag {
        Some(serde_yaml::Value::String(s)) => Some(s.clone()),
        Some(serde_yaml::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

impl Services for BranchServices<'_> {
    fn services(&self) -> DomainResult<Vec<Service>> {
        let entries = self.hosting.tree(self.project, &self.branch).map_err(|e| {
            DomainError::resolution(format!("listing services on '{}'", self.branch), e)
        })?;
        let mut services = Vec::new();
        for entry in entries {
            if !entry.is_dir() || self.hidden(&entry.name) {
                continue;
            }
            let tag = self.deployed_tag(&entry.name)?.unwrap_or_default();
            let id = if entry.path.is_empty() {
                entry.name.clone()
            } else {
                entry.path
            };
            services.push(Service {
                id,
                name: entry.name,
                tag,
            });
        }
        Ok(services)
    }

    fn service(&self, name: &str) -> DomainResult<Service> {
        let not_found = || DomainError::NotFound(format!("no service '{name}' on '{}'", self.branch));
        if self.hidden(name) {
            return Err(not_found());
        }
        if let Some(tag) = self.deployed_tag(name)? {
            return Ok(Service {
                id: name.to_string(),
                name: name.to_string(),
                tag,
            });
        }
        // no values file: still a service if the directory exists
        let entries = self.hosting.tree(self.project, &self.branch).map_err(|e| {
            DomainError::resolution(format!("looking up service '{name}' on '{}'", self.branch), e)
        })?;
        entries
            .into_iter()
            .find(|entry| entry.is_dir() && entry.name == name)
            .map(|entry| Service {
                id: if entry.path.is_empty() {
                    entry.name.clone()
                } else {
                    entry.path
                },
                name: entry.name,
                tag: String::new(),
            })
            .ok_or_else(not_found)
    }
}
