//! In-memory hosting fake shared by the domain and bot tests.

use std::cell::RefCell;
use std::collections::HashMap;

use base64::Engine as _;
use chrono::{DateTime, FixedOffset};

use crate::hosting::{
    Branch, Commit, FileContent, Hosting, HostingError, HostingResult, MergeRequest,
    MergeRequestQuery, NewTag, Project, TagRecord, TreeEntry,
};

pub fn timestamp() -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339("2024-04-01T09:00:00+03:00").expect("valid timestamp")
}

pub fn mr(title: &str, merge_sha: &str) -> MergeRequest {
    MergeRequest {
        title: title.to_string(),
        sha: None,
        merge_commit_sha: Some(merge_sha.to_string()),
        squash_commit_sha: None,
    }
}

pub fn tag_record(name: &str, commit: &str) -> TagRecord {
    TagRecord {
        name: name.to_string(),
        message: None,
        commit: Commit {
            id: commit.to_string(),
            message: format!("commit {commit}"),
            created_at: timestamp(),
        },
    }
}

fn unavailable(what: &str) -> HostingError {
    HostingError::Status {
        status: 503,
        url: format!("fake://{what}"),
        message: "Service Unavailable".to_string(),
    }
}

#[derive(Default)]
pub struct FakeHosting {
    pub projects: Vec<Project>,
    pub fail_projects: bool,
    pub branches: Vec<String>,
    pub tree: Vec<TreeEntry>,
    pub files: HashMap<String, String>,
    pub tags: Vec<TagRecord>,
    pub fail_tags: bool,
    pub merge_pages: Vec<Vec<MergeRequest>>,
    pub fail_merge_requests: bool,
    /// Status and GitLab message returned by `create_tag`.
    pub create_rejection: Option<(u16, String)>,
    calls: RefCell<Calls>,
}

#[derive(Default)]
struct Calls {
    tree_refs: Vec<String>,
    tag_searches: Vec<String>,
    pages: Vec<u32>,
    created: Vec<NewTag>,
}

impl FakeHosting {
    pub fn with_projects(mut self, projects: &[(u64, &str)]) -> Self {
        self.projects = projects
            .iter()
            .map(|(id, name)| Project {
                id: *id,
                name: (*name).to_string(),
                path: (*name).to_string(),
            })
            .collect();
        self
    }

    pub fn failing_projects(mut self) -> Self {
        self.fail_projects = true;
        self
    }

    pub fn tree_calls(&self) -> usize {
        self.calls.borrow().tree_refs.len()
    }

    pub fn tree_refs(&self) -> Vec<String> {
        self.calls.borrow().tree_refs.clone()
    }

    pub fn tag_searches(&self) -> Vec<String> {
        self.calls.borrow().tag_searches.clone()
    }

    pub fn pages_fetched(&self) -> Vec<u32> {
        self.calls.borrow().pages.clone()
    }

    pub fn created_tags(&self) -> Vec<NewTag> {
        self.calls.borrow().created.clone()
    }
}

impl Hosting for FakeHosting {
    fn group_projects(&self, _group: &str, search: Option<&str>) -> HostingResult<Vec<Project>> {
        if self.fail_projects {
            return Err(unavailable("projects"));
        }
        Ok(self
            .projects
            .iter()
            .filter(|p| search.is_none_or(|s| p.name.contains(s)))
            .cloned()
            .collect())
    }

    fn branches(&self, _project: &str) -> HostingResult<Vec<Branch>> {
        Ok(self
            .branches
            .iter()
            .map(|name| Branch { name: name.clone() })
            .collect())
    }

    fn branch(&self, _project: &str, name: &str) -> HostingResult<Branch> {
        if self.branches.iter().any(|b| b == name) {
            Ok(Branch {
                name: name.to_string(),
            })
        } else {
            Err(HostingError::Status {
                status: 404,
                url: format!("fake://branches/{name}"),
                message: "404 Branch Not Found".to_string(),
            })
        }
    }

    fn tree(&self, _project: &str, reference: &str) -> HostingResult<Vec<TreeEntry>> {
        self.calls.borrow_mut().tree_refs.push(reference.to_string());
        Ok(self.tree.clone())
    }

    fn file(&self, _project: &str, path: &str, _reference: &str) -> HostingResult<FileContent> {
        match self.files.get(path) {
            Some(content) => Ok(FileContent {
                content: base64::engine::general_purpose::STANDARD.encode(content),
                encoding: "base64".to_string(),
            }),
            None => Err(HostingError::Status {
                status: 404,
                url: format!("fake://files/{path}"),
                message: "404 File Not Found".to_string(),
            }),
        }
    }

    fn tags(&self, _project: &str, search: &str) -> HostingResult<Vec<TagRecord>> {
        self.calls.borrow_mut().tag_searches.push(search.to_string());
        if self.fail_tags {
            return Err(unavailable("tags"));
        }
        let prefix = search.trim_start_matches('^');
        Ok(self
            .tags
            .iter()
            .filter(|t| t.name.starts_with(prefix))
            .cloned()
            .collect())
    }

    fn create_tag(&self, _project: &str, tag: &NewTag) -> HostingResult<TagRecord> {
        if let Some((status, message)) = &self.create_rejection {
            return Err(HostingError::Status {
                status: *status,
                url: "fake://tags".to_string(),
                message: message.clone(),
            });
        }
        self.calls.borrow_mut().created.push(tag.clone());
        Ok(tag_record(&tag.name, &tag.reference))
    }

    fn merge_requests(
        &self,
        _project: &str,
        _query: &MergeRequestQuery,
        page: u32,
    ) -> HostingResult<Vec<MergeRequest>> {
        self.calls.borrow_mut().pages.push(page);
        if self.fail_merge_requests {
            return Err(unavailable("merge_requests"));
        }
        Ok(self
            .merge_pages
            .get(page as usize - 1)
            .cloned()
            .unwrap_or_default())
    }
}
