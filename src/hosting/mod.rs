//! Narrow view of the source-control hosting API.
//!
//! The domain layer only talks to [`Hosting`]; [`gitlab::GitlabClient`] is the
//! production implementation and tests substitute in-memory fakes.

pub mod gitlab;

use chrono::{DateTime, FixedOffset};
use serde::Deserialize;

pub use gitlab::GitlabClient;

/// Transport-level failure talking to the hosting API.
#[derive(Debug, thiserror::Error)]
pub enum HostingError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("{url} answered with status {status}: {message}")]
    Status {
        status: u16,
        url: String,
        message: String,
    },

    #[error("could not decode response from {url}: {message}")]
    Decode { url: String, message: String },
}

impl HostingError {
    pub fn status(&self) -> Option<u16> {
        match self {
            HostingError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// GitLab refuses a duplicate tag with 409, or with 400 and an
    /// "already exists" message. Other 400s are bad requests.
    pub fn already_exists(&self) -> bool {
        match self {
            HostingError::Status { status: 409, .. } => true,
            HostingError::Status {
                status: 400,
                message,
                ..
            } => message.contains("already exists"),
            _ => false,
        }
    }
}

pub type HostingResult<T> = Result<T, HostingError>;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Project {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Branch {
    pub name: String,
}

/// One entry of a repository tree listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TreeEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub path: String,
}

impl TreeEntry {
    pub fn is_dir(&self) -> bool {
        self.kind == "tree"
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FileContent {
    pub content: String,
    #[serde(default)]
    pub encoding: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Commit {
    pub id: String,
    #[serde(default)]
    pub message: String,
    pub created_at: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TagRecord {
    pub name: String,
    #[serde(default)]
    pub message: Option<String>,
    pub commit: Commit,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MergeRequest {
    pub title: String,
    #[serde(default)]
    pub sha: Option<String>,
    #[serde(default)]
    pub merge_commit_sha: Option<String>,
    #[serde(default)]
    pub squash_commit_sha: Option<String>,
}

impl MergeRequest {
    /// True when any of the commits this merge request produced is `commit`.
    pub fn produced(&self, commit: &str) -> bool {
        [&self.merge_commit_sha, &self.squash_commit_sha, &self.sha]
            .into_iter()
            .flatten()
            .any(|sha| sha == commit)
    }
}

/// Filter for the merged-request listing used by the changelog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeRequestQuery {
    pub target_branch: String,
    pub created_after: DateTime<FixedOffset>,
    pub per_page: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTag {
    pub name: String,
    pub reference: String,
    pub message: String,
}

pub trait Hosting {
    /// Projects of a group, optionally narrowed by a server-side search.
    fn group_projects(&self, group: &str, search: Option<&str>) -> HostingResult<Vec<Project>>;

    fn branches(&self, project: &str) -> HostingResult<Vec<Branch>>;

    fn branch(&self, project: &str, name: &str) -> HostingResult<Branch>;

    /// Top level of the repository tree at `reference`.
    fn tree(&self, project: &str, reference: &str) -> HostingResult<Vec<TreeEntry>>;

    fn file(&self, project: &str, path: &str, reference: &str) -> HostingResult<FileContent>;

    /// Tags whose name matches `search`, newest version first.
    fn tags(&self, project: &str, search: &str) -> HostingResult<Vec<TagRecord>>;

    fn create_tag(&self, project: &str, tag: &NewTag) -> HostingResult<TagRecord>;

    /// One page (1-based) of merged requests.
    fn merge_requests(
        &self,
        project: &str,
        query: &MergeRequestQuery,
        page: u32,
    ) -> HostingResult<Vec<MergeRequest>>;
}
