use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::hosting::TagRecord;

/// A release tag as seen by the bot. The hosting system owns the real one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    pub repo: String,
    pub name: String,
    pub branch: String,
    pub from_commit: String,
    pub message: String,
    pub created: DateTime<FixedOffset>,
}

impl Tag {
    /// Build from a hosting record. The message is the commit message,
    /// matching what the tag listing exposes.
    pub fn from_record(repo: &str, branch: &str, record: &TagRecord) -> Self {
        Self {
            repo: repo.to_string(),
            name: record.name.clone(),
            branch: branch.to_string(),
            from_commit: record.commit.id.clone(),
            message: record.commit.message.clone(),
            created: record.commit.created_at,
        }
    }

    /// Same tag relabelled with a human-facing repository name.
    pub fn in_repo(self, repo: &str) -> Self {
        Self {
            repo: repo.to_string(),
            ..self
        }
    }
}
