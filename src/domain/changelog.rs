//! Best-effort changelog built from merged requests since the previous tag.

use chrono::{DateTime, FixedOffset};

use crate::error::{DomainError, DomainResult};
use crate::hosting::{Hosting, MergeRequestQuery};

pub const PAGE_SIZE: u32 = 20;
pub const MAX_PAGES: u32 = 5;
pub const TITLE_LIMIT: usize = 30;
const ELLIPSIS: &str = "...";

pub struct Changelog<'a> {
    hosting: &'a dyn Hosting,
    max_pages: u32,
}

impl<'a> Changelog<'a> {
    pub fn new(hosting: &'a dyn Hosting) -> Self {
        Self {
            hosting,
            max_pages: MAX_PAGES,
        }
    }

    /// One line per merged request newer than `from_commit`.
    ///
    /// Scanning stops at the request that produced `from_commit`; it and
    /// everything after it in the listing are excluded. If the boundary is
    /// not found within the page cap, whatever was collected is returned.
    pub fn summarize(
        &self,
        project: &str,
        from_commit: &str,
        created_after: DateTime<FixedOffset>,
        target_branch: &str,
    ) -> DomainResult<String> {
        let query = MergeRequestQuery {
            target_branch: target_branch.to_string(),
            created_after,
            per_page: PAGE_SIZE,
        };
        let mut summary = String::new();
        for page in 1..=self.max_pages {
            let requests = self
                .hosting
                .merge_requests(project, &query, page)
                .map_err(|e| {
                    DomainError::resolution(
                        format!("listing merge requests of '{project}' (page {page})"),
                        e,
                    )
                })?;
            for mr in &requests {
                if mr.produced(from_commit) {
                    tracing::debug!(project, page, "changelog boundary found");
                    return Ok(summary);
                }
                summary.push_str(&shorten(&mr.title));
                summary.push('\n');
            }
            if requests.is_empty() {
                break;
            }
        }
        tracing::debug!(project, from_commit, "changelog boundary not reached");
        Ok(summary)
    }
}

/// Titles of `TITLE_LIMIT` characters or more are cut and marked.
fn shorten(title: &str) -> String {
    if title.chars().count() >= TITLE_LIMIT {
        let mut cut: String = title.chars().take(TITLE_LIMIT).collect();
        cut.push_str(ELLIPSIS);
        cut
    } else {
        title.to_string()
    }
}
