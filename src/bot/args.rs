//! Brace-delimited command arguments: `{a,b}`, `{v4.3.*}`, `{develop}`.

use crate::error::{DomainError, DomainResult};

/// Contents of every `{...}` group, in order, untrimmed.
pub fn braced(text: &str) -> Vec<&str> {
    let mut groups = Vec::new();
    let mut rest = text;
    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else { break };
        groups.push(&after[..close]);
        rest = &after[close + 1..];
    }
    groups
}

/// Split a `a, b,,a` list into unique, non-empty names in first-seen order.
pub fn names(list: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for name in list.split(',').map(str::trim).filter(|n| !n.is_empty()) {
        if !out.iter().any(|seen| seen == name) {
            out.push(name.to_string());
        }
    }
    out
}

/// Arguments of the multi-service tag commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRequest {
    pub services: Vec<String>,
    pub pattern: String,
    pub branch: String,
}

impl TagRequest {
    /// `{services} ... {pattern} [... {branch}]`. A missing or blank branch
    /// falls back to `default_branch`.
    pub fn parse(text: &str, default_branch: &str) -> DomainResult<Self> {
        let groups = braced(text);
        let (Some(list), Some(pattern)) = (groups.first(), groups.get(1)) else {
            return Err(DomainError::InvalidArguments(
                "expected {services} and {prefix}".to_string(),
            ));
        };
        let services = names(list);
        if services.is_empty() {
            return Err(DomainError::InvalidArguments("no services given".to_string()));
        }
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return Err(DomainError::InvalidArguments("empty prefix".to_string()));
        }
        let branch = groups
            .get(2)
            .map(|b| b.trim())
            .filter(|b| !b.is_empty())
            .unwrap_or(default_branch);
        Ok(Self {
            services,
            pattern: pattern.to_string(),
            branch: branch.to_string(),
        })
    }
}

/// The single `{stand}` argument.
pub fn stand(text: &str) -> DomainResult<String> {
    braced(text)
        .first()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| DomainError::InvalidArguments("expected {stand}".to_string()))
}
