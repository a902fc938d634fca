use std::process::ExitCode;

use crate::domain::version::VersionError;

/// Errors that cause tagrelease to exit with a specific code.
#[derive(Debug, thiserror::Error)]
pub enum ExitError {
    #[error("config error: {0}")]
    Config(String),

    #[error("hosting api unreachable: {0}")]
    Hosting(String),

    #[error("chat transport failed: {0}")]
    Transport(String),

    #[error("{message}")]
    WithCode { code: u8, message: String },

    #[error("{0}")]
    Other(String),
}

impl ExitError {
    pub fn new(code: u8, message: String) -> Self {
        ExitError::WithCode { code, message }
    }

    pub fn exit_code(&self) -> ExitCode {
        match self {
            ExitError::Config(_) => ExitCode::from(2),
            ExitError::Hosting(_) => ExitCode::from(3),
            ExitError::Transport(_) => ExitCode::from(4),
            ExitError::WithCode { code, .. } => ExitCode::from(*code),
            ExitError::Other(_) => ExitCode::from(1),
        }
    }
}

/// Failures of the service, stand and tag resolvers.
///
/// `Resolution` means the hosting API could not be asked (network, status,
/// malformed payload). `NotFound` means it answered and had nothing matching.
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("{context}: {source}")]
    Resolution {
        context: String,
        #[source]
        source: crate::hosting::HostingError,
    },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Version(#[from] VersionError),

    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
}

impl DomainError {
    pub fn resolution(context: impl Into<String>, source: crate::hosting::HostingError) -> Self {
        DomainError::Resolution {
            context: context.into(),
            source,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DomainError::NotFound(_))
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hosting::HostingError;

    #[test]
    fn exit_codes_are_distinct() {
        let codes = [
            ExitError::Config("x".into()).exit_code(),
            ExitError::Hosting("x".into()).exit_code(),
            ExitError::Transport("x".into()).exit_code(),
            ExitError::Other("x".into()).exit_code(),
        ]
        .map(|code| format!("{code:?}"));
        for (i, a) in codes.iter().enumerate() {
            for b in codes.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
        assert_eq!(
            format!("{:?}", ExitError::new(9, "boom".into()).exit_code()),
            format!("{:?}", ExitCode::from(9))
        );
    }

    #[test]
    fn resolution_keeps_context_and_source() {
        let err = DomainError::resolution(
            "fetching tags for 12",
            HostingError::Status {
                status: 502,
                url: "http://h/x".into(),
                message: "Bad Gateway".into(),
            },
        );
        let text = err.to_string();
        assert!(text.starts_with("fetching tags for 12"));
        assert!(text.contains("502"));
        assert!(!err.is_not_found());
        assert!(DomainError::NotFound("svc".into()).is_not_found());
    }
}
