use crate::error::DomainError;

/// Operations a chat message can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Help,
    Echo,
    ListServices,
    ListStands,
    ListStandServices,
    BuildTags,
    ListCurrentTags,
}

impl Command {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Help => "help",
            Self::Echo => "echo",
            Self::ListServices => "list-services",
            Self::ListStands => "list-stands",
            Self::ListStandServices => "list-stand-services",
            Self::BuildTags => "build-tags",
            Self::ListCurrentTags => "list-current-tags",
        }
    }

    /// Commands that write to the hosting system.
    pub const fn mutates(self) -> bool {
        matches!(self, Self::BuildTags)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Failure {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("rendering reply: {0}")]
    Render(#[from] minijinja::Error),
}

impl Failure {
    /// Short text safe to show in the chat.
    pub fn user_message(&self) -> String {
        match self {
            Failure::Domain(DomainError::Resolution { context, .. }) => {
                format!("{context}: hosting API request failed")
            }
            Failure::Domain(e) => e.to_string(),
            Failure::Render(_) => "internal error while formatting the reply".to_string(),
        }
    }
}

/// A command that aborted, with who asked for it and where.
#[derive(Debug, thiserror::Error)]
#[error("{command} requested by {user} ({user_id}) in chat {chat} failed: {source}")]
pub struct CommandError {
    pub command: &'static str,
    pub user: String,
    pub user_id: String,
    pub chat: String,
    #[source]
    pub source: Failure,
}
