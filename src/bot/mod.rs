//! Chat commands: route a message, run the command against the hosting
//! system, and render the reply.

pub mod args;
mod command;
mod render;

pub use command::{Command, CommandError, Failure};
pub use render::Renderer;

use anyhow::Context;

use crate::chat::{Incoming, Reply};
use crate::config::{Config, ProviderConfig};
use crate::domain::{
    BatchOutcome, GroupServices, ReleaseStands, Services, Stands, Tags, run_batch,
};
use crate::hosting::Hosting;
use crate::routing::{Router, default_router};

use args::TagRequest;

pub struct Bot {
    router: Router<Command>,
    hosting: Box<dyn Hosting>,
    provider: ProviderConfig,
    renderer: Renderer,
}

impl Bot {
    pub fn new(config: &Config, hosting: Box<dyn Hosting>) -> anyhow::Result<Self> {
        let router = default_router(&config.bot).context("compiling command table")?;
        Self::with_router(router, hosting, config.provider.clone())
    }

    pub fn with_router(
        router: Router<Command>,
        hosting: Box<dyn Hosting>,
        provider: ProviderConfig,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            router,
            hosting,
            provider,
            renderer: Renderer::new().context("loading reply templates")?,
        })
    }

    /// Reply to `message`, or `None` when no command matches it.
    pub fn handle(&self, message: &Incoming) -> Option<Reply> {
        let Some(&command) = self.router.route(message) else {
            tracing::trace!(chat = %message.chat_id, "no command matched");
            return None;
        };

        let span = tracing::info_span!(
            "command",
            name = command.name(),
            user = %message.sender_name,
            user_id = %message.sender_id,
            chat = %message.chat_id,
        );
        let _enter = span.enter();
        tracing::info!(text = %message.text, mutates = command.mutates(), "handling");

        match self.execute(command, message) {
            Ok(text) => Some(Reply::markdown_to(message, text)),
            Err(source) => {
                let summary = source.user_message();
                let err = CommandError {
                    command: command.name(),
                    user: message.sender_name.clone(),
                    user_id: message.sender_id.clone(),
                    chat: message.chat_id.clone(),
                    source,
                };
                tracing::error!(error = %err, "command failed");
                Some(Reply::plain_to(message, format!("Error: {summary}")))
            }
        }
    }

    fn execute(&self, command: Command, message: &Incoming) -> Result<String, Failure> {
        let provider = &self.provider;
        match command {
            Command::Help => Ok(self.renderer.help(&provider.default_branch)?),
            Command::Echo => Ok(self.renderer.echo(message)?),
            Command::ListServices => {
                let services = self.group_services().services()?;
                Ok(self.renderer.services(None, &services)?)
            }
            Command::ListStands => {
                let stands: Vec<String> = self
                    .release_stands()
                    .stands()?
                    .iter()
                    .map(|s| s.name().to_string())
                    .collect();
                Ok(self.renderer.stands(&stands)?)
            }
            Command::ListStandServices => {
                let name = args::stand(&message.text)?;
                let stand = self.release_stands().stand(&name)?;
                let services = stand.services().services()?;
                Ok(self.renderer.services(Some(stand.name()), &services)?)
            }
            Command::BuildTags => {
                let request = TagRequest::parse(&message.text, &provider.default_branch)?;
                let outcome = self.build_tags(&request);
                Ok(self.renderer.tags("Created tags", &outcome)?)
            }
            Command::ListCurrentTags => {
                let request = TagRequest::parse(&message.text, &provider.default_branch)?;
                let outcome = self.current_tags(&request);
                Ok(self.renderer.tags("Current tags", &outcome)?)
            }
        }
    }

    fn group_services(&self) -> GroupServices<'_> {
        GroupServices::new(
            self.hosting.as_ref(),
            &self.provider.group,
            &self.provider.hidden_prefix,
        )
    }

    fn release_stands(&self) -> ReleaseStands<'_> {
        ReleaseStands::new(
            self.hosting.as_ref(),
            &self.provider.release,
            &self.provider.hidden_prefix,
        )
    }

    fn build_tags(&self, request: &TagRequest) -> BatchOutcome {
        let tags = Tags::new(self.hosting.as_ref());
        let outcome = run_batch(&self.group_services(), &request.services, |service| {
            tags.build_new(&service.id, &request.branch, &request.pattern)
                .map(|tag| tag.in_repo(&service.name))
        });
        if outcome.is_clean() {
            tracing::info!(created = outcome.succeeded.len(), pattern = %request.pattern, "tag build finished");
        } else {
            tracing::warn!(
                created = outcome.succeeded.len(),
                failed = ?outcome.failed,
                pattern = %request.pattern,
                "tag build finished with failures"
            );
        }
        outcome
    }

    fn current_tags(&self, request: &TagRequest) -> BatchOutcome {
        let tags = Tags::new(self.hosting.as_ref());
        run_batch(&self.group_services(), &request.services, |service| {
            tags.current(&service.id, &request.branch, &request.pattern)
                .map(|tag| tag.in_repo(&service.name))
        })
    }
}
