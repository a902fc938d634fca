use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::Context;
use clap::Args;

use crate::bot::Bot;
use crate::chat::{TelegramTransport, Transport};
use crate::config::{self, Config};
use crate::error::ExitError;
use crate::hosting::Hosting;
use crate::hosting::gitlab::GitlabClient;

/// Pause after a failed poll before trying again.
const POLL_BACKOFF: Duration = Duration::from_secs(5);

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Path to tagrelease.toml
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl RunArgs {
    pub fn execute(&self) -> anyhow::Result<()> {
        let path = config::locate(self.config.as_deref())?;
        let config = Config::load(&path)?;
        config.validate()?;
        tracing::info!(config = %path.display(), group = %config.provider.group, "starting");

        let hosting = GitlabClient::new(
            &config.provider.host,
            &config.provider.token,
            Duration::from_secs(config.provider.timeout),
        );
        let projects = hosting
            .group_projects(&config.provider.group, None)
            .map_err(|e| ExitError::Hosting(e.to_string()))?;
        tracing::info!(services = projects.len(), "hosting reachable");
        let bot = Bot::new(&config, Box::new(hosting))?;

        let mut transport =
            TelegramTransport::new(&config.bot.api_base, &config.bot.token, config.bot.poll_timeout);
        let me = transport.whoami()?;
        tracing::info!(bot = %me, admins = config.bot.admins.len(), "connected");

        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        ctrlc::set_handler(move || {
            eprintln!("Received interrupt signal, finishing current poll...");
            flag.store(true, Ordering::SeqCst);
        })
        .context("installing Ctrl-C handler")?;

        serve(&bot, &mut transport, &stop, POLL_BACKOFF);
        tracing::info!("stopped");
        Ok(())
    }
}

/// Poll, dispatch and reply until `stop` is set. Messages are handled one at
/// a time in arrival order. Poll and send failures are logged, never fatal.
pub fn serve(bot: &Bot, transport: &mut dyn Transport, stop: &AtomicBool, backoff: Duration) {
    while !stop.load(Ordering::SeqCst) {
        let messages = match transport.poll() {
            Ok(messages) => messages,
            Err(e) => {
                tracing::warn!(error = %format!("{e:#}"), "poll failed, retrying");
                std::thread::sleep(backoff);
                continue;
            }
        };
        for message in messages {
            let Some(reply) = bot.handle(&message) else {
                continue;
            };
            if let Err(e) = transport.send(&reply) {
                tracing::error!(
                    error = %format!("{e:#}"),
                    chat = %reply.chat_id,
                    reply_to = ?reply.reply_to,
                    "failed to send reply"
                );
            }
        }
    }
}
