//! Telegram Bot API long-poll transport.

use std::time::Duration;

use anyhow::{Context, bail};
use serde::Deserialize;

use super::{Incoming, Reply, Transport};
use crate::error::ExitError;

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    #[serde(default)]
    message: Option<Message>,
}

#[derive(Debug, Deserialize)]
struct Message {
    message_id: i64,
    #[serde(default)]
    from: Option<User>,
    chat: Chat,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct User {
    id: i64,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    first_name: String,
}

#[derive(Debug, Deserialize)]
struct Chat {
    id: i64,
}

pub struct TelegramTransport {
    agent: ureq::Agent,
    endpoint: String,
    poll_timeout: u64,
    offset: i64,
}

impl TelegramTransport {
    pub fn new(api_base: &str, token: &str, poll_timeout: u64) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(poll_timeout.saturating_add(10))))
            .build()
            .into();
        Self {
            agent,
            endpoint: format!("{}/bot{token}", api_base.trim_end_matches('/')),
            poll_timeout,
            offset: 0,
        }
    }

    /// Resolve the bot's own username. Used as a startup credential check.
    pub fn whoami(&self) -> anyhow::Result<String> {
        let body = self
            .agent
            .get(&format!("{}/getMe", self.endpoint))
            .call()
            .map_err(|e| ExitError::Transport(format!("getMe failed: {e}")))?
            .into_body()
            .read_to_string()
            .context("reading getMe response")?;
        let me: User = unwrap_api(&body, "getMe")?;
        Ok(me.username.unwrap_or(me.first_name))
    }
}

fn unwrap_api<T: serde::de::DeserializeOwned>(body: &str, method: &str) -> anyhow::Result<T> {
    let response: ApiResponse<T> =
        serde_json::from_str(body).with_context(|| format!("decoding {method} response"))?;
    if !response.ok {
        bail!(
            "{method} rejected: {}",
            response.description.unwrap_or_else(|| "no description".into())
        );
    }
    response
        .result
        .with_context(|| format!("{method} response has no result"))
}

/// Turn a `getUpdates` body into text messages plus the next offset.
/// Non-message updates (edits, joins, stickers) only advance the offset.
fn decode_updates(body: &str) -> anyhow::Result<(Vec<Incoming>, Option<i64>)> {
    let updates: Vec<Update> = unwrap_api(body, "getUpdates")?;
    let next_offset = updates.iter().map(|u| u.update_id + 1).max();
    let messages = updates
        .into_iter()
        .filter_map(|update| {
            let message = update.message?;
            let text = message.text?;
            let from = message.from?;
            Some(Incoming {
                sender_id: from.id.to_string(),
                sender_name: from.username.unwrap_or(from.first_name),
                chat_id: message.chat.id.to_string(),
                message_id: message.message_id.to_string(),
                text,
            })
        })
        .collect();
    Ok((messages, next_offset))
}

impl Transport for TelegramTransport {
    fn poll(&mut self) -> anyhow::Result<Vec<Incoming>> {
        let body = self
            .agent
            .get(&format!("{}/getUpdates", self.endpoint))
            .query("offset", self.offset.to_string())
            .query("timeout", self.poll_timeout.to_string())
            .query("allowed_updates", r#"["message"]"#)
            .call()
            .context("telegram getUpdates")?
            .into_body()
            .read_to_string()
            .context("reading getUpdates response")?;
        let (messages, next_offset) = decode_updates(&body)?;
        if let Some(offset) = next_offset {
            self.offset = offset;
        }
        Ok(messages)
    }

    fn send(&self, reply: &Reply) -> anyhow::Result<()> {
        let mut form = vec![
            ("chat_id", reply.chat_id.clone()),
            ("text", reply.text.clone()),
        ];
        if let Some(reply_to) = &reply.reply_to {
            form.push(("reply_to_message_id", reply_to.clone()));
            form.push(("allow_sending_without_reply", "true".to_string()));
        }
        if reply.markdown {
            form.push(("parse_mode", "MarkdownV2".to_string()));
        }
        let body = self
            .agent
            .post(&format!("{}/sendMessage", self.endpoint))
            .send_form(form)
            .context("telegram sendMessage")?
            .into_body()
            .read_to_string()
            .context("reading sendMessage response")?;
        let _: serde_json::Value = unwrap_api(&body, "sendMessage")?;
        Ok(())
    }
}
