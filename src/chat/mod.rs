//! Chat transport boundary: inbound messages, outbound replies.

pub mod telegram;

pub use telegram::TelegramTransport;

/// A text message addressed to the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Incoming {
    pub sender_id: String,
    pub sender_name: String,
    pub chat_id: String,
    pub message_id: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub chat_id: String,
    pub text: String,
    pub reply_to: Option<String>,
    /// Text is Telegram MarkdownV2 and already escaped.
    pub markdown: bool,
}

impl Reply {
    /// A MarkdownV2 reply threaded under `message`.
    pub fn markdown_to(message: &Incoming, text: String) -> Self {
        Self {
            chat_id: message.chat_id.clone(),
            text,
            reply_to: Some(message.message_id.clone()),
            markdown: true,
        }
    }

    /// A plain-text reply threaded under `message`.
    pub fn plain_to(message: &Incoming, text: String) -> Self {
        Self {
            chat_id: message.chat_id.clone(),
            text,
            reply_to: Some(message.message_id.clone()),
            markdown: false,
        }
    }
}

pub trait Transport {
    /// Block until new messages arrive or the poll window elapses.
    fn poll(&mut self) -> anyhow::Result<Vec<Incoming>>;

    fn send(&self, reply: &Reply) -> anyhow::Result<()>;
}

/// Escape text for MarkdownV2 outside of code spans.
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(
            c,
            '_' | '*' | '[' | ']' | '(' | ')' | '~' | '`' | '>' | '#' | '+' | '-' | '=' | '|'
                | '{' | '}' | '.' | '!' | '\\'
        ) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Escape text for MarkdownV2 inside a ``` block.
pub fn escape_code(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '`' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
