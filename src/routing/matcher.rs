use std::collections::HashSet;

use regex::Regex;

use crate::chat::Incoming;

/// Predicate over an incoming message.
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Always holds.
    Any,
    /// The whole trimmed message text matches the expression.
    Text(Regex),
    /// Sender id is one of the admins.
    Admins(HashSet<String>),
    /// Message was posted in one of the chats.
    Chats(HashSet<String>),
    /// Every inner matcher holds.
    All(Vec<Matcher>),
}

impl Matcher {
    /// Compile `pattern` anchored at both ends, so it never matches a
    /// fragment of a longer message.
    pub fn text(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Matcher::Text(Regex::new(&format!("^(?:{pattern})$"))?))
    }

    pub fn admins<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Matcher::Admins(ids.into_iter().map(Into::into).collect())
    }

    pub fn chats<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Matcher::Chats(ids.into_iter().map(Into::into).collect())
    }

    pub fn matches(&self, message: &Incoming) -> bool {
        match self {
            Matcher::Any => true,
            Matcher::Text(re) => re.is_match(message.text.trim()),
            Matcher::Admins(ids) => ids.contains(&message.sender_id),
            Matcher::Chats(ids) => ids.contains(&message.chat_id),
            Matcher::All(inner) => inner.iter().all(|m| m.matches(message)),
        }
    }
}
