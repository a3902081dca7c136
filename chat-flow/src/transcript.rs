use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who produced a transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Bot,
}

/// One chat message, optionally carrying quick-reply buttons.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender: Sender,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub quick_replies: Vec<String>,
    pub at: DateTime<Utc>,
}

/// Append-only, ordered record of one conversation.
///
/// Messages are never edited or removed once pushed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage {
            sender: Sender::User,
            content: content.into(),
            quick_replies: Vec::new(),
            at: Utc::now(),
        });
    }

    pub fn push_bot(&mut self, content: impl Into<String>, quick_replies: Vec<String>) {
        self.messages.push(ChatMessage {
            sender: Sender::Bot,
            content: content.into(),
            quick_replies,
            at: Utc::now(),
        });
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The most recent message, if any.
    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }
}
