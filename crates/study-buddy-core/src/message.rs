//! Conversation messages.
//!
//! A conversation is an ordered, append-only sequence of messages. Ordering
//! matters twice: it is the rendering order and it is the context sent back
//! to the tutor on every turn.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Author of a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The learner.
    User,
    /// The tutor.
    Assistant,
}

impl Role {
    /// Wire name of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A single message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    /// Who wrote the message.
    pub role: Role,
    /// Message text. For an assistant reply this grows while a stream is
    /// active and is frozen once the stream ends.
    pub content: String,
}

impl ConversationMessage {
    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Which branch [`Conversation::upsert_assistant`] took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// The trailing assistant message was rewritten.
    Replaced,
    /// A new assistant message was appended.
    Appended,
}

/// Ordered, append-only list of messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conversation {
    messages: Vec<ConversationMessage>,
}

impl Conversation {
    /// Create an empty conversation.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a user message.
    ///
    /// The text is trimmed before it is stored.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::EmptyMessage`] if the text is empty or whitespace.
    pub fn push_user(&mut self, text: &str) -> Result<&ConversationMessage> {
        let text = text.trim();
        if text.is_empty() {
            return Err(CoreError::EmptyMessage);
        }
        self.messages.push(ConversationMessage::user(text));
        Ok(&self.messages[self.messages.len() - 1])
    }

    /// Append an assistant message unconditionally.
    pub fn push_assistant(&mut self, text: impl Into<String>) {
        self.messages.push(ConversationMessage::assistant(text));
    }

    /// Replace the trailing message's content if it is an assistant message,
    /// otherwise append a new assistant message.
    pub fn upsert_assistant(&mut self, text: &str) -> Upsert {
        match self.messages.last_mut() {
            Some(last) if last.role == Role::Assistant => {
                text.clone_into(&mut last.content);
                Upsert::Replaced
            }
            _ => {
                self.messages.push(ConversationMessage::assistant(text));
                Upsert::Appended
            }
        }
    }

    /// All messages in conversation order.
    #[must_use]
    pub fn messages(&self) -> &[ConversationMessage] {
        &self.messages
    }

    /// The most recent message.
    #[must_use]
    pub fn last(&self) -> Option<&ConversationMessage> {
        self.messages.last()
    }

    /// Number of messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the conversation has no messages yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
