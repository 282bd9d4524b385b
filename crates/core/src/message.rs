//! Message and session identity types.
//!
//! These are the value objects that flow through the whole system:
//! a chat turn arrives for a [`SessionKey`] → the assembler reads that
//! session's history → the provider answers → the exchange is appended.

use serde::{Deserialize, Serialize};

/// Identifier of a session group (a guild, workspace, or channel).
pub type GroupId = u64;

/// Identifier of a participant within a group.
pub type ParticipantId = u64;

/// Two-level identity of a conversation: group first, then participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionKey {
    pub group: GroupId,
    pub participant: ParticipantId,
}

impl SessionKey {
    pub fn new(group: GroupId, participant: ParticipantId) -> Self {
        Self { group, participant }
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.group, self.participant)
    }
}

/// The role of a message sender in a conversation.
///
/// Closed set: records carrying any other role fail to deserialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions (the preamble)
    System,
    /// The end user
    User,
    /// The model's reply
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single message in a conversation. Immutable once created.
///
/// Serializes as `{"role": "...", "content": "..."}`, which is both the
/// durable record format and the shape inference backends expect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who sent this message
    pub role: Role,

    /// The text content
    pub content: String,
}

impl Message {
    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}
