use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One transcript entry. The role is fixed at creation; the text changes only
/// through an explicit edit or through the streaming path of the pending
/// assistant message. Sender, avatar and timestamp are presentation-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub role: Role,
    pub text: String,
    pub sender: String,
    pub avatar: String,
    pub timestamp: DateTime<Local>,
}

impl Message {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        let (sender, avatar) = match role {
            Role::System => ("System", "◆"),
            Role::User => ("You", "○"),
            Role::Assistant => ("Parley", "●"),
        };

        Self {
            id: Uuid::new_v4(),
            role,
            text: text.into(),
            sender: sender.to_string(),
            avatar: avatar.to_string(),
            timestamp: Local::now(),
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Role::System, text)
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text)
    }

    /// Replace the generated id, used when a message slot was reserved ahead
    /// of the message entering the store.
    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }
}
