//! Conversation store: an immutable snapshot of the ordered transcript.
//!
//! Every operation produces a new snapshot backed by fresh storage, so
//! observers can tell a publish happened by identity (`same_snapshot`) even
//! when the visible content did not change. No operation reorders surviving
//! entries.

use uuid::Uuid;

use crate::chat::Message;

#[derive(Debug, Clone)]
pub struct Conversation {
    messages: std::sync::Arc<[Message]>,
}

impl Default for Conversation {
    fn default() -> Self {
        Self {
            messages: Vec::new().into(),
        }
    }
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message at the end, preserving existing order.
    pub fn append(&self, message: Message) -> Self {
        let mut next: Vec<Message> = self.messages.to_vec();
        next.push(message);
        Self {
            messages: next.into(),
        }
    }

    /// Remove the message with the given id. Unknown ids are a content no-op
    /// that still yields a fresh snapshot.
    pub fn delete(&self, id: Uuid) -> Self {
        let next: Vec<Message> = self
            .messages
            .iter()
            .filter(|m| m.id != id)
            .cloned()
            .collect();
        Self {
            messages: next.into(),
        }
    }

    /// Rewrite the text of the message with the given id in place. Unknown
    /// ids are a content no-op that still yields a fresh snapshot.
    pub fn edit_text(&self, id: Uuid, new_text: &str) -> Self {
        let next: Vec<Message> = self
            .messages
            .iter()
            .cloned()
            .map(|mut m| {
                if m.id == id {
                    m.text = new_text.to_string();
                }
                m
            })
            .collect();
        Self {
            messages: next.into(),
        }
    }

    pub fn clear(&self) -> Self {
        Self {
            messages: Vec::new().into(),
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn get(&self, id: Uuid) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// True when both values share the same underlying snapshot. Operations
    /// never return a shared snapshot, so this distinguishes publishes.
    pub fn same_snapshot(&self, other: &Conversation) -> bool {
        std::sync::Arc::ptr_eq(&self.messages, &other.messages)
    }
}
