//! # Messaging Data Transfer Objects
//!
//! Chat payloads shared by the project WebSocket and the message history REST
//! endpoints. The `project-message` payload shape is identical in both
//! directions; AI replies reuse it under the reserved sender.

use serde::{Deserialize, Serialize};

use crate::model::store::models::StoredMessage;
use lib_utils::time::format_time;

/// Reserved sender id for AI-authored messages.
pub const AI_SENDER_ID: &str = "ai";

/// Reserved sender display email for AI-authored messages.
pub const AI_SENDER_EMAIL: &str = "AI";

/// Message author as it travels on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageSender {
    pub id: String,
    pub email: String,
}

impl MessageSender {
    pub fn new(id: String, email: String) -> Self {
        Self { id, email }
    }

    /// The reserved AI sender, used for every AI-authored message.
    pub fn ai() -> Self {
        Self {
            id: AI_SENDER_ID.to_string(),
            email: AI_SENDER_EMAIL.to_string(),
        }
    }

    /// Whether this sender is the AI sentinel.
    pub fn is_ai(&self) -> bool {
        self.id == AI_SENDER_ID
    }
}

/// Payload of a `project-message` event, inbound and outbound.
///
/// For AI replies `message` is a serialized JSON object with at least a
/// `text` field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectMessage {
    pub message: String,
    pub sender: MessageSender,
}

impl ProjectMessage {
    pub fn new(message: String, sender: MessageSender) -> Self {
        Self { message, sender }
    }
}

/// One persisted message as returned by the history endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageRecord {
    pub id: String,
    pub project_id: String,
    pub message: String,
    pub sender: MessageSender,
    pub created_at: String,
}

impl From<&StoredMessage> for MessageRecord {
    fn from(stored: &StoredMessage) -> Self {
        Self {
            id: stored.id.to_string(),
            project_id: stored.project_id.to_string(),
            message: stored.body.clone(),
            sender: MessageSender::new(stored.sender_id.clone(), stored.sender_email.clone()),
            created_at: format_time(stored.created_at),
        }
    }
}

/// Response wrapping a project's message history, oldest first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessagesResponse {
    pub messages: Vec<MessageRecord>,
}

/// Response to a history purge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PurgeResponse {
    pub message: String,
    pub deleted: u64,
}
