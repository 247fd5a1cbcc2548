//! # Wire Protocol
//!
//! JSON frame envelope for the project WebSocket. Every frame, inbound and
//! outbound, is a JSON object with an `event` name and a `data` payload:
//!
//! ```json
//! { "event": "project-message", "data": { "message": "...", "sender": { "id": "...", "email": "..." } } }
//! ```
//!
//! Frames that do not match a known event are rejected by the session's
//! receive loop and never reach the broadcast pipeline.

use lib_core::dto::ProjectMessage;
use serde::{Deserialize, Serialize};

/// A frame on the project WebSocket.
///
/// Adjacently tagged so the serialized form is exactly the
/// `{ "event": ..., "data": ... }` envelope clients speak.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum WireFrame {
    /// A chat message within a project room.
    ProjectMessage(ProjectMessage),
}

impl WireFrame {
    /// Serialize this frame to its JSON text form.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse a received text frame. Fails on malformed JSON, unknown
    /// events, and payloads that do not match the event's shape.
    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
