//! # Broadcast Pipeline
//!
//! Orchestrates one inbound chat event: persist it, fan it out to the rest
//! of the room, and when the message addresses the AI assistant, drive the
//! AI Bridge and re-enter the same persist+fan-out path with its reply.
//!
//! The AI stage runs on a spawned task so a slow inference call never
//! blocks the session's receive loop, other rooms, or other messages in the
//! same room. Disconnection of the triggering session does not cancel it.

use std::sync::Arc;

use lib_core::dto::{MessageSender, ProjectMessage};
use lib_core::model::store::MessageRepository;
use lib_core::DbPool;
use tracing::{debug, error, warn};
use uuid::Uuid;

use super::ai_bridge::{AiBridge, AiReply};
use super::hub::{RoomEvent, RoomHub};

/// Marker that addresses the AI assistant, anywhere in a message.
pub const AI_MARKER: &str = "@ai";

/// Reply substituted when the AI Bridge times out or fails.
pub const AI_FALLBACK_TEXT: &str = "Sorry, I encountered an error processing your request.";

/// If the message addresses the assistant, the prompt for it: the first
/// marker stripped, surrounding whitespace trimmed. Matching is
/// case-sensitive.
pub fn extract_prompt(message: &str) -> Option<String> {
    if message.contains(AI_MARKER) {
        Some(message.replacen(AI_MARKER, "", 1).trim().to_string())
    } else {
        None
    }
}

/// The persist + fan-out orchestrator, shared by every session of every room.
#[derive(Clone)]
pub struct BroadcastPipeline {
    db: DbPool,
    hub: Arc<RoomHub>,
    bridge: Arc<AiBridge>,
}

impl BroadcastPipeline {
    pub fn new(db: DbPool, hub: Arc<RoomHub>, bridge: Arc<AiBridge>) -> Self {
        Self { db, hub, bridge }
    }

    /// Process one inbound chat event from a joined session.
    ///
    /// Empty and whitespace-only bodies are dropped without an error frame.
    /// The human message is persisted and fanned out before the AI stage is
    /// even spawned, so a reply can never overtake its trigger.
    pub async fn handle_inbound(&self, room_id: i64, session_id: Uuid, payload: ProjectMessage) {
        if payload.message.trim().is_empty() {
            debug!("[PIPELINE] DROPPED_EMPTY room={} session={}", room_id, session_id);
            return;
        }

        self.persist_and_publish(room_id, Some(session_id), payload.clone())
            .await;

        if let Some(prompt) = extract_prompt(&payload.message) {
            let pipeline = self.clone();
            tokio::spawn(async move {
                pipeline.run_ai_stage(room_id, prompt).await;
            });
        }
    }

    /// The AI stage: bounded inference, then the same persist+fan-out path
    /// under the reserved sender. Failure substitutes the fixed fallback
    /// reply so the room always hears back.
    async fn run_ai_stage(&self, room_id: i64, prompt: String) {
        let body = match self.bridge.infer(&prompt).await {
            Ok(reply) => reply.into_body(),
            Err(e) => {
                warn!("[PIPELINE] AI_FAILED room={} error={}", room_id, e);
                AiReply::PlainText(AI_FALLBACK_TEXT.to_string()).into_body()
            }
        };

        let payload = ProjectMessage::new(body, MessageSender::ai());
        self.persist_and_publish(room_id, None, payload).await;
    }

    /// Single write path for human and AI messages alike: append to history,
    /// then fan out. A store failure is logged and the event is still
    /// delivered; live fan-out does not wait on durability.
    async fn persist_and_publish(&self, room_id: i64, origin: Option<Uuid>, payload: ProjectMessage) {
        if let Err(e) = MessageRepository::append(
            &self.db,
            room_id,
            &payload.sender.id,
            &payload.sender.email,
            &payload.message,
        )
        .await
        {
            error!(
                "[PIPELINE] PERSIST_FAILED room={} sender={} error={}",
                room_id, payload.sender.id, e
            );
        }

        let delivered = self.hub.publish(room_id, RoomEvent { origin, payload }).await;
        debug!("[PIPELINE] FANNED_OUT room={} receivers={}", room_id, delivered);
    }
}
