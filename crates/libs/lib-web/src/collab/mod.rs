//! # Collaboration Module
//!
//! Real-time project rooms: every project is a room, every WebSocket
//! connection is a session bound to exactly one room, and chat fans out to
//! the room's other sessions with durable history behind it.
//!
//! Messages addressing `@ai` also flow through the AI Bridge, whose reply
//! re-enters the same broadcast path under the reserved AI sender.

pub mod ai_bridge;
pub mod hub;
pub mod pipeline;
pub mod registry;
pub mod wire;

pub use ai_bridge::{AiBridge, AiBridgeError, AiConfig, AiProvider, AiReply, InferenceBackend};
pub use hub::{RoomEvent, RoomHub};
pub use pipeline::{BroadcastPipeline, AI_FALLBACK_TEXT, AI_MARKER};
pub use registry::{RoomError, RoomMeta, RoomRegistry};
pub use wire::WireFrame;
