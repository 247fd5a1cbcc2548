//! # Room Hub
//!
//! In-memory fan-out hub for project rooms. Each active room owns a
//! `tokio::sync::broadcast` channel; every connected session subscribes on
//! join and the hub publishes one [`RoomEvent`] per chat message.
//!
//! Events carry the originating session id so each session's send loop can
//! skip echoing a message back to its own author. AI-authored events carry
//! no origin and are therefore delivered to every session in the room.
//!
//! Rooms are created lazily on first join and dropped once the last session
//! leaves, so the map only ever holds rooms with live connections.

use std::collections::HashMap;

use lib_core::dto::ProjectMessage;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

/// Buffered events per room before slow subscribers start lagging.
const ROOM_CHANNEL_CAPACITY: usize = 100;

/// One chat message as it fans out inside a room.
#[derive(Debug, Clone)]
pub struct RoomEvent {
    /// Session that submitted the message, `None` for AI-authored events.
    pub origin: Option<Uuid>,
    pub payload: ProjectMessage,
}

struct RoomChannel {
    sender: broadcast::Sender<RoomEvent>,
    sessions: usize,
}

/// Registry of live rooms keyed by project id.
#[derive(Default)]
pub struct RoomHub {
    rooms: RwLock<HashMap<i64, RoomChannel>>,
}

impl RoomHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session with a room, creating the room's channel if this
    /// is the first session, and return its event subscription.
    pub async fn join(&self, room_id: i64) -> broadcast::Receiver<RoomEvent> {
        let mut rooms = self.rooms.write().await;

        let channel = rooms.entry(room_id).or_insert_with(|| {
            let (tx, _) = broadcast::channel(ROOM_CHANNEL_CAPACITY);
            RoomChannel {
                sender: tx,
                sessions: 0,
            }
        });
        channel.sessions += 1;
        channel.sender.subscribe()
    }

    /// Deregister a session from a room. The last session out drops the
    /// room's channel entirely.
    pub async fn leave(&self, room_id: i64) {
        let mut rooms = self.rooms.write().await;

        if let Some(channel) = rooms.get_mut(&room_id) {
            channel.sessions = channel.sessions.saturating_sub(1);
            if channel.sessions == 0 {
                rooms.remove(&room_id);
            }
        }
    }

    /// Publish an event to a room, returning how many subscribers received
    /// it. Publishing to a room with no live sessions is a no-op: persisted
    /// history is the catch-up path for members who join later.
    pub async fn publish(&self, room_id: i64, event: RoomEvent) -> usize {
        let rooms = self.rooms.read().await;

        match rooms.get(&room_id) {
            Some(channel) => channel.sender.send(event).unwrap_or(0),
            None => 0,
        }
    }

    /// Number of sessions currently joined to a room.
    pub async fn session_count(&self, room_id: i64) -> usize {
        let rooms = self.rooms.read().await;
        rooms.get(&room_id).map(|c| c.sessions).unwrap_or(0)
    }

    /// Number of rooms with at least one live session.
    pub async fn room_count(&self) -> usize {
        let rooms = self.rooms.read().await;
        rooms.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lib_core::dto::MessageSender;

    fn event(origin: Option<Uuid>, body: &str) -> RoomEvent {
        RoomEvent {
            origin,
            payload: ProjectMessage::new(
                body.to_string(),
                MessageSender::new("1".to_string(), "dev@example.com".to_string()),
            ),
        }
    }

    #[tokio::test]
    async fn test_publish_reaches_all_subscribers() {
        let hub = RoomHub::new();
        let mut first = hub.join(42).await;
        let mut second = hub.join(42).await;

        let origin = Uuid::new_v4();
        let delivered = hub.publish(42, event(Some(origin), "hello")).await;

        assert_eq!(delivered, 2);
        let received = first.recv().await.expect("first subscriber should receive");
        assert_eq!(received.origin, Some(origin));
        assert_eq!(received.payload.message, "hello");
        let received = second.recv().await.expect("second subscriber should receive");
        assert_eq!(received.payload.message, "hello");
    }

    #[tokio::test]
    async fn test_rooms_are_isolated() {
        let hub = RoomHub::new();
        let mut room_a = hub.join(1).await;
        let mut room_b = hub.join(2).await;

        hub.publish(1, event(None, "only for room 1")).await;

        let received = room_a.recv().await.expect("room 1 should receive");
        assert_eq!(received.payload.message, "only for room 1");
        assert!(room_b.try_recv().is_err(), "room 2 must not see room 1 traffic");
    }

    #[tokio::test]
    async fn test_publish_to_empty_room_delivers_nothing() {
        let hub = RoomHub::new();

        let delivered = hub.publish(99, event(None, "into the void")).await;

        assert_eq!(delivered, 0);
    }

    #[tokio::test]
    async fn test_last_leave_prunes_room() {
        let hub = RoomHub::new();
        let _first = hub.join(7).await;
        let _second = hub.join(7).await;
        assert_eq!(hub.session_count(7).await, 2);

        hub.leave(7).await;
        assert_eq!(hub.session_count(7).await, 1);
        assert_eq!(hub.room_count().await, 1);

        hub.leave(7).await;
        assert_eq!(hub.session_count(7).await, 0);
        assert_eq!(hub.room_count().await, 0);
    }

    #[tokio::test]
    async fn test_rejoin_after_prune_creates_fresh_channel() {
        let hub = RoomHub::new();
        let _early = hub.join(5).await;
        hub.leave(5).await;

        let mut late = hub.join(5).await;
        let delivered = hub.publish(5, event(None, "fresh start")).await;

        assert_eq!(delivered, 1);
        let received = late.recv().await.expect("rejoined subscriber should receive");
        assert_eq!(received.payload.message, "fresh start");
    }
}
