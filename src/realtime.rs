//! Realtime fan-out of domain events.
//!
//! Publishing is fire-and-forget: no acknowledgement, and a publish with nobody
//! listening is not an error. Socket transports subscribe to the broadcast
//! channel and forward messages to the clients joined to each room.

use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::debug;

pub const ROOM_ALUMNI: &str = "alumni";
pub const ROOM_EVENTS: &str = "events";

pub const PROFILE_UPDATED: &str = "profile:updated";
pub const EVENT_UPDATED: &str = "event:updated";

const DEFAULT_CAPACITY: usize = 256;

/// A message addressed to every client in `room`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RealtimeMessage {
    pub room: String,
    pub event: String,
    pub payload: Value,
}

pub trait EventPublisher: Send + Sync + 'static {
    fn publish(&self, room: &str, event: &str, payload: Value);
}

/// Publisher over a `tokio` broadcast channel.
#[derive(Debug, Clone)]
pub struct BroadcastPublisher {
    sender: broadcast::Sender<RealtimeMessage>,
}

impl BroadcastPublisher {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RealtimeMessage> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastPublisher {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EventPublisher for BroadcastPublisher {
    fn publish(&self, room: &str, event: &str, payload: Value) {
        let message = RealtimeMessage {
            room: room.to_string(),
            event: event.to_string(),
            payload,
        };

        // Err only means no subscriber is connected
        if self.sender.send(message).is_err() {
            debug!(room, event, "Realtime event dropped, no subscribers");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_subscribers_receive_messages() {
        let publisher = BroadcastPublisher::default();
        let mut receiver = publisher.subscribe();

        publisher.publish(ROOM_EVENTS, EVENT_UPDATED, json!({"id": "e1"}));

        let message = receiver.recv().await.unwrap();
        assert_eq!(
            message,
            RealtimeMessage {
                room: "events".into(),
                event: "event:updated".into(),
                payload: json!({"id": "e1"}),
            }
        );
    }

    #[test]
    fn test_publish_without_subscribers_is_silent() {
        let publisher = BroadcastPublisher::new(0);
        publisher.publish(ROOM_ALUMNI, PROFILE_UPDATED, json!(null));
    }
}
