//! Refresh notifications pushed to connected viewers.
//!
//! The core only needs `publish(topic, event)`; the broadcast implementation
//! here feeds the WebSocket endpoint in [`crate::web`].

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::store::GameId;

/// Event payload telling viewers to re-fetch a game
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChessEvent {
    #[serde(rename = "type")]
    pub kind: String,
}

impl ChessEvent {
    pub fn update_board() -> Self {
        Self {
            kind: "UPDATE_BOARD".to_string(),
        }
    }
}

/// Topic viewers of a game subscribe to
pub fn game_topic(id: &GameId) -> String {
    format!("/topic/chess/{}", id)
}

/// Publish capability consumed by the opponent runner
pub trait Notifier: Send + Sync {
    fn publish(&self, topic: &str, event: ChessEvent);
}

/// A published event together with its topic
#[derive(Clone, Debug)]
pub struct TopicEvent {
    pub topic: String,
    pub event: ChessEvent,
}

/// Fans events out to every subscriber over a broadcast channel
#[derive(Clone)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<TopicEvent>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TopicEvent> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new(256)
    }
}

impl Notifier for BroadcastNotifier {
    fn publish(&self, topic: &str, event: ChessEvent) {
        tracing::debug!("Publishing {} to {}", event.kind, topic);
        // No subscribers is fine: nobody is watching this game right now
        let _ = self.sender.send(TopicEvent {
            topic: topic.to_string(),
            event,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_payload() {
        let json = serde_json::to_string(&ChessEvent::update_board()).unwrap();
        assert_eq!(json, r#"{"type":"UPDATE_BOARD"}"#);
        assert_eq!(game_topic(&GameId::from("42")), "/topic/chess/42");
    }

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let notifier = BroadcastNotifier::default();
        let mut rx = notifier.subscribe();
        notifier.publish("/topic/chess/1", ChessEvent::update_board());
        let received = rx.recv().await.unwrap();
        assert_eq!(received.topic, "/topic/chess/1");
        assert_eq!(received.event, ChessEvent::update_board());
    }

    #[test]
    fn test_publish_without_subscribers() {
        BroadcastNotifier::default().publish("/topic/chess/1", ChessEvent::update_board());
    }
}
