//! Event types for the lyricloud event system
//!
//! Provides the shared event definitions and the EventBus used to fan state
//! changes out to SSE clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Lyricloud event types
///
/// Events are broadcast via EventBus and serialized for SSE transmission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum LyricloudEvent {
    /// The interaction shell moved to a new state
    ShellStateChanged {
        /// State name (idle, searching, success, not_found, input_invalid, error)
        state: String,
        /// User-facing message for the state, if any
        message: Option<String>,
        timestamp: DateTime<Utc>,
    },

    /// A pipeline run started
    GenerationStarted {
        run_id: Uuid,
        title: String,
        artist: String,
        timestamp: DateTime<Utc>,
    },

    /// A pipeline run produced an artifact
    GenerationCompleted {
        run_id: Uuid,
        words_placed: usize,
        /// Wall time of fetch + normalize + render
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// A pipeline run ended without an artifact (not found or failure)
    GenerationFailed {
        run_id: Uuid,
        reason: String,
        timestamp: DateTime<Utc>,
    },
}

impl LyricloudEvent {
    /// Get event type as string for filtering
    pub fn event_type(&self) -> &str {
        match self {
            LyricloudEvent::ShellStateChanged { .. } => "ShellStateChanged",
            LyricloudEvent::GenerationStarted { .. } => "GenerationStarted",
            LyricloudEvent::GenerationCompleted { .. } => "GenerationCompleted",
            LyricloudEvent::GenerationFailed { .. } => "GenerationFailed",
        }
    }
}

/// Broadcast bus for lyricloud events
///
/// Cloning is cheap; all clones share the same channel. Slow subscribers
/// lose the oldest events once the channel capacity is exceeded.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<LyricloudEvent>,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<LyricloudEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: LyricloudEvent) {
        let _ = self.tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_events_before_subscribe_are_not_received() {
        let bus = EventBus::new(10);
        bus.emit_lossy(LyricloudEvent::ShellStateChanged {
            state: "idle".to_string(),
            message: None,
            timestamp: Utc::now(),
        });

        let mut rx = bus.subscribe();
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_subscriber_receives_event() {
        let bus = EventBus::new(10);
        let mut rx = bus.subscribe();

        let run_id = Uuid::new_v4();
        bus.emit_lossy(LyricloudEvent::GenerationFailed {
            run_id,
            reason: "not found".to_string(),
            timestamp: Utc::now(),
        });

        let event = rx.recv().await.unwrap();
        assert_eq!(event.event_type(), "GenerationFailed");
        match event {
            LyricloudEvent::GenerationFailed { run_id: got, .. } => assert_eq!(got, run_id),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_serialized_events_are_tagged() {
        let event = LyricloudEvent::ShellStateChanged {
            state: "searching".to_string(),
            message: None,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "ShellStateChanged");
        assert_eq!(json["state"], "searching");
    }
}
