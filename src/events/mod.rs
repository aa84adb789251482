//! Domain events emitted by the order lifecycle.
//!
//! The core only produces events; delivery is a separate collaborator that
//! subscribes to the broadcast channel (websocket gateway, push fan-out, …).
//! Emission is fire-and-forget: losing an event because nobody is listening
//! is acceptable to the core.

use serde::Serialize;
use tokio::sync::broadcast;

use crate::models::OrderResponse;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "payload")]
pub enum AppEvent {
    #[serde(rename = "order:created")]
    OrderCreated { order: OrderResponse },
    #[serde(rename = "order:cancelled")]
    OrderCancelled { order: OrderResponse },
    #[serde(rename = "order:checkin")]
    OrderCheckin { order: OrderResponse },
    #[serde(rename = "order:noshow")]
    OrderNoShow {
        order_id: i64,
        user_id: i64,
        user_name: String,
        no_show_count: i32,
    },
    #[serde(rename = "order:bulk_created")]
    OrderBulkCreated { count: usize, user_id: i64 },
    #[serde(rename = "user:blacklisted")]
    UserBlacklisted {
        user_id: i64,
        user_name: String,
        no_show_count: i32,
    },
}

impl AppEvent {
    pub fn name(&self) -> &'static str {
        match self {
            AppEvent::OrderCreated { .. } => "order:created",
            AppEvent::OrderCancelled { .. } => "order:cancelled",
            AppEvent::OrderCheckin { .. } => "order:checkin",
            AppEvent::OrderNoShow { .. } => "order:noshow",
            AppEvent::OrderBulkCreated { .. } => "order:bulk_created",
            AppEvent::UserBlacklisted { .. } => "user:blacklisted",
        }
    }
}

#[derive(Clone)]
pub struct EventBroadcaster {
    tx: broadcast::Sender<AppEvent>,
}

impl EventBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish an event to whoever is listening; no delivery guarantee.
    pub fn emit(&self, event: AppEvent) {
        log::debug!("Emitting event {}", event.name());
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emit_without_subscribers_is_silent() {
        let broadcaster = EventBroadcaster::new(16);
        broadcaster.emit(AppEvent::OrderBulkCreated {
            count: 3,
            user_id: 1,
        });
    }

    #[tokio::test]
    async fn subscriber_receives_event() {
        let broadcaster = EventBroadcaster::new(16);
        let mut rx = broadcaster.subscribe();
        broadcaster.emit(AppEvent::OrderNoShow {
            order_id: 7,
            user_id: 1,
            user_name: "张三".into(),
            no_show_count: 2,
        });
        let received = rx.recv().await.unwrap();
        assert_eq!(received.name(), "order:noshow");
    }

    #[test]
    fn event_serializes_with_name_tag() {
        let event = AppEvent::OrderBulkCreated {
            count: 2,
            user_id: 9,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "order:bulk_created");
        assert_eq!(json["payload"]["count"], 2);
    }
}
