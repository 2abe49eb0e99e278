//! Index change events and the broadcast bus that distributes them.
//!
//! Every structural mutation of the [`EntityIndex`](crate::EntityIndex)
//! emits an [`IndexEvent`]. Downstream consumers (projection recomputation,
//! UI refresh, telemetry) subscribe independently; the projection itself
//! stays a pure function invoked on demand rather than an implicit reactive
//! recompute.

use serde::Serialize;
use tokio::sync::broadcast;

/// A structural change to the entity index.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum IndexEvent {
    /// A category was inserted or its member list replaced.
    CategoryUpserted { key: String, entity_count: usize },
    /// A category was removed. Underlying entities survive.
    CategoryRemoved { key: String },
    /// An entity was registered or gained row evidence.
    EntityRegistered { entity: String, row_count: usize },
}

impl IndexEvent {
    /// Namespaced event type name (e.g. `"category.upserted"`).
    pub fn event_type(&self) -> &'static str {
        match self {
            IndexEvent::CategoryUpserted { .. } => "category.upserted",
            IndexEvent::CategoryRemoved { .. } => "category.removed",
            IndexEvent::EntityRegistered { .. } => "entity.registered",
        }
    }
}

/// Broadcast-based event bus for distributing index change events.
///
/// Uses `tokio::sync::broadcast` with a configurable buffer size. Slow
/// receivers that fall behind receive a `Lagged` error and miss events;
/// freshness matters more than completeness for UI refresh streams.
pub struct EventBus {
    tx: broadcast::Sender<IndexEvent>,
}

impl EventBus {
    /// Create a new event bus with the given buffer capacity.
    ///
    /// Recommended: 256 for production, 32 for tests.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Emit an event to all subscribers.
    ///
    /// If there are no active subscribers, the event is silently dropped.
    pub fn emit(&self, event: IndexEvent) {
        tracing::debug!(
            event_type = %event.event_type(),
            subscriber_count = self.tx.receiver_count(),
            "EventBus emit"
        );
        let _ = self.tx.send(event);
    }

    /// Subscribe to index events. Each subscriber gets an independent stream.
    pub fn subscribe(&self) -> broadcast::Receiver<IndexEvent> {
        self.tx.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(crate::defaults::EVENT_BUS_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_bus_emit_subscribe() {
        let bus = EventBus::new(32);
        let mut rx = bus.subscribe();

        bus.emit(IndexEvent::CategoryUpserted {
            key: "diseases".to_string(),
            entity_count: 2,
        });

        let event = rx.recv().await.unwrap();
        assert!(matches!(event, IndexEvent::CategoryUpserted { .. }));
        assert_eq!(event.event_type(), "category.upserted");
    }

    #[tokio::test]
    async fn test_event_bus_multiple_subscribers() {
        let bus = EventBus::new(32);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.emit(IndexEvent::CategoryRemoved {
            key: "musicians".to_string(),
        });

        assert!(matches!(
            rx1.recv().await.unwrap(),
            IndexEvent::CategoryRemoved { .. }
        ));
        assert!(matches!(
            rx2.recv().await.unwrap(),
            IndexEvent::CategoryRemoved { .. }
        ));
    }

    #[tokio::test]
    async fn test_event_bus_no_subscribers_ok() {
        let bus = EventBus::new(32);
        // Must not panic without subscribers.
        bus.emit(IndexEvent::EntityRegistered {
            entity: "covid".to_string(),
            row_count: 3,
        });
        assert_eq!(bus.subscriber_count(), 0);
    }
}
