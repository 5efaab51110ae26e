//! # Change Notifications
//!
//! Fire-and-forget fan-out of committed changes to connected clients.
//!
//! ## Delivery
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  engine op ── commit ──► Notifier::emit(event)                         │
//! │                               │  tokio::sync::broadcast                 │
//! │               ┌───────────────┼───────────────┐                         │
//! │               ▼               ▼               ▼                         │
//! │          subscriber       subscriber      (no subscribers:              │
//! │          (websocket)      (test)           event dropped)               │
//! │                                                                         │
//! │  At-most-once. Ordered per emitting operation. A subscriber that       │
//! │  falls behind the channel capacity sees RecvError::Lagged.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::trace;

use shopledger_core::SystemLog;

/// Which collection changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Entity {
    Products,
    Services,
    Transactions,
    PettyCash,
}

/// An event pushed to clients after a commit.
///
/// Serialized as `{"event": "data-updated", "payload": {"type": "products",
/// "action": "adjust-stock"}}` or `{"event": "new-log", "payload": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "payload", rename_all = "kebab-case")]
pub enum ChangeEvent {
    DataUpdated {
        #[serde(rename = "type")]
        entity: Entity,
        action: &'static str,
    },
    NewLog(SystemLog),
}

impl ChangeEvent {
    pub fn data_updated(entity: Entity, action: &'static str) -> Self {
        ChangeEvent::DataUpdated { entity, action }
    }

    /// Wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            ChangeEvent::DataUpdated { .. } => "data-updated",
            ChangeEvent::NewLog(_) => "new-log",
        }
    }
}

/// Broadcast handle. Cheap to clone; clones share the channel.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: broadcast::Sender<ChangeEvent>,
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Notifier { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }

    /// Emits an event. Having no subscribers is not an error.
    pub fn emit(&self, event: ChangeEvent) {
        let name = event.name();
        // send only fails when nobody is listening
        let delivered = self.tx.send(event).unwrap_or(0);
        trace!(event = name, receivers = delivered, "Emitted change event");
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
