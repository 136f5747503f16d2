//! 引擎事件总线
//!
//! ```text
//! CheckoutService ─┐
//! OrderLedger ─────┼──▶ EventBus (broadcast::Sender<EngineEvent>) ──▶ subscribers
//! QueueDispatcher ─┘
//! ```
//!
//! Events are published after the owning write has committed. Publishing
//! without subscribers is not an error.

use serde::Serialize;
use shared::order::{Order, OrderStatusChanged};
use shared::queue::{Ticket, TicketStatusChanged};
use tokio::sync::broadcast;

/// Everything observable that the engine does
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum EngineEvent {
    /// A checkout attempt was written to the ledger (Received or Failed)
    OrderRecorded(Order),
    TicketIssued(Ticket),
    OrderStatusChanged(OrderStatusChanged),
    TicketStatusChanged(TicketStatusChanged),
}

impl EngineEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            EngineEvent::OrderRecorded(_) => "order_recorded",
            EngineEvent::TicketIssued(_) => "ticket_issued",
            EngineEvent::OrderStatusChanged(_) => "order_status_changed",
            EngineEvent::TicketStatusChanged(_) => "ticket_status_changed",
        }
    }
}

/// Broadcast channel for [`EngineEvent`]s
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<EngineEvent>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("tx", &"<broadcast::Sender>")
            .field("receivers", &self.tx.receiver_count())
            .finish()
    }
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.tx.subscribe()
    }

    pub fn publish(&self, event: EngineEvent) {
        let kind = event.kind();
        if self.tx.send(event).is_err() {
            tracing::trace!(kind, "Event dropped: no active receivers");
        }
    }
}
