//! Queue Dispatcher
//!
//! 每个摊位一个 FIFO 队列。票号从 1 开始递增，取消的票保留号码。
//!
//! Position and wait estimates only count WAITING and CALLED tickets with a
//! smaller number. Ticket moves are forward-only; DONE and CANCELLED are final.

pub mod ops;

pub use ops::TicketDraft;

use crate::core::{Clock, IdGenerator};
use crate::storage::{EngineStorage, QUEUE_KEY};
use shared::order::{OrderStatus, OrderStatusChanged};
use shared::queue::{QueueBook, QueuePosition, StallQueue, Ticket, TicketStatus, TicketStatusChanged};
use std::sync::Arc;

/// Persisted per-stall queues
#[derive(Debug, Clone)]
pub struct QueueDispatcher {
    storage: EngineStorage,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    service_minutes: u32,
}

impl QueueDispatcher {
    pub fn new(
        storage: EngineStorage,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
        service_minutes: u32,
    ) -> Self {
        Self {
            storage,
            clock,
            ids,
            service_minutes,
        }
    }

    pub fn service_minutes(&self) -> u32 {
        self.service_minutes
    }

    /// Build the draft for a new ticket (fresh id, current time)
    pub fn draft<'a>(&self, stall_id: &'a str, name: &'a str, order_id: Option<&'a str>) -> TicketDraft<'a> {
        TicketDraft {
            stall_id,
            name,
            order_id,
            ticket_id: self.ids.ticket_id(),
            now: self.clock.now_millis(),
            service_minutes: self.service_minutes,
        }
    }

    // ========== Reads ==========

    pub fn book(&self) -> QueueBook {
        self.storage.load_or_default(QUEUE_KEY)
    }

    /// A stall's queue (empty when never used)
    pub fn queue(&self, stall_id: &str) -> StallQueue {
        self.book()
            .stall(stall_id)
            .cloned()
            .unwrap_or_else(|| StallQueue::new(stall_id))
    }

    /// WAITING and CALLED tickets, in number order
    pub fn active_tickets(&self, stall_id: &str) -> Vec<Ticket> {
        let mut tickets: Vec<Ticket> = self
            .queue(stall_id)
            .tickets
            .into_iter()
            .filter(|t| t.status.is_active())
            .collect();
        tickets.sort_by_key(|t| t.ticket_no);
        tickets
    }

    pub fn find_ticket_for_order(&self, order_id: &str) -> Option<Ticket> {
        self.book()
            .queues
            .iter()
            .find_map(|q| q.ticket_for_order(order_id).cloned())
    }

    pub fn get_position(&self, stall_id: &str, ticket_id: &str) -> Option<QueuePosition> {
        let book = self.book();
        ops::position(book.stall(stall_id)?, ticket_id, self.service_minutes)
    }

    // ========== Mutations ==========

    /// Issue a ticket; idempotent per (stall, order)
    pub fn issue_ticket(&self, stall_id: &str, name: &str, order_id: Option<&str>) -> Option<Ticket> {
        let draft = self.draft(stall_id, name, order_id);
        let ticket = self.mutate("issue_ticket", |book| Some(ops::issue_ticket(book, draft)))?;
        tracing::info!(stall_id, ticket_no = ticket.ticket_no, eta_minutes = ticket.eta_minutes, "Ticket issued");
        Some(ticket)
    }

    pub fn set_status(&self, stall_id: &str, ticket_id: &str, status: TicketStatus) -> Option<TicketStatusChanged> {
        let at = self.clock.now_millis();
        let event = self.mutate("set_status", |book| {
            ops::set_status(book, stall_id, ticket_id, status, at)
        });
        log_change(event.as_ref());
        event
    }

    /// Vendor calls the next waiting customer
    pub fn call_next(&self, stall_id: &str) -> Option<TicketStatusChanged> {
        let at = self.clock.now_millis();
        let event = self.mutate("call_next", |book| ops::call_next(book, stall_id, at));
        log_change(event.as_ref());
        event
    }

    /// Follow an order status change to its ticket
    ///
    /// Completed closes the ticket as DONE, Failed as CANCELLED.
    pub fn apply_order_event(&self, event: &OrderStatusChanged) -> Option<TicketStatusChanged> {
        let next = match event.to {
            OrderStatus::Completed => TicketStatus::Done,
            OrderStatus::Failed => TicketStatus::Cancelled,
            OrderStatus::Received => return None,
        };
        let at = self.clock.now_millis();
        let change = self.mutate("apply_order_event", |book| {
            ops::set_status_for_order(book, &event.order_id, next, at)
        });
        log_change(change.as_ref());
        change
    }

    fn mutate<R: Default>(&self, op: &str, f: impl FnOnce(&mut QueueBook) -> R) -> R {
        self.storage.update(QUEUE_KEY, f).unwrap_or_else(|e| {
            tracing::error!(op, error = %e, "Failed to persist queue");
            R::default()
        })
    }
}

fn log_change(event: Option<&TicketStatusChanged>) {
    if let Some(ev) = event {
        tracing::info!(stall_id = %ev.stall_id, ticket_id = %ev.ticket_id, from = ?ev.from, to = ?ev.to, "Ticket status changed");
    }
}
