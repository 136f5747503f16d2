//! Queue records
//!
//! One FIFO per stall, persisted together as the `queue` document:
//!
//! ```text
//! { "queues": [ { stallId, tickets: [Ticket] } ] }
//! ```

use serde::{Deserialize, Serialize};

/// Ticket status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    #[default]
    Waiting,
    Called,
    Done,
    Cancelled,
}

impl TicketStatus {
    /// Waiting or called tickets still occupy a place in the queue
    pub fn is_active(self) -> bool {
        matches!(self, TicketStatus::Waiting | TicketStatus::Called)
    }

    pub fn is_terminal(self) -> bool {
        !self.is_active()
    }

    /// Tickets only move forward: WAITING → CALLED → {DONE, CANCELLED}
    pub fn can_transition_to(self, next: TicketStatus) -> bool {
        match (self, next) {
            (TicketStatus::Waiting, TicketStatus::Called)
            | (TicketStatus::Waiting, TicketStatus::Done)
            | (TicketStatus::Waiting, TicketStatus::Cancelled)
            | (TicketStatus::Called, TicketStatus::Done)
            | (TicketStatus::Called, TicketStatus::Cancelled) => true,
            (TicketStatus::Waiting, TicketStatus::Waiting)
            | (TicketStatus::Called, TicketStatus::Waiting)
            | (TicketStatus::Called, TicketStatus::Called) => false,
            (TicketStatus::Done, _) | (TicketStatus::Cancelled, _) => false,
        }
    }
}

/// Queue position token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub ticket_id: String,
    /// Per-stall number, starts at 1, never reused
    pub ticket_no: u32,
    /// Back-reference to the order that produced this ticket
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    pub stall_id: String,
    pub name: String,
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
    pub status: TicketStatus,
    /// Wait estimate at issue time
    pub eta_minutes: u32,
}

/// One stall's queue, ordered by ticket number
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct StallQueue {
    pub stall_id: String,
    #[serde(default)]
    pub tickets: Vec<Ticket>,
}

impl StallQueue {
    pub fn new(stall_id: impl Into<String>) -> Self {
        Self {
            stall_id: stall_id.into(),
            tickets: Vec::new(),
        }
    }

    pub fn ticket(&self, ticket_id: &str) -> Option<&Ticket> {
        self.tickets.iter().find(|t| t.ticket_id == ticket_id)
    }

    pub fn ticket_for_order(&self, order_id: &str) -> Option<&Ticket> {
        self.tickets
            .iter()
            .find(|t| t.order_id.as_deref() == Some(order_id))
    }

    /// Highest ticket number issued so far (0 when empty)
    pub fn last_ticket_no(&self) -> u32 {
        self.tickets.iter().map(|t| t.ticket_no).max().unwrap_or(0)
    }

    pub fn active_count(&self) -> usize {
        self.tickets.iter().filter(|t| t.status.is_active()).count()
    }
}

/// Every stall queue of a deployment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct QueueBook {
    #[serde(default)]
    pub queues: Vec<StallQueue>,
}

impl QueueBook {
    pub fn stall(&self, stall_id: &str) -> Option<&StallQueue> {
        self.queues.iter().find(|q| q.stall_id == stall_id)
    }

    pub fn stall_mut(&mut self, stall_id: &str) -> Option<&mut StallQueue> {
        self.queues.iter_mut().find(|q| q.stall_id == stall_id)
    }

    /// Get a stall's queue, creating it on first use
    pub fn stall_or_insert(&mut self, stall_id: &str) -> &mut StallQueue {
        let idx = match self.queues.iter().position(|q| q.stall_id == stall_id) {
            Some(idx) => idx,
            None => {
                self.queues.push(StallQueue::new(stall_id));
                self.queues.len() - 1
            }
        };
        &mut self.queues[idx]
    }
}

/// Live position of a ticket
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QueuePosition {
    pub ticket_no: u32,
    /// Active tickets with a smaller number
    pub people_ahead: u32,
    pub position: u32,
    pub eta_minutes: u32,
    pub status: TicketStatus,
}

/// Emitted whenever a ticket changes status
///
/// The ledger consumes it to keep the linked order in step
/// (DONE → Completed, CANCELLED → Failed).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TicketStatusChanged {
    pub stall_id: String,
    pub ticket_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    pub from: TicketStatus,
    pub to: TicketStatus,
    pub at: i64,
}
