//! Pure queue mutations over the [`QueueBook`] document

use shared::queue::{QueueBook, QueuePosition, StallQueue, Ticket, TicketStatus, TicketStatusChanged};

/// Inputs for a new ticket, resolved by the caller
#[derive(Debug, Clone)]
pub struct TicketDraft<'a> {
    pub stall_id: &'a str,
    pub name: &'a str,
    pub order_id: Option<&'a str>,
    pub ticket_id: String,
    pub now: i64,
    pub service_minutes: u32,
}

/// Issue a ticket, or return the existing one for the same order
///
/// Numbers continue from the highest ever issued for the stall, so cancelled
/// tickets keep theirs. The estimate counts active tickets already in line.
pub fn issue_ticket(book: &mut QueueBook, draft: TicketDraft<'_>) -> Ticket {
    let queue = book.stall_or_insert(draft.stall_id);

    if let Some(order_id) = draft.order_id
        && let Some(existing) = queue.ticket_for_order(order_id)
    {
        tracing::debug!(order_id, ticket_no = existing.ticket_no, "Ticket already issued for order");
        return existing.clone();
    }

    let ticket_no = queue.last_ticket_no() + 1;
    let ahead = u32::try_from(queue.active_count()).unwrap_or(u32::MAX);
    let ticket = Ticket {
        ticket_id: draft.ticket_id,
        ticket_no,
        order_id: draft.order_id.map(str::to_string),
        stall_id: draft.stall_id.to_string(),
        name: draft.name.to_string(),
        created_at: draft.now,
        updated_at: draft.now,
        status: TicketStatus::Waiting,
        eta_minutes: ahead.saturating_mul(draft.service_minutes),
    };
    queue.tickets.push(ticket.clone());
    ticket
}

/// Live position of a ticket within its stall
pub fn position(queue: &StallQueue, ticket_id: &str, service_minutes: u32) -> Option<QueuePosition> {
    let ticket = queue.ticket(ticket_id)?;
    let ahead = queue
        .tickets
        .iter()
        .filter(|t| t.status.is_active() && t.ticket_no < ticket.ticket_no)
        .count();
    let people_ahead = u32::try_from(ahead).unwrap_or(u32::MAX);

    Some(QueuePosition {
        ticket_no: ticket.ticket_no,
        people_ahead,
        position: people_ahead.saturating_add(1),
        eta_minutes: people_ahead.saturating_mul(service_minutes),
        status: ticket.status,
    })
}

/// Move a ticket to `next`; `None` when unknown or the move is not allowed
pub fn set_status(
    book: &mut QueueBook,
    stall_id: &str,
    ticket_id: &str,
    next: TicketStatus,
    at: i64,
) -> Option<TicketStatusChanged> {
    let queue = book.stall_mut(stall_id)?;
    let ticket = queue.tickets.iter_mut().find(|t| t.ticket_id == ticket_id)?;
    apply(ticket, next, at)
}

/// Call the lowest-numbered waiting ticket
pub fn call_next(book: &mut QueueBook, stall_id: &str, at: i64) -> Option<TicketStatusChanged> {
    let queue = book.stall_mut(stall_id)?;
    let ticket = queue
        .tickets
        .iter_mut()
        .filter(|t| t.status == TicketStatus::Waiting)
        .min_by_key(|t| t.ticket_no)?;
    apply(ticket, TicketStatus::Called, at)
}

/// Move the ticket linked to an order, wherever it is queued
pub fn set_status_for_order(
    book: &mut QueueBook,
    order_id: &str,
    next: TicketStatus,
    at: i64,
) -> Option<TicketStatusChanged> {
    let ticket = book
        .queues
        .iter_mut()
        .flat_map(|q| q.tickets.iter_mut())
        .find(|t| t.order_id.as_deref() == Some(order_id))?;
    apply(ticket, next, at)
}

fn apply(ticket: &mut Ticket, next: TicketStatus, at: i64) -> Option<TicketStatusChanged> {
    let from = ticket.status;
    if !from.can_transition_to(next) {
        tracing::debug!(ticket_id = %ticket.ticket_id, ?from, to = ?next, "Rejected ticket status transition");
        return None;
    }
    ticket.status = next;
    ticket.updated_at = at;

    Some(TicketStatusChanged {
        stall_id: ticket.stall_id.clone(),
        ticket_id: ticket.ticket_id.clone(),
        order_id: ticket.order_id.clone(),
        from,
        to: next,
        at,
    })
}
