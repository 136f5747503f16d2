//! Order Ledger
//!
//! Append-only history of checkout attempts (failed ones included), newest
//! first. Items and totals are frozen at creation; only the status moves,
//! and only along `Received → {Completed, Failed}`.
//!
//! # Status coupling
//!
//! ```text
//! update_status / cancel_order ──▶ OrderStatusChanged ──▶ QueueDispatcher
//! QueueDispatcher ──▶ TicketStatusChanged ──▶ apply_ticket_event
//! ```

pub mod ops;
pub mod query;

use crate::core::Clock;
use crate::storage::{EngineStorage, ORDERS_KEY};
use crate::utils::logger::ORDERS_TARGET;
use shared::order::{FailureReason, Order, OrderQuery, OrderStats, OrderStatus, OrderStatusChanged};
use shared::queue::{TicketStatus, TicketStatusChanged};
use std::sync::Arc;

/// Persisted order history
#[derive(Debug, Clone)]
pub struct OrderLedger {
    storage: EngineStorage,
    clock: Arc<dyn Clock>,
}

impl OrderLedger {
    pub fn new(storage: EngineStorage, clock: Arc<dyn Clock>) -> Self {
        Self { storage, clock }
    }

    // ========== Reads ==========

    /// Every order, newest first
    pub fn orders(&self) -> Vec<Order> {
        self.storage.load_or_default(ORDERS_KEY)
    }

    pub fn get_order(&self, order_id: &str) -> Option<Order> {
        self.orders().into_iter().find(|o| o.id == order_id)
    }

    /// Filtered, searched and sorted projection
    pub fn get_orders(&self, query: &OrderQuery) -> Vec<Order> {
        query::select_orders(&self.orders(), query)
    }

    pub fn compute_stats(&self) -> OrderStats {
        query::compute_stats(&self.orders())
    }

    // ========== Mutations ==========

    /// Record an order; `false` when the id already exists or the write failed
    pub fn add_order(&self, order: Order) -> bool {
        let order_id = order.id.clone();
        let added = self.mutate("add_order", |orders| ops::insert_order(orders, order));
        if added {
            tracing::info!(target: ORDERS_TARGET, order_id = %order_id, "Order recorded");
        } else {
            tracing::warn!(order_id = %order_id, "Order not recorded (duplicate id or storage failure)");
        }
        added
    }

    /// Move an order along its lifecycle
    ///
    /// Returns the transition event, `None` when the order is unknown or the
    /// transition is rejected.
    pub fn update_status(&self, order_id: &str, status: OrderStatus) -> Option<OrderStatusChanged> {
        self.transition(order_id, status, None)
    }

    /// Customer cancels a received order
    pub fn cancel_order(&self, order_id: &str) -> Option<OrderStatusChanged> {
        self.transition(order_id, OrderStatus::Failed, Some(FailureReason::CustomerCancelled))
    }

    /// Follow a ticket status change back to its order
    ///
    /// DONE completes the order, CANCELLED fails it; other ticket moves do not
    /// touch the ledger.
    pub fn apply_ticket_event(&self, event: &TicketStatusChanged) -> Option<OrderStatusChanged> {
        let order_id = event.order_id.as_deref()?;
        match event.to {
            TicketStatus::Done => self.transition(order_id, OrderStatus::Completed, None),
            TicketStatus::Cancelled => self.transition(
                order_id,
                OrderStatus::Failed,
                Some(FailureReason::VendorCancelled),
            ),
            TicketStatus::Waiting | TicketStatus::Called => None,
        }
    }

    fn transition(
        &self,
        order_id: &str,
        status: OrderStatus,
        reason: Option<FailureReason>,
    ) -> Option<OrderStatusChanged> {
        let at = self.clock.now_millis();
        let event = self.mutate("update_status", |orders| {
            ops::transition(orders, order_id, status, reason, at)
        });
        if let Some(ev) = &event {
            tracing::info!(target: ORDERS_TARGET, order_id, from = ?ev.from, to = ?ev.to, "Order status changed");
        }
        event
    }

    fn mutate<R: Default>(&self, op: &str, f: impl FnOnce(&mut Vec<Order>) -> R) -> R {
        self.storage.update(ORDERS_KEY, f).unwrap_or_else(|e| {
            tracing::error!(op, error = %e, "Failed to persist order ledger");
            R::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;
    use rust_decimal::Decimal;
    use shared::order::PayMethod;

    fn ledger() -> OrderLedger {
        OrderLedger::new(
            EngineStorage::open_in_memory().unwrap(),
            Arc::new(ManualClock::new(1_000, 1)),
        )
    }

    fn order(id: &str, total: i64, status: OrderStatus) -> Order {
        Order {
            id: id.to_string(),
            vendor_id: "s1".to_string(),
            vendor_name: "Hill Street Char Kway Teow".to_string(),
            items: vec![],
            total: Decimal::from(total),
            pay_method: PayMethod::PayNow,
            status,
            failure_reason: None,
            created_at: 1,
            updated_at: 1,
        }
    }

    fn ticket_event(order_id: Option<&str>, to: TicketStatus) -> TicketStatusChanged {
        TicketStatusChanged {
            stall_id: "s1".to_string(),
            ticket_id: "t1".to_string(),
            order_id: order_id.map(str::to_string),
            from: TicketStatus::Waiting,
            to,
            at: 5,
        }
    }

    #[test]
    fn test_add_order_newest_first_and_unique() {
        let ledger = ledger();
        assert!(ledger.add_order(order("a", 1, OrderStatus::Received)));
        assert!(ledger.add_order(order("b", 2, OrderStatus::Received)));
        assert!(!ledger.add_order(order("a", 3, OrderStatus::Received)));

        let orders = ledger.orders();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].id, "b");
        assert_eq!(ledger.get_order("a").unwrap().total, Decimal::from(1));
    }

    #[test]
    fn test_terminal_order_immutability() {
        let ledger = ledger();
        ledger.add_order(order("a", 10, OrderStatus::Received));

        let event = ledger.update_status("a", OrderStatus::Completed).unwrap();
        assert_eq!(event.to, OrderStatus::Completed);

        assert!(ledger.update_status("a", OrderStatus::Failed).is_none());
        assert!(ledger.update_status("a", OrderStatus::Received).is_none());
        assert!(ledger.cancel_order("a").is_none());
        assert_eq!(ledger.get_order("a").unwrap().status, OrderStatus::Completed);
    }

    #[test]
    fn test_cancel_records_reason() {
        let ledger = ledger();
        ledger.add_order(order("a", 10, OrderStatus::Received));
        let event = ledger.cancel_order("a").unwrap();
        assert_eq!(event.reason, Some(FailureReason::CustomerCancelled));

        let stored = ledger.get_order("a").unwrap();
        assert_eq!(stored.status, OrderStatus::Failed);
        assert_eq!(stored.failure_reason, Some(FailureReason::CustomerCancelled));
    }

    #[test]
    fn test_update_unknown_order() {
        let ledger = ledger();
        assert!(ledger.update_status("ghost", OrderStatus::Completed).is_none());
    }

    #[test]
    fn test_stats_exclude_failed() {
        let ledger = ledger();
        ledger.add_order(order("a", 10, OrderStatus::Received));
        ledger.add_order(order("b", 5, OrderStatus::Failed));

        let stats = ledger.compute_stats();
        assert_eq!(stats.total_orders, 2);
        assert_eq!(stats.total_spent, Decimal::from(10));
        assert_eq!(stats.favorite_item, "-");
    }

    #[test]
    fn test_ticket_events_drive_orders() {
        let ledger = ledger();
        ledger.add_order(order("a", 10, OrderStatus::Received));
        ledger.add_order(order("b", 10, OrderStatus::Received));

        assert!(ledger.apply_ticket_event(&ticket_event(Some("a"), TicketStatus::Called)).is_none());
        let done = ledger.apply_ticket_event(&ticket_event(Some("a"), TicketStatus::Done)).unwrap();
        assert_eq!(done.to, OrderStatus::Completed);

        let cancelled = ledger
            .apply_ticket_event(&ticket_event(Some("b"), TicketStatus::Cancelled))
            .unwrap();
        assert_eq!(cancelled.reason, Some(FailureReason::VendorCancelled));

        // Walk-in tickets carry no order
        assert!(ledger.apply_ticket_event(&ticket_event(None, TicketStatus::Done)).is_none());
    }

    #[test]
    fn test_get_orders_projection() {
        let ledger = ledger();
        ledger.add_order(order("a", 10, OrderStatus::Received));
        ledger.add_order(order("b", 5, OrderStatus::Failed));

        let failed = ledger.get_orders(&OrderQuery::default().with_status(OrderStatus::Failed));
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].id, "b");
        let by_vendor = ledger.get_orders(&OrderQuery::default().with_search("kway teow"));
        assert_eq!(by_vendor.len(), 2);
    }
}
