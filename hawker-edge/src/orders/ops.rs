//! Pure ledger mutations over the `orders` document (newest first)

use shared::order::{FailureReason, Order, OrderStatus, OrderStatusChanged};

/// Prepend an order; rejects a duplicate id
pub fn insert_order(orders: &mut Vec<Order>, order: Order) -> bool {
    if orders.iter().any(|o| o.id == order.id) {
        return false;
    }
    orders.insert(0, order);
    true
}

/// Apply a lifecycle transition
///
/// Returns the emitted event, or `None` when the order is unknown or the
/// transition is not allowed (terminal orders never change).
pub fn transition(
    orders: &mut [Order],
    order_id: &str,
    next: OrderStatus,
    reason: Option<FailureReason>,
    at: i64,
) -> Option<OrderStatusChanged> {
    let order = orders.iter_mut().find(|o| o.id == order_id)?;
    let from = order.status;
    if !from.can_transition_to(next) {
        tracing::debug!(order_id, ?from, to = ?next, "Rejected order status transition");
        return None;
    }

    order.status = next;
    order.updated_at = at;
    // A reason only makes sense for the failed state
    order.failure_reason = match next {
        OrderStatus::Failed => reason,
        OrderStatus::Received | OrderStatus::Completed => None,
    };

    Some(OrderStatusChanged {
        order_id: order.id.clone(),
        vendor_id: order.vendor_id.clone(),
        from,
        to: next,
        reason: order.failure_reason,
        at,
    })
}
