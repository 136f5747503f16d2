//! Order snapshot types

use crate::cart::{CartLine, VendorCartGroup};
use crate::models::MenuAddon;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ============================================================================
// Status
// ============================================================================

/// Order status
///
/// `Received` is the only non-terminal state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum OrderStatus {
    #[default]
    Received,
    Completed,
    Failed,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        match self {
            OrderStatus::Received => false,
            OrderStatus::Completed | OrderStatus::Failed => true,
        }
    }

    /// Whether `self → next` is an allowed lifecycle transition
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        match (self, next) {
            (OrderStatus::Received, OrderStatus::Completed) => true,
            (OrderStatus::Received, OrderStatus::Failed) => true,
            (OrderStatus::Received, OrderStatus::Received) => false,
            (OrderStatus::Completed, _) | (OrderStatus::Failed, _) => false,
        }
    }
}

/// Why an order ended up `Failed`
///
/// Payment failures and customer cancellations share the `Failed` status so
/// they are treated identically by the statistics; the reason keeps them
/// apart for history and audit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureReason {
    /// Provider declined (or the demo hook forced a failure)
    PaymentDeclined,
    /// Payment aborted through the cancellation token
    PaymentCancelled,
    /// Provider did not answer within the payment timeout
    PaymentTimedOut,
    /// Customer cancelled a received order
    CustomerCancelled,
    /// Vendor cancelled the queue ticket
    VendorCancelled,
}

/// Payment method chosen at checkout
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PayMethod {
    #[default]
    Card,
    PayNow,
    Cash,
}

// ============================================================================
// Snapshot
// ============================================================================

/// Order line snapshot, a value copy of the cart line at checkout time
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub name: String,
    pub qty: i32,
    pub unit_price: Decimal,
    #[serde(default)]
    pub addons: Vec<MenuAddon>,
    pub line_total: Decimal,
}

impl OrderItem {
    /// Freeze a cart line; `line_total` is supplied by the caller so every
    /// consumer uses the same money helper.
    pub fn from_line(line: &CartLine, line_total: Decimal) -> Self {
        Self {
            name: line.name.clone(),
            qty: line.qty,
            unit_price: line.unit_price,
            addons: line.addons.clone(),
            line_total,
        }
    }
}

/// Order snapshot - items and total are frozen at creation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub vendor_id: String,
    pub vendor_name: String,
    pub items: Vec<OrderItem>,
    pub total: Decimal,
    pub pay_method: PayMethod,
    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<FailureReason>,
    /// Creation timestamp (Unix millis)
    pub created_at: i64,
    /// Last status change (Unix millis)
    #[serde(default)]
    pub updated_at: i64,
}

impl Order {
    /// Build a `Received` order for the given vendor group snapshot
    pub fn received(
        id: impl Into<String>,
        group: &VendorCartGroup,
        items: Vec<OrderItem>,
        total: Decimal,
        pay_method: PayMethod,
        created_at: i64,
    ) -> Self {
        Self {
            id: id.into(),
            vendor_id: group.vendor_id.clone(),
            vendor_name: group.vendor_name.clone(),
            items,
            total,
            pay_method,
            status: OrderStatus::Received,
            failure_reason: None,
            created_at,
            updated_at: created_at,
        }
    }

    /// Mark a freshly built snapshot as a failed attempt
    pub fn into_failed(mut self, reason: FailureReason) -> Self {
        self.status = OrderStatus::Failed;
        self.failure_reason = Some(reason);
        self
    }

    pub fn is_failed(&self) -> bool {
        self.status == OrderStatus::Failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_received_transitions() {
        assert!(OrderStatus::Received.can_transition_to(OrderStatus::Completed));
        assert!(OrderStatus::Received.can_transition_to(OrderStatus::Failed));
        assert!(!OrderStatus::Received.can_transition_to(OrderStatus::Received));
    }

    #[test]
    fn test_terminal_states_reject_everything() {
        for from in [OrderStatus::Completed, OrderStatus::Failed] {
            assert!(from.is_terminal());
            for to in [OrderStatus::Received, OrderStatus::Completed, OrderStatus::Failed] {
                assert!(!from.can_transition_to(to), "{:?} -> {:?}", from, to);
            }
        }
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(serde_json::to_string(&OrderStatus::Received).unwrap(), "\"Received\"");
        assert_eq!(serde_json::to_string(&PayMethod::PayNow).unwrap(), "\"paynow\"");
        assert_eq!(
            serde_json::to_string(&FailureReason::CustomerCancelled).unwrap(),
            "\"CUSTOMER_CANCELLED\""
        );
    }

    #[test]
    fn test_order_round_trip() {
        let group = VendorCartGroup::new("s1", "Laksa King");
        let items = vec![OrderItem {
            name: "Laksa".to_string(),
            qty: 2,
            unit_price: Decimal::new(550, 2),
            addons: vec![MenuAddon::new("cockles", "Cockles", Decimal::new(100, 2))],
            line_total: Decimal::new(1300, 2),
        }];
        let order = Order::received("ORD1", &group, items, Decimal::new(1300, 2), PayMethod::Card, 42)
            .into_failed(FailureReason::PaymentDeclined);

        let json = serde_json::to_string(&order).unwrap();
        let back: Order = serde_json::from_str(&json).unwrap();
        assert_eq!(back, order);
        assert!(back.is_failed());
    }
}
