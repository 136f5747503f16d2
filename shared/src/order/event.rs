//! Order events - facts published after a lifecycle transition

use super::types::{FailureReason, OrderStatus};
use serde::{Deserialize, Serialize};

/// Emitted by the ledger whenever an order changes status
///
/// The queue side consumes it to keep the order's ticket in step
/// (Completed → DONE, Failed → CANCELLED).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusChanged {
    pub order_id: String,
    /// Vendor (stall) the order belongs to
    pub vendor_id: String,
    pub from: OrderStatus,
    pub to: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<FailureReason>,
    /// Transition timestamp (Unix millis)
    pub at: i64,
}
