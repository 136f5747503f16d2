//! Ledger read projections

use super::types::OrderStatus;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Sort key for order history
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderSort {
    #[default]
    Newest,
    Oldest,
    TotalAsc,
    TotalDesc,
}

/// Order history query
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct OrderQuery {
    /// Only orders with this status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    /// Case-insensitive match against vendor name or any item name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default)]
    pub sort: OrderSort,
}

impl OrderQuery {
    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn sorted_by(mut self, sort: OrderSort) -> Self {
        self.sort = sort;
        self
    }
}

/// Aggregate statistics over the ledger
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderStats {
    /// Every recorded order, failed attempts included
    pub total_orders: usize,
    /// Sum of totals over non-failed orders
    pub total_spent: Decimal,
    /// Item name with the highest cumulative quantity, `"-"` when none
    pub favorite_item: String,
}

impl Default for OrderStats {
    fn default() -> Self {
        Self {
            total_orders: 0,
            total_spent: Decimal::ZERO,
            favorite_item: "-".to_string(),
        }
    }
}
