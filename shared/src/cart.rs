//! Cart records
//!
//! The cart is split per vendor so that every vendor group can be checked out
//! and paid independently. Persisted as the `cart` document:
//!
//! ```text
//! { "vendors": { <vendorId>: { vendorId, vendorName, items: { <lineId>: CartLine } } } }
//! ```

use crate::models::MenuAddon;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One distinct (item, add-on selection) entry with its own quantity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Content-addressed merge key: item id + sorted add-on ids
    pub line_id: String,
    pub item_id: String,
    pub name: String,
    pub unit_price: Decimal,
    pub qty: i32,
    /// Value copies of the selected add-ons, ordered by id
    #[serde(default)]
    pub addons: Vec<MenuAddon>,
    /// Position in the group, in the order lines were first added
    #[serde(default)]
    pub seq: u64,
}

impl CartLine {
    /// Sum of the add-on surcharges for a single unit
    pub fn addon_total(&self) -> Decimal {
        self.addons.iter().map(|a| a.price).sum()
    }
}

/// The subset of a cart belonging to one stall
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct VendorCartGroup {
    pub vendor_id: String,
    pub vendor_name: String,
    #[serde(default)]
    pub items: BTreeMap<String, CartLine>,
}

impl VendorCartGroup {
    pub fn new(vendor_id: impl Into<String>, vendor_name: impl Into<String>) -> Self {
        Self {
            vendor_id: vendor_id.into(),
            vendor_name: vendor_name.into(),
            items: BTreeMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn line(&self, line_id: &str) -> Option<&CartLine> {
        self.items.get(line_id)
    }

    /// Lines in the order they were first added
    pub fn lines(&self) -> Vec<&CartLine> {
        let mut lines: Vec<&CartLine> = self.items.values().collect();
        lines.sort_by_key(|l| l.seq);
        lines
    }

    /// Sequence number for the next new line
    pub fn next_seq(&self) -> u64 {
        self.items.values().map(|l| l.seq + 1).max().unwrap_or(0)
    }
}

/// Customer cart, keyed by vendor id
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    #[serde(default)]
    pub vendors: BTreeMap<String, VendorCartGroup>,
}

impl Cart {
    pub fn is_empty(&self) -> bool {
        self.vendors.is_empty()
    }

    pub fn vendor(&self, vendor_id: &str) -> Option<&VendorCartGroup> {
        self.vendors.get(vendor_id)
    }

    /// Total number of units across every vendor group
    pub fn item_count(&self) -> i64 {
        self.vendors
            .values()
            .flat_map(|g| g.items.values())
            .map(|l| l.qty as i64)
            .sum()
    }
}
