//! Cart Store
//!
//! Owns the customer's in-progress cart, split per vendor. Every mutating
//! call is one atomic read-modify-write of the persisted `cart` document;
//! nothing is cached in memory between calls.

pub mod line_id;
pub mod ops;

pub use line_id::generate_line_id;

use crate::catalog::Catalog;
use crate::money;
use crate::storage::{CART_KEY, EngineStorage};
use rust_decimal::Decimal;
use shared::cart::{Cart, VendorCartGroup};
use shared::models::{MenuAddon, MenuItem, Stall};

/// Persisted per-vendor cart
#[derive(Debug, Clone)]
pub struct CartStore {
    storage: EngineStorage,
}

impl CartStore {
    pub fn new(storage: EngineStorage) -> Self {
        Self { storage }
    }

    // ========== Reads ==========

    /// Current cart (empty on first access)
    pub fn cart(&self) -> Cart {
        self.storage.load_or_default(CART_KEY)
    }

    pub fn vendor_group(&self, vendor_id: &str) -> Option<VendorCartGroup> {
        self.cart().vendors.remove(vendor_id)
    }

    /// Sum of quantities across the whole cart
    pub fn item_count(&self) -> i64 {
        self.cart().item_count()
    }

    pub fn vendor_subtotal(&self, vendor_id: &str) -> Option<Decimal> {
        self.vendor_group(vendor_id)
            .map(|g| money::vendor_subtotal(&g))
    }

    pub fn cart_total(&self) -> Decimal {
        money::cart_total(&self.cart())
    }

    // ========== Mutations ==========

    /// Add (or merge) a line; returns its line id
    ///
    /// Returns `None` when the catalog prices are invalid or the write failed.
    pub fn add_line(
        &self,
        vendor: &Stall,
        item: &MenuItem,
        qty: i32,
        selected_addons: &[MenuAddon],
    ) -> Option<String> {
        if let Err(e) = money::validate_prices(item, selected_addons) {
            tracing::warn!(vendor_id = %vendor.id, item_id = %item.id, error = %e, "Rejected cart line");
            return None;
        }
        self.mutate("add_line", |cart| {
            Some(ops::add_line(cart, vendor, item, qty, selected_addons))
        })
    }

    /// Resolve stall, item and add-ons through the catalog, then add the line
    ///
    /// Unknown add-on ids are ignored; only add-ons the item offers are kept.
    /// Unknown stalls, unknown items and sold-out items yield `None`.
    pub fn add_from_catalog(
        &self,
        catalog: &dyn Catalog,
        stall_id: &str,
        item_id: &str,
        qty: i32,
        addon_ids: &[&str],
    ) -> Option<String> {
        let Some(stall) = catalog.find_stall(stall_id) else {
            tracing::warn!(stall_id, "Stall not found in catalog");
            return None;
        };
        let Some(item) = catalog.find_menu_item(stall_id, item_id) else {
            tracing::warn!(stall_id, item_id, "Menu item not found in catalog");
            return None;
        };
        if !item.available {
            tracing::info!(stall_id, item_id, "Menu item is sold out");
            return None;
        }

        let addons: Vec<MenuAddon> = addon_ids
            .iter()
            .filter_map(|id| item.find_addon(id).cloned())
            .collect();
        self.add_line(&stall, &item, qty, &addons)
    }

    /// Adjust a line's quantity; `Some(0)` means the line was removed
    pub fn bump_qty(&self, vendor_id: &str, line_id: &str, delta: i32) -> Option<i32> {
        self.mutate("bump_qty", |cart| ops::bump_qty(cart, vendor_id, line_id, delta))
    }

    pub fn remove_line(&self, vendor_id: &str, line_id: &str) -> bool {
        self.mutate("remove_line", |cart| ops::remove_line(cart, vendor_id, line_id))
    }

    /// Drop one vendor group (after a successful payment)
    pub fn clear_vendor(&self, vendor_id: &str) -> bool {
        self.mutate("clear_vendor", |cart| {
            ops::clear_vendor(cart, vendor_id).is_some()
        })
    }

    /// Reset to an empty cart
    pub fn clear_all(&self) -> bool {
        self.mutate("clear_all", |cart| {
            *cart = Cart::default();
            true
        })
    }

    fn mutate<R: Default>(&self, op: &str, f: impl FnOnce(&mut Cart) -> R) -> R {
        self.storage.update(CART_KEY, f).unwrap_or_else(|e| {
            tracing::error!(op, error = %e, "Failed to persist cart");
            R::default()
        })
    }
}
