//! Money calculation utilities using rust_decimal for precision
//!
//! Every consumer (cart badge, checkout screen, order snapshot) goes through
//! these helpers so displayed and charged amounts never drift apart.
//! Amounts stay exact `Decimal` internally; rounding to two decimals happens
//! only in [`round_for_display`] / [`format_amount`].

use rust_decimal::prelude::*;
use shared::cart::{Cart, CartLine, VendorCartGroup};
use shared::models::{MenuAddon, MenuItem};
use thiserror::Error;

/// Rounding strategy for displayed amounts (2 decimal places, half away from zero)
const DECIMAL_PLACES: u32 = 2;

/// Price validation failures
#[derive(Debug, Error, PartialEq)]
pub enum MoneyError {
    #[error("price of item {item_id} must be non-negative, got {price}")]
    NegativeItemPrice { item_id: String, price: Decimal },

    #[error("price of add-on {addon_id} must be non-negative, got {price}")]
    NegativeAddonPrice { addon_id: String, price: Decimal },
}

/// Validate catalog prices before they are copied into a cart line
pub fn validate_prices(item: &MenuItem, addons: &[MenuAddon]) -> Result<(), MoneyError> {
    if item.price < Decimal::ZERO {
        return Err(MoneyError::NegativeItemPrice {
            item_id: item.id.clone(),
            price: item.price,
        });
    }
    if let Some(addon) = addons.iter().find(|a| a.price < Decimal::ZERO) {
        return Err(MoneyError::NegativeAddonPrice {
            addon_id: addon.id.clone(),
            price: addon.price,
        });
    }
    Ok(())
}

/// Per-unit price of a line: base price plus add-on surcharges
#[inline]
pub fn unit_price_with_addons(line: &CartLine) -> Decimal {
    line.unit_price + line.addon_total()
}

/// `qty × (unitPrice + Σ addon price)`
pub fn line_total(line: &CartLine) -> Decimal {
    unit_price_with_addons(line) * Decimal::from(line.qty)
}

/// Exact sum of line totals of one vendor group
pub fn vendor_subtotal(group: &VendorCartGroup) -> Decimal {
    group.items.values().map(line_total).sum()
}

/// Exact sum over every vendor group
pub fn cart_total(cart: &Cart) -> Decimal {
    cart.vendors.values().map(vendor_subtotal).sum()
}

/// Round to two decimals for display
#[inline]
pub fn round_for_display(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Render an amount with exactly two decimals ("12.60")
pub fn format_amount(value: Decimal) -> String {
    let mut rounded = round_for_display(value);
    rounded.rescale(DECIMAL_PLACES);
    rounded.to_string()
}

#[cfg(test)]
mod tests;
