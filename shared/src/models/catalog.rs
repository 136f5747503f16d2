//! Catalog Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Food stall entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Stall {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cuisine: Option<String>,
}

impl Stall {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            cuisine: None,
        }
    }
}

/// Add-on offered with a menu item (extra egg, upsize, ...)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MenuAddon {
    pub id: String,
    pub name: String,
    /// Price surcharge per unit, never negative
    pub price: Decimal,
}

impl MenuAddon {
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: Decimal) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
        }
    }
}

/// Menu item entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: String,
    pub name: String,
    pub price: Decimal,
    #[serde(default)]
    pub addons: Vec<MenuAddon>,
    /// Sold-out items stay listed but cannot be added to a cart
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

impl MenuItem {
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: Decimal) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            addons: Vec::new(),
            available: true,
        }
    }

    pub fn with_addons(mut self, addons: Vec<MenuAddon>) -> Self {
        self.addons = addons;
        self
    }

    /// Look up an add-on this item offers
    pub fn find_addon(&self, addon_id: &str) -> Option<&MenuAddon> {
        self.addons.iter().find(|a| a.id == addon_id)
    }
}
