//! Catalog collaborator
//!
//! The engine only reads the catalog to price cart lines. The stall directory
//! and menu editing live elsewhere; they implement [`Catalog`].

use parking_lot::RwLock;
use shared::models::{MenuItem, Stall};
use std::collections::HashMap;

/// Read-only stall and menu lookup
pub trait Catalog: Send + Sync {
    fn find_stall(&self, stall_id: &str) -> Option<Stall>;
    fn find_menu_item(&self, stall_id: &str, item_id: &str) -> Option<MenuItem>;
}

#[derive(Debug, Clone)]
struct StallEntry {
    stall: Stall,
    items: Vec<MenuItem>,
}

/// Catalog held in memory (demo data, tests, cached remote menus)
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    stalls: RwLock<HashMap<String, StallEntry>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a stall together with its menu
    pub fn upsert_stall(&self, stall: Stall, items: Vec<MenuItem>) {
        let mut stalls = self.stalls.write();
        stalls.insert(stall.id.clone(), StallEntry { stall, items });
    }

    pub fn stalls(&self) -> Vec<Stall> {
        let stalls = self.stalls.read();
        let mut list: Vec<Stall> = stalls.values().map(|e| e.stall.clone()).collect();
        list.sort_by(|a, b| a.id.cmp(&b.id));
        list
    }

    pub fn menu(&self, stall_id: &str) -> Vec<MenuItem> {
        let stalls = self.stalls.read();
        stalls
            .get(stall_id)
            .map(|e| e.items.clone())
            .unwrap_or_default()
    }
}

impl Catalog for InMemoryCatalog {
    fn find_stall(&self, stall_id: &str) -> Option<Stall> {
        self.stalls.read().get(stall_id).map(|e| e.stall.clone())
    }

    fn find_menu_item(&self, stall_id: &str, item_id: &str) -> Option<MenuItem> {
        let stalls = self.stalls.read();
        stalls
            .get(stall_id)?
            .items
            .iter()
            .find(|i| i.id == item_id)
            .cloned()
    }
}
