//! Read projections over the ledger: filtering, search, sort and stats

use rust_decimal::Decimal;
use shared::order::{Order, OrderQuery, OrderSort, OrderStats, OrderStatus};

/// Apply a query to a ledger snapshot (stored newest first)
pub fn select_orders(orders: &[Order], query: &OrderQuery) -> Vec<Order> {
    let needle = query
        .search
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());

    let mut selected: Vec<Order> = orders
        .iter()
        .filter(|o| query.status.is_none_or(|status| o.status == status))
        .filter(|o| needle.as_deref().is_none_or(|n| matches_search(o, n)))
        .cloned()
        .collect();

    // sort_by is stable: equal keys keep ledger order
    match query.sort {
        OrderSort::Newest => selected.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        OrderSort::Oldest => selected.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
        OrderSort::TotalAsc => selected.sort_by(|a, b| a.total.cmp(&b.total)),
        OrderSort::TotalDesc => selected.sort_by(|a, b| b.total.cmp(&a.total)),
    }

    selected
}

/// Case-insensitive match on vendor name or any item name; `needle` is lowercase
fn matches_search(order: &Order, needle: &str) -> bool {
    order.vendor_name.to_lowercase().contains(needle)
        || order
            .items
            .iter()
            .any(|i| i.name.to_lowercase().contains(needle))
}

/// Aggregate statistics
///
/// Failed orders count towards `total_orders` only. The favourite item is the
/// highest cumulative quantity; on a tie the first name met while walking the
/// ledger wins.
pub fn compute_stats(orders: &[Order]) -> OrderStats {
    let mut total_spent = Decimal::ZERO;
    // Insertion-ordered tally keeps tie-breaking stable
    let mut tally: Vec<(&str, i64)> = Vec::new();

    for order in orders.iter().filter(|o| o.status != OrderStatus::Failed) {
        total_spent += order.total;
        for item in &order.items {
            match tally.iter_mut().find(|(name, _)| *name == item.name) {
                Some((_, qty)) => *qty += item.qty as i64,
                None => tally.push((item.name.as_str(), item.qty as i64)),
            }
        }
    }

    let mut favorite: Option<(&str, i64)> = None;
    for (name, qty) in tally {
        if favorite.is_none_or(|(_, best)| qty > best) {
            favorite = Some((name, qty));
        }
    }

    OrderStats {
        total_orders: orders.len(),
        total_spent,
        favorite_item: favorite
            .map(|(name, _)| name.to_string())
            .unwrap_or_else(|| "-".to_string()),
    }
}
