//! Pure cart mutations
//!
//! These operate on an in-memory [`Cart`]; [`super::CartStore`] wraps each one
//! in a storage read-modify-write.

use super::line_id::generate_line_id;
use shared::cart::{Cart, CartLine, VendorCartGroup};
use shared::models::{MenuAddon, MenuItem, Stall};
use tracing::debug;

/// Sort add-ons by id and drop repeated selections
pub fn normalize_addons(addons: &[MenuAddon]) -> Vec<MenuAddon> {
    let mut sorted = addons.to_vec();
    sorted.sort_by(|a, b| a.id.cmp(&b.id));
    sorted.dedup_by(|a, b| a.id == b.id);
    sorted
}

/// Add `qty` units of an item with the given add-ons; returns the line id
///
/// `qty <= 0` is coerced to 1. An existing line with the same item and add-on
/// set absorbs the quantity and keeps its original price snapshot.
pub fn add_line(
    cart: &mut Cart,
    vendor: &Stall,
    item: &MenuItem,
    qty: i32,
    selected_addons: &[MenuAddon],
) -> String {
    let qty = qty.max(1);
    let addons = normalize_addons(selected_addons);
    let addon_ids: Vec<&str> = addons.iter().map(|a| a.id.as_str()).collect();
    let line_id = generate_line_id(&item.id, &addon_ids);

    let group = cart
        .vendors
        .entry(vendor.id.clone())
        .or_insert_with(|| VendorCartGroup::new(vendor.id.clone(), vendor.name.clone()));

    match group.items.get_mut(&line_id) {
        Some(line) => {
            line.qty = line.qty.saturating_add(qty);
            debug!(vendor_id = %vendor.id, line_id = %line_id, qty = line.qty, "Merged cart line");
        }
        None => {
            let seq = group.next_seq();
            group.items.insert(
                line_id.clone(),
                CartLine {
                    line_id: line_id.clone(),
                    item_id: item.id.clone(),
                    name: item.name.clone(),
                    unit_price: item.price,
                    qty,
                    addons,
                    seq,
                },
            );
            debug!(vendor_id = %vendor.id, line_id = %line_id, qty, "Created cart line");
        }
    }

    line_id
}

/// Change a line's quantity by `delta`
///
/// Returns the new quantity (`Some(0)` when the line was removed) or `None`
/// when the vendor group or line does not exist.
pub fn bump_qty(cart: &mut Cart, vendor_id: &str, line_id: &str, delta: i32) -> Option<i32> {
    let group = cart.vendors.get_mut(vendor_id)?;
    let line = group.items.get_mut(line_id)?;

    let qty = line.qty.saturating_add(delta);
    if qty > 0 {
        line.qty = qty;
        return Some(qty);
    }

    group.items.remove(line_id);
    drop_if_empty(cart, vendor_id);
    Some(0)
}

/// Delete a line; returns whether anything was removed
pub fn remove_line(cart: &mut Cart, vendor_id: &str, line_id: &str) -> bool {
    let Some(group) = cart.vendors.get_mut(vendor_id) else {
        return false;
    };
    let removed = group.items.remove(line_id).is_some();
    drop_if_empty(cart, vendor_id);
    removed
}

/// Delete a whole vendor group
pub fn clear_vendor(cart: &mut Cart, vendor_id: &str) -> Option<VendorCartGroup> {
    cart.vendors.remove(vendor_id)
}

fn drop_if_empty(cart: &mut Cart, vendor_id: &str) {
    if cart.vendors.get(vendor_id).is_some_and(|g| g.is_empty()) {
        cart.vendors.remove(vendor_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn stall() -> Stall {
        Stall::new("s1", "Ah Seng Chicken Rice")
    }

    fn item() -> MenuItem {
        MenuItem::new("rice", "Chicken Rice", Decimal::new(450, 2))
    }

    fn egg() -> MenuAddon {
        MenuAddon::new("egg", "Braised Egg", Decimal::new(80, 2))
    }

    fn chili() -> MenuAddon {
        MenuAddon::new("chili", "Extra Chili", Decimal::new(20, 2))
    }

    #[test]
    fn test_same_combination_merges() {
        let mut cart = Cart::default();
        let a = add_line(&mut cart, &stall(), &item(), 2, &[egg()]);
        let b = add_line(&mut cart, &stall(), &item(), 3, &[egg()]);

        assert_eq!(a, b);
        let group = cart.vendor("s1").unwrap();
        assert_eq!(group.items.len(), 1);
        assert_eq!(group.line(&a).unwrap().qty, 5);
    }

    #[test]
    fn test_merge_saturates_quantity() {
        let mut cart = Cart::default();
        let id = add_line(&mut cart, &stall(), &item(), i32::MAX, &[]);
        add_line(&mut cart, &stall(), &item(), 1, &[]);
        assert_eq!(cart.vendor("s1").unwrap().line(&id).unwrap().qty, i32::MAX);
    }

    #[test]
    fn test_lines_keep_add_order() {
        let mut cart = Cart::default();
        let laksa = MenuItem::new("laksa", "Curry Laksa", Decimal::new(650, 2));
        let kopi = MenuItem::new("kopi", "Kopi O", Decimal::new(140, 2));
        add_line(&mut cart, &stall(), &laksa, 1, &[]);
        add_line(&mut cart, &stall(), &kopi, 1, &[]);
        // Merging does not move a line
        add_line(&mut cart, &stall(), &laksa, 1, &[]);

        let names: Vec<&str> = cart.vendor("s1").unwrap().lines().iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["Curry Laksa", "Kopi O"]);
    }

    #[test]
    fn test_addon_order_does_not_split_lines() {
        let mut cart = Cart::default();
        let a = add_line(&mut cart, &stall(), &item(), 1, &[egg(), chili()]);
        let b = add_line(&mut cart, &stall(), &item(), 1, &[chili(), egg()]);
        assert_eq!(a, b);
        let line = cart.vendor("s1").unwrap().line(&a).unwrap();
        assert_eq!(line.qty, 2);
        // Stored ordered by id
        assert_eq!(line.addons[0].id, "chili");
        assert_eq!(line.addons[1].id, "egg");
    }

    #[test]
    fn test_disjoint_addons_make_two_lines() {
        let mut cart = Cart::default();
        let a = add_line(&mut cart, &stall(), &item(), 1, &[egg()]);
        let b = add_line(&mut cart, &stall(), &item(), 1, &[chili()]);
        assert_ne!(a, b);
        assert_eq!(cart.vendor("s1").unwrap().items.len(), 2);
    }

    #[test]
    fn test_non_positive_qty_coerced_to_one() {
        let mut cart = Cart::default();
        let a = add_line(&mut cart, &stall(), &item(), 0, &[]);
        assert_eq!(cart.vendor("s1").unwrap().line(&a).unwrap().qty, 1);
        add_line(&mut cart, &stall(), &item(), -4, &[]);
        assert_eq!(cart.vendor("s1").unwrap().line(&a).unwrap().qty, 2);
    }

    #[test]
    fn test_addons_are_value_copies() {
        let mut cart = Cart::default();
        let mut addon = egg();
        let id = add_line(&mut cart, &stall(), &item(), 1, std::slice::from_ref(&addon));
        addon.price = Decimal::new(999, 2);
        let line = cart.vendor("s1").unwrap().line(&id).unwrap();
        assert_eq!(line.addons[0].price, Decimal::new(80, 2));
    }

    #[test]
    fn test_bump_to_zero_removes_line_and_group() {
        let mut cart = Cart::default();
        let id = add_line(&mut cart, &stall(), &item(), 1, &[]);

        assert_eq!(bump_qty(&mut cart, "s1", &id, -1), Some(0));
        assert!(cart.vendor("s1").is_none());
        assert!(cart.is_empty());
    }

    #[test]
    fn test_bump_keeps_group_with_other_lines() {
        let mut cart = Cart::default();
        let a = add_line(&mut cart, &stall(), &item(), 1, &[]);
        let b = add_line(&mut cart, &stall(), &item(), 1, &[egg()]);

        assert_eq!(bump_qty(&mut cart, "s1", &a, 1), Some(2));
        assert_eq!(bump_qty(&mut cart, "s1", &b, -5), Some(0));
        let group = cart.vendor("s1").unwrap();
        assert_eq!(group.items.len(), 1);
        assert_eq!(group.line(&a).unwrap().qty, 2);
    }

    #[test]
    fn test_missing_targets_are_noops() {
        let mut cart = Cart::default();
        assert_eq!(bump_qty(&mut cart, "nope", "x", 1), None);
        assert!(!remove_line(&mut cart, "nope", "x"));

        let id = add_line(&mut cart, &stall(), &item(), 1, &[]);
        assert_eq!(bump_qty(&mut cart, "s1", "x", 1), None);
        assert!(!remove_line(&mut cart, "s1", "x"));
        assert_eq!(cart.vendor("s1").unwrap().line(&id).unwrap().qty, 1);
    }

    #[test]
    fn test_remove_line_cleans_group() {
        let mut cart = Cart::default();
        let id = add_line(&mut cart, &stall(), &item(), 3, &[]);
        assert!(remove_line(&mut cart, "s1", &id));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_clear_vendor() {
        let mut cart = Cart::default();
        add_line(&mut cart, &stall(), &item(), 1, &[]);
        add_line(&mut cart, &Stall::new("s2", "Laksa"), &item(), 1, &[]);

        let removed = clear_vendor(&mut cart, "s1").unwrap();
        assert_eq!(removed.vendor_id, "s1");
        assert!(cart.vendor("s1").is_none());
        assert!(cart.vendor("s2").is_some());
        assert!(clear_vendor(&mut cart, "s1").is_none());
    }
}
