use super::*;
use std::collections::BTreeMap;

fn dec(value: &str) -> Decimal {
    Decimal::from_str(value).unwrap()
}

fn line(id: &str, price: &str, qty: i32, addon_prices: &[&str]) -> CartLine {
    CartLine {
        line_id: id.to_string(),
        item_id: id.to_string(),
        name: format!("Item {}", id),
        unit_price: dec(price),
        qty,
        addons: addon_prices
            .iter()
            .enumerate()
            .map(|(i, p)| MenuAddon::new(format!("a{}", i), format!("Addon {}", i), dec(p)))
            .collect(),
        seq: 0,
    }
}

fn group(lines: Vec<CartLine>) -> VendorCartGroup {
    VendorCartGroup {
        vendor_id: "s1".to_string(),
        vendor_name: "Stall 1".to_string(),
        items: lines
            .into_iter()
            .map(|l| (l.line_id.clone(), l))
            .collect::<BTreeMap<_, _>>(),
    }
}

#[test]
fn test_accumulation_precision() {
    // Sum 0.01 one thousand times
    let mut total = Decimal::ZERO;
    for _ in 0..1000 {
        total += dec("0.01");
    }
    assert_eq!(total, dec("10"));
}

#[test]
fn test_line_total_without_addons() {
    let l = line("a", "10.99", 3, &[]);
    assert_eq!(line_total(&l), dec("32.97"));
}

#[test]
fn test_line_total_with_addons() {
    // 2 × (4.50 + 0.50 + 0.30)
    let l = line("a", "4.50", 2, &["0.50", "0.30"]);
    assert_eq!(unit_price_with_addons(&l), dec("5.30"));
    assert_eq!(line_total(&l), dec("10.60"));
}

#[test]
fn test_vendor_subtotal_example() {
    // 2×(4.50+0.80) + 1×2.00 = 12.60
    let g = group(vec![
        line("a", "4.50", 2, &["0.80"]),
        line("b", "2.00", 1, &[]),
    ]);
    assert_eq!(vendor_subtotal(&g), dec("12.60"));
    assert_eq!(format_amount(vendor_subtotal(&g)), "12.60");
}

#[test]
fn test_subtotal_stays_exact_until_display() {
    // 3 × 0.333 = 0.999 internally, 1.00 on screen
    let g = group(vec![line("a", "0.333", 3, &[])]);
    assert_eq!(vendor_subtotal(&g), dec("0.999"));
    assert_eq!(round_for_display(vendor_subtotal(&g)), dec("1.00"));
    assert_eq!(format_amount(vendor_subtotal(&g)), "1.00");
}

#[test]
fn test_round_half_away_from_zero() {
    assert_eq!(round_for_display(dec("2.345")), dec("2.35"));
    assert_eq!(round_for_display(dec("2.344")), dec("2.34"));
    assert_eq!(format_amount(dec("7")), "7.00");
}

#[test]
fn test_cart_total_spans_vendors() {
    let mut cart = Cart::default();
    let mut g2 = group(vec![line("c", "3.00", 1, &[])]);
    g2.vendor_id = "s2".to_string();
    cart.vendors.insert("s1".to_string(), group(vec![line("a", "1.50", 2, &[])]));
    cart.vendors.insert("s2".to_string(), g2);
    assert_eq!(cart_total(&cart), dec("6.00"));
    assert_eq!(cart_total(&Cart::default()), Decimal::ZERO);
}

#[test]
fn test_validate_prices() {
    let item = MenuItem::new("i1", "Kopi", dec("1.20"));
    let ok_addon = MenuAddon::new("a1", "Less sugar", Decimal::ZERO);
    assert!(validate_prices(&item, &[ok_addon]).is_ok());

    let bad_item = MenuItem::new("i2", "Broken", dec("-1"));
    assert!(matches!(
        validate_prices(&bad_item, &[]),
        Err(MoneyError::NegativeItemPrice { .. })
    ));

    let bad_addon = MenuAddon::new("a2", "Refund", dec("-0.10"));
    assert!(matches!(
        validate_prices(&item, &[bad_addon]),
        Err(MoneyError::NegativeAddonPrice { .. })
    ));
}
