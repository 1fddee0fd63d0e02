//! Product catalogue tests
//!
//! Property-based and unit tests for:
//! - Slug and SKU generation
//! - Discount pricing
//! - Category levels and the three-level category tree

use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::identifiers::{dashed_candidate, generate_sku, slugify};
use shared::{
    build_category_tree, discounted_price, primary_attribute_value, validate_category_parent,
    CategoryLevel, CategoryNode, ProductAttribute,
};
use uuid::Uuid;

// ============================================================================
// Property Test Strategies
// ============================================================================

/// Generate product names (words of letters and digits)
fn product_name_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9]{1,8}( [A-Za-z][A-Za-z0-9]{1,8}){0,5}"
}

/// Generate arbitrary titles including punctuation
fn title_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z0-9 !?&.,'-]{0,40}"
}

/// Generate prices (0.01 - 99999.99)
fn price_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

/// Generate discount percentages, including out-of-range values
fn discount_strategy() -> impl Strategy<Value = Decimal> {
    (-20i64..150).prop_map(Decimal::from)
}

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn node(name: &str, level: i32, parent_id: Option<Uuid>) -> CategoryNode {
    CategoryNode {
        id: Uuid::new_v4(),
        name: name.to_string(),
        level,
        parent_id,
    }
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Slugs only hold lowercase alphanumerics and single inner dashes
    #[test]
    fn prop_slug_shape(title in title_strategy()) {
        let slug = slugify(&title);
        prop_assert!(slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
        prop_assert!(!slug.starts_with('-'));
        prop_assert!(!slug.ends_with('-'));
        prop_assert!(!slug.contains("--"));
    }

    /// Slugifying a slug changes nothing
    #[test]
    fn prop_slug_idempotent(title in title_strategy()) {
        let slug = slugify(&title);
        prop_assert_eq!(slugify(&slug), slug);
    }

    /// SKUs have three dash-separated parts ending in four digits
    #[test]
    fn prop_sku_format(
        name in product_name_strategy(),
        attribute in prop::option::of("[a-z0-9 ]{1,10}"),
        digits in any::<u16>(),
    ) {
        let sku = generate_sku(&name, attribute.as_deref(), digits);
        let parts: Vec<&str> = sku.rsplitn(2, '-').collect();
        prop_assert_eq!(parts.len(), 2);
        prop_assert_eq!(parts[0].len(), 4);
        prop_assert!(parts[0].chars().all(|c| c.is_ascii_digit()));

        let initials = sku.split('-').next().unwrap_or_default();
        prop_assert!(!initials.is_empty() && initials.chars().count() <= 4);
    }

    /// A discount never raises the price or makes it negative
    #[test]
    fn prop_discount_bounds(price in price_strategy(), discount in discount_strategy()) {
        let sale = discounted_price(price, discount);
        prop_assert!(sale <= price);
        prop_assert!(sale >= Decimal::ZERO);
    }

    /// Only levels 0 to 2 exist
    #[test]
    fn prop_category_level_range(level in -5i32..10) {
        prop_assert_eq!(CategoryLevel::new(level).is_ok(), (0..=2).contains(&level));
    }
}

// ============================================================================
// Identifier Tests
// ============================================================================

#[cfg(test)]
mod identifier_tests {
    use super::*;

    #[test]
    fn test_product_slug() {
        assert_eq!(slugify("Men's Running Shoes"), "men-s-running-shoes");
        assert_eq!(slugify("4K   TV"), "4k-tv");
    }

    #[test]
    fn test_unique_slug_candidates() {
        let base = slugify("Denim Jacket");
        assert_eq!(dashed_candidate(&base, 0), "denim-jacket");
        assert_eq!(dashed_candidate(&base, 1), "denim-jacket-1");
    }

    #[test]
    fn test_sku_uses_primary_attribute() {
        let attrs = vec![
            ProductAttribute {
                name: Some("colour".to_string()),
                values: vec!["navy blue".to_string(), "black".to_string()],
            },
            ProductAttribute {
                name: Some("size".to_string()),
                values: vec!["M".to_string()],
            },
        ];
        let value = primary_attribute_value(&attrs);
        assert_eq!(value, Some("navy blue"));
        assert_eq!(generate_sku("Slim Fit Chino", value, 12), "SFC-NAVY-0012");
    }

    #[test]
    fn test_empty_attribute_value_ignored() {
        let attrs = vec![ProductAttribute {
            name: None,
            values: vec![String::new()],
        }];
        assert_eq!(primary_attribute_value(&attrs), None);
    }
}

// ============================================================================
// Pricing Tests
// ============================================================================

#[cfg(test)]
mod pricing_tests {
    use super::*;

    #[test]
    fn test_percentage_discount() {
        assert_eq!(discounted_price(dec("1499.00"), dec("20")), dec("1199.20"));
    }

    #[test]
    fn test_discount_rounds_to_cents() {
        assert_eq!(discounted_price(dec("10.00"), dec("33")), dec("6.70"));
    }

    #[test]
    fn test_negative_discount_ignored() {
        assert_eq!(discounted_price(dec("80"), dec("-5")), dec("80"));
    }
}

// ============================================================================
// Category Tree Tests
// ============================================================================

#[cfg(test)]
mod category_tests {
    use super::*;

    #[test]
    fn test_parent_must_be_one_level_up() {
        let root = CategoryLevel::ROOT;
        let mid = CategoryLevel::new(1).unwrap();
        let leaf = CategoryLevel::new(2).unwrap();

        assert!(validate_category_parent(root, Some(root)).is_err());
        assert!(validate_category_parent(mid, Some(root)).is_ok());
        assert!(validate_category_parent(leaf, Some(leaf)).is_err());
        assert_eq!(leaf.value(), 2);
    }

    #[test]
    fn test_tree_groups_three_levels() {
        let electronics = node("Electronics", 0, None);
        let fashion = node("Fashion", 0, None);
        let phones = node("Phones", 1, Some(electronics.id));
        let women = node("Women", 1, Some(fashion.id));
        let android = node("Android", 2, Some(phones.id));
        let ios = node("iOS", 2, Some(phones.id));
        let dresses = node("Dresses", 2, Some(women.id));

        let tree = build_category_tree(&[
            android, ios, dresses, phones, women, electronics, fashion,
        ]);

        assert_eq!(tree.len(), 2);
        assert_eq!(
            tree["Electronics"]["Phones"],
            vec!["Android".to_string(), "iOS".to_string()]
        );
        assert_eq!(tree["Fashion"]["Women"], vec!["Dresses".to_string()]);
    }

    #[test]
    fn test_root_without_children_kept() {
        let tree = build_category_tree(&[node("Books", 0, None)]);
        assert!(tree["Books"].is_empty());
    }

    #[test]
    fn test_broken_ancestry_dropped() {
        let orphan_mid = node("Orphan", 1, Some(Uuid::new_v4()));
        let leaf = node("Leaf", 2, Some(orphan_mid.id));
        let tree = build_category_tree(&[orphan_mid, leaf]);
        assert!(tree.is_empty());
    }
}
