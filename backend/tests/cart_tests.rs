//! Cart and wishlist pricing tests
//!
//! Property-based and unit tests for:
//! - Variant price and order-limit resolution
//! - Quantity merging against the per-order limit, up to i32 bounds
//! - Merged lines keeping their own variant and price
//! - Cart line matching and totals

use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{
    cart_totals, check_order_limit, line_matches, merged_quantity, resolve_terms,
    validate_quantity, CartError, CartLine, PricingTerms,
};
use uuid::Uuid;

// ============================================================================
// Property Test Strategies
// ============================================================================

/// Generate prices with two decimal places (0.01 - 9999.99)
fn price_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

/// Generate per-order limits
fn order_limit_strategy() -> impl Strategy<Value = i32> {
    1i32..20
}

fn terms_strategy() -> impl Strategy<Value = PricingTerms> {
    (price_strategy(), order_limit_strategy())
        .prop_map(|(price, order_limit)| PricingTerms { price, order_limit })
}

/// Generate quantities across the whole positive i32 range, biased to the edges
fn wide_quantity_strategy() -> impl Strategy<Value = i32> {
    prop_oneof![1i32..20, (i32::MAX - 20)..=i32::MAX, 1i32..=i32::MAX]
}

/// Generate priced cart lines, with or without a variant
fn cart_line_strategy() -> impl Strategy<Value = CartLine> {
    (
        any::<u128>(),
        prop::option::of(any::<u128>()),
        1i32..10,
        price_strategy(),
    )
        .prop_map(|(id, variant, quantity, price)| CartLine {
            product_id: Uuid::from_u128(id),
            variant_id: variant.map(Uuid::from_u128),
            quantity,
            price,
        })
}

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// A variant's terms always win over the product's
    #[test]
    fn prop_variant_terms_override(product in terms_strategy(), variant in terms_strategy()) {
        prop_assert_eq!(resolve_terms(product, Some(variant)), variant);
        prop_assert_eq!(resolve_terms(product, None), product);
    }

    /// A merged quantity never exceeds the order limit, even near i32::MAX
    #[test]
    fn prop_merged_quantity_within_limit(
        existing in prop::option::of(wide_quantity_strategy()),
        requested in wide_quantity_strategy(),
        limit in prop_oneof![order_limit_strategy(), (i32::MAX - 5)..=i32::MAX],
    ) {
        let sum = i64::from(existing.unwrap_or(0)) + i64::from(requested);
        match merged_quantity(existing, requested, limit) {
            Ok(total) => {
                prop_assert_eq!(i64::from(total), sum);
                prop_assert!(total <= limit);
            }
            Err(CartError::OrderLimitExceeded { limit: reported }) => {
                prop_assert_eq!(reported, limit);
                prop_assert!(sum > i64::from(limit));
            }
            Err(other) => prop_assert!(false, "unexpected error {:?}", other),
        }
    }

    /// Merging only changes the quantity of a line
    #[test]
    fn prop_merge_keeps_price_and_variant(
        line in cart_line_strategy(),
        requested in 1i32..10,
        limit in 20i32..40,
    ) {
        let merged = line.merge(requested, limit).unwrap();
        prop_assert_eq!(merged.quantity, line.quantity + requested);
        prop_assert_eq!(merged.price, line.price);
        prop_assert_eq!(merged.variant_id, line.variant_id);
        prop_assert_eq!(merged.product_id, line.product_id);
    }

    /// Totals are the sum of line subtotals and count every line
    #[test]
    fn prop_cart_totals(lines in prop::collection::vec(cart_line_strategy(), 0..10)) {
        let totals = cart_totals(&lines);
        let expected: Decimal = lines
            .iter()
            .map(|l| l.price * Decimal::from(l.quantity))
            .sum();
        prop_assert_eq!(totals.total_price, expected);
        prop_assert_eq!(totals.cart_items, lines.len());
    }

    /// A request without a variant matches any line of the same product
    #[test]
    fn prop_line_matches_without_variant(
        product in any::<u128>(),
        variant in prop::option::of(any::<u128>()),
    ) {
        let product = Uuid::from_u128(product);
        let variant = variant.map(Uuid::from_u128);
        prop_assert!(line_matches(product, variant, product, None));
    }
}

// ============================================================================
// Order Limit Tests
// ============================================================================

#[cfg(test)]
mod order_limit_tests {
    use super::*;

    #[test]
    fn test_add_to_empty_cart() {
        assert_eq!(merged_quantity(None, 2, 5), Ok(2));
    }

    #[test]
    fn test_merge_into_existing_line() {
        assert_eq!(merged_quantity(Some(2), 3, 5), Ok(5));
    }

    #[test]
    fn test_merge_exceeding_limit() {
        assert_eq!(
            merged_quantity(Some(4), 2, 5),
            Err(CartError::OrderLimitExceeded { limit: 5 })
        );
    }

    #[test]
    fn test_overflowing_merge_reports_limit() {
        assert_eq!(
            merged_quantity(Some(1), i32::MAX, 5),
            Err(CartError::OrderLimitExceeded { limit: 5 })
        );
        assert_eq!(
            merged_quantity(Some(i32::MAX), 1, i32::MAX),
            Err(CartError::OrderLimitExceeded { limit: i32::MAX })
        );
        assert_eq!(merged_quantity(Some(i32::MAX - 1), 1, i32::MAX), Ok(i32::MAX));
    }

    #[test]
    fn test_zero_quantity_rejected() {
        assert_eq!(merged_quantity(None, 0, 5), Err(CartError::InvalidQuantity));
        assert_eq!(check_order_limit(0, 5), Err(CartError::InvalidQuantity));
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(1).is_ok());
    }

    #[test]
    fn test_limit_error_message() {
        let err = CartError::OrderLimitExceeded { limit: 3 };
        assert_eq!(
            err.to_string(),
            "We're sorry! Only 3 unit(s) allowed in each order"
        );
    }
}

// ============================================================================
// Cart Line Tests
// ============================================================================

#[cfg(test)]
mod cart_line_tests {
    use super::*;

    #[test]
    fn test_variant_request_matches_only_that_variant() {
        let product = Uuid::new_v4();
        let (red, blue) = (Uuid::new_v4(), Uuid::new_v4());

        assert!(line_matches(product, Some(red), product, Some(red)));
        assert!(!line_matches(product, Some(blue), product, Some(red)));
        assert!(!line_matches(product, None, product, Some(red)));
    }

    #[test]
    fn test_other_product_never_matches() {
        assert!(!line_matches(Uuid::new_v4(), None, Uuid::new_v4(), None));
    }

    #[test]
    fn test_subtotal_and_totals() {
        let lines = vec![
            CartLine {
                product_id: Uuid::new_v4(),
                variant_id: None,
                quantity: 2,
                price: dec("19.99"),
            },
            CartLine {
                product_id: Uuid::new_v4(),
                variant_id: Some(Uuid::new_v4()),
                quantity: 1,
                price: dec("5.02"),
            },
        ];

        assert_eq!(lines[0].subtotal(), dec("39.98"));
        let totals = cart_totals(&lines);
        assert_eq!(totals.total_price, dec("45.00"));
        assert_eq!(totals.cart_items, 2);
    }

    #[test]
    fn test_variant_line_keeps_price_when_product_added_again() {
        let product = Uuid::new_v4();
        let variant = Uuid::new_v4();
        // Product-level price is zero once the product has variants
        let product_terms = PricingTerms {
            price: Decimal::ZERO,
            order_limit: 10,
        };
        let variant_terms = PricingTerms {
            price: dec("50"),
            order_limit: 10,
        };
        let added = resolve_terms(product_terms, Some(variant_terms));
        let line = CartLine {
            product_id: product,
            variant_id: Some(variant),
            quantity: merged_quantity(None, 1, added.order_limit).unwrap(),
            price: added.price,
        };
        assert_eq!(cart_totals(std::slice::from_ref(&line)).total_price, dec("50"));

        // A request without a variant lands on the variant line
        assert!(line_matches(line.product_id, line.variant_id, product, None));
        let merged = line.merge(1, variant_terms.order_limit).unwrap();

        assert_eq!(merged.quantity, 2);
        assert_eq!(merged.price, dec("50"));
        let totals = cart_totals(&[merged]);
        assert_eq!(totals.total_price, dec("100"));
        assert_eq!(totals.cart_items, 1);
    }

    #[test]
    fn test_merge_uses_line_variant_limit() {
        let line = CartLine {
            product_id: Uuid::new_v4(),
            variant_id: Some(Uuid::new_v4()),
            quantity: 2,
            price: dec("12.50"),
        };
        assert_eq!(
            line.merge(1, 2),
            Err(CartError::OrderLimitExceeded { limit: 2 })
        );
    }

    #[test]
    fn test_empty_cart_totals() {
        let totals = cart_totals(&[]);
        assert_eq!(totals.total_price, Decimal::ZERO);
        assert_eq!(totals.cart_items, 0);
    }

    #[test]
    fn test_totals_json_shape() {
        let json = serde_json::to_value(cart_totals(&[])).unwrap();
        assert!(json.get("totalPrice").is_some());
        assert_eq!(json["cartItems"], 0);
    }
}
