//! Shopping cart pricing and order-limit rules

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Cart rule violations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    #[error("We're sorry! Only {limit} unit(s) allowed in each order")]
    OrderLimitExceeded { limit: i32 },

    #[error("Quantity must be at least 1")]
    InvalidQuantity,
}

/// Price and per-order limit that apply to a cart line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingTerms {
    pub price: Decimal,
    pub order_limit: i32,
}

/// A variant's own price and limit override the product's
pub fn resolve_terms(product: PricingTerms, variant: Option<PricingTerms>) -> PricingTerms {
    variant.unwrap_or(product)
}

/// Quantity after adding `requested` units to an existing line (or a fresh one)
pub fn merged_quantity(
    existing: Option<i32>,
    requested: i32,
    order_limit: i32,
) -> Result<i32, CartError> {
    if requested < 1 {
        return Err(CartError::InvalidQuantity);
    }
    let total = existing
        .unwrap_or(0)
        .checked_add(requested)
        .ok_or(CartError::OrderLimitExceeded { limit: order_limit })?;
    check_order_limit(total, order_limit)?;
    Ok(total)
}

/// Reject quantities above the per-order limit
pub fn check_order_limit(quantity: i32, order_limit: i32) -> Result<(), CartError> {
    if quantity < 1 {
        return Err(CartError::InvalidQuantity);
    }
    if quantity > order_limit {
        return Err(CartError::OrderLimitExceeded { limit: order_limit });
    }
    Ok(())
}

/// Whether a stored line matches a request for `product` (and optionally `variant`).
///
/// Without a variant in the request, any line of the product matches.
pub fn line_matches(
    line_product: Uuid,
    line_variant: Option<Uuid>,
    product: Uuid,
    variant: Option<Uuid>,
) -> bool {
    line_product == product && variant.map_or(true, |v| line_variant == Some(v))
}

/// A priced cart line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub quantity: i32,
    pub price: Decimal,
}

impl CartLine {
    pub fn subtotal(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }

    /// Add units to this line under `order_limit`, keeping the price it was added at
    pub fn merge(&self, requested: i32, order_limit: i32) -> Result<CartLine, CartError> {
        Ok(CartLine {
            quantity: merged_quantity(Some(self.quantity), requested, order_limit)?,
            ..self.clone()
        })
    }
}

/// Cart totals
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub total_price: Decimal,
    pub cart_items: usize,
}

pub fn cart_totals(lines: &[CartLine]) -> CartTotals {
    CartTotals {
        total_price: lines.iter().map(CartLine::subtotal).sum(),
        cart_items: lines.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_overrides_terms() {
        let product = PricingTerms {
            price: Decimal::from(100),
            order_limit: 5,
        };
        let variant = PricingTerms {
            price: Decimal::from(120),
            order_limit: 2,
        };
        assert_eq!(resolve_terms(product, Some(variant)), variant);
        assert_eq!(resolve_terms(product, None), product);
    }

    #[test]
    fn test_merged_quantity_respects_limit() {
        assert_eq!(merged_quantity(None, 2, 3), Ok(2));
        assert_eq!(merged_quantity(Some(2), 1, 3), Ok(3));
        assert_eq!(
            merged_quantity(Some(2), 2, 3),
            Err(CartError::OrderLimitExceeded { limit: 3 })
        );
        assert_eq!(merged_quantity(None, 0, 3), Err(CartError::InvalidQuantity));
    }

    #[test]
    fn test_merged_quantity_overflow_is_limit_error() {
        assert_eq!(
            merged_quantity(Some(1), i32::MAX, 5),
            Err(CartError::OrderLimitExceeded { limit: 5 })
        );
    }

    #[test]
    fn test_merge_keeps_line_price() {
        let line = CartLine {
            product_id: Uuid::new_v4(),
            variant_id: Some(Uuid::new_v4()),
            quantity: 1,
            price: Decimal::from(50),
        };
        let merged = line.merge(1, 10).unwrap();
        assert_eq!(merged.quantity, 2);
        assert_eq!(merged.price, Decimal::from(50));
        assert_eq!(merged.variant_id, line.variant_id);
    }

    #[test]
    fn test_limit_message() {
        let err = CartError::OrderLimitExceeded { limit: 1 };
        assert_eq!(err.to_string(), "We're sorry! Only 1 unit(s) allowed in each order");
    }

    #[test]
    fn test_line_matches() {
        let (p, v) = (Uuid::new_v4(), Uuid::new_v4());
        assert!(line_matches(p, Some(v), p, None));
        assert!(line_matches(p, Some(v), p, Some(v)));
        assert!(!line_matches(p, None, p, Some(v)));
        assert!(!line_matches(p, None, Uuid::new_v4(), None));
    }

    #[test]
    fn test_cart_totals() {
        let lines = vec![
            CartLine {
                product_id: Uuid::new_v4(),
                variant_id: None,
                quantity: 2,
                price: "19.99".parse().unwrap(),
            },
            CartLine {
                product_id: Uuid::new_v4(),
                variant_id: None,
                quantity: 1,
                price: Decimal::from(5),
            },
        ];
        let totals = cart_totals(&lines);
        assert_eq!(totals.total_price, "44.98".parse::<Decimal>().unwrap());
        assert_eq!(totals.cart_items, 2);
    }
}
