//! Shopping cart service (one cart per user)

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::models::{
    cart_totals, check_order_limit, line_matches, merged_quantity, resolve_terms, CartLine,
    PricingTerms,
};
use shared::types::MediaAsset;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::product::Variant;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemInput {
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub quantity: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveCartItemInput {
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CartProduct {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub images: Json<Vec<MediaAsset>>,
    pub price: Decimal,
    pub order_limit: i32,
    pub discount: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemView {
    pub id: Uuid,
    pub product: CartProduct,
    pub variant: Option<Variant>,
    pub quantity: i32,
    pub price: Decimal,
    pub subtotal: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub id: Uuid,
    pub items: Vec<CartItemView>,
    pub total_price: Decimal,
    pub cart_items: usize,
}

#[derive(Debug, FromRow)]
struct ItemRow {
    id: Uuid,
    product_id: Uuid,
    variant_id: Option<Uuid>,
    quantity: i32,
    price: Decimal,
}

impl ItemRow {
    fn line(&self) -> CartLine {
        CartLine {
            product_id: self.product_id,
            variant_id: self.variant_id,
            quantity: self.quantity,
            price: self.price,
        }
    }
}

#[derive(Clone)]
pub struct CartService {
    db: PgPool,
}

impl CartService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn cart_id(&self, user_id: Uuid) -> AppResult<Option<Uuid>> {
        let id = sqlx::query_scalar::<_, Uuid>("SELECT id FROM carts WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?;
        Ok(id)
    }

    async fn items(&self, cart_id: Uuid) -> AppResult<Vec<ItemRow>> {
        let rows = sqlx::query_as::<_, ItemRow>(
            "SELECT id, product_id, variant_id, quantity, price FROM cart_items WHERE cart_id = $1 ORDER BY created_at",
        )
        .bind(cart_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    /// Price and order limit for a product, or for one of its variants
    async fn terms(&self, product_id: Uuid, variant_id: Option<Uuid>) -> AppResult<PricingTerms> {
        let (price, order_limit) = sqlx::query_as::<_, (Decimal, i32)>(
            "SELECT price, order_limit FROM products WHERE id = $1 AND is_active",
        )
        .bind(product_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;
        let product = PricingTerms { price, order_limit };

        let variant = match variant_id {
            Some(variant_id) => {
                let (price, order_limit) = sqlx::query_as::<_, (Decimal, i32)>(
                    "SELECT price, order_limit FROM product_variants WHERE id = $1 AND product_id = $2",
                )
                .bind(variant_id)
                .bind(product_id)
                .fetch_optional(&self.db)
                .await?
                .ok_or_else(|| AppError::NotFound("Variant".to_string()))?;
                Some(PricingTerms { price, order_limit })
            }
            None => None,
        };

        Ok(resolve_terms(product, variant))
    }

    fn find_line<'a>(items: &'a [ItemRow], product_id: Uuid, variant_id: Option<Uuid>) -> Option<&'a ItemRow> {
        items
            .iter()
            .find(|row| line_matches(row.product_id, row.variant_id, product_id, variant_id))
    }

    pub async fn get(&self, user_id: Uuid) -> AppResult<CartView> {
        let cart_id = self
            .cart_id(user_id)
            .await?
            .ok_or_else(|| AppError::Missing("Cart not found".to_string()))?;
        self.view(cart_id).await
    }

    async fn view(&self, cart_id: Uuid) -> AppResult<CartView> {
        let rows = self.items(cart_id).await?;
        let lines: Vec<CartLine> = rows.iter().map(ItemRow::line).collect();
        let totals = cart_totals(&lines);

        let product_ids: Vec<Uuid> = rows.iter().map(|r| r.product_id).collect();
        let products: HashMap<Uuid, CartProduct> = sqlx::query_as::<_, CartProduct>(
            "SELECT id, name, description, images, price, order_limit, discount FROM products WHERE id = ANY($1)",
        )
        .bind(&product_ids)
        .fetch_all(&self.db)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

        let variant_ids: Vec<Uuid> = rows.iter().filter_map(|r| r.variant_id).collect();
        let variants: HashMap<Uuid, Variant> = sqlx::query_as::<_, Variant>(
            "SELECT * FROM product_variants WHERE id = ANY($1)",
        )
        .bind(&variant_ids)
        .fetch_all(&self.db)
        .await?
        .into_iter()
        .map(|v| (v.id, v))
        .collect();

        let items = rows
            .into_iter()
            .zip(lines)
            .filter_map(|(row, line)| {
                let product = products.get(&row.product_id)?.clone();
                Some(CartItemView {
                    id: row.id,
                    product,
                    variant: row.variant_id.and_then(|v| variants.get(&v).cloned()),
                    quantity: row.quantity,
                    price: row.price,
                    subtotal: line.subtotal(),
                })
            })
            .collect();

        Ok(CartView {
            id: cart_id,
            items,
            total_price: totals.total_price,
            cart_items: totals.cart_items,
        })
    }

    /// Add units to the cart, merging with an existing line.
    ///
    /// A merged line keeps the price it was first added at and the order
    /// limit of its own variant; only its quantity changes.
    pub async fn add(&self, user_id: Uuid, input: CartItemInput) -> AppResult<CartView> {
        let requested = self.terms(input.product_id, input.variant_id).await?;

        let cart_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO carts (user_id) VALUES ($1)
            ON CONFLICT (user_id) DO UPDATE SET updated_at = NOW()
            RETURNING id
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;

        let items = self.items(cart_id).await?;
        match Self::find_line(&items, input.product_id, input.variant_id) {
            Some(row) => {
                let line_terms = if row.variant_id == input.variant_id {
                    requested
                } else {
                    self.terms(row.product_id, row.variant_id).await?
                };
                let merged = row.line().merge(input.quantity, line_terms.order_limit)?;
                sqlx::query("UPDATE cart_items SET quantity = $2 WHERE id = $1")
                    .bind(row.id)
                    .bind(merged.quantity)
                    .execute(&self.db)
                    .await?;
            }
            None => {
                let quantity = merged_quantity(None, input.quantity, requested.order_limit)?;
                sqlx::query(
                    "INSERT INTO cart_items (cart_id, product_id, variant_id, quantity, price) VALUES ($1, $2, $3, $4, $5)",
                )
                .bind(cart_id)
                .bind(input.product_id)
                .bind(input.variant_id)
                .bind(quantity)
                .bind(requested.price)
                .execute(&self.db)
                .await?;
            }
        }

        self.view(cart_id).await
    }

    /// Set the quantity of an existing line
    pub async fn update_quantity(&self, user_id: Uuid, input: CartItemInput) -> AppResult<CartView> {
        let cart_id = self
            .cart_id(user_id)
            .await?
            .ok_or_else(|| AppError::Missing("Cart not found".to_string()))?;
        let items = self.items(cart_id).await?;
        let line = Self::find_line(&items, input.product_id, input.variant_id)
            .ok_or_else(|| AppError::Missing("Item not found in cart".to_string()))?;

        let terms = self.terms(line.product_id, line.variant_id).await?;
        check_order_limit(input.quantity, terms.order_limit)?;

        sqlx::query("UPDATE cart_items SET quantity = $2 WHERE id = $1")
            .bind(line.id)
            .bind(input.quantity)
            .execute(&self.db)
            .await?;

        self.view(cart_id).await
    }

    pub async fn remove(&self, user_id: Uuid, input: RemoveCartItemInput) -> AppResult<CartView> {
        let cart_id = self
            .cart_id(user_id)
            .await?
            .ok_or_else(|| AppError::Missing("Cart not found".to_string()))?;
        let items = self.items(cart_id).await?;
        let line = Self::find_line(&items, input.product_id, input.variant_id)
            .ok_or_else(|| AppError::Missing("Item not found in cart".to_string()))?;

        sqlx::query("DELETE FROM cart_items WHERE id = $1")
            .bind(line.id)
            .execute(&self.db)
            .await?;

        self.view(cart_id).await
    }
}
