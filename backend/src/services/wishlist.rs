//! Wishlist service

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::product::Product;

#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WishlistItem {
    #[sqlx(flatten)]
    pub product: Product,
    pub added_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct WishlistService {
    db: PgPool,
}

impl WishlistService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn list(&self, user_id: Uuid) -> AppResult<Vec<WishlistItem>> {
        let items = sqlx::query_as::<_, WishlistItem>(
            r#"
            SELECT p.*, w.created_at AS added_at
            FROM wishlists w
            JOIN products p ON p.id = w.product_id
            WHERE w.user_id = $1
            ORDER BY w.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(items)
    }

    pub async fn add(&self, user_id: Uuid, product_id: Uuid) -> AppResult<()> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM products WHERE id = $1)")
            .bind(product_id)
            .fetch_one(&self.db)
            .await?;
        if !exists {
            return Err(AppError::NotFound("Product".to_string()));
        }

        let inserted = sqlx::query(
            "INSERT INTO wishlists (user_id, product_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(product_id)
        .execute(&self.db)
        .await?;

        if inserted.rows_affected() == 0 {
            return Err(AppError::BadRequest("Product already in wishlist".to_string()));
        }
        Ok(())
    }

    pub async fn remove(&self, user_id: Uuid, product_id: Uuid) -> AppResult<()> {
        let removed = sqlx::query("DELETE FROM wishlists WHERE user_id = $1 AND product_id = $2")
            .bind(user_id)
            .bind(product_id)
            .execute(&self.db)
            .await?;

        if removed.rows_affected() == 0 {
            return Err(AppError::Missing("Product not found in wishlist".to_string()));
        }
        Ok(())
    }
}
