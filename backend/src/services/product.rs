//! Product catalogue service

use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::identifiers::{generate_sku, slugify};
use shared::models::{primary_attribute_value, ProductAttribute};
use shared::types::MediaAsset;
use shared::validation::validate_title;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::access::{check, required};

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub images: Json<Vec<MediaAsset>>,
    pub brand: Option<String>,
    pub tags: Vec<String>,
    pub avg_ratings: Decimal,
    pub price: Decimal,
    pub discount: Decimal,
    pub stock: i32,
    pub order_limit: i32,
    pub attributes: Json<Vec<ProductAttribute>>,
    pub sku: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    pub id: Uuid,
    pub product_id: Uuid,
    pub sku: String,
    pub price: Decimal,
    pub discount: Decimal,
    pub images: Json<Vec<MediaAsset>>,
    pub attributes: Json<Vec<ProductAttribute>>,
    pub stock: i32,
    pub order_limit: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ProductWithVariants {
    #[serde(flatten)]
    pub product: Product,
    pub variants: Vec<Variant>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantInput {
    pub sku: Option<String>,
    pub price: Decimal,
    pub discount: Option<Decimal>,
    #[serde(default)]
    pub images: Vec<MediaAsset>,
    #[serde(default)]
    pub attributes: Vec<ProductAttribute>,
    pub stock: Option<i32>,
    pub order_limit: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductInput {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub images: Vec<MediaAsset>,
    pub brand: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub price: Option<Decimal>,
    pub discount: Option<Decimal>,
    pub stock: Option<i32>,
    pub order_limit: Option<i32>,
    #[serde(default)]
    pub attributes: Vec<ProductAttribute>,
    pub sku: Option<String>,
    pub is_active: Option<bool>,
    pub variants: Option<Vec<VariantInput>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub images: Option<Vec<MediaAsset>>,
    pub brand: Option<String>,
    pub tags: Option<Vec<String>>,
    pub price: Option<Decimal>,
    pub discount: Option<Decimal>,
    pub stock: Option<i32>,
    pub order_limit: Option<i32>,
    pub attributes: Option<Vec<ProductAttribute>>,
    pub sku: Option<String>,
    pub is_active: Option<bool>,
    pub variants: Option<Vec<VariantInput>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductStatusInput {
    pub is_active: bool,
}

/// An explicit SKU wins over a generated one
fn sku_for(name: &str, explicit: Option<String>, attributes: &[ProductAttribute]) -> String {
    explicit
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| {
            generate_sku(
                name,
                primary_attribute_value(attributes),
                rand::thread_rng().gen_range(0..10_000),
            )
        })
}

fn validate_pricing(price: Option<Decimal>, discount: Option<Decimal>, order_limit: Option<i32>) -> AppResult<()> {
    if price.is_some_and(|p| p < Decimal::ZERO) {
        return Err(AppError::validation("price", "Price cannot be negative"));
    }
    if discount.is_some_and(|d| d < Decimal::ZERO || d > Decimal::from(100)) {
        return Err(AppError::validation("discount", "Discount must be between 0 and 100"));
    }
    if order_limit.is_some_and(|l| l < 1) {
        return Err(AppError::validation("orderLimit", "Order limit must be at least 1"));
    }
    Ok(())
}

async fn insert_variants(
    tx: &mut Transaction<'_, Postgres>,
    product_id: Uuid,
    name: &str,
    variants: Vec<VariantInput>,
) -> AppResult<()> {
    for variant in variants {
        validate_pricing(Some(variant.price), variant.discount, variant.order_limit)?;
        let sku = sku_for(name, variant.sku, &variant.attributes);

        sqlx::query(
            r#"
            INSERT INTO product_variants (
                product_id, sku, price, discount, images, attributes, stock, order_limit, is_active
            )
            VALUES ($1, $2, $3, COALESCE($4, 0), $5, $6, COALESCE($7, 0), COALESCE($8, 1), COALESCE($9, TRUE))
            "#,
        )
        .bind(product_id)
        .bind(sku)
        .bind(variant.price)
        .bind(variant.discount)
        .bind(Json(variant.images))
        .bind(Json(variant.attributes))
        .bind(variant.stock)
        .bind(variant.order_limit)
        .bind(variant.is_active)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

#[derive(Clone)]
pub struct ProductService {
    db: PgPool,
}

impl ProductService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Slug for `name`, suffixed with random digits until no other product has it
    async fn unique_slug(&self, name: &str, exclude: Option<Uuid>) -> AppResult<String> {
        let base = slugify(name);
        let mut candidate = base.clone();
        loop {
            let taken = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS (SELECT 1 FROM products WHERE slug = $1 AND ($2::uuid IS NULL OR id <> $2))",
            )
            .bind(&candidate)
            .bind(exclude)
            .fetch_one(&self.db)
            .await?;
            if !taken {
                return Ok(candidate);
            }
            candidate = format!("{}-{:04}", base, rand::thread_rng().gen_range(0..10_000));
        }
    }

    pub async fn create(&self, input: CreateProductInput) -> AppResult<ProductWithVariants> {
        let name = required("name", input.name)?;
        check("name", validate_title(&name))?;
        validate_pricing(input.price, input.discount, input.order_limit)?;

        let slug = self.unique_slug(&name, None).await?;
        let variants = input.variants.unwrap_or_default();
        let has_variants = !variants.is_empty();

        let (price, discount, stock, sku) = if has_variants {
            (Decimal::ZERO, Decimal::ZERO, 0, None)
        } else {
            (
                input.price.unwrap_or_default(),
                input.discount.unwrap_or_default(),
                input.stock.unwrap_or(0),
                Some(sku_for(&name, input.sku, &input.attributes)),
            )
        };

        let mut tx = self.db.begin().await?;

        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (
                name, slug, description, images, brand, tags, price, discount, stock,
                order_limit, attributes, sku, is_active
            )
            VALUES ($1, $2, COALESCE($3, ''), $4, $5, $6, $7, $8, $9, COALESCE($10, 1), $11, $12, COALESCE($13, TRUE))
            RETURNING *
            "#,
        )
        .bind(&name)
        .bind(slug)
        .bind(input.description)
        .bind(Json(input.images))
        .bind(input.brand)
        .bind(input.tags)
        .bind(price)
        .bind(discount)
        .bind(stock)
        .bind(input.order_limit)
        .bind(Json(input.attributes))
        .bind(sku)
        .bind(input.is_active)
        .fetch_one(&mut *tx)
        .await?;

        insert_variants(&mut tx, product.id, &name, variants).await?;
        tx.commit().await?;

        tracing::info!("Product {} ({}) created", product.id, product.slug);
        self.get(product.id).await
    }

    /// Patch a product. Supplied variants replace the old ones and zero the product's own pricing.
    pub async fn update(&self, product_id: Uuid, input: UpdateProductInput) -> AppResult<ProductWithVariants> {
        let current = self.get(product_id).await?.product;
        validate_pricing(input.price, input.discount, input.order_limit)?;

        let name = match input.name {
            Some(name) => {
                check("name", validate_title(&name))?;
                name.trim().to_string()
            }
            None => current.name.clone(),
        };
        let slug = self.unique_slug(&name, Some(product_id)).await?;

        let mut tx = self.db.begin().await?;

        sqlx::query(
            r#"
            UPDATE products SET
                name = $2,
                slug = $3,
                description = COALESCE($4, description),
                images = COALESCE($5, images),
                brand = COALESCE($6, brand),
                tags = COALESCE($7, tags),
                price = COALESCE($8, price),
                discount = COALESCE($9, discount),
                stock = COALESCE($10, stock),
                order_limit = COALESCE($11, order_limit),
                attributes = COALESCE($12, attributes),
                sku = COALESCE($13, sku),
                is_active = COALESCE($14, is_active),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(product_id)
        .bind(&name)
        .bind(slug)
        .bind(input.description)
        .bind(input.images.map(Json))
        .bind(input.brand)
        .bind(input.tags)
        .bind(input.price)
        .bind(input.discount)
        .bind(input.stock)
        .bind(input.order_limit)
        .bind(input.attributes.map(Json))
        .bind(input.sku)
        .bind(input.is_active)
        .execute(&mut *tx)
        .await?;

        if let Some(variants) = input.variants {
            sqlx::query("DELETE FROM product_variants WHERE product_id = $1")
                .bind(product_id)
                .execute(&mut *tx)
                .await?;
            if !variants.is_empty() {
                sqlx::query(
                    "UPDATE products SET price = 0, discount = 0, stock = 0, sku = NULL WHERE id = $1",
                )
                .bind(product_id)
                .execute(&mut *tx)
                .await?;
            }
            insert_variants(&mut tx, product_id, &name, variants).await?;
        }

        tx.commit().await?;
        self.get(product_id).await
    }

    pub async fn set_status(&self, product_id: Uuid, input: ProductStatusInput) -> AppResult<Product> {
        sqlx::query_as::<_, Product>(
            "UPDATE products SET is_active = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(product_id)
        .bind(input.is_active)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))
    }

    pub async fn delete(&self, product_id: Uuid) -> AppResult<Uuid> {
        let deleted = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(product_id)
            .execute(&self.db)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(AppError::NotFound("Product".to_string()));
        }
        tracing::info!("Product {} deleted", product_id);
        Ok(product_id)
    }

    pub async fn get(&self, product_id: Uuid) -> AppResult<ProductWithVariants> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(product_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        let variants = sqlx::query_as::<_, Variant>(
            "SELECT * FROM product_variants WHERE product_id = $1 ORDER BY created_at",
        )
        .bind(product_id)
        .fetch_all(&self.db)
        .await?;

        Ok(ProductWithVariants { product, variants })
    }

    pub async fn list(&self) -> AppResult<Vec<ProductWithVariants>> {
        let products = sqlx::query_as::<_, Product>("SELECT * FROM products ORDER BY created_at DESC")
            .fetch_all(&self.db)
            .await?;

        let mut variants: HashMap<Uuid, Vec<Variant>> = HashMap::new();
        for variant in sqlx::query_as::<_, Variant>("SELECT * FROM product_variants ORDER BY created_at")
            .fetch_all(&self.db)
            .await?
        {
            variants.entry(variant.product_id).or_default().push(variant);
        }

        Ok(products
            .into_iter()
            .map(|product| ProductWithVariants {
                variants: variants.remove(&product.id).unwrap_or_default(),
                product,
            })
            .collect())
    }
}
