//! Car listing service: listings for sale or rent with faceted search

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::models::{
    validate_car_spec, CarCondition, CarFilter, CarStatus, CarType, FuelType, ListingType,
    PriceColumn, RentPriceUnit, Transmission,
};
use shared::types::{FacetCount, MediaAsset};
use sqlx::postgres::PgArguments;
use sqlx::query::QueryAs;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::access::{check, required};

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Car {
    pub id: Uuid,
    pub listed_by: Uuid,
    pub title: String,
    pub car_no: String,
    pub brand: String,
    pub model: String,
    pub variant: Option<String>,
    pub color: Option<String>,
    pub car_type: Option<String>,
    pub year: i32,
    pub transmission: Option<String>,
    pub fuel_type: Option<String>,
    pub seats: i32,
    pub doors: i32,
    pub category: String,
    pub condition: Option<String>,
    pub km_driven: Option<i32>,
    pub ownership: Option<i32>,
    pub listing_type: String,
    pub images: Json<Vec<MediaAsset>>,
    pub thumbnail: Option<String>,
    pub features: Vec<String>,
    pub price: Option<Decimal>,
    pub is_negotiable: Option<bool>,
    pub description: String,
    pub rent_details: Option<Json<serde_json::Value>>,
    pub rent_price: Option<Decimal>,
    pub rent_price_unit: Option<String>,
    pub deposit: Option<Decimal>,
    pub is_sold: bool,
    pub owner_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_phone: Option<String>,
    pub documents: Option<Json<serde_json::Value>>,
    pub views: i32,
    pub status: String,
    pub current_step: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Car {
    /// Hide the owner's direct contact details from everyone but the owner
    pub fn for_viewer(mut self, viewer: Option<Uuid>) -> Self {
        if viewer != Some(self.listed_by) {
            self.owner_email = None;
            self.owner_phone = None;
        }
        self
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCarInput {
    pub title: Option<String>,
    pub car_no: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub variant: Option<String>,
    pub color: Option<String>,
    pub car_type: Option<CarType>,
    pub year: i32,
    pub transmission: Option<Transmission>,
    pub fuel_type: Option<FuelType>,
    pub seats: i32,
    pub doors: i32,
    pub category: Option<String>,
    pub condition: Option<CarCondition>,
    pub km_driven: Option<i32>,
    pub ownership: Option<i32>,
    pub listing_type: ListingType,
    #[serde(default)]
    pub images: Vec<MediaAsset>,
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
    pub price: Option<Decimal>,
    pub is_negotiable: Option<bool>,
    pub description: Option<String>,
    pub rent_details: Option<serde_json::Value>,
    pub rent_price: Option<Decimal>,
    pub rent_price_unit: Option<RentPriceUnit>,
    pub deposit: Option<Decimal>,
    pub owner_name: Option<String>,
    pub owner_email: Option<String>,
    pub owner_phone: Option<String>,
    pub documents: Option<serde_json::Value>,
    pub current_step: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCarInput {
    pub title: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub variant: Option<String>,
    pub color: Option<String>,
    pub car_type: Option<CarType>,
    pub year: Option<i32>,
    pub transmission: Option<Transmission>,
    pub fuel_type: Option<FuelType>,
    pub seats: Option<i32>,
    pub doors: Option<i32>,
    pub category: Option<String>,
    pub condition: Option<CarCondition>,
    pub km_driven: Option<i32>,
    pub ownership: Option<i32>,
    pub listing_type: Option<ListingType>,
    pub images: Option<Vec<MediaAsset>>,
    pub thumbnail: Option<String>,
    pub features: Option<Vec<String>>,
    pub price: Option<Decimal>,
    pub is_negotiable: Option<bool>,
    pub description: Option<String>,
    pub rent_details: Option<serde_json::Value>,
    pub rent_price: Option<Decimal>,
    pub rent_price_unit: Option<RentPriceUnit>,
    pub deposit: Option<Decimal>,
    pub is_sold: Option<bool>,
    pub owner_name: Option<String>,
    pub owner_email: Option<String>,
    pub owner_phone: Option<String>,
    pub documents: Option<serde_json::Value>,
    pub current_step: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CarStatusInput {
    pub status: CarStatus,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct PriceRange {
    pub min: Option<Decimal>,
    pub max: Option<Decimal>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CarSearchResult {
    pub cars: Vec<Car>,
    pub brands: Vec<FacetCount<String>>,
    pub years: Vec<FacetCount<i32>>,
    pub seats: Vec<FacetCount<i32>>,
    pub transmissions: Vec<FacetCount<String>>,
    pub car_types: Vec<FacetCount<String>>,
    pub listing_types: Vec<FacetCount<String>>,
    pub price_range: PriceRange,
}

/// Shared predicate for listing search and facet counts.
/// `$9` selects the rent price column for price bounds.
const SEARCH_PREDICATE: &str = r#"
    status = 'active'
    AND ($1::text IS NULL OR brand ILIKE $1)
    AND ($2::int IS NULL OR year = $2)
    AND ($3::int IS NULL OR seats = $3)
    AND ($4::text IS NULL OR car_type = $4)
    AND ($5::text IS NULL OR listing_type = $5)
    AND ($6::text IS NULL OR transmission = $6)
    AND ($7::numeric IS NULL OR (CASE WHEN $9 THEN rent_price ELSE price END) >= $7)
    AND ($8::numeric IS NULL OR (CASE WHEN $9 THEN rent_price ELSE price END) <= $8)
"#;

fn bind_filter<'q, O>(
    query: QueryAs<'q, Postgres, O, PgArguments>,
    filter: &'q CarFilter,
) -> QueryAs<'q, Postgres, O, PgArguments> {
    query
        .bind(filter.brand.as_deref())
        .bind(filter.year)
        .bind(filter.seat)
        .bind(filter.car_type.map(|t| t.as_str()))
        .bind(filter.listing_type.map(|t| t.as_str()))
        .bind(filter.transmission.map(|t| t.as_str()))
        .bind(filter.min_price)
        .bind(filter.max_price)
        .bind(filter.price_column() == PriceColumn::Rent)
}

fn facets<T>(rows: Vec<(T, i64)>) -> Vec<FacetCount<T>> {
    rows.into_iter()
        .map(|(label, count)| FacetCount { label, count })
        .collect()
}

#[derive(Clone)]
pub struct CarService {
    db: PgPool,
}

impl CarService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn owned(&self, user_id: Uuid, car_id: Uuid) -> AppResult<Car> {
        let car = sqlx::query_as::<_, Car>("SELECT * FROM cars WHERE id = $1")
            .bind(car_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Car".to_string()))?;

        if car.listed_by != user_id {
            return Err(AppError::Forbidden(
                "You can only modify your own listings".to_string(),
            ));
        }
        Ok(car)
    }

    /// Create a draft listing
    pub async fn create(&self, user_id: Uuid, input: CreateCarInput) -> AppResult<Car> {
        let title = required("title", input.title)?;
        let car_no = required("carNo", input.car_no)?;
        let brand = required("brand", input.brand)?;
        let model = required("model", input.model)?;
        let category = required("category", input.category)?;
        check(
            "year",
            validate_car_spec(input.year, input.seats, input.doors, input.ownership),
        )?;
        let car_no = car_no.to_uppercase();

        let listed = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM cars WHERE car_no = $1)")
            .bind(&car_no)
            .fetch_one(&self.db)
            .await?;
        if listed {
            return Err(AppError::Conflict {
                resource: "car".to_string(),
                message: format!("Car {} is already listed", car_no),
            });
        }

        let car = sqlx::query_as::<_, Car>(
            r#"
            INSERT INTO cars (
                listed_by, title, car_no, brand, model, variant, color, car_type, year,
                transmission, fuel_type, seats, doors, category, condition, km_driven, ownership,
                listing_type, images, thumbnail, features, price, is_negotiable, description,
                rent_details, rent_price, rent_price_unit, deposit, owner_name, owner_email,
                owner_phone, documents, status, current_step
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9,
                $10, $11, $12, $13, $14, $15, $16, $17,
                $18, $19, $20, $21, $22, $23, COALESCE($24, ''),
                $25, $26, $27, $28, $29, $30,
                $31, $32, $33, COALESCE($34, 'carInfo')
            )
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&title)
        .bind(&car_no)
        .bind(brand)
        .bind(model)
        .bind(input.variant)
        .bind(input.color)
        .bind(input.car_type.map(|t| t.as_str()))
        .bind(input.year)
        .bind(input.transmission.map(|t| t.as_str()))
        .bind(input.fuel_type.map(|t| t.as_str()))
        .bind(input.seats)
        .bind(input.doors)
        .bind(category)
        .bind(input.condition.map(|c| c.as_str()))
        .bind(input.km_driven)
        .bind(input.ownership)
        .bind(input.listing_type.as_str())
        .bind(Json(input.images))
        .bind(input.thumbnail)
        .bind(input.features)
        .bind(input.price)
        .bind(input.is_negotiable)
        .bind(input.description)
        .bind(input.rent_details.map(Json))
        .bind(input.rent_price)
        .bind(input.rent_price_unit.map(|u| u.as_str()))
        .bind(input.deposit)
        .bind(input.owner_name)
        .bind(input.owner_email)
        .bind(input.owner_phone)
        .bind(input.documents.map(Json))
        .bind(CarStatus::default().as_str())
        .bind(input.current_step)
        .fetch_one(&self.db)
        .await?;

        tracing::info!("Car listing {} created by {}", car.id, user_id);
        Ok(car)
    }

    pub async fn update(&self, user_id: Uuid, car_id: Uuid, input: UpdateCarInput) -> AppResult<Car> {
        let current = self.owned(user_id, car_id).await?;

        check(
            "year",
            validate_car_spec(
                input.year.unwrap_or(current.year),
                input.seats.unwrap_or(current.seats),
                input.doors.unwrap_or(current.doors),
                input.ownership.or(current.ownership),
            ),
        )?;

        let car = sqlx::query_as::<_, Car>(
            r#"
            UPDATE cars SET
                title = COALESCE($2, title),
                brand = COALESCE($3, brand),
                model = COALESCE($4, model),
                variant = COALESCE($5, variant),
                color = COALESCE($6, color),
                car_type = COALESCE($7, car_type),
                year = COALESCE($8, year),
                transmission = COALESCE($9, transmission),
                fuel_type = COALESCE($10, fuel_type),
                seats = COALESCE($11, seats),
                doors = COALESCE($12, doors),
                category = COALESCE($13, category),
                condition = COALESCE($14, condition),
                km_driven = COALESCE($15, km_driven),
                ownership = COALESCE($16, ownership),
                listing_type = COALESCE($17, listing_type),
                images = COALESCE($18, images),
                thumbnail = COALESCE($19, thumbnail),
                features = COALESCE($20, features),
                price = COALESCE($21, price),
                is_negotiable = COALESCE($22, is_negotiable),
                description = COALESCE($23, description),
                rent_details = COALESCE($24, rent_details),
                rent_price = COALESCE($25, rent_price),
                rent_price_unit = COALESCE($26, rent_price_unit),
                deposit = COALESCE($27, deposit),
                is_sold = COALESCE($28, is_sold),
                owner_name = COALESCE($29, owner_name),
                owner_email = COALESCE($30, owner_email),
                owner_phone = COALESCE($31, owner_phone),
                documents = COALESCE($32, documents),
                current_step = COALESCE($33, current_step),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(car_id)
        .bind(input.title)
        .bind(input.brand)
        .bind(input.model)
        .bind(input.variant)
        .bind(input.color)
        .bind(input.car_type.map(|t| t.as_str()))
        .bind(input.year)
        .bind(input.transmission.map(|t| t.as_str()))
        .bind(input.fuel_type.map(|t| t.as_str()))
        .bind(input.seats)
        .bind(input.doors)
        .bind(input.category)
        .bind(input.condition.map(|c| c.as_str()))
        .bind(input.km_driven)
        .bind(input.ownership)
        .bind(input.listing_type.map(|t| t.as_str()))
        .bind(input.images.map(Json))
        .bind(input.thumbnail)
        .bind(input.features)
        .bind(input.price)
        .bind(input.is_negotiable)
        .bind(input.description)
        .bind(input.rent_details.map(Json))
        .bind(input.rent_price)
        .bind(input.rent_price_unit.map(|u| u.as_str()))
        .bind(input.deposit)
        .bind(input.is_sold)
        .bind(input.owner_name)
        .bind(input.owner_email)
        .bind(input.owner_phone)
        .bind(input.documents.map(Json))
        .bind(input.current_step)
        .fetch_one(&self.db)
        .await?;

        Ok(car)
    }

    pub async fn set_status(&self, user_id: Uuid, car_id: Uuid, status: CarStatus) -> AppResult<Car> {
        self.owned(user_id, car_id).await?;

        let car = sqlx::query_as::<_, Car>(
            "UPDATE cars SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(car_id)
        .bind(status.as_str())
        .fetch_one(&self.db)
        .await?;

        tracing::info!("Car listing {} is now {}", car_id, status.as_str());
        Ok(car)
    }

    /// Fetch a listing and count the view
    pub async fn view(&self, car_id: Uuid, viewer: Option<Uuid>) -> AppResult<Car> {
        let car = sqlx::query_as::<_, Car>(
            "UPDATE cars SET views = views + 1 WHERE id = $1 RETURNING *",
        )
        .bind(car_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Car".to_string()))?;

        Ok(car.for_viewer(viewer))
    }

    pub async fn mine(&self, user_id: Uuid) -> AppResult<Vec<Car>> {
        let cars = sqlx::query_as::<_, Car>(
            "SELECT * FROM cars WHERE listed_by = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(cars)
    }

    async fn facet<T>(&self, column: &str, filter: &CarFilter, order: &str) -> AppResult<Vec<FacetCount<T>>>
    where
        T: for<'r> sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres> + Send + Unpin,
    {
        let sql = format!(
            "SELECT {column}, COUNT(*) FROM cars WHERE {SEARCH_PREDICATE} AND {column} IS NOT NULL GROUP BY {column} ORDER BY {order}"
        );
        let rows = bind_filter(sqlx::query_as::<_, (T, i64)>(&sql), filter)
            .fetch_all(&self.db)
            .await?;
        Ok(facets(rows))
    }

    /// Public search over active listings with facet counts
    pub async fn search(&self, filter: CarFilter) -> AppResult<CarSearchResult> {
        let sql = format!("SELECT * FROM cars WHERE {SEARCH_PREDICATE} ORDER BY created_at DESC");
        let cars = bind_filter(sqlx::query_as::<_, Car>(&sql), &filter)
            .fetch_all(&self.db)
            .await?
            .into_iter()
            .map(|car| car.for_viewer(None))
            .collect();

        let brands = self.facet::<String>("brand", &filter, "2 DESC, 1").await?;
        let years = self.facet::<i32>("year", &filter, "1 DESC").await?;
        let seats = self.facet::<i32>("seats", &filter, "1 ASC").await?;
        let transmissions = self.facet::<String>("transmission", &filter, "2 DESC, 1").await?;
        let car_types = self.facet::<String>("car_type", &filter, "2 DESC, 1").await?;
        let listing_types = self.facet::<String>("listing_type", &filter, "2 DESC, 1").await?;

        let range_sql = format!(
            r#"
            SELECT
                MIN(CASE WHEN listing_type = 'rent' THEN rent_price ELSE price END),
                MAX(CASE WHEN listing_type = 'rent' THEN rent_price ELSE price END)
            FROM cars WHERE {SEARCH_PREDICATE}
            "#
        );
        let (min, max) = bind_filter(
            sqlx::query_as::<_, (Option<Decimal>, Option<Decimal>)>(&range_sql),
            &filter,
        )
        .fetch_one(&self.db)
        .await?;

        Ok(CarSearchResult {
            cars,
            brands,
            years,
            seats,
            transmissions,
            car_types,
            listing_types,
            price_range: PriceRange { min, max },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facets_keep_order() {
        let rows = vec![("Toyota".to_string(), 3), ("Honda".to_string(), 1)];
        let out = facets(rows);
        assert_eq!(out[0].label, "Toyota");
        assert_eq!(out[0].count, 3);
        assert_eq!(out[1].label, "Honda");
    }

    #[test]
    fn test_search_predicate_restricts_to_active() {
        assert!(SEARCH_PREDICATE.contains("status = 'active'"));
        assert!(SEARCH_PREDICATE.contains("$9"));
    }
}
