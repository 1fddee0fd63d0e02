//! Product catalogue handlers (public reads and admin management)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use shared::types::ApiResponse;
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::category::CategoryInput;
use crate::services::product::{CreateProductInput, ProductStatusInput, UpdateProductInput};
use crate::services::{CategoryService, ProductService};
use crate::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovedProduct {
    pub product_id: Uuid,
}

// ============================================================================
// Products
// ============================================================================

pub async fn list_products(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let products = ProductService::new(state.db).list().await?;
    Ok(Json(ApiResponse::new("All products", products)))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let product = ProductService::new(state.db).get(product_id).await?;
    Ok(Json(ApiResponse::new("Product details", product)))
}

pub async fn create_product(
    State(state): State<AppState>,
    Json(input): Json<CreateProductInput>,
) -> AppResult<impl IntoResponse> {
    let product = ProductService::new(state.db).create(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new("Product created successfully", product)),
    ))
}

pub async fn update_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(input): Json<UpdateProductInput>,
) -> AppResult<impl IntoResponse> {
    let product = ProductService::new(state.db).update(product_id, input).await?;
    Ok(Json(ApiResponse::new("Product updated successfully", product)))
}

pub async fn set_product_status(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(input): Json<ProductStatusInput>,
) -> AppResult<impl IntoResponse> {
    let product = ProductService::new(state.db)
        .set_status(product_id, input)
        .await?;
    Ok(Json(ApiResponse::new("Product status updated", product)))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let product_id = ProductService::new(state.db).delete(product_id).await?;
    Ok(Json(ApiResponse::new(
        "Product deleted successfully",
        RemovedProduct { product_id },
    )))
}

// ============================================================================
// Categories
// ============================================================================

pub async fn category_tree(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let tree = CategoryService::new(state.db).tree().await?;
    Ok(Json(ApiResponse::new("All categories", tree)))
}

pub async fn create_category(
    State(state): State<AppState>,
    Json(input): Json<CategoryInput>,
) -> AppResult<impl IntoResponse> {
    let category = CategoryService::new(state.db).create(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new("Category created successfully", category)),
    ))
}

pub async fn update_category(
    State(state): State<AppState>,
    Path(category_id): Path<Uuid>,
    Json(input): Json<CategoryInput>,
) -> AppResult<impl IntoResponse> {
    let category = CategoryService::new(state.db)
        .update(category_id, input)
        .await?;
    Ok(Json(ApiResponse::new("Category updated successfully", category)))
}
