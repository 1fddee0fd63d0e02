//! Car listing handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use shared::models::CarFilter;
use shared::types::ApiResponse;
use tower_sessions::Session;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::{CurrentUser, SESSION_USER_ID_KEY};
use crate::services::car::{CarStatusInput, CreateCarInput, UpdateCarInput};
use crate::services::CarService;
use crate::AppState;

pub async fn create_car(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<CreateCarInput>,
) -> AppResult<impl IntoResponse> {
    let car = CarService::new(state.db).create(user.user_id, input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new("Car listed successfully", car)),
    ))
}

pub async fn update_car(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(car_id): Path<Uuid>,
    Json(input): Json<UpdateCarInput>,
) -> AppResult<impl IntoResponse> {
    let car = CarService::new(state.db)
        .update(user.user_id, car_id, input)
        .await?;
    Ok(Json(ApiResponse::new("Car updated successfully", car)))
}

pub async fn set_car_status(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(car_id): Path<Uuid>,
    Json(input): Json<CarStatusInput>,
) -> AppResult<impl IntoResponse> {
    let car = CarService::new(state.db)
        .set_status(user.user_id, car_id, input.status)
        .await?;
    Ok(Json(ApiResponse::new("Car status updated", car)))
}

/// Public listing view; the session, when present, only decides contact visibility
pub async fn get_car(
    State(state): State<AppState>,
    session: Session,
    Path(car_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let viewer = session.get::<Uuid>(SESSION_USER_ID_KEY).await?;
    let car = CarService::new(state.db).view(car_id, viewer).await?;
    Ok(Json(ApiResponse::new("Car fetched successfully", car)))
}

pub async fn search_cars(
    State(state): State<AppState>,
    Query(filter): Query<CarFilter>,
) -> AppResult<impl IntoResponse> {
    let result = CarService::new(state.db).search(filter).await?;
    Ok(Json(ApiResponse::new("Cars fetched successfully", result)))
}

pub async fn my_cars(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<impl IntoResponse> {
    let cars = CarService::new(state.db).mine(user.user_id).await?;
    Ok(Json(ApiResponse::new("Your listings", cars)))
}
