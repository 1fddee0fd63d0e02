//! Account handlers: profile, lock panel, partner registration, wishlist and cart

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use shared::models::PartnerRegistration;
use shared::types::ApiResponse;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::cart::{CartItemInput, RemoveCartItemInput};
use crate::services::lock::{ChangePinInput, DisablePinInput, PinInput};
use crate::services::user::{ChangePasswordInput, UpdateProfileInput};
use crate::services::{CartService, LockService, PartnerService, UserService, WishlistService};
use crate::AppState;

// ============================================================================
// Profile
// ============================================================================

/// Fetch the caller's profile, marking them active
pub async fn get_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<impl IntoResponse> {
    let service = UserService::new(state.db);
    let profile = service.get_profile(user.user_id).await?;
    Ok(Json(ApiResponse::new("Profile fetched successfully", profile)))
}

pub async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<UpdateProfileInput>,
) -> AppResult<impl IntoResponse> {
    let service = UserService::new(state.db);
    let profile = service.update_profile(user.user_id, input).await?;
    Ok(Json(ApiResponse::new("Profile updated successfully", profile)))
}

pub async fn change_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<ChangePasswordInput>,
) -> AppResult<impl IntoResponse> {
    let service = UserService::new(state.db);
    service.change_password(user.user_id, input).await?;
    Ok(Json(ApiResponse::message("Password changed successfully")))
}

// ============================================================================
// Lock panel
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LockStatus {
    pub lock_pin_enabled: bool,
}

pub async fn lock_status(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<impl IntoResponse> {
    let service = LockService::new(state.db);
    let lock_pin_enabled = service.status(user.user_id).await?;
    Ok(Json(ApiResponse::new(
        "Lock status fetched",
        LockStatus { lock_pin_enabled },
    )))
}

pub async fn set_lock_pin(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<PinInput>,
) -> AppResult<impl IntoResponse> {
    LockService::new(state.db).set(user.user_id, input).await?;
    Ok(Json(ApiResponse::message("Lock PIN set successfully")))
}

pub async fn change_lock_pin(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<ChangePinInput>,
) -> AppResult<impl IntoResponse> {
    LockService::new(state.db).change(user.user_id, input).await?;
    Ok(Json(ApiResponse::message("Lock PIN changed successfully")))
}

pub async fn verify_lock_pin(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<PinInput>,
) -> AppResult<impl IntoResponse> {
    LockService::new(state.db).verify(user.user_id, input).await?;
    Ok(Json(ApiResponse::message("PIN verified successfully")))
}

pub async fn disable_lock_pin(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<DisablePinInput>,
) -> AppResult<impl IntoResponse> {
    LockService::new(state.db).disable(user.user_id, input).await?;
    Ok(Json(ApiResponse::message("Lock PIN disabled successfully")))
}

// ============================================================================
// Partner
// ============================================================================

pub async fn register_partner(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<PartnerRegistration>,
) -> AppResult<impl IntoResponse> {
    let partner = PartnerService::new(state.db).register(user.user_id, input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new("Partner profile created successfully!", partner)),
    ))
}

// ============================================================================
// Wishlist
// ============================================================================

pub async fn get_wishlist(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<impl IntoResponse> {
    let items = WishlistService::new(state.db).list(user.user_id).await?;
    Ok(Json(ApiResponse::new("Wishlist fetched successfully", items)))
}

pub async fn add_to_wishlist(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    WishlistService::new(state.db).add(user.user_id, product_id).await?;
    Ok(Json(ApiResponse::message("Product added to wishlist successfully")))
}

pub async fn remove_from_wishlist(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    WishlistService::new(state.db).remove(user.user_id, product_id).await?;
    Ok(Json(ApiResponse::message("Product removed from wishlist successfully")))
}

// ============================================================================
// Cart
// ============================================================================

pub async fn get_cart(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<impl IntoResponse> {
    let cart = CartService::new(state.db).get(user.user_id).await?;
    Ok(Json(ApiResponse::new("Cart fetched successfully", cart)))
}

pub async fn add_to_cart(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<CartItemInput>,
) -> AppResult<impl IntoResponse> {
    let cart = CartService::new(state.db).add(user.user_id, input).await?;
    Ok(Json(ApiResponse::new("Product added to cart", cart)))
}

pub async fn update_cart_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<CartItemInput>,
) -> AppResult<impl IntoResponse> {
    let cart = CartService::new(state.db)
        .update_quantity(user.user_id, input)
        .await?;
    Ok(Json(ApiResponse::new("Cart item updated successfully", cart)))
}

pub async fn remove_cart_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<RemoveCartItemInput>,
) -> AppResult<impl IntoResponse> {
    let cart = CartService::new(state.db).remove(user.user_id, input).await?;
    Ok(Json(ApiResponse::new("Item removed from cart", cart)))
}
