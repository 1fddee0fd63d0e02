//! Authentication handlers

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use shared::types::ApiResponse;
use tower_sessions::Session;

use crate::error::AppResult;
use crate::middleware::{CurrentUser, SESSION_ID_KEY, SESSION_USER_ID_KEY};
use crate::services::auth::{LoginInput, ResetPasswordInput, SignupInput, VerifyOtpInput};
use crate::services::AuthService;
use crate::AppState;

#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetTokenResponse {
    pub reset_token: String,
}

/// Register a new account
pub async fn signup(
    State(state): State<AppState>,
    Json(input): Json<SignupInput>,
) -> AppResult<impl IntoResponse> {
    let service = AuthService::new(state.db.clone(), &state.config);
    let user = service.signup(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new("User registered successfully", user)),
    ))
}

/// Log in and bind the session to the fresh single-session id
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(input): Json<LoginInput>,
) -> AppResult<impl IntoResponse> {
    let service = AuthService::new(state.db.clone(), &state.config);
    let outcome = service.login(input).await?;

    session.cycle_id().await?;
    session.insert(SESSION_USER_ID_KEY, outcome.user.id).await?;
    session.insert(SESSION_ID_KEY, &outcome.session_id).await?;

    Ok(Json(ApiResponse::new("Logged in successfully", outcome.user)))
}

pub async fn logout(
    State(state): State<AppState>,
    session: Session,
    CurrentUser(user): CurrentUser,
) -> AppResult<impl IntoResponse> {
    let service = AuthService::new(state.db.clone(), &state.config);
    service.logout(user.user_id).await?;
    session.flush().await?;
    Ok(Json(ApiResponse::message("Logged out successfully")))
}

pub async fn forgot_password(
    State(state): State<AppState>,
    Json(input): Json<ForgotPasswordRequest>,
) -> AppResult<impl IntoResponse> {
    let service = AuthService::new(state.db.clone(), &state.config);
    service.forgot_password(&state.mailer, &input.email).await?;
    Ok(Json(ApiResponse::message("OTP sent successfully")))
}

pub async fn verify_otp(
    State(state): State<AppState>,
    Json(input): Json<VerifyOtpInput>,
) -> AppResult<impl IntoResponse> {
    let service = AuthService::new(state.db.clone(), &state.config);
    let reset_token = service.verify_otp(input).await?;
    Ok(Json(ApiResponse::new(
        "Password reset token generated successfully",
        ResetTokenResponse { reset_token },
    )))
}

pub async fn reset_password(
    State(state): State<AppState>,
    Json(input): Json<ResetPasswordInput>,
) -> AppResult<impl IntoResponse> {
    let service = AuthService::new(state.db.clone(), &state.config);
    service.reset_password(input).await?;
    Ok(Json(ApiResponse::message("Password reset successful")))
}
