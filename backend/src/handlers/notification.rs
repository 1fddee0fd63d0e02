//! HTTP handlers for notifications

use axum::{extract::State, response::IntoResponse, Json};
use serde::Deserialize;
use shared::types::ApiResponse;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::access::required;
use crate::services::NotificationService;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadRequest {
    pub notification_id: Option<String>,
}

/// The caller's notifications, newest first
pub async fn list_notifications(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<impl IntoResponse> {
    let service = NotificationService::new(state.db, state.hub);
    let notifications = service.list_for_user(user.user_id).await?;
    Ok(Json(ApiResponse::new(
        "Notifications fetched successfully",
        notifications,
    )))
}

pub async fn mark_notification_read(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<MarkReadRequest>,
) -> AppResult<impl IntoResponse> {
    let id = required("notificationId", input.notification_id)?;
    let service = NotificationService::new(state.db, state.hub);
    let notification = service.mark_read(user.user_id, &id).await?;
    Ok(Json(ApiResponse::new(
        "Notification marked as read",
        notification,
    )))
}
