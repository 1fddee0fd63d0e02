//! Meeting and video token handlers

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use shared::types::ApiResponse;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::meeting::CreateMeetingInput;
use crate::services::MeetingService;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoTokenQuery {
    pub room_id: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoToken {
    pub token: String,
    pub app_id: u32,
}

pub async fn create_meeting(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<CreateMeetingInput>,
) -> AppResult<impl IntoResponse> {
    let service = MeetingService::new(state.db, state.video);
    let meeting = service.create(user.user_id, input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new("Meeting created successfully", meeting)),
    ))
}

pub async fn list_meetings(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<impl IntoResponse> {
    let service = MeetingService::new(state.db, state.video);
    let meetings = service.for_user(user.user_id).await?;
    Ok(Json(ApiResponse::new("Meetings retrieved successfully", meetings)))
}

pub async fn video_token(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<VideoTokenQuery>,
) -> AppResult<impl IntoResponse> {
    let app_id = state.config.zego.app_id;
    let service = MeetingService::new(state.db, state.video);
    let token = service.video_token(user.user_id, query.room_id)?;
    Ok(Json(ApiResponse::new(
        "Video token generated",
        VideoToken { token, app_id },
    )))
}
