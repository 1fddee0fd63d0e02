//! Card comment handlers

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use shared::types::ApiResponse;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::comment::{AddCommentInput, DeleteCommentInput, ReactInput};
use crate::services::CommentService;
use crate::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovedComment {
    pub comment_id: Uuid,
}

pub async fn add_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<AddCommentInput>,
) -> AppResult<impl IntoResponse> {
    let service = CommentService::new(state.db, state.hub);
    let comment = service.add(user.user_id, input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new("Comment added", comment)),
    ))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<DeleteCommentInput>,
) -> AppResult<impl IntoResponse> {
    let service = CommentService::new(state.db, state.hub);
    let comment_id = service.delete(user.user_id, input).await?;
    Ok(Json(ApiResponse::new(
        "Comment deleted",
        RemovedComment { comment_id },
    )))
}

pub async fn react_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<ReactInput>,
) -> AppResult<impl IntoResponse> {
    let service = CommentService::new(state.db, state.hub);
    let comment = service.react(user.user_id, input).await?;
    Ok(Json(ApiResponse::new("Reaction updated", comment)))
}
