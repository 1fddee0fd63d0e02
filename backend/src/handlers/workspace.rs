//! Workspace handlers

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
use crate::middleware::CurrentUser;
use crate::services::workspace::{CreateWorkspaceInput, RemoveMemberInput, UpdateWorkspaceInput};
use crate::services::WorkspaceService;
use crate::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceRef {
    pub workspace_id: Uuid,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovedMember {
    pub workspace_id: Uuid,
    pub member_id: Uuid,
}

#[derive(Serialize)]
pub struct InvitationToken {
    pub token: Option<String>,
}

fn workspaces(state: &AppState) -> WorkspaceService {
    WorkspaceService::new(state.db.clone(), state.hub.clone())
}

pub async fn create_workspace(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<CreateWorkspaceInput>,
) -> AppResult<impl IntoResponse> {
    let workspace = workspaces(&state).create(user.user_id, input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new("Workspace Created Successfully", workspace)),
    ))
}

pub async fn update_workspace(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(workspace_id): Path<Uuid>,
    Json(input): Json<UpdateWorkspaceInput>,
) -> AppResult<impl IntoResponse> {
    let workspace = workspaces(&state)
        .update(user.user_id, workspace_id, input)
        .await?;
    Ok(Json(ApiResponse::new("Workspace Updated Successfully", workspace)))
}

pub async fn get_workspace(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(workspace_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let detail = workspaces(&state).detail(user.user_id, workspace_id).await?;
    Ok(Json(ApiResponse::new("Get Workspace", detail)))
}

pub async fn workspace_members(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(workspace_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let members = workspaces(&state).members(user.user_id, workspace_id).await?;
    Ok(Json(ApiResponse::new("Get Workspace Members", members)))
}

pub async fn delete_workspace(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(workspace_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let workspace_id = workspaces(&state).delete(user.user_id, workspace_id).await?;
    Ok(Json(ApiResponse::new(
        "Workspace deleted successfully",
        WorkspaceRef { workspace_id },
    )))
}

pub async fn leave_workspace(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(workspace_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    workspaces(&state).leave(user.user_id, workspace_id).await?;
    Ok(Json(ApiResponse::new(
        "Left Workspace Successfully",
        WorkspaceRef { workspace_id },
    )))
}

pub async fn remove_workspace_member(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(workspace_id): Path<Uuid>,
    Json(input): Json<RemoveMemberInput>,
) -> AppResult<impl IntoResponse> {
    let member_id = workspaces(&state)
        .remove_member(user.user_id, workspace_id, input)
        .await?;
    Ok(Json(ApiResponse::new(
        "Member removed from Workspace successfully",
        RemovedMember {
            workspace_id,
            member_id,
        },
    )))
}

// ============================================================================
// Invitation links
// ============================================================================

pub async fn create_invitation(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(workspace_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let invitation = workspaces(&state)
        .create_invitation(user.user_id, workspace_id)
        .await?;
    Ok(Json(ApiResponse::new(
        "Workspace Invitation Created Successfully",
        invitation,
    )))
}

pub async fn get_invitation(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(workspace_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let token = workspaces(&state)
        .current_invitation(user.user_id, workspace_id)
        .await?;
    Ok(Json(ApiResponse::new(
        "Get Workspace Invitations Successfully",
        InvitationToken { token },
    )))
}

pub async fn delete_invitations(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(workspace_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let removed = workspaces(&state)
        .delete_invitations(user.user_id, workspace_id)
        .await?;
    tracing::debug!("Deleted {} invitation(s) of workspace {}", removed, workspace_id);
    Ok(Json(ApiResponse::message(
        "Workspace Invitation Deleted Successfully",
    )))
}

pub async fn preview_invitation(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((workspace_id, token)): Path<(Uuid, String)>,
) -> AppResult<impl IntoResponse> {
    let preview = workspaces(&state)
        .preview_invitation(user.user_id, workspace_id, &token)
        .await?;
    Ok(Json(ApiResponse::new(
        "Workspace Invitation Verified Successfully",
        preview,
    )))
}

pub async fn accept_invitation(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((workspace_id, token)): Path<(Uuid, String)>,
) -> AppResult<impl IntoResponse> {
    let workspace = workspaces(&state)
        .accept_invitation(user.user_id, workspace_id, &token)
        .await?;
    Ok(Json(ApiResponse::new("Joined Workspace Successfully", workspace)))
}
