//! Board handlers: boards, lists, cards, invitations and join requests

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
use crate::services::board::{AddListInput, CreateBoardInput, UpdateBoardInput, UpdateListInput};
use crate::services::card::{AddCardInput, MoveCardInput, UpdateCardInput};
use crate::services::invite::{InviteMemberInput, RequestJoinInput, RespondInput, TokenInput};
use crate::services::{BoardService, CardService, InviteService};
use crate::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovedBoard {
    pub board_id: Uuid,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovedList {
    pub list_id: Uuid,
    pub card_counts: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovedCard {
    pub card_id: Uuid,
}

#[derive(Serialize)]
pub struct RequestStatus {
    pub status: &'static str,
}

fn boards(state: &AppState) -> BoardService {
    BoardService::new(state.db.clone(), state.hub.clone())
}

fn cards(state: &AppState) -> CardService {
    CardService::new(state.db.clone(), state.hub.clone())
}

fn invites(state: &AppState) -> InviteService {
    InviteService::new(state.db.clone(), state.hub.clone(), &state.config.frontend_url)
}

// ============================================================================
// Boards
// ============================================================================

pub async fn create_board(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<CreateBoardInput>,
) -> AppResult<impl IntoResponse> {
    let board = boards(&state).create(user.user_id, input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new("Board created successfully", board)),
    ))
}

pub async fn list_boards(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<impl IntoResponse> {
    let all = boards(&state).all_for_user(user.user_id).await?;
    Ok(Json(ApiResponse::new("All Boards", all)))
}

pub async fn get_board(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(board_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let detail = boards(&state).detail(user.user_id, board_id).await?;
    Ok(Json(ApiResponse::new("Board fetched successfully", detail)))
}

pub async fn update_board(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(board_id): Path<Uuid>,
    Json(input): Json<UpdateBoardInput>,
) -> AppResult<impl IntoResponse> {
    let board = boards(&state).update(user.user_id, board_id, input).await?;
    Ok(Json(ApiResponse::new("Board updated successfully", board)))
}

pub async fn close_board(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(board_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let board = boards(&state).set_closed(user.user_id, board_id, true).await?;
    Ok(Json(ApiResponse::new("Board closed successfully", board)))
}

pub async fn reopen_board(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(board_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let board = boards(&state).set_closed(user.user_id, board_id, false).await?;
    Ok(Json(ApiResponse::new("Board reopened successfully", board)))
}

pub async fn delete_board(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(board_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let board_id = boards(&state).delete(user.user_id, board_id).await?;
    Ok(Json(ApiResponse::new(
        "Board deleted successfully",
        RemovedBoard { board_id },
    )))
}

// ============================================================================
// Lists
// ============================================================================

pub async fn add_list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<AddListInput>,
) -> AppResult<impl IntoResponse> {
    let list = boards(&state).add_list(user.user_id, input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new("List created successfully", list)),
    ))
}

pub async fn update_list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(list_id): Path<Uuid>,
    Json(input): Json<UpdateListInput>,
) -> AppResult<impl IntoResponse> {
    let list = boards(&state).update_list(user.user_id, list_id, input).await?;
    Ok(Json(ApiResponse::new("List updated successfully", list)))
}

pub async fn delete_list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(list_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let card_counts = boards(&state).delete_list(user.user_id, list_id).await?;
    Ok(Json(ApiResponse::new(
        "List deleted successfully",
        RemovedList {
            list_id,
            card_counts,
        },
    )))
}

// ============================================================================
// Cards
// ============================================================================

pub async fn add_card(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<AddCardInput>,
) -> AppResult<impl IntoResponse> {
    let card = cards(&state).add(user.user_id, input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new("Card created successfully", card)),
    ))
}

pub async fn update_card(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(card_id): Path<Uuid>,
    Json(input): Json<UpdateCardInput>,
) -> AppResult<impl IntoResponse> {
    let card = cards(&state).update(user.user_id, card_id, input).await?;
    Ok(Json(ApiResponse::new("Card update successfully", card)))
}

pub async fn move_card(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(card_id): Path<Uuid>,
    Json(input): Json<MoveCardInput>,
) -> AppResult<impl IntoResponse> {
    let card = cards(&state).move_card(user.user_id, card_id, input).await?;
    Ok(Json(ApiResponse::new("Card moved successfully", card)))
}

pub async fn delete_card(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(card_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let card_id = cards(&state).delete(user.user_id, card_id).await?;
    Ok(Json(ApiResponse::new(
        "Card deleted successfully",
        RemovedCard { card_id },
    )))
}

pub async fn board_cards(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(board_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let all = cards(&state).cards_for_board(user.user_id, board_id).await?;
    Ok(Json(ApiResponse::new("Cards successfully", all)))
}

pub async fn get_card(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(card_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let detail = cards(&state).detail(user.user_id, card_id).await?;
    Ok(Json(ApiResponse::new("Card found successfully", detail)))
}

// ============================================================================
// Invite tokens
// ============================================================================

pub async fn generate_invite_token(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(board_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let token = invites(&state).generate_token(user.user_id, board_id).await?;
    let message = if token.created {
        "Invite token generated"
    } else {
        "Invite token already exists"
    };
    Ok(Json(ApiResponse::new(message, token)))
}

pub async fn delete_invite_token(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(board_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    invites(&state).revoke_token(user.user_id, board_id).await?;
    Ok(Json(ApiResponse::message("Invite token revoked/deleted")))
}

pub async fn verify_invite_token(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<TokenInput>,
) -> AppResult<impl IntoResponse> {
    let check = invites(&state).verify_token(user.user_id, input).await?;
    Ok(Json(ApiResponse::new("Invite token is valid", check)))
}

pub async fn join_with_token(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<TokenInput>,
) -> AppResult<impl IntoResponse> {
    let board = invites(&state).join_with_token(user.user_id, input).await?;
    Ok(Json(ApiResponse::new("Joined board successfully", board)))
}

// ============================================================================
// Email invitations
// ============================================================================

pub async fn invite_member(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(board_id): Path<Uuid>,
    Json(input): Json<InviteMemberInput>,
) -> AppResult<impl IntoResponse> {
    let sent = invites(&state)
        .invite_member(&state.mailer, user.user_id, &user.full_name, board_id, input)
        .await?;
    Ok(Json(ApiResponse::new("Invitation sent via email", sent)))
}

pub async fn accept_invite(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(board_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let board = invites(&state)
        .accept_invite(user.user_id, &user.email, board_id)
        .await?;
    Ok(Json(ApiResponse::new("Invitation accepted", board)))
}

// ============================================================================
// Join requests
// ============================================================================

pub async fn request_join(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<RequestJoinInput>,
) -> AppResult<impl IntoResponse> {
    let request = invites(&state).request_join(user.user_id, input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new("Join request sent successfully", request)),
    ))
}

pub async fn request_status(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(board_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let status = invites(&state).request_status(user.user_id, board_id).await?;
    Ok(Json(ApiResponse::new(
        "Join request status fetched",
        RequestStatus { status },
    )))
}

pub async fn respond_join_request(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(request_id): Path<Uuid>,
    Json(input): Json<RespondInput>,
) -> AppResult<impl IntoResponse> {
    let response = invites(&state).respond(user.user_id, request_id, input).await?;
    let message = format!("Join request {} successfully", response.status);
    Ok(Json(ApiResponse::new(message, response)))
}
