//! Authenticated WebSocket endpoint
//!
//! Frames in both directions are JSON `{ "event": ..., "data": ... }`. A socket
//! starts in its user's room and joins board or workspace rooms on request,
//! after membership is checked against the database.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use shared::realtime::{ClientMessage, Room, ServerFrame};
use std::collections::HashSet;
use tokio::sync::broadcast::error::RecvError;

use crate::error::AppResult;
use crate::middleware::{AuthUser, CurrentUser};
use crate::services::access;
use crate::AppState;

/// `GET /ws`
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Response {
    ws.on_upgrade(move |socket| run_socket(socket, state, user))
}

async fn run_socket(mut socket: WebSocket, state: AppState, user: AuthUser) {
    let mut events = state.hub.subscribe();
    let mut rooms: HashSet<String> = HashSet::new();
    rooms.insert(Room::User(user.user_id).to_string());

    tracing::debug!("[Realtime] Socket connected for user {}", user.user_id);

    loop {
        tokio::select! {
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    if let Err(e) = handle_client_frame(&state, &user, &mut rooms, &text).await {
                        tracing::warn!("[Realtime] Failed to handle frame from {}: {:?}", user.user_id, e);
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!("[Realtime] Socket error for {}: {}", user.user_id, e);
                    break;
                }
            },
            event = events.recv() => match event {
                Ok(event) if rooms.contains(&event.room) => {
                    let frame = ServerFrame { event: event.event, data: event.payload };
                    let text = match serde_json::to_string(&frame) {
                        Ok(text) => text,
                        Err(e) => {
                            tracing::error!("[Realtime] Failed to serialize frame: {:?}", e);
                            continue;
                        }
                    };
                    if socket.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("[Realtime] Socket for {} lagged, skipped {} events", user.user_id, skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    }

    tracing::debug!("[Realtime] Socket closed for user {}", user.user_id);
}

async fn handle_client_frame(
    state: &AppState,
    user: &AuthUser,
    rooms: &mut HashSet<String>,
    text: &str,
) -> AppResult<()> {
    let message = match serde_json::from_str::<ClientMessage>(text) {
        Ok(message) => message,
        Err(e) => {
            tracing::debug!("[Realtime] Ignoring unknown frame: {}", e);
            return Ok(());
        }
    };

    match message {
        ClientMessage::JoinBoardRoom { board_id } => {
            let board = access::board_access(&state.db, board_id, user.user_id).await?;
            if !board.is_member {
                tracing::debug!("[Realtime] {} is not a member of board {}", user.user_id, board_id);
                return Ok(());
            }
            rooms.insert(Room::Board(board_id).to_string());
            if board.is_owner(user.user_id) {
                rooms.insert(Room::BoardOwner(board_id).to_string());
            }
            tracing::debug!("[Realtime] {} joined board {}", user.user_id, board_id);
        }
        ClientMessage::LeaveBoardRoom { board_id } => {
            rooms.remove(&Room::Board(board_id).to_string());
            rooms.remove(&Room::BoardOwner(board_id).to_string());
            tracing::debug!("[Realtime] {} left board {}", user.user_id, board_id);
        }
        ClientMessage::JoinWorkspaceRoom { workspace_id } => {
            if access::is_workspace_member(&state.db, workspace_id, user.user_id).await? {
                rooms.insert(Room::Workspace(workspace_id).to_string());
                tracing::debug!("[Realtime] {} joined workspace {}", user.user_id, workspace_id);
            }
        }
        ClientMessage::LeaveWorkspaceRoom { workspace_id } => {
            rooms.remove(&Room::Workspace(workspace_id).to_string());
            tracing::debug!("[Realtime] {} left workspace {}", user.user_id, workspace_id);
        }
    }
    Ok(())
}
