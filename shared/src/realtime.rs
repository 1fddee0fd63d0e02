//! Real-time rooms, event names and WebSocket frames
//!
//! Room and event names are part of the client contract and must not change.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A named fan-out group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Room {
    Board(Uuid),
    BoardOwner(Uuid),
    User(Uuid),
    Workspace(Uuid),
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Room::Board(id) => write!(f, "board:{}", id),
            Room::BoardOwner(id) => write!(f, "board:{}:owner", id),
            Room::User(id) => write!(f, "user:{}", id),
            Room::Workspace(id) => write!(f, "workspace:{}", id),
        }
    }
}

pub mod events {
    use uuid::Uuid;

    pub const CARD_CREATE: &str = "cardCreate";
    pub const CARD_UPDATED: &str = "cardUpdated";
    pub const CARD_MOVED: &str = "cardMoved";
    pub const CARD_REMOVED: &str = "cardRemoved";
    pub const JOIN_REQUEST: &str = "joinRequest";
    pub const NOTIFICATION_RECEIVE: &str = "notification:receive";

    pub fn join_request(board_id: Uuid) -> String {
        format!("joinRequest:{}", board_id)
    }

    pub fn join_request_response(board_id: Uuid) -> String {
        format!("joinRequestResponse:{}", board_id)
    }

    pub fn board_closed(board_id: Uuid) -> String {
        format!("boardClosed:{}", board_id)
    }

    pub fn board_reopened(board_id: Uuid) -> String {
        format!("boardReopened:{}", board_id)
    }

    pub fn list_create(board_id: Uuid) -> String {
        format!("listCreate:{}", board_id)
    }

    pub fn list_update(board_id: Uuid) -> String {
        format!("listUpdate:{}", board_id)
    }

    pub fn list_remove(board_id: Uuid) -> String {
        format!("listRemove:{}", board_id)
    }

    pub fn workspace_updated(workspace_id: Uuid) -> String {
        format!("workspaceUpdated:{}", workspace_id)
    }
}

/// Frames a client may send over the socket
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientMessage {
    #[serde(rename_all = "camelCase")]
    JoinBoardRoom { board_id: Uuid },
    #[serde(rename_all = "camelCase")]
    LeaveBoardRoom { board_id: Uuid },
    #[serde(rename_all = "camelCase")]
    JoinWorkspaceRoom { workspace_id: Uuid },
    #[serde(rename_all = "camelCase")]
    LeaveWorkspaceRoom { workspace_id: Uuid },
}

/// Frame pushed to a client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerFrame {
    pub event: String,
    pub data: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_names() {
        let id = Uuid::nil();
        assert_eq!(
            Room::Board(id).to_string(),
            "board:00000000-0000-0000-0000-000000000000"
        );
        assert!(Room::BoardOwner(id).to_string().ends_with(":owner"));
        assert!(Room::User(id).to_string().starts_with("user:"));
        assert!(Room::Workspace(id).to_string().starts_with("workspace:"));
    }

    #[test]
    fn test_parse_client_message() {
        let id = Uuid::new_v4();
        let raw = format!(r#"{{"event":"joinBoardRoom","data":{{"boardId":"{}"}}}}"#, id);
        let msg: ClientMessage = serde_json::from_str(&raw).unwrap();
        assert_eq!(msg, ClientMessage::JoinBoardRoom { board_id: id });

        let raw = format!(
            r#"{{"event":"leaveWorkspaceRoom","data":{{"workspaceId":"{}"}}}}"#,
            id
        );
        let msg: ClientMessage = serde_json::from_str(&raw).unwrap();
        assert_eq!(msg, ClientMessage::LeaveWorkspaceRoom { workspace_id: id });
    }

    #[test]
    fn test_unknown_event_rejected() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"event":"shout","data":{}}"#).is_err());
    }

    #[test]
    fn test_event_names() {
        let id = Uuid::nil();
        assert!(events::list_remove(id).starts_with("listRemove:"));
        assert!(events::join_request_response(id).starts_with("joinRequestResponse:"));
    }
}
