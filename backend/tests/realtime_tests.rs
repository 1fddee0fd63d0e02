//! Realtime and meeting tests
//!
//! Property-based and unit tests for:
//! - Room naming and event names shared with clients
//! - WebSocket client frame parsing
//! - Invite token structure
//! - Meeting channels, participants and video token claims

use proptest::prelude::*;
use shared::identifiers::{
    board_invite_token, meeting_channel_name, slugify, split_invite_token, workspace_invite_token,
};
use shared::realtime::{events, ClientMessage, Room, ServerFrame};
use shared::{participants_with_creator, VideoTokenClaims};
use uuid::Uuid;

// ============================================================================
// Property Test Strategies
// ============================================================================

fn id_strategy() -> impl Strategy<Value = Uuid> {
    any::<u128>().prop_map(Uuid::from_u128)
}

/// Generate random token bytes
fn random_bytes_strategy() -> impl Strategy<Value = [u8; 8]> {
    any::<[u8; 8]>()
}

/// Generate board titles
fn board_title_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z0-9][A-Za-z0-9 ]{0,30}"
}

fn room_strategy() -> impl Strategy<Value = Room> {
    prop_oneof![
        id_strategy().prop_map(Room::Board),
        id_strategy().prop_map(Room::BoardOwner),
        id_strategy().prop_map(Room::User),
        id_strategy().prop_map(Room::Workspace),
    ]
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Board invite tokens split back into an 11-char prefix and the title slug
    #[test]
    fn prop_board_token_splits(bytes in random_bytes_strategy(), title in board_title_strategy()) {
        let token = board_invite_token(&bytes, &title);
        let (prefix, slug) = split_invite_token(&token).unwrap();
        prop_assert_eq!(prefix.len(), 11);
        prop_assert_eq!(slug, slugify(&title));
    }

    /// Workspace invite tokens embed the workspace id
    #[test]
    fn prop_workspace_token_carries_id(bytes in random_bytes_strategy(), id in id_strategy()) {
        let token = workspace_invite_token(&bytes, &id);
        let (_, slug) = split_invite_token(&token).unwrap();
        prop_assert_eq!(slug, id.to_string());
    }

    /// Meeting channels are `meeting-` followed by 16 hex digits
    #[test]
    fn prop_meeting_channel(bytes in random_bytes_strategy()) {
        let channel = meeting_channel_name(&bytes);
        let hex = channel.strip_prefix("meeting-").unwrap();
        prop_assert_eq!(hex.len(), 16);
        prop_assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
    }

    /// The creator is always first and appears once
    #[test]
    fn prop_participants_with_creator(
        creator in id_strategy(),
        invited in prop::collection::vec(0u128..6, 0..10),
    ) {
        let mut invited: Vec<Uuid> = invited.into_iter().map(Uuid::from_u128).collect();
        invited.push(creator);
        let participants = participants_with_creator(creator, &invited);

        prop_assert_eq!(participants[0], creator);
        prop_assert_eq!(participants.iter().filter(|id| **id == creator).count(), 1);
        for id in &invited {
            prop_assert!(participants.contains(id));
        }
    }

    /// Distinct rooms never share a name
    #[test]
    fn prop_room_names_distinct(a in room_strategy(), b in room_strategy()) {
        prop_assert_eq!(a == b, a.to_string() == b.to_string());
    }
}

// ============================================================================
// Invite Token Tests
// ============================================================================

#[cfg(test)]
mod invite_token_tests {
    use super::*;

    #[test]
    fn test_prefix_may_contain_dash() {
        let token = board_invite_token(&[0xfb; 8], "Launch");
        let (prefix, slug) = split_invite_token(&token).unwrap();
        assert_eq!(prefix.len(), 11);
        assert_eq!(slug, "launch");
    }

    #[test]
    fn test_malformed_tokens_rejected() {
        assert!(split_invite_token("").is_none());
        assert!(split_invite_token("short").is_none());
        assert!(split_invite_token("AAAAAAAAAAAXslug").is_none());
        assert!(split_invite_token("AAAAAAAAA!A-slug").is_none());
    }

    #[test]
    fn test_workspace_token_names_only_its_workspace() {
        let (ours, other) = (Uuid::from_u128(7), Uuid::from_u128(8));
        let token = workspace_invite_token(&[9u8; 8], &other);
        let (_, slug) = split_invite_token(&token).unwrap();
        assert_ne!(slug, ours.to_string());
        assert_eq!(slug, other.to_string());
    }
}

// ============================================================================
// Room and Event Tests
// ============================================================================

#[cfg(test)]
mod room_tests {
    use super::*;

    #[test]
    fn test_room_names() {
        let id = Uuid::nil();
        assert_eq!(Room::User(id).to_string(), format!("user:{}", id));
        assert_eq!(Room::BoardOwner(id).to_string(), format!("board:{}:owner", id));
        assert_eq!(Room::Workspace(id).to_string(), format!("workspace:{}", id));
    }

    #[test]
    fn test_board_scoped_event_names() {
        let id = Uuid::nil();
        assert_eq!(events::board_closed(id), format!("boardClosed:{}", id));
        assert_eq!(events::board_reopened(id), format!("boardReopened:{}", id));
        assert_eq!(events::list_create(id), format!("listCreate:{}", id));
        assert_eq!(events::list_update(id), format!("listUpdate:{}", id));
        assert_eq!(events::join_request(id), format!("joinRequest:{}", id));
        assert_eq!(events::workspace_updated(id), format!("workspaceUpdated:{}", id));
    }

    #[test]
    fn test_fixed_event_names() {
        assert_eq!(events::CARD_CREATE, "cardCreate");
        assert_eq!(events::CARD_MOVED, "cardMoved");
        assert_eq!(events::NOTIFICATION_RECEIVE, "notification:receive");
    }
}

// ============================================================================
// Frame Tests
// ============================================================================

#[cfg(test)]
mod frame_tests {
    use super::*;

    #[test]
    fn test_parse_join_workspace_room() {
        let id = Uuid::new_v4();
        let msg: ClientMessage = serde_json::from_value(serde_json::json!({
            "event": "joinWorkspaceRoom",
            "data": { "workspaceId": id }
        }))
        .unwrap();
        assert_eq!(msg, ClientMessage::JoinWorkspaceRoom { workspace_id: id });
    }

    #[test]
    fn test_missing_data_rejected() {
        let result = serde_json::from_value::<ClientMessage>(serde_json::json!({
            "event": "leaveBoardRoom"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_server_frame_shape() {
        let frame = ServerFrame {
            event: events::CARD_REMOVED.to_string(),
            data: serde_json::json!({ "cardId": "c1" }),
        };
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["event"], "cardRemoved");
        assert_eq!(json["data"]["cardId"], "c1");
    }
}

// ============================================================================
// Video Token Tests
// ============================================================================

#[cfg(test)]
mod video_token_tests {
    use super::*;

    #[test]
    fn test_claims_expiry() {
        let user = Uuid::new_v4();
        let claims = VideoTokenClaims::new(42, user, "meeting-00", 1_700_000_000, 3600);
        assert_eq!(claims.exp, 1_700_003_600);
        assert_eq!(claims.user_id, user.to_string());
        assert_eq!(claims.room_id, "meeting-00");
        assert_eq!(claims.app_id, 42);
    }

    #[test]
    fn test_participants_keep_invite_order() {
        let creator = Uuid::from_u128(1);
        let (a, b) = (Uuid::from_u128(2), Uuid::from_u128(3));
        assert_eq!(
            participants_with_creator(creator, &[b, a, b]),
            vec![creator, b, a]
        );
    }
}
