//! Notification tests
//!
//! Property-based and unit tests for:
//! - Payload projection onto stored notification columns
//! - Self-addressed notification suppression
//! - Notification kind and action wire names

use proptest::prelude::*;
use shared::{
    BoardAction, CardAction, CardEvent, NewNotification, NotificationKind, NotificationPayload,
};
use uuid::Uuid;

// ============================================================================
// Property Test Strategies
// ============================================================================

fn id_strategy() -> impl Strategy<Value = Uuid> {
    any::<u128>().prop_map(Uuid::from_u128)
}

/// Generate every card event variant
fn card_event_strategy() -> impl Strategy<Value = CardEvent> {
    prop_oneof![
        id_strategy().prop_map(|comment_id| CardEvent::Commented { comment_id }),
        (id_strategy(), id_strategy()).prop_map(|(from_list_id, to_list_id)| CardEvent::Moved {
            from_list_id,
            to_list_id,
        }),
        id_strategy().prop_map(|user_id| CardEvent::AddMember { user_id }),
        id_strategy().prop_map(|user_id| CardEvent::RemoveMember { user_id }),
    ]
}

/// Generate every payload variant
fn payload_strategy() -> impl Strategy<Value = NotificationPayload> {
    prop_oneof![
        (id_strategy(), id_strategy(), card_event_strategy()).prop_map(
            |(card_id, board_id, event)| NotificationPayload::Card {
                card_id,
                board_id,
                event,
            }
        ),
        (id_strategy(), id_strategy()).prop_map(|(board_id, request_by)| {
            NotificationPayload::Request {
                board_id,
                request_by,
            }
        }),
        (id_strategy(), id_strategy())
            .prop_map(|(board_id, user_id)| NotificationPayload::JoinWithLink { board_id, user_id }),
        (id_strategy(), prop_oneof![Just(BoardAction::CloseBoard), Just(BoardAction::ReopenBoard)])
            .prop_map(|(board_id, action)| NotificationPayload::Board { board_id, action }),
        (id_strategy(), id_strategy()).prop_map(|(board_id, member_added)| {
            NotificationPayload::AddedToBoard {
                board_id,
                member_added,
            }
        }),
    ]
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Every notification references the board it happened on
    #[test]
    fn prop_columns_always_carry_board(payload in payload_strategy()) {
        let cols = payload.columns();
        prop_assert!(cols.board_id.is_some());
        prop_assert_eq!(cols.kind, payload.kind().as_str());
    }

    /// Only card notifications reference a card
    #[test]
    fn prop_card_column_only_for_card_kind(payload in payload_strategy()) {
        let cols = payload.columns();
        let is_card = matches!(payload, NotificationPayload::Card { .. });
        prop_assert_eq!(cols.card_id.is_some(), is_card);
    }

    /// Move columns are set together, and only for moves
    #[test]
    fn prop_move_columns_paired(payload in payload_strategy()) {
        let cols = payload.columns();
        prop_assert_eq!(cols.from_list_id.is_some(), cols.to_list_id.is_some());
        if cols.from_list_id.is_some() {
            prop_assert_eq!(cols.action, Some(CardAction::Moved.as_str()));
        }
    }

    /// A notification is self-addressed exactly when author and recipient match
    #[test]
    fn prop_self_addressed(
        recipient in id_strategy(),
        author in id_strategy(),
        payload in payload_strategy(),
    ) {
        let notification = NewNotification::new(recipient, author, payload);
        prop_assert_eq!(notification.is_self_addressed(), recipient == author);
        prop_assert_eq!(notification.author(), author);
    }
}

// ============================================================================
// Column Projection Tests
// ============================================================================

#[cfg(test)]
mod column_tests {
    use super::*;

    #[test]
    fn test_comment_notification_columns() {
        let (card, board, comment) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let cols = NotificationPayload::Card {
            card_id: card,
            board_id: board,
            event: CardEvent::Commented { comment_id: comment },
        }
        .columns();

        assert_eq!(cols.kind, "card");
        assert_eq!(cols.action, Some("commented"));
        assert_eq!(cols.comment_id, Some(comment));
        assert_eq!(cols.card_id, Some(card));
        assert!(cols.subject_user_id.is_none());
        assert!(cols.from_list_id.is_none());
    }

    #[test]
    fn test_member_change_records_subject() {
        let user = Uuid::new_v4();
        for (event, action) in [
            (CardEvent::AddMember { user_id: user }, "addMemberToCard"),
            (CardEvent::RemoveMember { user_id: user }, "removeMemberFromCard"),
        ] {
            let cols = NotificationPayload::Card {
                card_id: Uuid::new_v4(),
                board_id: Uuid::new_v4(),
                event,
            }
            .columns();
            assert_eq!(cols.action, Some(action));
            assert_eq!(cols.subject_user_id, Some(user));
            assert!(cols.comment_id.is_none());
        }
    }

    #[test]
    fn test_board_closed_columns() {
        let board = Uuid::new_v4();
        let cols = NotificationPayload::Board {
            board_id: board,
            action: BoardAction::CloseBoard,
        }
        .columns();

        assert_eq!(cols.kind, "board");
        assert_eq!(cols.action, Some("closeBoard"));
        assert!(cols.card_id.is_none());
        assert!(cols.subject_user_id.is_none());
    }

    #[test]
    fn test_join_request_columns() {
        let requester = Uuid::new_v4();
        let cols = NotificationPayload::Request {
            board_id: Uuid::new_v4(),
            request_by: requester,
        }
        .columns();

        assert_eq!(cols.kind, "request");
        assert!(cols.action.is_none());
        assert_eq!(cols.subject_user_id, Some(requester));
    }
}

// ============================================================================
// Naming Tests
// ============================================================================

#[cfg(test)]
mod naming_tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(NotificationKind::Card.as_str(), "card");
        assert_eq!(NotificationKind::Request.as_str(), "request");
        assert_eq!(NotificationKind::JoinWithLink.as_str(), "joinWithLink");
        assert_eq!(NotificationKind::Board.as_str(), "board");
        assert_eq!(NotificationKind::AddedToBoard.as_str(), "addedToBoard");
    }

    #[test]
    fn test_card_event_actions() {
        let id = Uuid::nil();
        assert_eq!(CardEvent::Commented { comment_id: id }.action(), CardAction::Commented);
        assert_eq!(
            CardEvent::Moved {
                from_list_id: id,
                to_list_id: id
            }
            .action(),
            CardAction::Moved
        );
        assert_eq!(BoardAction::ReopenBoard.as_str(), "reopenBoard");
    }

    #[test]
    fn test_author_defaults_to_recipient() {
        let recipient = Uuid::new_v4();
        let notification = NewNotification {
            recipient,
            created_by: None,
            payload: NotificationPayload::AddedToBoard {
                board_id: Uuid::new_v4(),
                member_added: recipient,
            },
        };
        assert_eq!(notification.author(), recipient);
        assert!(!notification.is_self_addressed());
    }
}
