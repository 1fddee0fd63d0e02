//! Notification payloads and their storage shape
//!
//! Every notification kind keeps only the fields that belong to it; the rest
//! of the columns are stored as NULL so a read never shows stale data from
//! another kind.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Top-level notification kind
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum NotificationKind {
    Card,
    Request,
    JoinWithLink,
    Board,
    AddedToBoard,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Card => "card",
            NotificationKind::Request => "request",
            NotificationKind::JoinWithLink => "joinWithLink",
            NotificationKind::Board => "board",
            NotificationKind::AddedToBoard => "addedToBoard",
        }
    }
}

/// Actions reported by `card` notifications
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum CardAction {
    Commented,
    Moved,
    AddMemberToCard,
    RemoveMemberFromCard,
}

impl CardAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardAction::Commented => "commented",
            CardAction::Moved => "moved",
            CardAction::AddMemberToCard => "addMemberToCard",
            CardAction::RemoveMemberFromCard => "removeMemberFromCard",
        }
    }
}

/// Actions reported by `board` notifications
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum BoardAction {
    CloseBoard,
    ReopenBoard,
}

impl BoardAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoardAction::CloseBoard => "closeBoard",
            BoardAction::ReopenBoard => "reopenBoard",
        }
    }
}

/// What happened, with the identifiers each kind needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationPayload {
    Card {
        card_id: Uuid,
        board_id: Uuid,
        event: CardEvent,
    },
    Request {
        board_id: Uuid,
        request_by: Uuid,
    },
    JoinWithLink {
        board_id: Uuid,
        user_id: Uuid,
    },
    Board {
        board_id: Uuid,
        action: BoardAction,
    },
    AddedToBoard {
        board_id: Uuid,
        member_added: Uuid,
    },
}

/// Card-level event detail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardEvent {
    Commented { comment_id: Uuid },
    Moved { from_list_id: Uuid, to_list_id: Uuid },
    AddMember { user_id: Uuid },
    RemoveMember { user_id: Uuid },
}

impl CardEvent {
    pub fn action(&self) -> CardAction {
        match self {
            CardEvent::Commented { .. } => CardAction::Commented,
            CardEvent::Moved { .. } => CardAction::Moved,
            CardEvent::AddMember { .. } => CardAction::AddMemberToCard,
            CardEvent::RemoveMember { .. } => CardAction::RemoveMemberFromCard,
        }
    }
}

/// Flat column layout of a stored notification
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationColumns {
    pub kind: &'static str,
    pub action: Option<&'static str>,
    pub board_id: Option<Uuid>,
    pub card_id: Option<Uuid>,
    pub comment_id: Option<Uuid>,
    pub from_list_id: Option<Uuid>,
    pub to_list_id: Option<Uuid>,
    pub subject_user_id: Option<Uuid>,
}

impl NotificationPayload {
    pub fn kind(&self) -> NotificationKind {
        match self {
            NotificationPayload::Card { .. } => NotificationKind::Card,
            NotificationPayload::Request { .. } => NotificationKind::Request,
            NotificationPayload::JoinWithLink { .. } => NotificationKind::JoinWithLink,
            NotificationPayload::Board { .. } => NotificationKind::Board,
            NotificationPayload::AddedToBoard { .. } => NotificationKind::AddedToBoard,
        }
    }

    /// Project the payload onto storage columns, leaving unrelated fields empty
    pub fn columns(&self) -> NotificationColumns {
        let kind = self.kind().as_str();
        match *self {
            NotificationPayload::Card {
                card_id,
                board_id,
                event,
            } => {
                let mut cols = NotificationColumns {
                    kind,
                    action: Some(event.action().as_str()),
                    board_id: Some(board_id),
                    card_id: Some(card_id),
                    ..Default::default()
                };
                match event {
                    CardEvent::Commented { comment_id } => cols.comment_id = Some(comment_id),
                    CardEvent::Moved {
                        from_list_id,
                        to_list_id,
                    } => {
                        cols.from_list_id = Some(from_list_id);
                        cols.to_list_id = Some(to_list_id);
                    }
                    CardEvent::AddMember { user_id } | CardEvent::RemoveMember { user_id } => {
                        cols.subject_user_id = Some(user_id)
                    }
                }
                cols
            }
            NotificationPayload::Request {
                board_id,
                request_by,
            } => NotificationColumns {
                kind,
                board_id: Some(board_id),
                subject_user_id: Some(request_by),
                ..Default::default()
            },
            NotificationPayload::JoinWithLink { board_id, user_id } => NotificationColumns {
                kind,
                board_id: Some(board_id),
                subject_user_id: Some(user_id),
                ..Default::default()
            },
            NotificationPayload::Board { board_id, action } => NotificationColumns {
                kind,
                action: Some(action.as_str()),
                board_id: Some(board_id),
                ..Default::default()
            },
            NotificationPayload::AddedToBoard {
                board_id,
                member_added,
            } => NotificationColumns {
                kind,
                board_id: Some(board_id),
                subject_user_id: Some(member_added),
                ..Default::default()
            },
        }
    }
}

/// A notification about to be created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub recipient: Uuid,
    pub created_by: Option<Uuid>,
    pub payload: NotificationPayload,
}

impl NewNotification {
    pub fn new(recipient: Uuid, created_by: Uuid, payload: NotificationPayload) -> Self {
        Self {
            recipient,
            created_by: Some(created_by),
            payload,
        }
    }

    /// The author, defaulting to the recipient
    pub fn author(&self) -> Uuid {
        self.created_by.unwrap_or(self.recipient)
    }

    /// Users are never notified about their own actions
    pub fn is_self_addressed(&self) -> bool {
        self.created_by == Some(self.recipient)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_moved_keeps_only_move_fields() {
        let (card, board, from, to) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let cols = NotificationPayload::Card {
            card_id: card,
            board_id: board,
            event: CardEvent::Moved {
                from_list_id: from,
                to_list_id: to,
            },
        }
        .columns();

        assert_eq!(cols.kind, "card");
        assert_eq!(cols.action, Some("moved"));
        assert_eq!(cols.from_list_id, Some(from));
        assert_eq!(cols.to_list_id, Some(to));
        assert_eq!(cols.comment_id, None);
        assert_eq!(cols.subject_user_id, None);
    }

    #[test]
    fn test_board_notification_has_no_card_fields() {
        let cols = NotificationPayload::Board {
            board_id: Uuid::new_v4(),
            action: BoardAction::CloseBoard,
        }
        .columns();
        assert_eq!(cols.kind, "board");
        assert_eq!(cols.action, Some("closeBoard"));
        assert!(cols.card_id.is_none());
        assert!(cols.subject_user_id.is_none());
    }

    #[test]
    fn test_author_defaults_to_recipient() {
        let recipient = Uuid::new_v4();
        let n = NewNotification {
            recipient,
            created_by: None,
            payload: NotificationPayload::Request {
                board_id: Uuid::new_v4(),
                request_by: Uuid::new_v4(),
            },
        };
        assert_eq!(n.author(), recipient);
        assert!(!n.is_self_addressed());
    }
}
