//! Notification service
//!
//! Persists per-user notifications, reads them back populated and pushes
//! them to the recipient's real-time room.

use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::models::NewNotification;
use shared::realtime::{events, Room};
use shared::types::UserSummary;
use sqlx::{FromRow, PgExecutor, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::realtime::RealtimeHub;

/// Notification service for managing notifications
#[derive(Clone)]
pub struct NotificationService {
    db: PgPool,
    hub: RealtimeHub,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardRef {
    pub id: Uuid,
    pub title: String,
    pub background: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardRef {
    pub id: Uuid,
    pub title: String,
    pub list_id: Uuid,
    pub list_title: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRef {
    pub id: Uuid,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListRef {
    pub id: Uuid,
    pub title: String,
}

/// A notification with every referenced entity resolved
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulatedNotification {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: String,
    pub action: Option<String>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
    pub created_by: UserSummary,
    pub user: UserSummary,
    pub board: Option<BoardRef>,
    pub card: Option<CardRef>,
    pub comment: Option<CommentRef>,
    pub from_list: Option<ListRef>,
    pub to_list: Option<ListRef>,
    pub subject_user: Option<UserSummary>,
}

#[derive(Debug, FromRow)]
struct NotificationRow {
    id: Uuid,
    kind: String,
    action: Option<String>,
    read: bool,
    created_at: DateTime<Utc>,
    creator_id: Uuid,
    creator_name: String,
    creator_initials: String,
    recipient_id: Uuid,
    recipient_name: String,
    recipient_initials: String,
    board_id: Option<Uuid>,
    board_title: Option<String>,
    board_background: Option<String>,
    card_id: Option<Uuid>,
    card_title: Option<String>,
    card_list_id: Option<Uuid>,
    card_list_title: Option<String>,
    comment_id: Option<Uuid>,
    comment_message: Option<String>,
    comment_created_at: Option<DateTime<Utc>>,
    from_list_id: Option<Uuid>,
    from_list_title: Option<String>,
    to_list_id: Option<Uuid>,
    to_list_title: Option<String>,
    subject_id: Option<Uuid>,
    subject_name: Option<String>,
    subject_initials: Option<String>,
}

impl From<NotificationRow> for PopulatedNotification {
    fn from(row: NotificationRow) -> Self {
        let list = |id: Option<Uuid>, title: Option<String>| {
            id.zip(title).map(|(id, title)| ListRef { id, title })
        };

        Self {
            id: row.id,
            kind: row.kind,
            action: row.action,
            read: row.read,
            created_at: row.created_at,
            created_by: UserSummary {
                id: row.creator_id,
                full_name: row.creator_name,
                initials: row.creator_initials,
            },
            user: UserSummary {
                id: row.recipient_id,
                full_name: row.recipient_name,
                initials: row.recipient_initials,
            },
            board: match (row.board_id, row.board_title, row.board_background) {
                (Some(id), Some(title), Some(background)) => Some(BoardRef {
                    id,
                    title,
                    background,
                }),
                _ => None,
            },
            card: match (row.card_id, row.card_title, row.card_list_id) {
                (Some(id), Some(title), Some(list_id)) => Some(CardRef {
                    id,
                    title,
                    list_id,
                    list_title: row.card_list_title.unwrap_or_default(),
                }),
                _ => None,
            },
            comment: match (row.comment_id, row.comment_message, row.comment_created_at) {
                (Some(id), Some(message), Some(created_at)) => Some(CommentRef {
                    id,
                    message,
                    created_at,
                }),
                _ => None,
            },
            from_list: list(row.from_list_id, row.from_list_title),
            to_list: list(row.to_list_id, row.to_list_title),
            subject_user: match (row.subject_id, row.subject_name, row.subject_initials) {
                (Some(id), Some(full_name), Some(initials)) => Some(UserSummary {
                    id,
                    full_name,
                    initials,
                }),
                _ => None,
            },
        }
    }
}

const POPULATED_SELECT: &str = r#"
    SELECT n.id, n.kind, n.action, n.read, n.created_at,
           cu.id AS creator_id, cu.full_name AS creator_name, cu.initials AS creator_initials,
           ru.id AS recipient_id, ru.full_name AS recipient_name, ru.initials AS recipient_initials,
           b.id AS board_id, b.title AS board_title, b.background AS board_background,
           c.id AS card_id, c.title AS card_title, c.list_id AS card_list_id, cl.title AS card_list_title,
           cm.id AS comment_id, cm.message AS comment_message, cm.created_at AS comment_created_at,
           fl.id AS from_list_id, fl.title AS from_list_title,
           tl.id AS to_list_id, tl.title AS to_list_title,
           su.id AS subject_id, su.full_name AS subject_name, su.initials AS subject_initials
    FROM notifications n
    JOIN users cu ON cu.id = n.created_by
    JOIN users ru ON ru.id = n.user_id
    LEFT JOIN boards b ON b.id = n.board_id
    LEFT JOIN cards c ON c.id = n.card_id
    LEFT JOIN lists cl ON cl.id = c.list_id
    LEFT JOIN comments cm ON cm.id = n.comment_id
    LEFT JOIN lists fl ON fl.id = n.from_list_id
    LEFT JOIN lists tl ON tl.id = n.to_list_id
    LEFT JOIN users su ON su.id = n.subject_user_id
"#;

/// Store a notification without publishing it. Self-addressed notifications are skipped.
///
/// Use inside a transaction, then call [`NotificationService::publish`] after commit.
pub async fn insert_notification<'e, E>(db: E, notification: &NewNotification) -> AppResult<Option<Uuid>>
where
    E: PgExecutor<'e>,
{
    if notification.is_self_addressed() {
        return Ok(None);
    }

    let cols = notification.payload.columns();
    let id = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO notifications (
            user_id, created_by, kind, action, board_id, card_id, comment_id,
            from_list_id, to_list_id, subject_user_id
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING id
        "#,
    )
    .bind(notification.recipient)
    .bind(notification.author())
    .bind(cols.kind)
    .bind(cols.action)
    .bind(cols.board_id)
    .bind(cols.card_id)
    .bind(cols.comment_id)
    .bind(cols.from_list_id)
    .bind(cols.to_list_id)
    .bind(cols.subject_user_id)
    .fetch_one(db)
    .await?;

    Ok(Some(id))
}

impl NotificationService {
    pub fn new(db: PgPool, hub: RealtimeHub) -> Self {
        Self { db, hub }
    }

    /// Read back a stored notification and push it to its recipient
    pub async fn publish(&self, id: Uuid) -> AppResult<PopulatedNotification> {
        let populated = self.get_populated(id).await?;
        self.hub.emit(
            Room::User(populated.user.id),
            events::NOTIFICATION_RECEIVE,
            &populated,
        );
        Ok(populated)
    }

    async fn get_populated(&self, id: Uuid) -> AppResult<PopulatedNotification> {
        let query = format!("{} WHERE n.id = $1", POPULATED_SELECT);
        sqlx::query_as::<_, NotificationRow>(&query)
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .map(PopulatedNotification::from)
            .ok_or_else(|| AppError::NotFound("Notification".to_string()))
    }

    /// The caller's notifications, newest first
    pub async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<PopulatedNotification>> {
        let query = format!(
            "{} WHERE n.user_id = $1 ORDER BY n.created_at DESC",
            POPULATED_SELECT
        );
        let rows = sqlx::query_as::<_, NotificationRow>(&query)
            .bind(user_id)
            .fetch_all(&self.db)
            .await?;
        Ok(rows.into_iter().map(PopulatedNotification::from).collect())
    }

    pub async fn mark_read(&self, user_id: Uuid, notification_id: &str) -> AppResult<PopulatedNotification> {
        let id = Uuid::parse_str(notification_id)
            .map_err(|_| AppError::validation("notificationId", "Invalid notification id"))?;

        let updated = sqlx::query("UPDATE notifications SET read = TRUE WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.db)
            .await?;

        if updated.rows_affected() == 0 {
            return Err(AppError::Missing(
                "Notification not found or you do not have permission to access it".to_string(),
            ));
        }

        self.get_populated(id).await
    }
}
