//! Card activity log

use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::models::ActivityAction;
use shared::types::UserSummary;
use sqlx::{FromRow, PgExecutor};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::notification::ListRef;

/// An activity entry about to be written
#[derive(Debug, Clone)]
pub struct NewActivity {
    pub card_id: Uuid,
    pub board_id: Uuid,
    pub user_id: Uuid,
    pub action: ActivityAction,
    pub list_id: Option<Uuid>,
    pub from_list_id: Option<Uuid>,
    pub to_list_id: Option<Uuid>,
    pub comment: Option<String>,
    pub subject_user_id: Option<Uuid>,
}

impl NewActivity {
    pub fn new(card_id: Uuid, board_id: Uuid, user_id: Uuid, action: ActivityAction) -> Self {
        Self {
            card_id,
            board_id,
            user_id,
            action,
            list_id: None,
            from_list_id: None,
            to_list_id: None,
            comment: None,
            subject_user_id: None,
        }
    }
}

/// An activity entry with its users and lists resolved
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityView {
    pub id: Uuid,
    pub action: String,
    pub card_id: Uuid,
    pub board_id: Uuid,
    pub user: UserSummary,
    pub list_id: Option<Uuid>,
    pub from_list: Option<ListRef>,
    pub to_list: Option<ListRef>,
    pub comment: Option<String>,
    pub subject_user: Option<UserSummary>,
    pub created_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct ActivityRow {
    id: Uuid,
    action: String,
    card_id: Uuid,
    board_id: Uuid,
    user_id: Uuid,
    user_name: String,
    user_initials: String,
    list_id: Option<Uuid>,
    from_list_id: Option<Uuid>,
    from_list_title: Option<String>,
    to_list_id: Option<Uuid>,
    to_list_title: Option<String>,
    comment: Option<String>,
    subject_id: Option<Uuid>,
    subject_name: Option<String>,
    subject_initials: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<ActivityRow> for ActivityView {
    fn from(row: ActivityRow) -> Self {
        Self {
            id: row.id,
            action: row.action,
            card_id: row.card_id,
            board_id: row.board_id,
            user: UserSummary {
                id: row.user_id,
                full_name: row.user_name,
                initials: row.user_initials,
            },
            list_id: row.list_id,
            from_list: row
                .from_list_id
                .zip(row.from_list_title)
                .map(|(id, title)| ListRef { id, title }),
            to_list: row
                .to_list_id
                .zip(row.to_list_title)
                .map(|(id, title)| ListRef { id, title }),
            comment: row.comment,
            subject_user: match (row.subject_id, row.subject_name, row.subject_initials) {
                (Some(id), Some(full_name), Some(initials)) => Some(UserSummary {
                    id,
                    full_name,
                    initials,
                }),
                _ => None,
            },
            created_at: row.created_at,
        }
    }
}

pub async fn record<'e, E>(db: E, activity: &NewActivity) -> AppResult<Uuid>
where
    E: PgExecutor<'e>,
{
    let id = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO activities (
            card_id, board_id, user_id, action, list_id, from_list_id, to_list_id,
            comment, subject_user_id
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING id
        "#,
    )
    .bind(activity.card_id)
    .bind(activity.board_id)
    .bind(activity.user_id)
    .bind(activity.action.as_str())
    .bind(activity.list_id)
    .bind(activity.from_list_id)
    .bind(activity.to_list_id)
    .bind(&activity.comment)
    .bind(activity.subject_user_id)
    .fetch_one(db)
    .await?;
    Ok(id)
}

/// A card's activity log, newest first
pub async fn for_card<'e, E>(db: E, card_id: Uuid) -> AppResult<Vec<ActivityView>>
where
    E: PgExecutor<'e>,
{
    let rows = sqlx::query_as::<_, ActivityRow>(
        r#"
        SELECT a.id, a.action, a.card_id, a.board_id,
               u.id AS user_id, u.full_name AS user_name, u.initials AS user_initials,
               a.list_id,
               fl.id AS from_list_id, fl.title AS from_list_title,
               tl.id AS to_list_id, tl.title AS to_list_title,
               a.comment,
               su.id AS subject_id, su.full_name AS subject_name, su.initials AS subject_initials,
               a.created_at
        FROM activities a
        JOIN users u ON u.id = a.user_id
        LEFT JOIN lists fl ON fl.id = a.from_list_id
        LEFT JOIN lists tl ON tl.id = a.to_list_id
        LEFT JOIN users su ON su.id = a.subject_user_id
        WHERE a.card_id = $1
        ORDER BY a.created_at DESC
        "#,
    )
    .bind(card_id)
    .fetch_all(db)
    .await?;

    Ok(rows.into_iter().map(ActivityView::from).collect())
}
