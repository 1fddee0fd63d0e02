//! Card comments and emoji reactions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::models::{
    group_reactions, toggle_reaction, ActivityAction, CardEvent, Emoji, NewNotification,
    NotificationPayload, ReactionChange, ReactionGroup,
};
use shared::types::UserSummary;
use shared::validation::validate_comment;
use sqlx::{FromRow, PgExecutor, PgPool};
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::realtime::RealtimeHub;
use crate::services::access::{card_board_access, check, required};
use crate::services::activity::{self, NewActivity};
use crate::services::notification::{insert_notification, NotificationService};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCommentInput {
    pub card_id: Option<Uuid>,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteCommentInput {
    pub comment_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactInput {
    pub comment_id: Option<Uuid>,
    pub emoji: Option<Emoji>,
}

/// A reaction group with the reacting users resolved
#[derive(Debug, Clone, Serialize)]
pub struct ReactionView {
    #[serde(flatten)]
    pub group: ReactionGroup,
    pub users: Vec<UserSummary>,
}

/// A comment with its author and reactions
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: Uuid,
    pub card_id: Uuid,
    pub message: String,
    pub user: UserSummary,
    pub reactions: Vec<ReactionView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct CommentRow {
    id: Uuid,
    card_id: Uuid,
    message: String,
    user_id: Uuid,
    full_name: String,
    initials: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct ReactionRow {
    comment_id: Uuid,
    emoji: String,
    unified: String,
    user_id: Uuid,
    full_name: String,
    initials: String,
}

const COMMENT_SELECT: &str = r#"
    SELECT c.id, c.card_id, c.message, u.id AS user_id, u.full_name, u.initials,
           c.created_at, c.updated_at
    FROM comments c
    JOIN users u ON u.id = c.user_id
"#;

async fn load_reactions<'e, E>(db: E, comment_ids: &[Uuid]) -> AppResult<HashMap<Uuid, Vec<ReactionView>>>
where
    E: PgExecutor<'e>,
{
    let rows = sqlx::query_as::<_, ReactionRow>(
        r#"
        SELECT r.comment_id, r.emoji, r.unified, u.id AS user_id, u.full_name, u.initials
        FROM comment_reactions r
        JOIN users u ON u.id = r.user_id
        WHERE r.comment_id = ANY($1)
        ORDER BY r.created_at
        "#,
    )
    .bind(comment_ids)
    .fetch_all(db)
    .await?;

    let mut users: HashMap<Uuid, UserSummary> = HashMap::new();
    let mut per_comment: HashMap<Uuid, Vec<(String, String, Uuid)>> = HashMap::new();
    for row in rows {
        users.entry(row.user_id).or_insert_with(|| UserSummary {
            id: row.user_id,
            full_name: row.full_name,
            initials: row.initials,
        });
        per_comment
            .entry(row.comment_id)
            .or_default()
            .push((row.emoji, row.unified, row.user_id));
    }

    Ok(per_comment
        .into_iter()
        .map(|(comment_id, rows)| {
            let views = group_reactions(rows)
                .into_iter()
                .map(|group| ReactionView {
                    users: group
                        .user_ids
                        .iter()
                        .filter_map(|id| users.get(id).cloned())
                        .collect(),
                    group,
                })
                .collect();
            (comment_id, views)
        })
        .collect())
}

fn assemble(rows: Vec<CommentRow>, mut reactions: HashMap<Uuid, Vec<ReactionView>>) -> Vec<CommentView> {
    rows.into_iter()
        .map(|row| CommentView {
            reactions: reactions.remove(&row.id).unwrap_or_default(),
            id: row.id,
            card_id: row.card_id,
            message: row.message,
            user: UserSummary {
                id: row.user_id,
                full_name: row.full_name,
                initials: row.initials,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
        .collect()
}

/// Every comment on a card, newest first
pub async fn for_card(db: &PgPool, card_id: Uuid) -> AppResult<Vec<CommentView>> {
    let query = format!("{} WHERE c.card_id = $1 ORDER BY c.created_at DESC", COMMENT_SELECT);
    let rows = sqlx::query_as::<_, CommentRow>(&query)
        .bind(card_id)
        .fetch_all(db)
        .await?;

    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
    let reactions = load_reactions(db, &ids).await?;
    Ok(assemble(rows, reactions))
}

#[derive(Clone)]
pub struct CommentService {
    db: PgPool,
    notifications: NotificationService,
}

impl CommentService {
    pub fn new(db: PgPool, hub: RealtimeHub) -> Self {
        Self {
            notifications: NotificationService::new(db.clone(), hub),
            db,
        }
    }

    async fn get(&self, comment_id: Uuid) -> AppResult<CommentView> {
        let query = format!("{} WHERE c.id = $1", COMMENT_SELECT);
        let row = sqlx::query_as::<_, CommentRow>(&query)
            .bind(comment_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Comment".to_string()))?;

        let reactions = load_reactions(&self.db, &[comment_id]).await?;
        assemble(vec![row], reactions)
            .pop()
            .ok_or_else(|| AppError::NotFound("Comment".to_string()))
    }

    pub async fn add(&self, user_id: Uuid, input: AddCommentInput) -> AppResult<CommentView> {
        let card_id = input
            .card_id
            .ok_or_else(|| AppError::validation("cardId", "cardId is required"))?;
        let message = required("message", input.message)?;
        check("message", validate_comment(&message))?;

        let board = card_board_access(&self.db, card_id, user_id).await?;
        board.require_member()?;

        let mut tx = self.db.begin().await?;

        let comment_id = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO comments (card_id, user_id, message) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(card_id)
        .bind(user_id)
        .bind(&message)
        .fetch_one(&mut *tx)
        .await?;

        activity::record(
            &mut *tx,
            &NewActivity {
                comment: Some(message),
                ..NewActivity::new(card_id, board.id, user_id, ActivityAction::Commented)
            },
        )
        .await?;

        let recipients = sqlx::query_scalar::<_, Uuid>(
            "SELECT user_id FROM card_members WHERE card_id = $1 AND user_id <> $2",
        )
        .bind(card_id)
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await?;

        let mut created = Vec::with_capacity(recipients.len());
        for recipient in recipients {
            let notification = NewNotification::new(
                recipient,
                user_id,
                NotificationPayload::Card {
                    card_id,
                    board_id: board.id,
                    event: CardEvent::Commented { comment_id },
                },
            );
            if let Some(id) = insert_notification(&mut *tx, &notification).await? {
                created.push(id);
            }
        }

        tx.commit().await?;

        for id in created {
            self.notifications.publish(id).await?;
        }

        self.get(comment_id).await
    }

    /// Delete a comment; allowed for its author and the board owner
    pub async fn delete(&self, user_id: Uuid, input: DeleteCommentInput) -> AppResult<Uuid> {
        let comment_id = input
            .comment_id
            .ok_or_else(|| AppError::validation("commentId", "commentId is required"))?;

        let (author_id, card_id) = sqlx::query_as::<_, (Uuid, Uuid)>(
            "SELECT user_id, card_id FROM comments WHERE id = $1",
        )
        .bind(comment_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment".to_string()))?;

        let board = card_board_access(&self.db, card_id, user_id).await?;
        if author_id != user_id && !board.is_owner(user_id) {
            return Err(AppError::Forbidden(
                "Only the comment author or board owner can delete this comment".to_string(),
            ));
        }

        sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(comment_id)
            .execute(&self.db)
            .await?;

        Ok(comment_id)
    }

    /// Toggle the caller's reaction on a comment
    pub async fn react(&self, user_id: Uuid, input: ReactInput) -> AppResult<CommentView> {
        let (Some(comment_id), Some(emoji)) = (input.comment_id, input.emoji) else {
            return Err(AppError::BadRequest(
                "commentId and emoji are required".to_string(),
            ));
        };
        if emoji.emoji.trim().is_empty() || emoji.unified.trim().is_empty() {
            return Err(AppError::validation("emoji", "emoji and unified are required"));
        }

        let card_id = sqlx::query_scalar::<_, Uuid>("SELECT card_id FROM comments WHERE id = $1")
            .bind(comment_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Comment".to_string()))?;
        card_board_access(&self.db, card_id, user_id)
            .await?
            .require_member()?;

        let mut tx = self.db.begin().await?;

        let existing = sqlx::query_as::<_, (String, String, Uuid)>(
            "SELECT emoji, unified, user_id FROM comment_reactions WHERE comment_id = $1 AND unified = $2 FOR UPDATE",
        )
        .bind(comment_id)
        .bind(&emoji.unified)
        .fetch_all(&mut *tx)
        .await?;

        let mut groups = group_reactions(existing);
        match toggle_reaction(&mut groups, &emoji, user_id) {
            ReactionChange::Added => {
                sqlx::query(
                    "INSERT INTO comment_reactions (comment_id, user_id, emoji, unified) VALUES ($1, $2, $3, $4)",
                )
                .bind(comment_id)
                .bind(user_id)
                .bind(&emoji.emoji)
                .bind(&emoji.unified)
                .execute(&mut *tx)
                .await?;
            }
            ReactionChange::Removed => {
                sqlx::query(
                    "DELETE FROM comment_reactions WHERE comment_id = $1 AND user_id = $2 AND unified = $3",
                )
                .bind(comment_id)
                .bind(user_id)
                .bind(&emoji.unified)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        self.get(comment_id).await
    }
}
