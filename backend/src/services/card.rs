//! Card service
//!
//! Cards live in a list on a board. Mutations keep the board's `card_count`
//! in step, write the activity log and push events to `board:{id}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use shared::models::{
    diff_members, outside_board, ActivityAction, CardCountChange, CardEvent, NewNotification,
    NotificationPayload,
};
use shared::realtime::{events, Room};
use shared::types::UserSummary;
use shared::validation::validate_title;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::realtime::RealtimeHub;
use crate::services::access::{self, board_access, card_board_access, check, required};
use crate::services::activity::{self, ActivityView, NewActivity};
use crate::services::board::adjust_card_count;
use crate::services::comment::{self, CommentView};
use crate::services::notification::{insert_notification, NotificationService};

pub const CARD_COLUMNS: &str = "id, board_id, list_id, title, description, priority, due_date, \
     label_id, creator_id, created_at, updated_at";

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: Uuid,
    pub board_id: Uuid,
    pub list_id: Uuid,
    pub title: String,
    pub description: String,
    pub priority: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub label_id: Option<Uuid>,
    pub creator_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Attachment {
    pub id: Uuid,
    #[serde(skip)]
    pub card_id: Uuid,
    pub name: String,
    pub url: String,
    pub kind: String,
}

/// A card with its members and attachments
#[derive(Debug, Clone, Serialize)]
pub struct CardView {
    #[serde(flatten)]
    pub card: Card,
    pub members: Vec<UserSummary>,
    pub attachments: Vec<Attachment>,
}

/// Full card page: the card plus creator, comments and activity
#[derive(Debug, Serialize)]
pub struct CardDetail {
    #[serde(flatten)]
    pub card: CardView,
    pub creator: UserSummary,
    pub comments: Vec<CommentView>,
    pub activities: Vec<ActivityView>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCardInput {
    pub title: Option<String>,
    pub list_id: Option<Uuid>,
    pub board_id: Option<Uuid>,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub id_members: Option<Vec<Uuid>>,
    pub priority: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AttachmentInput {
    pub name: String,
    pub url: String,
    pub kind: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCardInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub id_members: Option<Vec<Uuid>>,
    pub priority: Option<String>,
    pub label_id: Option<Uuid>,
    pub attachments: Option<Vec<AttachmentInput>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveCardInput {
    pub list_id: Uuid,
}

/// Load cards with their members and attachments, preserving order
pub async fn with_members(db: &PgPool, cards: Vec<Card>) -> AppResult<Vec<CardView>> {
    let ids: Vec<Uuid> = cards.iter().map(|c| c.id).collect();
    let mut members = access::card_members(db, &ids).await?;

    let attachment_rows = sqlx::query_as::<_, Attachment>(
        "SELECT id, card_id, name, url, kind FROM card_attachments WHERE card_id = ANY($1) ORDER BY created_at",
    )
    .bind(&ids)
    .fetch_all(db)
    .await?;
    let mut attachments: HashMap<Uuid, Vec<Attachment>> = HashMap::new();
    for attachment in attachment_rows {
        attachments.entry(attachment.card_id).or_default().push(attachment);
    }

    Ok(cards
        .into_iter()
        .map(|card| CardView {
            members: members.remove(&card.id).unwrap_or_default(),
            attachments: attachments.remove(&card.id).unwrap_or_default(),
            card,
        })
        .collect())
}

async fn replace_members(
    tx: &mut Transaction<'_, Postgres>,
    card_id: Uuid,
    members: &[Uuid],
) -> AppResult<()> {
    sqlx::query("DELETE FROM card_members WHERE card_id = $1")
        .bind(card_id)
        .execute(&mut **tx)
        .await?;
    sqlx::query(
        "INSERT INTO card_members (card_id, user_id) SELECT $1, UNNEST($2::uuid[]) ON CONFLICT DO NOTHING",
    )
    .bind(card_id)
    .bind(members)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

#[derive(Clone)]
pub struct CardService {
    db: PgPool,
    hub: RealtimeHub,
    notifications: NotificationService,
}

impl CardService {
    pub fn new(db: PgPool, hub: RealtimeHub) -> Self {
        Self {
            notifications: NotificationService::new(db.clone(), hub.clone()),
            db,
            hub,
        }
    }

    async fn get_card(&self, card_id: Uuid) -> AppResult<Card> {
        let query = format!("SELECT {} FROM cards WHERE id = $1", CARD_COLUMNS);
        sqlx::query_as::<_, Card>(&query)
            .bind(card_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Card".to_string()))
    }

    async fn get_view(&self, card_id: Uuid) -> AppResult<CardView> {
        let card = self.get_card(card_id).await?;
        with_members(&self.db, vec![card])
            .await?
            .pop()
            .ok_or_else(|| AppError::NotFound("Card".to_string()))
    }

    async fn list_on_board(&self, list_id: Uuid, board_id: Uuid) -> AppResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM lists WHERE id = $1 AND board_id = $2)",
        )
        .bind(list_id)
        .bind(board_id)
        .fetch_one(&self.db)
        .await?;
        Ok(exists)
    }

    /// Card members must already belong to the board
    async fn check_card_members(&self, board_id: Uuid, requested: &[Uuid]) -> AppResult<()> {
        let board_members = sqlx::query_scalar::<_, Uuid>(
            "SELECT user_id FROM board_members WHERE board_id = $1",
        )
        .bind(board_id)
        .fetch_all(&self.db)
        .await?;

        if outside_board(&board_members, requested).is_empty() {
            Ok(())
        } else {
            Err(AppError::validation(
                "idMembers",
                "Card members must be members of this board",
            ))
        }
    }

    async fn publish_all(&self, ids: Vec<Uuid>) -> AppResult<()> {
        for id in ids {
            self.notifications.publish(id).await?;
        }
        Ok(())
    }

    pub async fn add(&self, user_id: Uuid, input: AddCardInput) -> AppResult<CardView> {
        let title = required("title", input.title)?;
        check("title", validate_title(&title))?;
        let (Some(list_id), Some(board_id)) = (input.list_id, input.board_id) else {
            return Err(AppError::BadRequest(
                "title, listId and boardId are required".to_string(),
            ));
        };

        let board = board_access(&self.db, board_id, user_id).await?;
        board.require_owner(user_id, "Only board owner can add cards")?;
        if !self.list_on_board(list_id, board_id).await? {
            return Err(AppError::NotFound("List".to_string()));
        }
        if let Some(members) = input.id_members.as_deref() {
            self.check_card_members(board_id, members).await?;
        }

        let mut tx = self.db.begin().await?;

        let query = format!(
            r#"
            INSERT INTO cards (board_id, list_id, title, description, priority, due_date, creator_id)
            VALUES ($1, $2, $3, COALESCE($4, ''), $5, $6, $7)
            RETURNING {}
            "#,
            CARD_COLUMNS
        );
        let card = sqlx::query_as::<_, Card>(&query)
            .bind(board_id)
            .bind(list_id)
            .bind(&title)
            .bind(input.description)
            .bind(input.priority)
            .bind(input.due_date)
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await?;

        if let Some(members) = input.id_members.as_deref() {
            replace_members(&mut tx, card.id, members).await?;
        }

        adjust_card_count(&mut *tx, board_id, CardCountChange::CardAdded).await?;

        activity::record(
            &mut *tx,
            &NewActivity {
                list_id: Some(list_id),
                ..NewActivity::new(card.id, board_id, user_id, ActivityAction::CreateCard)
            },
        )
        .await?;

        tx.commit().await?;

        let view = self.get_view(card.id).await?;
        self.hub.emit(Room::Board(board_id), events::CARD_CREATE, &view);

        tracing::debug!("Card {} created on board {}", card.id, board_id);
        Ok(view)
    }

    pub async fn update(&self, user_id: Uuid, card_id: Uuid, input: UpdateCardInput) -> AppResult<CardView> {
        let board = card_board_access(&self.db, card_id, user_id).await?;
        board.require_owner(user_id, "Only board owner can update cards")?;

        if let Some(title) = &input.title {
            check("title", validate_title(title))?;
        }
        if let Some(members) = input.id_members.as_deref() {
            self.check_card_members(board.id, members).await?;
        }

        let mut tx = self.db.begin().await?;

        sqlx::query(
            r#"
            UPDATE cards SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                due_date = COALESCE($4, due_date),
                priority = COALESCE($5, priority),
                label_id = COALESCE($6, label_id),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(card_id)
        .bind(input.title.map(|t| t.trim().to_string()))
        .bind(input.description)
        .bind(input.due_date)
        .bind(input.priority)
        .bind(input.label_id)
        .execute(&mut *tx)
        .await?;

        let mut created = Vec::new();
        if let Some(members) = input.id_members {
            let before = sqlx::query_scalar::<_, Uuid>("SELECT user_id FROM card_members WHERE card_id = $1")
                .bind(card_id)
                .fetch_all(&mut *tx)
                .await?;
            let changes = diff_members(&before, &members);
            replace_members(&mut tx, card_id, &members).await?;

            let added = changes.added.into_iter().map(|id| (id, true));
            let removed = changes.removed.into_iter().map(|id| (id, false));
            for (member, was_added) in added.chain(removed).filter(|(id, _)| *id != user_id) {
                let (action, event) = if was_added {
                    (ActivityAction::AddMemberToCard, CardEvent::AddMember { user_id: member })
                } else {
                    (ActivityAction::RemoveMemberFromCard, CardEvent::RemoveMember { user_id: member })
                };

                activity::record(
                    &mut *tx,
                    &NewActivity {
                        subject_user_id: Some(member),
                        ..NewActivity::new(card_id, board.id, user_id, action)
                    },
                )
                .await?;

                let notification = NewNotification::new(
                    member,
                    user_id,
                    NotificationPayload::Card {
                        card_id,
                        board_id: board.id,
                        event,
                    },
                );
                if let Some(id) = insert_notification(&mut *tx, &notification).await? {
                    created.push(id);
                }
            }
        }

        if let Some(attachments) = input.attachments {
            sqlx::query("DELETE FROM card_attachments WHERE card_id = $1")
                .bind(card_id)
                .execute(&mut *tx)
                .await?;
            for attachment in attachments {
                sqlx::query("INSERT INTO card_attachments (card_id, name, url, kind) VALUES ($1, $2, $3, $4)")
                    .bind(card_id)
                    .bind(attachment.name)
                    .bind(attachment.url)
                    .bind(attachment.kind.unwrap_or_else(|| "image".to_string()))
                    .execute(&mut *tx)
                    .await?;
            }
        }

        tx.commit().await?;
        self.publish_all(created).await?;

        let view = self.get_view(card_id).await?;
        self.hub.emit(Room::Board(board.id), events::CARD_UPDATED, &view);
        Ok(view)
    }

    /// Move a card to another list on the same board
    pub async fn move_card(&self, user_id: Uuid, card_id: Uuid, input: MoveCardInput) -> AppResult<CardView> {
        let board = card_board_access(&self.db, card_id, user_id).await?;
        board.require_member()?;

        let card = self.get_card(card_id).await?;
        if !self.list_on_board(input.list_id, board.id).await? {
            return Err(AppError::BadRequest(
                "Target list does not belong to this board".to_string(),
            ));
        }
        let from_list_id = card.list_id;
        let to_list_id = input.list_id;

        let mut tx = self.db.begin().await?;

        sqlx::query("UPDATE cards SET list_id = $2, updated_at = NOW() WHERE id = $1")
            .bind(card_id)
            .bind(to_list_id)
            .execute(&mut *tx)
            .await?;

        activity::record(
            &mut *tx,
            &NewActivity {
                from_list_id: Some(from_list_id),
                to_list_id: Some(to_list_id),
                ..NewActivity::new(card_id, board.id, user_id, ActivityAction::Moved)
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
                    event: CardEvent::Moved {
                        from_list_id,
                        to_list_id,
                    },
                },
            );
            if let Some(id) = insert_notification(&mut *tx, &notification).await? {
                created.push(id);
            }
        }

        tx.commit().await?;

        self.hub.emit(
            Room::Board(board.id),
            events::CARD_MOVED,
            &json!({
                "cardId": card_id,
                "fromListId": from_list_id,
                "toListId": to_list_id,
            }),
        );
        self.publish_all(created).await?;

        self.get_view(card_id).await
    }

    pub async fn delete(&self, user_id: Uuid, card_id: Uuid) -> AppResult<Uuid> {
        let board = card_board_access(&self.db, card_id, user_id).await?;
        board.require_owner(user_id, "Only board owner can delete cards")?;
        let card = self.get_card(card_id).await?;

        let mut tx = self.db.begin().await?;
        sqlx::query("DELETE FROM cards WHERE id = $1")
            .bind(card_id)
            .execute(&mut *tx)
            .await?;
        adjust_card_count(&mut *tx, board.id, CardCountChange::CardDeleted).await?;
        tx.commit().await?;

        self.hub.emit(
            Room::Board(board.id),
            events::CARD_REMOVED,
            &json!({ "cardId": card_id, "listId": card.list_id }),
        );
        Ok(card_id)
    }

    pub async fn cards_for_board(&self, user_id: Uuid, board_id: Uuid) -> AppResult<Vec<CardView>> {
        board_access(&self.db, board_id, user_id)
            .await?
            .require_member()?;

        let query = format!(
            "SELECT {} FROM cards WHERE board_id = $1 ORDER BY created_at",
            CARD_COLUMNS
        );
        let cards = sqlx::query_as::<_, Card>(&query)
            .bind(board_id)
            .fetch_all(&self.db)
            .await?;
        with_members(&self.db, cards).await
    }

    pub async fn detail(&self, user_id: Uuid, card_id: Uuid) -> AppResult<CardDetail> {
        card_board_access(&self.db, card_id, user_id)
            .await?
            .require_member()?;

        let card = self.get_view(card_id).await?;
        let creator = sqlx::query_as::<_, (Uuid, String, String)>(
            "SELECT id, full_name, initials FROM users WHERE id = $1",
        )
        .bind(card.card.creator_id)
        .fetch_one(&self.db)
        .await
        .map(|(id, full_name, initials)| UserSummary {
            id,
            full_name,
            initials,
        })?;

        let comments = comment::for_card(&self.db, card_id).await?;
        let activities = activity::for_card(&self.db, card_id).await?;

        Ok(CardDetail {
            card,
            creator,
            comments,
            activities,
        })
    }
}
