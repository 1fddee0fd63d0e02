//! Board and list service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use shared::models::{
    BoardAction, CardCountChange, NewNotification, NotificationPayload, DEFAULT_BOARD_BACKGROUND,
};
use shared::realtime::{events, Room};
use shared::types::UserSummary;
use shared::validation::{validate_background, validate_title};
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::realtime::RealtimeHub;
use crate::services::access::{board_access, board_member_ids, check, is_workspace_member, required};
use crate::services::card::{self, Card, CardView, CARD_COLUMNS};
use crate::services::notification::{insert_notification, NotificationService};

pub const BOARD_COLUMNS: &str = "id, title, description, background, workspace_id, owner_id, \
     card_count, invite_token, invite_token_revoked_at, is_closed, created_at, updated_at";

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub background: String,
    pub workspace_id: Option<Uuid>,
    pub owner_id: Uuid,
    pub card_count: i32,
    pub invite_token: Option<String>,
    pub invite_token_revoked_at: Option<DateTime<Utc>>,
    pub is_closed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A board in a listing, flagged with whether the caller owns it
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BoardListItem {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub board: Board,
    pub is_owned: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserBoards {
    pub owned_boards: Vec<BoardListItem>,
    pub member_boards: Vec<BoardListItem>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct BoardLabel {
    pub id: Uuid,
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct List {
    pub id: Uuid,
    pub board_id: Uuid,
    pub title: String,
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ListWithCards {
    #[serde(flatten)]
    pub list: List,
    pub cards: Vec<CardView>,
}

/// A pending join request with the requester resolved
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingJoinRequest {
    pub id: Uuid,
    pub status: String,
    pub request_by: UserSummary,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardDetail {
    #[serde(flatten)]
    pub board: Board,
    pub members: Vec<UserSummary>,
    pub labels: Vec<BoardLabel>,
    pub lists: Vec<ListWithCards>,
    pub join_requests: Vec<PendingJoinRequest>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBoardInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub background: Option<String>,
    pub workspace_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateBoardInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub background: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddListInput {
    pub title: Option<String>,
    pub board_id: Option<Uuid>,
    pub order: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateListInput {
    pub title: Option<String>,
    pub order: Option<i32>,
}

#[derive(FromRow)]
struct JoinRequestRow {
    id: Uuid,
    status: String,
    created_at: DateTime<Utc>,
    user_id: Uuid,
    full_name: String,
    initials: String,
}

#[derive(Clone)]
pub struct BoardService {
    db: PgPool,
    hub: RealtimeHub,
    notifications: NotificationService,
}

impl BoardService {
    pub fn new(db: PgPool, hub: RealtimeHub) -> Self {
        Self {
            notifications: NotificationService::new(db.clone(), hub.clone()),
            db,
            hub,
        }
    }

    pub async fn get_board(&self, board_id: Uuid) -> AppResult<Board> {
        let query = format!("SELECT {} FROM boards WHERE id = $1", BOARD_COLUMNS);
        sqlx::query_as::<_, Board>(&query)
            .bind(board_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Board".to_string()))
    }

    pub async fn create(&self, owner_id: Uuid, input: CreateBoardInput) -> AppResult<Board> {
        let title = required("title", input.title)?;
        check("title", validate_title(&title))?;
        let background = input
            .background
            .unwrap_or_else(|| DEFAULT_BOARD_BACKGROUND.to_string());
        check("background", validate_background(&background))?;

        if let Some(workspace_id) = input.workspace_id {
            if !is_workspace_member(&self.db, workspace_id, owner_id).await? {
                return Err(AppError::Forbidden(
                    "You are not a member of this workspace".to_string(),
                ));
            }
        }

        let mut tx = self.db.begin().await?;

        let query = format!(
            r#"
            INSERT INTO boards (title, description, background, workspace_id, owner_id)
            VALUES ($1, COALESCE($2, ''), $3, $4, $5)
            RETURNING {}
            "#,
            BOARD_COLUMNS
        );
        let board = sqlx::query_as::<_, Board>(&query)
            .bind(&title)
            .bind(input.description)
            .bind(background)
            .bind(input.workspace_id)
            .bind(owner_id)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query("INSERT INTO board_members (board_id, user_id) VALUES ($1, $2)")
            .bind(board.id)
            .bind(owner_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!("Board {} created by {}", board.id, owner_id);
        Ok(board)
    }

    /// Boards the user owns and boards they only belong to
    pub async fn all_for_user(&self, user_id: Uuid) -> AppResult<UserBoards> {
        let query = format!(
            r#"
            SELECT {}, (b.owner_id = $1) AS is_owned
            FROM boards b
            JOIN board_members m ON m.board_id = b.id AND m.user_id = $1
            ORDER BY b.updated_at DESC
            "#,
            prefixed_board_columns("b")
        );
        let boards = sqlx::query_as::<_, BoardListItem>(&query)
            .bind(user_id)
            .fetch_all(&self.db)
            .await?;

        let (owned_boards, member_boards) = boards.into_iter().partition(|b| b.is_owned);
        Ok(UserBoards {
            owned_boards,
            member_boards,
        })
    }

    pub async fn update(&self, user_id: Uuid, board_id: Uuid, input: UpdateBoardInput) -> AppResult<Board> {
        board_access(&self.db, board_id, user_id)
            .await?
            .require_owner(user_id, "Only board owner can update the board")?;

        if let Some(title) = &input.title {
            check("title", validate_title(title))?;
        }
        if let Some(background) = &input.background {
            check("background", validate_background(background))?;
        }

        let query = format!(
            r#"
            UPDATE boards SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                background = COALESCE($4, background),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            BOARD_COLUMNS
        );
        sqlx::query_as::<_, Board>(&query)
            .bind(board_id)
            .bind(input.title.map(|t| t.trim().to_string()))
            .bind(input.description)
            .bind(input.background)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Board".to_string()))
    }

    /// Close or reopen a board, telling every other member
    pub async fn set_closed(&self, user_id: Uuid, board_id: Uuid, closed: bool) -> AppResult<Board> {
        let (action, message) = if closed {
            (BoardAction::CloseBoard, "Only board owner can close the board")
        } else {
            (BoardAction::ReopenBoard, "Only board owner can reopen the board")
        };
        board_access(&self.db, board_id, user_id)
            .await?
            .require_owner(user_id, message)?;

        let mut tx = self.db.begin().await?;

        let query = format!(
            "UPDATE boards SET is_closed = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            BOARD_COLUMNS
        );
        let board = sqlx::query_as::<_, Board>(&query)
            .bind(board_id)
            .bind(closed)
            .fetch_one(&mut *tx)
            .await?;

        let mut created = Vec::new();
        for member in board_member_ids(&mut *tx, board_id, user_id).await? {
            let notification = NewNotification::new(
                member,
                user_id,
                NotificationPayload::Board { board_id, action },
            );
            if let Some(id) = insert_notification(&mut *tx, &notification).await? {
                created.push(id);
            }
        }

        tx.commit().await?;

        let event = if closed {
            events::board_closed(board_id)
        } else {
            events::board_reopened(board_id)
        };
        self.hub.emit(Room::Board(board_id), event, &board);
        for id in created {
            self.notifications.publish(id).await?;
        }

        tracing::info!("Board {} {}", board_id, action.as_str());
        Ok(board)
    }

    pub async fn detail(&self, user_id: Uuid, board_id: Uuid) -> AppResult<BoardDetail> {
        board_access(&self.db, board_id, user_id)
            .await?
            .require_member()?;

        let board = self.get_board(board_id).await?;

        let members = sqlx::query_as::<_, (Uuid, String, String)>(
            r#"
            SELECT u.id, u.full_name, u.initials
            FROM board_members m
            JOIN users u ON u.id = m.user_id
            WHERE m.board_id = $1
            ORDER BY m.joined_at
            "#,
        )
        .bind(board_id)
        .fetch_all(&self.db)
        .await?
        .into_iter()
        .map(|(id, full_name, initials)| UserSummary {
            id,
            full_name,
            initials,
        })
        .collect();

        let labels = sqlx::query_as::<_, BoardLabel>(
            "SELECT id, name, color FROM board_labels WHERE board_id = $1 ORDER BY name",
        )
        .bind(board_id)
        .fetch_all(&self.db)
        .await?;

        let lists = sqlx::query_as::<_, List>(
            "SELECT * FROM lists WHERE board_id = $1 ORDER BY position, created_at",
        )
        .bind(board_id)
        .fetch_all(&self.db)
        .await?;

        let query = format!(
            "SELECT {} FROM cards WHERE board_id = $1 ORDER BY created_at",
            CARD_COLUMNS
        );
        let cards = sqlx::query_as::<_, Card>(&query)
            .bind(board_id)
            .fetch_all(&self.db)
            .await?;
        let mut by_list: HashMap<Uuid, Vec<CardView>> = HashMap::new();
        for view in card::with_members(&self.db, cards).await? {
            by_list.entry(view.card.list_id).or_default().push(view);
        }

        let lists = lists
            .into_iter()
            .map(|list| ListWithCards {
                cards: by_list.remove(&list.id).unwrap_or_default(),
                list,
            })
            .collect();

        let join_requests = sqlx::query_as::<_, JoinRequestRow>(
            r#"
            SELECT r.id, r.status, r.created_at, u.id AS user_id, u.full_name, u.initials
            FROM join_requests r
            JOIN users u ON u.id = r.request_by
            WHERE r.board_id = $1 AND r.status = 'pending'
            ORDER BY r.created_at DESC
            "#,
        )
        .bind(board_id)
        .fetch_all(&self.db)
        .await?
        .into_iter()
        .map(|row| PendingJoinRequest {
            id: row.id,
            status: row.status,
            created_at: row.created_at,
            request_by: UserSummary {
                id: row.user_id,
                full_name: row.full_name,
                initials: row.initials,
            },
        })
        .collect();

        Ok(BoardDetail {
            board,
            members,
            labels,
            lists,
            join_requests,
        })
    }

    /// Delete a board and everything hanging off it
    pub async fn delete(&self, user_id: Uuid, board_id: Uuid) -> AppResult<Uuid> {
        let owned = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM boards WHERE id = $1 AND owner_id = $2)",
        )
        .bind(board_id)
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;
        if !owned {
            return Err(AppError::Missing(
                "Board not found or not authorized".to_string(),
            ));
        }

        let mut tx = self.db.begin().await?;
        purge_boards(&mut tx, &[board_id]).await?;
        tx.commit().await?;

        tracing::info!("Board {} deleted by {}", board_id, user_id);
        Ok(board_id)
    }

    // ========================================================================
    // Lists
    // ========================================================================

    pub async fn add_list(&self, user_id: Uuid, input: AddListInput) -> AppResult<List> {
        let title = required("title", input.title)?;
        check("title", validate_title(&title))?;
        let board_id = input
            .board_id
            .ok_or_else(|| AppError::validation("boardId", "boardId is required"))?;

        let board = board_access(&self.db, board_id, user_id).await?;
        board.require_owner(user_id, "Only board owner can add lists")?;

        let list = sqlx::query_as::<_, List>(
            "INSERT INTO lists (board_id, title, position) VALUES ($1, $2, COALESCE($3, 0)) RETURNING *",
        )
        .bind(board_id)
        .bind(&title)
        .bind(input.order)
        .fetch_one(&self.db)
        .await?;

        if let Some(workspace_id) = board.workspace_id {
            self.hub
                .emit(Room::Workspace(workspace_id), events::list_create(board_id), &list);
        }
        Ok(list)
    }

    pub async fn update_list(&self, user_id: Uuid, list_id: Uuid, input: UpdateListInput) -> AppResult<List> {
        let board_id = self.list_board(list_id).await?;
        let board = board_access(&self.db, board_id, user_id).await?;
        board.require_owner(user_id, "Only board owner can update lists")?;

        if let Some(title) = &input.title {
            check("title", validate_title(title))?;
        }

        let list = sqlx::query_as::<_, List>(
            r#"
            UPDATE lists SET
                title = COALESCE($2, title),
                position = COALESCE($3, position),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(list_id)
        .bind(input.title.map(|t| t.trim().to_string()))
        .bind(input.order)
        .fetch_one(&self.db)
        .await?;

        if let Some(workspace_id) = board.workspace_id {
            self.hub
                .emit(Room::Workspace(workspace_id), events::list_update(board_id), &list);
        }
        Ok(list)
    }

    /// Delete a list with its cards, keeping the board's card count in step
    pub async fn delete_list(&self, user_id: Uuid, list_id: Uuid) -> AppResult<u64> {
        let board_id = self.list_board(list_id).await?;
        let board = board_access(&self.db, board_id, user_id).await?;
        board.require_owner(user_id, "Only board owner can delete lists")?;

        let mut tx = self.db.begin().await?;

        let removed = sqlx::query("DELETE FROM cards WHERE list_id = $1")
            .bind(list_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query("DELETE FROM lists WHERE id = $1")
            .bind(list_id)
            .execute(&mut *tx)
            .await?;

        adjust_card_count(&mut *tx, board_id, CardCountChange::ListDeleted { cards: removed }).await?;

        tx.commit().await?;

        if let Some(workspace_id) = board.workspace_id {
            self.hub.emit(
                Room::Workspace(workspace_id),
                events::list_remove(board_id),
                &json!({ "listId": list_id, "cardCounts": removed }),
            );
        }
        Ok(removed)
    }

    async fn list_board(&self, list_id: Uuid) -> AppResult<Uuid> {
        sqlx::query_scalar::<_, Uuid>("SELECT board_id FROM lists WHERE id = $1")
            .bind(list_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("List".to_string()))
    }
}

/// Apply a card or list mutation to the board's `card_count`
pub async fn adjust_card_count<'e, E>(db: E, board_id: Uuid, change: CardCountChange) -> AppResult<()>
where
    E: sqlx::PgExecutor<'e>,
{
    if change.delta() == 0 {
        return Ok(());
    }
    sqlx::query(
        "UPDATE boards SET card_count = GREATEST(card_count + $2, 0), updated_at = NOW() WHERE id = $1",
    )
    .bind(board_id)
    .bind(change.delta())
    .execute(db)
    .await?;
    Ok(())
}

/// Board columns qualified with a table alias
pub fn prefixed_board_columns(alias: &str) -> String {
    BOARD_COLUMNS
        .split(',')
        .map(|col| format!("{}.{}", alias, col.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Rows removed with a board, children before parents
const BOARD_PURGE: &[&str] = &[
    "DELETE FROM notifications WHERE board_id = ANY($1)",
    "DELETE FROM activities WHERE board_id = ANY($1)",
    "DELETE FROM comments WHERE card_id IN (SELECT id FROM cards WHERE board_id = ANY($1))",
    "DELETE FROM card_attachments WHERE card_id IN (SELECT id FROM cards WHERE board_id = ANY($1))",
    "DELETE FROM cards WHERE board_id = ANY($1)",
    "DELETE FROM lists WHERE board_id = ANY($1)",
    "DELETE FROM board_labels WHERE board_id = ANY($1)",
    "DELETE FROM join_requests WHERE board_id = ANY($1)",
    "DELETE FROM board_invitations WHERE board_id = ANY($1)",
    "DELETE FROM board_members WHERE board_id = ANY($1)",
    "DELETE FROM boards WHERE id = ANY($1)",
];

/// Remove boards and every row that references them
pub async fn purge_boards(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    board_ids: &[Uuid],
) -> AppResult<()> {
    for statement in BOARD_PURGE {
        sqlx::query(statement)
            .bind(board_ids)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixed_board_columns() {
        let cols = prefixed_board_columns("b");
        assert!(cols.starts_with("b.id, b.title"));
        assert!(cols.ends_with("b.updated_at"));
        assert!(!cols.contains("  "));
    }

    const SCHEMA: &str = include_str!("../../migrations/0001_initial.sql");

    /// (table, foreign key line) for every reference in the schema
    fn foreign_keys() -> Vec<(String, String)> {
        let mut table = String::new();
        let mut keys = Vec::new();
        for line in SCHEMA.lines() {
            let line = line.trim();
            if let Some(rest) = line.strip_prefix("CREATE TABLE ") {
                table = rest.trim_end_matches('(').trim().to_string();
            } else if line.contains("REFERENCES ") {
                keys.push((table.clone(), line.to_string()));
            }
        }
        keys
    }

    #[test]
    fn test_board_children_never_orphaned() {
        let keys = foreign_keys();
        assert!(!keys.is_empty());
        for parent in ["workspaces(id)", "boards(id)", "lists(id)", "cards(id)", "comments(id)"] {
            for (table, key) in keys.iter().filter(|(_, key)| key.contains(parent)) {
                assert!(
                    key.contains("ON DELETE CASCADE") || key.contains("ON DELETE SET NULL"),
                    "{} keeps a dangling reference: {}",
                    table,
                    key
                );
            }
        }
    }

    #[test]
    fn test_purge_covers_every_board_table() {
        for (table, _) in foreign_keys().iter().filter(|(_, key)| key.contains("boards(id)")) {
            let prefix = format!("DELETE FROM {} ", table);
            assert!(
                BOARD_PURGE.iter().any(|s| s.starts_with(&prefix)),
                "{} is not purged with its board",
                table
            );
        }
    }

    #[test]
    fn test_purge_deletes_children_first() {
        let position = |table: &str| {
            let prefix = format!("DELETE FROM {} ", table);
            BOARD_PURGE.iter().position(|s| s.starts_with(&prefix))
        };
        let boards = position("boards").unwrap();
        assert_eq!(boards, BOARD_PURGE.len() - 1);
        assert!(position("comments").unwrap() < position("cards").unwrap());
        assert!(position("cards").unwrap() < position("lists").unwrap());
        assert!(position("board_members").unwrap() < boards);
    }
}
