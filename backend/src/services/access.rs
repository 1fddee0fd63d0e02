//! Board and workspace membership lookups shared by the services

use shared::types::UserSummary;
use sqlx::PgExecutor;
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// A board as seen by one user
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BoardAccess {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub workspace_id: Option<Uuid>,
    pub title: String,
    pub is_closed: bool,
    pub is_member: bool,
}

impl BoardAccess {
    pub fn is_owner(&self, user_id: Uuid) -> bool {
        self.owner_id == user_id
    }

    pub fn require_member(&self) -> AppResult<()> {
        if self.is_member {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "You are not a member of this board".to_string(),
            ))
        }
    }

    pub fn require_owner(&self, user_id: Uuid, message: &str) -> AppResult<()> {
        if self.is_owner(user_id) {
            Ok(())
        } else {
            Err(AppError::Forbidden(message.to_string()))
        }
    }
}

/// Load a board together with the caller's membership
pub async fn board_access<'e, E>(db: E, board_id: Uuid, user_id: Uuid) -> AppResult<BoardAccess>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, BoardAccess>(
        r#"
        SELECT b.id, b.owner_id, b.workspace_id, b.title, b.is_closed,
               EXISTS (
                   SELECT 1 FROM board_members m
                   WHERE m.board_id = b.id AND m.user_id = $2
               ) AS is_member
        FROM boards b
        WHERE b.id = $1
        "#,
    )
    .bind(board_id)
    .bind(user_id)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| AppError::NotFound("Board".to_string()))
}

/// Load the board owning a card, with the caller's membership
pub async fn card_board_access<'e, E>(db: E, card_id: Uuid, user_id: Uuid) -> AppResult<BoardAccess>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, BoardAccess>(
        r#"
        SELECT b.id, b.owner_id, b.workspace_id, b.title, b.is_closed,
               EXISTS (
                   SELECT 1 FROM board_members m
                   WHERE m.board_id = b.id AND m.user_id = $2
               ) AS is_member
        FROM cards c
        JOIN boards b ON b.id = c.board_id
        WHERE c.id = $1
        "#,
    )
    .bind(card_id)
    .bind(user_id)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| AppError::NotFound("Card".to_string()))
}

pub async fn is_workspace_member<'e, E>(db: E, workspace_id: Uuid, user_id: Uuid) -> AppResult<bool>
where
    E: PgExecutor<'e>,
{
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM workspace_members WHERE workspace_id = $1 AND user_id = $2)",
    )
    .bind(workspace_id)
    .bind(user_id)
    .fetch_one(db)
    .await?;
    Ok(exists)
}

/// Ids of every board member except `except`
pub async fn board_member_ids<'e, E>(db: E, board_id: Uuid, except: Uuid) -> AppResult<Vec<Uuid>>
where
    E: PgExecutor<'e>,
{
    let ids = sqlx::query_scalar::<_, Uuid>(
        "SELECT user_id FROM board_members WHERE board_id = $1 AND user_id <> $2",
    )
    .bind(board_id)
    .bind(except)
    .fetch_all(db)
    .await?;
    Ok(ids)
}

/// A user attached to some parent row (board, card, comment)
#[derive(Debug, sqlx::FromRow)]
pub struct AttachedUser {
    pub parent_id: Uuid,
    pub id: Uuid,
    pub full_name: String,
    pub initials: String,
}

/// Group attached users by parent, keeping row order
pub fn group_users(rows: Vec<AttachedUser>) -> HashMap<Uuid, Vec<UserSummary>> {
    let mut grouped: HashMap<Uuid, Vec<UserSummary>> = HashMap::new();
    for row in rows {
        grouped.entry(row.parent_id).or_default().push(UserSummary {
            id: row.id,
            full_name: row.full_name,
            initials: row.initials,
        });
    }
    grouped
}

/// Members of each card in `card_ids`
pub async fn card_members<'e, E>(db: E, card_ids: &[Uuid]) -> AppResult<HashMap<Uuid, Vec<UserSummary>>>
where
    E: PgExecutor<'e>,
{
    let rows = sqlx::query_as::<_, AttachedUser>(
        r#"
        SELECT cm.card_id AS parent_id, u.id, u.full_name, u.initials
        FROM card_members cm
        JOIN users u ON u.id = cm.user_id
        WHERE cm.card_id = ANY($1)
        ORDER BY u.full_name
        "#,
    )
    .bind(card_ids)
    .fetch_all(db)
    .await?;
    Ok(group_users(rows))
}

/// Reject a missing or blank required string
pub fn required(field: &str, value: Option<String>) -> AppResult<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::validation(field, format!("{} is required", field)))
}

/// Map a shared-crate validation failure onto a field error
pub fn check(field: &str, result: Result<(), &'static str>) -> AppResult<()> {
    result.map_err(|message| AppError::validation(field, message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::validation::validate_lock_pin;

    #[test]
    fn test_required_trims_and_names_field() {
        assert_eq!(required("pin", Some(" 1234 ".into())).unwrap(), "1234");

        for missing in [None, Some(String::new()), Some("   ".into())] {
            let err = required("currentPin", missing).unwrap_err();
            assert!(matches!(
                err,
                AppError::Validation { ref field, ref message }
                    if field == "currentPin" && message == "currentPin is required"
            ));
        }
    }

    #[test]
    fn test_check_maps_field_message() {
        let err = check("newPin", validate_lock_pin("12a4")).unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "newPin"));
        assert!(check("pin", validate_lock_pin("1234")).is_ok());
    }
}
