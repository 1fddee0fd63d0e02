//! Workspace service
//!
//! A workspace groups boards and members. Invitation links carry a usage
//! limit; joining through one bumps `used` in the same transaction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::identifiers::{split_invite_token, workspace_invite_token};
use shared::models::{can_leave_workspace, invitation_has_capacity, LeaveCheck, DEFAULT_INVITATION_LIMIT};
use shared::realtime::{events, Room};
use shared::types::UserSummary;
use shared::validation::validate_title;
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::realtime::RealtimeHub;
use crate::services::access::{check, is_workspace_member, required};
use crate::services::board::{prefixed_board_columns, purge_boards, BoardListItem};

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceDetail {
    #[serde(flatten)]
    pub workspace: Workspace,
    pub boards: Vec<BoardListItem>,
    pub private_boards: i64,
    pub members: Vec<UserSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BoardBrief {
    pub id: Uuid,
    pub title: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceMember {
    pub id: Uuid,
    pub full_name: String,
    pub initials: String,
    pub email: String,
    pub is_owner: bool,
    pub boards: Vec<BoardBrief>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceInvitation {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub email: Option<String>,
    pub token: String,
    #[serde(rename = "limit")]
    pub usage_limit: i32,
    pub used: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitationPreview {
    pub workspace_id: Uuid,
    pub workspace_title: String,
    pub token: String,
    pub owner_name: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateWorkspaceInput {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateWorkspaceInput {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveMemberInput {
    pub member_id: Option<Uuid>,
}

#[derive(FromRow)]
struct MemberRow {
    id: Uuid,
    full_name: String,
    initials: String,
    email: String,
}

#[derive(FromRow)]
struct InvitationRow {
    id: Uuid,
    workspace_id: Uuid,
    workspace_title: String,
    token: String,
    usage_limit: i32,
    used: i32,
    owner_name: String,
}

#[derive(Clone)]
pub struct WorkspaceService {
    db: PgPool,
    hub: RealtimeHub,
}

impl WorkspaceService {
    pub fn new(db: PgPool, hub: RealtimeHub) -> Self {
        Self { db, hub }
    }

    async fn get(&self, workspace_id: Uuid) -> AppResult<Workspace> {
        sqlx::query_as::<_, Workspace>("SELECT * FROM workspaces WHERE id = $1")
            .bind(workspace_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Workspace".to_string()))
    }

    async fn get_owned(&self, user_id: Uuid, workspace_id: Uuid) -> AppResult<Workspace> {
        let workspace = self.get(workspace_id).await?;
        if workspace.owner_id != user_id {
            return Err(AppError::Forbidden(
                "Only the workspace owner can perform this action".to_string(),
            ));
        }
        Ok(workspace)
    }

    async fn get_as_member(&self, user_id: Uuid, workspace_id: Uuid) -> AppResult<Workspace> {
        let workspace = self.get(workspace_id).await?;
        if !is_workspace_member(&self.db, workspace_id, user_id).await? {
            return Err(AppError::Forbidden(
                "You are not a member of this workspace".to_string(),
            ));
        }
        Ok(workspace)
    }

    pub async fn create(&self, owner_id: Uuid, input: CreateWorkspaceInput) -> AppResult<Workspace> {
        let title = required("title", input.title)?;
        check("title", validate_title(&title))?;

        let mut tx = self.db.begin().await?;
        let workspace = sqlx::query_as::<_, Workspace>(
            "INSERT INTO workspaces (owner_id, title, description) VALUES ($1, $2, COALESCE($3, '')) RETURNING *",
        )
        .bind(owner_id)
        .bind(&title)
        .bind(input.description)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO workspace_members (workspace_id, user_id) VALUES ($1, $2)")
            .bind(workspace.id)
            .bind(owner_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!("Workspace {} created by {}", workspace.id, owner_id);
        Ok(workspace)
    }

    pub async fn update(&self, user_id: Uuid, workspace_id: Uuid, input: UpdateWorkspaceInput) -> AppResult<Workspace> {
        self.get_owned(user_id, workspace_id).await?;
        if let Some(title) = &input.title {
            check("title", validate_title(title))?;
        }

        let workspace = sqlx::query_as::<_, Workspace>(
            r#"
            UPDATE workspaces SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(workspace_id)
        .bind(input.title.map(|t| t.trim().to_string()))
        .bind(input.description)
        .fetch_one(&self.db)
        .await?;

        self.hub.emit(
            Room::Workspace(workspace_id),
            events::workspace_updated(workspace_id),
            &workspace,
        );
        Ok(workspace)
    }

    /// Workspace page: the caller's boards, a count of the rest, and the members
    pub async fn detail(&self, user_id: Uuid, workspace_id: Uuid) -> AppResult<WorkspaceDetail> {
        let workspace = self.get_as_member(user_id, workspace_id).await?;

        let query = format!(
            r#"
            SELECT {}, (b.owner_id = $2) AS is_owned
            FROM boards b
            JOIN board_members m ON m.board_id = b.id AND m.user_id = $2
            WHERE b.workspace_id = $1
            ORDER BY b.created_at
            "#,
            prefixed_board_columns("b")
        );
        let boards = sqlx::query_as::<_, BoardListItem>(&query)
            .bind(workspace_id)
            .bind(user_id)
            .fetch_all(&self.db)
            .await?;

        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM boards WHERE workspace_id = $1")
            .bind(workspace_id)
            .fetch_one(&self.db)
            .await?;

        let members = self
            .member_rows(workspace_id)
            .await?
            .into_iter()
            .map(|m| UserSummary {
                id: m.id,
                full_name: m.full_name,
                initials: m.initials,
            })
            .collect();

        Ok(WorkspaceDetail {
            private_boards: total - boards.len() as i64,
            workspace,
            boards,
            members,
        })
    }

    async fn member_rows(&self, workspace_id: Uuid) -> AppResult<Vec<MemberRow>> {
        let rows = sqlx::query_as::<_, MemberRow>(
            r#"
            SELECT u.id, u.full_name, u.initials, u.email
            FROM workspace_members wm
            JOIN users u ON u.id = wm.user_id
            WHERE wm.workspace_id = $1
            ORDER BY wm.joined_at
            "#,
        )
        .bind(workspace_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    pub async fn members(&self, user_id: Uuid, workspace_id: Uuid) -> AppResult<Vec<WorkspaceMember>> {
        let workspace = self.get_as_member(user_id, workspace_id).await?;

        let memberships = sqlx::query_as::<_, (Uuid, Uuid, String)>(
            r#"
            SELECT m.user_id, b.id, b.title
            FROM board_members m
            JOIN boards b ON b.id = m.board_id
            WHERE b.workspace_id = $1
            ORDER BY b.created_at
            "#,
        )
        .bind(workspace_id)
        .fetch_all(&self.db)
        .await?;

        let mut boards: HashMap<Uuid, Vec<BoardBrief>> = HashMap::new();
        for (member, id, title) in memberships {
            boards.entry(member).or_default().push(BoardBrief { id, title });
        }

        Ok(self
            .member_rows(workspace_id)
            .await?
            .into_iter()
            .map(|m| WorkspaceMember {
                is_owner: m.id == workspace.owner_id,
                boards: boards.remove(&m.id).unwrap_or_default(),
                id: m.id,
                full_name: m.full_name,
                initials: m.initials,
                email: m.email,
            })
            .collect())
    }

    pub async fn delete(&self, user_id: Uuid, workspace_id: Uuid) -> AppResult<Uuid> {
        self.get_owned(user_id, workspace_id).await?;

        let mut tx = self.db.begin().await?;

        let board_ids = sqlx::query_scalar::<_, Uuid>("SELECT id FROM boards WHERE workspace_id = $1")
            .bind(workspace_id)
            .fetch_all(&mut *tx)
            .await?;
        purge_boards(&mut tx, &board_ids).await?;

        sqlx::query("DELETE FROM workspace_members WHERE workspace_id = $1")
            .bind(workspace_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM workspace_invitations WHERE workspace_id = $1")
            .bind(workspace_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM workspaces WHERE id = $1")
            .bind(workspace_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            "Workspace {} deleted with {} board(s)",
            workspace_id,
            board_ids.len()
        );
        Ok(workspace_id)
    }

    pub async fn leave(&self, user_id: Uuid, workspace_id: Uuid) -> AppResult<()> {
        let workspace = self.get(workspace_id).await?;
        let is_member = is_workspace_member(&self.db, workspace_id, user_id).await?;

        match can_leave_workspace(workspace.owner_id == user_id, is_member) {
            LeaveCheck::OwnerCannotLeave => Err(AppError::BadRequest(
                "Workspace owner cannot leave the workspace. Transfer ownership or delete the workspace."
                    .to_string(),
            )),
            LeaveCheck::NotMember => Err(AppError::Forbidden(
                "You are not a member of this workspace".to_string(),
            )),
            LeaveCheck::Allowed => self.detach_member(workspace_id, user_id).await,
        }
    }

    pub async fn remove_member(&self, user_id: Uuid, workspace_id: Uuid, input: RemoveMemberInput) -> AppResult<Uuid> {
        let workspace = self.get_owned(user_id, workspace_id).await?;
        let member_id = input
            .member_id
            .ok_or_else(|| AppError::validation("memberId", "memberId is required"))?;

        if member_id == workspace.owner_id {
            return Err(AppError::BadRequest(
                "Workspace owner cannot be removed".to_string(),
            ));
        }
        if !is_workspace_member(&self.db, workspace_id, member_id).await? {
            return Err(AppError::NotFound("Member".to_string()));
        }

        self.detach_member(workspace_id, member_id).await?;
        Ok(member_id)
    }

    /// Drop a user from the workspace, its boards and their cards
    async fn detach_member(&self, workspace_id: Uuid, member_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        sqlx::query(
            r#"
            DELETE FROM card_members
            WHERE user_id = $2
              AND card_id IN (
                  SELECT c.id FROM cards c
                  JOIN boards b ON b.id = c.board_id
                  WHERE b.workspace_id = $1
              )
            "#,
        )
        .bind(workspace_id)
        .bind(member_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            DELETE FROM board_members
            WHERE user_id = $2
              AND board_id IN (SELECT id FROM boards WHERE workspace_id = $1 AND owner_id <> $2)
            "#,
        )
        .bind(workspace_id)
        .bind(member_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM workspace_members WHERE workspace_id = $1 AND user_id = $2")
            .bind(workspace_id)
            .bind(member_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::info!("User {} left workspace {}", member_id, workspace_id);
        Ok(())
    }

    // ========================================================================
    // Invitation links
    // ========================================================================

    /// Reuse an invitation with remaining capacity, or mint a new one
    pub async fn create_invitation(&self, user_id: Uuid, workspace_id: Uuid) -> AppResult<WorkspaceInvitation> {
        self.get_owned(user_id, workspace_id).await?;

        let existing = sqlx::query_as::<_, WorkspaceInvitation>(
            r#"
            SELECT * FROM workspace_invitations
            WHERE workspace_id = $1 AND used < usage_limit
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(workspace_id)
        .fetch_optional(&self.db)
        .await?;
        if let Some(invitation) = existing {
            return Ok(invitation);
        }

        let token = workspace_invite_token(&rand::random::<[u8; 8]>(), &workspace_id);
        let invitation = sqlx::query_as::<_, WorkspaceInvitation>(
            "INSERT INTO workspace_invitations (workspace_id, token, usage_limit) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(workspace_id)
        .bind(token)
        .bind(DEFAULT_INVITATION_LIMIT)
        .fetch_one(&self.db)
        .await?;

        Ok(invitation)
    }

    pub async fn current_invitation(&self, user_id: Uuid, workspace_id: Uuid) -> AppResult<Option<String>> {
        self.get_owned(user_id, workspace_id).await?;

        let token = sqlx::query_scalar::<_, String>(
            r#"
            SELECT token FROM workspace_invitations
            WHERE workspace_id = $1 AND used < usage_limit
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(workspace_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(token)
    }

    pub async fn delete_invitations(&self, user_id: Uuid, workspace_id: Uuid) -> AppResult<u64> {
        self.get_owned(user_id, workspace_id).await?;

        let deleted = sqlx::query("DELETE FROM workspace_invitations WHERE workspace_id = $1")
            .bind(workspace_id)
            .execute(&self.db)
            .await?
            .rows_affected();
        Ok(deleted)
    }

    async fn usable_invitation<'e, E>(&self, db: E, user_id: Uuid, workspace_id: Uuid, token: &str) -> AppResult<InvitationRow>
    where
        E: sqlx::PgExecutor<'e>,
    {
        // Workspace tokens end with the id of the workspace they open
        let workspace_slug = workspace_id.to_string();
        if split_invite_token(token).map(|(_, slug)| slug) != Some(workspace_slug.as_str()) {
            return Err(AppError::Missing("Invalid invitation token".to_string()));
        }

        let row = sqlx::query_as::<_, InvitationRow>(
            r#"
            SELECT i.id, i.workspace_id, w.title AS workspace_title, i.token,
                   i.usage_limit, i.used, u.full_name AS owner_name
            FROM workspace_invitations i
            JOIN workspaces w ON w.id = i.workspace_id
            JOIN users u ON u.id = w.owner_id
            WHERE i.token = $1 AND i.workspace_id = $2
            "#,
        )
        .bind(token)
        .bind(workspace_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::Missing("Invalid invitation token".to_string()))?;

        if is_workspace_member(&self.db, workspace_id, user_id).await? {
            return Err(AppError::BadRequest("Already Member".to_string()));
        }
        if !invitation_has_capacity(row.used, row.usage_limit) {
            return Err(AppError::BadRequest(
                "This invitation link has reached its usage limit".to_string(),
            ));
        }
        Ok(row)
    }

    pub async fn preview_invitation(&self, user_id: Uuid, workspace_id: Uuid, token: &str) -> AppResult<InvitationPreview> {
        let row = self
            .usable_invitation(&self.db, user_id, workspace_id, token)
            .await?;
        Ok(InvitationPreview {
            workspace_id: row.workspace_id,
            workspace_title: row.workspace_title,
            token: row.token,
            owner_name: row.owner_name,
        })
    }

    pub async fn accept_invitation(&self, user_id: Uuid, workspace_id: Uuid, token: &str) -> AppResult<Workspace> {
        let mut tx = self.db.begin().await?;

        let row = self
            .usable_invitation(&mut *tx, user_id, workspace_id, token)
            .await?;

        sqlx::query("INSERT INTO workspace_members (workspace_id, user_id) VALUES ($1, $2)")
            .bind(workspace_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let bumped = sqlx::query(
            "UPDATE workspace_invitations SET used = used + 1 WHERE id = $1 AND used < usage_limit",
        )
        .bind(row.id)
        .execute(&mut *tx)
        .await?;
        if bumped.rows_affected() == 0 {
            return Err(AppError::BadRequest(
                "This invitation link has reached its usage limit".to_string(),
            ));
        }

        let workspace = sqlx::query_as::<_, Workspace>("SELECT * FROM workspaces WHERE id = $1")
            .bind(workspace_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!("User {} joined workspace {} by invitation", user_id, workspace_id);
        Ok(workspace)
    }
}
