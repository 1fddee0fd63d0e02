//! Board membership: shareable invite tokens, email invitations and join requests

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::identifiers::{board_invite_token, split_invite_token};
use shared::models::{
    join_request_availability, JoinDecision, JoinRequestStatus, NewNotification,
    NotificationPayload,
};
use shared::realtime::{events, Room};
use shared::validation::validate_email;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::external::{mailer, Mailer};
use crate::realtime::RealtimeHub;
use crate::services::access::{board_access, check, required};
use crate::services::board::{Board, BOARD_COLUMNS};
use crate::services::notification::{insert_notification, NotificationService};

#[derive(Debug, Deserialize)]
pub struct TokenInput {
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct InviteMemberInput {
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestJoinInput {
    pub board_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct RespondInput {
    pub action: JoinDecision,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteToken {
    pub invite_token: String,
    pub created: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerRef {
    pub id: Uuid,
    pub full_name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteTokenCheck {
    pub valid: bool,
    pub board_id: Uuid,
    pub owner: OwnerRef,
    pub board_title: String,
    pub invite_token: String,
    pub is_member: bool,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BoardInvitation {
    pub id: Uuid,
    pub board_id: Uuid,
    pub email: String,
    pub invited_by: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct SentInvitation {
    pub invitation: BoardInvitation,
    pub html: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Requester {
    pub id: Uuid,
    pub full_name: String,
    pub initials: String,
    pub status: String,
}

/// Payload pushed to the board when someone asks to join
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequestView {
    pub id: Uuid,
    pub board_id: Uuid,
    pub board_title: String,
    pub request_by: Requester,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequestResponse {
    pub request_id: Uuid,
    pub status: String,
    pub request_by: Uuid,
}

#[derive(FromRow)]
struct TokenBoardRow {
    id: Uuid,
    title: String,
    invite_token: String,
    invite_token_revoked_at: Option<DateTime<Utc>>,
    owner_id: Uuid,
    owner_name: String,
}

#[derive(FromRow)]
struct PendingRequestRow {
    id: Uuid,
    board_id: Uuid,
    request_by: Uuid,
    status: String,
    owner_id: Uuid,
}

#[derive(Clone)]
pub struct InviteService {
    db: PgPool,
    hub: RealtimeHub,
    notifications: NotificationService,
    frontend_url: String,
}

impl InviteService {
    pub fn new(db: PgPool, hub: RealtimeHub, frontend_url: &str) -> Self {
        Self {
            notifications: NotificationService::new(db.clone(), hub.clone()),
            db,
            hub,
            frontend_url: frontend_url.trim_end_matches('/').to_string(),
        }
    }

    // ========================================================================
    // Shareable invite tokens
    // ========================================================================

    /// Return the live invite token, minting one if needed
    pub async fn generate_token(&self, user_id: Uuid, board_id: Uuid) -> AppResult<InviteToken> {
        let board = board_access(&self.db, board_id, user_id).await?;
        board.require_owner(user_id, "Only board owner can generate invite token")?;

        let (existing, revoked_at) = sqlx::query_as::<_, (Option<String>, Option<DateTime<Utc>>)>(
            "SELECT invite_token, invite_token_revoked_at FROM boards WHERE id = $1",
        )
        .bind(board_id)
        .fetch_one(&self.db)
        .await?;

        if let (Some(token), None) = (existing, revoked_at) {
            return Ok(InviteToken {
                invite_token: token,
                created: false,
            });
        }

        let token = board_invite_token(&rand::random::<[u8; 8]>(), &board.title);
        sqlx::query(
            "UPDATE boards SET invite_token = $2, invite_token_revoked_at = NULL, updated_at = NOW() WHERE id = $1",
        )
        .bind(board_id)
        .bind(&token)
        .execute(&self.db)
        .await?;

        tracing::info!("Invite token generated for board {}", board_id);
        Ok(InviteToken {
            invite_token: token,
            created: true,
        })
    }

    pub async fn revoke_token(&self, user_id: Uuid, board_id: Uuid) -> AppResult<()> {
        board_access(&self.db, board_id, user_id)
            .await?
            .require_owner(user_id, "Only board owner can delete invite token")?;

        sqlx::query(
            "UPDATE boards SET invite_token = NULL, invite_token_revoked_at = NOW(), updated_at = NOW() WHERE id = $1",
        )
        .bind(board_id)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn board_for_token(&self, token: Option<String>) -> AppResult<TokenBoardRow> {
        let token = required("token", token)?;
        if split_invite_token(&token).is_none() {
            return Err(AppError::BadRequest("Invalid or expired invite token".to_string()));
        }
        let row = sqlx::query_as::<_, TokenBoardRow>(
            r#"
            SELECT b.id, b.title, b.invite_token, b.invite_token_revoked_at,
                   u.id AS owner_id, u.full_name AS owner_name
            FROM boards b
            JOIN users u ON u.id = b.owner_id
            WHERE b.invite_token = $1
            "#,
        )
        .bind(&token)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::BadRequest("Invalid or expired invite token".to_string()))?;

        if row.invite_token_revoked_at.is_some() {
            return Err(AppError::BadRequest(
                "This invite token has been revoked".to_string(),
            ));
        }
        Ok(row)
    }

    async fn is_board_member(&self, board_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM board_members WHERE board_id = $1 AND user_id = $2)",
        )
        .bind(board_id)
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;
        Ok(exists)
    }

    pub async fn verify_token(&self, user_id: Uuid, input: TokenInput) -> AppResult<InviteTokenCheck> {
        let row = self.board_for_token(input.token).await?;
        let is_member = self.is_board_member(row.id, user_id).await?;

        Ok(InviteTokenCheck {
            valid: true,
            board_id: row.id,
            owner: OwnerRef {
                id: row.owner_id,
                full_name: row.owner_name,
            },
            board_title: row.title,
            invite_token: row.invite_token,
            is_member,
        })
    }

    pub async fn join_with_token(&self, user_id: Uuid, input: TokenInput) -> AppResult<Board> {
        let row = self.board_for_token(input.token).await?;
        if self.is_board_member(row.id, user_id).await? {
            return Err(AppError::BadRequest(
                "Already a member of this board".to_string(),
            ));
        }

        let mut tx = self.db.begin().await?;

        sqlx::query("INSERT INTO board_members (board_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
            .bind(row.id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let notification = NewNotification::new(
            row.owner_id,
            user_id,
            NotificationPayload::JoinWithLink {
                board_id: row.id,
                user_id,
            },
        );
        let created = insert_notification(&mut *tx, &notification).await?;

        let query = format!("SELECT {} FROM boards WHERE id = $1", BOARD_COLUMNS);
        let board = sqlx::query_as::<_, Board>(&query)
            .bind(row.id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        if let Some(id) = created {
            self.notifications.publish(id).await?;
        }

        tracing::info!("User {} joined board {} via invite link", user_id, row.id);
        Ok(board)
    }

    // ========================================================================
    // Email invitations
    // ========================================================================

    pub async fn invite_member(
        &self,
        mailer: &Mailer,
        inviter: Uuid,
        inviter_name: &str,
        board_id: Uuid,
        input: InviteMemberInput,
    ) -> AppResult<SentInvitation> {
        let email = required("email", input.email)?.to_lowercase();
        check("email", validate_email(&email))?;

        let board = board_access(&self.db, board_id, inviter).await?;
        board.require_owner(inviter, "Only board owner can invite members")?;

        let already_member = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM board_members m
                JOIN users u ON u.id = m.user_id
                WHERE m.board_id = $1 AND u.email = $2
            )
            "#,
        )
        .bind(board_id)
        .bind(&email)
        .fetch_one(&self.db)
        .await?;
        if already_member {
            return Err(AppError::BadRequest("User already a member".to_string()));
        }

        let already_invited = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM board_invitations WHERE board_id = $1 AND email = $2 AND status = 'pending')",
        )
        .bind(board_id)
        .bind(&email)
        .fetch_one(&self.db)
        .await?;
        if already_invited {
            return Err(AppError::BadRequest("User already invited".to_string()));
        }

        let invitation = sqlx::query_as::<_, BoardInvitation>(
            r#"
            INSERT INTO board_invitations (board_id, email, invited_by)
            VALUES ($1, $2, $3)
            RETURNING id, board_id, email, invited_by, status, created_at
            "#,
        )
        .bind(board_id)
        .bind(&email)
        .bind(inviter)
        .fetch_one(&self.db)
        .await?;

        let accept_url = format!("{}/invites?boardId={}", self.frontend_url, board_id);
        let html = mailer::board_invite_mail(inviter_name, &board.title, &accept_url);
        mailer
            .send_html(
                &email,
                &format!("You're invited to join {}", board.title),
                html.clone(),
            )
            .await?;

        Ok(SentInvitation { invitation, html })
    }

    pub async fn accept_invite(&self, user_id: Uuid, email: &str, board_id: Uuid) -> AppResult<Board> {
        let mut tx = self.db.begin().await?;

        let (invitation_id, invited_by) = sqlx::query_as::<_, (Uuid, Uuid)>(
            r#"
            SELECT id, invited_by FROM board_invitations
            WHERE board_id = $1 AND email = $2 AND status = 'pending'
            ORDER BY created_at DESC
            LIMIT 1
            FOR UPDATE
            "#,
        )
        .bind(board_id)
        .bind(email.to_lowercase())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::Missing("No valid invitation found".to_string()))?;

        sqlx::query("INSERT INTO board_members (board_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
            .bind(board_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE board_invitations SET status = 'accepted' WHERE id = $1")
            .bind(invitation_id)
            .execute(&mut *tx)
            .await?;

        let notification = NewNotification::new(
            invited_by,
            user_id,
            NotificationPayload::AddedToBoard {
                board_id,
                member_added: user_id,
            },
        );
        let created = insert_notification(&mut *tx, &notification).await?;

        let query = format!("SELECT {} FROM boards WHERE id = $1", BOARD_COLUMNS);
        let board = sqlx::query_as::<_, Board>(&query)
            .bind(board_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        if let Some(id) = created {
            self.notifications.publish(id).await?;
        }
        Ok(board)
    }

    // ========================================================================
    // Join requests
    // ========================================================================

    pub async fn request_join(&self, user_id: Uuid, input: RequestJoinInput) -> AppResult<JoinRequestView> {
        let board_id = input
            .board_id
            .ok_or_else(|| AppError::validation("boardId", "boardId is required"))?;

        let board = board_access(&self.db, board_id, user_id).await?;
        if board.is_member {
            return Err(AppError::BadRequest("Already a member".to_string()));
        }

        let pending = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM join_requests WHERE board_id = $1 AND request_by = $2 AND status = 'pending')",
        )
        .bind(board_id)
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;
        if pending {
            return Err(AppError::BadRequest(
                "You already have a pending join request for this board".to_string(),
            ));
        }

        let mut tx = self.db.begin().await?;

        let (id, status, created_at) = sqlx::query_as::<_, (Uuid, String, DateTime<Utc>)>(
            "INSERT INTO join_requests (board_id, request_by) VALUES ($1, $2) RETURNING id, status, created_at",
        )
        .bind(board_id)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        let (full_name, initials) = sqlx::query_as::<_, (String, String)>(
            "SELECT full_name, initials FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        let notification = NewNotification::new(
            board.owner_id,
            user_id,
            NotificationPayload::Request {
                board_id,
                request_by: user_id,
            },
        );
        let created = insert_notification(&mut *tx, &notification).await?;

        tx.commit().await?;

        let view = JoinRequestView {
            id,
            board_id,
            board_title: board.title,
            request_by: Requester {
                id: user_id,
                full_name,
                initials,
                status,
            },
            created_at,
        };

        self.hub
            .emit(Room::Board(board_id), events::join_request(board_id), &view);
        self.hub
            .emit(Room::BoardOwner(board_id), events::JOIN_REQUEST, &view);
        if let Some(id) = created {
            self.notifications.publish(id).await?;
        }

        tracing::info!("User {} requested to join board {}", user_id, board_id);
        Ok(view)
    }

    /// Whether the caller may file a join request for a board
    pub async fn request_status(&self, user_id: Uuid, board_id: Uuid) -> AppResult<&'static str> {
        let board = board_access(&self.db, board_id, user_id).await?;
        if board.is_closed {
            return Err(AppError::Missing("This board is closed".to_string()));
        }

        let latest = sqlx::query_scalar::<_, String>(
            r#"
            SELECT status FROM join_requests
            WHERE board_id = $1 AND request_by = $2
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(board_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;

        let latest = latest
            .map(|s| s.parse::<JoinRequestStatus>())
            .transpose()
            .map_err(|e| AppError::Internal(e.to_string()))?;
        Ok(join_request_availability(latest))
    }

    /// Accept or reject a pending join request
    pub async fn respond(
        &self,
        user_id: Uuid,
        request_id: Uuid,
        input: RespondInput,
    ) -> AppResult<JoinRequestResponse> {
        let mut tx = self.db.begin().await?;

        let request = sqlx::query_as::<_, PendingRequestRow>(
            r#"
            SELECT r.id, r.board_id, r.request_by, r.status, b.owner_id
            FROM join_requests r
            JOIN boards b ON b.id = r.board_id
            WHERE r.id = $1
            FOR UPDATE OF r
            "#,
        )
        .bind(request_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Join request".to_string()))?;

        if request.owner_id != user_id {
            return Err(AppError::Forbidden(
                "Only board owner can respond to join requests".to_string(),
            ));
        }
        if request.status != JoinRequestStatus::Pending.as_str() {
            return Err(AppError::BadRequest("Join request is not pending".to_string()));
        }

        let status = input.action.resulting_status();
        sqlx::query("UPDATE join_requests SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(request.id)
            .bind(status.as_str())
            .execute(&mut *tx)
            .await?;

        let mut created = None;
        if input.action == JoinDecision::Accept {
            sqlx::query("INSERT INTO board_members (board_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
                .bind(request.board_id)
                .bind(request.request_by)
                .execute(&mut *tx)
                .await?;

            let notification = NewNotification::new(
                request.request_by,
                user_id,
                NotificationPayload::AddedToBoard {
                    board_id: request.board_id,
                    member_added: request.request_by,
                },
            );
            created = insert_notification(&mut *tx, &notification).await?;
        }

        tx.commit().await?;

        let response = JoinRequestResponse {
            request_id: request.id,
            status: status.as_str().to_string(),
            request_by: request.request_by,
        };
        self.hub.emit(
            Room::Board(request.board_id),
            events::join_request_response(request.board_id),
            &response,
        );
        if let Some(id) = created {
            self.notifications.publish(id).await?;
        }

        tracing::info!(
            "Join request {} {} by {}",
            request.id,
            input.action.past_tense(),
            user_id
        );
        Ok(response)
    }
}
