//! Authentication middleware
//!
//! Session-cookie authentication with single-session enforcement and an admin guard

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use shared::models::{check_session, SessionRejection, UserRole};
use tower_sessions::Session;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::AppState;

/// Session key holding the authenticated user's id
pub const SESSION_USER_ID_KEY: &str = "userId";

/// Session key holding the login's session id, compared against `users.session_id`
pub const SESSION_ID_KEY: &str = "sessionId";

/// Authenticated user information loaded for every protected request
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: UserRole,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

#[derive(sqlx::FromRow)]
struct SessionUserRow {
    id: Uuid,
    email: String,
    full_name: String,
    role: String,
    session_id: Option<String>,
}

/// Authentication middleware that resolves the session cookie to a user.
///
/// A session whose user vanished, or whose id no longer matches the one
/// stored on the user, is flushed and answered with `forceLogout`.
pub async fn auth_middleware(
    State(state): State<AppState>,
    session: Session,
    mut request: Request,
    next: Next,
) -> AppResult<Response> {
    let user_id = session
        .get::<Uuid>(SESSION_USER_ID_KEY)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Please log in to continue".to_string()))?;
    let presented = session.get::<String>(SESSION_ID_KEY).await?;

    let row = sqlx::query_as::<_, SessionUserRow>(
        "SELECT id, email, full_name, role, session_id FROM users WHERE id = $1",
    )
    .bind(user_id)
    .fetch_optional(&state.db)
    .await?;

    let Some(row) = row else {
        return revoke(&session, SessionRejection::UserMissing).await;
    };

    if let Err(rejection) = check_session(row.session_id.as_deref(), presented.as_deref()) {
        tracing::info!("Rejecting superseded session for user {}", row.id);
        return revoke(&session, rejection).await;
    }

    let role = row
        .role
        .parse::<UserRole>()
        .map_err(|e| AppError::Internal(e.to_string()))?;

    request.extensions_mut().insert(AuthUser {
        user_id: row.id,
        email: row.email,
        full_name: row.full_name,
        role,
    });

    Ok(next.run(request).await)
}

async fn revoke(session: &Session, rejection: SessionRejection) -> AppResult<Response> {
    session.flush().await?;
    Err(AppError::SessionRevoked(rejection.message().to_string()))
}

/// Role guard for admin routes. Must run inside `auth_middleware`.
pub async fn require_admin(
    CurrentUser(user): CurrentUser,
    request: Request,
    next: Next,
) -> AppResult<Response> {
    if !user.is_admin() {
        return Err(AppError::InsufficientPermissions);
    }
    Ok(next.run(request).await)
}

/// Extractor for authenticated user
/// Use this in handlers to get the current user
#[derive(Clone, Debug)]
pub struct CurrentUser(pub AuthUser);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
    }
}
