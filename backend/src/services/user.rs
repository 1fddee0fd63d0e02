//! User profile service

use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::identifiers::derive_initials;
use shared::validation::{validate_full_name, validate_password};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::access::check;

/// Columns of `users` that are safe to return
pub const PROFILE_COLUMNS: &str = "id, full_name, email, initials, user_name, avatar_url, phone, \
     role, is_active, last_active, lock_pin_enabled, created_at, updated_at";

/// Public view of a user account; never carries hashes
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub initials: String,
    pub user_name: String,
    pub avatar_url: Option<String>,
    pub phone: Option<String>,
    pub role: String,
    pub is_active: bool,
    pub last_active: Option<DateTime<Utc>>,
    pub lock_pin_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileInput {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordInput {
    pub old_password: Option<String>,
    pub new_password: Option<String>,
}

#[derive(Clone)]
pub struct UserService {
    db: PgPool,
}

impl UserService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Load the caller's profile, marking them active
    pub async fn get_profile(&self, user_id: Uuid) -> AppResult<UserProfile> {
        let query = format!(
            "UPDATE users SET is_active = TRUE, last_active = NOW() WHERE id = $1 RETURNING {}",
            PROFILE_COLUMNS
        );
        sqlx::query_as::<_, UserProfile>(&query)
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("User".to_string()))
    }

    pub async fn update_profile(&self, user_id: Uuid, input: UpdateProfileInput) -> AppResult<UserProfile> {
        let full_name = match input.full_name {
            Some(name) => {
                check("fullName", validate_full_name(&name))?;
                Some(name.trim().to_string())
            }
            None => None,
        };
        let initials = full_name.as_deref().map(derive_initials);

        let query = format!(
            r#"
            UPDATE users SET
                full_name = COALESCE($2, full_name),
                initials = COALESCE($3, initials),
                phone = COALESCE($4, phone),
                avatar_url = COALESCE($5, avatar_url),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            PROFILE_COLUMNS
        );

        sqlx::query_as::<_, UserProfile>(&query)
            .bind(user_id)
            .bind(full_name)
            .bind(initials)
            .bind(input.phone)
            .bind(input.avatar_url)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("User".to_string()))
    }

    pub async fn change_password(&self, user_id: Uuid, input: ChangePasswordInput) -> AppResult<()> {
        let (Some(old_password), Some(new_password)) = (input.old_password, input.new_password) else {
            return Err(AppError::BadRequest(
                "Old password and new password are required".to_string(),
            ));
        };

        let current_hash = sqlx::query_scalar::<_, String>("SELECT password_hash FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        if !verify(&old_password, &current_hash)? {
            return Err(AppError::BadRequest("Old password is incorrect".to_string()));
        }
        if old_password == new_password {
            return Err(AppError::BadRequest(
                "New password cannot be the same as old password".to_string(),
            ));
        }
        check("newPassword", validate_password(&new_password))?;

        let new_hash = hash(&new_password, DEFAULT_COST)?;
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .bind(new_hash)
            .execute(&self.db)
            .await?;

        tracing::info!("Password changed for user {}", user_id);
        Ok(())
    }
}
