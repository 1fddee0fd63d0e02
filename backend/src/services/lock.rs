//! Lock panel: a short PIN guarding the UI of an already signed-in user

use bcrypt::{hash, verify, DEFAULT_COST};
use serde::Deserialize;
use shared::validation::validate_lock_pin;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::access::{check, required};

#[derive(Debug, Deserialize)]
pub struct PinInput {
    pub pin: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePinInput {
    pub current_pin: Option<String>,
    pub new_pin: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisablePinInput {
    pub current_pin: Option<String>,
}

#[derive(sqlx::FromRow)]
struct LockRow {
    lock_pin_hash: Option<String>,
    lock_pin_enabled: bool,
}

#[derive(Clone)]
pub struct LockService {
    db: PgPool,
}

impl LockService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn load(&self, user_id: Uuid) -> AppResult<LockRow> {
        sqlx::query_as::<_, LockRow>("SELECT lock_pin_hash, lock_pin_enabled FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("User".to_string()))
    }

    /// The stored hash, provided the lock is enabled
    async fn enabled_hash(&self, user_id: Uuid) -> AppResult<String> {
        let row = self.load(user_id).await?;
        match row.lock_pin_hash {
            Some(hash) if row.lock_pin_enabled => Ok(hash),
            _ => Err(AppError::BadRequest("Lock PIN not set".to_string())),
        }
    }

    async fn store(&self, user_id: Uuid, pin_hash: Option<String>) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET lock_pin_hash = $2, lock_pin_enabled = $2 IS NOT NULL, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(pin_hash)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    pub async fn status(&self, user_id: Uuid) -> AppResult<bool> {
        Ok(self.load(user_id).await?.lock_pin_enabled)
    }

    pub async fn set(&self, user_id: Uuid, input: PinInput) -> AppResult<()> {
        let pin = required("pin", input.pin)?;
        check("pin", validate_lock_pin(&pin))?;

        if self.load(user_id).await?.lock_pin_enabled {
            return Err(AppError::BadRequest(
                "Lock PIN already set. Use change PIN endpoint.".to_string(),
            ));
        }

        self.store(user_id, Some(hash(&pin, DEFAULT_COST)?)).await?;
        tracing::info!("Lock PIN enabled for user {}", user_id);
        Ok(())
    }

    pub async fn change(&self, user_id: Uuid, input: ChangePinInput) -> AppResult<()> {
        let current_pin = required("currentPin", input.current_pin)?;
        let new_pin = required("newPin", input.new_pin)?;

        let stored = self.enabled_hash(user_id).await?;
        if !verify(&current_pin, &stored)? {
            return Err(AppError::Unauthorized("Current PIN is incorrect".to_string()));
        }
        check("newPin", validate_lock_pin(&new_pin))?;

        self.store(user_id, Some(hash(&new_pin, DEFAULT_COST)?)).await
    }

    pub async fn verify(&self, user_id: Uuid, input: PinInput) -> AppResult<()> {
        let pin = required("pin", input.pin)?;
        let stored = self.enabled_hash(user_id).await?;

        if verify(&pin, &stored)? {
            Ok(())
        } else {
            Err(AppError::Unauthorized("Incorrect PIN".to_string()))
        }
    }

    pub async fn disable(&self, user_id: Uuid, input: DisablePinInput) -> AppResult<()> {
        let current_pin = required("currentPin", input.current_pin)?;
        let stored = self.enabled_hash(user_id).await?;

        if !verify(&current_pin, &stored)? {
            return Err(AppError::Unauthorized("Current PIN is incorrect".to_string()));
        }

        self.store(user_id, None).await?;
        tracing::info!("Lock PIN disabled for user {}", user_id);
        Ok(())
    }
}
