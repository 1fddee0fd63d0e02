//! Partner registration service

use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::models::{BusinessDetails, IndividualKyc, PartnerDetails, PartnerRegistration, PartnerStatus, UserRole};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Stored partner profile
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Partner {
    pub id: Uuid,
    pub user_id: Uuid,
    pub partner_type: String,
    pub status: String,
    pub is_verified: bool,
    pub individual_kyc: Option<Json<IndividualKyc>>,
    pub business_details: Option<Json<BusinessDetails>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct PartnerService {
    db: PgPool,
}

impl PartnerService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Register the caller as a partner and promote their role
    pub async fn register(&self, user_id: Uuid, input: PartnerRegistration) -> AppResult<Partner> {
        let partner_type = input.partner_type;
        let details = input
            .into_details()
            .map_err(|message| AppError::validation("partnerType", message))?;

        let mut tx = self.db.begin().await?;

        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM partners WHERE user_id = $1)")
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await?;
        if exists {
            return Err(AppError::BadRequest(
                "You have already registered as a partner.".to_string(),
            ));
        }

        let (individual, business) = match details {
            PartnerDetails::Individual(kyc) => (Some(Json(kyc)), None),
            PartnerDetails::Business(details) => (None, Some(Json(details))),
        };

        let partner = sqlx::query_as::<_, Partner>(
            r#"
            INSERT INTO partners (user_id, partner_type, status, individual_kyc, business_details)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(partner_type.as_str())
        .bind(PartnerStatus::Pending.as_str())
        .bind(individual)
        .bind(business)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE users SET role = $2, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .bind(UserRole::Partner.as_str())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!("User {} registered as {} partner", user_id, partner.partner_type);
        Ok(partner)
    }
}
