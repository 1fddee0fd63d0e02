//! Authentication service for signup, login and password recovery

use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use serde::{Deserialize, Serialize};
use shared::identifiers::{derive_initials, numbered_candidate, username_base};
use shared::models::{otp_accepts, otp_expiry};
use shared::validation::{validate_email, validate_full_name, validate_otp_code, validate_password};
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::external::{mailer, Mailer};
use crate::services::access::check;
use crate::services::user::{UserProfile, PROFILE_COLUMNS};

const RESET_PURPOSE: &str = "password_reset";

/// Signup rules, in the order they are reported: a taken email first, then the fields
fn check_signup(email_taken: bool, email: &str, input: &SignupInput) -> AppResult<()> {
    if email_taken {
        return Err(AppError::BadRequest("User already exists".to_string()));
    }
    check("email", validate_email(email))?;
    check("password", validate_password(&input.password))?;
    check("fullName", validate_full_name(&input.full_name))
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db: PgPool,
    jwt_secret: String,
    reset_token_expiry: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupInput {
    pub full_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpInput {
    pub email: Option<String>,
    pub otp: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordInput {
    pub reset_token: String,
    pub password: String,
}

/// Claims of a password-reset token
#[derive(Debug, Serialize, Deserialize)]
pub struct ResetClaims {
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
    pub purpose: String,
}

/// A successful login: the profile and the fresh single-session id
#[derive(Debug)]
pub struct LoginOutcome {
    pub user: UserProfile,
    pub session_id: String,
}

#[derive(sqlx::FromRow)]
struct CredentialsRow {
    id: Uuid,
    password_hash: String,
}

#[derive(sqlx::FromRow)]
struct OtpRow {
    user_id: Uuid,
    code: i32,
    expires_at: chrono::DateTime<Utc>,
}

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(db: PgPool, config: &Config) -> Self {
        Self {
            db,
            jwt_secret: config.jwt.secret.clone(),
            reset_token_expiry: config.jwt.reset_token_expiry,
        }
    }

    /// Register a new account
    pub async fn signup(&self, input: SignupInput) -> AppResult<UserProfile> {
        let email = input.email.trim().to_lowercase();

        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
            .bind(&email)
            .fetch_one(&self.db)
            .await?;
        check_signup(exists, &email, &input)?;

        let full_name = input.full_name.trim().to_string();
        let initials = derive_initials(&full_name);
        let user_name = self.unique_username(&username_base(&full_name)).await?;
        let password_hash = hash(&input.password, DEFAULT_COST)?;

        let query = format!(
            r#"
            INSERT INTO users (full_name, email, password_hash, initials, user_name)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            PROFILE_COLUMNS
        );
        let user = sqlx::query_as::<_, UserProfile>(&query)
            .bind(&full_name)
            .bind(&email)
            .bind(password_hash)
            .bind(initials)
            .bind(user_name)
            .fetch_one(&self.db)
            .await?;

        tracing::info!("New account {} ({})", user.id, user.user_name);
        Ok(user)
    }

    async fn unique_username(&self, base: &str) -> AppResult<String> {
        let mut attempt = 0;
        loop {
            let candidate = numbered_candidate(base, attempt);
            let taken = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS (SELECT 1 FROM users WHERE user_name = $1)",
            )
            .bind(&candidate)
            .fetch_one(&self.db)
            .await?;
            if !taken {
                return Ok(candidate);
            }
            attempt += 1;
        }
    }

    /// Verify credentials and rotate the user's session id
    pub async fn login(&self, input: LoginInput) -> AppResult<LoginOutcome> {
        let email = input.email.trim().to_lowercase();
        let row = sqlx::query_as::<_, CredentialsRow>(
            "SELECT id, password_hash FROM users WHERE email = $1",
        )
        .bind(&email)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

        if !verify(&input.password, &row.password_hash)? {
            return Err(AppError::InvalidCredentials);
        }

        let session_id = hex::encode(rand::random::<[u8; 16]>());
        let query = format!(
            r#"
            UPDATE users SET session_id = $2, is_active = TRUE, last_active = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            PROFILE_COLUMNS
        );
        let user = sqlx::query_as::<_, UserProfile>(&query)
            .bind(row.id)
            .bind(&session_id)
            .fetch_one(&self.db)
            .await?;

        tracing::info!("User {} logged in", user.id);
        Ok(LoginOutcome { user, session_id })
    }

    /// Forget the stored session id so no cookie matches it any more
    pub async fn logout(&self, user_id: Uuid) -> AppResult<()> {
        sqlx::query("UPDATE users SET session_id = NULL, is_active = FALSE WHERE id = $1")
            .bind(user_id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    /// Issue a password-reset OTP and mail it
    pub async fn forgot_password(&self, mailer: &Mailer, email: &str) -> AppResult<()> {
        let email = email.trim().to_lowercase();
        let (user_id, full_name) = sqlx::query_as::<_, (Uuid, String)>(
            "SELECT id, full_name FROM users WHERE email = $1",
        )
        .bind(&email)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        let code: i32 = rand::thread_rng().gen_range(100_000..=999_999);

        sqlx::query(
            r#"
            INSERT INTO password_otps (user_id, code, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO UPDATE SET code = EXCLUDED.code, expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(user_id)
        .bind(code)
        .bind(otp_expiry(Utc::now()))
        .execute(&self.db)
        .await?;

        mailer
            .send_html(&email, "Your password reset code", mailer::otp_mail(&full_name, code))
            .await
    }

    /// Exchange a valid OTP for a short-lived reset token
    pub async fn verify_otp(&self, input: VerifyOtpInput) -> AppResult<String> {
        let (Some(email), Some(otp)) = (input.email, input.otp) else {
            return Err(AppError::BadRequest("Email and OTP are required".to_string()));
        };
        check("otp", validate_otp_code(otp))?;

        let row = sqlx::query_as::<_, OtpRow>(
            r#"
            SELECT o.user_id, o.code, o.expires_at
            FROM password_otps o
            JOIN users u ON u.id = o.user_id
            WHERE u.email = $1
            "#,
        )
        .bind(email.trim().to_lowercase())
        .fetch_optional(&self.db)
        .await?;

        let row = match row {
            Some(row) if otp_accepts(row.code, row.expires_at, otp, Utc::now()) => row,
            _ => return Err(AppError::BadRequest("OTP invalid or expired".to_string())),
        };

        sqlx::query("DELETE FROM password_otps WHERE user_id = $1")
            .bind(row.user_id)
            .execute(&self.db)
            .await?;

        self.reset_token(row.user_id)
    }

    fn reset_token(&self, user_id: Uuid) -> AppResult<String> {
        let now = Utc::now();
        let claims = ResetClaims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(self.reset_token_expiry)).timestamp(),
            purpose: RESET_PURPOSE.to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Failed to sign reset token: {}", e)))
    }

    /// Set a new password using a reset token
    pub async fn reset_password(&self, input: ResetPasswordInput) -> AppResult<()> {
        let claims = decode::<ResetClaims>(
            &input.reset_token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|_| AppError::Unauthorized("Invalid or expired reset token".to_string()))?
        .claims;

        if claims.purpose != RESET_PURPOSE {
            return Err(AppError::Unauthorized("Invalid reset token".to_string()));
        }
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::Unauthorized("Invalid reset token".to_string()))?;

        check("password", validate_password(&input.password))?;
        let password_hash = hash(&input.password, DEFAULT_COST)?;

        let updated = sqlx::query(
            "UPDATE users SET password_hash = $2, session_id = NULL, updated_at = NOW() WHERE id = $1",
        )
        .bind(user_id)
        .bind(password_hash)
        .execute(&self.db)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(AppError::NotFound("User".to_string()));
        }

        tracing::info!("Password reset for user {}", user_id);
        Ok(())
    }
}
