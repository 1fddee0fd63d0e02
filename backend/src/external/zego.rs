//! Video-room token issuing
//!
//! Tokens are HS256 JWTs signed with the video provider's server secret.

use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use shared::models::VideoTokenClaims;
use uuid::Uuid;

use crate::config::ZegoConfig;
use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct ZegoTokenIssuer {
    app_id: u32,
    server_secret: String,
    ttl_secs: i64,
}

impl ZegoTokenIssuer {
    pub fn new(config: &ZegoConfig) -> Self {
        Self {
            app_id: config.app_id,
            server_secret: config.server_secret.clone(),
            ttl_secs: config.token_ttl,
        }
    }

    /// Issue a token letting `user_id` into `room_id`
    pub fn issue(&self, user_id: Uuid, room_id: &str) -> AppResult<String> {
        if self.server_secret.is_empty() {
            return Err(AppError::ExternalService(
                "Video service is not configured".to_string(),
            ));
        }

        let claims = VideoTokenClaims::new(
            self.app_id,
            user_id,
            room_id,
            Utc::now().timestamp(),
            self.ttl_secs,
        );

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.server_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Failed to sign video token: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, DecodingKey, Validation};

    #[test]
    fn test_issued_token_decodes() {
        let issuer = ZegoTokenIssuer {
            app_id: 7,
            server_secret: "secret".into(),
            ttl_secs: 3600,
        };
        let user = Uuid::new_v4();
        let token = issuer.issue(user, "meeting-0011").unwrap();

        let mut validation = Validation::default();
        validation.required_spec_claims.clear();
        let data = decode::<VideoTokenClaims>(
            &token,
            &DecodingKey::from_secret(b"secret"),
            &validation,
        )
        .unwrap();
        assert_eq!(data.claims.app_id, 7);
        assert_eq!(data.claims.user_id, user.to_string());
        assert_eq!(data.claims.room_id, "meeting-0011");
    }

    #[test]
    fn test_unconfigured_issuer_fails() {
        let issuer = ZegoTokenIssuer {
            app_id: 0,
            server_secret: String::new(),
            ttl_secs: 3600,
        };
        assert!(issuer.issue(Uuid::new_v4(), "room").is_err());
    }
}
