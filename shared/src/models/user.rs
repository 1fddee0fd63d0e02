//! User accounts, roles and one-time passwords

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Platform-wide role of a user account
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    User,
    Partner,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Partner => "partner",
            UserRole::Admin => "admin",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }
}

impl std::str::FromStr for UserRole {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(UserRole::User),
            "partner" => Ok(UserRole::Partner),
            "admin" => Ok(UserRole::Admin),
            _ => Err("Unknown user role"),
        }
    }
}

/// Lifetime of a password-reset OTP
pub const OTP_TTL_MINUTES: i64 = 10;

/// Compute when an OTP issued at `issued_at` stops being accepted
pub fn otp_expiry(issued_at: DateTime<Utc>) -> DateTime<Utc> {
    issued_at + Duration::minutes(OTP_TTL_MINUTES)
}

/// Whether a stored OTP still matches the submitted code at `now`
pub fn otp_accepts(stored_code: i32, expires_at: DateTime<Utc>, submitted: i32, now: DateTime<Utc>) -> bool {
    stored_code == submitted && expires_at > now
}

/// Why an authenticated request was rejected by the single-session check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionRejection {
    UserMissing,
    SignedInElsewhere,
}

impl SessionRejection {
    pub fn message(&self) -> &'static str {
        match self {
            SessionRejection::UserMissing => "Session invalid. User not found.",
            SessionRejection::SignedInElsewhere => {
                "You have been logged out because you logged in from another device."
            }
        }
    }
}

/// Compare the session id carried by the cookie with the one stored on the user.
///
/// A user row without a stored id accepts any session.
pub fn check_session(
    stored: Option<&str>,
    presented: Option<&str>,
) -> Result<(), SessionRejection> {
    match stored {
        Some(stored) if presented != Some(stored) => Err(SessionRejection::SignedInElsewhere),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        for role in [UserRole::User, UserRole::Partner, UserRole::Admin] {
            assert_eq!(role.as_str().parse::<UserRole>().unwrap(), role);
        }
        assert!("root".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_otp_window() {
        let issued = Utc::now();
        let expires = otp_expiry(issued);
        assert!(otp_accepts(123456, expires, 123456, issued + Duration::minutes(9)));
        assert!(!otp_accepts(123456, expires, 123456, issued + Duration::minutes(10)));
        assert!(!otp_accepts(123456, expires, 654321, issued));
    }

    #[test]
    fn test_check_session() {
        assert!(check_session(None, None).is_ok());
        assert!(check_session(None, Some("abc")).is_ok());
        assert!(check_session(Some("abc"), Some("abc")).is_ok());
        assert_eq!(
            check_session(Some("abc"), Some("xyz")),
            Err(SessionRejection::SignedInElsewhere)
        );
        assert_eq!(
            check_session(Some("abc"), None),
            Err(SessionRejection::SignedInElsewhere)
        );
    }
}
