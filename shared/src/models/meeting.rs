//! Scheduled video meetings

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims carried by a video-room token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VideoTokenClaims {
    pub app_id: u32,
    pub user_id: String,
    pub room_id: String,
    pub exp: i64,
}

impl VideoTokenClaims {
    pub fn new(app_id: u32, user_id: Uuid, room_id: impl Into<String>, issued_at: i64, ttl_secs: i64) -> Self {
        Self {
            app_id,
            user_id: user_id.to_string(),
            room_id: room_id.into(),
            exp: issued_at + ttl_secs,
        }
    }
}

/// Participant list with the creator first and duplicates removed
pub fn participants_with_creator(creator: Uuid, invited: &[Uuid]) -> Vec<Uuid> {
    let mut participants = vec![creator];
    for id in invited {
        if !participants.contains(id) {
            participants.push(*id);
        }
    }
    participants
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creator_always_included_once() {
        let (creator, other) = (Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(participants_with_creator(creator, &[]), vec![creator]);
        assert_eq!(
            participants_with_creator(creator, &[other, creator, other]),
            vec![creator, other]
        );
    }

    #[test]
    fn test_claims_expiry() {
        let claims = VideoTokenClaims::new(42, Uuid::nil(), "meeting-abc", 1_000, 3_600);
        assert_eq!(claims.exp, 4_600);
        assert_eq!(claims.room_id, "meeting-abc");
    }
}
