//! Meeting scheduling service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::identifiers::meeting_channel_name;
use shared::models::participants_with_creator;
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::AppResult;
use crate::external::ZegoTokenIssuer;
use crate::services::access::{check, required};
use shared::validation::validate_title;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMeetingInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub scheduled_at: DateTime<Utc>,
    #[serde(default)]
    pub participants: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Meeting {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub scheduled_at: DateTime<Utc>,
    pub created_by: Uuid,
    pub channel_name: String,
    pub token: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MeetingUser {
    #[serde(skip)]
    pub meeting_id: Uuid,
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingView {
    #[serde(flatten)]
    pub meeting: Meeting,
    pub creator: Option<MeetingUser>,
    pub participants: Vec<MeetingUser>,
}

#[derive(Clone)]
pub struct MeetingService {
    db: PgPool,
    video: ZegoTokenIssuer,
}

impl MeetingService {
    pub fn new(db: PgPool, video: ZegoTokenIssuer) -> Self {
        Self { db, video }
    }

    pub async fn create(&self, creator: Uuid, input: CreateMeetingInput) -> AppResult<Meeting> {
        let title = required("title", input.title)?;
        check("title", validate_title(&title))?;

        let channel = meeting_channel_name(&rand::random::<[u8; 8]>());
        let token = self.video.issue(creator, &channel)?;
        let participants = participants_with_creator(creator, &input.participants);

        let mut tx = self.db.begin().await?;

        let meeting = sqlx::query_as::<_, Meeting>(
            r#"
            INSERT INTO meetings (title, description, scheduled_at, created_by, channel_name, token)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&title)
        .bind(input.description)
        .bind(input.scheduled_at)
        .bind(creator)
        .bind(&channel)
        .bind(&token)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO meeting_participants (meeting_id, user_id)
            SELECT $1, u.id FROM users u WHERE u.id = ANY($2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(meeting.id)
        .bind(&participants)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            "Meeting {} scheduled on channel {} with {} participant(s)",
            meeting.id,
            channel,
            participants.len()
        );
        Ok(meeting)
    }

    /// Meetings the user takes part in, newest scheduled first
    pub async fn for_user(&self, user_id: Uuid) -> AppResult<Vec<MeetingView>> {
        let meetings = sqlx::query_as::<_, Meeting>(
            r#"
            SELECT m.* FROM meetings m
            JOIN meeting_participants mp ON mp.meeting_id = m.id
            WHERE mp.user_id = $1
            ORDER BY m.scheduled_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        let ids: Vec<Uuid> = meetings.iter().map(|m| m.id).collect();

        let mut participants: HashMap<Uuid, Vec<MeetingUser>> = HashMap::new();
        let rows = sqlx::query_as::<_, MeetingUser>(
            r#"
            SELECT mp.meeting_id, u.id, u.full_name, u.email
            FROM meeting_participants mp
            JOIN users u ON u.id = mp.user_id
            WHERE mp.meeting_id = ANY($1)
            ORDER BY u.full_name
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.db)
        .await?;
        for row in rows {
            participants.entry(row.meeting_id).or_default().push(row);
        }

        let creators: HashMap<Uuid, MeetingUser> = sqlx::query_as::<_, MeetingUser>(
            r#"
            SELECT m.id AS meeting_id, u.id, u.full_name, u.email
            FROM meetings m
            JOIN users u ON u.id = m.created_by
            WHERE m.id = ANY($1)
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.db)
        .await?
        .into_iter()
        .map(|u| (u.meeting_id, u))
        .collect();

        Ok(meetings
            .into_iter()
            .map(|meeting| MeetingView {
                creator: creators.get(&meeting.id).cloned(),
                participants: participants.remove(&meeting.id).unwrap_or_default(),
                meeting,
            })
            .collect())
    }

    /// Token for joining an arbitrary room as `user_id`
    pub fn video_token(&self, user_id: Uuid, room_id: Option<String>) -> AppResult<String> {
        let room_id = required("roomId", room_id)?;
        self.video.issue(user_id, &room_id)
    }
}
