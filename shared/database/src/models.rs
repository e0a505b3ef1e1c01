use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use chrono::{DateTime, NaiveDate, Utc};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub user_id: Uuid,
    pub role: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Group {
    pub group_id: Uuid,
    pub code: String,
    pub name: String,
    pub tutor_id: Uuid,
    pub term: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GroupMember {
    pub membership_id: Uuid,
    pub group_id: Uuid,
    pub student_id: Uuid,
    pub term: String,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MoodLog {
    pub mood_log_id: Uuid,
    pub student_id: Uuid,
    pub logged_date: NaiveDate,
    pub mood: String,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WeeklyPerception {
    pub perception_id: Uuid,
    pub student_id: Uuid,
    pub subject: String,
    pub week_start: NaiveDate,
    pub emotion: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Justification {
    pub justification_id: Uuid,
    pub student_id: Uuid,
    pub group_id: Uuid,
    pub kind: String,
    pub evidence_url: Option<String>,
    pub status: String,
    pub reviewer_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Alert {
    pub alert_id: Uuid,
    pub student_id: Uuid,
    pub alert_type: String,
    pub severity: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Message {
    pub message_id: Uuid,
    pub from_user_id: Uuid,
    pub to_user_id: Option<Uuid>,
    pub group_id: Option<Uuid>,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

// Join projections used by the listing endpoints.

/// One membership row with the student's display name, fetched in a single
/// batched lookup for all of a tutor's groups.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GroupMemberName {
    pub group_id: Uuid,
    pub student_id: Uuid,
    pub name: String,
}

/// A student's group joined with the owning tutor's name.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StudentGroupRow {
    pub group_id: Uuid,
    pub code: String,
    pub name: String,
    pub tutor_id: Uuid,
    pub tutor_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JustificationWithStudent {
    pub justification_id: Uuid,
    pub group_id: Uuid,
    pub kind: String,
    pub evidence_url: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub student_id: Uuid,
    pub student_name: String,
}

/// Message in a group thread; the listing query filters on `group_id`,
/// so the column is never null here.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GroupMessageRow {
    pub message_id: Uuid,
    pub from_user_id: Uuid,
    pub group_id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// Message between two users; the listing query filters on the
/// (from, to) pair, so `to_user_id` is never null here.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DirectMessageRow {
    pub message_id: Uuid,
    pub from_user_id: Uuid,
    pub to_user_id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AlertWithStudent {
    pub alert_id: Uuid,
    pub alert_type: String,
    pub severity: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub student_name: String,
}
