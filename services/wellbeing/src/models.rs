use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, NaiveDate, Utc};
use validator::Validate;

fn default_term() -> String {
    "2024".to_string()
}

// Request DTOs. Fields the API treats as required are `Option` here and
// checked explicitly so a missing field surfaces as a 400 validation
// error rather than a deserializer rejection.

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub role: Option<String>,

    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,

    #[validate(email)]
    pub email: Option<String>,

    #[validate(length(min = 1))]
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(email)]
    pub email: Option<String>,

    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub role: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupRequest {
    pub tutor_id: Option<Uuid>,

    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,

    #[validate(length(min = 1, max = 32))]
    pub code: Option<String>,

    #[serde(default = "default_term")]
    pub term: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupResponse {
    pub id: Uuid,
    pub code: String,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinGroupRequest {
    pub student_id: Option<Uuid>,
    pub group_code: Option<String>,

    #[serde(default = "default_term")]
    pub term: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinGroupResponse {
    pub ok: bool,
    pub group_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRef {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TutorGroupResponse {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub students: Vec<StudentRef>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentGroupResponse {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub tutor_id: Uuid,
    pub tutor_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitMoodRequest {
    pub student_id: Option<Uuid>,
    pub mood: Option<String>,
    pub note: Option<String>,
    // RFC 3339 datetime or plain YYYY-MM-DD; the time component is discarded.
    pub logged_date: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodLogResponse {
    pub id: Uuid,
    pub mood: String,
    pub note: Option<String>,
    pub logged_date: NaiveDate,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitPerceptionRequest {
    pub student_id: Option<Uuid>,
    pub subject: Option<String>,
    pub emotion: Option<String>,
    pub week_start: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerceptionResponse {
    pub id: Uuid,
    pub subject: String,
    pub week_start: NaiveDate,
    pub emotion: String,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitJustificationRequest {
    pub student_id: Option<Uuid>,

    #[serde(rename = "type")]
    pub kind: Option<String>,

    pub evidence_url: Option<String>,
    pub group_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JustificationResponse {
    pub id: Uuid,
    pub group_id: Uuid,

    #[serde(rename = "type")]
    pub kind: String,

    pub evidence_url: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Justification as seen by a tutor, with the submitting student attached.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TutorJustificationResponse {
    pub id: Uuid,
    pub group_id: Uuid,

    #[serde(rename = "type")]
    pub kind: String,

    pub evidence_url: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub student: String,
    pub student_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewJustificationRequest {
    pub status: Option<String>,
    pub reviewer_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertResponse {
    pub id: Uuid,

    #[serde(rename = "type")]
    pub alert_type: String,

    pub severity: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TutorAlertResponse {
    pub id: Uuid,

    #[serde(rename = "type")]
    pub alert_type: String,

    pub severity: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub student: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub from_user_id: Option<Uuid>,
    pub to_user_id: Option<Uuid>,
    pub group_id: Option<Uuid>,
    pub body: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageResponse {
    pub id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMessageResponse {
    pub id: Uuid,
    pub from_user_id: Uuid,
    pub group_id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectMessageResponse {
    pub id: Uuid,
    pub from_user_id: Uuid,
    pub to_user_id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

// The listing endpoints answer with a different row shape depending on
// whether a student or a tutor is asking.

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum JustificationList {
    Student(Vec<JustificationResponse>),
    Tutor(Vec<TutorJustificationResponse>),
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum AlertList {
    Student(Vec<AlertResponse>),
    Tutor(Vec<TutorAlertResponse>),
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum MessageList {
    Group(Vec<GroupMessageResponse>),
    Direct(Vec<DirectMessageResponse>),
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OkResponse {
    pub ok: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub ok: bool,
}
