use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use bienestar_common::{AppError, JustificationStatus, MoodValue, UserRole};
use bienestar_database::{
    Alert, AlertWithStudent, DirectMessageRow, Group, GroupMemberName, GroupMessageRow,
    Justification, JustificationWithStudent, MoodLog, StudentGroupRow, User, WeeklyPerception,
};

use crate::config::AppConfig;
use crate::models::*;

const LOW_MOOD_ALERT_MESSAGE: &str = "Low mood reported";

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: AppConfig,
}

/// Truncates an incoming date to a calendar day. Accepts a plain date or an
/// RFC 3339 datetime, whose time component is discarded after conversion
/// to UTC.
pub fn normalize_calendar_date(raw: &str) -> Result<NaiveDate, AppError> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }

    if let Ok(datetime) = DateTime::parse_from_rfc3339(raw) {
        return Ok(datetime.with_timezone(&Utc).date_naive());
    }

    Err(AppError::Validation(format!("invalid date: {raw}")))
}

/// Maps a date to the Monday beginning its calendar week.
pub fn week_start_of(date: NaiveDate) -> NaiveDate {
    let days_from_monday = date.weekday().num_days_from_monday() as i64;
    date - Duration::days(days_from_monday)
}

pub struct UserService {
    db_pool: PgPool,
}

impl UserService {
    pub fn new(state: &AppState) -> Self {
        Self {
            db_pool: state.db_pool.clone(),
        }
    }

    pub async fn register(
        &self,
        role: UserRole,
        name: String,
        email: String,
        password: String,
    ) -> Result<UserResponse, AppError> {
        let existing = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(&email)
            .fetch_optional(&self.db_pool)
            .await
            .map_err(AppError::Database)?;

        if existing.is_some() {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let user_id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO users (user_id, role, name, email, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(user_id)
        .bind(role.as_str())
        .bind(&name)
        .bind(&email)
        .bind(&password)
        .execute(&self.db_pool)
        .await
        .map_err(|err| AppError::conflict_on_duplicate(err, "Email already registered"))?;

        tracing::info!("User registered: {} ({})", name, email);

        Ok(UserResponse {
            id: user_id,
            role: role.as_str().to_string(),
            name,
            email,
        })
    }

    /// Credentials are compared exactly as stored. The stored value is
    /// whatever registration received; there is no hashing step.
    pub async fn login(&self, email: String, password: String) -> Result<UserResponse, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE email = $1 AND password_hash = $2",
        )
        .bind(&email)
        .bind(&password)
        .fetch_optional(&self.db_pool)
        .await
        .map_err(AppError::Database)?
        .ok_or_else(|| AppError::Authentication("Invalid credentials".to_string()))?;

        tracing::info!("User logged in: {} ({})", user.name, user.email);

        Ok(UserResponse {
            id: user.user_id,
            role: user.role,
            name: user.name,
            email: user.email,
        })
    }
}

pub struct GroupService {
    db_pool: PgPool,
}

impl GroupService {
    pub fn new(state: &AppState) -> Self {
        Self {
            db_pool: state.db_pool.clone(),
        }
    }

    pub async fn create(
        &self,
        tutor_id: Uuid,
        name: String,
        code: String,
        term: String,
    ) -> Result<GroupResponse, AppError> {
        // Case-sensitive exact match against the stored code.
        let existing = sqlx::query_as::<_, Group>("SELECT * FROM groups WHERE code = $1")
            .bind(&code)
            .fetch_optional(&self.db_pool)
            .await
            .map_err(AppError::Database)?;

        if existing.is_some() {
            return Err(AppError::Conflict("Group code already exists".to_string()));
        }

        let group_id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO groups (group_id, code, name, tutor_id, term)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(group_id)
        .bind(&code)
        .bind(&name)
        .bind(tutor_id)
        .bind(&term)
        .execute(&self.db_pool)
        .await
        .map_err(|err| AppError::conflict_on_duplicate(err, "Group code already exists"))?;

        Ok(GroupResponse {
            id: group_id,
            code,
            name,
        })
    }

    pub async fn join(
        &self,
        student_id: Uuid,
        group_code: String,
        term: String,
    ) -> Result<JoinGroupResponse, AppError> {
        let group = sqlx::query_as::<_, Group>("SELECT * FROM groups WHERE code = $1")
            .bind(&group_code)
            .fetch_optional(&self.db_pool)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound("Group not found".to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO group_members (membership_id, group_id, student_id, term)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(group.group_id)
        .bind(student_id)
        .bind(&term)
        .execute(&self.db_pool)
        .await
        .map_err(|err| {
            AppError::conflict_on_duplicate(err, "Already enrolled in this group for the term")
        })?;

        Ok(JoinGroupResponse {
            ok: true,
            group_id: group.group_id,
        })
    }

    pub async fn list_for_tutor(&self, tutor_id: Uuid) -> Result<Vec<TutorGroupResponse>, AppError> {
        let groups = sqlx::query_as::<_, Group>("SELECT * FROM groups WHERE tutor_id = $1")
            .bind(tutor_id)
            .fetch_all(&self.db_pool)
            .await
            .map_err(AppError::Database)?;

        if groups.is_empty() {
            return Ok(Vec::new());
        }

        // One batched lookup for every group, grouped client-side below.
        let group_ids: Vec<Uuid> = groups.iter().map(|group| group.group_id).collect();
        let members = sqlx::query_as::<_, GroupMemberName>(
            r#"
            SELECT gm.group_id, u.user_id AS student_id, u.name
            FROM group_members gm
            JOIN users u ON u.user_id = gm.student_id
            WHERE gm.group_id = ANY($1)
            "#,
        )
        .bind(&group_ids)
        .fetch_all(&self.db_pool)
        .await
        .map_err(AppError::Database)?;

        Ok(groups
            .into_iter()
            .map(|group| {
                let students = members
                    .iter()
                    .filter(|member| member.group_id == group.group_id)
                    .map(|member| StudentRef {
                        id: member.student_id,
                        name: member.name.clone(),
                    })
                    .collect();

                TutorGroupResponse {
                    id: group.group_id,
                    code: group.code,
                    name: group.name,
                    students,
                }
            })
            .collect())
    }

    pub async fn list_for_student(
        &self,
        student_id: Uuid,
    ) -> Result<Vec<StudentGroupResponse>, AppError> {
        let rows = sqlx::query_as::<_, StudentGroupRow>(
            r#"
            SELECT g.group_id, g.code, g.name, g.tutor_id, u.name AS tutor_name
            FROM groups g
            JOIN group_members gm ON gm.group_id = g.group_id
            JOIN users u ON u.user_id = g.tutor_id
            WHERE gm.student_id = $1
            "#,
        )
        .bind(student_id)
        .fetch_all(&self.db_pool)
        .await
        .map_err(AppError::Database)?;

        Ok(rows
            .into_iter()
            .map(|row| StudentGroupResponse {
                id: row.group_id,
                code: row.code,
                name: row.name,
                tutor_id: row.tutor_id,
                tutor_name: row.tutor_name,
            })
            .collect())
    }
}

pub struct MoodService {
    db_pool: PgPool,
}

impl MoodService {
    pub fn new(state: &AppState) -> Self {
        Self {
            db_pool: state.db_pool.clone(),
        }
    }

    /// Inserts the daily log and, for a low mood, its derived alert in one
    /// transaction. The conflict on a duplicated day comes from the log's
    /// unique key, never from the alert insert.
    pub async fn submit(
        &self,
        student_id: Uuid,
        mood: MoodValue,
        note: Option<String>,
        logged_date: NaiveDate,
    ) -> Result<(), AppError> {
        let mut tx = self.db_pool.begin().await.map_err(AppError::Database)?;

        sqlx::query(
            r#"
            INSERT INTO mood_logs (mood_log_id, student_id, logged_date, mood, note)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(student_id)
        .bind(logged_date)
        .bind(mood.as_str())
        .bind(&note)
        .execute(&mut *tx)
        .await
        .map_err(|err| AppError::conflict_on_duplicate(err, "Mood already logged for this date"))?;

        if let Some(severity) = mood.alert_severity() {
            sqlx::query(
                r#"
                INSERT INTO alerts (alert_id, student_id, alert_type, severity, message)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(student_id)
            .bind("mood")
            .bind(severity.as_str())
            .bind(LOW_MOOD_ALERT_MESSAGE)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;
        }

        tx.commit().await.map_err(AppError::Database)?;
        Ok(())
    }

    pub async fn history(&self, student_id: Uuid) -> Result<Vec<MoodLogResponse>, AppError> {
        let logs = sqlx::query_as::<_, MoodLog>(
            "SELECT * FROM mood_logs WHERE student_id = $1 ORDER BY logged_date DESC",
        )
        .bind(student_id)
        .fetch_all(&self.db_pool)
        .await
        .map_err(AppError::Database)?;

        Ok(logs
            .into_iter()
            .map(|log| MoodLogResponse {
                id: log.mood_log_id,
                mood: log.mood,
                note: log.note,
                logged_date: log.logged_date,
            })
            .collect())
    }
}

pub struct PerceptionService {
    db_pool: PgPool,
}

impl PerceptionService {
    pub fn new(state: &AppState) -> Self {
        Self {
            db_pool: state.db_pool.clone(),
        }
    }

    pub async fn submit(
        &self,
        student_id: Uuid,
        subject: String,
        emotion: String,
        week_start: NaiveDate,
        notes: Option<String>,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO weekly_perceptions (perception_id, student_id, subject, week_start, emotion, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(student_id)
        .bind(&subject)
        .bind(week_start)
        .bind(&emotion)
        .bind(&notes)
        .execute(&self.db_pool)
        .await
        .map_err(|err| {
            AppError::conflict_on_duplicate(err, "Perception already recorded for this subject and week")
        })?;

        Ok(())
    }

    pub async fn history(&self, student_id: Uuid) -> Result<Vec<PerceptionResponse>, AppError> {
        let perceptions = sqlx::query_as::<_, WeeklyPerception>(
            "SELECT * FROM weekly_perceptions WHERE student_id = $1 ORDER BY week_start DESC",
        )
        .bind(student_id)
        .fetch_all(&self.db_pool)
        .await
        .map_err(AppError::Database)?;

        Ok(perceptions
            .into_iter()
            .map(|perception| PerceptionResponse {
                id: perception.perception_id,
                subject: perception.subject,
                week_start: perception.week_start,
                emotion: perception.emotion,
                notes: perception.notes,
            })
            .collect())
    }
}

pub struct JustificationService {
    db_pool: PgPool,
}

impl JustificationService {
    pub fn new(state: &AppState) -> Self {
        Self {
            db_pool: state.db_pool.clone(),
        }
    }

    pub async fn submit(
        &self,
        student_id: Uuid,
        group_id: Uuid,
        kind: String,
        evidence_url: Option<String>,
    ) -> Result<(), AppError> {
        let membership: Option<Uuid> = sqlx::query_scalar(
            "SELECT membership_id FROM group_members WHERE student_id = $1 AND group_id = $2 LIMIT 1",
        )
        .bind(student_id)
        .bind(group_id)
        .fetch_optional(&self.db_pool)
        .await
        .map_err(AppError::Database)?;

        if membership.is_none() {
            return Err(AppError::Validation(
                "Student must belong to this group".to_string(),
            ));
        }

        sqlx::query(
            r#"
            INSERT INTO justifications (justification_id, student_id, group_id, kind, evidence_url)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(student_id)
        .bind(group_id)
        .bind(&kind)
        .bind(&evidence_url)
        .execute(&self.db_pool)
        .await
        .map_err(AppError::Database)?;

        Ok(())
    }

    pub async fn list_for_student(
        &self,
        student_id: Uuid,
    ) -> Result<Vec<JustificationResponse>, AppError> {
        let rows = sqlx::query_as::<_, Justification>(
            "SELECT * FROM justifications WHERE student_id = $1 ORDER BY created_at DESC",
        )
        .bind(student_id)
        .fetch_all(&self.db_pool)
        .await
        .map_err(AppError::Database)?;

        Ok(rows
            .into_iter()
            .map(|row| JustificationResponse {
                id: row.justification_id,
                group_id: row.group_id,
                kind: row.kind,
                evidence_url: row.evidence_url,
                status: row.status,
                created_at: row.created_at,
            })
            .collect())
    }

    pub async fn list_for_tutor(
        &self,
        tutor_id: Uuid,
    ) -> Result<Vec<TutorJustificationResponse>, AppError> {
        let group_ids: Vec<Uuid> =
            sqlx::query_scalar("SELECT group_id FROM groups WHERE tutor_id = $1")
                .bind(tutor_id)
                .fetch_all(&self.db_pool)
                .await
                .map_err(AppError::Database)?;

        if group_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, JustificationWithStudent>(
            r#"
            SELECT j.justification_id, j.group_id, j.kind, j.evidence_url, j.status, j.created_at,
                   u.user_id AS student_id, u.name AS student_name
            FROM justifications j
            JOIN users u ON u.user_id = j.student_id
            JOIN group_members gm ON gm.student_id = j.student_id
            WHERE gm.group_id = ANY($1)
            ORDER BY j.created_at DESC
            "#,
        )
        .bind(&group_ids)
        .fetch_all(&self.db_pool)
        .await
        .map_err(AppError::Database)?;

        Ok(rows
            .into_iter()
            .map(|row| TutorJustificationResponse {
                id: row.justification_id,
                group_id: row.group_id,
                kind: row.kind,
                evidence_url: row.evidence_url,
                status: row.status,
                created_at: row.created_at,
                student: row.student_name,
                student_id: row.student_id,
            })
            .collect())
    }

    /// The update is unconditional: no existence check, and resolved_at is
    /// stamped even when the status reverts to pending.
    pub async fn review(
        &self,
        justification_id: Uuid,
        status: JustificationStatus,
        reviewer_id: Option<Uuid>,
    ) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE justifications SET status = $1, reviewer_id = $2, resolved_at = NOW() WHERE justification_id = $3",
        )
        .bind(status.as_str())
        .bind(reviewer_id)
        .bind(justification_id)
        .execute(&self.db_pool)
        .await
        .map_err(AppError::Database)?;

        Ok(())
    }
}

pub struct AlertService {
    db_pool: PgPool,
}

impl AlertService {
    pub fn new(state: &AppState) -> Self {
        Self {
            db_pool: state.db_pool.clone(),
        }
    }

    pub async fn list_for_student(&self, student_id: Uuid) -> Result<Vec<AlertResponse>, AppError> {
        let alerts = sqlx::query_as::<_, Alert>(
            "SELECT * FROM alerts WHERE student_id = $1 ORDER BY created_at DESC",
        )
        .bind(student_id)
        .fetch_all(&self.db_pool)
        .await
        .map_err(AppError::Database)?;

        Ok(alerts
            .into_iter()
            .map(|alert| AlertResponse {
                id: alert.alert_id,
                alert_type: alert.alert_type,
                severity: alert.severity,
                message: alert.message,
                created_at: alert.created_at,
            })
            .collect())
    }

    pub async fn list_for_tutor(&self, tutor_id: Uuid) -> Result<Vec<TutorAlertResponse>, AppError> {
        let group_ids: Vec<Uuid> =
            sqlx::query_scalar("SELECT group_id FROM groups WHERE tutor_id = $1")
                .bind(tutor_id)
                .fetch_all(&self.db_pool)
                .await
                .map_err(AppError::Database)?;

        if group_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, AlertWithStudent>(
            r#"
            SELECT a.alert_id, a.alert_type, a.severity, a.message, a.created_at,
                   u.name AS student_name
            FROM alerts a
            JOIN users u ON u.user_id = a.student_id
            JOIN group_members gm ON gm.student_id = a.student_id
            WHERE gm.group_id = ANY($1)
            ORDER BY a.created_at DESC
            "#,
        )
        .bind(&group_ids)
        .fetch_all(&self.db_pool)
        .await
        .map_err(AppError::Database)?;

        Ok(rows
            .into_iter()
            .map(|row| TutorAlertResponse {
                id: row.alert_id,
                alert_type: row.alert_type,
                severity: row.severity,
                message: row.message,
                created_at: row.created_at,
                student: row.student_name,
            })
            .collect())
    }
}

pub struct MessageService {
    db_pool: PgPool,
}

impl MessageService {
    pub fn new(state: &AppState) -> Self {
        Self {
            db_pool: state.db_pool.clone(),
        }
    }

    /// When both a recipient and a group are supplied the message is stored
    /// with both and shows up in the group thread.
    pub async fn send(
        &self,
        from_user_id: Uuid,
        to_user_id: Option<Uuid>,
        group_id: Option<Uuid>,
        body: String,
    ) -> Result<SendMessageResponse, AppError> {
        let message_id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO messages (message_id, from_user_id, to_user_id, group_id, body)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(message_id)
        .bind(from_user_id)
        .bind(to_user_id)
        .bind(group_id)
        .bind(&body)
        .execute(&self.db_pool)
        .await
        .map_err(AppError::Database)?;

        Ok(SendMessageResponse { id: message_id })
    }

    pub async fn list_for_group(
        &self,
        group_id: Uuid,
    ) -> Result<Vec<GroupMessageResponse>, AppError> {
        let rows = sqlx::query_as::<_, GroupMessageRow>(
            r#"
            SELECT message_id, from_user_id, group_id, body, created_at
            FROM messages
            WHERE group_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(group_id)
        .fetch_all(&self.db_pool)
        .await
        .map_err(AppError::Database)?;

        Ok(rows
            .into_iter()
            .map(|row| GroupMessageResponse {
                id: row.message_id,
                from_user_id: row.from_user_id,
                group_id: row.group_id,
                body: row.body,
                created_at: row.created_at,
            })
            .collect())
    }

    pub async fn list_between(
        &self,
        from_user_id: Uuid,
        to_user_id: Uuid,
    ) -> Result<Vec<DirectMessageResponse>, AppError> {
        let rows = sqlx::query_as::<_, DirectMessageRow>(
            r#"
            SELECT message_id, from_user_id, to_user_id, body, created_at
            FROM messages
            WHERE (from_user_id = $1 AND to_user_id = $2)
               OR (from_user_id = $2 AND to_user_id = $1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(from_user_id)
        .bind(to_user_id)
        .fetch_all(&self.db_pool)
        .await
        .map_err(AppError::Database)?;

        Ok(rows
            .into_iter()
            .map(|row| DirectMessageResponse {
                id: row.message_id,
                from_user_id: row.from_user_id,
                to_user_id: row.to_user_id,
                body: row.body,
                created_at: row.created_at,
            })
            .collect())
    }
}
