use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use bienestar_common::{ApiResponse, AppError, JustificationStatus, MoodValue, UserRole};

use crate::models::*;
use crate::services::{
    normalize_calendar_date, week_start_of, AlertService, AppState, GroupService,
    JustificationService, MessageService, MoodService, PerceptionService, UserService,
};

fn validation_error(errors: validator::ValidationErrors) -> AppError {
    AppError::Validation(format!("Validation error: {:?}", errors))
}

// Liveness probe: one trivial round-trip against the store.
pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<HealthResponse>>, AppError> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&state.db_pool)
        .await
        .map_err(AppError::Database)?;

    Ok(Json(ApiResponse::success(HealthResponse { ok: true })))
}

// User registration
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, AppError> {
    request.validate().map_err(validation_error)?;

    let (Some(role), Some(name), Some(email), Some(password)) = (
        request.role,
        request.name,
        request.email,
        request.password,
    ) else {
        return Err(AppError::Validation(
            "role, name, email and password are required".to_string(),
        ));
    };

    let role = UserRole::parse(&role)
        .ok_or_else(|| AppError::Validation(format!("invalid role: {role}")))?;

    let user = UserService::new(&state)
        .register(role, name, email, password)
        .await?;

    Ok(Json(ApiResponse::success(user)))
}

// User login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, AppError> {
    request.validate().map_err(validation_error)?;

    let (Some(email), Some(password)) = (request.email, request.password) else {
        return Err(AppError::Validation(
            "email and password are required".to_string(),
        ));
    };

    let user = UserService::new(&state).login(email, password).await?;

    Ok(Json(ApiResponse::success(user)))
}

// Group creation (tutor)
pub async fn create_group(
    State(state): State<AppState>,
    Json(request): Json<CreateGroupRequest>,
) -> Result<Json<ApiResponse<GroupResponse>>, AppError> {
    request.validate().map_err(validation_error)?;

    let (Some(tutor_id), Some(name), Some(code)) =
        (request.tutor_id, request.name, request.code)
    else {
        return Err(AppError::Validation(
            "tutorId, name and code are required".to_string(),
        ));
    };

    let group = GroupService::new(&state)
        .create(tutor_id, name, code, request.term)
        .await?;

    Ok(Json(ApiResponse::success(group)))
}

// Group enrollment (student)
pub async fn join_group(
    State(state): State<AppState>,
    Json(request): Json<JoinGroupRequest>,
) -> Result<Json<ApiResponse<JoinGroupResponse>>, AppError> {
    let (Some(student_id), Some(group_code)) = (request.student_id, request.group_code) else {
        return Err(AppError::Validation(
            "studentId and groupCode are required".to_string(),
        ));
    };

    let joined = GroupService::new(&state)
        .join(student_id, group_code, request.term)
        .await?;

    Ok(Json(ApiResponse::success(joined)))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TutorIdQuery {
    pub tutor_id: Option<Uuid>,
}

pub async fn list_tutor_groups(
    State(state): State<AppState>,
    Query(query): Query<TutorIdQuery>,
) -> Result<Json<ApiResponse<Vec<TutorGroupResponse>>>, AppError> {
    let tutor_id = query
        .tutor_id
        .ok_or_else(|| AppError::Validation("tutorId is required".to_string()))?;

    let groups = GroupService::new(&state).list_for_tutor(tutor_id).await?;

    Ok(Json(ApiResponse::success(groups)))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentIdQuery {
    pub student_id: Option<Uuid>,
}

pub async fn list_student_groups(
    State(state): State<AppState>,
    Query(query): Query<StudentIdQuery>,
) -> Result<Json<ApiResponse<Vec<StudentGroupResponse>>>, AppError> {
    let student_id = query
        .student_id
        .ok_or_else(|| AppError::Validation("studentId is required".to_string()))?;

    let groups = GroupService::new(&state)
        .list_for_student(student_id)
        .await?;

    Ok(Json(ApiResponse::success(groups)))
}

// Daily mood log
pub async fn submit_mood(
    State(state): State<AppState>,
    Json(request): Json<SubmitMoodRequest>,
) -> Result<Json<ApiResponse<OkResponse>>, AppError> {
    let (Some(student_id), Some(mood)) = (request.student_id, request.mood) else {
        return Err(AppError::Validation(
            "studentId and mood are required".to_string(),
        ));
    };

    let mood = MoodValue::parse(&mood)
        .ok_or_else(|| AppError::Validation(format!("invalid mood: {mood}")))?;

    let logged_date = match request.logged_date.as_deref() {
        Some(raw) => normalize_calendar_date(raw)?,
        None => Utc::now().date_naive(),
    };

    MoodService::new(&state)
        .submit(student_id, mood, request.note, logged_date)
        .await?;

    Ok(Json(ApiResponse::success(OkResponse { ok: true })))
}

pub async fn mood_history(
    State(state): State<AppState>,
    Query(query): Query<StudentIdQuery>,
) -> Result<Json<ApiResponse<Vec<MoodLogResponse>>>, AppError> {
    let student_id = query
        .student_id
        .ok_or_else(|| AppError::Validation("studentId is required".to_string()))?;

    let logs = MoodService::new(&state).history(student_id).await?;

    Ok(Json(ApiResponse::success(logs)))
}

// Weekly subject perception
pub async fn submit_perception(
    State(state): State<AppState>,
    Json(request): Json<SubmitPerceptionRequest>,
) -> Result<Json<ApiResponse<OkResponse>>, AppError> {
    let (Some(student_id), Some(subject), Some(emotion)) =
        (request.student_id, request.subject, request.emotion)
    else {
        return Err(AppError::Validation(
            "studentId, subject and emotion are required".to_string(),
        ));
    };

    let reference_date = match request.week_start.as_deref() {
        Some(raw) => normalize_calendar_date(raw)?,
        None => Utc::now().date_naive(),
    };
    let week_start = week_start_of(reference_date);

    PerceptionService::new(&state)
        .submit(student_id, subject, emotion, week_start, request.notes)
        .await?;

    Ok(Json(ApiResponse::success(OkResponse { ok: true })))
}

pub async fn perception_history(
    State(state): State<AppState>,
    Query(query): Query<StudentIdQuery>,
) -> Result<Json<ApiResponse<Vec<PerceptionResponse>>>, AppError> {
    let student_id = query
        .student_id
        .ok_or_else(|| AppError::Validation("studentId is required".to_string()))?;

    let perceptions = PerceptionService::new(&state).history(student_id).await?;

    Ok(Json(ApiResponse::success(perceptions)))
}

// Absence justification
pub async fn submit_justification(
    State(state): State<AppState>,
    Json(request): Json<SubmitJustificationRequest>,
) -> Result<Json<ApiResponse<OkResponse>>, AppError> {
    let (Some(student_id), Some(kind), Some(group_id)) =
        (request.student_id, request.kind, request.group_id)
    else {
        return Err(AppError::Validation(
            "studentId, type and groupId are required".to_string(),
        ));
    };

    JustificationService::new(&state)
        .submit(student_id, group_id, kind, request.evidence_url)
        .await?;

    Ok(Json(ApiResponse::success(OkResponse { ok: true })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerQuery {
    pub student_id: Option<Uuid>,
    pub tutor_id: Option<Uuid>,
}

pub async fn list_justifications(
    State(state): State<AppState>,
    Query(query): Query<OwnerQuery>,
) -> Result<Json<ApiResponse<JustificationList>>, AppError> {
    let service = JustificationService::new(&state);

    if let Some(student_id) = query.student_id {
        let rows = service.list_for_student(student_id).await?;
        return Ok(Json(ApiResponse::success(JustificationList::Student(rows))));
    }

    if let Some(tutor_id) = query.tutor_id {
        let rows = service.list_for_tutor(tutor_id).await?;
        return Ok(Json(ApiResponse::success(JustificationList::Tutor(rows))));
    }

    Err(AppError::Validation(
        "studentId or tutorId is required".to_string(),
    ))
}

pub async fn review_justification(
    State(state): State<AppState>,
    Path(justification_id): Path<Uuid>,
    Json(request): Json<ReviewJustificationRequest>,
) -> Result<Json<ApiResponse<OkResponse>>, AppError> {
    let status = request
        .status
        .as_deref()
        .and_then(JustificationStatus::parse)
        .ok_or_else(|| {
            AppError::Validation("status must be approved, rejected or pending".to_string())
        })?;

    JustificationService::new(&state)
        .review(justification_id, status, request.reviewer_id)
        .await?;

    Ok(Json(ApiResponse::success(OkResponse { ok: true })))
}

// Derived alerts, read-only
pub async fn list_alerts(
    State(state): State<AppState>,
    Query(query): Query<OwnerQuery>,
) -> Result<Json<ApiResponse<AlertList>>, AppError> {
    let service = AlertService::new(&state);

    if let Some(student_id) = query.student_id {
        let rows = service.list_for_student(student_id).await?;
        return Ok(Json(ApiResponse::success(AlertList::Student(rows))));
    }

    if let Some(tutor_id) = query.tutor_id {
        let rows = service.list_for_tutor(tutor_id).await?;
        return Ok(Json(ApiResponse::success(AlertList::Tutor(rows))));
    }

    Err(AppError::Validation(
        "studentId or tutorId is required".to_string(),
    ))
}

// Messaging
pub async fn send_message(
    State(state): State<AppState>,
    Json(request): Json<SendMessageRequest>,
) -> Result<Json<ApiResponse<SendMessageResponse>>, AppError> {
    let (Some(from_user_id), Some(body)) = (request.from_user_id, request.body) else {
        return Err(AppError::Validation(
            "fromUserId and body are required".to_string(),
        ));
    };

    if request.to_user_id.is_none() && request.group_id.is_none() {
        return Err(AppError::Validation(
            "toUserId or groupId is required".to_string(),
        ));
    }

    let sent = MessageService::new(&state)
        .send(from_user_id, request.to_user_id, request.group_id, body)
        .await?;

    Ok(Json(ApiResponse::success(sent)))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagesQuery {
    pub group_id: Option<Uuid>,
    pub from_user_id: Option<Uuid>,
    pub to_user_id: Option<Uuid>,
}

pub async fn list_messages(
    State(state): State<AppState>,
    Query(query): Query<MessagesQuery>,
) -> Result<Json<ApiResponse<MessageList>>, AppError> {
    let service = MessageService::new(&state);

    if let Some(group_id) = query.group_id {
        let rows = service.list_for_group(group_id).await?;
        return Ok(Json(ApiResponse::success(MessageList::Group(rows))));
    }

    if let (Some(from_user_id), Some(to_user_id)) = (query.from_user_id, query.to_user_id) {
        let rows = service.list_between(from_user_id, to_user_id).await?;
        return Ok(Json(ApiResponse::success(MessageList::Direct(rows))));
    }

    Err(AppError::Validation(
        "groupId or a fromUserId/toUserId pair is required".to_string(),
    ))
}
