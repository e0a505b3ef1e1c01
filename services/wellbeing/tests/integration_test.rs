use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::json;
use uuid::Uuid;

use bienestar_common::ApiResponse;
use bienestar_database::{create_pool, run_migrations};
use bienestar_wellbeing::config::AppConfig;
use bienestar_wellbeing::models::*;
use bienestar_wellbeing::routes;
use bienestar_wellbeing::services::AppState;

// The suite runs against the Postgres named by DATABASE_URL and is skipped
// when none is configured.
async fn spawn_server() -> Option<TestServer> {
    if std::env::var("DATABASE_URL").is_err() {
        println!("Skipping integration test - DATABASE_URL not set");
        return None;
    }

    let mut config = AppConfig::from_env().expect("config from env");
    // Every test owns a server and therefore a pool; keep them small.
    config.database.max_connections = 2;
    let db_pool = create_pool(&config.database)
        .await
        .expect("connect to test database");
    run_migrations(&db_pool).await.expect("run migrations");

    let app_state = AppState { db_pool, config };
    let app = routes::create_routes().with_state(app_state);

    Some(TestServer::new(app).expect("start test server"))
}

fn unique_email() -> String {
    format!("{}@example.com", Uuid::new_v4().simple())
}

fn unique_code() -> String {
    Uuid::new_v4().simple().to_string()[..10].to_string()
}

const PASSWORD: &str = "secret123";

async fn register_user(server: &TestServer, role: &str) -> UserResponse {
    let response = server
        .post("/auth/register")
        .json(&json!({
            "role": role,
            "name": format!("Test {role}"),
            "email": unique_email(),
            "password": PASSWORD,
        }))
        .await;

    response.assert_status_ok();
    let body: ApiResponse<UserResponse> = response.json();
    body.data.expect("register payload")
}

async fn create_group(server: &TestServer, tutor_id: Uuid) -> (Uuid, String) {
    let code = unique_code();
    let response = server
        .post("/groups")
        .json(&json!({
            "tutorId": tutor_id,
            "name": "1-A",
            "code": code,
        }))
        .await;

    response.assert_status_ok();
    let body: ApiResponse<GroupResponse> = response.json();
    (body.data.expect("group payload").id, code)
}

async fn join_group(server: &TestServer, student_id: Uuid, code: &str) -> Uuid {
    let response = server
        .post("/groups/join")
        .json(&json!({
            "studentId": student_id,
            "groupCode": code,
        }))
        .await;

    response.assert_status_ok();
    let body: ApiResponse<JoinGroupResponse> = response.json();
    body.data.expect("join payload").group_id
}

#[tokio::test]
async fn health_probe_round_trips_the_store() {
    let Some(server) = spawn_server().await else {
        return;
    };

    let response = server.get("/health").await;
    response.assert_status_ok();

    let body: ApiResponse<HealthResponse> = response.json();
    assert!(body.data.expect("health payload").ok);
}

#[tokio::test]
async fn register_then_login_round_trips() {
    let Some(server) = spawn_server().await else {
        return;
    };

    let user = register_user(&server, "student").await;

    let response = server
        .post("/auth/login")
        .json(&json!({ "email": user.email, "password": PASSWORD }))
        .await;
    response.assert_status_ok();

    let body: ApiResponse<UserResponse> = response.json();
    let logged_in = body.data.expect("login payload");
    assert_eq!(logged_in.id, user.id);
    assert_eq!(logged_in.role, "student");
}

#[tokio::test]
async fn login_with_wrong_password_is_unauthorized() {
    let Some(server) = spawn_server().await else {
        return;
    };

    let user = register_user(&server, "student").await;

    let response = server
        .post("/auth/login")
        .json(&json!({ "email": user.email, "password": "wrong" }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn duplicate_email_registration_conflicts() {
    let Some(server) = spawn_server().await else {
        return;
    };

    let email = unique_email();
    let request = json!({
        "role": "student",
        "name": "Duplicated",
        "email": email,
        "password": PASSWORD,
    });

    server.post("/auth/register").json(&request).await.assert_status_ok();

    let response = server.post("/auth/register").json(&request).await;
    response.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn registration_with_missing_fields_is_rejected() {
    let Some(server) = spawn_server().await else {
        return;
    };

    let response = server
        .post("/auth/register")
        .json(&json!({ "role": "student", "name": "No credentials" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn duplicate_group_code_conflicts() {
    let Some(server) = spawn_server().await else {
        return;
    };

    let tutor = register_user(&server, "tutor").await;
    let (_, code) = create_group(&server, tutor.id).await;

    let response = server
        .post("/groups")
        .json(&json!({
            "tutorId": tutor.id,
            "name": "1-B",
            "code": code,
        }))
        .await;
    response.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn joining_an_unknown_code_is_not_found() {
    let Some(server) = spawn_server().await else {
        return;
    };

    let student = register_user(&server, "student").await;

    let response = server
        .post("/groups/join")
        .json(&json!({
            "studentId": student.id,
            "groupCode": unique_code(),
        }))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn joining_the_same_group_twice_conflicts() {
    let Some(server) = spawn_server().await else {
        return;
    };

    let tutor = register_user(&server, "tutor").await;
    let (_, code) = create_group(&server, tutor.id).await;
    let student = register_user(&server, "student").await;

    join_group(&server, student.id, &code).await;

    let response = server
        .post("/groups/join")
        .json(&json!({
            "studentId": student.id,
            "groupCode": code,
        }))
        .await;
    response.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn tutor_group_listing_includes_enrolled_students() {
    let Some(server) = spawn_server().await else {
        return;
    };

    let tutor = register_user(&server, "tutor").await;
    let (group_id, code) = create_group(&server, tutor.id).await;
    let student = register_user(&server, "student").await;
    join_group(&server, student.id, &code).await;

    let response = server.get(&format!("/groups?tutorId={}", tutor.id)).await;
    response.assert_status_ok();

    let body: ApiResponse<Vec<TutorGroupResponse>> = response.json();
    let groups = body.data.expect("groups payload");
    let group = groups
        .iter()
        .find(|group| group.id == group_id)
        .expect("created group listed");
    assert_eq!(group.code, code);
    assert!(group
        .students
        .iter()
        .any(|member| member.id == student.id && member.name == student.name));
}

#[tokio::test]
async fn student_group_listing_carries_the_tutor_name() {
    let Some(server) = spawn_server().await else {
        return;
    };

    let tutor = register_user(&server, "tutor").await;
    let (group_id, code) = create_group(&server, tutor.id).await;
    let student = register_user(&server, "student").await;
    join_group(&server, student.id, &code).await;

    let response = server
        .get(&format!("/groups/by-student?studentId={}", student.id))
        .await;
    response.assert_status_ok();

    let body: ApiResponse<Vec<StudentGroupResponse>> = response.json();
    let groups = body.data.expect("groups payload");
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].id, group_id);
    assert_eq!(groups[0].tutor_id, tutor.id);
    assert_eq!(groups[0].tutor_name, tutor.name);
}

#[tokio::test]
async fn second_mood_log_for_the_same_day_conflicts() {
    let Some(server) = spawn_server().await else {
        return;
    };

    let student = register_user(&server, "student").await;

    let response = server
        .post("/mood")
        .json(&json!({
            "studentId": student.id,
            "mood": "bien",
            "loggedDate": "2024-05-14T09:30:00Z",
        }))
        .await;
    response.assert_status_ok();

    // Same calendar day, different time of day.
    let response = server
        .post("/mood")
        .json(&json!({
            "studentId": student.id,
            "mood": "regular",
            "loggedDate": "2024-05-14T21:45:00Z",
        }))
        .await;
    response.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn unknown_mood_values_are_rejected() {
    let Some(server) = spawn_server().await else {
        return;
    };

    let student = register_user(&server, "student").await;

    let response = server
        .post("/mood")
        .json(&json!({ "studentId": student.id, "mood": "terrible" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn mood_history_is_descending_by_date() {
    let Some(server) = spawn_server().await else {
        return;
    };

    let student = register_user(&server, "student").await;

    for logged_date in ["2024-05-13", "2024-05-15", "2024-05-14"] {
        server
            .post("/mood")
            .json(&json!({
                "studentId": student.id,
                "mood": "bien",
                "loggedDate": logged_date,
            }))
            .await
            .assert_status_ok();
    }

    let response = server.get(&format!("/mood?studentId={}", student.id)).await;
    response.assert_status_ok();

    let body: ApiResponse<Vec<MoodLogResponse>> = response.json();
    let dates: Vec<String> = body
        .data
        .expect("history payload")
        .iter()
        .map(|log| log.logged_date.to_string())
        .collect();
    assert_eq!(dates, vec!["2024-05-15", "2024-05-14", "2024-05-13"]);
}

#[tokio::test]
async fn low_moods_derive_exactly_one_alert() {
    let Some(server) = spawn_server().await else {
        return;
    };

    for (mood, expected) in [
        ("muyMal", Some("high")),
        ("mal", Some("medium")),
        ("bien", None),
    ] {
        let student = register_user(&server, "student").await;

        server
            .post("/mood")
            .json(&json!({ "studentId": student.id, "mood": mood }))
            .await
            .assert_status_ok();

        let response = server
            .get(&format!("/alerts?studentId={}", student.id))
            .await;
        response.assert_status_ok();

        let body: ApiResponse<Vec<AlertResponse>> = response.json();
        let alerts = body.data.expect("alerts payload");

        match expected {
            Some(severity) => {
                assert_eq!(alerts.len(), 1, "one alert for mood {mood}");
                assert_eq!(alerts[0].severity, severity);
                assert_eq!(alerts[0].alert_type, "mood");
            }
            None => assert!(alerts.is_empty(), "no alert for mood {mood}"),
        }
    }
}

#[tokio::test]
async fn tutor_alert_listing_attaches_the_student_name() {
    let Some(server) = spawn_server().await else {
        return;
    };

    let tutor = register_user(&server, "tutor").await;
    let (_, code) = create_group(&server, tutor.id).await;
    let student = register_user(&server, "student").await;
    join_group(&server, student.id, &code).await;

    server
        .post("/mood")
        .json(&json!({ "studentId": student.id, "mood": "muyMal" }))
        .await
        .assert_status_ok();

    let response = server.get(&format!("/alerts?tutorId={}", tutor.id)).await;
    response.assert_status_ok();

    let body: ApiResponse<Vec<TutorAlertResponse>> = response.json();
    let alerts = body.data.expect("alerts payload");
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].severity, "high");
    assert_eq!(alerts[0].student, student.name);
}

#[tokio::test]
async fn alert_listing_requires_an_owner() {
    let Some(server) = spawn_server().await else {
        return;
    };

    let response = server.get("/alerts").await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn alert_listing_for_a_tutor_without_groups_is_empty() {
    let Some(server) = spawn_server().await else {
        return;
    };

    let tutor = register_user(&server, "tutor").await;

    let response = server.get(&format!("/alerts?tutorId={}", tutor.id)).await;
    response.assert_status_ok();

    let body: ApiResponse<Vec<TutorAlertResponse>> = response.json();
    assert!(body.data.expect("alerts payload").is_empty());
}

#[tokio::test]
async fn perceptions_for_the_same_week_conflict_regardless_of_weekday() {
    let Some(server) = spawn_server().await else {
        return;
    };

    let student = register_user(&server, "student").await;

    // 2024-03-06 is a Wednesday.
    let response = server
        .post("/perception")
        .json(&json!({
            "studentId": student.id,
            "subject": "math",
            "emotion": "tranquilo",
            "weekStart": "2024-03-06",
        }))
        .await;
    response.assert_status_ok();

    // The Monday of that same week collides with the Wednesday entry.
    let response = server
        .post("/perception")
        .json(&json!({
            "studentId": student.id,
            "subject": "math",
            "emotion": "nervioso",
            "weekStart": "2024-03-04",
        }))
        .await;
    response.assert_status(StatusCode::CONFLICT);

    // A different subject in the same week is fine.
    let response = server
        .post("/perception")
        .json(&json!({
            "studentId": student.id,
            "subject": "history",
            "emotion": "tranquilo",
            "weekStart": "2024-03-06",
        }))
        .await;
    response.assert_status_ok();
}

#[tokio::test]
async fn perception_history_stores_the_normalized_monday() {
    let Some(server) = spawn_server().await else {
        return;
    };

    let student = register_user(&server, "student").await;

    server
        .post("/perception")
        .json(&json!({
            "studentId": student.id,
            "subject": "science",
            "emotion": "contento",
            "weekStart": "2024-03-06",
        }))
        .await
        .assert_status_ok();

    let response = server
        .get(&format!("/perception?studentId={}", student.id))
        .await;
    response.assert_status_ok();

    let body: ApiResponse<Vec<PerceptionResponse>> = response.json();
    let perceptions = body.data.expect("perceptions payload");
    assert_eq!(perceptions.len(), 1);
    assert_eq!(perceptions[0].week_start.to_string(), "2024-03-04");
}

#[tokio::test]
async fn justification_requires_group_membership() {
    let Some(server) = spawn_server().await else {
        return;
    };

    let tutor = register_user(&server, "tutor").await;
    let (group_id, code) = create_group(&server, tutor.id).await;
    let student = register_user(&server, "student").await;

    let request = json!({
        "studentId": student.id,
        "type": "medical",
        "groupId": group_id,
        "evidenceUrl": "https://example.com/note.pdf",
    });

    let response = server.post("/justifications").json(&request).await;
    response.assert_status(StatusCode::BAD_REQUEST);

    join_group(&server, student.id, &code).await;

    let response = server.post("/justifications").json(&request).await;
    response.assert_status_ok();

    let response = server
        .get(&format!("/justifications?studentId={}", student.id))
        .await;
    response.assert_status_ok();

    let body: ApiResponse<Vec<JustificationResponse>> = response.json();
    let justifications = body.data.expect("justifications payload");
    assert_eq!(justifications.len(), 1);
    assert_eq!(justifications[0].status, "pending");
    assert_eq!(justifications[0].kind, "medical");
}

#[tokio::test]
async fn tutor_justification_listing_attaches_the_student() {
    let Some(server) = spawn_server().await else {
        return;
    };

    let tutor = register_user(&server, "tutor").await;
    let (group_id, code) = create_group(&server, tutor.id).await;
    let student = register_user(&server, "student").await;
    join_group(&server, student.id, &code).await;

    server
        .post("/justifications")
        .json(&json!({
            "studentId": student.id,
            "type": "family",
            "groupId": group_id,
        }))
        .await
        .assert_status_ok();

    let response = server
        .get(&format!("/justifications?tutorId={}", tutor.id))
        .await;
    response.assert_status_ok();

    let body: ApiResponse<Vec<TutorJustificationResponse>> = response.json();
    let justifications = body.data.expect("justifications payload");
    assert_eq!(justifications.len(), 1);
    assert_eq!(justifications[0].student, student.name);
    assert_eq!(justifications[0].student_id, student.id);
}

#[tokio::test]
async fn review_rejects_unknown_states_and_applies_known_ones() {
    let Some(server) = spawn_server().await else {
        return;
    };

    let tutor = register_user(&server, "tutor").await;
    let (group_id, code) = create_group(&server, tutor.id).await;
    let student = register_user(&server, "student").await;
    join_group(&server, student.id, &code).await;

    server
        .post("/justifications")
        .json(&json!({
            "studentId": student.id,
            "type": "medical",
            "groupId": group_id,
        }))
        .await
        .assert_status_ok();

    let listing: ApiResponse<Vec<JustificationResponse>> = server
        .get(&format!("/justifications?studentId={}", student.id))
        .await
        .json();
    let justification_id = listing.data.expect("justifications payload")[0].id;

    let response = server
        .patch(&format!("/justifications/{justification_id}"))
        .json(&json!({ "status": "archived" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = server
        .patch(&format!("/justifications/{justification_id}"))
        .json(&json!({ "status": "approved", "reviewerId": tutor.id }))
        .await;
    response.assert_status_ok();

    let listing: ApiResponse<Vec<JustificationResponse>> = server
        .get(&format!("/justifications?studentId={}", student.id))
        .await
        .json();
    assert_eq!(listing.data.expect("justifications payload")[0].status, "approved");
}

#[tokio::test]
async fn reviewing_an_unknown_justification_still_succeeds() {
    let Some(server) = spawn_server().await else {
        return;
    };

    let response = server
        .patch(&format!("/justifications/{}", Uuid::new_v4()))
        .json(&json!({ "status": "rejected" }))
        .await;
    response.assert_status_ok();
}

#[tokio::test]
async fn direct_messages_are_listed_in_both_directions() {
    let Some(server) = spawn_server().await else {
        return;
    };

    let alice = register_user(&server, "tutor").await;
    let bob = register_user(&server, "student").await;

    for (from, to, body) in [
        (alice.id, bob.id, "How are you feeling this week?"),
        (bob.id, alice.id, "Better than last week, thanks."),
    ] {
        let response = server
            .post("/messages")
            .json(&json!({ "fromUserId": from, "toUserId": to, "body": body }))
            .await;
        response.assert_status_ok();
    }

    let response = server
        .get(&format!(
            "/messages?fromUserId={}&toUserId={}",
            alice.id, bob.id
        ))
        .await;
    response.assert_status_ok();

    let body: ApiResponse<Vec<DirectMessageResponse>> = response.json();
    let messages = body.data.expect("messages payload");
    assert_eq!(messages.len(), 2);
}

#[tokio::test]
async fn group_messages_are_scoped_to_the_group() {
    let Some(server) = spawn_server().await else {
        return;
    };

    let tutor = register_user(&server, "tutor").await;
    let (group_id, _) = create_group(&server, tutor.id).await;

    let response = server
        .post("/messages")
        .json(&json!({
            "fromUserId": tutor.id,
            "groupId": group_id,
            "body": "Remember the survey closes on Friday.",
        }))
        .await;
    response.assert_status_ok();

    let response = server.get(&format!("/messages?groupId={group_id}")).await;
    response.assert_status_ok();

    let body: ApiResponse<Vec<GroupMessageResponse>> = response.json();
    let messages = body.data.expect("messages payload");
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].group_id, group_id);
    assert_eq!(messages[0].from_user_id, tutor.id);
}

#[tokio::test]
async fn sending_without_a_recipient_or_group_is_rejected() {
    let Some(server) = spawn_server().await else {
        return;
    };

    let tutor = register_user(&server, "tutor").await;

    let response = server
        .post("/messages")
        .json(&json!({ "fromUserId": tutor.id, "body": "to nobody" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn listing_messages_requires_a_group_or_a_pair() {
    let Some(server) = spawn_server().await else {
        return;
    };

    let alice = register_user(&server, "tutor").await;

    let response = server
        .get(&format!("/messages?fromUserId={}", alice.id))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}
