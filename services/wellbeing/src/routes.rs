use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::handlers;
use crate::services::AppState;

pub fn create_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Authentication routes
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login))
        // Group and membership routes
        .route("/groups", post(handlers::create_group))
        .route("/groups", get(handlers::list_tutor_groups))
        .route("/groups/join", post(handlers::join_group))
        .route("/groups/by-student", get(handlers::list_student_groups))
        // Daily mood routes
        .route("/mood", post(handlers::submit_mood))
        .route("/mood", get(handlers::mood_history))
        // Weekly perception routes
        .route("/perception", post(handlers::submit_perception))
        .route("/perception", get(handlers::perception_history))
        // Justification routes
        .route("/justifications", post(handlers::submit_justification))
        .route("/justifications", get(handlers::list_justifications))
        .route(
            "/justifications/:justification_id",
            patch(handlers::review_justification),
        )
        // Alert routes
        .route("/alerts", get(handlers::list_alerts))
        // Messaging routes
        .route("/messages", post(handlers::send_message))
        .route("/messages", get(handlers::list_messages))
}
