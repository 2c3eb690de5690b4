//! API route definitions
//!
//! - /api/v1/feedback            - submit (POST)
//! - /api/v1/feedback/mine       - caller's own records
//! - /api/v1/admin/feedback      - filtered, sorted listing with stats
//! - /api/v1/admin/feedback/stats, /charts
//! - /api/v1/admin/feedback/:id  - review, respond, delete

use axum::{
    routing::{delete, get, post},
    Router,
};

use super::handlers::{self, AppState};

/// Create all versioned API routes.
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/feedback", post(handlers::submit))
        .route("/feedback/mine", get(handlers::list_mine))
        .route("/admin/feedback", get(handlers::admin_list))
        .route("/admin/feedback/stats", get(handlers::admin_stats))
        .route("/admin/feedback/charts", get(handlers::admin_charts))
        .route("/admin/feedback/:id", delete(handlers::delete_feedback))
        .route("/admin/feedback/:id/review", post(handlers::mark_reviewed))
        .route("/admin/feedback/:id/respond", post(handlers::respond))
        .with_state(state)
}

/// Unversioned health endpoint at root level
pub fn health_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .with_state(state)
}
