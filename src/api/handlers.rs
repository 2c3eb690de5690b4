//! API route handlers
//!
//! Thin adapters from HTTP to the submission and dashboard flows. All
//! handlers return `Response` via [`ApiResponse`] or [`ApiErrorResponse`].

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::envelope::{ApiErrorResponse, ApiResponse};
use super::session::CurrentSession;
use crate::config::FeedbackSettings;
use crate::dashboard::{self, AdminAction, CategoryFilter, SortBy};
use crate::error::FeedbackError;
use crate::stats::{category_chart, compute_stats, rating_chart, ChartPoint};
use crate::storage::FeedbackStore;
use crate::submission::{submit_feedback, FeedbackDraft};
use crate::types::FeedbackCategory;

// ============================================================================
// API State
// ============================================================================

/// Shared state for API handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn FeedbackStore>,
    pub settings: FeedbackSettings,
}

impl AppState {
    pub fn new(store: Arc<dyn FeedbackStore>, settings: FeedbackSettings) -> Self {
        Self { store, settings }
    }
}

// ============================================================================
// Request / response types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub feedback: String,
    /// Any JSON number; range and integrality are judged in `into_draft`.
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub category: Option<String>,
}

impl SubmitRequest {
    /// Unknown category keys and off-scale ratings are rejected here rather
    /// than stored.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn into_draft(self) -> Result<FeedbackDraft, FeedbackError> {
        let rating = match self.rating {
            None => None,
            Some(r) if r.fract() == 0.0 && (1.0..=5.0).contains(&r) => Some(r as u8),
            Some(_) => return Err(FeedbackError::validation("rating out of range")),
        };
        let category = match self.category.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(key) => Some(FeedbackCategory::parse_known(key).ok_or_else(|| {
                FeedbackError::validation(format!("unknown category: {key}"))
            })?),
        };
        Ok(FeedbackDraft {
            feedback: self.feedback,
            rating,
            category,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct RespondRequest {
    pub response: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    #[serde(default)]
    pub filter: Option<String>,
    #[serde(default)]
    pub sort: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChartsResponse {
    pub rating: Vec<ChartPoint>,
    pub category: Vec<ChartPoint>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub backend: &'static str,
}

fn into_response<T: Serialize>(result: Result<T, FeedbackError>) -> Response {
    match result {
        Ok(data) => ApiResponse::ok(data),
        Err(e) => e.into_response(),
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /health
pub async fn health(State(state): State<AppState>) -> Response {
    ApiResponse::ok(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        backend: state.store.backend_name(),
    })
}

/// POST /api/v1/feedback
pub async fn submit(
    State(state): State<AppState>,
    session: CurrentSession,
    body: Result<Json<SubmitRequest>, JsonRejection>,
) -> Response {
    if session.session().is_none() {
        return FeedbackError::AuthRequired.into_response();
    }
    let Json(request) = match body {
        Ok(b) => b,
        Err(e) => return ApiErrorResponse::bad_request(e.body_text()),
    };
    let draft = match request.into_draft() {
        Ok(d) => d,
        Err(e) => return e.into_response(),
    };

    match submit_feedback(state.store.as_ref(), session.session(), &draft, &state.settings).await {
        Ok(id) => ApiResponse::created(SubmitResponse { id }),
        Err(e) => e.into_response(),
    }
}

/// GET /api/v1/feedback/mine
pub async fn list_mine(State(state): State<AppState>, session: CurrentSession) -> Response {
    into_response(dashboard::my_feedback(state.store.as_ref(), session.session()).await)
}

/// GET /api/v1/admin/feedback?filter=&sort=
pub async fn admin_list(
    State(state): State<AppState>,
    session: CurrentSession,
    Query(query): Query<DashboardQuery>,
) -> Response {
    let filter = CategoryFilter::parse(query.filter.as_deref().unwrap_or("all"));
    let sort = SortBy::parse(query.sort.as_deref().unwrap_or("newest"));
    into_response(dashboard::dashboard_view(state.store.as_ref(), session.session(), &filter, sort).await)
}

/// GET /api/v1/admin/feedback/stats
pub async fn admin_stats(State(state): State<AppState>, session: CurrentSession) -> Response {
    let result = async {
        dashboard::require_admin(session.session())?;
        let records = state.store.list_all().await?;
        Ok::<_, FeedbackError>(compute_stats(&records))
    }
    .await;
    into_response(result)
}

/// GET /api/v1/admin/feedback/charts
pub async fn admin_charts(State(state): State<AppState>, session: CurrentSession) -> Response {
    let result = async {
        dashboard::require_admin(session.session())?;
        let stats = compute_stats(&state.store.list_all().await?);
        Ok::<_, FeedbackError>(ChartsResponse {
            rating: rating_chart(&stats),
            category: category_chart(&stats),
        })
    }
    .await;
    into_response(result)
}

/// POST /api/v1/admin/feedback/:id/review
pub async fn mark_reviewed(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(id): Path<String>,
) -> Response {
    into_response(
        dashboard::apply_action(state.store.as_ref(), session.session(), &id, AdminAction::MarkReviewed).await,
    )
}

/// POST /api/v1/admin/feedback/:id/respond
pub async fn respond(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(id): Path<String>,
    body: Result<Json<RespondRequest>, JsonRejection>,
) -> Response {
    if let Err(e) = dashboard::require_admin(session.session()) {
        return e.into_response();
    }
    let Json(request) = match body {
        Ok(b) => b,
        Err(e) => return ApiErrorResponse::bad_request(e.body_text()),
    };
    into_response(
        dashboard::apply_action(
            state.store.as_ref(),
            session.session(),
            &id,
            AdminAction::Respond(request.response),
        )
        .await,
    )
}

/// DELETE /api/v1/admin/feedback/:id
pub async fn delete_feedback(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(id): Path<String>,
) -> Response {
    into_response(
        dashboard::delete_feedback(state.store.as_ref(), session.session(), &id)
            .await
            .map(|()| serde_json::json!({ "deleted": id })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_request_category_strict() {
        let req = SubmitRequest {
            feedback: "hi".to_string(),
            rating: None,
            category: Some("praise".to_string()),
        };
        assert!(matches!(req.into_draft(), Err(FeedbackError::Validation(_))));

        let req = SubmitRequest {
            feedback: "hi".to_string(),
            rating: Some(2.0),
            category: Some("bug".to_string()),
        };
        let draft = req.into_draft().unwrap();
        assert_eq!(draft.category, Some(FeedbackCategory::Bug));
        assert_eq!(draft.rating, Some(2));
    }

    #[test]
    fn test_blank_category_uses_default() {
        let req = SubmitRequest {
            feedback: "hi".to_string(),
            rating: None,
            category: Some(" ".to_string()),
        };
        assert_eq!(req.into_draft().unwrap().category, None);
    }

    #[test]
    fn test_off_scale_rating_is_validation_error() {
        for rating in [2.5, -1.0, 0.0, 6.0, 300.0, f64::NAN] {
            let req = SubmitRequest {
                feedback: "hi".to_string(),
                rating: Some(rating),
                category: None,
            };
            match req.into_draft() {
                Err(FeedbackError::Validation(msg)) => assert_eq!(msg, "rating out of range"),
                other => panic!("rating {rating}: {other:?}"),
            }
        }
    }
}
