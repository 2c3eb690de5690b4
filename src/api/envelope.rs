//! Consistent response envelope for all API endpoints.
//!
//! Every response is wrapped in either [`ApiResponse`] (success) or
//! [`ApiErrorResponse`] (error), ensuring a uniform JSON shape.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde::Serialize;

use crate::error::FeedbackError;
use crate::storage::StoreError;

/// Metadata included in every response.
#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub timestamp: String,
    pub version: &'static str,
}

impl Default for ResponseMeta {
    fn default() -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            version: "1",
        }
    }
}

/// Successful response: `{ "data": T, "meta": { ... } }`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Response {
        Self::with_status(StatusCode::OK, data)
    }

    pub fn created(data: T) -> Response {
        Self::with_status(StatusCode::CREATED, data)
    }

    fn with_status(status: StatusCode, data: T) -> Response {
        let body = Self {
            data,
            meta: ResponseMeta::default(),
        };
        (status, axum::Json(body)).into_response()
    }
}

/// Error detail inside [`ApiErrorResponse`].
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

/// Error response: `{ "error": { "code": "...", "message": "..." }, "meta": { ... } }`
#[derive(Debug, Serialize)]
pub struct ApiErrorResponse {
    pub error: ErrorDetail,
    pub meta: ResponseMeta,
}

impl ApiErrorResponse {
    fn build(status: StatusCode, code: &str, msg: impl Into<String>) -> Response {
        let body = Self {
            error: ErrorDetail {
                code: code.to_string(),
                message: msg.into(),
            },
            meta: ResponseMeta::default(),
        };
        (status, axum::Json(body)).into_response()
    }

    pub fn bad_request(msg: impl Into<String>) -> Response {
        Self::build(StatusCode::BAD_REQUEST, "BAD_REQUEST", msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Response {
        Self::build(StatusCode::NOT_FOUND, "NOT_FOUND", msg)
    }

    /// Map a flow error onto its HTTP status, keeping the error's own code.
    pub fn from_error(err: &FeedbackError) -> Response {
        let status = match err {
            FeedbackError::Validation(_) | FeedbackError::InvalidTransition { .. } => {
                StatusCode::BAD_REQUEST
            }
            FeedbackError::AuthRequired => StatusCode::UNAUTHORIZED,
            FeedbackError::Forbidden => StatusCode::FORBIDDEN,
            FeedbackError::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            FeedbackError::Store(_) => StatusCode::BAD_GATEWAY,
        };
        Self::build(status, err.code(), err.to_string())
    }
}

impl IntoResponse for FeedbackError {
    fn into_response(self) -> Response {
        ApiErrorResponse::from_error(&self)
    }
}
