//! Error taxonomy for the feedback flows.
//!
//! No variant is fatal: every failure returns control to an idle, interactive
//! state. Malformed stored data is never an error (see [`crate::stats`]).

use crate::storage::StoreError;
use crate::types::FeedbackStatus;

/// Errors surfaced by submission and dashboard operations.
#[derive(Debug, thiserror::Error)]
pub enum FeedbackError {
    /// Bad user input, surfaced inline next to the form.
    #[error("validation error: {0}")]
    Validation(String),
    /// No session present; the caller redirects to login.
    #[error("authentication required")]
    AuthRequired,
    /// Session present but lacks the admin role.
    #[error("admin role required")]
    Forbidden,
    /// Status change not allowed by the review state machine.
    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: FeedbackStatus,
        to: FeedbackStatus,
    },
    /// Backend read/write failure, surfaced as a dismissible notification.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl FeedbackError {
    pub fn validation(msg: impl Into<String>) -> Self {
        FeedbackError::Validation(msg.into())
    }

    /// Errors the user can fix locally without contacting the backend again.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            FeedbackError::Validation(_) | FeedbackError::InvalidTransition { .. }
        )
    }

    /// Stable machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            FeedbackError::Validation(_) => "VALIDATION_ERROR",
            FeedbackError::AuthRequired => "AUTH_REQUIRED",
            FeedbackError::Forbidden => "FORBIDDEN",
            FeedbackError::InvalidTransition { .. } => "INVALID_TRANSITION",
            FeedbackError::Store(StoreError::NotFound(_)) => "NOT_FOUND",
            FeedbackError::Store(StoreError::Read(_)) => "STORE_READ_ERROR",
            FeedbackError::Store(StoreError::Write(_)) => "STORE_WRITE_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(FeedbackError::validation("empty feedback").code(), "VALIDATION_ERROR");
        assert_eq!(
            FeedbackError::from(StoreError::NotFound("abc".to_string())).code(),
            "NOT_FOUND"
        );
        assert!(FeedbackError::InvalidTransition {
            from: FeedbackStatus::Responded,
            to: FeedbackStatus::Pending,
        }
        .is_validation());
        assert!(!FeedbackError::AuthRequired.is_validation());
    }

    #[test]
    fn test_display() {
        let err = FeedbackError::InvalidTransition {
            from: FeedbackStatus::Responded,
            to: FeedbackStatus::Reviewed,
        };
        assert_eq!(err.to_string(), "invalid status transition: responded -> reviewed");
        assert_eq!(
            FeedbackError::validation("empty feedback").to_string(),
            "validation error: empty feedback"
        );
    }
}
