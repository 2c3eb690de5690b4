//! News Feedback: reader feedback core for a news portal
//!
//! Signed-in readers submit rated, categorized feedback; administrators review,
//! respond to, and delete it from a dashboard backed by aggregate statistics.
//!
//! ## Architecture
//!
//! - **Storage**: `FeedbackStore` trait over a sled tree or an in-memory map
//! - **Stats**: single-pass aggregation over the full record list
//! - **Submission**: draft validation and the form lifecycle
//! - **Dashboard**: filter/sort, review state machine, admin actions
//! - **API**: axum router exposing both flows over HTTP

pub mod api;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod stats;
pub mod storage;
pub mod submission;
pub mod types;

// Re-export configuration
pub use config::{FeedbackSettings, PortalConfig};

// Re-export commonly used types
pub use types::{
    FeedbackCategory, FeedbackRecord, FeedbackStatus, NewFeedback, Session, UserType,
};

// Re-export flows
pub use dashboard::{AdminAction, CategoryFilter, DashboardView, SortBy};
pub use error::FeedbackError;
pub use stats::{compute_stats, FeedbackStats};
pub use submission::{FeedbackDraft, FeedbackForm, FormState};

// Re-export storage
pub use storage::{FeedbackStore, InMemoryFeedbackStore, SledFeedbackStore, StoreError};
