//! Feedback Store Adapter
//!
//! Translates feedback records to and from the key-value backend. All
//! operations are remote-style calls: each one either completes or fails,
//! nothing is retried, and concurrent writes to the same id are last-write-wins.
//!
//! Backends:
//! - `SledFeedbackStore`: durable, path-addressed tree `{namespace}/feedback`
//! - `InMemoryFeedbackStore`: for tests and ephemeral deployments

pub mod keys;
mod memory;
mod sled_store;

pub use keys::PushKeyGenerator;
pub use memory::InMemoryFeedbackStore;
pub use sled_store::SledFeedbackStore;

use async_trait::async_trait;

use crate::types::{FeedbackRecord, FeedbackStatus, NewFeedback};

/// Collection name under the store namespace.
pub const FEEDBACK_COLLECTION: &str = "feedback";

/// Store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store read failed: {0}")]
    Read(String),
    #[error("store write failed: {0}")]
    Write(String),
    /// Write-path failure: the addressed record does not exist.
    #[error("store write failed: feedback {0} not found")]
    NotFound(String),
}

/// Trait for pluggable feedback backends.
///
/// Implementations must be thread-safe (Send + Sync) for shared access
/// across request handlers.
#[async_trait]
pub trait FeedbackStore: Send + Sync {
    /// Persist a new record with `timestamp = now` and `status = pending`.
    /// Returns the generated id.
    async fn submit(&self, feedback: NewFeedback) -> Result<String, StoreError>;

    /// All records, in no particular order.
    async fn list_all(&self) -> Result<Vec<FeedbackRecord>, StoreError>;

    /// Records whose `userId` matches.
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<FeedbackRecord>, StoreError>;

    /// Single record lookup.
    async fn get(&self, id: &str) -> Result<Option<FeedbackRecord>, StoreError>;

    /// Merge `status`, `updatedAt = now` and, when given, `adminResponse`.
    ///
    /// Does not check that the transition is legal; that is the dashboard's job.
    async fn update_status(
        &self,
        id: &str,
        status: FeedbackStatus,
        admin_response: Option<String>,
    ) -> Result<(), StoreError>;

    /// Remove a record permanently. Missing ids fail with `NotFound` and leave
    /// every other record untouched.
    async fn delete(&self, id: &str) -> Result<(), StoreError>;

    /// Backend name for logging
    fn backend_name(&self) -> &'static str;
}

/// Apply an `update_status` merge to an in-memory record.
pub(crate) fn merge_status(
    record: &mut FeedbackRecord,
    status: FeedbackStatus,
    admin_response: Option<String>,
    now_ms: i64,
) {
    record.status = status;
    record.updated_at = Some(now_ms);
    if let Some(response) = admin_response {
        record.admin_response = Some(response);
    }
}
