//! Admin feedback dashboard (query and action layer)
//!
//! Filtering and ordering of the live record list, the review state machine,
//! and the admin actions that drive it. Rendering is someone else's job; the
//! output here is display-ordered data plus fresh statistics.

use std::cmp::Ordering;
use std::str::FromStr;

use serde::Serialize;
use tracing::info;

use crate::error::FeedbackError;
use crate::stats::{compute_stats, FeedbackStats};
use crate::storage::{merge_status, FeedbackStore, StoreError};
use crate::types::{now_millis, FeedbackCategory, FeedbackRecord, FeedbackStatus, Session};

// ============================================================================
// Filter and sort
// ============================================================================

/// Category filter chosen in the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(FeedbackCategory),
}

impl CategoryFilter {
    /// `"all"` (or empty) keeps everything; any other value filters on that
    /// exact category key, including keys outside the fixed set.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() || raw == "all" {
            CategoryFilter::All
        } else {
            CategoryFilter::Only(FeedbackCategory::from(raw.to_string()))
        }
    }

    pub fn matches(&self, record: &FeedbackRecord) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(category) => &record.category == category,
        }
    }
}

/// Display ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    #[default]
    Newest,
    Oldest,
    HighestRating,
    LowestRating,
    /// Pending first, each group newest first.
    Pending,
}

impl SortBy {
    /// Unrecognized values fall back to `Newest`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "oldest" => SortBy::Oldest,
            "highest-rating" => SortBy::HighestRating,
            "lowest-rating" => SortBy::LowestRating,
            "pending" => SortBy::Pending,
            _ => SortBy::Newest,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortBy::Newest => "newest",
            SortBy::Oldest => "oldest",
            SortBy::HighestRating => "highest-rating",
            SortBy::LowestRating => "lowest-rating",
            SortBy::Pending => "pending",
        }
    }

    fn compare(self, a: &FeedbackRecord, b: &FeedbackRecord) -> Ordering {
        match self {
            SortBy::Newest => b.timestamp.cmp(&a.timestamp),
            SortBy::Oldest => a.timestamp.cmp(&b.timestamp),
            SortBy::HighestRating => rating_key(b).total_cmp(&rating_key(a)),
            SortBy::LowestRating => rating_key(a).total_cmp(&rating_key(b)),
            SortBy::Pending => b
                .is_pending()
                .cmp(&a.is_pending())
                .then_with(|| b.timestamp.cmp(&a.timestamp)),
        }
    }
}

impl FromStr for SortBy {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(SortBy::parse(s))
    }
}

/// Unrated or non-finite ratings sort as the lowest possible value.
fn rating_key(record: &FeedbackRecord) -> f64 {
    record
        .rating
        .filter(|r| r.is_finite())
        .unwrap_or(f64::NEG_INFINITY)
}

/// Filter then stable-sort. Equal keys keep their input order.
pub fn select(records: &[FeedbackRecord], filter: &CategoryFilter, sort: SortBy) -> Vec<FeedbackRecord> {
    let mut selected: Vec<FeedbackRecord> = records
        .iter()
        .filter(|r| filter.matches(r))
        .cloned()
        .collect();
    selected.sort_by(|a, b| sort.compare(a, b));
    selected
}

// ============================================================================
// Review state machine
// ============================================================================

/// Check a status change against the review lifecycle:
///
/// ```text
/// pending ──► reviewed ──► responded ──┐
///    └────────────────────────►  ▲     │ (edit response)
///                                └─────┘
/// ```
///
/// Nothing moves back to `pending`, and `responded` never drops to
/// `reviewed`. Records with an unrecognized stored status may be moved to
/// `reviewed` or `responded`.
pub fn validate_transition(from: &FeedbackStatus, to: &FeedbackStatus) -> Result<(), FeedbackError> {
    use FeedbackStatus::{Other, Pending, Responded, Reviewed};

    let allowed = matches!(
        (from, to),
        (Pending, Reviewed)
            | (Pending, Responded)
            | (Reviewed, Responded)
            | (Responded, Responded)
            | (Other(_), Reviewed)
            | (Other(_), Responded)
    );

    if allowed {
        Ok(())
    } else {
        Err(FeedbackError::InvalidTransition {
            from: from.clone(),
            to: to.clone(),
        })
    }
}

/// Admin action on a single record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminAction {
    MarkReviewed,
    Respond(String),
}

impl AdminAction {
    pub fn target_status(&self) -> FeedbackStatus {
        match self {
            AdminAction::MarkReviewed => FeedbackStatus::Reviewed,
            AdminAction::Respond(_) => FeedbackStatus::Responded,
        }
    }
}

/// Admin gate: no session means log in, a non-admin session is refused.
pub fn require_admin(session: Option<&Session>) -> Result<&Session, FeedbackError> {
    match session {
        None => Err(FeedbackError::AuthRequired),
        Some(s) if !s.is_admin() => Err(FeedbackError::Forbidden),
        Some(s) => Ok(s),
    }
}

/// Validate and apply an admin action. Invalid actions never reach the store.
pub async fn apply_action(
    store: &dyn FeedbackStore,
    session: Option<&Session>,
    id: &str,
    action: AdminAction,
) -> Result<FeedbackRecord, FeedbackError> {
    let admin = require_admin(session)?;

    let response = match &action {
        AdminAction::Respond(text) if text.trim().is_empty() => {
            return Err(FeedbackError::validation("empty response"));
        }
        AdminAction::Respond(text) => Some(text.clone()),
        AdminAction::MarkReviewed => None,
    };

    let current = store
        .get(id)
        .await?
        .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
    let target = action.target_status();
    validate_transition(&current.status, &target)?;

    store.update_status(id, target.clone(), response.clone()).await?;
    info!(id = %id, admin = %admin.user_id, from = %current.status, to = %target, "Feedback status changed");

    // The write has landed; report it without a second read that could fail.
    let mut updated = current;
    merge_status(&mut updated, target, response, now_millis());
    Ok(updated)
}

/// Permanently remove a record. The "are you sure" gate belongs to the caller.
pub async fn delete_feedback(
    store: &dyn FeedbackStore,
    session: Option<&Session>,
    id: &str,
) -> Result<(), FeedbackError> {
    let admin = require_admin(session)?;
    store.delete(id).await?;
    info!(id = %id, admin = %admin.user_id, "Feedback deleted");
    Ok(())
}

// ============================================================================
// Dashboard view
// ============================================================================

/// Display-ordered records plus statistics over the whole collection.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub items: Vec<FeedbackRecord>,
    pub stats: FeedbackStats,
    pub filter: String,
    pub sort: &'static str,
}

/// One full read, then filter/sort and recompute stats from scratch.
pub async fn dashboard_view(
    store: &dyn FeedbackStore,
    session: Option<&Session>,
    filter: &CategoryFilter,
    sort: SortBy,
) -> Result<DashboardView, FeedbackError> {
    require_admin(session)?;
    let records = store.list_all().await?;

    Ok(DashboardView {
        items: select(&records, filter, sort),
        stats: compute_stats(&records),
        filter: match filter {
            CategoryFilter::All => "all".to_string(),
            CategoryFilter::Only(c) => c.as_key().to_string(),
        },
        sort: sort.as_str(),
    })
}

/// Feedback written by the session's user, newest first.
pub async fn my_feedback(
    store: &dyn FeedbackStore,
    session: Option<&Session>,
) -> Result<Vec<FeedbackRecord>, FeedbackError> {
    let session = session.ok_or(FeedbackError::AuthRequired)?;
    let records = store.list_by_user(&session.user_id).await?;
    Ok(select(&records, &CategoryFilter::All, SortBy::Newest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryFeedbackStore;

    fn make_record(id: &str, rating: f64, status: FeedbackStatus, category: FeedbackCategory, ts: i64) -> FeedbackRecord {
        FeedbackRecord {
            id: id.to_string(),
            user_id: "u1".to_string(),
            user_name: "reader".to_string(),
            phone_number: "u1".to_string(),
            feedback: format!("feedback {id}"),
            rating: Some(rating),
            category,
            status,
            admin_response: None,
            timestamp: ts,
            updated_at: None,
        }
    }

    fn ids(records: &[FeedbackRecord]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    fn admin() -> Session {
        Session::new("admin-1", "admin@example.com").admin()
    }

    #[test]
    fn test_sort_parse_fallback() {
        assert_eq!(SortBy::parse("oldest"), SortBy::Oldest);
        assert_eq!(SortBy::parse("highest-rating"), SortBy::HighestRating);
        assert_eq!(SortBy::parse("random"), SortBy::Newest);
        assert_eq!(SortBy::parse(""), SortBy::Newest);
        assert_eq!("pending".parse::<SortBy>(), Ok(SortBy::Pending));
    }

    #[test]
    fn test_newest_and_pending_orders() {
        let records = vec![
            make_record("a", 5.0, FeedbackStatus::Pending, FeedbackCategory::Bug, 100),
            make_record("b", 1.0, FeedbackStatus::Responded, FeedbackCategory::Bug, 200),
        ];

        assert_eq!(ids(&select(&records, &CategoryFilter::All, SortBy::Newest)), vec!["b", "a"]);
        assert_eq!(ids(&select(&records, &CategoryFilter::All, SortBy::Pending)), vec!["a", "b"]);
    }

    #[test]
    fn test_pending_groups_each_newest_first() {
        let records = vec![
            make_record("r1", 3.0, FeedbackStatus::Reviewed, FeedbackCategory::General, 500),
            make_record("p1", 3.0, FeedbackStatus::Pending, FeedbackCategory::General, 100),
            make_record("p2", 3.0, FeedbackStatus::Pending, FeedbackCategory::General, 300),
            make_record("r2", 3.0, FeedbackStatus::Responded, FeedbackCategory::General, 400),
        ];
        let sorted = select(&records, &CategoryFilter::All, SortBy::Pending);
        assert_eq!(ids(&sorted), vec!["p2", "p1", "r1", "r2"]);
    }

    #[test]
    fn test_rating_sort_is_stable() {
        let records = vec![
            make_record("x", 4.0, FeedbackStatus::Pending, FeedbackCategory::General, 1),
            make_record("y", 2.0, FeedbackStatus::Pending, FeedbackCategory::General, 2),
            make_record("z", 4.0, FeedbackStatus::Pending, FeedbackCategory::General, 3),
        ];
        assert_eq!(ids(&select(&records, &CategoryFilter::All, SortBy::HighestRating)), vec!["x", "z", "y"]);
        assert_eq!(ids(&select(&records, &CategoryFilter::All, SortBy::LowestRating)), vec!["y", "x", "z"]);
    }

    #[test]
    fn test_unrated_sorts_lowest() {
        let mut unrated = make_record("n", 0.0, FeedbackStatus::Pending, FeedbackCategory::General, 1);
        unrated.rating = None;
        let records = vec![
            unrated,
            make_record("m", 1.0, FeedbackStatus::Pending, FeedbackCategory::General, 2),
        ];
        assert_eq!(ids(&select(&records, &CategoryFilter::All, SortBy::LowestRating)), vec!["n", "m"]);
    }

    #[test]
    fn test_category_filter() {
        let records = vec![
            make_record("a", 5.0, FeedbackStatus::Pending, FeedbackCategory::Bug, 1),
            make_record("b", 5.0, FeedbackStatus::Pending, FeedbackCategory::Content, 2),
            make_record("c", 5.0, FeedbackStatus::Pending, FeedbackCategory::Other("praise".to_string()), 3),
        ];
        assert_eq!(ids(&select(&records, &CategoryFilter::parse("bug"), SortBy::Newest)), vec!["a"]);
        assert_eq!(ids(&select(&records, &CategoryFilter::parse("praise"), SortBy::Newest)), vec!["c"]);
        assert_eq!(select(&records, &CategoryFilter::parse("all"), SortBy::Newest).len(), 3);
    }

    #[test]
    fn test_transition_table() {
        use FeedbackStatus::*;
        assert!(validate_transition(&Pending, &Reviewed).is_ok());
        assert!(validate_transition(&Pending, &Responded).is_ok());
        assert!(validate_transition(&Reviewed, &Responded).is_ok());
        assert!(validate_transition(&Responded, &Responded).is_ok());

        assert!(validate_transition(&Reviewed, &Pending).is_err());
        assert!(validate_transition(&Responded, &Pending).is_err());
        assert!(validate_transition(&Responded, &Reviewed).is_err());
        assert!(validate_transition(&Reviewed, &Reviewed).is_err());
        assert!(validate_transition(&Pending, &Pending).is_err());
        assert!(validate_transition(&Other("x".to_string()), &Reviewed).is_ok());
        assert!(validate_transition(&Other("x".to_string()), &Pending).is_err());
    }

    #[tokio::test]
    async fn test_respond_requires_text() {
        let store = InMemoryFeedbackStore::with_records(vec![make_record(
            "a", 5.0, FeedbackStatus::Pending, FeedbackCategory::Bug, 1,
        )]);
        let err = apply_action(&store, Some(&admin()), "a", AdminAction::Respond("  ".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, FeedbackError::Validation(ref m) if m == "empty response"));
        assert_eq!(store.get("a").await.unwrap().unwrap().status, FeedbackStatus::Pending);
    }

    #[tokio::test]
    async fn test_review_then_respond() {
        let store = InMemoryFeedbackStore::with_records(vec![make_record(
            "a", 5.0, FeedbackStatus::Pending, FeedbackCategory::Bug, 1,
        )]);

        let reviewed = apply_action(&store, Some(&admin()), "a", AdminAction::MarkReviewed)
            .await
            .unwrap();
        assert_eq!(reviewed.status, FeedbackStatus::Reviewed);
        assert!(reviewed.updated_at.is_some());
        assert_eq!(reviewed.admin_response, None);

        let responded = apply_action(&store, Some(&admin()), "a", AdminAction::Respond("Fixed in 2.1".to_string()))
            .await
            .unwrap();
        assert_eq!(responded.status, FeedbackStatus::Responded);
        assert_eq!(responded.admin_response.as_deref(), Some("Fixed in 2.1"));

        // Going back is rejected and leaves the record alone.
        let err = apply_action(&store, Some(&admin()), "a", AdminAction::MarkReviewed)
            .await
            .unwrap_err();
        assert!(matches!(err, FeedbackError::InvalidTransition { .. }));
        assert_eq!(store.get("a").await.unwrap().unwrap().status, FeedbackStatus::Responded);
    }

    #[tokio::test]
    async fn test_action_on_missing_record() {
        let store = InMemoryFeedbackStore::new();
        let err = apply_action(&store, Some(&admin()), "ghost", AdminAction::MarkReviewed)
            .await
            .unwrap_err();
        assert!(matches!(err, FeedbackError::Store(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_admin_gate() {
        let store = InMemoryFeedbackStore::with_records(vec![make_record(
            "a", 5.0, FeedbackStatus::Pending, FeedbackCategory::Bug, 1,
        )]);
        let reader = Session::new("u1", "reader@example.com");

        assert!(matches!(
            delete_feedback(&store, None, "a").await,
            Err(FeedbackError::AuthRequired)
        ));
        assert!(matches!(
            delete_feedback(&store, Some(&reader), "a").await,
            Err(FeedbackError::Forbidden)
        ));
        assert!(matches!(
            dashboard_view(&store, Some(&reader), &CategoryFilter::All, SortBy::Newest).await,
            Err(FeedbackError::Forbidden)
        ));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_dashboard_view_stats_cover_whole_collection() {
        let store = InMemoryFeedbackStore::with_records(vec![
            make_record("a", 5.0, FeedbackStatus::Pending, FeedbackCategory::Bug, 1),
            make_record("b", 3.0, FeedbackStatus::Reviewed, FeedbackCategory::Content, 2),
        ]);
        let view = dashboard_view(&store, Some(&admin()), &CategoryFilter::parse("bug"), SortBy::Newest)
            .await
            .unwrap();

        assert_eq!(ids(&view.items), vec!["a"]);
        assert_eq!(view.stats.total, 2);
        assert_eq!(view.filter, "bug");
        assert_eq!(view.sort, "newest");
    }

    #[tokio::test]
    async fn test_my_feedback_newest_first() {
        let mut other = make_record("o", 5.0, FeedbackStatus::Pending, FeedbackCategory::Bug, 9);
        other.user_id = "u2".to_string();
        let store = InMemoryFeedbackStore::with_records(vec![
            make_record("a", 5.0, FeedbackStatus::Pending, FeedbackCategory::Bug, 1),
            make_record("b", 3.0, FeedbackStatus::Reviewed, FeedbackCategory::Content, 2),
            other,
        ]);
        let reader = Session::new("u1", "reader@example.com");

        let mine = my_feedback(&store, Some(&reader)).await.unwrap();
        assert_eq!(ids(&mine), vec!["b", "a"]);
        assert!(matches!(my_feedback(&store, None).await, Err(FeedbackError::AuthRequired)));
    }

    /// Delegates to an in-memory store but fails every read once a write has
    /// gone through.
    struct ReadFailsAfterWrite {
        inner: InMemoryFeedbackStore,
        written: std::sync::atomic::AtomicBool,
    }

    impl ReadFailsAfterWrite {
        fn check(&self) -> Result<(), StoreError> {
            if self.written.load(std::sync::atomic::Ordering::SeqCst) {
                return Err(StoreError::Read("connection lost".to_string()));
            }
            Ok(())
        }
    }

    #[async_trait::async_trait]
    impl FeedbackStore for ReadFailsAfterWrite {
        async fn submit(&self, new: crate::types::NewFeedback) -> Result<String, StoreError> {
            self.inner.submit(new).await
        }
        async fn list_all(&self) -> Result<Vec<FeedbackRecord>, StoreError> {
            self.check()?;
            self.inner.list_all().await
        }
        async fn list_by_user(&self, user_id: &str) -> Result<Vec<FeedbackRecord>, StoreError> {
            self.check()?;
            self.inner.list_by_user(user_id).await
        }
        async fn get(&self, id: &str) -> Result<Option<FeedbackRecord>, StoreError> {
            self.check()?;
            self.inner.get(id).await
        }
        async fn update_status(&self, id: &str, status: FeedbackStatus, response: Option<String>) -> Result<(), StoreError> {
            self.inner.update_status(id, status, response).await?;
            self.written.store(true, std::sync::atomic::Ordering::SeqCst);
            Ok(())
        }
        async fn delete(&self, id: &str) -> Result<(), StoreError> {
            self.inner.delete(id).await
        }
        fn backend_name(&self) -> &'static str {
            "ReadFailsAfterWrite"
        }
    }

    #[tokio::test]
    async fn test_action_result_does_not_depend_on_a_second_read() {
        let store = ReadFailsAfterWrite {
            inner: InMemoryFeedbackStore::with_records(vec![make_record(
                "a",
                4.0,
                FeedbackStatus::Reviewed,
                FeedbackCategory::Content,
                7,
            )]),
            written: std::sync::atomic::AtomicBool::new(false),
        };

        let record = apply_action(&store, Some(&admin()), "a", AdminAction::Respond("Thanks".to_string()))
            .await
            .unwrap();
        assert_eq!(record.status, FeedbackStatus::Responded);
        assert_eq!(record.admin_response.as_deref(), Some("Thanks"));
        assert_eq!(record.timestamp, 7);
        assert!(record.updated_at.is_some());

        let stored = store.inner.get("a").await.unwrap().unwrap();
        assert_eq!(stored.status, record.status);
        assert_eq!(stored.admin_response, record.admin_response);
    }
}
