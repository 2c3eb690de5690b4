//! Feedback submission flow
//!
//! Validates a draft, attaches session identifiers and writes it through the
//! store. `FeedbackForm` layers the form lifecycle on top: the draft is cleared
//! only after a successful write, a confirmation is shown for a bounded window,
//! and a failed write keeps the user's text.

use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::config::FeedbackSettings;
use crate::error::FeedbackError;
use crate::storage::FeedbackStore;
use crate::types::{FeedbackCategory, NewFeedback, Session};

/// User-entered form contents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedbackDraft {
    pub feedback: String,
    /// `None` means the user left the stars untouched.
    pub rating: Option<u8>,
    /// `None` means the default category.
    pub category: Option<FeedbackCategory>,
}

impl FeedbackDraft {
    pub fn new(feedback: impl Into<String>) -> Self {
        Self {
            feedback: feedback.into(),
            ..Self::default()
        }
    }

    pub fn with_rating(mut self, rating: u8) -> Self {
        self.rating = Some(rating);
        self
    }

    pub fn with_category(mut self, category: FeedbackCategory) -> Self {
        self.category = Some(category);
        self
    }
}

/// Check the draft and build the store payload. Does not touch the store.
pub fn prepare(
    session: &Session,
    draft: &FeedbackDraft,
    settings: &FeedbackSettings,
) -> Result<NewFeedback, FeedbackError> {
    if draft.feedback.trim().is_empty() {
        return Err(FeedbackError::validation("empty feedback"));
    }

    let rating = draft.rating.unwrap_or(settings.default_rating);
    if !(1..=5).contains(&rating) {
        return Err(FeedbackError::validation("rating out of range"));
    }

    let category = draft.category.clone().unwrap_or_default();
    if !category.is_known() {
        return Err(FeedbackError::validation(format!(
            "unknown category: {category}"
        )));
    }

    let phone_number = if session.phone_number.is_empty() {
        session.user_id.clone()
    } else {
        session.phone_number.clone()
    };

    Ok(NewFeedback {
        user_id: session.user_id.clone(),
        user_name: session.user_name.clone(),
        phone_number,
        feedback: draft.feedback.clone(),
        rating,
        category,
    })
}

/// Submit one feedback record on behalf of `session`.
///
/// Without a session this halts with `AuthRequired` so the caller can
/// redirect to login. Validation failures never reach the store.
pub async fn submit_feedback(
    store: &dyn FeedbackStore,
    session: Option<&Session>,
    draft: &FeedbackDraft,
    settings: &FeedbackSettings,
) -> Result<String, FeedbackError> {
    let session = session.ok_or(FeedbackError::AuthRequired)?;
    let payload = prepare(session, draft, settings)?;
    let category = payload.category.clone();

    let id = store.submit(payload).await.map_err(|e| {
        warn!(user = %session.user_id, error = %e, "Feedback submission failed");
        FeedbackError::from(e)
    })?;

    info!(id = %id, user = %session.user_id, category = %category, "Feedback submitted");
    Ok(id)
}

// ============================================================================
// Form lifecycle
// ============================================================================

/// What the form shows right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormState {
    /// Ready for input.
    Idle,
    /// Thank-you message; reverts to `Idle` once `until` passes.
    Confirmed { until: Instant },
    /// Inline error; the draft is untouched.
    Failed { message: String },
}

/// Stateful submission form.
///
/// `submit` takes `&mut self`, so a form cannot have two writes in flight.
#[derive(Debug, Clone)]
pub struct FeedbackForm {
    draft: FeedbackDraft,
    state: FormState,
    settings: FeedbackSettings,
}

impl FeedbackForm {
    pub fn new(settings: FeedbackSettings) -> Self {
        Self {
            draft: FeedbackDraft::default(),
            state: FormState::Idle,
            settings,
        }
    }

    pub fn draft(&self) -> &FeedbackDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut FeedbackDraft {
        &mut self.draft
    }

    /// State as of `now`, with an expired confirmation read as `Idle`.
    pub fn state(&self, now: Instant) -> FormState {
        match &self.state {
            FormState::Confirmed { until } if now >= *until => FormState::Idle,
            other => other.clone(),
        }
    }

    /// Dismiss an error or confirmation.
    pub fn dismiss(&mut self) {
        self.state = FormState::Idle;
    }

    /// Submit the current draft.
    ///
    /// `AuthRequired` leaves the form untouched; the caller redirects.
    pub async fn submit(
        &mut self,
        store: &dyn FeedbackStore,
        session: Option<&Session>,
        now: Instant,
    ) -> Result<String, FeedbackError> {
        match submit_feedback(store, session, &self.draft, &self.settings).await {
            Ok(id) => {
                self.draft = FeedbackDraft::default();
                self.state = FormState::Confirmed {
                    until: now + Duration::from_secs(self.settings.confirmation_secs),
                };
                Ok(id)
            }
            Err(FeedbackError::AuthRequired) => Err(FeedbackError::AuthRequired),
            Err(e) => {
                self.state = FormState::Failed {
                    message: e.to_string(),
                };
                Err(e)
            }
        }
    }
}
