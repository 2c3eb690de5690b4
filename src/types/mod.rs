//! Shared data structures for the feedback core
//!
//! - FeedbackRecord and its category/status enums (persisted shape)
//! - NewFeedback (validated submission payload)
//! - Session (identity supplied by the authentication provider)

mod feedback;
mod session;

pub use feedback::*;
pub use session::*;
