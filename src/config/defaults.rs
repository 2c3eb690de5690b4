//! System-wide default constants.
//!
//! Grouped by subsystem for easy discovery.

// ============================================================================
// Server
// ============================================================================

/// HTTP bind address.
pub const SERVER_ADDR: &str = "0.0.0.0:8080";

/// Largest accepted request body (bytes). Feedback text is short.
pub const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024;

// ============================================================================
// Storage
// ============================================================================

/// Sled database directory.
pub const STORAGE_PATH: &str = "./data/news_feedback.db";

/// Root namespace of the key tree; collections live at `{namespace}/users`,
/// `{namespace}/news` and `{namespace}/feedback`.
pub const STORAGE_NAMESPACE: &str = "NewsSentimentAnalysis";

// ============================================================================
// Feedback
// ============================================================================

/// Rating applied when the submitter leaves the stars untouched.
pub const DEFAULT_RATING: u8 = 5;

/// How long the "thank you" confirmation stays up before the form resets.
pub const CONFIRMATION_SECS: u64 = 3;

/// Upper bound for the confirmation window accepted by validation.
pub const MAX_CONFIRMATION_SECS: u64 = 60;

// ============================================================================
// Config discovery
// ============================================================================

/// Environment variable naming the config file.
pub const CONFIG_ENV_VAR: &str = "NEWS_FEEDBACK_CONFIG";

/// Config file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "news_feedback.toml";
