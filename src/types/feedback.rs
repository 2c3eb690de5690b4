//! Feedback record types: FeedbackRecord, FeedbackCategory, FeedbackStatus
//!
//! Stored records come from a schemaless backend, so deserialization is
//! lenient: unknown categories and statuses are preserved verbatim, wrong-typed
//! fields are coerced rather than rejected, and a non-numeric rating reads as
//! "no rating". Records written by this crate are always well-formed.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Bucket key used when a stored record carries no category or status at all.
pub const UNKNOWN_KEY: &str = "unknown";

// ============================================================================
// Category
// ============================================================================

/// Feedback category chosen by the submitter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FeedbackCategory {
    #[default]
    General,
    Bug,
    Feature,
    Content,
    Sentiment,
    /// Value found in storage that is not part of the fixed set.
    Other(String),
}

impl FeedbackCategory {
    /// The fixed set offered to submitters, in display order.
    pub const KNOWN: [FeedbackCategory; 5] = [
        FeedbackCategory::General,
        FeedbackCategory::Bug,
        FeedbackCategory::Feature,
        FeedbackCategory::Content,
        FeedbackCategory::Sentiment,
    ];

    /// Storage key of the category.
    pub fn as_key(&self) -> &str {
        match self {
            FeedbackCategory::General => "general",
            FeedbackCategory::Bug => "bug",
            FeedbackCategory::Feature => "feature",
            FeedbackCategory::Content => "content",
            FeedbackCategory::Sentiment => "sentiment",
            FeedbackCategory::Other(raw) => raw,
        }
    }

    /// Human-readable label used by the dashboard charts.
    pub fn label(&self) -> &str {
        match self {
            FeedbackCategory::General => "General Feedback",
            FeedbackCategory::Bug => "Bug Report",
            FeedbackCategory::Feature => "Feature Request",
            FeedbackCategory::Content => "Content Quality",
            FeedbackCategory::Sentiment => "Sentiment Analysis",
            FeedbackCategory::Other(_) => "Feedback",
        }
    }

    /// Parse one of the fixed categories. Returns `None` for anything else,
    /// which is what request validation wants.
    pub fn parse_known(key: &str) -> Option<Self> {
        match Self::from(key.to_string()) {
            FeedbackCategory::Other(_) => None,
            known => Some(known),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, FeedbackCategory::Other(_))
    }
}

impl From<String> for FeedbackCategory {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "general" => FeedbackCategory::General,
            "bug" => FeedbackCategory::Bug,
            "feature" => FeedbackCategory::Feature,
            "content" => FeedbackCategory::Content,
            "sentiment" => FeedbackCategory::Sentiment,
            _ => FeedbackCategory::Other(raw),
        }
    }
}

impl From<FeedbackCategory> for String {
    fn from(category: FeedbackCategory) -> Self {
        match category {
            FeedbackCategory::Other(raw) => raw,
            known => known.as_key().to_string(),
        }
    }
}

impl std::fmt::Display for FeedbackCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_key())
    }
}

fn unknown_category() -> FeedbackCategory {
    FeedbackCategory::Other(UNKNOWN_KEY.to_string())
}

// ============================================================================
// Status
// ============================================================================

/// Review status of a feedback record.
///
/// Records start at `Pending` and only move forward through admin actions;
/// see [`crate::dashboard::validate_transition`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FeedbackStatus {
    #[default]
    Pending,
    Reviewed,
    Responded,
    /// Value found in storage that is not part of the fixed set.
    Other(String),
}

impl FeedbackStatus {
    pub fn as_key(&self) -> &str {
        match self {
            FeedbackStatus::Pending => "pending",
            FeedbackStatus::Reviewed => "reviewed",
            FeedbackStatus::Responded => "responded",
            FeedbackStatus::Other(raw) => raw,
        }
    }
}

impl From<String> for FeedbackStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "pending" => FeedbackStatus::Pending,
            "reviewed" => FeedbackStatus::Reviewed,
            "responded" => FeedbackStatus::Responded,
            _ => FeedbackStatus::Other(raw),
        }
    }
}

impl From<FeedbackStatus> for String {
    fn from(status: FeedbackStatus) -> Self {
        match status {
            FeedbackStatus::Other(raw) => raw,
            known => known.as_key().to_string(),
        }
    }
}

impl std::fmt::Display for FeedbackStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_key())
    }
}

fn unknown_status() -> FeedbackStatus {
    FeedbackStatus::Other(UNKNOWN_KEY.to_string())
}

// ============================================================================
// Lenient field decoding
// ============================================================================

/// Text of a stored value: strings as-is, anything else as its JSON form.
fn value_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Millisecond timestamp from an integer, a float or a numeric string.
#[allow(clippy::cast_possible_truncation)]
fn value_millis(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
        serde_json::Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f as i64))
        }
        _ => None,
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.map(value_text).unwrap_or_default())
}

fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.map(value_text))
}

fn lenient_category<'de, D>(deserializer: D) -> Result<FeedbackCategory, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.map_or_else(unknown_category, |v| FeedbackCategory::from(value_text(v))))
}

fn lenient_status<'de, D>(deserializer: D) -> Result<FeedbackStatus, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.map_or_else(unknown_status, |v| FeedbackStatus::from(value_text(v))))
}

/// Unreadable timestamps read as 0 so the record still sorts and counts.
fn lenient_millis<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_millis).unwrap_or(0))
}

fn lenient_opt_millis<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_millis))
}

/// Accept any JSON value; only numbers become a rating.
fn lenient_rating<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_f64()))
}

/// Integral ratings are written back as integers, matching what clients send.
#[allow(clippy::ref_option, clippy::cast_possible_truncation)]
fn integral_rating<S>(rating: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match rating {
        Some(r) if r.is_finite() && r.fract() == 0.0 => serializer.serialize_i64(*r as i64),
        Some(r) => serializer.serialize_f64(*r),
        None => serializer.serialize_none(),
    }
}

// ============================================================================
// Records
// ============================================================================

/// A single persisted feedback submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRecord {
    /// Store-assigned push key. Always overwritten with the storage key on read.
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub user_id: String,
    /// Display name or email captured from the session.
    #[serde(default, deserialize_with = "lenient_string")]
    pub user_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub phone_number: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub feedback: String,
    #[serde(
        default,
        deserialize_with = "lenient_rating",
        serialize_with = "integral_rating"
    )]
    pub rating: Option<f64>,
    #[serde(default = "unknown_category", deserialize_with = "lenient_category")]
    pub category: FeedbackCategory,
    #[serde(default = "unknown_status", deserialize_with = "lenient_status")]
    pub status: FeedbackStatus,
    #[serde(
        default,
        deserialize_with = "lenient_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub admin_response: Option<String>,
    /// Creation time, milliseconds since the Unix epoch.
    #[serde(default, deserialize_with = "lenient_millis")]
    pub timestamp: i64,
    /// Last status/response change, milliseconds since the Unix epoch.
    #[serde(
        default,
        deserialize_with = "lenient_opt_millis",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<i64>,
}

impl FeedbackRecord {
    /// Rating as a histogram bucket: only integral values in [1,5].
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn rating_bucket(&self) -> Option<u8> {
        match self.rating {
            Some(r) if r.fract() == 0.0 && (1.0..=5.0).contains(&r) => Some(r as u8),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == FeedbackStatus::Pending
    }
}

/// Validated submission payload handed to [`crate::storage::FeedbackStore::submit`].
///
/// The store stamps `timestamp` and `status`; everything else comes from here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFeedback {
    pub user_id: String,
    pub user_name: String,
    pub phone_number: String,
    pub feedback: String,
    pub rating: u8,
    pub category: FeedbackCategory,
}

impl NewFeedback {
    /// Materialize the stored record under `id`, created at `now_ms`.
    pub fn into_record(self, id: String, now_ms: i64) -> FeedbackRecord {
        FeedbackRecord {
            id,
            user_id: self.user_id,
            user_name: self.user_name,
            phone_number: self.phone_number,
            feedback: self.feedback,
            rating: Some(f64::from(self.rating)),
            category: self.category,
            status: FeedbackStatus::Pending,
            admin_response: None,
            timestamp: now_ms,
            updated_at: None,
        }
    }
}

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
