//! Feedback statistics engine
//!
//! Pure computation module, no storage. Derives aggregate counts and the
//! average rating from the full feedback collection. The computation is total:
//! unknown categories and statuses get their own bucket, out-of-range ratings
//! are left out of the histogram, and non-finite ratings never reach the sum.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{FeedbackCategory, FeedbackRecord, FeedbackStatus};

/// Aggregates over a feedback collection. Derived, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackStats {
    pub total: usize,
    pub by_category: BTreeMap<String, usize>,
    /// Keys 1 through 5, always present.
    pub by_rating: BTreeMap<u8, usize>,
    /// `pending`, `reviewed` and `responded` always present.
    pub by_status: BTreeMap<String, usize>,
    /// Rounded to one decimal place; 0 for an empty collection.
    pub average_rating: f64,
}

impl Default for FeedbackStats {
    fn default() -> Self {
        StatsAccumulator::new().finish()
    }
}

/// Running aggregate. `compute_stats` folds a full collection through it;
/// callers receiving a change stream can `add` records one at a time.
#[derive(Debug, Clone)]
pub struct StatsAccumulator {
    total: usize,
    by_category: BTreeMap<String, usize>,
    by_rating: BTreeMap<u8, usize>,
    by_status: BTreeMap<String, usize>,
    rating_sum: f64,
}

impl Default for StatsAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsAccumulator {
    pub fn new() -> Self {
        let by_rating = (1..=5).map(|r| (r, 0)).collect();
        let by_status = [
            FeedbackStatus::Pending,
            FeedbackStatus::Reviewed,
            FeedbackStatus::Responded,
        ]
        .iter()
        .map(|s| (s.as_key().to_string(), 0))
        .collect();

        Self {
            total: 0,
            by_category: BTreeMap::new(),
            by_rating,
            by_status,
            rating_sum: 0.0,
        }
    }

    pub fn add(&mut self, record: &FeedbackRecord) {
        self.total += 1;

        *self
            .by_category
            .entry(record.category.as_key().to_string())
            .or_insert(0) += 1;

        if let Some(bucket) = record.rating_bucket() {
            *self.by_rating.entry(bucket).or_insert(0) += 1;
        }
        if let Some(rating) = record.rating.filter(|r| r.is_finite()) {
            self.rating_sum += rating;
        }

        *self
            .by_status
            .entry(record.status.as_key().to_string())
            .or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn finish(self) -> FeedbackStats {
        let average_rating = if self.total > 0 {
            round_one_decimal(self.rating_sum / self.total as f64)
        } else {
            0.0
        };

        FeedbackStats {
            total: self.total,
            by_category: self.by_category,
            by_rating: self.by_rating,
            by_status: self.by_status,
            average_rating,
        }
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Compute stats from a full feedback collection.
pub fn compute_stats(records: &[FeedbackRecord]) -> FeedbackStats {
    let mut acc = StatsAccumulator::new();
    for record in records {
        acc.add(record);
    }
    acc.finish()
}

// ============================================================================
// Chart series
// ============================================================================

/// One labelled value for the charting component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub label: String,
    pub value: usize,
}

/// Rating distribution, "1 Star" through "5 Stars".
pub fn rating_chart(stats: &FeedbackStats) -> Vec<ChartPoint> {
    (1u8..=5)
        .map(|r| ChartPoint {
            label: if r == 1 {
                "1 Star".to_string()
            } else {
                format!("{r} Stars")
            },
            value: stats.by_rating.get(&r).copied().unwrap_or(0),
        })
        .collect()
}

/// One point per category bucket, labelled for display.
pub fn category_chart(stats: &FeedbackStats) -> Vec<ChartPoint> {
    stats
        .by_category
        .iter()
        .map(|(key, &value)| ChartPoint {
            label: FeedbackCategory::from(key.clone()).label().to_string(),
            value,
        })
        .collect()
}
