//! Cache Statistics Module
//!
//! Every operation emits a statistics event; backends fold the events into
//! per-category hit/miss/set/delete counters.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::{Category, CategoryConfig};

// == Stat Operation ==
/// Operation kinds that produce a statistics event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatOperation {
    Hit,
    Miss,
    Set,
    Delete,
}

// == Stat Event ==
/// One append-only statistics record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatEvent {
    pub category: Category,
    pub operation: StatOperation,
    pub count: u64,
    pub timestamp: DateTime<Utc>,
}

impl StatEvent {
    /// A single occurrence of `operation`, timestamped now.
    pub fn new(category: Category, operation: StatOperation) -> Self {
        Self::with_count(category, operation, 1)
    }

    pub fn with_count(category: Category, operation: StatOperation, count: u64) -> Self {
        Self {
            category,
            operation,
            count,
            timestamp: Utc::now(),
        }
    }
}

// == Category Stats ==
/// Aggregated counters for one category.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategoryStats {
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of failed retrievals (absent or expired)
    pub misses: u64,
    pub sets: u64,
    pub deletes: u64,
    /// hits / (hits + misses), 0 when nothing was read
    pub hit_rate: f64,
}

impl CategoryStats {
    // == Constructor ==
    /// Creates a CategoryStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no reads have been made.
    pub fn compute_hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    // == Accumulate ==
    /// Adds an event's count to the matching counter.
    pub fn accumulate(&mut self, operation: StatOperation, count: u64) {
        let counter = match operation {
            StatOperation::Hit => &mut self.hits,
            StatOperation::Miss => &mut self.misses,
            StatOperation::Set => &mut self.sets,
            StatOperation::Delete => &mut self.deletes,
        };
        *counter = counter.saturating_add(count);
        self.hit_rate = self.compute_hit_rate();
    }
}

// == Stats Report ==
/// Output of the `stats` operation.
#[derive(Debug, Clone, Serialize)]
pub struct StatsReport {
    /// Entries that have not yet expired
    pub total_entries: u64,
    /// Entries past expiry that no read or clear has purged yet
    pub expired_entries: u64,
    pub hit_rates: BTreeMap<String, CategoryStats>,
    pub categories: BTreeMap<String, CategoryConfig>,
}
