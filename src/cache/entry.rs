//! Cache Entry Module
//!
//! Defines the stored row: namespaced key, opaque value, category and expiry.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cache::Category;

// == Cache Entry ==
/// A single stored cache row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Category prefix + caller key
    pub full_key: String,
    /// The stored value, returned unmodified
    pub value: Value,
    /// Category that produced the key
    pub category: Category,
    /// Absolute expiry; every entry has one
    pub expires_at: DateTime<Utc>,
    /// Time of the last write
    pub created_at: DateTime<Utc>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry written at `now` that lives for `ttl_seconds`.
    pub fn new(
        full_key: String,
        value: Value,
        category: Category,
        ttl_seconds: u64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            full_key,
            value,
            category,
            expires_at: expiry_from(now, ttl_seconds),
            created_at: now,
        }
    }

    // == Is Expired ==
    /// Checks whether the entry has expired at `now`.
    ///
    /// An entry is expired once `expires_at <= now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Checks expiry against the wall clock.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    // == Time To Live ==
    /// Remaining TTL in whole seconds, 0 once expired.
    pub fn ttl_remaining(&self) -> u64 {
        let remaining = self.expires_at - Utc::now();
        remaining.num_seconds().max(0) as u64
    }
}

// == Utility Functions ==
/// Absolute expiry for a TTL, saturating instead of overflowing.
pub fn expiry_from(now: DateTime<Utc>, ttl_seconds: u64) -> DateTime<Utc> {
    let ttl = i64::try_from(ttl_seconds).unwrap_or(i64::MAX);
    Duration::try_seconds(ttl)
        .and_then(|d| now.checked_add_signed(d))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
