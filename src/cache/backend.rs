//! Storage seams for the cache service.
//!
//! The cache keeps no state of its own: entries and statistics events live in
//! a backing store reached through these traits.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::cache::{CacheEntry, Category, CategoryStats, KeyPattern, StatEvent};
use crate::error::Result;

/// Filter for [`EntryStore::count`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryPredicate {
    /// Every stored row
    All,
    /// Rows with `expires_at > at`
    LiveAt(DateTime<Utc>),
    /// Rows with `expires_at <= at` that nobody has purged yet
    ExpiredAt(DateTime<Utc>),
}

impl EntryPredicate {
    pub fn accepts(&self, entry: &CacheEntry) -> bool {
        match self {
            EntryPredicate::All => true,
            EntryPredicate::LiveAt(at) => !entry.is_expired_at(*at),
            EntryPredicate::ExpiredAt(at) => entry.is_expired_at(*at),
        }
    }
}

/// Durable table of cache entries.
///
/// Single-row `upsert` and `delete` must be atomic; nothing else is required
/// of the backend.
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// Inserts or replaces the entry with the same `full_key`.
    async fn upsert(&self, entry: CacheEntry) -> Result<()>;

    /// Reads an entry, `None` when absent.
    async fn read(&self, full_key: &str) -> Result<Option<CacheEntry>>;

    /// Removes an entry. Returns whether a row existed; absence is not an error.
    async fn delete(&self, full_key: &str) -> Result<bool>;

    /// Removes an entry only if it is still expired at `now`, checked in the
    /// same atomic step as the removal. A row rewritten since it was read is
    /// kept. Returns whether a row was removed.
    async fn delete_if_expired(&self, full_key: &str, now: DateTime<Utc>) -> Result<bool>;

    /// Removes every entry whose key matches `pattern`, returning the count.
    ///
    /// Rows already removed when a failure occurs stay removed.
    async fn delete_matching(&self, pattern: &KeyPattern) -> Result<u64>;

    /// Removes every entry in the store.
    async fn delete_all(&self) -> Result<u64>;

    async fn count(&self, predicate: EntryPredicate) -> Result<u64>;
}

/// Sink for statistics events.
///
/// Counters only ever grow. A backend may keep raw rows or roll them up on
/// write, as long as `totals` reflects every recorded event.
#[async_trait]
pub trait StatsRecorder: Send + Sync {
    async fn record(&self, event: StatEvent) -> Result<()>;

    /// Accumulated counters per category. Categories with no events are absent.
    async fn totals(&self) -> Result<BTreeMap<Category, CategoryStats>>;
}
