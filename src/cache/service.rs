//! Cache Service Module
//!
//! The cache operations: get/set/delete, category clear, full flush, pattern
//! invalidation and statistics reporting. All state lives in the injected
//! backing store; the service itself only holds configuration.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::cache::{
    CacheEntry, Category, CategoryRegistry, EntryPredicate, EntryStore, KeyPattern,
    MemoryStore, StatEvent, StatOperation, StatsRecorder, StatsReport, MAX_KEY_LENGTH,
};
use crate::error::{CacheError, Result};

/// Default per-call limit on backing store round-trips.
pub const DEFAULT_STORAGE_TIMEOUT: Duration = Duration::from_secs(2);

// == Lookup ==
/// Outcome of a `get`. Misses are values, not errors.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Hit(Value),
    Miss,
    /// The entry existed but had expired; it has been purged unless a newer
    /// write replaced it in the meantime.
    Expired,
}

impl Lookup {
    pub fn is_hit(&self) -> bool {
        matches!(self, Lookup::Hit(_))
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            Lookup::Hit(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            Lookup::Hit(value) => Some(value),
            _ => None,
        }
    }
}

// == Set Receipt ==
/// Diagnostics returned by `set`.
#[derive(Debug, Clone, PartialEq)]
pub struct SetReceipt {
    pub full_key: String,
    pub expires_at: DateTime<Utc>,
}

// == Cache Service ==
/// Namespaced TTL cache over a shared backing store.
#[derive(Clone)]
pub struct CacheService {
    registry: Arc<CategoryRegistry>,
    entries: Arc<dyn EntryStore>,
    stats: Arc<dyn StatsRecorder>,
    storage_timeout: Duration,
}

impl CacheService {
    // == Constructors ==
    pub fn new(
        registry: CategoryRegistry,
        entries: Arc<dyn EntryStore>,
        stats: Arc<dyn StatsRecorder>,
    ) -> Self {
        Self {
            registry: Arc::new(registry),
            entries,
            stats,
            storage_timeout: DEFAULT_STORAGE_TIMEOUT,
        }
    }

    /// Service whose entries and statistics share one in-memory store.
    pub fn in_memory(registry: CategoryRegistry, store: Arc<MemoryStore>) -> Self {
        Self::new(registry, store.clone(), store)
    }

    pub fn with_storage_timeout(mut self, timeout: Duration) -> Self {
        self.storage_timeout = timeout;
        self
    }

    pub fn registry(&self) -> &CategoryRegistry {
        &self.registry
    }

    /// Resolves a category name through the registry.
    pub fn resolve(&self, category: &str) -> Result<Category> {
        self.registry.resolve(category)
    }

    // == Get ==
    /// Reads a key. Expired entries are deleted and reported as `Expired`.
    pub async fn get(&self, key: &str, category: Category) -> Result<Lookup> {
        validate_key(key)?;
        let full_key = self.registry.full_key(category, key);

        let Some(entry) = self.storage(self.entries.read(&full_key)).await? else {
            debug!(key = %full_key, "Cache miss");
            self.record(category, StatOperation::Miss, 1).await;
            return Ok(Lookup::Miss);
        };

        let now = Utc::now();
        if entry.is_expired_at(now) {
            // Conditional, so a set racing this read is not lost.
            let removed = self
                .storage(self.entries.delete_if_expired(&full_key, now))
                .await?;
            debug!(key = %full_key, removed, "Cache entry expired, removed on read");
            self.record(category, StatOperation::Miss, 1).await;
            return Ok(Lookup::Expired);
        }

        debug!(key = %full_key, "Cache hit");
        self.record(category, StatOperation::Hit, 1).await;
        Ok(Lookup::Hit(entry.value))
    }

    // == Set ==
    /// Writes a key with the category TTL, or `ttl_override` seconds if given.
    ///
    /// An existing entry for the same key is replaced.
    pub async fn set(
        &self,
        key: &str,
        value: Value,
        category: Category,
        ttl_override: Option<u64>,
    ) -> Result<SetReceipt> {
        validate_key(key)?;
        if ttl_override == Some(0) {
            return Err(CacheError::InvalidRequest(
                "TTL must be greater than zero".to_string(),
            ));
        }

        let ttl = ttl_override.unwrap_or(self.registry.config(category).default_ttl_seconds);
        let full_key = self.registry.full_key(category, key);
        let entry = CacheEntry::new(full_key.clone(), value, category, ttl, Utc::now());
        let expires_at = entry.expires_at;

        self.storage(self.entries.upsert(entry)).await?;
        debug!(key = %full_key, ttl, "Cached entry");
        self.record(category, StatOperation::Set, 1).await;

        Ok(SetReceipt {
            full_key,
            expires_at,
        })
    }

    // == Delete ==
    /// Removes a key. Deleting an absent key succeeds.
    pub async fn delete(&self, key: &str, category: Category) -> Result<()> {
        validate_key(key)?;
        let full_key = self.registry.full_key(category, key);
        let existed = self.storage(self.entries.delete(&full_key)).await?;
        debug!(key = %full_key, existed, "Deleted entry");
        self.record(category, StatOperation::Delete, 1).await;
        Ok(())
    }

    // == Clear Category ==
    /// Removes every entry of one category. Returns the number removed.
    pub async fn clear_category(&self, category: Category) -> Result<u64> {
        let pattern = KeyPattern::prefix(&self.registry.config(category).key_prefix);
        let removed = self.storage(self.entries.delete_matching(&pattern)).await?;
        info!(category = %category, removed, "Cleared cache category");
        if removed > 0 {
            self.record(category, StatOperation::Delete, removed).await;
        }
        Ok(removed)
    }

    // == Flush All ==
    /// Removes every entry of every category.
    pub async fn flush_all(&self) -> Result<u64> {
        let removed = self.storage(self.entries.delete_all()).await?;
        warn!(removed, "Flushed entire cache");
        Ok(removed)
    }

    // == Invalidate Pattern ==
    /// Removes the keys of `category` matching `key_pattern`.
    ///
    /// `*` and `?` are wildcards; prefix either with `\` to match it literally.
    ///
    /// Returns the full pattern applied and the number of entries removed.
    pub async fn invalidate_pattern(
        &self,
        category: Category,
        key_pattern: &str,
    ) -> Result<(String, u64)> {
        if key_pattern.is_empty() {
            return Err(CacheError::InvalidRequest(
                "Pattern cannot be empty".to_string(),
            ));
        }

        let prefix = KeyPattern::escape(&self.registry.config(category).key_prefix);
        let full_pattern = format!("{}{}", prefix, key_pattern);
        let pattern = KeyPattern::new(full_pattern.clone());
        let removed = self.storage(self.entries.delete_matching(&pattern)).await?;
        info!(pattern = %full_pattern, removed, "Invalidated cache pattern");
        if removed > 0 {
            self.record(category, StatOperation::Delete, removed).await;
        }
        Ok((full_pattern, removed))
    }

    // == Stats ==
    /// Aggregated statistics plus live/expired entry counts.
    pub async fn stats(&self) -> Result<StatsReport> {
        let now = Utc::now();
        let total_entries = self
            .storage(self.entries.count(EntryPredicate::LiveAt(now)))
            .await?;
        let expired_entries = self
            .storage(self.entries.count(EntryPredicate::ExpiredAt(now)))
            .await?;
        let totals = self.storage(self.stats.totals()).await?;

        let hit_rates = totals
            .into_iter()
            .map(|(category, stats)| (category.as_str().to_string(), stats))
            .collect();

        Ok(StatsReport {
            total_entries,
            expired_entries,
            hit_rates,
            categories: self.registry.snapshot(),
        })
    }

    // == Health Probe ==
    /// True when the backing store answers a count query.
    pub async fn storage_available(&self) -> bool {
        self.storage(self.entries.count(EntryPredicate::All))
            .await
            .is_ok()
    }

    // == Helpers ==
    /// Applies the storage timeout; an elapsed timeout is a storage error.
    async fn storage<T, F>(&self, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.storage_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(CacheError::Storage(format!(
                "backing store did not answer within {}ms",
                self.storage_timeout.as_millis()
            ))),
        }
    }

    /// Records a statistics event. Failures are logged and dropped.
    async fn record(&self, category: Category, operation: StatOperation, count: u64) {
        let event = StatEvent::with_count(category, operation, count);
        if let Err(err) = self.storage(self.stats.record(event)).await {
            warn!(category = %category, ?operation, error = %err, "Failed to record cache statistic");
        }
    }
}

// == Validation ==
fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidRequest("Key cannot be empty".to_string()));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(CacheError::InvalidRequest(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        )));
    }
    Ok(())
}
