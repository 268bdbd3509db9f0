//! In-memory backing store.
//!
//! Entries are kept in a `BTreeMap` ordered by full key so pattern deletes
//! only walk the key range under the pattern's literal prefix. Statistics
//! events are rolled up into per-category counters as they arrive, so memory
//! use does not grow with traffic.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use crate::cache::{
    CacheEntry, Category, CategoryStats, EntryPredicate, EntryStore, KeyPattern, StatEvent,
    StatsRecorder,
};
use crate::error::{CacheError, Result};

// == Memory Store ==
/// Entry table and statistics counters held in process memory.
#[derive(Debug)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, CacheEntry>>,
    totals: RwLock<BTreeMap<Category, CategoryStats>>,
    available: AtomicBool,
}

impl MemoryStore {
    // == Constructor ==
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
            totals: RwLock::new(BTreeMap::new()),
            available: AtomicBool::new(true),
        }
    }

    // == Availability ==
    /// Takes the store on- or offline. Offline, every call fails with
    /// `CacheError::Storage`.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    fn ensure_available(&self) -> Result<()> {
        if self.is_available() {
            Ok(())
        } else {
            Err(CacheError::Storage("backing store unavailable".to_string()))
        }
    }

    // == Length ==
    /// Number of stored rows, expired ones included.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Raw row lookup with no expiry handling.
    pub async fn peek(&self, full_key: &str) -> Option<CacheEntry> {
        self.entries.read().await.get(full_key).cloned()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EntryStore for MemoryStore {
    async fn upsert(&self, entry: CacheEntry) -> Result<()> {
        self.ensure_available()?;
        let mut entries = self.entries.write().await;
        entries.insert(entry.full_key.clone(), entry);
        Ok(())
    }

    async fn read(&self, full_key: &str) -> Result<Option<CacheEntry>> {
        self.ensure_available()?;
        Ok(self.entries.read().await.get(full_key).cloned())
    }

    async fn delete(&self, full_key: &str) -> Result<bool> {
        self.ensure_available()?;
        Ok(self.entries.write().await.remove(full_key).is_some())
    }

    async fn delete_if_expired(&self, full_key: &str, now: DateTime<Utc>) -> Result<bool> {
        self.ensure_available()?;
        let mut entries = self.entries.write().await;
        match entries.get(full_key) {
            Some(entry) if entry.is_expired_at(now) => {
                entries.remove(full_key);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_matching(&self, pattern: &KeyPattern) -> Result<u64> {
        self.ensure_available()?;
        let prefix = pattern.literal_prefix();
        let mut entries = self.entries.write().await;

        let matched: Vec<String> = entries
            .range::<str, _>((Bound::Included(prefix.as_str()), Bound::Unbounded))
            .map(|(key, _)| key)
            .take_while(|key| key.starts_with(&prefix))
            .filter(|key| pattern.matches(key))
            .cloned()
            .collect();

        for key in &matched {
            entries.remove(key);
        }

        debug!(
            pattern = pattern.as_str(),
            removed = matched.len(),
            "Deleted entries by pattern"
        );
        Ok(matched.len() as u64)
    }

    async fn delete_all(&self) -> Result<u64> {
        self.ensure_available()?;
        let mut entries = self.entries.write().await;
        let removed = entries.len() as u64;
        entries.clear();
        Ok(removed)
    }

    async fn count(&self, predicate: EntryPredicate) -> Result<u64> {
        self.ensure_available()?;
        let entries = self.entries.read().await;
        Ok(entries.values().filter(|e| predicate.accepts(e)).count() as u64)
    }
}

#[async_trait]
impl StatsRecorder for MemoryStore {
    async fn record(&self, event: StatEvent) -> Result<()> {
        self.ensure_available()?;
        self.totals
            .write()
            .await
            .entry(event.category)
            .or_default()
            .accumulate(event.operation, event.count);
        Ok(())
    }

    async fn totals(&self) -> Result<BTreeMap<Category, CategoryStats>> {
        self.ensure_available()?;
        Ok(self.totals.read().await.clone())
    }
}
