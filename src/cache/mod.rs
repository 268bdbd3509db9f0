//! Cache Module
//!
//! Namespaced TTL cache: category registry, entry model, storage seams,
//! an ordered in-memory backend, statistics and the cache operations.

mod backend;
mod category;
mod entry;
mod memory;
mod pattern;
mod service;
mod stats;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use backend::{EntryPredicate, EntryStore, StatsRecorder};
pub use category::{Category, CategoryConfig, CategoryRegistry, UnknownCategoryPolicy};
pub use entry::CacheEntry;
pub use memory::MemoryStore;
pub use pattern::KeyPattern;
pub use service::{CacheService, Lookup, SetReceipt, DEFAULT_STORAGE_TIMEOUT};
pub use stats::{CategoryStats, StatEvent, StatOperation, StatsReport};

// == Public Constants ==
/// Maximum allowed caller key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;
