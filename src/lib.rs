//! Catalog Cache - a namespaced TTL cache service
//!
//! Category-scoped keys with per-category expiry, lazy expiry on read,
//! hit/miss statistics, pattern invalidation and cache warming.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;
pub mod warming;

pub use api::AppState;
pub use cache::CacheService;
pub use config::Config;
pub use tasks::spawn_warm_task;
