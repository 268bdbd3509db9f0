//! Cache Warming Module
//!
//! Proactively populates hot categories from upstream data so first requests
//! do not pay the full miss cost. Warming is optional: the cache is correct,
//! only colder, without it.

mod orchestrator;
mod source;

pub use orchestrator::{WarmReport, Warmer, DEFAULT_PRODUCT_LIMIT};
pub use source::{CatalogRecord, StaticCatalog, WarmRecord, WarmSource};
