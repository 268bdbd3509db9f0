//! Warming Orchestrator
//!
//! Seeds hot categories from an upstream source through ordinary `set`
//! calls, so warmed entries get the category's default TTL and plain
//! last-write-wins semantics.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cache::{CacheService, Category};
use crate::error::CacheError;
use crate::warming::WarmSource;

/// Default bound on how many products a warm run caches.
pub const DEFAULT_PRODUCT_LIMIT: usize = 100;

// == Warm Report ==
/// What a warm run did.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WarmReport {
    /// Categories warmed without a source or storage failure
    pub warmed: Vec<Category>,
    /// Categories left out, with the reason
    pub skipped: Vec<(Category, String)>,
    /// Number of entries written
    pub entries: u64,
    /// Set when another run was already in flight and this one did nothing
    pub already_running: bool,
}

// == Warmer ==
/// Populates the cache from a [`WarmSource`]. At most one run at a time.
#[derive(Clone)]
pub struct Warmer {
    cache: CacheService,
    source: Arc<dyn WarmSource>,
    product_limit: usize,
    running: Arc<AtomicBool>,
}

/// Clears the in-flight flag when a run ends, however it ends.
struct RunGuard(Arc<AtomicBool>);

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Warmer {
    // == Constructor ==
    pub fn new(cache: CacheService, source: Arc<dyn WarmSource>) -> Self {
        Self {
            cache,
            source,
            product_limit: DEFAULT_PRODUCT_LIMIT,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_product_limit(mut self, limit: usize) -> Self {
        self.product_limit = limit;
        self
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Whether the source can warm `category`.
    pub fn supports(&self, category: Category) -> bool {
        self.source.supports(category)
    }

    // == Warm ==
    /// Warms each requested category in turn.
    ///
    /// A failing category is logged and skipped; the others still run.
    pub async fn warm(&self, categories: &[Category]) -> WarmReport {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            info!("Cache warm already in progress, skipping request");
            return WarmReport {
                already_running: true,
                ..WarmReport::default()
            };
        }
        let _guard = RunGuard(self.running.clone());

        let mut report = WarmReport::default();
        let mut seen = Vec::with_capacity(categories.len());

        for &category in categories {
            if seen.contains(&category) {
                continue;
            }
            seen.push(category);

            if !self.source.supports(category) {
                debug!(category = %category, "No warm source for category");
                report
                    .skipped
                    .push((category, "no warm source".to_string()));
                continue;
            }

            let mut written = 0;
            let outcome = self.warm_category(category, &mut written).await;
            report.entries += written;
            match outcome {
                Ok(()) => {
                    info!(category = %category, entries = written, "Warmed cache category");
                    report.warmed.push(category);
                }
                Err(reason) => {
                    warn!(category = %category, entries = written, error = %reason, "Cache warm failed");
                    report.skipped.push((category, reason));
                }
            }
        }

        report
    }

    /// Writes the category's hot records, counting each write in `written`.
    ///
    /// A record the cache rejects as invalid is skipped. A storage failure
    /// ends the category; records written before it stay cached and counted.
    async fn warm_category(&self, category: Category, written: &mut u64) -> Result<(), String> {
        let limit = match category {
            Category::Products => Some(self.product_limit),
            _ => None,
        };

        let records = self
            .source
            .hot_records(category, limit)
            .await
            .map_err(|e| format!("upstream fetch failed: {:#}", e))?;

        for record in records {
            match self.cache.set(&record.key, record.value, category, None).await {
                Ok(_) => *written += 1,
                Err(CacheError::InvalidRequest(reason)) => {
                    warn!(category = %category, key = %record.key, %reason, "Skipping unwarmable record");
                }
                Err(e) => return Err(format!("writing '{}' failed: {}", record.key, e)),
            }
        }
        Ok(())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CategoryRegistry, Lookup, MemoryStore};
    use crate::warming::{CatalogRecord, StaticCatalog, WarmRecord};
    use async_trait::async_trait;
    use serde_json::{json, Map};
    use std::time::Duration;

    fn record(id: &str, popularity: u64) -> CatalogRecord {
        CatalogRecord {
            id: id.to_string(),
            active: true,
            popularity,
            attributes: Map::new(),
        }
    }

    fn catalog() -> StaticCatalog {
        StaticCatalog::new(
            vec![record("p1", 1), record("p2", 9), record("p3", 5)],
            vec![record("c1", 0), record("c2", 0)],
        )
    }

    fn setup(source: Arc<dyn WarmSource>) -> (Warmer, CacheService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let cache = CacheService::in_memory(CategoryRegistry::builtin(), store.clone());
        (Warmer::new(cache.clone(), source), cache, store)
    }

    #[tokio::test]
    async fn test_warm_categories_then_hit() {
        let (warmer, cache, _) = setup(Arc::new(catalog()));

        let report = warmer.warm(&[Category::Categories]).await;
        assert_eq!(report.warmed, vec![Category::Categories]);
        assert_eq!(report.entries, 2);

        let lookup = cache.get("c2", Category::Categories).await.unwrap();
        assert!(lookup.is_hit());
    }

    #[tokio::test]
    async fn test_warm_products_respects_limit() {
        let (warmer, cache, store) = setup(Arc::new(catalog()));
        let warmer = warmer.with_product_limit(2);

        let report = warmer.warm(&[Category::Products]).await;
        assert_eq!(report.entries, 2);
        assert_eq!(store.len().await, 2);
        assert_eq!(cache.get("p1", Category::Products).await.unwrap(), Lookup::Miss);
        assert!(cache.get("p2", Category::Products).await.unwrap().is_hit());
    }

    #[tokio::test]
    async fn test_warm_uses_category_default_ttl() {
        let (warmer, _, store) = setup(Arc::new(catalog()));
        warmer.warm(&[Category::Categories]).await;

        let row = store.peek("categories:c1").await.unwrap();
        assert_eq!(
            row.expires_at - row.created_at,
            chrono::Duration::seconds(7200)
        );
    }

    #[tokio::test]
    async fn test_unsupported_category_skipped() {
        let (warmer, _, _) = setup(Arc::new(catalog()));

        let report = warmer
            .warm(&[Category::Search, Category::Categories, Category::Categories])
            .await;
        assert_eq!(report.warmed, vec![Category::Categories]);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].0, Category::Search);
    }

    #[tokio::test]
    async fn test_warm_overwrites_existing_entry() {
        let (warmer, cache, _) = setup(Arc::new(catalog()));
        cache
            .set("c1", json!("stale"), Category::Categories, None)
            .await
            .unwrap();

        warmer.warm(&[Category::Categories]).await;
        let value = cache
            .get("c1", Category::Categories)
            .await
            .unwrap()
            .into_value()
            .unwrap();
        assert_eq!(value["id"], json!("c1"));
    }

    #[tokio::test]
    async fn test_storage_outage_reported_as_skipped() {
        let (warmer, _, store) = setup(Arc::new(catalog()));
        store.set_available(false);

        let report = warmer.warm(&[Category::Products]).await;
        assert!(report.warmed.is_empty());
        assert_eq!(report.skipped[0].0, Category::Products);
        assert!(!warmer.is_running());
    }

    /// Source whose product feed is down while categories still answer.
    struct ProductsDown;

    #[async_trait]
    impl WarmSource for ProductsDown {
        fn supports(&self, _category: Category) -> bool {
            true
        }

        async fn hot_records(
            &self,
            category: Category,
            _limit: Option<usize>,
        ) -> anyhow::Result<Vec<WarmRecord>> {
            match category {
                Category::Products => anyhow::bail!("product feed unreachable"),
                _ => Ok(vec![
                    WarmRecord {
                        key: "c1".to_string(),
                        value: json!({"id": "c1"}),
                    },
                    WarmRecord {
                        key: "c2".to_string(),
                        value: json!({"id": "c2"}),
                    },
                ]),
            }
        }
    }

    #[tokio::test]
    async fn test_source_failure_does_not_stop_other_categories() {
        let (warmer, cache, _) = setup(Arc::new(ProductsDown));

        let report = warmer
            .warm(&[Category::Products, Category::Categories])
            .await;

        assert_eq!(report.warmed, vec![Category::Categories]);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].0, Category::Products);
        assert!(report.skipped[0].1.contains("product feed unreachable"));
        assert_eq!(report.entries, 2);
        assert!(cache.get("c1", Category::Categories).await.unwrap().is_hit());
        assert!(cache.get("c2", Category::Categories).await.unwrap().is_hit());
    }

    #[tokio::test]
    async fn test_invalid_record_skipped_rest_written() {
        let catalog = StaticCatalog::new(
            Vec::new(),
            vec![record("", 0), record("c1", 0), record(&"x".repeat(300), 0), record("c2", 0)],
        );
        let (warmer, cache, store) = setup(Arc::new(catalog));

        let report = warmer.warm(&[Category::Categories]).await;

        assert_eq!(report.warmed, vec![Category::Categories]);
        assert!(report.skipped.is_empty());
        assert_eq!(report.entries, 2);
        assert_eq!(store.len().await, 2);
        assert!(cache.get("c2", Category::Categories).await.unwrap().is_hit());
    }

    /// Source that blocks until released, to hold a run in flight.
    struct SlowSource(tokio::sync::Notify);

    #[async_trait]
    impl WarmSource for SlowSource {
        fn supports(&self, _category: Category) -> bool {
            true
        }

        async fn hot_records(
            &self,
            _category: Category,
            _limit: Option<usize>,
        ) -> anyhow::Result<Vec<WarmRecord>> {
            self.0.notified().await;
            Ok(vec![WarmRecord {
                key: "k".to_string(),
                value: json!(1),
            }])
        }
    }

    #[tokio::test]
    async fn test_concurrent_warm_is_skipped() {
        let source = Arc::new(SlowSource(tokio::sync::Notify::new()));
        let (warmer, _, _) = setup(source.clone());

        let first = {
            let warmer = warmer.clone();
            tokio::spawn(async move { warmer.warm(&[Category::Products]).await })
        };
        while !warmer.is_running() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let second = warmer.warm(&[Category::Products]).await;
        assert!(second.already_running);

        source.0.notify_one();
        let first = first.await.unwrap();
        assert_eq!(first.warmed, vec![Category::Products]);
        assert!(!warmer.is_running());
    }
}
