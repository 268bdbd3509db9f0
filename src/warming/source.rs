//! Upstream data sources for cache warming.

use std::path::Path;

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::cache::Category;

// == Warm Record ==
/// One upstream record to be cached under `key`.
#[derive(Debug, Clone, PartialEq)]
pub struct WarmRecord {
    pub key: String,
    pub value: Value,
}

// == Warm Source ==
/// Supplier of precomputed hot entries.
#[async_trait]
pub trait WarmSource: Send + Sync {
    /// Whether this source knows how to produce records for `category`.
    fn supports(&self, category: Category) -> bool;

    /// Ranked records for `category`, at most `limit` of them when given.
    async fn hot_records(
        &self,
        category: Category,
        limit: Option<usize>,
    ) -> anyhow::Result<Vec<WarmRecord>>;
}

// == Catalog Record ==
/// A product or category row as exported from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub id: String,
    #[serde(default = "default_active")]
    pub active: bool,
    /// Ranking signal; higher is hotter
    #[serde(default)]
    pub popularity: u64,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

fn default_active() -> bool {
    true
}

impl CatalogRecord {
    fn into_warm_record(self) -> WarmRecord {
        let key = self.id.clone();
        let value = serde_json::to_value(&self).unwrap_or(Value::Null);
        WarmRecord { key, value }
    }
}

// == Static Catalog ==
/// Catalog snapshot held in memory, optionally loaded from a JSON seed file.
///
/// Seed format: `{"products": [CatalogRecord...], "categories": [...]}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticCatalog {
    #[serde(default)]
    pub products: Vec<CatalogRecord>,
    #[serde(default)]
    pub categories: Vec<CatalogRecord>,
}

impl StaticCatalog {
    pub fn new(products: Vec<CatalogRecord>, categories: Vec<CatalogRecord>) -> Self {
        Self {
            products,
            categories,
        }
    }

    /// Loads a seed file.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading catalog seed {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("parsing catalog seed {}", path.display()))
    }
}

#[async_trait]
impl WarmSource for StaticCatalog {
    fn supports(&self, category: Category) -> bool {
        matches!(category, Category::Products | Category::Categories)
    }

    async fn hot_records(
        &self,
        category: Category,
        limit: Option<usize>,
    ) -> anyhow::Result<Vec<WarmRecord>> {
        let rows = match category {
            Category::Products => {
                let mut active: Vec<&CatalogRecord> =
                    self.products.iter().filter(|p| p.active).collect();
                // Stable sort keeps catalog order among equal popularity.
                active.sort_by(|a, b| b.popularity.cmp(&a.popularity));
                active
            }
            Category::Categories => self.categories.iter().filter(|c| c.active).collect(),
            other => anyhow::bail!("no catalog data for category {}", other),
        };

        Ok(rows
            .into_iter()
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .map(CatalogRecord::into_warm_record)
            .collect())
    }
}
