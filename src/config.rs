//! Configuration Module
//!
//! Handles loading and managing service configuration from environment variables.

use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

use crate::cache::{Category, CategoryRegistry, UnknownCategoryPolicy};

/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Per-call timeout for the backing store, in milliseconds
    pub storage_timeout_ms: u64,
    /// Reject unknown category names instead of falling back to `products`
    pub strict_categories: bool,
    /// Categories warmed by a detached task after startup
    pub warm_on_startup: Vec<Category>,
    /// Upper bound on products cached per warm run
    pub warm_product_limit: usize,
    /// JSON seed for the static catalog warm source
    pub warm_seed_path: Option<PathBuf>,
    /// Deploy-time default TTL overrides, in seconds
    pub ttl_overrides: BTreeMap<Category, u64>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `STORAGE_TIMEOUT_MS` - Backing store call timeout (default: 2000)
    /// - `STRICT_CATEGORIES` - `true` to reject unknown categories (default: false)
    /// - `WARM_ON_STARTUP` - Comma-separated categories to warm (default: none)
    /// - `WARM_PRODUCT_LIMIT` - Products per warm run (default: 100)
    /// - `WARM_SEED_PATH` - Catalog seed file (default: unset)
    /// - `CACHE_TTL_<CATEGORY>` - TTL override, e.g. `CACHE_TTL_SEARCH=900`
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            storage_timeout_ms: parse_var::<u64>("STORAGE_TIMEOUT_MS")
                .filter(|ms| *ms > 0)
                .unwrap_or(defaults.storage_timeout_ms),
            strict_categories: env::var("STRICT_CATEGORIES")
                .ok()
                .map(|v| parse_bool(&v))
                .unwrap_or(defaults.strict_categories),
            warm_on_startup: env::var("WARM_ON_STARTUP")
                .ok()
                .map(|v| parse_category_list(&v))
                .unwrap_or_default(),
            warm_product_limit: parse_var("WARM_PRODUCT_LIMIT")
                .unwrap_or(defaults.warm_product_limit),
            warm_seed_path: env::var("WARM_SEED_PATH")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            ttl_overrides: ttl_overrides_from_env(),
        }
    }

    pub fn storage_timeout(&self) -> Duration {
        Duration::from_millis(self.storage_timeout_ms)
    }

    /// Builds the immutable category registry this configuration describes.
    pub fn registry(&self) -> CategoryRegistry {
        let policy = if self.strict_categories {
            UnknownCategoryPolicy::Reject
        } else {
            UnknownCategoryPolicy::FallbackToProducts
        };
        CategoryRegistry::with_ttl_overrides(&self.ttl_overrides).with_policy(policy)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            storage_timeout_ms: 2000,
            strict_categories: false,
            warm_on_startup: Vec::new(),
            warm_product_limit: 100,
            warm_seed_path: None,
            ttl_overrides: BTreeMap::new(),
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn parse_bool(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Parses `products, categories`; unknown names are logged and dropped.
fn parse_category_list(raw: &str) -> Vec<Category> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .filter_map(|name| match name.parse::<Category>() {
            Ok(category) => Some(category),
            Err(_) => {
                warn!(category = name, "Ignoring unknown category in WARM_ON_STARTUP");
                None
            }
        })
        .collect()
}

fn ttl_overrides_from_env() -> BTreeMap<Category, u64> {
    Category::ALL
        .iter()
        .filter_map(|category| {
            let var = format!("CACHE_TTL_{}", category.as_str().to_ascii_uppercase());
            parse_var::<u64>(&var)
                .filter(|ttl| *ttl > 0)
                .map(|ttl| (*category, ttl))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.storage_timeout_ms, 2000);
        assert!(!config.strict_categories);
        assert!(config.warm_on_startup.is_empty());
        assert_eq!(config.warm_product_limit, 100);
        assert!(config.warm_seed_path.is_none());
    }

    #[test]
    fn test_config_from_env() {
        // Single test touching the environment to avoid races between tests.
        env::remove_var("SERVER_PORT");
        env::remove_var("STORAGE_TIMEOUT_MS");
        env::set_var("STRICT_CATEGORIES", "yes");
        env::set_var("WARM_ON_STARTUP", "products, bogus ,categories");
        env::set_var("CACHE_TTL_SEARCH", "900");
        env::set_var("CACHE_TTL_INVENTORY", "0");

        let config = Config::from_env();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.storage_timeout(), Duration::from_secs(2));
        assert!(config.strict_categories);
        assert_eq!(
            config.warm_on_startup,
            vec![Category::Products, Category::Categories]
        );
        assert_eq!(config.ttl_overrides.get(&Category::Search), Some(&900));
        assert!(!config.ttl_overrides.contains_key(&Category::Inventory));

        let registry = config.registry();
        assert_eq!(registry.config(Category::Search).default_ttl_seconds, 900);
        assert_eq!(registry.policy(), UnknownCategoryPolicy::Reject);

        env::remove_var("STRICT_CATEGORIES");
        env::remove_var("WARM_ON_STARTUP");
        env::remove_var("CACHE_TTL_SEARCH");
        env::remove_var("CACHE_TTL_INVENTORY");
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("TRUE"));
        assert!(parse_bool(" 1 "));
        assert!(!parse_bool("off"));
        assert!(!parse_bool(""));
    }
}
