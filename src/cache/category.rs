//! Category Registry Module
//!
//! Maps logical cache categories to a key prefix and a default TTL.
//! The registry is built once at startup and never mutated afterwards.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{CacheError, Result};

// == Category ==
/// Logical grouping of cache keys sharing a prefix and default TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Products,
    Categories,
    Search,
    #[serde(alias = "sessions")]
    UserSessions,
    Analytics,
    Recommendations,
    VendorData,
    Inventory,
    Commission,
    ShippingRates,
}

impl Category {
    /// Every known category, in registry order.
    pub const ALL: [Category; 10] = [
        Category::Products,
        Category::Categories,
        Category::Search,
        Category::UserSessions,
        Category::Analytics,
        Category::Recommendations,
        Category::VendorData,
        Category::Inventory,
        Category::Commission,
        Category::ShippingRates,
    ];

    /// Snake-case name used on the wire and in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Products => "products",
            Category::Categories => "categories",
            Category::Search => "search",
            Category::UserSessions => "user_sessions",
            Category::Analytics => "analytics",
            Category::Recommendations => "recommendations",
            Category::VendorData => "vendor_data",
            Category::Inventory => "inventory",
            Category::Commission => "commission",
            Category::ShippingRates => "shipping_rates",
        }
    }

    /// Compiled-in default TTL in seconds.
    pub fn builtin_ttl(&self) -> u64 {
        match self {
            Category::Products => 3600,
            Category::Categories => 7200,
            Category::Search => 1800,
            Category::UserSessions => 86400,
            Category::Analytics => 300,
            Category::Recommendations => 1800,
            Category::VendorData => 3600,
            Category::Inventory => 600,
            Category::Commission => 7200,
            Category::ShippingRates => 3600,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase();
        if normalized == "sessions" {
            return Ok(Category::UserSessions);
        }
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| CacheError::InvalidCategory(s.to_string()))
    }
}

// == Category Config ==
/// Prefix and default expiry for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryConfig {
    /// Prepended to caller keys to form the stored key
    pub key_prefix: String,
    /// Default TTL in seconds, always > 0
    pub default_ttl_seconds: u64,
}

// == Unknown Category Policy ==
/// What to do with a category name that is not in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownCategoryPolicy {
    /// Use the `products` configuration and log a warning
    #[default]
    FallbackToProducts,
    /// Reject with `CacheError::InvalidCategory`
    Reject,
}

// == Category Registry ==
/// Immutable category table, injected into the cache service.
#[derive(Debug, Clone)]
pub struct CategoryRegistry {
    configs: BTreeMap<Category, CategoryConfig>,
    policy: UnknownCategoryPolicy,
}

impl CategoryRegistry {
    // == Constructors ==
    /// Registry with the compiled-in prefixes and TTLs.
    pub fn builtin() -> Self {
        Self::with_ttl_overrides(&BTreeMap::new())
    }

    /// Registry with compiled-in prefixes and deploy-time TTL overrides.
    ///
    /// Overrides of zero are ignored so no category ends up without expiry.
    pub fn with_ttl_overrides(overrides: &BTreeMap<Category, u64>) -> Self {
        let configs = Category::ALL
            .iter()
            .map(|category| {
                let ttl = match overrides.get(category) {
                    Some(&ttl) if ttl > 0 => ttl,
                    Some(_) => {
                        warn!(category = %category, "Ignoring zero TTL override");
                        category.builtin_ttl()
                    }
                    None => category.builtin_ttl(),
                };
                (
                    *category,
                    CategoryConfig {
                        key_prefix: format!("{}:", category.as_str()),
                        default_ttl_seconds: ttl,
                    },
                )
            })
            .collect();

        Self {
            configs,
            policy: UnknownCategoryPolicy::default(),
        }
    }

    /// Sets the policy for unrecognised category names.
    pub fn with_policy(mut self, policy: UnknownCategoryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> UnknownCategoryPolicy {
        self.policy
    }

    // == Lookup ==
    /// Configuration for a known category.
    pub fn config(&self, category: Category) -> &CategoryConfig {
        // Every variant is inserted by the constructor.
        &self.configs[&category]
    }

    /// Resolves a caller-supplied category name.
    ///
    /// Unknown names resolve to `products` unless the registry is strict.
    pub fn resolve(&self, name: &str) -> Result<Category> {
        match name.parse::<Category>() {
            Ok(category) => Ok(category),
            Err(err) => match self.policy {
                UnknownCategoryPolicy::FallbackToProducts => {
                    warn!(category = name, "Unknown cache category, using products");
                    Ok(Category::Products)
                }
                UnknownCategoryPolicy::Reject => Err(err),
            },
        }
    }

    /// Builds the stored key for a caller key.
    pub fn full_key(&self, category: Category, key: &str) -> String {
        format!("{}{}", self.config(category).key_prefix, key)
    }

    /// All category configurations keyed by name, for reporting.
    pub fn snapshot(&self) -> BTreeMap<String, CategoryConfig> {
        self.configs
            .iter()
            .map(|(category, config)| (category.as_str().to_string(), config.clone()))
            .collect()
    }
}

impl Default for CategoryRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
