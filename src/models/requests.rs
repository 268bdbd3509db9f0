//! Request DTOs for the cache service API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;
use serde_json::Value;

use crate::cache::MAX_KEY_LENGTH;

/// Request body for the set operation (PUT /cache/:category/:key)
///
/// # Fields
/// - `value`: The value to store, any JSON
/// - `ttl`: Optional TTL in seconds (uses the category default if not specified)
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    /// The value to store
    pub value: Value,
    /// Optional TTL in seconds
    #[serde(default)]
    pub ttl: Option<u64>,
}

impl SetRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.ttl == Some(0) {
            return Some("TTL must be greater than zero".to_string());
        }
        None
    }
}

/// Request body for POST /invalidate
#[derive(Debug, Clone, Deserialize)]
pub struct InvalidateRequest {
    pub category: String,
    /// Key pattern within the category; `*` and `?` are wildcards, `\` escapes one
    pub pattern: String,
}

impl InvalidateRequest {
    pub fn validate(&self) -> Option<String> {
        if self.pattern.is_empty() {
            return Some("Pattern cannot be empty".to_string());
        }
        if self.pattern.len() > MAX_KEY_LENGTH {
            return Some(format!(
                "Pattern exceeds maximum length of {} bytes",
                MAX_KEY_LENGTH
            ));
        }
        None
    }
}

/// Request body for POST /warm
#[derive(Debug, Clone, Deserialize)]
pub struct WarmRequest {
    pub categories: Vec<String>,
    /// Run in the background and answer immediately. `false` waits for the
    /// run and reports what was written.
    #[serde(default = "default_detach")]
    pub detach: bool,
}

fn default_detach() -> bool {
    true
}

impl WarmRequest {
    pub fn validate(&self) -> Option<String> {
        if self.categories.is_empty() {
            return Some("At least one category is required".to_string());
        }
        None
    }
}
