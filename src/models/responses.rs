//! Response DTOs for the cache service API
//!
//! Defines the structure of outgoing HTTP response bodies.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::cache::{Category, Lookup, SetReceipt};
use crate::warming::WarmReport;

/// Response body for the get operation (GET /cache/:category/:key)
///
/// A miss is a successful request with `success: false`.
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    pub success: bool,
    /// The stored value, null on a miss
    pub data: Option<Value>,
    pub cached: bool,
    /// Present only when the entry was found expired and removed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expired: Option<bool>,
}

impl GetResponse {
    pub fn from_lookup(lookup: Lookup) -> Self {
        match lookup {
            Lookup::Hit(value) => Self {
                success: true,
                data: Some(value),
                cached: true,
                expired: None,
            },
            Lookup::Miss => Self {
                success: false,
                data: None,
                cached: false,
                expired: None,
            },
            Lookup::Expired => Self {
                success: false,
                data: None,
                cached: false,
                expired: Some(true),
            },
        }
    }
}

/// Response body for the set operation (PUT /cache/:category/:key)
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    pub success: bool,
    /// The full, prefixed key that was written
    pub key: String,
    pub expires_at: DateTime<Utc>,
}

impl From<SetReceipt> for SetResponse {
    fn from(receipt: SetReceipt) -> Self {
        Self {
            success: true,
            key: receipt.full_key,
            expires_at: receipt.expires_at,
        }
    }
}

/// Response body for the delete operation (DELETE /cache/:category/:key)
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub deleted: bool,
}

impl DeleteResponse {
    pub fn new() -> Self {
        Self {
            success: true,
            deleted: true,
        }
    }
}

impl Default for DeleteResponse {
    fn default() -> Self {
        Self::new()
    }
}

/// Response body for POST /clear/:category and POST /flush
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    pub success: bool,
    /// Category name, or "all" for a full flush
    pub cleared: String,
    pub removed: u64,
}

impl ClearResponse {
    pub fn category(category: Category, removed: u64) -> Self {
        Self {
            success: true,
            cleared: category.as_str().to_string(),
            removed,
        }
    }

    pub fn all(removed: u64) -> Self {
        Self {
            success: true,
            cleared: "all".to_string(),
            removed,
        }
    }
}

/// Response body for POST /invalidate
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    pub success: bool,
    pub invalidated_pattern: String,
    pub removed: u64,
}

impl InvalidateResponse {
    pub fn new(invalidated_pattern: String, removed: u64) -> Self {
        Self {
            success: true,
            invalidated_pattern,
            removed,
        }
    }
}

/// Response body for POST /warm
#[derive(Debug, Clone, Serialize)]
pub struct WarmResponse {
    /// False only when another warm run was already in flight
    pub success: bool,
    pub warmed: Vec<Category>,
    /// True when the run was handed to a background task
    pub detached: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<Category>,
}

impl WarmResponse {
    pub fn from_report(report: WarmReport) -> Self {
        Self {
            success: !report.already_running,
            warmed: report.warmed,
            detached: false,
            skipped: report.skipped.into_iter().map(|(c, _)| c).collect(),
        }
    }

    /// Answer for a run spawned in the background.
    pub fn detached(accepted: Vec<Category>, skipped: Vec<Category>) -> Self {
        Self {
            success: true,
            warmed: accepted,
            detached: true,
            skipped,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// "up" when the backing store answers, "down" otherwise
    pub storage: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp.
    ///
    /// The service itself stays healthy when storage is down: callers fail
    /// open and keep serving from the source of truth.
    pub fn healthy(storage_up: bool) -> Self {
        Self {
            status: "healthy".to_string(),
            storage: if storage_up { "up" } else { "down" }.to_string(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    /// Error message describing what went wrong
    pub error: String,
    pub storage_error: bool,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, storage_error: bool) -> Self {
        Self {
            success: false,
            error: error.into(),
            storage_error,
        }
    }
}
