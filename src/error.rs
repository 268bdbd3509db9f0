//! Error types for the cache service
//!
//! Provides unified error handling using thiserror.
//!
//! Misses and lazy expiry are not errors: they are ordinary outcomes of a
//! lookup (see [`crate::cache::Lookup`]). Only failures the caller must react
//! to live here.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for the cache service.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CacheError {
    /// Backing store unreachable, erroring or timed out.
    ///
    /// Callers are expected to fail open: bypass the cache and read the
    /// source of truth.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Category name not recognised (only raised in strict mode)
    #[error("Invalid category: {0}")]
    InvalidCategory(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CacheError {
    /// True for the fail-open class of errors.
    pub fn is_storage(&self) -> bool {
        matches!(self, CacheError::Storage(_))
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            CacheError::Storage(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
            CacheError::InvalidCategory(name) => {
                (StatusCode::BAD_REQUEST, format!("Unknown category: {}", name))
            }
            CacheError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            CacheError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(ErrorResponse::new(message, self.is_storage()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache service.
pub type Result<T> = std::result::Result<T, CacheError>;
