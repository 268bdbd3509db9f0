//! API Module
//!
//! HTTP handlers and routing for the cache service REST API.
//!
//! # Endpoints
//! - `GET|PUT|DELETE /cache/:category/:key` - Read, store or delete a key
//! - `POST /clear/:category` - Clear one category
//! - `POST /flush` - Clear every category
//! - `POST /invalidate` - Pattern invalidation
//! - `GET /stats` - Cache statistics
//! - `POST /warm` - Cache warming
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
