//! API Routes
//!
//! Configures the Axum router with all cache service endpoints.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_handler, delete_handler, flush_handler, get_handler, health_handler,
    invalidate_handler, set_handler, stats_handler, warm_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /cache/:category/:key` - Read a cached value
/// - `PUT /cache/:category/:key` - Store a value
/// - `DELETE /cache/:category/:key` - Delete a key
/// - `POST /clear/:category` - Drop one category
/// - `POST /flush` - Drop everything
/// - `POST /invalidate` - Drop keys matching a pattern
/// - `GET /stats` - Cache statistics
/// - `POST /warm` - Warm hot categories
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router with all endpoints
    Router::new()
        .route(
            "/cache/:category/:key",
            get(get_handler).put(set_handler).delete(delete_handler),
        )
        .route("/clear/:category", post(clear_handler))
        .route("/flush", post(flush_handler))
        .route("/invalidate", post(invalidate_handler))
        .route("/stats", get(stats_handler))
        .route("/warm", post(warm_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
