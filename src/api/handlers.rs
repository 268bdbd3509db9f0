//! API Handlers
//!
//! HTTP request handlers for each cache service endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use tracing::info;

use crate::cache::{CacheService, Category, MemoryStore, StatsReport};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    ClearResponse, DeleteResponse, GetResponse, HealthResponse, InvalidateRequest,
    InvalidateResponse, SetRequest, SetResponse, WarmRequest, WarmResponse,
};
use crate::tasks::spawn_warm_task;
use crate::warming::{WarmSource, Warmer};

/// Application state shared across all handlers.
///
/// Both members are cheap to clone; all cache state lives in the backing store.
#[derive(Clone)]
pub struct AppState {
    pub cache: CacheService,
    pub warmer: Warmer,
}

impl AppState {
    /// Creates a new AppState with the given cache service and warm source.
    pub fn new(cache: CacheService, source: Arc<dyn WarmSource>) -> Self {
        let warmer = Warmer::new(cache.clone(), source);
        Self { cache, warmer }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Uses an in-memory backing store.
    pub fn from_config(config: &Config, source: Arc<dyn WarmSource>) -> Self {
        let store = Arc::new(MemoryStore::new());
        let cache = CacheService::in_memory(config.registry(), store)
            .with_storage_timeout(config.storage_timeout());
        let warmer =
            Warmer::new(cache.clone(), source).with_product_limit(config.warm_product_limit);
        Self { cache, warmer }
    }
}

/// Handler for GET /cache/:category/:key
pub async fn get_handler(
    State(state): State<AppState>,
    Path((category, key)): Path<(String, String)>,
) -> Result<Json<GetResponse>> {
    let category = state.cache.resolve(&category)?;
    let lookup = state.cache.get(&key, category).await?;

    Ok(Json(GetResponse::from_lookup(lookup)))
}

/// Handler for PUT /cache/:category/:key
pub async fn set_handler(
    State(state): State<AppState>,
    Path((category, key)): Path<(String, String)>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    // Validate request
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let category = state.cache.resolve(&category)?;
    let receipt = state.cache.set(&key, req.value, category, req.ttl).await?;

    Ok(Json(receipt.into()))
}

/// Handler for DELETE /cache/:category/:key
pub async fn delete_handler(
    State(state): State<AppState>,
    Path((category, key)): Path<(String, String)>,
) -> Result<Json<DeleteResponse>> {
    let category = state.cache.resolve(&category)?;
    state.cache.delete(&key, category).await?;

    Ok(Json(DeleteResponse::new()))
}

/// Handler for POST /clear/:category
pub async fn clear_handler(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<Json<ClearResponse>> {
    let category = state.cache.resolve(&category)?;
    let removed = state.cache.clear_category(category).await?;

    Ok(Json(ClearResponse::category(category, removed)))
}

/// Handler for POST /flush
///
/// Drops every entry of every category.
pub async fn flush_handler(State(state): State<AppState>) -> Result<Json<ClearResponse>> {
    let removed = state.cache.flush_all().await?;

    Ok(Json(ClearResponse::all(removed)))
}

/// Handler for POST /invalidate
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Json(req): Json<InvalidateRequest>,
) -> Result<Json<InvalidateResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let category = state.cache.resolve(&req.category)?;
    let (pattern, removed) = state.cache.invalidate_pattern(category, &req.pattern).await?;

    Ok(Json(InvalidateResponse::new(pattern, removed)))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Result<Json<StatsReport>> {
    Ok(Json(state.cache.stats().await?))
}

/// Handler for POST /warm
///
/// The run always happens on its own task, so a dropped client connection
/// does not cut it short. By default the handler answers without waiting;
/// `detach: false` waits for the run and returns its report.
pub async fn warm_handler(
    State(state): State<AppState>,
    Json(req): Json<WarmRequest>,
) -> Result<Json<WarmResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let mut categories: Vec<Category> = Vec::with_capacity(req.categories.len());
    for name in &req.categories {
        let category = state.cache.resolve(name)?;
        if !categories.contains(&category) {
            categories.push(category);
        }
    }

    let handle = spawn_warm_task(state.warmer.clone(), categories.clone());

    if req.detach {
        let (accepted, skipped): (Vec<_>, Vec<_>) = categories
            .into_iter()
            .partition(|c| state.warmer.supports(*c));
        info!(?accepted, "Cache warm detached");
        return Ok(Json(WarmResponse::detached(accepted, skipped)));
    }

    let report = handle
        .await
        .map_err(|e| CacheError::Internal(format!("warm task failed: {}", e)))?;
    Ok(Json(WarmResponse::from_report(report)))
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let storage_up = state.cache.storage_available().await;
    Json(HealthResponse::healthy(storage_up))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CategoryRegistry;
    use crate::warming::StaticCatalog;
    use serde_json::json;

    fn state() -> (AppState, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let cache = CacheService::in_memory(CategoryRegistry::builtin(), store.clone());
        (AppState::new(cache, Arc::new(StaticCatalog::default())), store)
    }

    fn path(category: &str, key: &str) -> Path<(String, String)> {
        Path((category.to_string(), key.to_string()))
    }

    #[tokio::test]
    async fn test_set_and_get_handler() {
        let (state, _) = state();

        let req = SetRequest {
            value: json!({"name": "Widget"}),
            ttl: None,
        };
        let response = set_handler(State(state.clone()), path("products", "prod-42"), Json(req))
            .await
            .unwrap();
        assert_eq!(response.key, "products:prod-42");

        let response = get_handler(State(state), path("products", "prod-42"))
            .await
            .unwrap();
        assert!(response.success);
        assert_eq!(response.data, Some(json!({"name": "Widget"})));
    }

    #[tokio::test]
    async fn test_get_nonexistent_key_is_ok_miss() {
        let (state, _) = state();

        let response = get_handler(State(state), path("search", "nonexistent"))
            .await
            .unwrap();
        assert!(!response.success);
        assert!(!response.cached);
    }

    #[tokio::test]
    async fn test_delete_nonexistent_key() {
        let (state, _) = state();

        let response = delete_handler(State(state), path("products", "ghost"))
            .await
            .unwrap();
        assert!(response.success);
        assert!(response.deleted);
    }

    #[tokio::test]
    async fn test_set_invalid_request() {
        let (state, _) = state();

        let req = SetRequest {
            value: json!(1),
            ttl: Some(0),
        };
        let result = set_handler(State(state), path("products", "k"), Json(req)).await;
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_storage_outage_surfaces_error() {
        let (state, store) = state();
        store.set_available(false);

        let result = get_handler(State(state.clone()), path("products", "k")).await;
        assert!(matches!(result, Err(CacheError::Storage(_))));

        let health = health_handler(State(state)).await;
        assert_eq!(health.status, "healthy");
        assert_eq!(health.storage, "down");
    }

    #[tokio::test]
    async fn test_warm_handler_detached() {
        let (state, _) = state();

        let req = WarmRequest {
            categories: vec!["categories".to_string(), "search".to_string()],
            detach: true,
        };
        let response = warm_handler(State(state), Json(req)).await.unwrap();
        assert!(response.detached);
        assert_eq!(response.warmed, vec![Category::Categories]);
        assert_eq!(response.skipped, vec![Category::Search]);
    }

    #[tokio::test]
    async fn test_warm_handler_waits_when_asked() {
        let (state, store) = state();

        let req = WarmRequest {
            categories: vec!["categories".to_string()],
            detach: false,
        };
        let response = warm_handler(State(state), Json(req)).await.unwrap();
        assert!(!response.detached);
        assert_eq!(response.warmed, vec![Category::Categories]);
        // The default catalog is empty; the run still completes.
        assert!(store.is_empty().await);
    }
}
