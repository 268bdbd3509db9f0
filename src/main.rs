//! Catalog Cache - a namespaced TTL cache service
//!
//! Serves the cache operations over HTTP in front of an in-memory backing
//! store, optionally warming hot categories after startup.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use catalog_cache::api::{create_router, AppState};
use catalog_cache::config::Config;
use catalog_cache::spawn_warm_task;
use catalog_cache::warming::{StaticCatalog, WarmReport};

/// Main entry point for the cache service.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Load the catalog warm source
/// 4. Create the cache service and warmer
/// 5. Spawn the startup warm, if configured, without waiting on it
/// 6. Start HTTP server on configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "catalog_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting catalog cache service");

    let config = Config::from_env();
    info!(
        "Configuration loaded: port={}, storage_timeout={}ms, strict_categories={}, warm_on_startup={:?}",
        config.server_port, config.storage_timeout_ms, config.strict_categories, config.warm_on_startup
    );

    let catalog = match &config.warm_seed_path {
        Some(path) => StaticCatalog::from_file(path)?,
        None => StaticCatalog::default(),
    };
    info!(
        products = catalog.products.len(),
        categories = catalog.categories.len(),
        "Warm source loaded"
    );

    let state = AppState::from_config(&config, Arc::new(catalog));
    info!("Cache service initialized");

    let warm_handle = if config.warm_on_startup.is_empty() {
        None
    } else {
        Some(spawn_warm_task(
            state.warmer.clone(),
            config.warm_on_startup.clone(),
        ))
    };

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(warm_handle))
        .await
        .context("serving HTTP")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts a still-running startup warm.
async fn shutdown_signal(warm_handle: Option<tokio::task::JoinHandle<WarmReport>>) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    if let Some(handle) = warm_handle {
        if !handle.is_finished() {
            handle.abort();
            warn!("Startup cache warm aborted");
        }
    }
}
