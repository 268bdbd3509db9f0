//! Detached Warm Task
//!
//! Runs a cache warm on its own tokio task so no request waits on it.

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::cache::Category;
use crate::warming::{WarmReport, Warmer};

/// Spawns a warm run for `categories` and returns immediately.
///
/// The handle may be dropped; the task keeps running and logs its outcome.
/// Awaiting the handle yields the run's report.
///
/// # Example
/// ```ignore
/// let handle = spawn_warm_task(warmer.clone(), vec![Category::Products]);
/// // Later, during shutdown:
/// handle.abort();
/// ```
pub fn spawn_warm_task(warmer: Warmer, categories: Vec<Category>) -> JoinHandle<WarmReport> {
    tokio::spawn(async move {
        info!(?categories, "Starting background cache warm");

        let report = warmer.warm(&categories).await;

        if report.already_running {
            info!("Background cache warm skipped: another run in progress");
        } else if report.skipped.is_empty() {
            info!(
                warmed = ?report.warmed,
                entries = report.entries,
                "Background cache warm finished"
            );
        } else {
            warn!(
                warmed = ?report.warmed,
                skipped = ?report.skipped,
                entries = report.entries,
                "Background cache warm finished with skipped categories"
            );
        }

        report
    })
}
