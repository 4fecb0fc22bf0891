// src/sync/scheduler.rs
use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::score_client::ScoreClient;
use crate::store::ListingStore;
use crate::users::UserDirectory;

#[derive(Clone, Copy, Debug)]
pub struct SyncSchedulerCfg {
    pub interval_secs: u64,
    pub limit: usize,
}

impl Default for SyncSchedulerCfg {
    fn default() -> Self {
        Self {
            interval_secs: 4 * 3600,
            limit: 200,
        }
    }
}

/// Spawn the periodic sync task. Each tick recomputes the union of all user
/// skills through the directory (no cached module state) and runs one cycle;
/// failures are logged and absorbed, never propagated to request handlers.
pub fn spawn_sync_scheduler(
    cfg: SyncSchedulerCfg,
    store: Arc<dyn ListingStore>,
    client: Arc<dyn ScoreClient>,
    users: Arc<dyn UserDirectory>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(cfg.interval_secs.max(1)));
        // The first tick fires immediately; bootstrap_sync already covers the
        // cold start, so consume it and wait a full interval.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            run_scheduled_cycle(&cfg, store.as_ref(), client.as_ref(), users.as_ref()).await;
        }
    })
}

async fn run_scheduled_cycle(
    cfg: &SyncSchedulerCfg,
    store: &dyn ListingStore,
    client: &dyn ScoreClient,
    users: &dyn UserDirectory,
) {
    let skills = users.all_skills().await;
    if skills.is_empty() {
        info!("no user skills recorded, skipping scheduled sync");
        return;
    }

    counter!("sync_runs_total").increment(1);
    match crate::sync::sync_once(store, client, &skills, cfg.limit).await {
        Ok(report) => info!(
            target: "sync",
            added = report.added,
            updated = report.updated,
            errors = report.errors,
            "scheduled sync tick"
        ),
        Err(e) => warn!(error = %e, "scheduled sync failed"),
    }
}

/// One-off reconciliation at process start. Only runs against a cold store
/// (fewer than `low_data_threshold` listings) and uses at most the first 10
/// skills observed across users, so startup stays cheap.
pub async fn bootstrap_sync(
    store: &dyn ListingStore,
    client: &dyn ScoreClient,
    users: &dyn UserDirectory,
    low_data_threshold: usize,
    limit: usize,
) {
    let count = store.count().await;
    if count >= low_data_threshold {
        debug!(count, "store already seeded, skipping bootstrap sync");
        return;
    }

    let skills: Vec<String> = users.all_skills().await.into_iter().take(10).collect();
    if skills.is_empty() {
        info!("bootstrap sync skipped, no user skills recorded");
        return;
    }

    match crate::sync::sync_once(store, client, &skills, limit).await {
        Ok(report) => info!(
            added = report.added,
            updated = report.updated,
            errors = report.errors,
            "bootstrap sync complete"
        ),
        Err(e) => warn!(error = %e, "bootstrap sync failed, continuing with empty store"),
    }
}
