//! Job Recommender — Binary Entrypoint
//! Boots the Axum HTTP server, wiring shared state, the sync scheduler and
//! the background persist worker.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::routing::get;
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use job_recommender::api::{create_router, AppState};
use job_recommender::config::Settings;
use job_recommender::persist;
use job_recommender::score_client::{HttpScoreClient, ScoreClient};
use job_recommender::store::{ListingStore, MemoryStore};
use job_recommender::sync::scheduler::{self, SyncSchedulerCfg};
use job_recommender::users::{MemoryUserDirectory, UserDirectory};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("job_recommender=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let settings = Settings::from_env();
    let prometheus = PrometheusBuilder::new()
        .install_recorder()
        .context("installing prometheus recorder")?;
    metrics::gauge!("sync_interval_secs").set(settings.sync_interval_secs as f64);

    let store: Arc<dyn ListingStore> = Arc::new(MemoryStore::new());
    let client: Arc<dyn ScoreClient> = Arc::new(
        HttpScoreClient::new(
            &settings.ml_base_url,
            Duration::from_secs(settings.request_timeout_secs),
        )
        .context("building scoring client")?,
    );
    let users: Arc<dyn UserDirectory> = Arc::new(MemoryUserDirectory::new());
    let (persist, _persist_worker) =
        persist::spawn_persist_worker(store.clone(), settings.persist_queue_capacity);

    // Seed a cold store before serving, then hand off to the periodic task.
    scheduler::bootstrap_sync(
        store.as_ref(),
        client.as_ref(),
        users.as_ref(),
        settings.low_data_threshold,
        settings.scheduler_limit,
    )
    .await;
    scheduler::spawn_sync_scheduler(
        SyncSchedulerCfg {
            interval_secs: settings.sync_interval_secs,
            limit: settings.scheduler_limit,
        },
        store.clone(),
        client.clone(),
        users.clone(),
    );

    let state = AppState {
        store,
        client,
        users,
        persist,
        low_data_threshold: settings.low_data_threshold,
    };
    let app = create_router(state).route(
        "/metrics",
        get(move || {
            let handle = prometheus.clone();
            async move { handle.render() }
        }),
    );

    let listener = tokio::net::TcpListener::bind(&settings.bind_addr)
        .await
        .with_context(|| format!("binding {}", settings.bind_addr))?;
    tracing::info!(addr = %settings.bind_addr, "job recommender listening");
    axum::serve(listener, app).await?;
    Ok(())
}
