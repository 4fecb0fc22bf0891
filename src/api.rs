// src/api.rs
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::warn;

use crate::persist::PersistHandle;
use crate::recommend::{self, RecommendFilters, Recommendations};
use crate::score_client::ScoreClient;
use crate::store::ListingStore;
use crate::sync;
use crate::users::UserDirectory;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ListingStore>,
    pub client: Arc<dyn ScoreClient>,
    pub users: Arc<dyn UserDirectory>,
    pub persist: PersistHandle,
    /// Below this store size, recommendation requests trigger a sync first.
    pub low_data_threshold: usize,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api/recommendations/jobs", get(recommended_jobs))
        .route("/api/jobs/sync", post(sync_now))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Caller identity at the query-string seam. Session handling is an external
/// collaborator; a deployment fronting this with auth middleware would
/// resolve the user there instead.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Caller {
    user_id: Option<String>,
}

async fn recommended_jobs(
    State(state): State<AppState>,
    Query(caller): Query<Caller>,
    Query(filters): Query<RecommendFilters>,
) -> Json<Recommendations> {
    let skills = match caller.user_id.as_deref() {
        Some(id) => state.users.skills_for(id).await.unwrap_or_default(),
        None => Vec::new(),
    };
    let out = recommend::recommend(
        state.store.as_ref(),
        state.client.as_ref(),
        &state.persist,
        &skills,
        &filters,
        state.low_data_threshold,
    )
    .await;
    Json(out)
}

#[derive(Debug, Deserialize)]
struct SyncNowRequest {
    skills: Vec<String>,
    limit: Option<usize>,
}

#[derive(Debug, Serialize)]
struct SyncNowResponse {
    success: bool,
    added: usize,
    updated: usize,
    total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Manual sync trigger, equivalent to one scheduled reconciliation cycle.
async fn sync_now(
    State(state): State<AppState>,
    Json(req): Json<SyncNowRequest>,
) -> Json<SyncNowResponse> {
    if req.skills.is_empty() {
        return Json(SyncNowResponse {
            success: false,
            added: 0,
            updated: 0,
            total: 0,
            error: Some("no skills provided".to_string()),
        });
    }

    match sync::sync_once(
        state.store.as_ref(),
        state.client.as_ref(),
        &req.skills,
        req.limit.unwrap_or(100),
    )
    .await
    {
        Ok(report) => Json(SyncNowResponse {
            success: true,
            added: report.added,
            updated: report.updated,
            total: report.total(),
            error: None,
        }),
        Err(e) => {
            warn!(error = %e, "manual sync failed");
            Json(SyncNowResponse {
                success: false,
                added: 0,
                updated: 0,
                total: 0,
                error: Some(e.to_string()),
            })
        }
    }
}
