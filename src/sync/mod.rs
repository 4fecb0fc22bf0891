// src/sync/mod.rs
//
// The reconciler: merges candidate batches from the scoring service into the
// listing store without creating duplicates. Per-item failures are tagged,
// counted and logged; a batch never fails as a whole.

pub mod scheduler;

use chrono::Utc;
use metrics::{counter, describe_counter, describe_gauge, gauge};
use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{StoreError, UpstreamError};
use crate::listing::CandidateJob;
use crate::score_client::ScoreClient;
use crate::store::ListingStore;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "sync_candidates_total",
            "Candidate jobs received from the scoring service."
        );
        describe_counter!("sync_added_total", "Listings inserted by reconciliation.");
        describe_counter!("sync_updated_total", "Listings refreshed by reconciliation.");
        describe_counter!(
            "sync_conflicts_total",
            "Per-item reconciliation failures (duplicate races, validation)."
        );
        describe_counter!(
            "sync_upstream_errors_total",
            "Failed fetches from the scoring service."
        );
        describe_gauge!("sync_last_run_ts", "Unix ts when a sync cycle last completed.");
    });
}

/// Outcome of reconciling a single candidate. Conflicts carry the store error
/// so batch-level accounting stays explicit instead of exception-driven.
#[derive(Debug)]
pub enum ReconcileOutcome {
    Added,
    Updated,
    Conflict(StoreError),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub added: usize,
    pub updated: usize,
    pub errors: usize,
}

impl SyncReport {
    pub fn total(&self) -> usize {
        self.added + self.updated + self.errors
    }

    fn record(&mut self, outcome: &ReconcileOutcome) {
        match outcome {
            ReconcileOutcome::Added => self.added += 1,
            ReconcileOutcome::Updated => self.updated += 1,
            ReconcileOutcome::Conflict(_) => self.errors += 1,
        }
    }
}

async fn reconcile_one(store: &dyn ListingStore, candidate: CandidateJob) -> ReconcileOutcome {
    match store.find_matching(&candidate).await {
        Some(existing) => {
            // Refresh keys come from the *found* record: the fallback
            // heuristic may have matched under a different source id.
            match store
                .apply_refresh(
                    &existing.source,
                    &existing.source_id,
                    candidate.match_score,
                    &candidate.skills,
                    Utc::now(),
                )
                .await
            {
                Ok(()) => ReconcileOutcome::Updated,
                Err(e) => {
                    warn!(
                        source = %existing.source,
                        source_id = %existing.source_id,
                        error = %e,
                        "failed to refresh listing"
                    );
                    ReconcileOutcome::Conflict(e)
                }
            }
        }
        None => {
            let title = candidate.title.clone();
            match store.insert(candidate.into_listing()).await {
                Ok(()) => ReconcileOutcome::Added,
                Err(e @ StoreError::Duplicate(_, _)) => {
                    // Lost the lookup/insert race to a concurrent cycle. Not
                    // retried here; the next cycle is idempotent.
                    warn!(title = %title, error = %e, "insert lost duplicate race");
                    ReconcileOutcome::Conflict(e)
                }
                Err(e) => {
                    warn!(title = %title, error = %e, "listing rejected by store");
                    ReconcileOutcome::Conflict(e)
                }
            }
        }
    }
}

/// Merge a candidate batch into the store, in input order. Existing listings
/// (matched by dedup key or the title+company+url heuristic) get only their
/// match score, skills and scraped_at refreshed; everything else is inserted
/// whole.
pub async fn reconcile(store: &dyn ListingStore, candidates: Vec<CandidateJob>) -> SyncReport {
    ensure_metrics_described();
    counter!("sync_candidates_total").increment(candidates.len() as u64);

    let mut report = SyncReport::default();
    for candidate in candidates {
        let outcome = reconcile_one(store, candidate).await;
        report.record(&outcome);
    }

    counter!("sync_added_total").increment(report.added as u64);
    counter!("sync_updated_total").increment(report.updated as u64);
    counter!("sync_conflicts_total").increment(report.errors as u64);
    report
}

/// One full sync cycle: fetch a candidate batch for `skills`, then reconcile
/// it. An empty skill set is a logged no-op, never an error.
pub async fn sync_once(
    store: &dyn ListingStore,
    client: &dyn ScoreClient,
    skills: &[String],
    limit: usize,
) -> Result<SyncReport, UpstreamError> {
    ensure_metrics_described();

    if skills.is_empty() {
        info!("no skills available, skipping sync cycle");
        return Ok(SyncReport::default());
    }

    let candidates = match client.fetch_candidates(skills, limit).await {
        Ok(c) => c,
        Err(e) => {
            counter!("sync_upstream_errors_total").increment(1);
            return Err(e);
        }
    };
    info!(count = candidates.len(), "fetched candidate batch");

    let report = reconcile(store, candidates).await;
    gauge!("sync_last_run_ts").set(Utc::now().timestamp().max(0) as f64);
    info!(
        added = report.added,
        updated = report.updated,
        errors = report.errors,
        "sync cycle complete"
    );
    Ok(report)
}
