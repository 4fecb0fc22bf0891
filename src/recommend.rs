// src/recommend.rs
//
// The recommendation query engine. Per request it decides whether the store
// is fresh enough or a live re-fetch is needed, then applies the same
// filter/sort/paginate semantics to whichever data set answers.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::listing::{CandidateJob, JobListing};
use crate::persist::PersistHandle;
use crate::score_client::{ScoreClient, MAX_SKILLS_PER_REQUEST};
use crate::store::{ListingQuery, ListingStore};
use crate::sync;

const NO_SKILLS_MESSAGE: &str = "Add skills to your profile to get job recommendations";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecommendFilters {
    pub page: usize,
    pub limit: usize,
    /// Inclusive lower bound on the stored match score.
    pub min_match_score: f64,
    pub location: Option<String>,
    pub search_term: Option<String>,
    /// Force a live re-fetch instead of serving stored listings.
    pub refresh: bool,
}

impl Default for RecommendFilters {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 100,
            min_match_score: 0.0,
            location: None,
            search_term: None,
            refresh: false,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Recommendations {
    pub success: bool,
    pub jobs: Vec<JobListing>,
    pub total: usize,
    pub page: usize,
    pub pages: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Recommendations {
    fn empty_with_message(message: &str) -> Self {
        Self {
            success: true,
            jobs: Vec::new(),
            total: 0,
            page: 1,
            pages: 0,
            message: Some(message.to_string()),
        }
    }
}

/// Answer "what jobs should this user see".
///
/// Decision order: no skills short-circuits; refresh or a sparse store
/// triggers a best-effort sync first; an explicit refresh is answered from
/// the freshly fetched batch (persisted in the background); otherwise the
/// store answers, falling back to a live fetch when the stored page is
/// data-starved (fewer hits than half the limit). Totals always describe the
/// set actually returned.
pub async fn recommend(
    store: &dyn ListingStore,
    client: &dyn ScoreClient,
    persist: &PersistHandle,
    user_skills: &[String],
    filters: &RecommendFilters,
    low_data_threshold: usize,
) -> Recommendations {
    if user_skills.is_empty() {
        return Recommendations::empty_with_message(NO_SKILLS_MESSAGE);
    }

    let page = filters.page.max(1);
    let limit = filters.limit.max(1);
    let query = ListingQuery::new(
        filters.min_match_score,
        filters.location.as_deref(),
        filters.search_term.as_deref(),
    );

    // Refresh requested, or the store is too sparse to be worth querying:
    // top up the pool first. Failure degrades to whatever is stored.
    let stored = store.count().await;
    if filters.refresh || stored < low_data_threshold {
        let capped: Vec<String> = user_skills
            .iter()
            .take(MAX_SKILLS_PER_REQUEST)
            .cloned()
            .collect();
        if let Err(e) = sync::sync_once(store, client, &capped, limit.saturating_mul(5).max(100)).await
        {
            warn!(error = %e, "pre-query sync failed, serving stored listings");
        }
    }

    // Explicit refresh: answer from a live batch, bypassing the store read.
    // The batch is persisted in the background for future requests.
    if filters.refresh {
        match client.fetch_candidates(user_skills, limit.saturating_mul(2)).await {
            Ok(batch) if !batch.is_empty() => {
                persist.enqueue(batch.clone());
                let filtered = filter_and_sort(batch, &query);
                let total = filtered.len();
                let jobs = filtered
                    .into_iter()
                    .skip((page - 1).saturating_mul(limit))
                    .take(limit)
                    .collect();
                return Recommendations {
                    success: true,
                    jobs,
                    total,
                    page,
                    pages: total.div_ceil(limit),
                    message: None,
                };
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "live refresh failed, serving stored listings"),
        }
    }

    let (jobs, total) = store
        .query(&query, (page - 1).saturating_mul(limit), limit)
        .await;

    // Data-starved: trade one extra upstream round trip for completeness.
    // The bound is "fewer than half of limit", rounding half-pages as starved.
    if jobs.len() < limit.div_ceil(2) {
        match client
            .fetch_candidates(user_skills, limit.saturating_mul(2))
            .await
        {
            Ok(batch) if !batch.is_empty() => {
                persist.enqueue(batch.clone());
                let mut filtered = filter_and_sort(batch, &query);
                let total = filtered.len();
                filtered.truncate(limit);
                return Recommendations {
                    success: true,
                    jobs: filtered,
                    total,
                    page: 1,
                    pages: total.div_ceil(limit),
                    message: None,
                };
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "fallback fetch failed, serving sparse store results"),
        }
    }

    Recommendations {
        success: true,
        jobs,
        total,
        page,
        pages: total.div_ceil(limit),
        message: None,
    }
}

fn filter_and_sort(batch: Vec<CandidateJob>, query: &ListingQuery) -> Vec<JobListing> {
    let mut listings: Vec<JobListing> = batch
        .into_iter()
        .map(CandidateJob::into_listing)
        .filter(|j| query.matches(j))
        .collect();
    listings.sort_by(|a, b| {
        b.match_score
            .partial_cmp(&a.match_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    listings
}
