// tests/reconcile.rs
//
// Reconciler semantics: dedup against the (source, sourceId) key, the
// title+company+url fallback, identity preservation on update, and per-item
// error accounting.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use job_recommender::error::StoreError;
use job_recommender::listing::{CandidateJob, JobListing, JobType};
use job_recommender::store::{ListingQuery, ListingStore, MemoryStore};
use job_recommender::sync::reconcile;

fn candidate(source_id: &str, score: f64) -> CandidateJob {
    CandidateJob {
        title: format!("Role {source_id}"),
        company: "Acme".into(),
        location: "Remote".into(),
        description: "desc".into(),
        skills: vec!["Rust".into()],
        job_type: JobType::FullTime,
        salary: None,
        url: None,
        source: "ml-service".into(),
        source_id: source_id.into(),
        posted_at: Utc::now(),
        scraped_at: Utc::now(),
        match_score: score,
    }
}

#[tokio::test]
async fn mixed_batch_counts_added_and_updated() {
    let store = MemoryStore::new();
    store
        .insert(candidate("X", 0.3).into_listing())
        .await
        .unwrap();

    let batch = vec![candidate("X", 0.7), candidate("Y", 0.5), candidate("Z", 0.4)];
    let report = reconcile(&store, batch).await;

    assert_eq!(report.added, 2);
    assert_eq!(report.updated, 1);
    assert_eq!(report.errors, 0);
    assert_eq!(report.total(), 3);
    assert_eq!(store.count().await, 3);
}

#[tokio::test]
async fn repeated_runs_never_create_duplicates() {
    let store = MemoryStore::new();
    let batch = vec![candidate("a", 0.1), candidate("b", 0.2), candidate("c", 0.3)];

    for _ in 0..3 {
        reconcile(&store, batch.clone()).await;
    }

    assert_eq!(store.count().await, 3);
    let snapshot = store.snapshot();
    for job in &snapshot {
        let same_key = snapshot
            .iter()
            .filter(|j| j.source == job.source && j.source_id == job.source_id)
            .count();
        assert_eq!(same_key, 1, "duplicate key for {}", job.source_id);
    }
}

#[tokio::test]
async fn update_touches_only_score_skills_and_scraped_at() {
    let store = MemoryStore::new();
    let original = candidate("X", 0.3).into_listing();
    store.insert(original.clone()).await.unwrap();

    let mut refresh = candidate("X", 0.9);
    refresh.title = "Role X".into(); // must match for clarity; key match decides anyway
    refresh.location = "Berlin".into();
    refresh.description = "rewritten".into();
    refresh.skills = vec!["Rust".into(), "Tokio".into()];
    refresh.posted_at = Utc::now() + Duration::days(1);

    let report = reconcile(&store, vec![refresh]).await;
    assert_eq!(report.updated, 1);

    let stored = &store.snapshot()[0];
    assert_eq!(stored.match_score, 0.9);
    assert_eq!(stored.skills, vec!["Rust".to_string(), "Tokio".into()]);
    assert!(stored.scraped_at >= original.scraped_at);
    // posting metadata is immutable once captured
    assert_eq!(stored.title, original.title);
    assert_eq!(stored.company, original.company);
    assert_eq!(stored.location, original.location);
    assert_eq!(stored.description, original.description);
    assert_eq!(stored.posted_at, original.posted_at);
}

#[tokio::test]
async fn title_company_url_fallback_catches_regenerated_ids() {
    let store = MemoryStore::new();
    let mut existing = candidate("original-id", 0.4);
    existing.url = Some("https://jobs.example/123".into());
    store.insert(existing.into_listing()).await.unwrap();

    // Same posting re-submitted with a freshly generated source id.
    let mut resubmitted = candidate("original-id", 0.8);
    resubmitted.source_id = "ml-service-role-original-id-1756500000000-ab12c".into();
    let report = reconcile(&store, vec![resubmitted]).await;

    assert_eq!(report.updated, 1);
    assert_eq!(report.added, 0);
    assert_eq!(store.count().await, 1);
    assert_eq!(store.snapshot()[0].match_score, 0.8);
}

/// Store wrapper that never finds a match, simulating the window between a
/// concurrent cycle's lookup and insert.
struct BlindStore(MemoryStore);

#[async_trait]
impl ListingStore for BlindStore {
    async fn find_matching(&self, _candidate: &CandidateJob) -> Option<JobListing> {
        None
    }
    async fn insert(&self, listing: JobListing) -> Result<(), StoreError> {
        self.0.insert(listing).await
    }
    async fn apply_refresh(
        &self,
        source: &str,
        source_id: &str,
        match_score: f64,
        skills: &[String],
        scraped_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.0
            .apply_refresh(source, source_id, match_score, skills, scraped_at)
            .await
    }
    async fn count(&self) -> usize {
        self.0.count().await
    }
    async fn query(
        &self,
        query: &ListingQuery,
        skip: usize,
        limit: usize,
    ) -> (Vec<JobListing>, usize) {
        self.0.query(query, skip, limit).await
    }
}

#[tokio::test]
async fn duplicate_insert_race_is_counted_not_fatal() {
    let store = BlindStore(MemoryStore::new());
    store
        .insert(candidate("X", 0.3).into_listing())
        .await
        .unwrap();

    let batch = vec![candidate("X", 0.9), candidate("Y", 0.5)];
    let report = reconcile(&store, batch).await;

    assert_eq!(report.added, 1);
    assert_eq!(report.updated, 0);
    assert_eq!(report.errors, 1);
    assert_eq!(store.count().await, 2);
}

#[tokio::test]
async fn invalid_candidate_is_skipped_and_counted() {
    let store = MemoryStore::new();
    let mut bad = candidate("bad", 0.5);
    bad.company = "".into();

    let report = reconcile(&store, vec![bad, candidate("good", 0.5)]).await;
    assert_eq!(report.added, 1);
    assert_eq!(report.errors, 1);
    assert_eq!(store.count().await, 1);
}
