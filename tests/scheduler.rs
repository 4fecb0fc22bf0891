// tests/scheduler.rs
//
// Bootstrap reconciliation and skill-union behavior around the background
// scheduler. The periodic loop itself is a thin interval wrapper over
// sync_once, which is covered here and in tests/reconcile.rs.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use job_recommender::error::UpstreamError;
use job_recommender::listing::{CandidateJob, JobType};
use job_recommender::score_client::ScoreClient;
use job_recommender::store::{ListingStore, MemoryStore};
use job_recommender::sync::scheduler::bootstrap_sync;
use job_recommender::sync::sync_once;
use job_recommender::users::MemoryUserDirectory;

struct RecordingClient {
    calls: AtomicUsize,
    last_skills: Mutex<Vec<String>>,
    batch: Vec<CandidateJob>,
}

impl RecordingClient {
    fn returning(batch: Vec<CandidateJob>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            last_skills: Mutex::new(Vec::new()),
            batch,
        }
    }
}

#[async_trait]
impl ScoreClient for RecordingClient {
    async fn fetch_candidates(
        &self,
        skills: &[String],
        _limit: usize,
    ) -> Result<Vec<CandidateJob>, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_skills.lock().unwrap() = skills.to_vec();
        Ok(self.batch.clone())
    }
}

fn candidate(source_id: &str) -> CandidateJob {
    CandidateJob {
        title: format!("Role {source_id}"),
        company: "Acme".into(),
        location: "Remote".into(),
        description: "desc".into(),
        skills: vec![],
        job_type: JobType::FullTime,
        salary: None,
        url: None,
        source: "ml-service".into(),
        source_id: source_id.into(),
        posted_at: Utc::now(),
        scraped_at: Utc::now(),
        match_score: 0.5,
    }
}

#[tokio::test]
async fn bootstrap_seeds_a_cold_store() {
    let store = MemoryStore::new();
    let client = RecordingClient::returning(vec![candidate("a"), candidate("b")]);
    let users = MemoryUserDirectory::new();
    users.upsert("u1", vec!["Rust".into(), "Tokio".into()]);

    bootstrap_sync(&store, &client, &users, 20, 200).await;

    assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    assert_eq!(store.count().await, 2);
}

#[tokio::test]
async fn bootstrap_skips_an_already_seeded_store() {
    let store = MemoryStore::new();
    store.insert(candidate("seeded").into_listing()).await.unwrap();
    let client = RecordingClient::returning(vec![candidate("x")]);
    let users = MemoryUserDirectory::new();
    users.upsert("u1", vec!["Rust".into()]);

    bootstrap_sync(&store, &client, &users, 1, 200).await;

    assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    assert_eq!(store.count().await, 1);
}

#[tokio::test]
async fn bootstrap_is_a_noop_without_user_skills() {
    let store = MemoryStore::new();
    let client = RecordingClient::returning(vec![candidate("x")]);
    let users = MemoryUserDirectory::new();

    bootstrap_sync(&store, &client, &users, 20, 200).await;

    assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    assert_eq!(store.count().await, 0);
}

#[tokio::test]
async fn bootstrap_caps_the_skill_union_at_ten() {
    let store = MemoryStore::new();
    let client = RecordingClient::returning(vec![candidate("a")]);
    let users = MemoryUserDirectory::new();
    users.upsert(
        "u1",
        (0..8).map(|i| format!("skill-{i}")).collect::<Vec<_>>(),
    );
    users.upsert(
        "u2",
        (8..14).map(|i| format!("skill-{i}")).collect::<Vec<_>>(),
    );

    bootstrap_sync(&store, &client, &users, 20, 200).await;

    let sent = client.last_skills.lock().unwrap().clone();
    assert_eq!(sent.len(), 10);
    assert_eq!(sent[0], "skill-0");
    assert_eq!(sent[9], "skill-9");
}

#[tokio::test]
async fn sync_once_with_empty_skills_is_a_noop() {
    let store = MemoryStore::new();
    let client = RecordingClient::returning(vec![candidate("a")]);

    let report = sync_once(&store, &client, &[], 200).await.unwrap();

    assert_eq!(report.total(), 0);
    assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    assert_eq!(store.count().await, 0);
}
