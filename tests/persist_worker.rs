// tests/persist_worker.rs
//
// The fire-and-forget persistence path: batches handed to the worker land in
// the store without the caller waiting, and re-delivery of the same batch
// stays deduplicated.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use job_recommender::listing::{CandidateJob, JobType};
use job_recommender::persist::spawn_persist_worker;
use job_recommender::store::{ListingStore, MemoryStore};

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

async fn wait_for_count(store: &MemoryStore, expected: usize) {
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if store.count().await == expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap_or_else(|_| {
        panic!(
            "store never reached {expected} listings (got {})",
            snapshot_count(store)
        )
    });
}

fn snapshot_count(store: &MemoryStore) -> usize {
    store.snapshot().len()
}

#[tokio::test]
async fn enqueued_batches_are_reconciled_in_the_background() {
    let store = Arc::new(MemoryStore::new());
    let dyn_store: Arc<dyn ListingStore> = store.clone();
    let (handle, _worker) = spawn_persist_worker(dyn_store, 8);

    handle.enqueue(vec![candidate("a"), candidate("b"), candidate("c")]);
    wait_for_count(&store, 3).await;
}

#[tokio::test]
async fn redelivered_batches_do_not_duplicate_listings() {
    let store = Arc::new(MemoryStore::new());
    let dyn_store: Arc<dyn ListingStore> = store.clone();
    let (handle, _worker) = spawn_persist_worker(dyn_store, 8);

    let batch = vec![candidate("a"), candidate("b"), candidate("c")];
    handle.enqueue(batch.clone());

    let mut second = batch;
    second.push(candidate("d"));
    handle.enqueue(second);

    // settles at 4, never 6: the second batch updates the overlap
    wait_for_count(&store, 4).await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(store.count().await, 4);
}

#[tokio::test]
async fn empty_batches_are_not_queued() {
    let store = Arc::new(MemoryStore::new());
    let dyn_store: Arc<dyn ListingStore> = store.clone();
    let (handle, worker) = spawn_persist_worker(dyn_store, 8);

    handle.enqueue(Vec::new());
    drop(handle);

    // channel closes with nothing consumed; the worker exits cleanly
    tokio::time::timeout(Duration::from_secs(2), worker)
        .await
        .expect("worker did not exit")
        .expect("worker panicked");
    assert_eq!(store.count().await, 0);
}
