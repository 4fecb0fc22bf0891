// src/persist.rs
//
// Background persistence of freshly fetched batches. Responses are computed
// from the in-memory batch; the store write happens here, off the request
// path, through a bounded queue. A full queue drops the batch (the next
// fetch or scheduled cycle re-delivers the same candidates).

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::listing::CandidateJob;
use crate::store::ListingStore;

#[derive(Clone)]
pub struct PersistHandle {
    tx: mpsc::Sender<Vec<CandidateJob>>,
}

impl PersistHandle {
    /// Hand a batch to the background worker without waiting for the write.
    pub fn enqueue(&self, batch: Vec<CandidateJob>) {
        if batch.is_empty() {
            return;
        }
        let n = batch.len();
        if let Err(e) = self.tx.try_send(batch) {
            warn!(batch = n, error = %e, "persist queue full, dropping fetched batch");
        }
    }
}

pub fn spawn_persist_worker(
    store: Arc<dyn ListingStore>,
    capacity: usize,
) -> (PersistHandle, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel::<Vec<CandidateJob>>(capacity.max(1));
    let worker = tokio::spawn(async move {
        while let Some(batch) = rx.recv().await {
            let report = crate::sync::reconcile(store.as_ref(), batch).await;
            info!(
                added = report.added,
                updated = report.updated,
                errors = report.errors,
                "background persist complete"
            );
        }
    });
    (PersistHandle { tx }, worker)
}
