// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod api;
pub mod config;
pub mod error;
pub mod listing;
pub mod persist;
pub mod recommend;
pub mod score_client;
pub mod store;
pub mod sync;
pub mod users;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, AppState};
pub use crate::error::{StoreError, UpstreamError};
pub use crate::listing::{CandidateJob, JobListing, JobType};
pub use crate::recommend::{recommend, RecommendFilters, Recommendations};
pub use crate::score_client::{HttpScoreClient, ScoreClient};
pub use crate::store::{ListingQuery, ListingStore, MemoryStore};
pub use crate::sync::{reconcile, sync_once, ReconcileOutcome, SyncReport};
pub use crate::users::{MemoryUserDirectory, UserDirectory};
