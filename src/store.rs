// src/store.rs
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;

use crate::error::StoreError;
use crate::listing::{CandidateJob, JobListing};

/// Filters applied to both stored listings and freshly fetched batches.
/// Location and search term are case-insensitive substring matches; the
/// search term runs against title, company and description.
#[derive(Debug, Clone)]
pub struct ListingQuery {
    pub min_match_score: f64,
    location: Option<Regex>,
    search: Option<Regex>,
}

impl ListingQuery {
    pub fn new(min_match_score: f64, location: Option<&str>, search_term: Option<&str>) -> Self {
        Self {
            min_match_score,
            location: location.and_then(ci_substring),
            search: search_term.and_then(ci_substring),
        }
    }

    pub fn unfiltered() -> Self {
        Self::new(0.0, None, None)
    }

    pub fn matches(&self, job: &JobListing) -> bool {
        if job.match_score < self.min_match_score {
            return false;
        }
        if let Some(re) = &self.location {
            if !re.is_match(&job.location) {
                return false;
            }
        }
        if let Some(re) = &self.search {
            if !(re.is_match(&job.title)
                || re.is_match(&job.company)
                || re.is_match(&job.description))
            {
                return false;
            }
        }
        true
    }
}

fn ci_substring(term: &str) -> Option<Regex> {
    let t = term.trim();
    if t.is_empty() {
        return None;
    }
    // Escaped, so user input is a literal substring rather than a pattern.
    Regex::new(&format!("(?i){}", regex::escape(t))).ok()
}

/// Persistent collection of job listings. The unique `(source, source_id)`
/// constraint enforced by `insert` is the only concurrency-safety mechanism
/// the reconciler relies on.
#[async_trait]
pub trait ListingStore: Send + Sync {
    /// Look up the listing a candidate would collide with: the exact
    /// `(source, source_id)` key, or the same title+company where the stored
    /// record carries a non-empty url. The fallback catches a posting
    /// re-submitted with a freshly generated source id; since a hit only ever
    /// refreshes score/skills/scraped_at, a cross-source collision cannot
    /// corrupt posting identity fields.
    async fn find_matching(&self, candidate: &CandidateJob) -> Option<JobListing>;

    async fn insert(&self, listing: JobListing) -> Result<(), StoreError>;

    /// Refresh the mutable subset of an existing listing. Everything else is
    /// immutable once captured.
    async fn apply_refresh(
        &self,
        source: &str,
        source_id: &str,
        match_score: f64,
        skills: &[String],
        scraped_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    async fn count(&self) -> usize;

    /// Filtered page plus the total match count, sorted by match score
    /// descending then creation order descending.
    async fn query(&self, query: &ListingQuery, skip: usize, limit: usize)
        -> (Vec<JobListing>, usize);
}

/// In-memory listing store. The mutex is never held across an await point;
/// every operation is a short independent critical section.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Vec<JobListing>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full copy of the stored listings, in creation order.
    pub fn snapshot(&self) -> Vec<JobListing> {
        self.inner.lock().expect("store mutex poisoned").clone()
    }
}

fn same_key(a: &JobListing, b: &JobListing) -> bool {
    a.source == b.source && a.source_id == b.source_id
}

fn validate(listing: &JobListing) -> Result<(), StoreError> {
    for (field, value) in [
        ("title", &listing.title),
        ("company", &listing.company),
        ("location", &listing.location),
        ("source", &listing.source),
        ("sourceId", &listing.source_id),
    ] {
        if value.trim().is_empty() {
            return Err(StoreError::Validation(format!("missing required field {field}")));
        }
    }
    Ok(())
}

#[async_trait]
impl ListingStore for MemoryStore {
    async fn find_matching(&self, candidate: &CandidateJob) -> Option<JobListing> {
        let v = self.inner.lock().expect("store mutex poisoned");
        v.iter()
            .find(|j| {
                (j.source == candidate.source && j.source_id == candidate.source_id)
                    || (j.title == candidate.title
                        && j.company == candidate.company
                        && j.url.as_deref().is_some_and(|u| !u.is_empty()))
            })
            .cloned()
    }

    async fn insert(&self, listing: JobListing) -> Result<(), StoreError> {
        validate(&listing)?;
        let mut v = self.inner.lock().expect("store mutex poisoned");
        if v.iter().any(|j| same_key(j, &listing)) {
            return Err(StoreError::Duplicate(listing.source, listing.source_id));
        }
        v.push(listing);
        Ok(())
    }

    async fn apply_refresh(
        &self,
        source: &str,
        source_id: &str,
        match_score: f64,
        skills: &[String],
        scraped_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut v = self.inner.lock().expect("store mutex poisoned");
        match v
            .iter_mut()
            .find(|j| j.source == source && j.source_id == source_id)
        {
            Some(job) => {
                job.match_score = match_score;
                job.skills = skills.to_vec();
                job.scraped_at = scraped_at;
                Ok(())
            }
            None => Err(StoreError::Missing(source.to_string(), source_id.to_string())),
        }
    }

    async fn count(&self) -> usize {
        self.inner.lock().expect("store mutex poisoned").len()
    }

    async fn query(
        &self,
        query: &ListingQuery,
        skip: usize,
        limit: usize,
    ) -> (Vec<JobListing>, usize) {
        let v = self.inner.lock().expect("store mutex poisoned");
        let mut hits: Vec<(usize, JobListing)> = v
            .iter()
            .enumerate()
            .filter(|(_, j)| query.matches(j))
            .map(|(i, j)| (i, j.clone()))
            .collect();
        // match_score desc, then creation order desc
        hits.sort_by(|(ia, a), (ib, b)| {
            b.match_score
                .partial_cmp(&a.match_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(ib.cmp(ia))
        });
        let total = hits.len();
        let page = hits
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|(_, j)| j)
            .collect();
        (page, total)
    }
}
