// src/listing.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Employment type as advertised upstream. Unknown values fall back to
/// `FullTime`, matching the store's default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobType {
    #[default]
    #[serde(rename = "Full-time")]
    FullTime,
    #[serde(rename = "Part-time")]
    PartTime,
    Contract,
    Freelance,
    Internship,
}

impl JobType {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "Part-time" => JobType::PartTime,
            "Contract" => JobType::Contract,
            "Freelance" => JobType::Freelance,
            "Internship" => JobType::Internship,
            _ => JobType::FullTime,
        }
    }
}

/// The canonical stored job posting.
///
/// `(source, source_id)` is the sole dedup key: no two stored records may
/// share it. `title`/`company`/`location`/`description`/`posted_at` are
/// treated as immutable once captured; only `match_score`, `skills` and
/// `scraped_at` are refreshed on later sync cycles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobListing {
    pub title: String,
    pub company: String,
    pub location: String,
    pub description: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(rename = "type", default)]
    pub job_type: JobType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub source: String,
    pub source_id: String,
    pub posted_at: DateTime<Utc>,
    /// Last time this record was refreshed from upstream.
    pub scraped_at: DateTime<Utc>,
    /// Relevance to the most recent scoring request that touched it, in [0,1].
    pub match_score: f64,
}

/// A job returned by the scoring service, already normalized by the score
/// client (score clamped, skills coerced, dates parsed, dedup key present).
/// Transient: only the reconciler turns one into a stored `JobListing`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateJob {
    pub title: String,
    pub company: String,
    pub location: String,
    pub description: String,
    pub skills: Vec<String>,
    #[serde(rename = "type", default)]
    pub job_type: JobType,
    pub salary: Option<String>,
    pub url: Option<String>,
    pub source: String,
    pub source_id: String,
    pub posted_at: DateTime<Utc>,
    pub scraped_at: DateTime<Utc>,
    pub match_score: f64,
}

impl CandidateJob {
    pub fn into_listing(self) -> JobListing {
        JobListing {
            title: self.title,
            company: self.company,
            location: self.location,
            description: self.description,
            skills: self.skills,
            job_type: self.job_type,
            salary: self.salary,
            url: self.url,
            source: self.source,
            source_id: self.source_id,
            posted_at: self.posted_at,
            scraped_at: self.scraped_at,
            match_score: self.match_score,
        }
    }
}
