// src/score_client.rs
//
// Adapter to the external ML scoring service. Everything it emits is already
// normalized: score clamped into [0,1], skills coerced to a trimmed list,
// dates parsed or defaulted, and a non-empty dedup key generated when the
// upstream row lacks one.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::counter;
use rand::{distr::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::UpstreamError;
use crate::listing::{CandidateJob, JobType};

/// Skill lists are truncated before every call; the upstream matcher cannot
/// handle unbounded skill sets efficiently.
pub const MAX_SKILLS_PER_REQUEST: usize = 10;

#[async_trait]
pub trait ScoreClient: Send + Sync {
    async fn fetch_candidates(
        &self,
        skills: &[String],
        limit: usize,
    ) -> Result<Vec<CandidateJob>, UpstreamError>;
}

#[derive(Serialize)]
struct MatchRequest<'a> {
    skills: &'a [String],
    limit: usize,
}

/// A job row as the scoring service actually sends it: any subset of fields
/// may be present, skills may be an array or a delimited string, and the
/// match score may arrive as a number or numeric text.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawJob {
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub skills: Option<RawSkills>,
    #[serde(rename = "type")]
    pub job_type: Option<String>,
    pub salary: Option<String>,
    pub url: Option<String>,
    pub source: Option<String>,
    pub source_id: Option<String>,
    #[serde(rename = "_id")]
    pub upstream_id: Option<String>,
    pub posted_at: Option<String>,
    pub scraped_at: Option<String>,
    pub match_score: Option<RawScore>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RawSkills {
    List(Vec<String>),
    Text(String),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RawScore {
    Number(f64),
    Text(String),
}

/// Coerce a raw match score to a float in [0,1]; unparseable input scores 0.
pub fn clamp_score(raw: Option<RawScore>) -> f64 {
    let v = match raw {
        Some(RawScore::Number(n)) => n,
        Some(RawScore::Text(s)) => s.trim().parse().unwrap_or(0.0),
        None => 0.0,
    };
    if v.is_finite() {
        v.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Accepts a native array or a delimited string; brackets/braces/quotes are
/// stripped and the remainder split on commas. An empty result falls back to
/// the skills that drove the request.
pub fn coerce_skills(raw: Option<RawSkills>, request_skills: &[String]) -> Vec<String> {
    let parsed: Vec<String> = match raw {
        Some(RawSkills::List(items)) => items
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Some(RawSkills::Text(s)) => split_skill_text(&s),
        None => Vec::new(),
    };
    if parsed.is_empty() {
        request_skills.to_vec()
    } else {
        parsed
    }
}

fn split_skill_text(s: &str) -> Vec<String> {
    let cleaned: String = s
        .chars()
        .filter(|c| !matches!(c, '[' | ']' | '{' | '}' | '\'' | '"'))
        .collect();
    cleaned
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_timestamp(raw: Option<&str>, fallback: DateTime<Utc>) -> DateTime<Utc> {
    raw.and_then(|s| {
        DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
            .or_else(|| s.parse::<DateTime<Utc>>().ok())
    })
    .unwrap_or(fallback)
}

fn generated_source_id(source: &str, title: &str, now: DateTime<Utc>) -> String {
    let slug = title
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-");
    let suffix: String = rand::rng()
        .sample_iter(Alphanumeric)
        .take(5)
        .map(char::from)
        .collect();
    format!(
        "{source}-{slug}-{}-{}",
        now.timestamp_millis(),
        suffix.to_lowercase()
    )
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Normalize one raw upstream row into a `CandidateJob`. `now` is injected so
/// default timestamps (and generated ids) are deterministic under test.
pub fn normalize_candidate(
    raw: RawJob,
    request_skills: &[String],
    now: DateTime<Utc>,
) -> CandidateJob {
    let source = raw
        .source
        .and_then(non_empty)
        .unwrap_or_else(|| "ml-service".to_string());
    let title = raw
        .title
        .and_then(non_empty)
        .unwrap_or_else(|| "Unknown Position".to_string());
    let source_id = raw
        .source_id
        .or(raw.upstream_id)
        .and_then(non_empty)
        .unwrap_or_else(|| generated_source_id(&source, &title, now));

    CandidateJob {
        company: raw
            .company
            .and_then(non_empty)
            .unwrap_or_else(|| "Unknown Company".to_string()),
        location: raw
            .location
            .and_then(non_empty)
            .unwrap_or_else(|| "Remote".to_string()),
        description: raw.description.unwrap_or_default(),
        skills: coerce_skills(raw.skills, request_skills),
        job_type: raw
            .job_type
            .as_deref()
            .map(JobType::parse)
            .unwrap_or_default(),
        salary: raw.salary.and_then(non_empty),
        url: raw.url.and_then(non_empty),
        posted_at: parse_timestamp(raw.posted_at.as_deref(), now),
        scraped_at: parse_timestamp(raw.scraped_at.as_deref(), now),
        match_score: clamp_score(raw.match_score),
        title,
        source,
        source_id,
    }
}

/// Reqwest-backed client for the scoring service's `/job-match` endpoint.
pub struct HttpScoreClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpScoreClient {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl ScoreClient for HttpScoreClient {
    async fn fetch_candidates(
        &self,
        skills: &[String],
        limit: usize,
    ) -> Result<Vec<CandidateJob>, UpstreamError> {
        let capped = &skills[..skills.len().min(MAX_SKILLS_PER_REQUEST)];
        let url = format!("{}/job-match", self.base_url);

        let resp = self
            .client
            .post(&url)
            .json(&MatchRequest { skills: capped, limit })
            .send()
            .await
            .map_err(|e| {
                counter!("score_client_errors_total").increment(1);
                if e.is_timeout() {
                    UpstreamError::Unavailable(format!("request timed out: {e}"))
                } else {
                    UpstreamError::Unavailable(e.to_string())
                }
            })?
            .error_for_status()
            .map_err(|e| {
                counter!("score_client_errors_total").increment(1);
                UpstreamError::Unavailable(e.to_string())
            })?;

        let payload: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| UpstreamError::Malformed(e.to_string()))?;
        let rows = payload
            .get("jobs")
            .and_then(|v| v.as_array())
            .ok_or_else(|| {
                UpstreamError::Malformed("response has no jobs collection".to_string())
            })?;

        let now = Utc::now();
        let mut out = Vec::with_capacity(rows.len());
        let mut skipped = 0usize;
        for row in rows {
            match serde_json::from_value::<RawJob>(row.clone()) {
                Ok(raw) => out.push(normalize_candidate(raw, capped, now)),
                Err(e) => {
                    skipped += 1;
                    debug!(error = %e, "dropping unreadable job row");
                }
            }
        }
        if skipped > 0 {
            warn!(skipped, "skipped unreadable rows in scoring response");
        }
        counter!("score_client_candidates_total").increment(out.len() as u64);
        Ok(out)
    }
}
