// src/config.rs
use std::str::FromStr;

/// Runtime settings, read once at startup from the environment (a local
/// `.env` is loaded by the binary before this runs).
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Base URL of the ML scoring service API.
    pub ml_base_url: String,
    /// Upper bound on any single scoring request.
    pub request_timeout_secs: u64,
    /// Cadence of the background sync task.
    pub sync_interval_secs: u64,
    /// Batch size requested by scheduled cycles.
    pub scheduler_limit: usize,
    /// Below this store size, requests trigger a sync before answering.
    pub low_data_threshold: usize,
    pub persist_queue_capacity: usize,
    pub bind_addr: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ml_base_url: "http://localhost:5000/api".to_string(),
            request_timeout_secs: 60,
            sync_interval_secs: 4 * 3600,
            scheduler_limit: 200,
            low_data_threshold: 20,
            persist_queue_capacity: 32,
            bind_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        let defaults = Settings::default();
        Settings {
            ml_base_url: env_string("ML_SERVICE_URL", defaults.ml_base_url),
            request_timeout_secs: env_parse("ML_TIMEOUT_SECS", defaults.request_timeout_secs),
            sync_interval_secs: env_parse("SYNC_INTERVAL_SECS", defaults.sync_interval_secs),
            scheduler_limit: env_parse("SYNC_LIMIT", defaults.scheduler_limit),
            low_data_threshold: env_parse("LOW_DATA_THRESHOLD", defaults.low_data_threshold),
            persist_queue_capacity: env_parse(
                "PERSIST_QUEUE_CAPACITY",
                defaults.persist_queue_capacity,
            ),
            bind_addr: env_string("BIND_ADDR", defaults.bind_addr),
        }
    }
}

fn env_string(key: &str, default: String) -> String {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => v,
        _ => default,
    }
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
