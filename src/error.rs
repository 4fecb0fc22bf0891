// src/error.rs
use thiserror::Error;

/// Failures talking to the external scoring service.
///
/// `Unavailable` covers connect/timeout/HTTP-status problems; callers are
/// expected to degrade to stored listings rather than propagate it. `Malformed`
/// means the service answered but the payload had no usable `jobs` collection.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("scoring service unavailable: {0}")]
    Unavailable(String),

    #[error("scoring service returned malformed payload: {0}")]
    Malformed(String),
}

/// Failures writing to the listing store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The `(source, source_id)` pair already exists. Surfaces the insert race
    /// between concurrent reconciliations; counted per-item, never fatal.
    #[error("duplicate listing for ({0}, {1})")]
    Duplicate(String, String),

    #[error("invalid listing: {0}")]
    Validation(String),

    #[error("no listing for ({0}, {1})")]
    Missing(String, String),
}
