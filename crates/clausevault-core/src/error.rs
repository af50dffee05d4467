//! Error taxonomy shared by the core engines and the application crate.
//!
//! Propagation policy: per-chunk and per-query failures are isolated locally.
//! They degrade the result set for that unit (fewer semantic candidates, a
//! keyword-only fallback) but never abort a batch or the surrounding request.
//! A document is marked failed only when chunking or redaction itself cannot
//! execute.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    /// Empty or too-short query/text at a public boundary.
    #[error("invalid input: {0}")]
    InputError(String),

    /// The embedding or metadata provider is down or not configured.
    /// Triggers degradation, not failure.
    #[error("provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Bad JSON or an otherwise unusable provider payload. Discarded and
    /// logged per item.
    #[error("malformed provider response: {0}")]
    ProviderMalformedResponse(String),

    /// A vector that does not match the provider's declared dimension.
    /// Rejected at construction; never persisted.
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A merge weight outside [0, 1].
    #[error("weight out of range [0, 1]: {0}")]
    WeightOutOfRange(f64),
}
