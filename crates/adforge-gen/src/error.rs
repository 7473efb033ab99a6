//! Error taxonomy for background generation.

use thiserror::Error;

/// Result type for generation operations.
pub type GenerateResult<T> = Result<T, GenerateError>;

/// Message fragments that mark a failure as transient and retryable.
const TRANSIENT_SIGNATURES: &[&str] = &[
    "timeout",
    "timed out",
    "rate limit",
    "too many requests",
    "429",
    "500",
    "502",
    "503",
    "504",
    "connect",
    "network",
];

/// Errors from the background-generation pipeline.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// Request failed validation before leaving the client. Never retried.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The service rejected the request (validation, content policy).
    #[error("background generation failed: {0}")]
    Service(String),

    /// A failure matching a transient signature; retried with backoff.
    #[error("transient failure: {0}")]
    Transient(String),

    /// The service responded successfully but with an empty image list.
    #[error("service returned no images")]
    EmptyResponse,

    /// The request was cancelled; its eventual result is void.
    #[error("request cancelled")]
    Cancelled,

    /// Transport-level HTTP failure.
    #[cfg(feature = "http-client")]
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

impl GenerateError {
    /// Whether this failure is worth another attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            GenerateError::Transient(_) => true,
            GenerateError::Service(message) => message_is_transient(message),
            #[cfg(feature = "http-client")]
            GenerateError::Http(err) => err.is_timeout() || err.is_connect(),
            _ => false,
        }
    }
}

/// Match a failure message against the known transient signatures.
pub(crate) fn message_is_transient(message: &str) -> bool {
    let lowered = message.to_lowercase();
    TRANSIENT_SIGNATURES.iter().any(|sig| lowered.contains(sig))
}
