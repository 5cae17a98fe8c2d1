//! Error types for placepin
//!
//! Provider errors are never fatal: a `FetchError` turns into status `ERROR`,
//! a `GeocodeError` drops one suggestion from the result set.

use thiserror::Error;

/// Places-search failures
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    /// Provider answered but with a non-OK status (e.g. ZERO_RESULTS)
    #[error("Provider status {status}: {message}")]
    ProviderStatus { status: String, message: String },

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Single-address geocoding failures
#[derive(Debug, Clone, Error)]
pub enum GeocodeError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Provider status {status}: {message}")]
    ProviderStatus { status: String, message: String },

    #[error("No results for address: {0}")]
    NoResults(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Failures talking to a running pipeline
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Controller task has stopped
    #[error("Pipeline is closed")]
    Closed,
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for PipelineError {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        PipelineError::Closed
    }
}

impl From<tokio::sync::oneshot::error::RecvError> for PipelineError {
    fn from(_: tokio::sync::oneshot::error::RecvError) -> Self {
        PipelineError::Closed
    }
}
