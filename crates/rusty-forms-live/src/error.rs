// File: rusty-forms-live/src/error.rs
// Purpose: Errors raised at the transport seam

/// Failure to complete a remote check.
///
/// These never escape the validation pipeline; the registry turns every
/// variant into the configured fallback outcome.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request to {endpoint} failed: {source}")]
    Request {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {endpoint} timed out")]
    Timeout { endpoint: String },

    #[error("{0}")]
    Other(String),
}

/// Why a remote response could not be interpreted
#[derive(Debug, thiserror::Error)]
pub enum ResponseError {
    #[error("unexpected status {0}")]
    Status(u16),

    #[error("malformed response body: {0}")]
    Body(#[from] serde_json::Error),
}
