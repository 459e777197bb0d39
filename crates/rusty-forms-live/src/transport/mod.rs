//! Transport seam for server-side checks
//!
//! The registry builds a [`RemoteRequest`], hands it to a [`RemoteTransport`]
//! and interprets whatever comes back. Only a 2xx response whose body is
//! `{"isValid": bool, "message"?: string}` counts as an answer.

use crate::error::{ResponseError, TransportError};
use crate::outcome::ValidationOutcome;
use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;

pub mod http;

pub use http::HttpTransport;

/// One outgoing check
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteRequest {
    pub endpoint: String,
    pub method: Method,
    /// `{fieldId, formId, value, ...extraPayload}`
    pub body: serde_json::Value,
}

/// Raw response as the transport received it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteResponse {
    pub status: u16,
    pub body: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteReply {
    is_valid: bool,
    #[serde(default)]
    message: Option<String>,
}

impl RemoteResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Shorthand for a 200 response carrying `body` as JSON
    pub fn json(body: &serde_json::Value) -> Self {
        Self::new(200, body.to_string())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Read the outcome out of the response
    pub fn interpret(&self) -> Result<ValidationOutcome, ResponseError> {
        if !self.is_success() {
            return Err(ResponseError::Status(self.status));
        }

        let reply: RemoteReply = serde_json::from_str(&self.body)?;
        Ok(ValidationOutcome {
            valid: reply.is_valid,
            message: reply.message,
        })
    }
}

/// Sends remote checks somewhere and returns the raw response
#[async_trait]
pub trait RemoteTransport: Send + Sync {
    async fn send(&self, request: RemoteRequest) -> Result<RemoteResponse, TransportError>;

    /// Transport name for logs
    fn name(&self) -> &'static str {
        "custom"
    }
}
