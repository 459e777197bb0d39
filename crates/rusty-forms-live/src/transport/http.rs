//! HTTP transport backed by reqwest

use super::{RemoteRequest, RemoteResponse, RemoteTransport};
use crate::config::RemoteConfig;
use crate::error::TransportError;
use async_trait::async_trait;
use std::time::Duration;

/// Sends checks as JSON over HTTP
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpTransport {
    /// Create a transport with its own connection pool
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Other(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client, timeout })
    }

    pub fn from_config(config: &RemoteConfig) -> Result<Self, TransportError> {
        Self::new(config.timeout())
    }

    /// Reuse an existing client
    pub fn with_client(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl RemoteTransport for HttpTransport {
    async fn send(&self, request: RemoteRequest) -> Result<RemoteResponse, TransportError> {
        let endpoint = request.endpoint.clone();
        let map_err = |e: reqwest::Error| {
            if e.is_timeout() {
                TransportError::Timeout {
                    endpoint: endpoint.clone(),
                }
            } else {
                TransportError::Request {
                    endpoint: endpoint.clone(),
                    source: e,
                }
            }
        };

        let response = self
            .client
            .request(request.method, &request.endpoint)
            .timeout(self.timeout)
            .json(&request.body)
            .send()
            .await
            .map_err(map_err)?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(map_err)?;

        Ok(RemoteResponse { status, body })
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
