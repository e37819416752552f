//! HTTP client for OpenAI-compatible streaming completion endpoints

use super::{ByteStream, CompletionRequest, LlmError, ProviderEndpoint, UpstreamService};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// Upstream service shared by both providers
pub struct HttpUpstream {
    client: Client,
}

impl HttpUpstream {
    pub fn new() -> Result<Self, LlmError> {
        // Only the connect phase is bounded; a stream may run as long as the
        // provider keeps it open.
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| LlmError::unknown(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl UpstreamService for HttpUpstream {
    async fn open_stream(
        &self,
        endpoint: &ProviderEndpoint,
        request: &CompletionRequest,
    ) -> Result<ByteStream, LlmError> {
        let bearer = endpoint.bearer()?;

        let response = self
            .client
            .post(&endpoint.url)
            .header("Authorization", bearer)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::network(format!("Request timeout: {e}"))
                } else if e.is_connect() {
                    LlmError::network(format!("Connection failed: {e}"))
                } else {
                    LlmError::unknown(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ErrorResponse>(&body) {
                Ok(parsed) => parsed.error.message,
                Err(_) if body.is_empty() => format!("HTTP {status}"),
                Err(_) => format!("HTTP {status}: {body}"),
            };
            return Err(LlmError::from_status(status.as_u16(), message));
        }

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| LlmError::network(format!("Stream interrupted: {e}"))))
            .boxed())
    }
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}
