//! Ways for the client to reach a relay

use crate::api::ErrorResponse;
use crate::relay::{RelayError, RelayRequest, StreamRelay};
use async_trait::async_trait;
use axum::body::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Unread body of a relay response
pub type BodyStream = BoxStream<'static, Result<Bytes, ClientError>>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("relay answered {status}: {message}")]
    Status { status: u16, message: String },
    #[error(transparent)]
    Relay(#[from] RelayError),
}

/// Opens a streaming chat request against a relay
#[async_trait]
pub trait RelayTransport: Send + Sync {
    /// Resolves once the relay has accepted the request
    async fn open(&self, request: &RelayRequest) -> Result<BodyStream, ClientError>;
}

/// Relay reached over HTTP at `{base_url}/api/chat`
pub struct HttpRelayTransport {
    client: Client,
    url: String,
}

impl HttpRelayTransport {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            url: format!("{}/api/chat", base_url.trim_end_matches('/')),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl RelayTransport for HttpRelayTransport {
    async fn open(&self, request: &RelayRequest) -> Result<BodyStream, ClientError> {
        let response = self.client.post(&self.url).json(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            return Err(ClientError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(ClientError::from))
            .boxed())
    }
}

/// Relay running in the same process
pub struct InProcessTransport {
    relay: Arc<StreamRelay>,
}

impl InProcessTransport {
    pub fn new(relay: Arc<StreamRelay>) -> Self {
        Self { relay }
    }
}

#[async_trait]
impl RelayTransport for InProcessTransport {
    async fn open(&self, request: &RelayRequest) -> Result<BodyStream, ClientError> {
        let stream = self.relay.open(request).await?;
        Ok(stream.map(Ok).boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_url() {
        let transport = HttpRelayTransport::new("http://localhost:8000/").unwrap();
        assert_eq!(transport.url(), "http://localhost:8000/api/chat");
    }

    #[tokio::test]
    async fn test_unreachable_relay_is_request_error() {
        let transport = HttpRelayTransport::new("http://127.0.0.1:9").unwrap();
        let request = crate::title_generator::title_request("hi", "qiwi-small");
        let Err(err) = transport.open(&request).await else {
            panic!("expected connection failure");
        };
        assert!(matches!(err, ClientError::Request(_)));
    }
}
