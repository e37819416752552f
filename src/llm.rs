//! Upstream provider abstraction
//!
//! Both providers the relay talks to expose an OpenAI-compatible streaming
//! chat-completion endpoint; this module owns the model table, the provider
//! endpoints and the HTTP call that opens a completion stream.

mod error;
mod models;
mod provider;
mod registry;
mod types;

#[cfg(test)]
pub mod testing;

pub use error::{LlmError, LlmErrorKind};
pub use models::{CatalogError, ModelCatalog, ModelDef, ModelDetails, Provider};
pub use provider::HttpUpstream;
pub use registry::{LlmConfig, ModelRegistry, ProviderEndpoint};
pub use types::*;

use async_trait::async_trait;
use axum::body::Bytes;
use futures::stream::BoxStream;
use std::sync::Arc;

/// Unread body of a streaming upstream response
pub type ByteStream = BoxStream<'static, Result<Bytes, LlmError>>;

/// Common interface for upstream completion providers
#[async_trait]
pub trait UpstreamService: Send + Sync {
    /// Open a streaming completion.
    ///
    /// Resolves once the provider has answered with a success status; the
    /// response body is handed back unread.
    async fn open_stream(
        &self,
        endpoint: &ProviderEndpoint,
        request: &CompletionRequest,
    ) -> Result<ByteStream, LlmError>;
}

/// Logging wrapper for upstream services
pub struct LoggingUpstream {
    inner: Arc<dyn UpstreamService>,
}

impl LoggingUpstream {
    pub fn new(inner: Arc<dyn UpstreamService>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl UpstreamService for LoggingUpstream {
    async fn open_stream(
        &self,
        endpoint: &ProviderEndpoint,
        request: &CompletionRequest,
    ) -> Result<ByteStream, LlmError> {
        let start = std::time::Instant::now();
        let result = self.inner.open_stream(endpoint, request).await;
        let duration = start.elapsed();

        match &result {
            Ok(_) => {
                tracing::info!(
                    model = %request.model,
                    provider = endpoint.provider.display_name(),
                    duration_ms = %duration.as_millis(),
                    messages = request.messages.len(),
                    "Upstream stream opened"
                );
            }
            Err(e) => {
                tracing::error!(
                    model = %request.model,
                    provider = endpoint.provider.display_name(),
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    kind = e.kind.as_str(),
                    status = ?e.status,
                    "Upstream request failed"
                );
            }
        }

        result
    }
}
