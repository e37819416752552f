//! Stream relay
//!
//! Turns a client chat request into a streaming completion call against the
//! provider that hosts the requested model, then forwards the provider's
//! event stream back. Each call is independent; the only shared pieces are
//! the immutable registry and the upstream client.

#[cfg(test)]
mod proptests;

use crate::llm::{
    ByteStream, CompletionRequest, LlmError, Message, ModelRegistry, Provider, UpstreamService,
};
use crate::sse::{delta_content, encode_frame, Frame, FrameDecoder};
use crate::system_prompt::{build_system_prompt, TextStyle, TITLE_PROMPT};
use axum::body::Bytes;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

const TEMPERATURE: f32 = 0.7;
const TOP_P: f32 = 0.95;
const MAX_TOKENS: u32 = 1024;
const TITLE_MAX_TOKENS: u32 = 20;

/// Frames buffered between the upstream reader and the response body
const CHANNEL_CAPACITY: usize = 64;

/// Body of `POST /api/chat`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayRequest {
    pub messages: Vec<Message>,
    /// Missing or unknown ids resolve to the default native model
    #[serde(default)]
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_style: Option<String>,
    #[serde(default)]
    pub is_for_title: bool,
}

/// How upstream bytes reach the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ForwardPolicy {
    /// Upstream body is passed through untouched
    Verbatim,
    /// Only frames carrying a content fragment are re-emitted
    #[default]
    Filtered,
}

impl ForwardPolicy {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "verbatim" => Some(ForwardPolicy::Verbatim),
            "filtered" => Some(ForwardPolicy::Filtered),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ForwardPolicy::Verbatim => "verbatim",
            ForwardPolicy::Filtered => "filtered",
        }
    }
}

#[derive(Debug, Error)]
pub enum RelayError {
    /// Provider answered with a non-success status
    #[error("upstream returned {status}: {message}")]
    Upstream { status: u16, message: String },
    /// Provider could not be reached or the request could not be built
    #[error(transparent)]
    Provider(LlmError),
}

impl From<LlmError> for RelayError {
    fn from(err: LlmError) -> Self {
        match err.status {
            Some(status) => RelayError::Upstream {
                status,
                message: err.message,
            },
            None => RelayError::Provider(err),
        }
    }
}

/// Upstream call derived from a [`RelayRequest`]
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    /// Catalog id the request resolved to
    pub model_id: String,
    pub provider: Provider,
    pub body: CompletionRequest,
}

pub struct StreamRelay {
    registry: Arc<ModelRegistry>,
    upstream: Arc<dyn UpstreamService>,
    policy: ForwardPolicy,
    assistant_name: String,
}

impl StreamRelay {
    pub fn new(
        registry: Arc<ModelRegistry>,
        upstream: Arc<dyn UpstreamService>,
        policy: ForwardPolicy,
        assistant_name: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            upstream,
            policy,
            assistant_name: assistant_name.into(),
        }
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    /// Resolve the model and build the upstream body. No I/O.
    ///
    /// An empty conversation is forwarded as the system message alone.
    pub fn prepare(&self, request: &RelayRequest) -> PreparedRequest {
        let model = self.registry.resolve(&request.model);
        let system = if request.is_for_title {
            TITLE_PROMPT.to_string()
        } else {
            let style = request
                .text_style
                .as_deref()
                .map(TextStyle::from_name)
                .unwrap_or_default();
            build_system_prompt(model, style, &self.assistant_name)
        };

        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        messages.push(Message::system(system));
        messages.extend(request.messages.iter().cloned());

        let max_tokens = if request.is_for_title {
            TITLE_MAX_TOKENS
        } else {
            MAX_TOKENS
        };
        let sampling = model.provider.sends_sampling_params();

        PreparedRequest {
            model_id: model.id.clone(),
            provider: model.provider,
            body: CompletionRequest {
                model: model.api_name.clone(),
                messages,
                temperature: sampling.then_some(TEMPERATURE),
                max_tokens: (sampling || request.is_for_title).then_some(max_tokens),
                top_p: sampling.then_some(TOP_P),
                stream: true,
            },
        }
    }

    /// Open the upstream stream and start forwarding it.
    ///
    /// Fails without producing any stream data when the provider rejects the
    /// request. Once this returns, the forwarding task reads the upstream to
    /// its end whether or not the returned stream is still being polled.
    pub async fn open(&self, request: &RelayRequest) -> Result<ReceiverStream<Bytes>, RelayError> {
        let prepared = self.prepare(request);
        let endpoint = self.registry.endpoint(prepared.provider);

        tracing::info!(
            requested = %request.model,
            model = %prepared.model_id,
            provider = prepared.provider.display_name(),
            messages = request.messages.len(),
            title = request.is_for_title,
            "Relaying chat request"
        );

        let upstream = self.upstream.open_stream(endpoint, &prepared.body).await?;

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        tokio::spawn(forward(upstream, tx, self.policy, prepared.model_id));
        Ok(ReceiverStream::new(rx))
    }
}

async fn forward(
    mut upstream: ByteStream,
    tx: mpsc::Sender<Bytes>,
    policy: ForwardPolicy,
    model_id: String,
) {
    let mut decoder = FrameDecoder::new();
    let mut sink = Sink {
        tx,
        open: true,
        forwarded: 0,
    };

    while let Some(chunk) = upstream.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                tracing::warn!(model = %model_id, error = %e, kind = e.kind.as_str(), "Upstream stream failed");
                break;
            }
        };

        match policy {
            ForwardPolicy::Verbatim => sink.send(chunk).await,
            ForwardPolicy::Filtered => {
                for frame in decoder.push(&chunk) {
                    if let Some(out) = filter_frame(frame) {
                        sink.send(Bytes::from(out)).await;
                    }
                }
            }
        }
    }

    if policy == ForwardPolicy::Filtered {
        if let Some(out) = decoder.finish().and_then(filter_frame) {
            sink.send(Bytes::from(out)).await;
        }
    }

    tracing::debug!(
        model = %model_id,
        forwarded = sink.forwarded,
        caller_connected = sink.open,
        "Relay stream finished"
    );
}

/// Response side of the forwarding task
struct Sink {
    tx: mpsc::Sender<Bytes>,
    open: bool,
    forwarded: usize,
}

impl Sink {
    async fn send(&mut self, bytes: Bytes) {
        if !self.open {
            return;
        }
        if self.tx.send(bytes).await.is_ok() {
            self.forwarded += 1;
        } else {
            // Keep draining the upstream; there is no cancellation path
            tracing::debug!("Caller disconnected, draining upstream");
            self.open = false;
        }
    }
}

/// Re-encode a frame if it carries content; drop everything else
fn filter_frame(frame: Frame) -> Option<String> {
    let Frame::Data(payload) = frame else {
        return None;
    };
    match serde_json::from_str::<Value>(&payload) {
        Ok(value) => delta_content(&value).is_some().then(|| encode_frame(&value)),
        Err(e) => {
            tracing::warn!(error = %e, payload = %payload, "Skipping malformed frame");
            None
        }
    }
}

/// Relay over a mock upstream with credentials for both providers
#[cfg(test)]
pub fn mock_relay(policy: ForwardPolicy) -> (Arc<StreamRelay>, Arc<crate::llm::testing::MockUpstream>) {
    use crate::llm::{LlmConfig, ModelCatalog};

    let config = LlmConfig {
        native_api_key: Some("native-test-key".to_string()),
        partner_api_key: Some("partner-test-key".to_string()),
        ..Default::default()
    };
    let registry = Arc::new(ModelRegistry::new(&config, ModelCatalog::builtin()).unwrap());
    let upstream = Arc::new(crate::llm::testing::MockUpstream::new());
    let relay = StreamRelay::new(registry, upstream.clone(), policy, "OrionAI");
    (Arc::new(relay), upstream)
}
