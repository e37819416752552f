//! Mock upstream for tests
//!
//! Replays queued provider answers without any network I/O.

use super::{
    ByteStream, CompletionRequest, LlmError, Provider, ProviderEndpoint, UpstreamService,
};
use async_trait::async_trait;
use axum::body::Bytes;
use futures::StreamExt;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// One queued provider answer
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Non-success HTTP status with an error message
    Status(u16, String),
    /// Success; the body arrives as these network chunks
    Chunks(Vec<Vec<u8>>),
    /// Success, then the connection breaks after the chunks
    ChunksThenError(Vec<Vec<u8>>),
}

impl MockReply {
    /// Success reply whose body is the given SSE lines, one chunk each
    pub fn sse_lines(lines: &[&str]) -> Self {
        Self::Chunks(
            lines
                .iter()
                .map(|line| format!("{line}\n\n").into_bytes())
                .collect(),
        )
    }
}

/// Mock upstream that returns queued replies
#[derive(Default)]
pub struct MockUpstream {
    replies: Mutex<VecDeque<MockReply>>,
    /// Record of all requests made
    pub requests: Mutex<Vec<(Provider, CompletionRequest)>>,
    /// Body chunks pulled by whoever consumed the streams
    pub chunks_read: Arc<AtomicUsize>,
}

impl MockUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue(&self, reply: MockReply) {
        self.replies.lock().unwrap().push_back(reply);
    }

    /// Get recorded requests
    pub fn recorded_requests(&self) -> Vec<(Provider, CompletionRequest)> {
        self.requests.lock().unwrap().clone()
    }

    pub fn chunks_read(&self) -> usize {
        self.chunks_read.load(Ordering::SeqCst)
    }

    fn body(&self, chunks: Vec<Vec<u8>>, fail: bool) -> ByteStream {
        let counter = self.chunks_read.clone();
        let mut items: Vec<Result<Bytes, LlmError>> =
            chunks.into_iter().map(|c| Ok(Bytes::from(c))).collect();
        if fail {
            items.push(Err(LlmError::network("connection reset")));
        }
        futures::stream::iter(items)
            .inspect(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .boxed()
    }
}

#[async_trait]
impl UpstreamService for MockUpstream {
    async fn open_stream(
        &self,
        endpoint: &ProviderEndpoint,
        request: &CompletionRequest,
    ) -> Result<ByteStream, LlmError> {
        self.requests
            .lock()
            .unwrap()
            .push((endpoint.provider, request.clone()));
        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(MockReply::Status(status, message)) => Err(LlmError::from_status(status, message)),
            Some(MockReply::Chunks(chunks)) => Ok(self.body(chunks, false)),
            Some(MockReply::ChunksThenError(chunks)) => Ok(self.body(chunks, true)),
            None => Err(LlmError::network("No mock response queued")),
        }
    }
}
