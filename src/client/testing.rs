//! Mock transport and observer for client tests

use super::effect::Notice;
use super::runtime::ChatObserver;
use super::transport::{BodyStream, ClientError, RelayTransport};
use crate::relay::RelayRequest;
use async_trait::async_trait;
use axum::body::Bytes;
use futures::StreamExt;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

enum Reply {
    Status(u16, String),
    Body { chunks: Vec<Vec<u8>>, broken: bool },
}

/// Transport that replays queued relay answers
#[derive(Clone, Default)]
pub struct MockTransport {
    replies: Arc<Mutex<VecDeque<Reply>>>,
    requests: Arc<Mutex<Vec<RelayRequest>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful answer, one chunk per encoded frame
    pub fn queue_frames(&self, frames: &[String]) {
        self.queue_raw(frames.iter().map(|f| f.clone().into_bytes()).collect());
    }

    pub fn queue_raw(&self, chunks: Vec<Vec<u8>>) {
        self.replies.lock().unwrap().push_back(Reply::Body {
            chunks,
            broken: false,
        });
    }

    /// Queue an answer whose connection drops after the frames
    pub fn queue_broken(&self, frames: &[String]) {
        self.replies.lock().unwrap().push_back(Reply::Body {
            chunks: frames.iter().map(|f| f.clone().into_bytes()).collect(),
            broken: true,
        });
    }

    pub fn queue_status(&self, status: u16, message: &str) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Reply::Status(status, message.to_string()));
    }

    pub fn requests(&self) -> Vec<RelayRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl RelayTransport for MockTransport {
    async fn open(&self, request: &RelayRequest) -> Result<BodyStream, ClientError> {
        self.requests.lock().unwrap().push(request.clone());
        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(Reply::Status(status, message)) => Err(ClientError::Status { status, message }),
            Some(Reply::Body { chunks, broken }) => {
                let mut items: Vec<Result<Bytes, ClientError>> =
                    chunks.into_iter().map(|c| Ok(Bytes::from(c))).collect();
                if broken {
                    items.push(Err(ClientError::Status {
                        status: 0,
                        message: "connection reset".to_string(),
                    }));
                }
                Ok(futures::stream::iter(items).boxed())
            }
            None => Err(ClientError::Status {
                status: 503,
                message: "No mock response queued".to_string(),
            }),
        }
    }
}

/// Observer that keeps every notice
#[derive(Clone, Default)]
pub struct RecordingObserver {
    notices: Arc<Mutex<Vec<Notice>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }
}

impl ChatObserver for RecordingObserver {
    fn notify(&mut self, notice: &Notice) {
        self.notices.lock().unwrap().push(notice.clone());
    }
}
