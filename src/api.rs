//! HTTP API for the chat relay

mod handlers;
mod types;

pub use handlers::create_router;
pub use types::*;

use crate::llm::ModelRegistry;
use crate::relay::StreamRelay;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<StreamRelay>,
    pub llm_registry: Arc<ModelRegistry>,
}

impl AppState {
    pub fn new(relay: Arc<StreamRelay>) -> Self {
        Self {
            llm_registry: relay.registry().clone(),
            relay,
        }
    }
}
