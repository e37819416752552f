//! Leemer Chat - streaming chat relay and conversation client
//!
//! The server half relays chat requests to an upstream completion provider
//! and streams the answer back as server-sent events. The client half keeps
//! conversations and drives the request/stream cycle against the relay.

pub mod api;
pub mod client;
pub mod config;
pub mod llm;
pub mod relay;
pub mod sse;
pub mod system_prompt;
pub mod title_generator;
