//! Conversation client
//!
//! Owns the conversation list and drives the request/stream cycle against a
//! relay. Follows the Elm Architecture: a pure [`transition`] maps
//! `(state, book, event)` to a new state plus effects, and [`ChatClient`]
//! executes the effects.

mod book;
mod effect;
mod event;
mod runtime;
mod state;
mod transition;
mod transport;

#[cfg(test)]
mod proptests;
#[cfg(test)]
pub mod testing;

pub use book::{Conversation, ConversationBook};
pub use effect::{Effect, Notice};
pub use event::Event;
pub use runtime::{ChatClient, ChatObserver, NoopObserver};
pub use state::{ChatPhase, ChatSettings, ClientState, RequestPath, TitlePhase};
pub use transition::{transition, TransitionError, TransitionResult};
pub use transport::{BodyStream, ClientError, HttpRelayTransport, InProcessTransport, RelayTransport};
