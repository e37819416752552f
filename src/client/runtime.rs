//! Client runtime: executes effects produced by the transition function

use super::book::ConversationBook;
use super::effect::{Effect, Notice};
use super::event::Event;
use super::state::{ChatSettings, ClientState};
use super::transition::{transition, TransitionError};
use super::transport::{BodyStream, RelayTransport};
use crate::relay::RelayRequest;
use crate::sse::{delta_content, Frame, FrameDecoder};
use crate::system_prompt::TextStyle;
use futures::StreamExt;
use serde_json::Value;
use std::collections::VecDeque;

/// Receives notices as the client works (e.g. to render fragments)
pub trait ChatObserver: Send {
    fn notify(&mut self, notice: &Notice);
}

/// Observer that ignores everything
pub struct NoopObserver;

impl ChatObserver for NoopObserver {
    fn notify(&mut self, _notice: &Notice) {}
}

/// Which stream a response body belongs to
#[derive(Debug, Clone, Copy)]
enum StreamKind {
    Chat,
    Title,
}

/// Pending work; processed in order, no recursion
enum Work {
    Event(Event),
    Open(StreamKind, RelayRequest),
    Read(StreamKind, BodyStream),
}

/// Conversation client bound to a relay transport
pub struct ChatClient<T: RelayTransport> {
    transport: T,
    state: ClientState,
    book: ConversationBook,
    observer: Box<dyn ChatObserver>,
}

impl<T: RelayTransport> ChatClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            state: ClientState::default(),
            book: ConversationBook::new(),
            observer: Box::new(NoopObserver),
        }
    }

    #[must_use]
    pub fn with_observer(mut self, observer: impl ChatObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    #[must_use]
    pub fn with_settings(mut self, settings: ChatSettings) -> Self {
        self.state.settings = settings;
        self
    }

    pub fn state(&self) -> &ClientState {
        &self.state
    }

    pub fn book(&self) -> &ConversationBook {
        &self.book
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_loading()
    }

    /// Send a message and consume the answer, then the title if one is due.
    ///
    /// Only rejections of the submission itself are returned; stream
    /// failures are logged and reported to the observer.
    pub async fn submit(&mut self, text: &str) -> Result<(), TransitionError> {
        self.dispatch(Event::Submit {
            text: text.to_string(),
            new_id: new_id(),
            now: now_millis(),
        })
        .await
    }

    pub async fn new_conversation(&mut self) -> Result<(), TransitionError> {
        self.dispatch(Event::NewConversation {
            new_id: new_id(),
            now: now_millis(),
        })
        .await
    }

    pub async fn select_conversation(&mut self, id: &str) -> Result<(), TransitionError> {
        self.dispatch(Event::SelectConversation { id: id.to_string() })
            .await
    }

    pub async fn delete_conversation(&mut self, id: &str) -> Result<(), TransitionError> {
        self.dispatch(Event::DeleteConversation { id: id.to_string() })
            .await
    }

    pub async fn rename_conversation(&mut self, id: &str, title: &str) -> Result<(), TransitionError> {
        self.dispatch(Event::RenameConversation {
            id: id.to_string(),
            title: title.to_string(),
        })
        .await
    }

    pub async fn clear_current(&mut self) -> Result<(), TransitionError> {
        self.dispatch(Event::ClearCurrent).await
    }

    pub async fn select_model(&mut self, model: &str) -> Result<(), TransitionError> {
        self.dispatch(Event::SelectModel {
            model: model.to_string(),
        })
        .await
    }

    pub async fn select_partner_model(&mut self, model: &str) -> Result<(), TransitionError> {
        self.dispatch(Event::SelectPartnerModel {
            model: model.to_string(),
        })
        .await
    }

    pub async fn set_text_style(&mut self, style: TextStyle) -> Result<(), TransitionError> {
        self.dispatch(Event::SetTextStyle { style }).await
    }

    /// Process an event and everything it leads to.
    ///
    /// An error is returned only if the initial event is rejected; later
    /// rejections are logged and skipped.
    pub async fn dispatch(&mut self, event: Event) -> Result<(), TransitionError> {
        let mut queue = VecDeque::new();
        queue.extend(self.step(event)?);

        while let Some(work) = queue.pop_front() {
            match work {
                Work::Event(event) => match self.step(event) {
                    Ok(more) => queue.extend(more),
                    Err(e) => tracing::warn!(error = %e, "Dropped client event"),
                },
                Work::Open(kind, request) => match self.transport.open(&request).await {
                    Ok(body) => {
                        if let StreamKind::Chat = kind {
                            queue.push_back(Work::Event(Event::ResponseOpened));
                        }
                        queue.push_back(Work::Read(kind, body));
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, ?kind, model = %request.model, "Relay request failed");
                        queue.push_back(Work::Event(failed(kind, e.to_string())));
                    }
                },
                Work::Read(kind, body) => {
                    let end = self.read_stream(kind, body).await;
                    queue.push_back(Work::Event(end));
                }
            }
        }

        Ok(())
    }

    /// Pure transition, then apply its effects
    fn step(&mut self, event: Event) -> Result<Vec<Work>, TransitionError> {
        let result = transition(&self.state, &self.book, event)?;
        self.state = result.new_state;

        let mut work = Vec::new();
        for effect in result.effects {
            match effect {
                Effect::OpenChatStream { request, .. } => {
                    work.push(Work::Open(StreamKind::Chat, request));
                }
                Effect::OpenTitleStream { request, .. } => {
                    work.push(Work::Open(StreamKind::Title, request));
                }
                Effect::Notify(notice) => self.observer.notify(&notice),
                data => self.book.apply(&data),
            }
        }
        Ok(work)
    }

    /// Feed every content fragment of `body` through the state machine and
    /// return the event that ends the stream.
    async fn read_stream(&mut self, kind: StreamKind, mut body: BodyStream) -> Event {
        let mut decoder = FrameDecoder::new();

        while let Some(chunk) = body.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    tracing::warn!(error = %e, ?kind, "Response stream failed");
                    return failed(kind, e.to_string());
                }
            };
            for frame in decoder.push(&chunk) {
                if !self.handle_frame(kind, frame) {
                    return ended(kind);
                }
            }
        }
        if let Some(frame) = decoder.finish() {
            self.handle_frame(kind, frame);
        }
        ended(kind)
    }

    /// Returns false once the stream signalled its end
    fn handle_frame(&mut self, kind: StreamKind, frame: Frame) -> bool {
        let payload = match frame {
            Frame::Done => return false,
            Frame::Data(payload) => payload,
        };
        let value: Value = match serde_json::from_str(&payload) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, ?kind, "Skipping malformed frame");
                return true;
            }
        };
        if let Some(text) = delta_content(&value) {
            let text = text.to_string();
            let event = match kind {
                StreamKind::Chat => Event::Fragment { text },
                StreamKind::Title => Event::TitleFragment { text },
            };
            // Fragments only touch the book and the observer
            if let Err(e) = self.step(event) {
                tracing::warn!(error = %e, "Dropped fragment");
            }
        }
        true
    }
}

fn ended(kind: StreamKind) -> Event {
    match kind {
        StreamKind::Chat => Event::StreamEnded,
        StreamKind::Title => Event::TitleEnded,
    }
}

fn failed(kind: StreamKind, message: String) -> Event {
    match kind {
        StreamKind::Chat => Event::StreamFailed { message },
        StreamKind::Title => Event::TitleFailed { message },
    }
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
