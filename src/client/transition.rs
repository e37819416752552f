//! Pure state transition function

use super::book::{Conversation, ConversationBook};
use super::effect::{Effect, Notice};
use super::event::Event;
use super::state::{ChatPhase, ClientState, TitlePhase};
use crate::llm::Message;
use crate::title_generator::{is_default_title, normalize_title, title_request};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: ClientState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ClientState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    #[must_use]
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    #[must_use]
    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Message is empty")]
    EmptyInput,
    #[error("A response is still streaming")]
    Busy,
    #[error("No conversation with id {0}")]
    UnknownConversation(String),
    #[error("Title is empty")]
    EmptyTitle,
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Pure transition function
///
/// Given the same state, book and event it always produces the same result
/// and performs no I/O. The book is read-only here; changes to it are
/// expressed as effects.
#[allow(clippy::too_many_lines)] // One arm per event
pub fn transition(
    state: &ClientState,
    book: &ConversationBook,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match event {
        // ============================================================
        // Submission
        // ============================================================
        Event::Submit { text, new_id, now } => {
            if text.trim().is_empty() {
                return Err(TransitionError::EmptyInput);
            }
            if state.is_loading() {
                return Err(TransitionError::Busy);
            }

            let mut effects = Vec::new();
            let (conversation_id, mut history) = match book.current() {
                Some(current) => (current.id.clone(), current.messages.clone()),
                None => {
                    effects.push(Effect::StartConversation {
                        conversation: Conversation::new(new_id.clone(), now),
                    });
                    (new_id, Vec::new())
                }
            };

            let message = Message::user(text.clone());
            history.push(message.clone());
            effects.push(Effect::AppendMessage {
                conversation_id: conversation_id.clone(),
                message,
            });
            effects.push(Effect::OpenChatStream {
                conversation_id: conversation_id.clone(),
                request: state.settings.request_path().into_request(history),
            });

            let mut new_state = state.clone();
            new_state.chat = ChatPhase::AwaitingResponse {
                conversation_id,
                user_text: text,
            };
            Ok(TransitionResult::new(new_state).with_effects(effects))
        }

        // ============================================================
        // Chat stream
        // ============================================================
        Event::ResponseOpened => match &state.chat {
            ChatPhase::AwaitingResponse {
                conversation_id,
                user_text,
            } => {
                let mut new_state = state.clone();
                new_state.chat = ChatPhase::Streaming {
                    conversation_id: conversation_id.clone(),
                    user_text: user_text.clone(),
                };
                Ok(TransitionResult::new(new_state).with_effect(Effect::AppendMessage {
                    conversation_id: conversation_id.clone(),
                    message: Message::assistant(""),
                }))
            }
            other => Err(invalid("ResponseOpened", other)),
        },

        Event::Fragment { text } => match &state.chat {
            ChatPhase::Streaming {
                conversation_id, ..
            } => Ok(TransitionResult::new(state.clone()).with_effects([
                Effect::AppendFragment {
                    conversation_id: conversation_id.clone(),
                    text: text.clone(),
                },
                Effect::notify(Notice::Fragment {
                    conversation_id: conversation_id.clone(),
                    text,
                }),
            ])),
            other => Err(invalid("Fragment", other)),
        },

        Event::StreamEnded => match &state.chat {
            ChatPhase::Streaming {
                conversation_id,
                user_text,
            } => {
                let mut new_state = state.clone();
                new_state.chat = ChatPhase::Idle;
                let mut result = TransitionResult::new(new_state).with_effects([
                    Effect::CommitConversation {
                        conversation_id: conversation_id.clone(),
                    },
                    Effect::notify(Notice::ResponseComplete {
                        conversation_id: conversation_id.clone(),
                    }),
                ]);

                let untitled = book
                    .get(conversation_id)
                    .is_some_and(|c| is_default_title(&c.title));
                if untitled && result.new_state.title == TitlePhase::Idle {
                    result.new_state.title = TitlePhase::AwaitingTitle {
                        conversation_id: conversation_id.clone(),
                        text: String::new(),
                    };
                    result = result.with_effect(Effect::OpenTitleStream {
                        conversation_id: conversation_id.clone(),
                        request: title_request(user_text, &state.settings.model),
                    });
                }
                Ok(result)
            }
            other => Err(invalid("StreamEnded", other)),
        },

        Event::StreamFailed { message } => match &state.chat {
            ChatPhase::AwaitingResponse {
                conversation_id, ..
            }
            | ChatPhase::Streaming {
                conversation_id, ..
            } => {
                let mut new_state = state.clone();
                new_state.chat = ChatPhase::Idle;
                // Whatever already arrived stays in the conversation
                Ok(TransitionResult::new(new_state).with_effects([
                    Effect::CommitConversation {
                        conversation_id: conversation_id.clone(),
                    },
                    Effect::notify(Notice::ResponseFailed {
                        conversation_id: conversation_id.clone(),
                        message,
                    }),
                ]))
            }
            other => Err(invalid("StreamFailed", other)),
        },

        // ============================================================
        // Title stream
        // ============================================================
        Event::TitleFragment { text } => match &state.title {
            TitlePhase::AwaitingTitle {
                conversation_id,
                text: so_far,
            } => {
                let mut new_state = state.clone();
                new_state.title = TitlePhase::AwaitingTitle {
                    conversation_id: conversation_id.clone(),
                    text: format!("{so_far}{text}"),
                };
                Ok(TransitionResult::new(new_state))
            }
            TitlePhase::Idle => Err(TransitionError::InvalidTransition(
                "TitleFragment while no title is pending".to_string(),
            )),
        },

        Event::TitleEnded => match &state.title {
            TitlePhase::AwaitingTitle {
                conversation_id,
                text,
            } => {
                let mut new_state = state.clone();
                new_state.title = TitlePhase::Idle;
                let mut result = TransitionResult::new(new_state);

                // Renamed, cleared away or deleted while the title streamed
                let still_untitled = book
                    .get(conversation_id)
                    .is_some_and(|c| is_default_title(&c.title));
                if let Some(title) = normalize_title(text).filter(|_| still_untitled) {
                    result = result.with_effects([
                        Effect::SetTitle {
                            conversation_id: conversation_id.clone(),
                            title: title.clone(),
                        },
                        Effect::notify(Notice::TitleChanged {
                            conversation_id: conversation_id.clone(),
                            title,
                        }),
                    ]);
                }
                Ok(result)
            }
            TitlePhase::Idle => Err(TransitionError::InvalidTransition(
                "TitleEnded while no title is pending".to_string(),
            )),
        },

        Event::TitleFailed { message } => match &state.title {
            TitlePhase::AwaitingTitle {
                conversation_id, ..
            } => {
                let mut new_state = state.clone();
                new_state.title = TitlePhase::Idle;
                Ok(TransitionResult::new(new_state).with_effect(Effect::notify(
                    Notice::TitleFailed {
                        conversation_id: conversation_id.clone(),
                        message,
                    },
                )))
            }
            TitlePhase::Idle => Err(TransitionError::InvalidTransition(
                "TitleFailed while no title is pending".to_string(),
            )),
        },

        // ============================================================
        // Conversation management
        // ============================================================
        Event::NewConversation { new_id, now } => {
            if state.is_loading() {
                return Err(TransitionError::Busy);
            }
            Ok(
                TransitionResult::new(state.clone()).with_effect(Effect::StartConversation {
                    conversation: Conversation::new(new_id, now),
                }),
            )
        }

        Event::SelectConversation { id } => {
            if state.is_loading() {
                return Err(TransitionError::Busy);
            }
            if !book.conversations().iter().any(|c| c.id == id) {
                return Err(TransitionError::UnknownConversation(id));
            }
            Ok(
                TransitionResult::new(state.clone()).with_effect(Effect::SelectConversation {
                    conversation_id: id,
                }),
            )
        }

        Event::DeleteConversation { id } => {
            if !book.contains(&id) {
                return Err(TransitionError::UnknownConversation(id));
            }
            if state.chat.conversation_id() == Some(id.as_str()) {
                return Err(TransitionError::Busy);
            }
            Ok(
                TransitionResult::new(state.clone()).with_effect(Effect::RemoveConversation {
                    conversation_id: id,
                }),
            )
        }

        Event::RenameConversation { id, title } => {
            let title = title.trim();
            if title.is_empty() {
                return Err(TransitionError::EmptyTitle);
            }
            if !book.contains(&id) {
                return Err(TransitionError::UnknownConversation(id));
            }
            Ok(TransitionResult::new(state.clone()).with_effects([
                Effect::SetTitle {
                    conversation_id: id.clone(),
                    title: title.to_string(),
                },
                Effect::notify(Notice::TitleChanged {
                    conversation_id: id,
                    title: title.to_string(),
                }),
            ]))
        }

        Event::ClearCurrent => {
            if state.is_loading() {
                return Err(TransitionError::Busy);
            }
            let result = TransitionResult::new(state.clone());
            Ok(match book.current() {
                Some(current) => result.with_effect(Effect::ClearMessages {
                    conversation_id: current.id.clone(),
                }),
                None => result,
            })
        }

        // ============================================================
        // Settings
        // ============================================================
        Event::SelectModel { model } => {
            let mut new_state = state.clone();
            new_state.settings.model = model;
            new_state.settings.use_partner = false;
            Ok(TransitionResult::new(new_state))
        }

        Event::SelectPartnerModel { model } => {
            let mut new_state = state.clone();
            new_state.settings.partner_model = model;
            new_state.settings.use_partner = true;
            Ok(TransitionResult::new(new_state))
        }

        Event::SetTextStyle { style } => {
            let mut new_state = state.clone();
            new_state.settings.text_style = style;
            Ok(TransitionResult::new(new_state))
        }
    }
}

fn invalid(event: &str, phase: &ChatPhase) -> TransitionError {
    TransitionError::InvalidTransition(format!("{event} in chat phase {phase:?}"))
}
