//! Client state types

use crate::llm::Message;
use crate::relay::RelayRequest;
use crate::system_prompt::TextStyle;

/// Native model selected when nothing else is chosen
pub const DEFAULT_MODEL: &str = "qiwi-medium";
/// Partner model preselected in the partner picker
pub const DEFAULT_PARTNER_MODEL: &str = "deepseek/deepseek-chat:free";

/// Main request cycle: `Idle -> AwaitingResponse -> Streaming -> Idle`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ChatPhase {
    #[default]
    Idle,
    /// Request sent, relay has not answered yet
    AwaitingResponse {
        conversation_id: String,
        /// Kept for the title request that may follow
        user_text: String,
    },
    /// Fragments are being appended to the assistant placeholder
    Streaming {
        conversation_id: String,
        user_text: String,
    },
}

impl ChatPhase {
    pub fn conversation_id(&self) -> Option<&str> {
        match self {
            ChatPhase::Idle => None,
            ChatPhase::AwaitingResponse {
                conversation_id, ..
            }
            | ChatPhase::Streaming {
                conversation_id, ..
            } => Some(conversation_id),
        }
    }
}

/// Title sub-cycle: `Idle -> AwaitingTitle -> Idle`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TitlePhase {
    #[default]
    Idle,
    AwaitingTitle {
        conversation_id: String,
        /// Fragments received so far
        text: String,
    },
}

/// Model and style choices applied to the next request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatSettings {
    pub model: String,
    pub partner_model: String,
    /// Partner picker was used last
    pub use_partner: bool,
    pub text_style: TextStyle,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            partner_model: DEFAULT_PARTNER_MODEL.to_string(),
            use_partner: false,
            text_style: TextStyle::Default,
        }
    }
}

impl ChatSettings {
    pub fn request_path(&self) -> RequestPath {
        if self.use_partner {
            RequestPath::Partner {
                model: self.partner_model.clone(),
            }
        } else {
            RequestPath::Native {
                model: self.model.clone(),
                text_style: self.text_style,
            }
        }
    }
}

/// How a chat request is addressed to the relay
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestPath {
    Native { model: String, text_style: TextStyle },
    /// Partner requests carry no text style
    Partner { model: String },
}

impl RequestPath {
    pub fn into_request(self, messages: Vec<Message>) -> RelayRequest {
        let (model, text_style) = match self {
            RequestPath::Native { model, text_style } => {
                (model, Some(text_style.as_str().to_string()))
            }
            RequestPath::Partner { model } => (model, None),
        };
        RelayRequest {
            messages,
            model,
            text_style,
            is_for_title: false,
        }
    }
}

/// Full client state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClientState {
    pub chat: ChatPhase,
    pub title: TitlePhase,
    pub settings: ChatSettings,
}

impl ClientState {
    pub fn is_loading(&self) -> bool {
        self.chat != ChatPhase::Idle
    }
}
