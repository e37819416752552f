//! Effects produced by state transitions

use super::book::Conversation;
use crate::llm::Message;
use crate::relay::RelayRequest;

/// Effects to be executed after a state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Prepend a conversation to the list and display it
    StartConversation { conversation: Conversation },

    AppendMessage {
        conversation_id: String,
        message: Message,
    },

    /// Extend the last message of the displayed conversation
    AppendFragment {
        conversation_id: String,
        text: String,
    },

    /// Replace the listed entry with the displayed copy
    CommitConversation { conversation_id: String },

    SelectConversation { conversation_id: String },

    RemoveConversation { conversation_id: String },

    ClearMessages { conversation_id: String },

    SetTitle {
        conversation_id: String,
        title: String,
    },

    /// Send a chat request to the relay
    OpenChatStream {
        conversation_id: String,
        request: RelayRequest,
    },

    /// Send a title request to the relay
    OpenTitleStream {
        conversation_id: String,
        request: RelayRequest,
    },

    /// Tell the observer
    Notify(Notice),
}

impl Effect {
    pub fn notify(notice: Notice) -> Self {
        Effect::Notify(notice)
    }
}

/// Something an observer may want to render
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Fragment {
        conversation_id: String,
        text: String,
    },
    ResponseComplete {
        conversation_id: String,
    },
    ResponseFailed {
        conversation_id: String,
        message: String,
    },
    TitleChanged {
        conversation_id: String,
        title: String,
    },
    TitleFailed {
        conversation_id: String,
        message: String,
    },
}
