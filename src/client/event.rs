//! Events that drive the client

use crate::system_prompt::TextStyle;

/// Events that trigger state transitions
///
/// Ids and timestamps are generated by the runtime and passed in, keeping
/// the transition function deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // User events
    Submit {
        text: String,
        /// Id used if a new conversation has to be started
        new_id: String,
        /// Milliseconds since the epoch
        now: i64,
    },
    NewConversation {
        new_id: String,
        now: i64,
    },
    SelectConversation {
        id: String,
    },
    DeleteConversation {
        id: String,
    },
    RenameConversation {
        id: String,
        title: String,
    },
    ClearCurrent,
    SelectModel {
        model: String,
    },
    SelectPartnerModel {
        model: String,
    },
    SetTextStyle {
        style: TextStyle,
    },

    // Chat stream events
    ResponseOpened,
    Fragment {
        text: String,
    },
    StreamEnded,
    StreamFailed {
        message: String,
    },

    // Title stream events
    TitleFragment {
        text: String,
    },
    TitleEnded,
    TitleFailed {
        message: String,
    },
}
