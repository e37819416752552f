//! Conversation storage
//!
//! The displayed conversation is a working copy; its entry in the list is
//! replaced by id when a request cycle ends.

use super::effect::Effect;
use crate::llm::Message;
use crate::title_generator::DEFAULT_TITLE;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    pub id: String,
    pub title: String,
    pub messages: Vec<Message>,
    /// Creation time, milliseconds since the epoch
    pub timestamp: i64,
}

impl Conversation {
    pub fn new(id: impl Into<String>, timestamp: i64) -> Self {
        Self {
            id: id.into(),
            title: DEFAULT_TITLE.to_string(),
            messages: Vec::new(),
            timestamp,
        }
    }
}

/// All conversations plus the one on display
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationBook {
    conversations: Vec<Conversation>,
    current: Option<Conversation>,
}

impl ConversationBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Listed conversations, newest first
    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn current(&self) -> Option<&Conversation> {
        self.current.as_ref()
    }

    /// Latest known copy: the displayed one if it matches, else the listed one
    pub fn get(&self, id: &str) -> Option<&Conversation> {
        self.current
            .as_ref()
            .filter(|c| c.id == id)
            .or_else(|| self.conversations.iter().find(|c| c.id == id))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Apply a data effect; I/O and notification effects are ignored
    pub fn apply(&mut self, effect: &Effect) {
        match effect {
            Effect::StartConversation { conversation } => {
                self.conversations.insert(0, conversation.clone());
                self.current = Some(conversation.clone());
            }
            Effect::AppendMessage {
                conversation_id,
                message,
            } => {
                if let Some(current) = self.current_mut(conversation_id) {
                    current.messages.push(message.clone());
                }
            }
            Effect::AppendFragment {
                conversation_id,
                text,
            } => {
                if let Some(last) = self
                    .current_mut(conversation_id)
                    .and_then(|c| c.messages.last_mut())
                {
                    last.content.push_str(text);
                }
            }
            Effect::CommitConversation { conversation_id } => {
                let Some(current) = self.current.as_ref().filter(|c| &c.id == conversation_id)
                else {
                    return;
                };
                match self.conversations.iter_mut().find(|c| &c.id == conversation_id) {
                    Some(entry) => entry.clone_from(current),
                    None => self.conversations.insert(0, current.clone()),
                }
            }
            Effect::SelectConversation { conversation_id } => {
                if let Some(entry) = self.conversations.iter().find(|c| &c.id == conversation_id) {
                    self.current = Some(entry.clone());
                }
            }
            Effect::RemoveConversation { conversation_id } => {
                self.conversations.retain(|c| &c.id != conversation_id);
                if self.current_mut(conversation_id).is_some() {
                    self.current = None;
                }
            }
            Effect::ClearMessages { conversation_id } => {
                self.for_each_copy(conversation_id, |c| c.messages.clear());
            }
            Effect::SetTitle {
                conversation_id,
                title,
            } => {
                self.for_each_copy(conversation_id, |c| c.title.clone_from(title));
            }
            Effect::OpenChatStream { .. } | Effect::OpenTitleStream { .. } | Effect::Notify(_) => {}
        }
    }

    fn current_mut(&mut self, id: &str) -> Option<&mut Conversation> {
        self.current.as_mut().filter(|c| c.id == id)
    }

    fn for_each_copy(&mut self, id: &str, mut f: impl FnMut(&mut Conversation)) {
        if let Some(current) = self.current_mut(id) {
            f(current);
        }
        if let Some(entry) = self.conversations.iter_mut().find(|c| c.id == id) {
            f(entry);
        }
    }
}
