//! Property-based tests for the client state machine
//!
//! Random operation sequences are driven through the pure transition
//! function, applying data effects to a book the way the runtime does.

use super::book::ConversationBook;
use super::effect::Effect;
use super::event::Event;
use super::state::ClientState;
use super::transition::{transition, TransitionError};
use crate::llm::Message;
use crate::title_generator::is_default_title;
use proptest::prelude::*;
use proptest::sample::Index;

// ============================================================================
// Simulation
// ============================================================================

#[derive(Debug, Clone)]
enum Op {
    Submit(String),
    Opened,
    Fragment(String),
    Ended,
    Failed,
    TitleFragment(String),
    TitleEnded,
    TitleFailed,
    New,
    Select(Index),
    Delete(Index),
    Rename(Index, String),
    Clear,
    Native,
    Partner,
}

#[derive(Default)]
struct Sim {
    state: ClientState,
    book: ConversationBook,
    counter: usize,
}

impl Sim {
    fn pick(&self, index: &Index) -> String {
        let ids = self.book.conversations();
        if ids.is_empty() {
            "missing".to_string()
        } else {
            ids[index.index(ids.len())].id.clone()
        }
    }

    fn event(&mut self, op: &Op) -> Event {
        self.counter += 1;
        let new_id = format!("c{}", self.counter);
        let now = i64::try_from(self.counter).unwrap_or_default();
        match op {
            Op::Submit(text) => Event::Submit {
                text: text.clone(),
                new_id,
                now,
            },
            Op::Opened => Event::ResponseOpened,
            Op::Fragment(text) => Event::Fragment { text: text.clone() },
            Op::Ended => Event::StreamEnded,
            Op::Failed => Event::StreamFailed {
                message: "failed".to_string(),
            },
            Op::TitleFragment(text) => Event::TitleFragment { text: text.clone() },
            Op::TitleEnded => Event::TitleEnded,
            Op::TitleFailed => Event::TitleFailed {
                message: "failed".to_string(),
            },
            Op::New => Event::NewConversation { new_id, now },
            Op::Select(i) => Event::SelectConversation { id: self.pick(i) },
            Op::Delete(i) => Event::DeleteConversation { id: self.pick(i) },
            Op::Rename(i, title) => Event::RenameConversation {
                id: self.pick(i),
                title: title.clone(),
            },
            Op::Clear => Event::ClearCurrent,
            Op::Native => Event::SelectModel {
                model: "qiwi-small".to_string(),
            },
            Op::Partner => Event::SelectPartnerModel {
                model: "qwen/qwen-plus".to_string(),
            },
        }
    }

    fn apply(&mut self, event: Event) -> Result<Vec<Effect>, TransitionError> {
        let result = transition(&self.state, &self.book, event)?;
        for effect in &result.effects {
            self.book.apply(effect);
        }
        self.state = result.new_state;
        Ok(result.effects)
    }

    /// Latest copy of every known conversation
    fn snapshot(&self) -> Vec<(String, String, Vec<Message>)> {
        self.book
            .conversations()
            .iter()
            .filter_map(|c| self.book.get(&c.id))
            .map(|c| (c.id.clone(), c.title.clone(), c.messages.clone()))
            .collect()
    }
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_text() -> impl Strategy<Value = String> {
    "[a-zA-Z ]{0,12}"
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => arb_text().prop_map(Op::Submit),
        3 => Just(Op::Opened),
        4 => arb_text().prop_map(Op::Fragment),
        2 => Just(Op::Ended),
        1 => Just(Op::Failed),
        2 => arb_text().prop_map(Op::TitleFragment),
        2 => Just(Op::TitleEnded),
        1 => Just(Op::TitleFailed),
        1 => Just(Op::New),
        1 => any::<Index>().prop_map(Op::Select),
        1 => any::<Index>().prop_map(Op::Delete),
        1 => (any::<Index>(), arb_text()).prop_map(|(i, t)| Op::Rename(i, t)),
        1 => Just(Op::Clear),
        1 => Just(Op::Native),
        1 => Just(Op::Partner),
    ]
}

fn is_prefix(before: &[Message], after: &[Message]) -> bool {
    before.len() <= after.len()
        && before
            .iter()
            .zip(after)
            .all(|(b, a)| b.role == a.role && a.content.starts_with(&b.content))
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_blank_submit_is_rejected_everywhere(
        ops in prop::collection::vec(arb_op(), 0..40),
        blank in "[ \t\n]{0,5}",
    ) {
        let mut sim = Sim::default();
        for op in &ops {
            let event = sim.event(op);
            let _ = sim.apply(event);
        }

        let event = Event::Submit { text: blank, new_id: "new".to_string(), now: 0 };
        prop_assert_eq!(
            transition(&sim.state, &sim.book, event).unwrap_err(),
            TransitionError::EmptyInput
        );
    }

    #[test]
    fn prop_fragments_concatenate_in_order(fragments in prop::collection::vec("[a-zA-Z0-9 ]{0,8}", 0..20)) {
        let mut sim = Sim::default();
        let event = sim.event(&Op::Submit("question".to_string()));
        sim.apply(event).unwrap();
        sim.apply(Event::ResponseOpened).unwrap();
        for text in &fragments {
            sim.apply(Event::Fragment { text: text.clone() }).unwrap();
        }
        sim.apply(Event::StreamEnded).unwrap();

        let conv = &sim.book.conversations()[0];
        prop_assert_eq!(&conv.messages[1].content, &fragments.concat());
        prop_assert!(!sim.state.is_loading());
    }

    #[test]
    fn prop_custom_title_is_never_overwritten(ops in prop::collection::vec(arb_op(), 0..60)) {
        let mut sim = Sim::default();
        for op in &ops {
            let before = sim.snapshot();
            let event = sim.event(op);
            let renamed = match &event {
                Event::RenameConversation { id, .. } => Some(id.clone()),
                _ => None,
            };
            let _ = sim.apply(event);

            for (id, title, _) in &before {
                if is_default_title(title) || renamed.as_ref() == Some(id) {
                    continue;
                }
                if let Some(now) = sim.book.get(id) {
                    prop_assert_eq!(&now.title, title);
                }
            }
        }
    }

    #[test]
    fn prop_messages_only_grow(ops in prop::collection::vec(arb_op(), 0..60)) {
        let mut sim = Sim::default();
        for op in &ops {
            let before = sim.snapshot();
            let event = sim.event(op);
            let resets = matches!(
                event,
                Event::ClearCurrent | Event::DeleteConversation { .. }
            );
            let _ = sim.apply(event);
            if resets {
                continue;
            }

            for (id, _, messages) in &before {
                let now = sim.book.get(id);
                prop_assert!(now.is_some(), "conversation {} vanished", id);
                if let Some(now) = now {
                    prop_assert!(is_prefix(messages, &now.messages));
                }
            }
        }
    }

    #[test]
    fn prop_loading_iff_chat_cycle_open(ops in prop::collection::vec(arb_op(), 0..60)) {
        let mut sim = Sim::default();
        for op in &ops {
            let event = sim.event(op);
            if let Ok(effects) = sim.apply(event) {
                let opened = effects.iter().any(|e| matches!(e, Effect::OpenChatStream { .. }));
                if opened {
                    prop_assert!(sim.state.is_loading());
                }
            }
            if let Some(id) = sim.state.chat.conversation_id() {
                prop_assert!(sim.book.contains(id));
            }
        }
    }
}
