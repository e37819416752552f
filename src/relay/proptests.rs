//! Property tests for provider routing
//!
//! Whatever model id a client sends, the relay picks the partner provider
//! exactly when the id names a partner model, and always prepends one
//! system message to the unchanged conversation.

use super::*;
use crate::llm::{ModelCatalog, Role};
use proptest::prelude::*;

fn arb_model_id() -> impl Strategy<Value = String> {
    let known: Vec<String> = ModelCatalog::builtin()
        .models
        .into_iter()
        .map(|m| m.id)
        .collect();
    prop_oneof![
        prop::sample::select(known),
        "[a-z0-9/:._-]{0,30}",
    ]
}

fn arb_message() -> impl Strategy<Value = Message> {
    (any::<bool>(), "[a-zA-Z0-9 ?!.,]{0,80}").prop_map(|(user, text)| {
        if user {
            Message::user(text)
        } else {
            Message::assistant(text)
        }
    })
}

fn arb_request() -> impl Strategy<Value = RelayRequest> {
    (
        prop::collection::vec(arb_message(), 0..8),
        arb_model_id(),
        prop::option::of("[a-z]{0,12}"),
        any::<bool>(),
    )
        .prop_map(|(messages, model, text_style, is_for_title)| RelayRequest {
            messages,
            model,
            text_style,
            is_for_title,
        })
}

proptest! {
    #[test]
    fn prop_partner_iff_partner_model(request in arb_request()) {
        let (relay, _) = mock_relay(ForwardPolicy::Filtered);
        let prepared = relay.prepare(&request);

        let expected = if relay.registry().is_partner(&request.model) {
            Provider::Partner
        } else {
            Provider::Native
        };
        prop_assert_eq!(prepared.provider, expected);
        prop_assert_eq!(
            relay.registry().endpoint(prepared.provider).provider,
            expected
        );
    }

    #[test]
    fn prop_conversation_forwarded_behind_one_system_message(request in arb_request()) {
        let (relay, _) = mock_relay(ForwardPolicy::Filtered);
        let prepared = relay.prepare(&request);
        let body = prepared.body;

        prop_assert!(body.stream);
        prop_assert_eq!(body.messages.len(), request.messages.len() + 1);
        prop_assert_eq!(body.messages[0].role, Role::System);
        prop_assert!(!body.messages[0].content.is_empty());
        prop_assert_eq!(&body.messages[1..], &request.messages[..]);
    }
}
