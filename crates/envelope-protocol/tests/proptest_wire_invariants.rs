#![forbid(unsafe_code)]

//! Property tests for the bridge wire format.
//!
//! # Invariants
//!
//! 1. **Modifier fidelity**: each DOM boolean maps to exactly one modifier
//!    bit, whatever combination is held.
//! 2. **Purpose framing**: an envelope built for a message's purpose decodes
//!    with the same purpose and request id; notifications never carry one.
//! 3. **Id monotonicity**: generated request ids strictly increase.
//!
//! Run:
//!   cargo test -p envelope-protocol --test proptest_wire_invariants

use envelope_protocol::{
    ChannelKeyboardEvent, Envelope, EventId, HostMessage, KeyEventType, Modifiers, Purpose,
    RequestIdGen,
};
use proptest::prelude::*;

fn kind() -> impl Strategy<Value = KeyEventType> {
    prop_oneof![
        Just(KeyEventType::Keydown),
        Just(KeyEventType::Keyup),
        Just(KeyEventType::Keypress),
    ]
}

fn host_message() -> impl Strategy<Value = HostMessage> {
    prop_oneof![
        proptest::option::of("[a-z]{1,6}#[0-9]{1,3}")
            .prop_map(|t| HostMessage::Undo { target: t.map(EventId::new) }),
        proptest::option::of("[a-z]{1,6}#[0-9]{1,3}")
            .prop_map(|t| HostMessage::Redo { target: t.map(EventId::new) }),
        ("[a-z]{1,8}\\.dmn", ".{0,40}")
            .prop_map(|(path, content)| HostMessage::SetContent { path, content }),
        Just(HostMessage::RequestContent),
        Just(HostMessage::RequestPreview),
        "[a-z]{2}(-[A-Z]{2})?".prop_map(|locale| HostMessage::LocaleChange { locale }),
        (kind(), "Key[A-Z]").prop_map(|(k, code)| HostMessage::KeyboardEvent {
            event: ChannelKeyboardEvent::new(k, code),
        }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn modifier_booleans_map_one_to_one(
        alt in any::<bool>(),
        ctrl in any::<bool>(),
        shift in any::<bool>(),
        meta in any::<bool>(),
        k in kind(),
    ) {
        let json = serde_json::json!({
            "altKey": alt,
            "ctrlKey": ctrl,
            "shiftKey": shift,
            "metaKey": meta,
            "code": "KeyQ",
            "type": k.as_dom(),
        });
        let event: ChannelKeyboardEvent = serde_json::from_value(json).unwrap();
        prop_assert_eq!(event.modifiers.contains(Modifiers::ALT), alt);
        prop_assert_eq!(event.modifiers.contains(Modifiers::CTRL), ctrl);
        prop_assert_eq!(event.modifiers.contains(Modifiers::SHIFT), shift);
        prop_assert_eq!(event.modifiers.contains(Modifiers::META), meta);
        let held = [alt, ctrl, shift, meta].iter().filter(|&&b| b).count();
        prop_assert_eq!(event.modifiers.bits().count_ones() as usize, held);
        prop_assert_eq!(event.kind, k);
    }

    #[test]
    fn envelope_framing_follows_purpose(message in host_message(), seed in 0u8..20) {
        let mut ids = RequestIdGen::new();
        for _ in 0..seed {
            ids.next();
        }
        let envelope = match message.purpose() {
            Purpose::Request => Envelope::request("bus", ids.next(), message.clone()),
            _ => Envelope::notification("bus", message.clone()),
        };
        let decoded = Envelope::<HostMessage>::from_json(&envelope.to_json().unwrap()).unwrap();
        prop_assert_eq!(decoded.purpose, message.purpose());
        prop_assert_eq!(decoded.request_id.is_some(), message.purpose() == Purpose::Request);
        if let Some(id) = decoded.request_id {
            prop_assert_eq!(id.0, u64::from(seed) + 1);
        }
        prop_assert_eq!(decoded.payload, message);
    }

    #[test]
    fn request_ids_strictly_increase(count in 1usize..100) {
        let mut ids = RequestIdGen::new();
        let mut previous = None;
        for _ in 0..count {
            let id = ids.next();
            if let Some(prev) = previous {
                prop_assert!(id > prev);
            }
            previous = Some(id);
        }
        prop_assert_eq!(ids.last(), previous);
    }
}
