#![forbid(unsafe_code)]

//! Canonical keyboard events forwarded from the host window to the editor.
//!
//! The host captures `keydown`/`keyup`/`keypress` at window level and
//! forwards every one of them, so shortcuts keep working while focus sits
//! outside the editor frame. The stream is one-way: no acknowledgement, no
//! backpressure.
//!
//! The JSON form keeps the field names editors already listen for:
//!
//! ```json
//! {"altKey":false,"ctrlKey":true,"shiftKey":false,"metaKey":false,
//!  "code":"KeyZ","type":"keydown","channelOriginalTargetTagName":"BODY"}
//! ```

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Modifier keys held during a keyboard event.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        const ALT   = 0b0001;
        const CTRL  = 0b0010;
        const SHIFT = 0b0100;
        const META  = 0b1000;
    }
}

/// DOM event type of a forwarded keyboard event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyEventType {
    Keydown,
    Keyup,
    Keypress,
}

impl KeyEventType {
    /// Parse a DOM event type name. Unknown names yield `None`.
    #[must_use]
    pub fn from_dom(name: &str) -> Option<Self> {
        match name {
            "keydown" => Some(Self::Keydown),
            "keyup" => Some(Self::Keyup),
            "keypress" => Some(Self::Keypress),
            _ => None,
        }
    }

    /// DOM event type name.
    #[must_use]
    pub const fn as_dom(self) -> &'static str {
        match self {
            Self::Keydown => "keydown",
            Self::Keyup => "keyup",
            Self::Keypress => "keypress",
        }
    }
}

/// A keyboard event in the canonical cross-frame shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "ChannelKeyboardEventJson", from = "ChannelKeyboardEventJson")]
pub struct ChannelKeyboardEvent {
    pub modifiers: Modifiers,
    /// Physical key code (`KeyZ`, `Enter`, `ArrowUp`, ...).
    pub code: String,
    pub kind: KeyEventType,
    /// Upper-cased tag name of the element that had focus.
    pub target_tag: Option<String>,
}

impl ChannelKeyboardEvent {
    /// Event without modifiers or target.
    #[must_use]
    pub fn new(kind: KeyEventType, code: impl Into<String>) -> Self {
        Self {
            modifiers: Modifiers::empty(),
            code: code.into(),
            kind,
            target_tag: None,
        }
    }

    /// Set the held modifiers.
    #[must_use]
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Set the originating element tag, normalized to upper case.
    #[must_use]
    pub fn with_target_tag(mut self, tag: &str) -> Self {
        let tag = tag.trim();
        self.target_tag = (!tag.is_empty()).then(|| tag.to_ascii_uppercase());
        self
    }

    /// Whether the event originated in a text-entry element, where editors
    /// usually let the key through instead of treating it as a shortcut.
    #[must_use]
    pub fn from_text_input(&self) -> bool {
        matches!(
            self.target_tag.as_deref(),
            Some("INPUT" | "TEXTAREA" | "SELECT")
        )
    }
}

/// Wire form of [`ChannelKeyboardEvent`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelKeyboardEventJson {
    alt_key: bool,
    ctrl_key: bool,
    shift_key: bool,
    meta_key: bool,
    code: String,
    #[serde(rename = "type")]
    kind: KeyEventType,
    #[serde(
        default,
        rename = "channelOriginalTargetTagName",
        skip_serializing_if = "Option::is_none"
    )]
    target_tag: Option<String>,
}

impl From<ChannelKeyboardEvent> for ChannelKeyboardEventJson {
    fn from(value: ChannelKeyboardEvent) -> Self {
        Self {
            alt_key: value.modifiers.contains(Modifiers::ALT),
            ctrl_key: value.modifiers.contains(Modifiers::CTRL),
            shift_key: value.modifiers.contains(Modifiers::SHIFT),
            meta_key: value.modifiers.contains(Modifiers::META),
            code: value.code,
            kind: value.kind,
            target_tag: value.target_tag,
        }
    }
}

impl From<ChannelKeyboardEventJson> for ChannelKeyboardEvent {
    fn from(value: ChannelKeyboardEventJson) -> Self {
        let mut modifiers = Modifiers::empty();
        modifiers.set(Modifiers::ALT, value.alt_key);
        modifiers.set(Modifiers::CTRL, value.ctrl_key);
        modifiers.set(Modifiers::SHIFT, value.shift_key);
        modifiers.set(Modifiers::META, value.meta_key);
        Self {
            modifiers,
            code: value.code,
            kind: value.kind,
            target_tag: value.target_tag,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn wire_shape_uses_dom_field_names() {
        let event = ChannelKeyboardEvent::new(KeyEventType::Keydown, "KeyZ")
            .with_modifiers(Modifiers::CTRL | Modifiers::SHIFT)
            .with_target_tag("body");
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(
            json,
            r#"{"altKey":false,"ctrlKey":true,"shiftKey":true,"metaKey":false,"code":"KeyZ","type":"keydown","channelOriginalTargetTagName":"BODY"}"#
        );
    }

    #[test]
    fn decodes_without_target_tag() {
        let json = r#"{"altKey":true,"ctrlKey":false,"shiftKey":false,"metaKey":true,"code":"KeyS","type":"keyup"}"#;
        let event: ChannelKeyboardEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.modifiers, Modifiers::ALT | Modifiers::META);
        assert_eq!(event.kind, KeyEventType::Keyup);
        assert_eq!(event.target_tag, None);
    }

    #[test]
    fn blank_target_tag_is_dropped() {
        let event =
            ChannelKeyboardEvent::new(KeyEventType::Keypress, "Enter").with_target_tag("  ");
        assert_eq!(event.target_tag, None);
    }

    #[test]
    fn dom_type_names() {
        for kind in [KeyEventType::Keydown, KeyEventType::Keyup, KeyEventType::Keypress] {
            assert_eq!(KeyEventType::from_dom(kind.as_dom()), Some(kind));
        }
        assert_eq!(KeyEventType::from_dom("keyhold"), None);
    }

    #[test]
    fn text_input_targets() {
        let typing =
            ChannelKeyboardEvent::new(KeyEventType::Keydown, "KeyA").with_target_tag("textarea");
        assert!(typing.from_text_input());
        let shortcut =
            ChannelKeyboardEvent::new(KeyEventType::Keydown, "KeyA").with_target_tag("div");
        assert!(!shortcut.from_text_input());
    }
}
