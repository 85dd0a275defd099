#![forbid(unsafe_code)]

//! Payloads exchanged between host and editor.
//!
//! | Host → editor | Purpose |
//! |---|---|
//! | `undo`, `redo`, `set_content`, `request_content`, `request_preview` | request |
//! | `locale_change`, `keyboard_event` | notification |
//!
//! | Editor → host | Purpose |
//! |---|---|
//! | `ack`, `not_moved`, `content`, `preview` | response |
//! | `ready`, `new_edit`, `set_content_error`, `locale_accepted` | notification |

use serde::{Deserialize, Serialize};

use crate::envelope::Purpose;
use crate::file_type::FileType;
use crate::keyboard::ChannelKeyboardEvent;
use envelope_history::EventId;

/// Commands the host sends to the editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostMessage {
    /// Step back one edit; the host history now sits at `target`.
    Undo { target: Option<EventId> },
    /// Step forward one edit; the host history now sits at `target`.
    Redo { target: Option<EventId> },
    /// Replace the whole document.
    SetContent { path: String, content: String },
    RequestContent,
    RequestPreview,
    /// The host locale changed. Editors load dictionaries at construction
    /// time only, so this never changes the running editor.
    LocaleChange { locale: String },
    KeyboardEvent { event: ChannelKeyboardEvent },
}

impl HostMessage {
    /// How the message is sent.
    #[must_use]
    pub fn purpose(&self) -> Purpose {
        match self {
            Self::Undo { .. }
            | Self::Redo { .. }
            | Self::SetContent { .. }
            | Self::RequestContent
            | Self::RequestPreview => Purpose::Request,
            Self::LocaleChange { .. } | Self::KeyboardEvent { .. } => Purpose::Notification,
        }
    }

    /// Short name for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Undo { .. } => "undo",
            Self::Redo { .. } => "redo",
            Self::SetContent { .. } => "set_content",
            Self::RequestContent => "request_content",
            Self::RequestPreview => "request_preview",
            Self::LocaleChange { .. } => "locale_change",
            Self::KeyboardEvent { .. } => "keyboard_event",
        }
    }
}

/// Events and answers the editor sends to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EditorMessage {
    /// The editor finished loading.
    Ready { file_type: FileType, locale: String },
    /// A local edit was committed inside the editor.
    NewEdit { edit_id: String },
    /// A request was applied.
    Ack,
    /// An `undo` or `redo` found nothing to step over; the editor stayed
    /// where it was.
    NotMoved,
    Content { content: String },
    Preview { svg: Option<String> },
    /// Content pushed by `set_content` could not be opened.
    SetContentError { message: String },
    /// The editor recorded a locale change; it takes effect after a remount.
    LocaleAccepted { locale: String },
}

impl EditorMessage {
    /// How the message is sent.
    #[must_use]
    pub fn purpose(&self) -> Purpose {
        match self {
            Self::Ack | Self::NotMoved | Self::Content { .. } | Self::Preview { .. } => {
                Purpose::Response
            }
            Self::Ready { .. }
            | Self::NewEdit { .. }
            | Self::SetContentError { .. }
            | Self::LocaleAccepted { .. } => Purpose::Notification,
        }
    }

    /// Short name for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ready { .. } => "ready",
            Self::NewEdit { .. } => "new_edit",
            Self::Ack => "ack",
            Self::NotMoved => "not_moved",
            Self::Content { .. } => "content",
            Self::Preview { .. } => "preview",
            Self::SetContentError { .. } => "set_content_error",
            Self::LocaleAccepted { .. } => "locale_accepted",
        }
    }
}
