#![forbid(unsafe_code)]

//! Wire protocol between the host page and an embedded diagram editor.
//!
//! The editor runs in an isolated frame with its own event loop. Nothing is
//! shared: the host sends [`HostMessage`]s, the editor answers with
//! [`EditorMessage`]s, and both travel inside an [`Envelope`] that carries
//! the bus id, the message purpose and, for requests and responses, a
//! [`RequestId`].
//!
//! # How it fits in the system
//! `envelope-host` and `envelope-editor` both depend on this crate and on
//! nothing of each other. Transports are host-driven: a sender pushes into
//! an [`Outbox`] and the embedding drains it whenever it gets a turn, so
//! nothing here blocks or spawns threads.

pub mod envelope;
pub mod file_type;
pub mod keyboard;
pub mod message;
pub mod transport;

pub use envelope::{Envelope, ProtocolError, Purpose, RequestId, RequestIdGen};
pub use file_type::FileType;
pub use keyboard::{ChannelKeyboardEvent, KeyEventType, Modifiers};
pub use message::{EditorMessage, HostMessage};
pub use transport::{Outbox, Transport, TransportError};

pub use envelope_history::EventId;
