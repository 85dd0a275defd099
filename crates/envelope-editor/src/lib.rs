#![forbid(unsafe_code)]

//! Editor side of the host/editor bridge.
//!
//! Runs inside the isolated frame. It owns the document content, applies the
//! commands the host sends, acknowledges them, and reports local edits. It
//! never sees the host's history; the only thing crossing the boundary is
//! messages.
//!
//! # Key Components
//!
//! - [`Editor`] - capability set every editor adapter implements
//! - [`ProcessEditor`], [`DecisionEditor`], [`ScenarioEditor`] - adapters
//!   selected by [`FileType`] through [`editor_for`] as an [`AnyEditor`]
//! - [`SnapshotStore`] - content snapshots behind adapter undo/redo
//! - [`EnvelopeServer`] - message handling loop for one editor

pub mod adapters;
pub mod document;
pub mod editor;
pub mod server;
pub mod snapshot;

pub use adapters::{
    AnyEditor, DecisionEditor, ProcessEditor, ScenarioEditor, editor_for, editor_for_path,
};
pub use document::DiagramDocument;
pub use editor::{Editor, EditorError, ElementPosition};
pub use envelope_protocol::FileType;
pub use server::EnvelopeServer;
pub use snapshot::{SnapshotConfig, SnapshotStore};
