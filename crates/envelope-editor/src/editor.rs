#![forbid(unsafe_code)]

//! The capability set of an embedded editor.

use std::fmt;

use envelope_protocol::FileType;

/// Screen rectangle of an editor element, used by guided tours.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementPosition {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Errors an editor reports back through the bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorError {
    /// The content cannot be opened by this editor.
    UnsupportedContent {
        file_type: FileType,
        reason: String,
    },
    /// No adapter exists for the file extension.
    UnknownFileType(String),
}

impl fmt::Display for EditorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedContent { file_type, reason } => {
                write!(f, "unsupported {file_type} content: {reason}")
            }
            Self::UnknownFileType(extension) => write!(f, "no editor for '.{extension}' files"),
        }
    }
}

impl std::error::Error for EditorError {}

/// What every editor adapter can do.
///
/// The host picks the adapter by declared file type and then talks to it
/// only through these operations.
pub trait Editor {
    /// File type this editor was built for.
    fn file_type(&self) -> FileType;

    /// Called once the editor is shown.
    fn open(&mut self);

    /// Current document content.
    fn content(&self) -> String;

    /// Replace the document. The loaded content becomes the undo baseline.
    fn set_content(&mut self, path: &str, content: &str) -> Result<(), EditorError>;

    /// Step back one edit. Returns `false` if there was nothing to undo.
    fn undo(&mut self) -> bool;

    /// Step forward one edit. Returns `false` if there was nothing to redo.
    fn redo(&mut self) -> bool;

    /// SVG preview of the diagram, if the editor can produce one.
    fn preview(&self) -> Option<String>;

    /// Position of the element matching `selector`.
    fn element_position(&self, selector: &str) -> Option<ElementPosition>;
}
