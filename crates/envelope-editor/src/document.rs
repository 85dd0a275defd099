#![forbid(unsafe_code)]

//! XML diagram document shared by the editor adapters.
//!
//! Holds the content as snapshots so undo/redo coming from the host walks
//! the same timeline the editor's own edits produced.

use std::collections::BTreeMap;

use envelope_protocol::FileType;
use tracing::{debug, trace};

use crate::editor::{EditorError, ElementPosition};
use crate::snapshot::{SnapshotConfig, SnapshotStore};

const TARGET: &str = "envelope.editor";

/// Content, path and layout of one open diagram.
#[derive(Debug)]
pub struct DiagramDocument {
    file_type: FileType,
    root_element: &'static str,
    path: Option<String>,
    snapshots: SnapshotStore<String>,
    positions: BTreeMap<String, ElementPosition>,
    opened: bool,
}

impl DiagramDocument {
    /// Empty document whose XML root must be `root_element` (namespace
    /// prefixes are ignored).
    #[must_use]
    pub fn new(file_type: FileType, root_element: &'static str) -> Self {
        Self::with_config(file_type, root_element, SnapshotConfig::default())
    }

    #[must_use]
    pub fn with_config(
        file_type: FileType,
        root_element: &'static str,
        config: SnapshotConfig,
    ) -> Self {
        let mut snapshots = SnapshotStore::new(config);
        snapshots.reset(String::new());
        Self {
            file_type,
            root_element,
            path: None,
            snapshots,
            positions: BTreeMap::new(),
            opened: false,
        }
    }

    #[must_use]
    pub fn file_type(&self) -> FileType {
        self.file_type
    }

    /// Path of the loaded file, if any.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.opened
    }

    pub fn open(&mut self) {
        self.opened = true;
    }

    /// Current content.
    #[must_use]
    pub fn content(&self) -> &str {
        self.snapshots.current().map_or("", |s| s.as_str())
    }

    /// Replace the document with `content` and make it the undo baseline.
    ///
    /// Surrounding whitespace is trimmed. Empty content opens a new, blank
    /// diagram.
    pub fn load(&mut self, path: &str, content: &str) -> Result<(), EditorError> {
        let content = content.trim();
        self.check(content)?;
        self.snapshots.reset(content.to_owned());
        self.path = Some(path.to_owned());
        self.positions.clear();
        debug!(
            target: TARGET,
            file_type = %self.file_type,
            path,
            len = content.len(),
            "content loaded"
        );
        Ok(())
    }

    /// Commit a user edit. Returns `false` when the content is unchanged.
    pub fn edit(&mut self, content: impl Into<String>) -> bool {
        let content = content.into();
        if content == self.content() {
            trace!(target: TARGET, "edit left content unchanged");
            return false;
        }
        self.snapshots.push(content);
        debug!(target: TARGET, depth = self.snapshots.undo_depth(), "edit committed");
        true
    }

    pub fn undo(&mut self) -> bool {
        self.snapshots.undo().is_some()
    }

    pub fn redo(&mut self) -> bool {
        self.snapshots.redo().is_some()
    }

    /// Record where an element is laid out on screen.
    pub fn place(&mut self, selector: impl Into<String>, position: ElementPosition) {
        self.positions.insert(selector.into(), position);
    }

    #[must_use]
    pub fn element_position(&self, selector: &str) -> Option<ElementPosition> {
        self.positions.get(selector).copied()
    }

    /// Minimal SVG standing in for the rendered diagram.
    ///
    /// `None` while the document is blank.
    #[must_use]
    pub fn render_svg(&self) -> Option<String> {
        let content = self.content();
        if content.is_empty() {
            return None;
        }
        let title = escape_xml(self.path.as_deref().unwrap_or("untitled"));
        Some(format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" data-file-type=\"{}\" data-bytes=\"{}\"><title>{title}</title></svg>",
            self.file_type,
            content.len()
        ))
    }

    fn check(&self, content: &str) -> Result<(), EditorError> {
        if content.is_empty() {
            return Ok(());
        }
        let unsupported = |reason: String| EditorError::UnsupportedContent {
            file_type: self.file_type,
            reason,
        };
        if !content.starts_with('<') {
            return Err(unsupported("content is not XML".to_owned()));
        }
        match root_element_name(content) {
            Some(name) if name == self.root_element => Ok(()),
            Some(name) => Err(unsupported(format!(
                "expected <{}> root element, found <{name}>",
                self.root_element
            ))),
            None => Err(unsupported("no root element".to_owned())),
        }
    }
}

/// Local name of the first element, skipping declarations and comments.
fn root_element_name(xml: &str) -> Option<&str> {
    let mut rest = xml;
    loop {
        let start = rest.find('<')?;
        rest = &rest[start + 1..];
        if rest.starts_with('?') || rest.starts_with('!') {
            continue;
        }
        let end = rest
            .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
            .unwrap_or(rest.len());
        let qualified = &rest[..end];
        let local = qualified.rsplit(':').next().unwrap_or(qualified);
        return (!local.is_empty()).then_some(local);
    }
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
