#![forbid(unsafe_code)]

//! Editor adapters, one per diagram family.
//!
//! | Adapter | File types | Root element | Preview |
//! |---|---|---|---|
//! | [`ProcessEditor`] | `bpmn`, `bpmn2` | `definitions` | yes |
//! | [`DecisionEditor`] | `dmn` | `definitions` | yes |
//! | [`ScenarioEditor`] | `scesim` | `ScenarioSimulationModel` | no |

use envelope_protocol::FileType;

use crate::document::DiagramDocument;
use crate::editor::{Editor, EditorError, ElementPosition};

/// Implements [`Editor`] for an adapter wrapping a `doc: DiagramDocument`.
macro_rules! document_editor {
    ($adapter:ident, preview: $preview:expr) => {
        impl $adapter {
            /// Commit a local user edit. Returns `false` if nothing changed.
            pub fn edit(&mut self, content: impl Into<String>) -> bool {
                self.doc.edit(content)
            }

            #[must_use]
            pub fn document(&self) -> &DiagramDocument {
                &self.doc
            }

            pub fn document_mut(&mut self) -> &mut DiagramDocument {
                &mut self.doc
            }
        }

        impl Editor for $adapter {
            fn file_type(&self) -> FileType {
                self.doc.file_type()
            }

            fn open(&mut self) {
                self.doc.open();
            }

            fn content(&self) -> String {
                self.doc.content().to_owned()
            }

            fn set_content(&mut self, path: &str, content: &str) -> Result<(), EditorError> {
                self.doc.load(path, content)
            }

            fn undo(&mut self) -> bool {
                self.doc.undo()
            }

            fn redo(&mut self) -> bool {
                self.doc.redo()
            }

            fn preview(&self) -> Option<String> {
                let render: fn(&DiagramDocument) -> Option<String> = $preview;
                render(&self.doc)
            }

            fn element_position(&self, selector: &str) -> Option<ElementPosition> {
                self.doc.element_position(selector)
            }
        }
    };
}

/// BPMN process editor.
#[derive(Debug)]
pub struct ProcessEditor {
    doc: DiagramDocument,
}

impl ProcessEditor {
    #[must_use]
    pub fn bpmn() -> Self {
        Self {
            doc: DiagramDocument::new(FileType::Bpmn, "definitions"),
        }
    }

    #[must_use]
    pub fn bpmn2() -> Self {
        Self {
            doc: DiagramDocument::new(FileType::Bpmn2, "definitions"),
        }
    }
}

document_editor!(ProcessEditor, preview: DiagramDocument::render_svg);

/// DMN decision editor.
#[derive(Debug)]
pub struct DecisionEditor {
    doc: DiagramDocument,
}

impl Default for DecisionEditor {
    fn default() -> Self {
        Self {
            doc: DiagramDocument::new(FileType::Dmn, "definitions"),
        }
    }
}

impl DecisionEditor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

document_editor!(DecisionEditor, preview: DiagramDocument::render_svg);

/// Test scenario editor. Scenarios are grids, so there is no diagram preview.
#[derive(Debug)]
pub struct ScenarioEditor {
    doc: DiagramDocument,
}

impl Default for ScenarioEditor {
    fn default() -> Self {
        Self {
            doc: DiagramDocument::new(FileType::Scesim, "ScenarioSimulationModel"),
        }
    }
}

impl ScenarioEditor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

document_editor!(ScenarioEditor, preview: |_| None);

/// Any adapter, selected by declared file type.
#[derive(Debug)]
pub enum AnyEditor {
    Process(ProcessEditor),
    Decision(DecisionEditor),
    Scenario(ScenarioEditor),
}

impl AnyEditor {
    fn inner(&self) -> &dyn Editor {
        match self {
            Self::Process(e) => e,
            Self::Decision(e) => e,
            Self::Scenario(e) => e,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Editor {
        match self {
            Self::Process(e) => e,
            Self::Decision(e) => e,
            Self::Scenario(e) => e,
        }
    }

    /// Commit a local user edit. Returns `false` if nothing changed.
    pub fn edit(&mut self, content: impl Into<String>) -> bool {
        match self {
            Self::Process(e) => e.edit(content),
            Self::Decision(e) => e.edit(content),
            Self::Scenario(e) => e.edit(content),
        }
    }

    #[must_use]
    pub fn document(&self) -> &DiagramDocument {
        match self {
            Self::Process(e) => e.document(),
            Self::Decision(e) => e.document(),
            Self::Scenario(e) => e.document(),
        }
    }

    pub fn document_mut(&mut self) -> &mut DiagramDocument {
        match self {
            Self::Process(e) => e.document_mut(),
            Self::Decision(e) => e.document_mut(),
            Self::Scenario(e) => e.document_mut(),
        }
    }
}

impl Editor for AnyEditor {
    fn file_type(&self) -> FileType {
        self.inner().file_type()
    }

    fn open(&mut self) {
        self.inner_mut().open();
    }

    fn content(&self) -> String {
        self.inner().content()
    }

    fn set_content(&mut self, path: &str, content: &str) -> Result<(), EditorError> {
        self.inner_mut().set_content(path, content)
    }

    fn undo(&mut self) -> bool {
        self.inner_mut().undo()
    }

    fn redo(&mut self) -> bool {
        self.inner_mut().redo()
    }

    fn preview(&self) -> Option<String> {
        self.inner().preview()
    }

    fn element_position(&self, selector: &str) -> Option<ElementPosition> {
        self.inner().element_position(selector)
    }
}

/// Build the adapter for a declared file type.
#[must_use]
pub fn editor_for(file_type: FileType) -> AnyEditor {
    match file_type {
        FileType::Bpmn => AnyEditor::Process(ProcessEditor::bpmn()),
        FileType::Bpmn2 => AnyEditor::Process(ProcessEditor::bpmn2()),
        FileType::Dmn => AnyEditor::Decision(DecisionEditor::new()),
        FileType::Scesim => AnyEditor::Scenario(ScenarioEditor::new()),
    }
}

/// Build the adapter for the file at `path`, by extension.
pub fn editor_for_path(path: &str) -> Result<AnyEditor, EditorError> {
    FileType::from_path(path).map(editor_for).ok_or_else(|| {
        let extension = path.rsplit_once('.').map_or("", |(_, ext)| ext);
        EditorError::UnknownFileType(extension.to_owned())
    })
}
