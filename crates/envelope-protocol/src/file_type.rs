#![forbid(unsafe_code)]

//! Diagram file types an envelope can host.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Declared file type of the document opened in an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// Business process model.
    Bpmn,
    /// Business process model, BPMN 2 extension.
    Bpmn2,
    /// Decision model.
    Dmn,
    /// Scenario simulation.
    Scesim,
}

impl FileType {
    pub const ALL: [Self; 4] = [Self::Bpmn, Self::Bpmn2, Self::Dmn, Self::Scesim];

    /// Resolve a file extension (without the dot, any case).
    #[must_use]
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "bpmn" => Some(Self::Bpmn),
            "bpmn2" => Some(Self::Bpmn2),
            "dmn" => Some(Self::Dmn),
            "scesim" => Some(Self::Scesim),
            _ => None,
        }
    }

    /// Resolve the extension of a path such as `models/loan.dmn`.
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        let (_, extension) = path.rsplit_once('.')?;
        Self::from_extension(extension)
    }

    /// Canonical extension.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Bpmn => "bpmn",
            Self::Bpmn2 => "bpmn2",
            Self::Dmn => "dmn",
            Self::Scesim => "scesim",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extensions_round_trip() {
        for file_type in FileType::ALL {
            assert_eq!(FileType::from_extension(file_type.extension()), Some(file_type));
        }
    }

    #[test]
    fn extension_lookup_ignores_case() {
        assert_eq!(FileType::from_extension("DMN"), Some(FileType::Dmn));
        assert_eq!(FileType::from_extension("xml"), None);
    }

    #[test]
    fn path_lookup_uses_last_dot() {
        assert_eq!(FileType::from_path("a.b/loan.v2.scesim"), Some(FileType::Scesim));
        assert_eq!(FileType::from_path("README"), None);
    }
}
