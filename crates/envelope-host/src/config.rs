#![forbid(unsafe_code)]

//! Host configuration loaded from TOML or JSON.
//!
//! ```toml
//! [history]
//! max_depth = 500
//!
//! [runner]
//! port = "8081"
//!
//! [locale]
//! default = "en"
//! supported = ["en", "pt", "ja"]
//!
//! [envelopes.dmn]
//! resources_path_prefix = "dist/dmn"
//! envelope_path = "dist/envelope/index.html"
//! ```
//!
//! Every field has a default, so an empty document is a valid config.

use std::collections::BTreeMap;
use std::path::Path;

use envelope_history::HistoryConfig;
use envelope_protocol::FileType;
use serde::{Deserialize, Serialize};
use web_time::Duration;

/// Top-level host configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    pub history: HistorySection,
    pub runner: RunnerSection,
    pub locale: LocaleSection,
    /// File extension to envelope resources.
    pub envelopes: BTreeMap<String, EnvelopeMapping>,
}

impl Default for HostConfig {
    fn default() -> Self {
        let envelopes = FileType::ALL
            .into_iter()
            .map(|file_type| {
                (file_type.extension().to_owned(), EnvelopeMapping::bundled(file_type))
            })
            .collect();
        Self {
            history: HistorySection::default(),
            runner: RunnerSection::default(),
            locale: LocaleSection::default(),
            envelopes,
        }
    }
}

/// Command history limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistorySection {
    /// Oldest events are evicted beyond this depth. Default: 1000.
    pub max_depth: usize,
}

impl Default for HistorySection {
    fn default() -> Self {
        Self { max_depth: 1000 }
    }
}

/// Embedded runner polling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerSection {
    /// Liveness poll interval. Default: 1000.
    pub poll_interval_ms: u64,
    /// Quiet period before refreshing the runner schema. Default: 200.
    pub refresh_debounce_ms: u64,
    /// Local port the runner listens on. Default: "8080".
    pub port: String,
}

impl Default for RunnerSection {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            refresh_debounce_ms: 200,
            port: "8080".to_owned(),
        }
    }
}

/// Editor locales.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocaleSection {
    pub default: String,
    pub supported: Vec<String>,
}

impl Default for LocaleSection {
    fn default() -> Self {
        Self {
            default: "en".to_owned(),
            supported: vec!["en".to_owned()],
        }
    }
}

/// Where an editor envelope and its resources are served from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeMapping {
    pub resources_path_prefix: String,
    pub envelope_path: String,
}

impl EnvelopeMapping {
    /// Layout shipped with the extension. Both process dialects share one
    /// resource bundle.
    #[must_use]
    pub fn bundled(file_type: FileType) -> Self {
        let bundle = match file_type {
            FileType::Bpmn | FileType::Bpmn2 => "bpmn",
            FileType::Dmn => "dmn",
            FileType::Scesim => "scesim",
        };
        Self {
            resources_path_prefix: format!("dist/{bundle}"),
            envelope_path: "dist/envelope/index.html".to_owned(),
        }
    }
}

impl HostConfig {
    /// Load from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(ConfigError::Toml)
    }

    /// Load from a TOML file on disk.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(ConfigError::Json)
    }

    /// Load from a JSON file on disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// Load a TOML or JSON file (by extension) and reject invalid values.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_file(path)?,
            _ => Self::from_toml_file(path)?,
        };
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Validate all parameters. An empty list means the config is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.history.max_depth == 0 {
            errors.push("history.max_depth must be > 0".into());
        }

        if self.runner.poll_interval_ms == 0 {
            errors.push("runner.poll_interval_ms must be > 0".into());
        }
        match self.runner.port.parse::<u16>() {
            Ok(port) if port > 0 => {}
            _ => errors.push(format!(
                "runner.port must be a port number in 1..=65535, got {:?}",
                self.runner.port
            )),
        }

        if self.locale.default.trim().is_empty() {
            errors.push("locale.default must not be empty".into());
        }
        if !self.locale.supported.contains(&self.locale.default) {
            errors.push(format!(
                "locale.supported must contain the default locale {:?}",
                self.locale.default
            ));
        }

        for (extension, mapping) in &self.envelopes {
            if FileType::from_extension(extension).is_none() {
                errors.push(format!("envelopes.{extension}: unknown file extension"));
            }
            if mapping.envelope_path.trim().is_empty() {
                errors.push(format!("envelopes.{extension}.envelope_path must not be empty"));
            }
        }

        errors
    }

    /// History settings for a new session.
    #[must_use]
    pub fn to_history_config(&self) -> HistoryConfig {
        HistoryConfig::new(self.history.max_depth)
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.runner.poll_interval_ms)
    }

    #[must_use]
    pub fn refresh_debounce(&self) -> Duration {
        Duration::from_millis(self.runner.refresh_debounce_ms)
    }

    /// Envelope resources for a file type, if configured.
    #[must_use]
    pub fn envelope_for(&self, file_type: FileType) -> Option<&EnvelopeMapping> {
        self.envelopes.get(file_type.extension())
    }
}

/// Errors that can occur when loading a host configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    Toml(toml::de::Error),
    /// JSON parse error.
    Json(serde_json::Error),
    /// Validation errors.
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Validation(errors) => write!(f, "validation errors: {}", errors.join("; ")),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Toml(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}
