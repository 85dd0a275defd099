#![forbid(unsafe_code)]

//! Locale negotiation for embedded editors.
//!
//! Editors load their dictionaries when they are built, so switching to a
//! different locale always means tearing the editor down and mounting a new
//! one. The negotiator only decides whether that is needed.

use tracing::{debug, trace};

use crate::config::LocaleSection;

const TARGET: &str = "envelope.bridge";

/// Outcome of a locale request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocaleChange {
    /// Resolves to the locale already in use.
    Unchanged,
    /// The editor must be remounted to show `locale`.
    RemountRequired { locale: String },
}

/// Resolves requested locales against the supported set.
#[derive(Debug, Clone)]
pub struct LocaleNegotiator {
    default: String,
    supported: Vec<String>,
    current: String,
}

impl LocaleNegotiator {
    /// Start at `default`. The default is always considered supported.
    #[must_use]
    pub fn new(
        default: impl Into<String>,
        supported: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        let default = default.into();
        let mut supported: Vec<String> = supported.into_iter().map(Into::into).collect();
        if !supported.iter().any(|l| l.eq_ignore_ascii_case(&default)) {
            supported.push(default.clone());
        }
        Self {
            current: default.clone(),
            default,
            supported,
        }
    }

    #[must_use]
    pub fn from_config(config: &LocaleSection) -> Self {
        Self::new(config.default.clone(), config.supported.iter().cloned())
    }

    /// Locale the editor is (or will be) mounted with.
    #[must_use]
    pub fn current(&self) -> &str {
        &self.current
    }

    /// Best supported match for `requested`.
    ///
    /// Tries the full tag, then its language (`pt-BR` falls back to `pt`),
    /// then the default.
    #[must_use]
    pub fn resolve(&self, requested: &str) -> &str {
        let requested = requested.trim();
        let language = requested.split(['-', '_']).next().unwrap_or(requested);
        self.find(requested)
            .or_else(|| self.find(language))
            .unwrap_or(&self.default)
    }

    /// Switch to `requested`, reporting whether a remount is needed.
    pub fn change(&mut self, requested: &str) -> LocaleChange {
        let resolved = self.resolve(requested).to_owned();
        if resolved == self.current {
            trace!(target: TARGET, requested, resolved = %resolved, "locale unchanged");
            return LocaleChange::Unchanged;
        }
        debug!(target: TARGET, from = %self.current, to = %resolved, "locale change");
        self.current.clone_from(&resolved);
        LocaleChange::RemountRequired { locale: resolved }
    }

    fn find(&self, tag: &str) -> Option<&str> {
        self.supported
            .iter()
            .find(|l| l.eq_ignore_ascii_case(tag))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn negotiator() -> LocaleNegotiator {
        LocaleNegotiator::new("en", ["en", "pt", "ja", "zh-CN"])
    }

    #[test]
    fn exact_then_language_then_default() {
        let n = negotiator();
        assert_eq!(n.resolve("zh-cn"), "zh-CN");
        assert_eq!(n.resolve("pt-BR"), "pt");
        assert_eq!(n.resolve("pt_PT"), "pt");
        assert_eq!(n.resolve("de"), "en");
        assert_eq!(n.resolve(""), "en");
    }

    #[test]
    fn change_to_same_resolved_locale_is_unchanged() {
        let mut n = negotiator();
        assert_eq!(n.change("en-US"), LocaleChange::Unchanged);
        assert_eq!(n.change("fr"), LocaleChange::Unchanged);
        assert_eq!(n.current(), "en");
    }

    #[test]
    fn change_to_new_locale_requires_remount_once() {
        let mut n = negotiator();
        assert_eq!(
            n.change("pt-BR"),
            LocaleChange::RemountRequired {
                locale: "pt".to_owned()
            }
        );
        assert_eq!(n.current(), "pt");
        assert_eq!(n.change("pt"), LocaleChange::Unchanged);
    }

    #[test]
    fn default_is_always_supported() {
        let n = LocaleNegotiator::new("ja", Vec::<String>::new());
        assert_eq!(n.resolve("ja-JP"), "ja");
    }

    #[test]
    fn built_from_config_section() {
        let n = LocaleNegotiator::from_config(&LocaleSection::default());
        assert_eq!(n.current(), "en");
        assert_eq!(n.resolve("en-GB"), "en");
    }
}
