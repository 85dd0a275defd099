#![forbid(unsafe_code)]

//! Navigation tracking for content-script sessions.
//!
//! Single-page code hosts swap files without reloading the page. A
//! [`NavigationWatcher`] lives as long as one session and remembers the last
//! path it saw, so the session can restart its editor only when the path
//! actually changes.

use tracing::debug;
use url::Url;

const TARGET: &str = "envelope.navigation";

/// A change of the observed path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriChange {
    /// Previous path; `None` on the first observation.
    pub from: Option<String>,
    pub to: String,
}

/// Remembers the last observed URI path of one session.
#[derive(Debug, Default, Clone)]
pub struct NavigationWatcher {
    last_path: Option<String>,
}

impl NavigationWatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Path seen by the last [`observe`](Self::observe).
    #[must_use]
    pub fn last_path(&self) -> Option<&str> {
        self.last_path.as_deref()
    }

    /// Record `uri` and report a change if its path differs from the last
    /// one. Query strings and fragments are ignored.
    ///
    /// `uri` may be absolute (`https://host/a/b?x`) or a bare path.
    pub fn observe(&mut self, uri: &str) -> Option<UriChange> {
        let path = uri_path(uri);
        if self.last_path.as_deref() == Some(path.as_str()) {
            return None;
        }
        debug!(
            target: TARGET,
            from = self.last_path.as_deref().unwrap_or(""),
            to = %path,
            "uri changed"
        );
        let from = self.last_path.replace(path.clone());
        Some(UriChange { from, to: path })
    }

    /// Forget the last path, as when the session is torn down.
    pub fn reset(&mut self) {
        self.last_path = None;
    }
}

fn uri_path(uri: &str) -> String {
    match Url::parse(uri) {
        Ok(url) => url.path().to_owned(),
        Err(_) => {
            let end = uri.find(['?', '#']).unwrap_or(uri.len());
            uri[..end].to_owned()
        }
    }
}

/// Extension of the file a URL points at.
///
/// Takes the text after the last `.` and returns its leading run of word
/// characters, so `.../loan.dmn?plain=1` gives `dmn`.
#[must_use]
pub fn extract_open_file_extension(url: &str) -> Option<&str> {
    let tail = url.rsplit('.').next()?;
    let start = tail.find(is_word_char)?;
    let rest = &tail[start..];
    let end = rest.find(|c: char| !is_word_char(c)).unwrap_or(rest.len());
    Some(&rest[..end])
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_observation_is_a_change() {
        let mut watcher = NavigationWatcher::new();
        assert_eq!(
            watcher.observe("https://github.com/org/repo/blob/main/loan.dmn"),
            Some(UriChange {
                from: None,
                to: "/org/repo/blob/main/loan.dmn".to_owned(),
            })
        );
    }

    #[test]
    fn same_path_with_other_query_is_not_a_change() {
        let mut watcher = NavigationWatcher::new();
        watcher.observe("https://github.com/o/r/blob/main/a.bpmn");
        assert_eq!(watcher.observe("https://github.com/o/r/blob/main/a.bpmn?plain=1#L3"), None);
    }

    #[test]
    fn new_path_reports_previous() {
        let mut watcher = NavigationWatcher::new();
        watcher.observe("/o/r/blob/main/a.bpmn");
        let change = watcher.observe("/o/r/blob/main/b.dmn").unwrap();
        assert_eq!(change.from.as_deref(), Some("/o/r/blob/main/a.bpmn"));
        assert_eq!(watcher.last_path(), Some("/o/r/blob/main/b.dmn"));
    }

    #[test]
    fn watchers_are_independent() {
        let mut first = NavigationWatcher::new();
        let mut second = NavigationWatcher::new();
        first.observe("/a");
        assert!(second.observe("/a").is_some());
        first.reset();
        assert!(first.observe("/a").is_some());
    }

    #[test]
    fn extension_from_url() {
        assert_eq!(
            extract_open_file_extension("https://github.com/o/r/blob/main/loan.dmn?plain=1"),
            Some("dmn")
        );
        assert_eq!(extract_open_file_extension("process.bpmn2"), Some("bpmn2"));
        assert_eq!(extract_open_file_extension("a.scesim#L10"), Some("scesim"));
        assert_eq!(extract_open_file_extension("trailing."), None);
    }

    #[test]
    fn url_without_file_dot_yields_host_tail() {
        assert_eq!(extract_open_file_extension("https://github.com/o/r"), Some("com"));
        assert_eq!(extract_open_file_extension("no-dot-here"), Some("no"));
    }
}
