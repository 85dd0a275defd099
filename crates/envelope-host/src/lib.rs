#![forbid(unsafe_code)]

//! Host side of the embedded editor bridge.
//!
//! # Role in the workspace
//! `envelope-host` ties the pieces together for the page that embeds an
//! editor: it owns the session history, talks to the editor only through
//! protocol envelopes, and tracks the surroundings the editor depends on
//! (locale, navigation, the local decision runner).
//!
//! # Key Components
//!
//! - [`SyncBridge`] - keeps the history and the editor in step
//! - [`LocaleNegotiator`] - resolves locales, decides when a remount is due
//! - [`NavigationWatcher`] - per-session last-path tracking
//! - [`RunnerMonitor`] - liveness polling for the decision runner
//! - [`HostConfig`] - TOML/JSON configuration

pub mod bridge;
pub mod config;
pub mod locale;
pub mod navigation;
pub mod runner;

pub use bridge::{BridgeFailure, BridgeView, EditorStatus, SyncBridge};
pub use config::{ConfigError, EnvelopeMapping, HostConfig};
pub use locale::{LocaleChange, LocaleNegotiator};
pub use navigation::{NavigationWatcher, UriChange, extract_open_file_extension};
pub use runner::{Debouncer, Probe, ProbeError, RunnerMonitor, RunnerStatus, RunnerTransition};
