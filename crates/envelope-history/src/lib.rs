#![forbid(unsafe_code)]

//! Command history and dirty-state control for embedded diagram editors.
//!
//! The host page owns exactly one [`StateControl`] per open editor session.
//! The embedded editor never touches it directly: every edit it reports
//! across the bridge becomes an [`EventId`] appended to the log, and every
//! host-initiated undo/redo moves the current pointer before the editor is
//! told to follow.
//!
//! # Role in the workspace
//! `envelope-history` is the leaf of the dependency graph. It knows nothing
//! about messages, frames or editors; `envelope-host` drives it from the
//! synchronization bridge and UI adapters subscribe to it for the dirty
//! indicator and the undo/redo buttons.
//!
//! # Key Components
//!
//! - [`StateControl`] - ordered event log with current and saved pointers
//! - [`SubscriberSet`] - named dirty-state observers
//! - [`ToolbarState`] - what the toolbar needs to render in one value

pub mod event;
pub mod state_control;
pub mod subscribers;
pub mod toolbar;

pub use event::EventId;
pub use state_control::{HistoryConfig, StateControl};
pub use subscribers::{SubscriberId, SubscriberSet};
pub use toolbar::ToolbarState;
