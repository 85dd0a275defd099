#![forbid(unsafe_code)]

//! Liveness monitoring for the embedded decision runner.
//!
//! The runner is a separate local process. The host never waits on it: the
//! embedding calls [`RunnerMonitor::poll`] from its timer loop and the monitor
//! probes only when the current poll is due.
//!
//! ```text
//!              dmn file opened
//! Unavailable ────────────────► Available ──probe ok──► Running
//!                                               ▲          │
//!                                          probe ok    probe failed
//!                                               │          ▼
//!                                               └──── Stopped
//! ```
//!
//! Each transition clears the poll that caused it and arms the opposite one
//! (detect-start while not running, detect-stop while running). There is no
//! deadline: a dead runner is noticed by the next failed probe.

use std::fmt;

use envelope_protocol::FileType;
use tracing::{debug, trace, warn};
use web_time::{Duration, Instant};

use crate::config::RunnerSection;

const TARGET: &str = "envelope.runner";

/// Runner availability as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunnerStatus {
    /// The open file cannot be run.
    Unavailable,
    /// The file can be run; the runner has not been seen yet.
    Available,
    Running,
    /// The runner was seen and then stopped answering.
    Stopped,
}

/// A probe failure. Never escalated beyond a status change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeError {
    pub reason: String,
}

impl ProbeError {
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "runner probe failed: {}", self.reason)
    }
}

impl std::error::Error for ProbeError {}

/// Checks whether the runner answers on a port.
pub trait Probe {
    fn check(&mut self, port: &str) -> Result<(), ProbeError>;
}

impl<F: FnMut(&str) -> Result<(), ProbeError>> Probe for F {
    fn check(&mut self, port: &str) -> Result<(), ProbeError> {
        self(port)
    }
}

/// A status change produced by a poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerTransition {
    pub from: RunnerStatus,
    pub to: RunnerStatus,
}

/// Trailing-edge debouncer: fires once, `delay` after the last trigger.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// Restart the quiet period.
    pub fn trigger(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    /// Returns `true` once when the quiet period has elapsed.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}

/// Runner status machine plus the panel flags it drives.
#[derive(Debug, Clone)]
pub struct RunnerMonitor {
    status: RunnerStatus,
    port: String,
    interval: Duration,
    next_poll: Option<Instant>,
    modal_open: bool,
    drawer_expanded: bool,
    editor_ready: bool,
    refresh_due: bool,
    debouncer: Debouncer,
}

impl RunnerMonitor {
    #[must_use]
    pub fn new(port: impl Into<String>, interval: Duration, refresh_debounce: Duration) -> Self {
        Self {
            status: RunnerStatus::Unavailable,
            port: port.into(),
            interval,
            next_poll: None,
            modal_open: false,
            drawer_expanded: false,
            editor_ready: false,
            refresh_due: false,
            debouncer: Debouncer::new(refresh_debounce),
        }
    }

    #[must_use]
    pub fn from_config(config: &RunnerSection) -> Self {
        Self::new(
            config.port.clone(),
            Duration::from_millis(config.poll_interval_ms),
            Duration::from_millis(config.refresh_debounce_ms),
        )
    }

    #[must_use]
    pub fn status(&self) -> RunnerStatus {
        self.status
    }

    #[must_use]
    pub fn port(&self) -> &str {
        &self.port
    }

    #[must_use]
    pub fn is_modal_open(&self) -> bool {
        self.modal_open
    }

    #[must_use]
    pub fn is_drawer_expanded(&self) -> bool {
        self.drawer_expanded
    }

    /// When the next probe is due, if a poll is armed.
    #[must_use]
    pub fn next_poll(&self) -> Option<Instant> {
        self.next_poll
    }

    pub fn set_modal_open(&mut self, open: bool) {
        self.modal_open = open;
    }

    pub fn set_drawer_expanded(&mut self, expanded: bool) {
        self.drawer_expanded = expanded;
    }

    /// A file was opened. Only decision models can be run.
    pub fn on_file_opened(&mut self, file_type: Option<FileType>, now: Instant) {
        if file_type == Some(FileType::Dmn) {
            if self.status == RunnerStatus::Unavailable {
                debug!(target: TARGET, "runner available for decision model");
                self.status = RunnerStatus::Available;
                self.arm(now);
            }
        } else {
            trace!(target: TARGET, ?file_type, "file cannot be run");
            self.status = RunnerStatus::Unavailable;
            self.next_poll = None;
            self.debouncer.cancel();
        }
    }

    /// Point the monitor at another port. Restarts the active poll.
    pub fn set_port(&mut self, port: impl Into<String>, now: Instant) {
        self.port = port.into();
        debug!(target: TARGET, port = %self.port, "runner port changed");
        if self.status != RunnerStatus::Unavailable {
            self.arm(now);
        }
    }

    /// Whether the editor can answer content requests. A refresh that
    /// became due while it could not is replayed once it can.
    pub fn set_editor_ready(&mut self, ready: bool) {
        let became_ready = ready && !self.editor_ready;
        self.editor_ready = ready;
        if became_ready && self.status == RunnerStatus::Running {
            self.refresh_due = true;
        }
    }

    /// The document changed; schedule a debounced schema refresh.
    pub fn on_history_change(&mut self, now: Instant) {
        if self.status == RunnerStatus::Unavailable {
            return;
        }
        self.debouncer.trigger(now);
    }

    /// Returns `true` when the runner schema should be fetched again.
    pub fn take_schema_refresh(&mut self, now: Instant) -> bool {
        let debounced = self.debouncer.fire(now) && self.status != RunnerStatus::Unavailable;
        let due = std::mem::take(&mut self.refresh_due);
        due || debounced
    }

    /// Probe the runner if a poll is due.
    pub fn poll(&mut self, now: Instant, probe: &mut impl Probe) -> Option<RunnerTransition> {
        let due = self.next_poll?;
        if now < due {
            return None;
        }
        let result = probe.check(&self.port);
        let from = self.status;
        let to = match (from, &result) {
            (RunnerStatus::Available | RunnerStatus::Stopped, Ok(())) => RunnerStatus::Running,
            (RunnerStatus::Running, Err(err)) => {
                warn!(target: TARGET, port = %self.port, error = %err, "runner stopped answering");
                RunnerStatus::Stopped
            }
            _ => {
                trace!(target: TARGET, status = ?from, ok = result.is_ok(), "no runner change");
                self.next_poll = Some(now + self.interval);
                return None;
            }
        };

        self.status = to;
        self.arm(now);
        match to {
            RunnerStatus::Running => {
                if self.modal_open {
                    self.drawer_expanded = true;
                }
                if self.editor_ready {
                    self.refresh_due = true;
                }
            }
            RunnerStatus::Stopped => {
                self.modal_open = true;
                self.drawer_expanded = false;
            }
            RunnerStatus::Available | RunnerStatus::Unavailable => {}
        }
        debug!(target: TARGET, ?from, ?to, "runner status changed");
        Some(RunnerTransition { from, to })
    }

    fn arm(&mut self, now: Instant) {
        self.next_poll = Some(now + self.interval);
    }
}
