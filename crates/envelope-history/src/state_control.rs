#![forbid(unsafe_code)]

//! Ordered edit log with current and saved pointers.
//!
//! [`StateControl`] is the host's single source of truth for "is the open
//! document dirty" and "can the user undo/redo right now". It records one
//! [`EventId`] per committed edit and moves a current pointer along that log.
//!
//! # Invariants
//!
//! 1. The log is never reordered; it only grows at the back, loses entries
//!    past the current pointer when a new edit arrives, and sheds its oldest
//!    entries when `max_depth` is exceeded. [`StateControl::reset_to`]
//!    replaces it wholesale when a document is (re)loaded.
//! 2. The current pointer is either absent (empty log) or an index into the
//!    log. Once an edit exists the pointer never returns to "absent".
//! 3. `is_dirty() == (current() != saved())`, compared by event value.
//! 4. Every `append_event`, `reset_to` and `set_saved`/`mark_saved` notifies each
//!    subscriber exactly once; `undo`/`redo` notify exactly once when they
//!    move the pointer and not at all when they are no-ops.
//!
//! # Positions and duplicate ids
//!
//! The pointer is tracked by index, so appending an id that already occurs
//! earlier in the log never makes undo/redo jump to the wrong occurrence.
//! Dirty state still compares values: a current event equal in value to the
//! saved one reads clean even if it sits at a different position.
//!
//! ```text
//! append(a) append(b) append(c)      undo()            append(d)
//! [a, b, c]                          [a, b, c]         [a, b, d]
//!        ^ current                       ^ current            ^ current
//!                                        redo -> c     c is gone for good
//! ```

use std::collections::VecDeque;
use std::fmt;

use tracing::{debug, trace};

use crate::event::EventId;
use crate::subscribers::{SubscriberId, SubscriberSet};
use crate::toolbar::ToolbarState;

const TARGET: &str = "envelope.history";

/// Configuration for the history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryConfig {
    /// Maximum number of events kept in the log.
    pub max_depth: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { max_depth: 1000 }
    }
}

impl HistoryConfig {
    /// Create a configuration with the given depth limit.
    #[must_use]
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Create an unlimited configuration (for testing).
    #[must_use]
    pub fn unlimited() -> Self {
        Self {
            max_depth: usize::MAX,
        }
    }
}

/// Edit log, current pointer, saved pointer and dirty-state subscribers.
pub struct StateControl {
    events: VecDeque<EventId>,
    cursor: Option<usize>,
    saved: Option<EventId>,
    subscribers: SubscriberSet,
    config: HistoryConfig,
}

impl fmt::Debug for StateControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateControl")
            .field("len", &self.events.len())
            .field("current", &self.current())
            .field("saved", &self.saved)
            .field("subscribers", &self.subscribers)
            .field("config", &self.config)
            .finish()
    }
}

impl Default for StateControl {
    fn default() -> Self {
        Self::new(HistoryConfig::default())
    }
}

impl StateControl {
    /// Create an empty history.
    #[must_use]
    pub fn new(config: HistoryConfig) -> Self {
        Self {
            events: VecDeque::new(),
            cursor: None,
            saved: None,
            subscribers: SubscriberSet::new(),
            config,
        }
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Record a new edit as the current event.
    ///
    /// Entries past the current pointer are erased first (new branch), so
    /// they can no longer be reached by [`redo`](Self::redo).
    pub fn append_event(&mut self, event: impl Into<EventId>) {
        let event = event.into();
        let erased = self.erase_redo_events();
        self.events.push_back(event);
        self.cursor = Some(self.events.len() - 1);
        let evicted = self.enforce_depth();
        debug!(
            target: TARGET,
            event = %self.events[self.events.len() - 1],
            len = self.events.len(),
            erased,
            evicted,
            "event appended"
        );
        self.broadcast();
    }

    /// Mark `event` as the saved position (`None` clears the saved marker).
    pub fn set_saved(&mut self, event: impl Into<Option<EventId>>) {
        self.saved = event.into();
        debug!(target: TARGET, saved = ?self.saved, "saved marker set");
        self.broadcast();
    }

    /// Mark the current event as saved.
    pub fn mark_saved(&mut self) {
        let current = self.current().cloned();
        self.set_saved(current);
    }

    /// Move the current pointer one entry back.
    ///
    /// Returns the new current event, or `None` (and changes nothing) when
    /// the pointer already sits at the oldest entry or the log is empty.
    pub fn undo(&mut self) -> Option<EventId> {
        let Some(index) = self.cursor.filter(|&index| index > 0) else {
            trace!(target: TARGET, "undo ignored: at oldest entry");
            return None;
        };
        self.cursor = Some(index - 1);
        let current = self.events[index - 1].clone();
        debug!(target: TARGET, current = %current, "undo");
        self.broadcast();
        Some(current)
    }

    /// Move the current pointer one entry forward.
    ///
    /// Returns the new current event, or `None` (and changes nothing) when
    /// the pointer already sits at the newest entry or the log is empty.
    pub fn redo(&mut self) -> Option<EventId> {
        let next = self.cursor.map_or(0, |index| index + 1);
        if next >= self.events.len() {
            trace!(target: TARGET, "redo ignored: at newest entry");
            return None;
        }
        self.cursor = Some(next);
        let current = self.events[next].clone();
        debug!(target: TARGET, current = %current, "redo");
        self.broadcast();
        Some(current)
    }

    /// Replace the whole log with a single saved `baseline` event.
    ///
    /// Used when the document is (re)loaded: the loaded content becomes the
    /// oldest entry, so undo can walk every later edit back to it.
    pub fn reset_to(&mut self, baseline: impl Into<EventId>) {
        let baseline = baseline.into();
        self.events.clear();
        self.events.push_back(baseline.clone());
        self.cursor = Some(0);
        debug!(target: TARGET, baseline = %baseline, "history reset");
        self.saved = Some(baseline);
        self.broadcast();
    }

    /// Register a dirty-state observer. The callback is not invoked now.
    ///
    /// Returns `true` if an observer with the same id was replaced.
    pub fn subscribe(
        &mut self,
        id: impl Into<SubscriberId>,
        callback: impl FnMut(bool) + 'static,
    ) -> bool {
        self.subscribers.insert(id, callback)
    }

    /// Remove an observer. Unknown ids are ignored.
    pub fn unsubscribe(&mut self, id: &str) -> bool {
        self.subscribers.remove(id)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Whether the current event differs from the saved one.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.current() != self.saved.as_ref()
    }

    /// Whether [`undo`](Self::undo) would move the pointer.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.cursor.is_some_and(|index| index > 0)
    }

    /// Whether [`redo`](Self::redo) would move the pointer.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.cursor.map_or(0, |index| index + 1) < self.events.len()
    }

    /// The event the document is materialized at.
    #[must_use]
    pub fn current(&self) -> Option<&EventId> {
        self.cursor.and_then(|index| self.events.get(index))
    }

    /// Index of the current event in [`events`](Self::events).
    #[must_use]
    pub fn current_index(&self) -> Option<usize> {
        self.cursor
    }

    /// The event marked as saved.
    #[must_use]
    pub fn saved(&self) -> Option<&EventId> {
        self.saved.as_ref()
    }

    /// The log, oldest first.
    pub fn events(&self) -> impl ExactSizeIterator<Item = &EventId> + '_ {
        self.events.iter()
    }

    /// Number of events in the log.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Dirty flag plus undo/redo availability.
    #[must_use]
    pub fn toolbar(&self) -> ToolbarState {
        ToolbarState {
            dirty: self.is_dirty(),
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
        }
    }

    /// Number of registered observers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn erase_redo_events(&mut self) -> usize {
        let keep = self.cursor.map_or(0, |index| index + 1);
        let erased = self.events.len().saturating_sub(keep);
        self.events.truncate(keep);
        erased
    }

    fn enforce_depth(&mut self) -> usize {
        let limit = self.config.max_depth.max(1);
        let mut evicted = 0;
        while self.events.len() > limit {
            self.events.pop_front();
            evicted += 1;
        }
        if evicted > 0 {
            self.cursor = self.cursor.map(|index| index.saturating_sub(evicted));
        }
        evicted
    }

    fn broadcast(&mut self) {
        let dirty = self.is_dirty();
        self.subscribers.notify(dirty);
    }
}
