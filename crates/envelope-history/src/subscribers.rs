#![forbid(unsafe_code)]

//! Named dirty-state observers.
//!
//! UI components register on mount under a stable name and unregister on
//! unmount. Registering a name twice replaces the earlier callback in place,
//! so a remounted component never receives duplicate notifications.
//!
//! # Invariants
//!
//! 1. At most one callback per [`SubscriberId`].
//! 2. Callbacks run in registration order.
//! 3. Registration never invokes the callback.

use std::fmt;

/// Name under which a component registers its callback.
pub type SubscriberId = String;

type DirtyCallback = Box<dyn FnMut(bool)>;

/// Ordered map from subscriber name to dirty-state callback.
#[derive(Default)]
pub struct SubscriberSet {
    entries: Vec<(SubscriberId, DirtyCallback)>,
}

impl fmt::Debug for SubscriberSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|(id, _)| id))
            .finish()
    }
}

impl SubscriberSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` under `id`.
    ///
    /// Returns `true` if an earlier callback with the same id was replaced.
    pub fn insert(
        &mut self,
        id: impl Into<SubscriberId>,
        callback: impl FnMut(bool) + 'static,
    ) -> bool {
        let id = id.into();
        let callback: DirtyCallback = Box::new(callback);
        if let Some(slot) = self.entries.iter_mut().find(|(existing, _)| *existing == id) {
            slot.1 = callback;
            return true;
        }
        self.entries.push((id, callback));
        false
    }

    /// Unregister `id`. Unknown ids are ignored.
    ///
    /// Returns `true` if a callback was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(existing, _)| existing != id);
        self.entries.len() != before
    }

    /// Whether a callback is registered under `id`.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|(existing, _)| existing == id)
    }

    /// Number of registered callbacks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no callback is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Invoke every callback with `dirty`, in registration order.
    pub fn notify(&mut self, dirty: bool) {
        for (_, callback) in &mut self.entries {
            callback(dirty);
        }
    }

    /// Drop every registration.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
