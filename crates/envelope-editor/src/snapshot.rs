#![forbid(unsafe_code)]

//! Snapshot-based undo/redo for editor-owned content.
//!
//! Each committed edit pushes the full document as an `Arc` snapshot. The
//! oldest snapshot is the loaded baseline and can never be undone, which
//! lines up with the host history whose oldest entry is the same baseline.
//!
//! ```text
//! reset(s0) push(s1) push(s2)     undo()            push(s3)
//! undo: [s0, s1, s2]              undo: [s0, s1]    undo: [s0, s1, s3]
//! redo: []                        redo: [s2]        redo: []
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

/// Configuration for the snapshot store.
#[derive(Debug, Clone)]
pub struct SnapshotConfig {
    /// Maximum number of snapshots kept on the undo side, baseline included.
    pub max_depth: usize,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self { max_depth: 1000 }
    }
}

impl SnapshotConfig {
    /// Create a configuration with the given depth limit.
    #[must_use]
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }
}

/// Undo/redo stacks of `Arc<T>` snapshots.
///
/// # Invariants
///
/// 1. `undo_stack` is never empty after the first `push` or `reset`.
/// 2. `undo_stack.len() <= config.max_depth` (after any operation).
/// 3. Redo stack is cleared on every `push`.
pub struct SnapshotStore<T> {
    undo_stack: VecDeque<Arc<T>>,
    redo_stack: Vec<Arc<T>>,
    config: SnapshotConfig,
}

impl<T: fmt::Debug> fmt::Debug for SnapshotStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnapshotStore")
            .field("undo_depth", &self.undo_stack.len())
            .field("redo_depth", &self.redo_stack.len())
            .field("config", &self.config)
            .finish()
    }
}

impl<T> Default for SnapshotStore<T> {
    fn default() -> Self {
        Self::new(SnapshotConfig::default())
    }
}

impl<T> SnapshotStore<T> {
    /// Create an empty store.
    #[must_use]
    pub fn new(config: SnapshotConfig) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            config,
        }
    }

    /// Drop everything and start over from `baseline`.
    pub fn reset(&mut self, baseline: T) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.undo_stack.push_back(Arc::new(baseline));
    }

    /// Push a new snapshot, clearing the redo stack (new branch).
    pub fn push(&mut self, state: T) {
        self.redo_stack.clear();
        self.undo_stack.push_back(Arc::new(state));
        while self.undo_stack.len() > self.config.max_depth.max(1) {
            self.undo_stack.pop_front();
        }
    }

    /// Step back; returns the restored snapshot.
    ///
    /// Returns `None` when only the baseline is left.
    pub fn undo(&mut self) -> Option<Arc<T>> {
        if self.undo_stack.len() < 2 {
            return None;
        }
        let current = self.undo_stack.pop_back()?;
        self.redo_stack.push(current);
        self.undo_stack.back().cloned()
    }

    /// Step forward; returns the restored snapshot.
    pub fn redo(&mut self) -> Option<Arc<T>> {
        let snapshot = self.redo_stack.pop()?;
        self.undo_stack.push_back(snapshot);
        self.undo_stack.back().cloned()
    }

    /// The current snapshot.
    #[must_use]
    pub fn current(&self) -> Option<&Arc<T>> {
        self.undo_stack.back()
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.undo_stack.len() >= 2
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Snapshots on the undo side, current included.
    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    #[must_use]
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_cannot_be_undone() {
        let mut store = SnapshotStore::default();
        store.reset("base");
        assert!(!store.can_undo());
        assert!(store.undo().is_none());
        assert_eq!(**store.current().unwrap(), "base");
    }

    #[test]
    fn undo_redo_walks_snapshots() {
        let mut store = SnapshotStore::default();
        store.reset(0);
        store.push(1);
        store.push(2);
        assert_eq!(*store.undo().unwrap(), 1);
        assert_eq!(*store.undo().unwrap(), 0);
        assert!(store.undo().is_none());
        assert_eq!(*store.redo().unwrap(), 1);
        assert_eq!(store.redo_depth(), 1);
    }

    #[test]
    fn push_clears_redo() {
        let mut store = SnapshotStore::default();
        store.reset(0);
        store.push(1);
        store.undo();
        store.push(2);
        assert!(!store.can_redo());
        assert_eq!(**store.current().unwrap(), 2);
    }

    #[test]
    fn depth_limit_evicts_oldest() {
        let mut store = SnapshotStore::new(SnapshotConfig::new(2));
        store.reset(0);
        store.push(1);
        store.push(2);
        assert_eq!(store.undo_depth(), 2);
        assert_eq!(*store.undo().unwrap(), 1);
        assert!(store.undo().is_none());
    }

    #[test]
    fn reset_discards_both_stacks() {
        let mut store = SnapshotStore::default();
        store.reset(0);
        store.push(1);
        store.undo();
        store.reset(10);
        assert_eq!(store.undo_depth(), 1);
        assert_eq!(store.redo_depth(), 0);
    }
}
