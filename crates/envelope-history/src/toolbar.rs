#![forbid(unsafe_code)]

//! Toolbar projection of the history.

/// Everything the editor toolbar renders from the history.
///
/// Computed purely from the [`StateControl`](crate::StateControl), so it may
/// lead the embedded editor's rendered content by one round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ToolbarState {
    /// Unsaved changes indicator.
    pub dirty: bool,
    /// Undo button enabled.
    pub can_undo: bool,
    /// Redo button enabled.
    pub can_redo: bool,
}

impl ToolbarState {
    /// Title decoration for the open file, `"*"` when dirty.
    #[must_use]
    pub fn title_marker(&self) -> &'static str {
        if self.dirty { " *" } else { "" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_clean_and_disabled() {
        let state = ToolbarState::default();
        assert!(!state.dirty && !state.can_undo && !state.can_redo);
        assert_eq!(state.title_marker(), "");
    }

    #[test]
    fn dirty_marks_title() {
        let state = ToolbarState {
            dirty: true,
            ..ToolbarState::default()
        };
        assert_eq!(state.title_marker(), " *");
    }
}
