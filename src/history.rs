use crate::state::EditState;

/// Linear undo/redo over full `EditState` snapshots.
///
/// `cursor` indexes the entry that matches the live state. Committing while
/// the cursor is not at the end drops every entry after it.
#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<EditState>,
    cursor: usize,
}

impl History {
    /// A history whose only entry is `initial`.
    pub fn new(initial: EditState) -> Self {
        Self {
            entries: vec![initial],
            cursor: 0,
        }
    }

    pub fn commit(&mut self, state: EditState) {
        self.entries.truncate(self.cursor + 1);
        self.entries.push(state);
        self.cursor = self.entries.len() - 1;
        tracing::debug!(entries = self.entries.len(), "history commit");
    }

    pub fn undo(&mut self) -> Option<&EditState> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        self.entries.get(self.cursor)
    }

    pub fn redo(&mut self) -> Option<&EditState> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        self.entries.get(self.cursor)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    /// Snapshot at the cursor.
    pub fn current(&self) -> &EditState {
        &self.entries[self.cursor]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }
}

#[cfg(test)]
mod tests {
    use crate::state::EditState;

    use super::History;

    fn state(rotation: i32) -> EditState {
        EditState::default().with_rotation(rotation)
    }

    #[test]
    fn commit_after_undo_discards_the_redo_branch() {
        let mut history = History::new(state(0));
        history.commit(state(90));
        history.commit(state(180));
        assert_eq!(history.undo(), Some(&state(90)));
        history.commit(state(270));

        assert_eq!(history.len(), 3);
        assert_eq!(history.cursor(), 2);
        assert_eq!(history.current(), &state(270));
        assert!(!history.can_redo());
        assert_eq!(history.undo(), Some(&state(90)));
        assert_eq!(history.undo(), Some(&state(0)));
    }

    #[test]
    fn undo_then_redo_returns_to_the_same_snapshot() {
        let mut history = History::new(state(0));
        for step in 1..=4 {
            history.commit(state(step * 90));
        }
        let latest = history.current().clone();
        for _ in 0..3 {
            assert!(history.undo().is_some());
        }
        for _ in 0..3 {
            assert!(history.redo().is_some());
        }
        assert_eq!(history.current(), &latest);
    }

    #[test]
    fn ends_are_no_ops() {
        let mut history = History::new(state(0));
        assert!(!history.can_undo());
        assert_eq!(history.undo(), None);
        assert_eq!(history.redo(), None);
        assert_eq!(history.cursor(), 0);

        history.commit(state(90));
        assert_eq!(history.redo(), None);
        assert_eq!(history.cursor(), 1);
    }
}
