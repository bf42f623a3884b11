//! Undo/redo stack for pattern edits.

use boom_ir::{DrumRows, Pattern};

/// Editable state captured around one edit.
#[derive(Clone, Debug, PartialEq)]
pub struct EditSnapshot {
    pub pattern: Pattern,
    pub drum_rows: DrumRows,
}

/// A single undoable operation: state before and after.
#[derive(Clone, Debug)]
struct UndoEntry {
    before: EditSnapshot,
    after: EditSnapshot,
}

/// Undo/redo stack.
#[derive(Debug, Default)]
pub struct UndoStack {
    entries: Vec<UndoEntry>,
    position: usize,
}

impl UndoStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an edit.
    pub fn push(&mut self, before: EditSnapshot, after: EditSnapshot) {
        // Truncate any redo history beyond current position
        self.entries.truncate(self.position);
        self.entries.push(UndoEntry { before, after });
        self.position = self.entries.len();
    }

    /// Undo: returns the state to restore, or None if nothing to undo.
    pub fn undo(&mut self) -> Option<&EditSnapshot> {
        if self.position == 0 {
            return None;
        }
        self.position -= 1;
        Some(&self.entries[self.position].before)
    }

    /// Redo: returns the state to restore, or None if nothing to redo.
    pub fn redo(&mut self) -> Option<&EditSnapshot> {
        if self.position >= self.entries.len() {
            return None;
        }
        let after = &self.entries[self.position].after;
        self.position += 1;
        Some(after)
    }

    pub fn can_undo(&self) -> bool {
        self.position > 0
    }

    pub fn can_redo(&self) -> bool {
        self.position < self.entries.len()
    }
}
