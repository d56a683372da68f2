//! Undo/redo over shape snapshots
//!
//! Each entry is the full set of persistent shapes after an edit. Recording
//! a new entry after undoing drops the redo tail. The log is bounded; the
//! oldest entries fall off first.

use tracing::debug;

use crate::scene::shape::Shape;

#[derive(Debug, Clone)]
pub struct ShapeHistory {
    entries: Vec<Vec<Shape>>,
    cursor: usize,
    limit: usize,
}

impl ShapeHistory {
    /// Start with an empty scene as the base entry
    pub fn new(limit: usize) -> Self {
        Self {
            entries: vec![Vec::new()],
            cursor: 0,
            limit: limit.max(1),
        }
    }

    /// Record the scene after an edit
    pub fn record(&mut self, snapshot: Vec<Shape>) {
        if self.entries.get(self.cursor) == Some(&snapshot) {
            return;
        }
        self.entries.truncate(self.cursor + 1);
        self.entries.push(snapshot);

        // The base entry counts toward the limit
        let overflow = self.entries.len().saturating_sub(self.limit + 1);
        if overflow > 0 {
            self.entries.drain(..overflow);
            debug!(dropped = overflow, "history pruned");
        }
        self.cursor = self.entries.len() - 1;
    }

    pub fn undo(&mut self) -> Option<Vec<Shape>> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        Some(self.entries[self.cursor].clone())
    }

    pub fn redo(&mut self) -> Option<Vec<Shape>> {
        if self.cursor + 1 >= self.entries.len() {
            return None;
        }
        self.cursor += 1;
        Some(self.entries[self.cursor].clone())
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    /// Forget everything, e.g. when a new photo is loaded
    pub fn clear(&mut self) {
        self.entries = vec![Vec::new()];
        self.cursor = 0;
    }

    /// Number of edits that can be undone
    pub fn len(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.cursor == 0
    }
}
