//! Undo/redo history of committed edits.
//!
//! Every committed gesture stores the full graph before and after it,
//! plus a label for menu display. Undo and redo move entries between two
//! stacks; pushing a new entry discards the redo tail, so the sequence
//! of entries below the cursor always replays to the current graph.

use zxs_core::DiagramSnapshot;

/// One committed edit: the gesture label and the graph on both sides.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    label: String,
    before: DiagramSnapshot,
    after: DiagramSnapshot,
}

impl HistoryEntry {
    pub fn new(label: impl Into<String>, before: DiagramSnapshot, after: DiagramSnapshot) -> Self {
        Self {
            label: label.into(),
            before,
            after,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn before(&self) -> &DiagramSnapshot {
        &self.before
    }

    pub fn after(&self) -> &DiagramSnapshot {
        &self.after
    }
}

/// Linear history with a cursor, stored as an undo and a redo stack.
pub struct History {
    undo_stack: Vec<HistoryEntry>,
    redo_stack: Vec<HistoryEntry>,
    max_depth: usize,
}

impl History {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_depth,
        }
    }

    /// Append a committed edit. Truncates the redo tail and trims the
    /// oldest entry past `max_depth`.
    pub fn push(&mut self, entry: HistoryEntry) {
        self.redo_stack.clear();
        self.undo_stack.push(entry);
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.remove(0);
        }
    }

    /// Step the cursor back one entry. Returns the entry whose `before`
    /// snapshot should be restored, or `None` at the bottom.
    pub fn undo(&mut self) -> Option<&HistoryEntry> {
        let entry = self.undo_stack.pop()?;
        self.redo_stack.push(entry);
        self.redo_stack.last()
    }

    /// Step the cursor forward one entry. Returns the entry whose `after`
    /// snapshot should be restored, or `None` at the top.
    pub fn redo(&mut self) -> Option<&HistoryEntry> {
        let entry = self.redo_stack.pop()?;
        self.undo_stack.push(entry);
        self.undo_stack.last()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Label of the entry the next `undo` would revert, for menu display.
    pub fn undo_label(&self) -> Option<&str> {
        self.undo_stack.last().map(|e| e.label())
    }

    pub fn redo_label(&self) -> Option<&str> {
        self.redo_stack.last().map(|e| e.label())
    }

    /// Number of entries below the cursor.
    pub fn depth(&self) -> usize {
        self.undo_stack.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zxs_core::{DiagramGraph, Phase, Pos, SpiderKind};

    fn entry(label: &str) -> HistoryEntry {
        let mut g = DiagramGraph::new();
        let before = g.snapshot();
        g.add_node(SpiderKind::Z, Pos::new(0.0, 0.0), Phase::ZERO);
        HistoryEntry::new(label, before, g.snapshot())
    }

    #[test]
    fn undo_then_redo_moves_one_entry() {
        let mut h = History::new(10);
        h.push(entry("add node"));
        assert!(h.can_undo());
        assert!(!h.can_redo());

        let undone = h.undo().unwrap();
        assert_eq!(undone.label(), "add node");
        assert!(!h.can_undo());
        assert!(h.can_redo());

        let redone = h.redo().unwrap();
        assert_eq!(redone.label(), "add node");
        assert!(h.can_undo());
    }

    #[test]
    fn boundaries_are_no_ops() {
        let mut h = History::new(10);
        assert!(h.undo().is_none());
        assert!(h.redo().is_none());
    }

    #[test]
    fn push_truncates_redo_tail() {
        let mut h = History::new(10);
        h.push(entry("first"));
        h.push(entry("second"));
        h.undo();
        h.undo();
        assert!(h.can_redo());

        h.push(entry("third"));
        assert!(!h.can_redo());
        assert_eq!(h.undo_label(), Some("third"));
        assert_eq!(h.depth(), 1);
    }

    #[test]
    fn max_depth_trims_oldest() {
        let mut h = History::new(3);
        for i in 0..5 {
            h.push(entry(&format!("edit {i}")));
        }
        assert_eq!(h.depth(), 3);
        let mut labels = Vec::new();
        while let Some(e) = h.undo() {
            labels.push(e.label().to_string());
        }
        assert_eq!(labels, vec!["edit 4", "edit 3", "edit 2"]);
    }

    #[test]
    fn labels_peek_without_moving() {
        let mut h = History::new(10);
        h.push(entry("move"));
        assert_eq!(h.undo_label(), Some("move"));
        assert_eq!(h.redo_label(), None);
        h.undo();
        assert_eq!(h.undo_label(), None);
        assert_eq!(h.redo_label(), Some("move"));
    }
}
