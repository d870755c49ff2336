//! # Edit History
//!
//! Bounded, linear undo/redo over section-list snapshots.
//!
//! ## Design
//!
//! - Entries are whole snapshots; undo/redo only move the pointer
//! - Pushing after an undo truncates every entry past the pointer
//! - Over capacity, the oldest entry is evicted and the pointer stays on the
//!   newest entry
//! - While a history-driven update is being applied (`ApplyingHistory`),
//!   pushes are ignored so the update is never recorded as a new edit
//!
//! ## Example
//!
//! ```rust
//! use ps_core::history::EditHistory;
//! use ps_core::section::{Section, SectionsSnapshot};
//!
//! let mut history = EditHistory::new(SectionsSnapshot::empty(), 50);
//! history.push(SectionsSnapshot::new(vec![Section::new("hero")]));
//!
//! let previous = history.undo().expect("one step back");
//! assert!(previous.is_empty());
//! // publish `previous` to the editor, then:
//! history.finish_transition();
//! ```

use std::collections::VecDeque;

use crate::section::SectionsSnapshot;

pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Whether pushes are currently being recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryPhase {
    Recording,
    /// An undo/redo result is being published; pushes are suppressed until
    /// [`EditHistory::finish_transition`] is called.
    ApplyingHistory,
}

#[derive(Debug, Clone)]
pub struct EditHistory {
    entries: VecDeque<SectionsSnapshot>,
    pointer: usize,
    capacity: usize,
    phase: HistoryPhase,
}

impl EditHistory {
    /// History seeded with a single entry.
    pub fn new(initial: SectionsSnapshot, capacity: usize) -> Self {
        let mut history = Self::empty(capacity);
        history.entries.push_back(initial);
        history
    }

    /// History without entries; the first push becomes entry 0.
    pub fn empty(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            pointer: 0,
            capacity,
            phase: HistoryPhase::Recording,
        }
    }

    /// Record a new snapshot. Returns `false` when suppressed.
    pub fn push(&mut self, snapshot: SectionsSnapshot) -> bool {
        if self.phase == HistoryPhase::ApplyingHistory {
            return false;
        }

        if !self.entries.is_empty() {
            self.entries.truncate(self.pointer + 1);
        }
        self.entries.push_back(snapshot);

        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
        self.pointer = self.entries.len() - 1;
        true
    }

    /// Step back one entry and enter `ApplyingHistory`.
    pub fn undo(&mut self) -> Option<SectionsSnapshot> {
        if !self.can_undo() {
            return None;
        }
        self.pointer -= 1;
        self.phase = HistoryPhase::ApplyingHistory;
        self.entries.get(self.pointer).cloned()
    }

    /// Step forward one entry and enter `ApplyingHistory`.
    pub fn redo(&mut self) -> Option<SectionsSnapshot> {
        if !self.can_redo() {
            return None;
        }
        self.pointer += 1;
        self.phase = HistoryPhase::ApplyingHistory;
        self.entries.get(self.pointer).cloned()
    }

    /// Leave `ApplyingHistory` once the published update has been observed.
    pub fn finish_transition(&mut self) {
        self.phase = HistoryPhase::Recording;
    }

    /// Replace the whole history with a single entry.
    pub fn reset(&mut self, snapshot: SectionsSnapshot) {
        self.entries.clear();
        self.entries.push_back(snapshot);
        self.pointer = 0;
        self.phase = HistoryPhase::Recording;
    }

    /// Substitute entries in place; `rewrite` returns `None` to keep one.
    /// Pointer and phase are untouched.
    pub fn rewrite_entries<F>(&mut self, mut rewrite: F) -> usize
    where
        F: FnMut(&SectionsSnapshot) -> Option<SectionsSnapshot>,
    {
        let mut rewritten = 0;
        for entry in self.entries.iter_mut() {
            if let Some(updated) = rewrite(entry) {
                *entry = updated;
                rewritten += 1;
            }
        }
        rewritten
    }

    /// Entries from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &SectionsSnapshot> {
        self.entries.iter()
    }

    pub fn can_undo(&self) -> bool {
        !self.entries.is_empty() && self.pointer > 0
    }

    pub fn can_redo(&self) -> bool {
        !self.entries.is_empty() && self.pointer + 1 < self.entries.len()
    }

    pub fn current(&self) -> Option<&SectionsSnapshot> {
        self.entries.get(self.pointer)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn pointer(&self) -> usize {
        self.pointer
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn phase(&self) -> HistoryPhase {
        self.phase
    }
}

impl Default for EditHistory {
    fn default() -> Self {
        Self::new(SectionsSnapshot::empty(), DEFAULT_HISTORY_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::section::Section;

    fn snap(tag: &str) -> SectionsSnapshot {
        SectionsSnapshot::new(vec![Section::new("hero").with_id(tag)])
    }

    fn tag_of(snapshot: &SectionsSnapshot) -> &str {
        snapshot[0].id.as_str()
    }

    #[test]
    fn test_history_creation() {
        let history = EditHistory::default();
        assert_eq!(history.len(), 1);
        assert_eq!(history.pointer(), 0);
        assert_eq!(history.capacity(), DEFAULT_HISTORY_CAPACITY);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_push_undo_redo() {
        let mut history = EditHistory::new(snap("initial"), 10);
        assert!(history.push(snap("a")));

        let undone = history.undo().unwrap();
        assert_eq!(tag_of(&undone), "initial");
        history.finish_transition();
        assert!(history.can_redo());

        let redone = history.redo().unwrap();
        assert_eq!(tag_of(&redone), "a");
        history.finish_transition();
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_branch_truncation() {
        let mut history = EditHistory::new(snap("initial"), 10);
        history.push(snap("a"));
        history.push(snap("b"));
        history.undo();
        history.finish_transition();
        history.push(snap("c"));

        assert_eq!(history.len(), 3);
        assert!(!history.can_redo());
        assert!(history.redo().is_none());

        let tags: Vec<String> = (0..history.len())
            .map(|_| {
                let tag = tag_of(history.current().unwrap()).to_string();
                history.undo();
                history.finish_transition();
                tag
            })
            .collect();
        assert_eq!(tags, vec!["c", "a", "initial"]);
    }

    #[test]
    fn test_push_ignored_while_applying_history() {
        let mut history = EditHistory::new(snap("initial"), 10);
        history.push(snap("a"));

        let undone = history.undo().unwrap();
        assert_eq!(history.phase(), HistoryPhase::ApplyingHistory);
        // A state observer re-publishing the undone snapshot must not record it.
        assert!(!history.push(undone));
        assert_eq!(history.len(), 2);
        assert!(history.can_redo());

        history.finish_transition();
        assert!(history.push(snap("b")));
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_capacity_enforced() {
        let mut history = EditHistory::new(snap("initial"), 3);
        for i in 0..10 {
            history.push(snap(&format!("s{i}")));
            assert!(history.len() <= 3);
            assert_eq!(history.pointer(), history.len() - 1);
        }
        assert_eq!(history.len(), 3);
        assert_eq!(tag_of(history.current().unwrap()), "s9");
    }

    #[test]
    fn test_fifty_one_pushes_keep_fifty_entries() {
        let mut history = EditHistory::empty(50);
        for i in 1..=51 {
            history.push(snap(&format!("#{i}")));
        }
        assert_eq!(history.len(), 50);
        assert_eq!(history.pointer(), 49);

        let mut last = None;
        for _ in 0..49 {
            last = history.undo();
            assert!(last.is_some());
            history.finish_transition();
        }
        assert_eq!(tag_of(&last.unwrap()), "#2");
        assert!(history.undo().is_none());
        assert_eq!(history.pointer(), 0);
    }

    #[test]
    fn test_undo_and_redo_past_bounds_are_noops() {
        let mut history = EditHistory::empty(5);
        assert!(history.undo().is_none());
        assert!(history.redo().is_none());
        assert!(history.current().is_none());

        history.push(snap("only"));
        assert!(history.undo().is_none());
        assert!(history.redo().is_none());
        assert_eq!(history.phase(), HistoryPhase::Recording);
    }

    #[test]
    fn test_reset_replaces_history() {
        let mut history = EditHistory::new(snap("initial"), 10);
        history.push(snap("a"));
        history.push(snap("b"));
        history.undo();

        history.reset(snap("loaded"));
        assert_eq!(history.len(), 1);
        assert_eq!(history.pointer(), 0);
        assert_eq!(history.phase(), HistoryPhase::Recording);
        assert_eq!(tag_of(history.current().unwrap()), "loaded");
    }

    #[test]
    fn test_zero_capacity_is_normalised() {
        let mut history = EditHistory::empty(0);
        history.push(snap("a"));
        history.push(snap("b"));
        assert_eq!(history.capacity(), 1);
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_rewrite_keeps_pointer_and_redo_branch() {
        let mut history = EditHistory::new(snap("a"), 10);
        history.push(snap("b"));
        history.push(snap("c"));
        history.undo().unwrap();
        history.finish_transition();

        let rewritten = history.rewrite_entries(|entry| {
            (tag_of(entry) != "a").then(|| snap(&format!("{}'", tag_of(entry))))
        });
        assert_eq!(rewritten, 2);
        assert_eq!(history.pointer(), 1);
        assert_eq!(tag_of(history.current().unwrap()), "b'");
        let tags: Vec<&str> = history.iter().map(tag_of).collect();
        assert_eq!(tags, vec!["a", "b'", "c'"]);
        assert_eq!(tag_of(&history.redo().unwrap()), "c'");
    }
}
