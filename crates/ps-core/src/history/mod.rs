//! Undo/redo history over section-list snapshots.

mod edit_history;

pub use edit_history::{EditHistory, HistoryPhase, DEFAULT_HISTORY_CAPACITY};
