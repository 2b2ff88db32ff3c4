use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

/// Maximum number of records retained on each of the undo and redo stacks.
pub const MAX_OPERATION_RECORDS: usize = 20;

/// Pre-edit state captured for undo/redo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationRecord {
    pub text: Rc<str>,
    pub caret_position: usize,
    /// Other end of the selection at capture; equals the caret when nothing
    /// was selected.
    pub anchor_position: usize,
}

impl OperationRecord {
    pub fn new(text: impl Into<Rc<str>>, caret_position: usize, anchor_position: usize) -> Self {
        Self {
            text: text.into(),
            caret_position,
            anchor_position,
        }
    }

    pub fn has_selection(&self) -> bool {
        self.caret_position != self.anchor_position
    }
}

/// Bounded undo/redo log.
///
/// Records are pushed *before* the edit they precede takes effect, so the top
/// of the undo stack is always the state immediately preceding the most
/// recent edit. Undo and redo swap the live state with the top of the
/// respective stack.
#[derive(Debug)]
pub struct UndoManager {
    undo_stack: Vec<OperationRecord>,
    redo_stack: Vec<OperationRecord>,
    /// Records skipped because they equalled the previous one.
    records_skipped: AtomicU64,
}

impl Default for UndoManager {
    fn default() -> Self {
        Self::new()
    }
}

impl UndoManager {
    pub fn new() -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            records_skipped: AtomicU64::new(0),
        }
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }
    pub fn records_skipped(&self) -> u64 {
        self.records_skipped.load(Ordering::Relaxed)
    }

    /// Record the state preceding a fresh edit. Clears the redo stack.
    pub fn record(&mut self, record: OperationRecord) {
        self.redo_stack.clear();
        if self.undo_stack.last() == Some(&record) {
            self.records_skipped.fetch_add(1, Ordering::Relaxed);
            trace!(target: "state.undo", undo_depth = self.undo_stack.len(), "record_dedupe_skip");
            return;
        }
        push_bounded(&mut self.undo_stack, record);
        trace!(target: "state.undo", undo_depth = self.undo_stack.len(), redo_depth = self.redo_stack.len(), "record_push");
    }

    /// Pop the most recent record, parking `current` on the redo stack.
    /// Returns the state to restore, or `None` when there is nothing to undo.
    pub fn undo(&mut self, current: OperationRecord) -> Option<OperationRecord> {
        let last = self.undo_stack.pop()?;
        push_bounded(&mut self.redo_stack, current);
        trace!(target: "state.undo", undo_depth = self.undo_stack.len(), redo_depth = self.redo_stack.len(), "undo_pop");
        Some(last)
    }

    /// Mirror of [`UndoManager::undo`].
    pub fn redo(&mut self, current: OperationRecord) -> Option<OperationRecord> {
        let next = self.redo_stack.pop()?;
        push_bounded(&mut self.undo_stack, current);
        trace!(target: "state.undo", undo_depth = self.undo_stack.len(), redo_depth = self.redo_stack.len(), "redo_pop");
        Some(next)
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        trace!(target: "state.undo", "history_cleared");
    }
}

fn push_bounded(stack: &mut Vec<OperationRecord>, record: OperationRecord) {
    stack.push(record);
    if stack.len() > MAX_OPERATION_RECORDS {
        let _ = stack.remove(0);
        trace!(target: "state.undo", "stack_trimmed");
    }
}
