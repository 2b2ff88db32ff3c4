//! Deferred edit operations.
//!
//! Input handlers enqueue; the layout pre-pass drains the whole queue in
//! FIFO order and applies each item exactly once. There is no cancellation:
//! an enqueued item is always applied on the next drain.

use std::collections::VecDeque;
use std::ops::Range;
use tracing::trace;

/// Where an edit came from. Only IME edits fire will/did listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditSource {
    Ime,
    Keyboard,
    Paste,
    Drop,
    Api,
    Accessibility,
}

impl EditSource {
    pub fn notifies_listeners(self) -> bool {
        matches!(self, EditSource::Ime)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertCommand {
    pub value: String,
    pub source: EditSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteCommand {
    /// Grapheme clusters to remove.
    pub length: usize,
    pub source: EditSource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewCommand {
    pub value: String,
    /// Explicit target range; `None` targets the selection or the caret.
    pub range: Option<Range<usize>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputOperation {
    Insert(InsertCommand),
    DeleteBackward(DeleteCommand),
    DeleteForward(DeleteCommand),
    CursorUp,
    CursorDown,
    CursorLeft,
    CursorRight,
    SetPreviewText(PreviewCommand),
    SetPreviewFinish,
}

impl InputOperation {
    pub fn name(&self) -> &'static str {
        match self {
            InputOperation::Insert(_) => "insert",
            InputOperation::DeleteBackward(_) => "delete_backward",
            InputOperation::DeleteForward(_) => "delete_forward",
            InputOperation::CursorUp => "cursor_up",
            InputOperation::CursorDown => "cursor_down",
            InputOperation::CursorLeft => "cursor_left",
            InputOperation::CursorRight => "cursor_right",
            InputOperation::SetPreviewText(_) => "set_preview_text",
            InputOperation::SetPreviewFinish => "set_preview_finish",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedOperation {
    pub seq: u64,
    pub op: InputOperation,
}

#[derive(Debug, Default)]
pub struct OperationQueue {
    items: VecDeque<QueuedOperation>,
    next_seq: u64,
}

impl OperationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `op`; returns its sequence number.
    pub fn push(&mut self, op: InputOperation) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        trace!(target: "state.queue", seq, op = op.name(), depth = self.items.len() + 1, "enqueue");
        self.items.push_back(QueuedOperation { seq, op });
        seq
    }

    pub fn pop_front(&mut self) -> Option<QueuedOperation> {
        self.items.pop_front()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total operations ever enqueued.
    pub fn enqueued_total(&self) -> u64 {
        self.next_seq
    }
}
