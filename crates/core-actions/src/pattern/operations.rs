//! Public editing API, operation apply and undo/redo.

use super::{DirtyFlags, TextFieldPattern};
use crate::bridge::{DeleteDirection, DeleteValueInfo, InsertValueInfo};
use core_paragraph::TextAffinity;
use core_state::{
    DeleteCommand, EditError, EditResult, EditSource, InputOperation, InsertCommand,
};
use core_text::segment::grapheme_count;
use std::ops::Range;
use tracing::{debug, trace};

/// Whether `set_selection` opens the selection menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MenuPolicy {
    #[default]
    Default,
    Show,
    Hide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SelectionOptions {
    pub menu_policy: MenuPolicy,
}

impl TextFieldPattern {
    // ---------------------------------------------------------------------
    // Public editing API
    // ---------------------------------------------------------------------

    /// Queue an insertion from the input method at the caret (replacing the
    /// selection or the active preview text).
    pub fn insert_value(&mut self, value: &str) {
        self.insert_value_from(value, EditSource::Ime);
    }

    pub fn insert_value_from(&mut self, value: &str, source: EditSource) {
        self.enqueue(InputOperation::Insert(InsertCommand {
            value: value.to_string(),
            source,
        }));
    }

    /// Queue deletion of `length` clusters before the caret.
    pub fn delete_backward(&mut self, length: usize) {
        self.delete_backward_from(length, EditSource::Ime);
    }

    pub fn delete_backward_from(&mut self, length: usize, source: EditSource) {
        self.enqueue(InputOperation::DeleteBackward(DeleteCommand { length, source }));
    }

    /// Queue deletion of `length` clusters after the caret.
    pub fn delete_forward(&mut self, length: usize) {
        self.delete_forward_from(length, EditSource::Ime);
    }

    pub fn delete_forward_from(&mut self, length: usize, source: EditSource) {
        self.enqueue(InputOperation::DeleteForward(DeleteCommand { length, source }));
    }

    pub fn cursor_left(&mut self) {
        self.enqueue(InputOperation::CursorLeft);
    }

    pub fn cursor_right(&mut self) {
        self.enqueue(InputOperation::CursorRight);
    }

    pub fn cursor_up(&mut self) {
        self.enqueue(InputOperation::CursorUp);
    }

    pub fn cursor_down(&mut self) {
        self.enqueue(InputOperation::CursorDown);
    }

    /// Delete `[start,end)` immediately (clamped, order-insensitive).
    pub fn delete_range(&mut self, start: usize, end: usize) -> EditResult<()> {
        self.ensure_attached()?;
        self.flush_pending_operations();
        let len = self.content.len();
        let (s, e) = (start.min(len), end.min(len));
        let range = s.min(e)..s.max(e);
        if range.is_empty() {
            return Ok(());
        }
        if self.preview.is_active() {
            return Err(EditError::PreviewActive);
        }
        self.delete_text_range(range, DeleteDirection::Forward, EditSource::Api);
        Ok(())
    }

    /// Select `[start,end)`. `forward` puts the caret at `end`, otherwise at
    /// `start`. Equal indices place the caret.
    pub fn set_selection(
        &mut self,
        start: usize,
        end: usize,
        options: SelectionOptions,
        forward: bool,
    ) -> EditResult<()> {
        self.ensure_attached()?;
        self.flush_pending_operations();
        if self.preview.is_active() {
            return Err(EditError::PreviewActive);
        }
        let s = self.content.snap(start.min(end));
        let e = self.content.buffer().ceil_boundary(start.max(end));
        if s == e {
            self.move_caret(s, TextAffinity::Downstream);
            return Ok(());
        }
        if forward {
            self.select.update_handle_index(s, e);
        } else {
            self.select.update_handle_index(e, s);
        }
        self.overlay.handles_shown = true;
        self.overlay.menu_shown = options.menu_policy == MenuPolicy::Show;
        self.caret_scroll_pending = true;
        self.on_selection_updated();
        Ok(())
    }

    /// Place the caret at `index` (clamped to the text, snapped to a cluster).
    pub fn set_caret_offset(&mut self, index: usize) -> EditResult<()> {
        self.ensure_attached()?;
        self.flush_pending_operations();
        if self.preview.is_active() {
            return Err(EditError::PreviewActive);
        }
        self.close_select_overlay();
        self.move_caret(index, TextAffinity::Downstream);
        Ok(())
    }

    /// Up to `count` clusters before the selection start (or the caret).
    pub fn get_left_text_of_cursor(&self, count: usize) -> String {
        let at = self.content.snap(self.select.start());
        let len = self.content.get_delete_length(at, count, true);
        self.content.get_selected_value(at - len, at)
    }

    /// Up to `count` clusters after the selection end (or the caret).
    pub fn get_right_text_of_cursor(&self, count: usize) -> String {
        let at = self.content.snap(self.select.end());
        let len = self.content.get_delete_length(at, count, false);
        self.content.get_selected_value(at, at + len)
    }

    pub fn get_text_index_at_cursor(&self) -> usize {
        self.select.caret_index()
    }

    /// Replace the whole text programmatically. Not recorded for undo; the
    /// filter is re-applied and the caret moves to the end.
    pub fn set_text_value(&mut self, value: &str) {
        if !self.attached {
            return;
        }
        self.flush_pending_operations();
        if let Some(range) = self.preview.finish() {
            debug!(target: "actions.pattern", start = range.start, end = range.end, "preview_dropped_by_set_text");
        }
        self.content.set_text_value(value);
        self.content.filter_value();
        self.after_content_change();
        self.select.update_caret_index(self.content.len());
        self.on_selection_updated();
    }

    /// Restore the state before the most recent edit. Pending operations are
    /// applied first. A no-op while preview text is active or when there is
    /// no history.
    pub fn handle_on_undo_action(&mut self) -> bool {
        if !self.attached {
            return false;
        }
        self.flush_pending_operations();
        if self.preview.is_active() {
            debug!(target: "actions.pattern", "undo_ignored_during_preview");
            return false;
        }
        let current = self.snapshot_record();
        let Some(record) = self.undo.undo(current) else {
            return false;
        };
        self.close_select_overlay();
        self.restore_record(&record);
        true
    }

    pub fn handle_on_redo_action(&mut self) -> bool {
        if !self.attached {
            return false;
        }
        self.flush_pending_operations();
        if self.preview.is_active() {
            return false;
        }
        let current = self.snapshot_record();
        let Some(record) = self.undo.redo(current) else {
            return false;
        };
        self.close_select_overlay();
        self.restore_record(&record);
        true
    }

    // ---------------------------------------------------------------------
    // Queue
    // ---------------------------------------------------------------------

    pub(crate) fn enqueue(&mut self, op: InputOperation) {
        if !self.attached {
            debug!(target: "actions.pattern", op = op.name(), "enqueue_while_detached_ignored");
            return;
        }
        self.queue.push(op);
        self.dirty |= DirtyFlags::MEASURE;
    }

    pub(crate) fn apply_operation(&mut self, op: InputOperation) {
        match op {
            InputOperation::Insert(cmd) => {
                self.insert_value_operation(cmd);
            }
            InputOperation::DeleteBackward(cmd) => self.delete_operation(cmd, DeleteDirection::Backward),
            InputOperation::DeleteForward(cmd) => self.delete_operation(cmd, DeleteDirection::Forward),
            InputOperation::CursorLeft
            | InputOperation::CursorRight
            | InputOperation::CursorUp
            | InputOperation::CursorDown => self.cursor_move_operation(&op),
            InputOperation::SetPreviewText(cmd) => self.set_preview_text_operation(cmd),
            InputOperation::SetPreviewFinish => self.finish_preview_operation(),
        }
    }

    /// Range an insertion replaces: the preview text, else the selection,
    /// else the empty range at the caret.
    pub(crate) fn edit_target(&self) -> Range<usize> {
        if let Some(range) = self.preview.range() {
            return range;
        }
        if self.select.is_selected() {
            return self.select.selection_range();
        }
        let caret = self.content.snap(self.select.caret_index());
        caret..caret
    }

    /// Returns whether the content changed.
    pub(crate) fn insert_value_operation(&mut self, cmd: InsertCommand) -> bool {
        let target = self.edit_target();
        let preview_was_active = self.preview.is_active();
        let notify = cmd.source.notifies_listeners();
        if notify {
            let info = InsertValueInfo {
                insert_offset: target.start,
                value: cmd.value.clone(),
            };
            if !self.services.events.fire_will_insert(&info) {
                debug!(target: "actions.pattern", offset = target.start, "insert_vetoed");
                return false;
            }
        }
        let record = self.snapshot_record();
        let result = if target.is_empty() {
            self.content.insert_value(target.start, &cmd.value)
        } else {
            self.content
                .replace_selected_value(target.start, target.end, &cmd.value)
        };
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(err) => {
                debug!(target: "actions.pattern", error = %err, "insert_failed");
                self.services.events.fire_input_filter_error(&cmd.value);
                // The composition it was meant to commit goes away with it.
                if preview_was_active {
                    self.preview.finish();
                    self.content.delete_range(target.start, target.end);
                    self.after_content_change();
                    self.select.update_caret_index(target.start);
                    self.on_selection_updated();
                }
                return false;
            }
        };
        if outcome.is_filtered() {
            self.services
                .events
                .fire_input_filter_error(&outcome.rejected);
        }
        let changed = outcome.inserted_len > 0 || !target.is_empty();
        if !changed {
            if outcome.truncated {
                self.show_count_border_style = true;
                self.dirty |= DirtyFlags::RENDER;
            }
            return false;
        }
        // A composition recorded its pre-edit state when it started.
        if !preview_was_active {
            self.undo.record(record);
        }
        self.preview.finish();
        self.after_content_change();
        self.select.update_caret_index(outcome.end());
        self.close_select_overlay();
        self.on_selection_updated();
        if outcome.truncated {
            self.show_count_border_style = true;
        }
        let inserted = self.content.get_selected_value(outcome.start, outcome.end());
        if matches!(cmd.source, EditSource::Ime | EditSource::Keyboard)
            && !preview_was_active
            && grapheme_count(&inserted) == 1
        {
            self.reveal_naked_char(outcome.start..outcome.end());
        }
        trace!(target: "actions.pattern", start = outcome.start, len = outcome.inserted_len, source = ?cmd.source, "insert_applied");
        if notify {
            self.services.events.fire_did_insert(&InsertValueInfo {
                insert_offset: outcome.start,
                value: inserted,
            });
        }
        true
    }

    fn delete_operation(&mut self, cmd: DeleteCommand, direction: DeleteDirection) {
        if self.preview.is_active() {
            self.finish_preview_operation();
        }
        let range = if self.select.is_selected() {
            self.select.selection_range()
        } else {
            let caret = self.content.snap(self.select.caret_index());
            match direction {
                DeleteDirection::Backward => {
                    caret - self.content.get_delete_length(caret, cmd.length, true)..caret
                }
                DeleteDirection::Forward => {
                    caret..caret + self.content.get_delete_length(caret, cmd.length, false)
                }
            }
        };
        if range.is_empty() {
            return;
        }
        self.delete_text_range(range, direction, cmd.source);
    }

    /// Remove `range`, record undo, collapse the caret to its start.
    pub(crate) fn delete_text_range(
        &mut self,
        range: Range<usize>,
        direction: DeleteDirection,
        source: EditSource,
    ) -> bool {
        let notify = source.notifies_listeners();
        let info = DeleteValueInfo {
            delete_offset: range.start,
            direction,
            value: self.content.get_selected_value(range.start, range.end),
        };
        if notify && !self.services.events.fire_will_delete(&info) {
            debug!(target: "actions.pattern", offset = range.start, "delete_vetoed");
            return false;
        }
        let record = self.snapshot_record();
        if self.content.delete_range(range.start, range.end).is_empty() {
            return false;
        }
        self.undo.record(record);
        self.after_content_change();
        self.select.update_caret_index(range.start);
        self.close_select_overlay();
        self.on_selection_updated();
        trace!(target: "actions.pattern", start = range.start, end = range.end, ?direction, "delete_applied");
        if notify {
            self.services.events.fire_did_delete(&info);
        }
        true
    }

    fn cursor_move_operation(&mut self, op: &InputOperation) {
        if self.preview.is_active() {
            self.finish_preview_operation();
        }
        let caret = self.select.caret_index();
        let selected = self.select.is_selected();
        let target = match op {
            InputOperation::CursorLeft if selected => self.select.start(),
            InputOperation::CursorRight if selected => self.select.end(),
            InputOperation::CursorLeft => self.content.prev_boundary(caret),
            InputOperation::CursorRight => self.content.next_boundary(caret),
            InputOperation::CursorUp | InputOperation::CursorDown => {
                self.ensure_paragraph();
                let up = matches!(op, InputOperation::CursorUp);
                self.content.snap(self.select.vertical_target(caret, up))
            }
            _ => return,
        };
        if target != caret {
            // One record per run of consecutive moves.
            if self.caret_move_run != Some(caret) {
                let record = self.snapshot_record();
                self.undo.record(record);
            }
            self.caret_move_run = Some(target);
        }
        self.select.update_caret_index(target);
        self.close_select_overlay();
        self.caret_scroll_pending = true;
        self.on_selection_updated();
    }
}
