//! IME composition ("preview") text.
//!
//! Preview text lives in the content like committed text but bypasses the
//! input filter until it is finished. The undo log receives one record per
//! composition, taken when the composition starts.

use super::{DirtyFlags, TextFieldPattern};
use core_state::{EditError, EditResult, InputOperation, PreviewCommand, PreviewRange};
use std::ops::Range;
use tracing::debug;

impl TextFieldPattern {
    /// Queue composition text. `range` is the explicit target or
    /// [`PreviewRange::INACTIVE`] for "the selection, the active preview or
    /// the caret".
    pub fn set_preview_text(&mut self, value: &str, range: PreviewRange) -> EditResult<()> {
        self.ensure_attached()?;
        let explicit = range.validate(self.content.len())?;
        if let Some(r) = &explicit
            && !r.is_empty()
            && self.select.is_selected()
        {
            debug!(target: "actions.pattern", "preview_range_with_selection_rejected");
            return Err(EditError::BadParameters);
        }
        self.enqueue(InputOperation::SetPreviewText(PreviewCommand {
            value: value.to_string(),
            range: explicit,
        }));
        Ok(())
    }

    /// Queue the commit of the active composition.
    pub fn finish_text_preview(&mut self) {
        self.enqueue(InputOperation::SetPreviewFinish);
    }

    pub fn has_preview_text(&self) -> bool {
        self.preview.is_active()
    }

    pub fn preview_range(&self) -> PreviewRange {
        self.preview.public_range()
    }

    /// Committed text from before the active composition started.
    pub fn preview_body_before(&self) -> Option<&str> {
        self.preview.body_before()
    }

    pub(crate) fn set_preview_text_operation(&mut self, cmd: PreviewCommand) {
        let len = self.content.len();
        let target: Range<usize> = match cmd.range {
            Some(r) => r.start.min(len)..r.end.min(len),
            None => self.edit_target(),
        };
        if !self.preview.is_active() {
            if cmd.value.is_empty() && target.is_empty() {
                return;
            }
            let record = self.snapshot_record();
            self.undo.record(record);
            self.preview.begin(&self.content.text());
        }
        let occupied = self
            .content
            .replace_preview_value(target.start, target.end, &cmd.value);
        if occupied.is_empty() {
            self.preview.finish();
        } else {
            self.preview.set_range(occupied.clone());
        }
        self.close_select_overlay();
        self.after_content_change();
        self.select.update_caret_index(occupied.end);
        self.on_selection_updated();
        debug!(target: "actions.pattern", start = occupied.start, end = occupied.end, "preview_applied");
    }

    /// Turn the composition into committed text. The filter and max length
    /// apply now; a rejected composition is removed.
    pub(crate) fn finish_preview_operation(&mut self) {
        let Some(range) = self.preview.finish() else {
            return;
        };
        let value = self.content.get_selected_value(range.start, range.end);
        let (caret, truncated) = match self
            .content
            .replace_selected_value(range.start, range.end, &value)
        {
            Ok(outcome) => {
                if outcome.is_filtered() {
                    self.services
                        .events
                        .fire_input_filter_error(&outcome.rejected);
                }
                (outcome.end(), outcome.truncated)
            }
            Err(_) => {
                self.content.delete_range(range.start, range.end);
                self.services.events.fire_input_filter_error(&value);
                (range.start, false)
            }
        };
        self.after_content_change();
        if truncated {
            self.show_count_border_style = true;
        }
        self.select.update_caret_index(caret);
        self.on_selection_updated();
        self.dirty |= DirtyFlags::RENDER;
        debug!(target: "actions.pattern", caret, "preview_finished");
    }
}
