//! Copy, cut, paste, select-all and the select overlay state.

use super::{DirtyFlags, GestureState, TextFieldPattern};
use crate::bridge::DeleteDirection;
use core_config::CopyOptions;
use core_state::{EditError, EditResult, EditSource};
use tracing::debug;

/// What the selection overlay currently shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SelectOverlay {
    pub handles_shown: bool,
    pub menu_shown: bool,
}

impl SelectOverlay {
    pub fn is_shown(&self) -> bool {
        self.handles_shown || self.menu_shown
    }
}

impl TextFieldPattern {
    pub fn overlay(&self) -> SelectOverlay {
        self.overlay
    }

    pub fn close_select_overlay(&mut self) {
        if self.overlay.is_shown() {
            self.overlay = SelectOverlay::default();
            self.dirty |= DirtyFlags::RENDER;
        }
    }

    /// Whether the selected text may leave the field.
    fn copy_allowed(&self) -> bool {
        let field = &self.config.file.field;
        !field.input_type.is_obscured() && field.copy_options != CopyOptions::None
    }

    /// Copy the selection. `Ok(false)` when copying is disabled for this
    /// field.
    pub fn copy(&mut self) -> EditResult<bool> {
        self.ensure_attached()?;
        self.flush_pending_operations();
        if !self.select.is_selected() {
            return Err(EditError::NothingSelected);
        }
        if !self.copy_allowed() {
            debug!(target: "actions.pattern", "copy_disabled");
            return Ok(false);
        }
        let range = self.select.selection_range();
        let text = self.content.get_selected_value(range.start, range.end);
        let options = self.config.file.field.copy_options;
        let Some(clipboard) = self.services.clipboard.as_mut() else {
            return Err(EditError::ClipboardUnavailable);
        };
        clipboard.set_data(&text, options);
        debug!(target: "actions.pattern", len = range.end - range.start, "copied");
        self.close_select_overlay();
        Ok(true)
    }

    /// Copy then delete the selection as one undoable edit.
    pub fn cut(&mut self) -> EditResult<bool> {
        if !self.copy()? {
            return Ok(false);
        }
        let range = self.select.selection_range();
        Ok(self.delete_text_range(range, DeleteDirection::Backward, EditSource::Api))
    }

    /// Queue the clipboard text for insertion at the caret (or over the
    /// selection). An empty clipboard is `Ok(false)`.
    pub fn paste(&mut self) -> EditResult<bool> {
        self.ensure_attached()?;
        let Some(clipboard) = self.services.clipboard.as_ref() else {
            return Err(EditError::ClipboardUnavailable);
        };
        let Some(text) = clipboard.get_data().filter(|t| !t.is_empty()) else {
            debug!(target: "actions.pattern", "paste_empty");
            return Ok(false);
        };
        self.insert_value_from(&text, EditSource::Paste);
        self.close_select_overlay();
        Ok(true)
    }

    pub fn select_all(&mut self) {
        if !self.attached {
            return;
        }
        self.flush_pending_operations();
        if self.preview.is_active() {
            self.finish_preview_operation();
        }
        let len = self.content.len();
        if len == 0 {
            return;
        }
        self.select.update_handle_index(0, len);
        self.overlay.handles_shown = true;
        self.overlay.menu_shown = true;
        self.gesture.state = GestureState::Selected;
        self.on_selection_updated();
    }
}
