//! Hardware key handling.

use super::{DirtyFlags, TextFieldPattern};
use core_events::{KeyCode, KeyEvent, KeyModifiers};
use core_paragraph::TextAffinity;
use core_state::{EditSource, InputOperation};
use tracing::{debug, trace};

impl TextFieldPattern {
    /// Handle one key press. Returns whether the key was consumed.
    pub fn handle_key_event(&mut self, key: &KeyEvent) -> bool {
        if !self.attached || !self.has_focus {
            return false;
        }
        trace!(target: "actions.pattern", key = %key, "key_event");
        let ctrl = key.mods.contains(KeyModifiers::CTRL);
        let shift = key.mods.contains(KeyModifiers::SHIFT);
        match key.code {
            KeyCode::Char(c) if ctrl => self.handle_shortcut(c.to_ascii_lowercase(), shift),
            KeyCode::Char(c) if !key.mods.contains(KeyModifiers::ALT) => {
                self.insert_value_from(&c.to_string(), EditSource::Keyboard);
                true
            }
            KeyCode::Tab => false,
            KeyCode::Backspace => {
                self.delete_backward_from(1, EditSource::Keyboard);
                true
            }
            KeyCode::Delete => {
                self.delete_forward_from(1, EditSource::Keyboard);
                true
            }
            KeyCode::Left | KeyCode::Right | KeyCode::Up | KeyCode::Down if shift => {
                self.extend_selection_by_key(key.code);
                true
            }
            KeyCode::Left => {
                self.enqueue(InputOperation::CursorLeft);
                true
            }
            KeyCode::Right => {
                self.enqueue(InputOperation::CursorRight);
                true
            }
            KeyCode::Up => {
                self.enqueue(InputOperation::CursorUp);
                true
            }
            KeyCode::Down => {
                self.enqueue(InputOperation::CursorDown);
                true
            }
            KeyCode::Home | KeyCode::End => {
                self.flush_pending_operations();
                if self.preview.is_active() {
                    self.finish_preview_operation();
                }
                let target = if key.code == KeyCode::Home {
                    0
                } else {
                    self.content.len()
                };
                if shift {
                    let anchor = self.selection_anchor();
                    self.select.update_handle_index(anchor, target);
                    self.caret_scroll_pending = true;
                    self.on_selection_updated();
                } else {
                    self.close_select_overlay();
                    self.move_caret(target, TextAffinity::Downstream);
                }
                true
            }
            KeyCode::Enter => {
                let enter_key = self.config.file.field.enter_key;
                self.perform_enter_action(enter_key);
                true
            }
            KeyCode::Esc => {
                if self.select.is_selected() || self.overlay.is_shown() {
                    self.flush_pending_operations();
                    let caret = self.select.caret_index();
                    self.select.update_caret_index(caret);
                    self.close_select_overlay();
                    self.on_selection_updated();
                    return true;
                }
                false
            }
            _ => false,
        }
    }

    fn handle_shortcut(&mut self, c: char, shift: bool) -> bool {
        let handled = match c {
            'a' => {
                self.select_all();
                true
            }
            'c' => self.copy().is_ok(),
            'x' => self.cut().is_ok(),
            'v' => self.paste().is_ok(),
            'z' if shift => self.handle_on_redo_action(),
            'z' => self.handle_on_undo_action(),
            'y' => self.handle_on_redo_action(),
            _ => return false,
        };
        debug!(target: "actions.pattern", shortcut = %c, shift, handled, "shortcut");
        true
    }

    /// Shift+arrow: keep the anchor, move the caret end one step.
    fn extend_selection_by_key(&mut self, code: KeyCode) {
        self.flush_pending_operations();
        if self.preview.is_active() {
            self.finish_preview_operation();
        }
        let anchor = self.selection_anchor();
        let caret = self.select.caret_index();
        let target = match code {
            KeyCode::Left => self.content.prev_boundary(caret),
            KeyCode::Right => self.content.next_boundary(caret),
            KeyCode::Up | KeyCode::Down => {
                self.ensure_paragraph();
                self.content
                    .snap(self.select.vertical_target(caret, code == KeyCode::Up))
            }
            _ => caret,
        };
        if target == anchor {
            self.select.update_caret_index(anchor);
        } else {
            self.select.update_handle_index(anchor, target);
        }
        self.caret_scroll_pending = true;
        self.dirty |= DirtyFlags::RENDER;
        self.on_selection_updated();
    }
}
