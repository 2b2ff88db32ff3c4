//! Accessibility actions, routed into the public editing API.

use super::operations::SelectionOptions;
use super::TextFieldPattern;
use core_paragraph::TextAffinity;
use core_state::EditResult;
use core_text::segment::{slice_utf16, word_ranges};
use tracing::debug;

/// Granularity of [`AccessibilityAction::MoveText`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextMoveUnit {
    Char,
    Word,
    Line,
    Paragraph,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessibilityAction {
    SetText(String),
    SetSelection {
        start: usize,
        end: usize,
        forward: bool,
    },
    Copy,
    Cut,
    Paste,
    ClearSelection,
    SetIndex(usize),
    GetIndex,
    MoveText {
        unit: TextMoveUnit,
        forward: bool,
    },
}

impl AccessibilityAction {
    pub fn name(&self) -> &'static str {
        match self {
            AccessibilityAction::SetText(_) => "set_text",
            AccessibilityAction::SetSelection { .. } => "set_selection",
            AccessibilityAction::Copy => "copy",
            AccessibilityAction::Cut => "cut",
            AccessibilityAction::Paste => "paste",
            AccessibilityAction::ClearSelection => "clear_selection",
            AccessibilityAction::SetIndex(_) => "set_index",
            AccessibilityAction::GetIndex => "get_index",
            AccessibilityAction::MoveText { .. } => "move_text",
        }
    }
}

impl TextFieldPattern {
    /// Perform `action` and return the caret index afterwards.
    pub fn perform_accessibility_action(
        &mut self,
        action: AccessibilityAction,
    ) -> EditResult<usize> {
        self.ensure_attached()?;
        debug!(target: "actions.pattern", action = action.name(), "accessibility_action");
        match action {
            AccessibilityAction::SetText(text) => self.set_text_undoable(&text),
            AccessibilityAction::SetSelection {
                start,
                end,
                forward,
            } => self.set_selection(start, end, SelectionOptions::default(), forward)?,
            AccessibilityAction::Copy => {
                self.copy()?;
            }
            AccessibilityAction::Cut => {
                self.cut()?;
            }
            AccessibilityAction::Paste => {
                self.paste()?;
                self.flush_pending_operations();
            }
            AccessibilityAction::ClearSelection => {
                self.flush_pending_operations();
                let caret = self.select.caret_index();
                self.select.update_caret_index(caret);
                self.close_select_overlay();
                self.on_selection_updated();
            }
            AccessibilityAction::SetIndex(index) => self.set_caret_offset(index)?,
            AccessibilityAction::GetIndex => self.flush_pending_operations(),
            AccessibilityAction::MoveText { unit, forward } => self.move_text(unit, forward),
        }
        Ok(self.select.caret_index())
    }

    /// Replace the text as one undoable edit; the filter applies.
    fn set_text_undoable(&mut self, text: &str) {
        self.flush_pending_operations();
        if self.preview.is_active() {
            self.finish_preview_operation();
        }
        let record = self.snapshot_record();
        self.content.set_text_value(text);
        self.content.filter_value();
        if self.content.text() == *record.text {
            return;
        }
        self.undo.record(record);
        self.after_content_change();
        self.close_select_overlay();
        self.select.update_caret_index(self.content.len());
        self.on_selection_updated();
    }

    fn move_text(&mut self, unit: TextMoveUnit, forward: bool) {
        self.flush_pending_operations();
        if self.preview.is_active() {
            self.finish_preview_operation();
        }
        let caret = self.select.caret_index();
        let len = self.content.len();
        let target = match unit {
            TextMoveUnit::Char if forward => self.content.next_boundary(caret),
            TextMoveUnit::Char => self.content.prev_boundary(caret),
            TextMoveUnit::Word => {
                let text = self.content.text();
                let words = word_ranges(&text)
                    .into_iter()
                    .filter(|r| !slice_utf16(&text, r.clone()).chars().all(char::is_whitespace));
                if forward {
                    words.map(|r| r.end).find(|&e| e > caret).unwrap_or(len)
                } else {
                    words
                        .map(|r| r.start)
                        .filter(|&s| s < caret)
                        .last()
                        .unwrap_or(0)
                }
            }
            TextMoveUnit::Line => {
                self.ensure_paragraph();
                self.select.vertical_target(caret, !forward)
            }
            TextMoveUnit::Paragraph => {
                let current = self.content.paragraph_range_at(caret);
                if forward {
                    if current.end > caret || current.end == len {
                        current.end
                    } else {
                        self.content.paragraph_range_at(caret + 1).end
                    }
                } else if current.start < caret || current.start == 0 {
                    current.start
                } else {
                    self.content.paragraph_range_at(caret - 1).start
                }
            }
        };
        self.close_select_overlay();
        self.move_caret(target, TextAffinity::Downstream);
        self.caret_scroll_pending = true;
    }
}
