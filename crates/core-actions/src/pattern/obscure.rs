//! Password masking, the briefly revealed "naked" character and the
//! response area at the trailing edge of the field.

use super::{DirtyFlags, TextFieldPattern};
use crate::task::PatternTask;
use core_config::FieldConfig;
use core_events::TimerSlot;
use std::ops::Range;
use tracing::debug;

const MASK_CHAR: char = '\u{2022}';
/// Width reserved for the password toggle and the clean button.
const RESPONSE_ICON_WIDTH: f32 = 24.0;

/// Trailing widget of the field. Exactly one kind is active at a time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ResponseArea {
    #[default]
    None,
    Password { visible: bool },
    Unit(String),
    CleanNode,
}

impl ResponseArea {
    /// Derive the response area from the field configuration. A password
    /// field keeps its current visibility across reconfiguration.
    pub fn from_config(field: &FieldConfig, previous: &ResponseArea) -> ResponseArea {
        if field.input_type.is_obscured() {
            let visible = matches!(previous, ResponseArea::Password { visible: true });
            return ResponseArea::Password { visible };
        }
        if let Some(unit) = field.unit.as_ref().filter(|u| !u.is_empty()) {
            return ResponseArea::Unit(unit.clone());
        }
        if field.show_cancel_button {
            return ResponseArea::CleanNode;
        }
        ResponseArea::None
    }
}

#[derive(Debug, Default)]
pub(crate) struct ObscureState {
    reveal: Option<Range<usize>>,
    slot: TimerSlot,
}

impl ObscureState {
    /// Mask everything again and drop a pending reveal timer.
    pub(crate) fn conceal(&mut self) {
        self.reveal = None;
        self.slot.cancel();
    }
}

impl TextFieldPattern {
    pub fn response_area(&self) -> &ResponseArea {
        &self.response_area
    }

    pub(crate) fn response_area_width(&self) -> f32 {
        match &self.response_area {
            ResponseArea::None => 0.0,
            ResponseArea::Password { .. } | ResponseArea::CleanNode => RESPONSE_ICON_WIDTH,
            ResponseArea::Unit(text) => {
                let mut paragraph = self
                    .paragraph_factory
                    .create(text, &self.paragraph_style());
                paragraph.layout(f32::INFINITY);
                paragraph.longest_line()
            }
        }
    }

    /// Activate the response area: toggle password visibility or clear the
    /// text. Returns whether anything changed.
    pub fn on_response_area_click(&mut self) -> bool {
        if !self.attached {
            return false;
        }
        match &mut self.response_area {
            ResponseArea::Password { visible } => {
                *visible = !*visible;
                debug!(target: "actions.pattern", visible = *visible, "password_visibility_toggled");
                self.obscure.conceal();
                self.select.reset_paragraph();
                self.dirty |= DirtyFlags::MEASURE | DirtyFlags::RENDER;
                true
            }
            ResponseArea::CleanNode => self.clean_text(),
            ResponseArea::Unit(_) | ResponseArea::None => false,
        }
    }

    /// Clear the whole text as one undoable edit.
    fn clean_text(&mut self) -> bool {
        self.flush_pending_operations();
        if self.preview.is_active() {
            self.finish_preview_operation();
        }
        let record = self.snapshot_record();
        if !self.content.erase() {
            return false;
        }
        self.undo.record(record);
        self.after_content_change();
        self.close_select_overlay();
        self.select.update_caret_index(0);
        self.on_selection_updated();
        debug!(target: "actions.pattern", "text_cleaned");
        true
    }

    /// Whether the text is currently rendered masked.
    pub fn is_text_obscured(&self) -> bool {
        self.config.file.field.input_type.is_obscured()
            && !matches!(self.response_area, ResponseArea::Password { visible: true })
    }

    /// Text handed to the paragraph: the content, or its mask. The mask
    /// spends one character per UTF-16 unit so indices stay aligned.
    pub(crate) fn display_text(&self) -> String {
        let text = self.content.text();
        if !self.is_text_obscured() {
            return text;
        }
        let reveal = self.obscure.reveal.clone().unwrap_or(0..0);
        let mut out = String::with_capacity(text.len());
        let mut unit = 0usize;
        for ch in text.chars() {
            if reveal.contains(&unit) {
                out.push(ch);
            } else {
                out.extend(std::iter::repeat_n(MASK_CHAR, ch.len_utf16()));
            }
            unit += ch.len_utf16();
        }
        out
    }

    /// The character range shown unmasked right now, if any.
    pub fn revealed_range(&self) -> Option<Range<usize>> {
        self.obscure.reveal.clone()
    }

    /// Show the just-typed cluster in clear until the reveal timer fires.
    pub(crate) fn reveal_naked_char(&mut self, range: Range<usize>) {
        if !self.is_text_obscured() || range.is_empty() {
            return;
        }
        self.obscure.reveal = Some(range);
        let generation = self.obscure.slot.arm();
        self.post(
            PatternTask::ObscureMask { generation },
            self.config.file.obscure.reveal(),
        );
    }

    pub(crate) fn on_obscure_mask(&mut self, generation: u64) {
        if !self.obscure.slot.fire(generation) {
            return;
        }
        self.obscure.reveal = None;
        self.select.reset_paragraph();
        self.dirty |= DirtyFlags::MEASURE | DirtyFlags::RENDER;
    }
}
