//! Caret and selection state with geometry derived from the current paragraph.
//!
//! Logical state (caret index, two handle indices) is set explicitly and does
//! not touch the paragraph. Geometry (caret rect, handle rects) is recomputed
//! only by the explicit `calculate_*`/`update_*_offset` calls, which the
//! pattern issues once per layout pass after the paragraph was rebuilt. This
//! controller is the only place that queries the paragraph for hit testing
//! and caret metrics.
//!
//! Coordinates: `content_rect` is the text viewport in field-local space. The
//! paragraph origin sits at `content_rect.origin() + scroll_offset`, where the
//! scroll offset is never positive along the scroll axis (x for single-line
//! fields, y for multiline ones).

use core_paragraph::{Offset, Paragraph, PositionWithAffinity, Rect, TextAffinity};
use std::fmt;
use std::ops::Range;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CaretInfo {
    pub index: usize,
    pub affinity: TextAffinity,
    pub rect: Rect,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HandleInfo {
    pub index: usize,
    pub rect: Rect,
}

pub struct TextSelectController {
    paragraph: Option<Box<dyn Paragraph>>,
    paragraph_version: Option<u64>,
    text_len: usize,
    caret: CaretInfo,
    first_handle: HandleInfo,
    second_handle: HandleInfo,
    content_rect: Rect,
    scroll_offset: Offset,
    multiline: bool,
    caret_width: f32,
}

impl fmt::Debug for TextSelectController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextSelectController")
            .field("paragraph_version", &self.paragraph_version)
            .field("text_len", &self.text_len)
            .field("caret", &self.caret)
            .field("first_handle", &self.first_handle)
            .field("second_handle", &self.second_handle)
            .field("content_rect", &self.content_rect)
            .field("scroll_offset", &self.scroll_offset)
            .finish()
    }
}

impl Default for TextSelectController {
    fn default() -> Self {
        Self::new(2.0)
    }
}

impl TextSelectController {
    pub fn new(caret_width: f32) -> Self {
        Self {
            paragraph: None,
            paragraph_version: None,
            text_len: 0,
            caret: CaretInfo::default(),
            first_handle: HandleInfo::default(),
            second_handle: HandleInfo::default(),
            content_rect: Rect::default(),
            scroll_offset: Offset::zero(),
            multiline: false,
            caret_width,
        }
    }

    pub fn set_caret_width(&mut self, width: f32) {
        self.caret_width = width.max(0.0);
    }

    pub fn set_multiline(&mut self, multiline: bool) {
        if self.multiline != multiline {
            self.multiline = multiline;
            self.scroll_offset = Offset::zero();
        }
    }

    // ---------------------------------------------------------------------
    // Paragraph and viewport
    // ---------------------------------------------------------------------

    /// Install a freshly built paragraph for content `version`.
    pub fn set_paragraph(&mut self, paragraph: Box<dyn Paragraph>, version: u64) {
        self.text_len = paragraph.text_len();
        self.paragraph = Some(paragraph);
        self.paragraph_version = Some(version);
        self.clamp_indices();
        self.clamp_scroll();
    }

    pub fn paragraph_version(&self) -> Option<u64> {
        self.paragraph_version
    }

    pub fn paragraph(&self) -> Option<&dyn Paragraph> {
        self.paragraph.as_deref()
    }

    /// Drop the paragraph; geometry queries fall back to the content origin.
    pub fn reset_paragraph(&mut self) {
        self.paragraph = None;
        self.paragraph_version = None;
    }

    pub fn set_content_rect(&mut self, rect: Rect) {
        self.content_rect = rect;
        self.clamp_scroll();
    }

    pub fn content_rect(&self) -> Rect {
        self.content_rect
    }

    /// Text length changed; clamp every index into the new bounds.
    pub fn on_content_changed(&mut self, len: usize) {
        self.text_len = len;
        self.clamp_indices();
    }

    pub fn text_len(&self) -> usize {
        self.text_len
    }

    // ---------------------------------------------------------------------
    // Logical state
    // ---------------------------------------------------------------------

    pub fn caret_index(&self) -> usize {
        self.caret.index
    }

    pub fn caret_info(&self) -> CaretInfo {
        self.caret
    }

    pub fn caret_rect(&self) -> Rect {
        self.caret.rect
    }

    pub fn first_handle(&self) -> HandleInfo {
        self.first_handle
    }

    pub fn second_handle(&self) -> HandleInfo {
        self.second_handle
    }

    /// Collapse to caret mode at `index`.
    pub fn update_caret_index(&mut self, index: usize) {
        let index = index.min(self.text_len);
        self.caret.index = index;
        self.first_handle.index = index;
        self.second_handle.index = index;
        trace!(target: "state.select", index, "update_caret_index");
    }

    /// Set both handle indices as given; the caret follows the second one.
    /// Indices are stored unordered so the anchor survives drag-extends.
    pub fn update_handle_index(&mut self, first: usize, second: usize) {
        let first = first.min(self.text_len);
        let second = second.min(self.text_len);
        self.first_handle.index = first;
        self.second_handle.index = second;
        self.caret.index = second;
        trace!(target: "state.select", first, second, "update_handle_index");
    }

    pub fn start(&self) -> usize {
        self.first_handle.index.min(self.second_handle.index)
    }

    pub fn end(&self) -> usize {
        self.first_handle.index.max(self.second_handle.index)
    }

    pub fn selection_range(&self) -> Range<usize> {
        self.start()..self.end()
    }

    pub fn is_selected(&self) -> bool {
        self.first_handle.index != self.second_handle.index
    }

    pub fn is_selected_all(&self) -> bool {
        self.text_len > 0 && self.start() == 0 && self.end() == self.text_len
    }

    // ---------------------------------------------------------------------
    // Geometry
    // ---------------------------------------------------------------------

    /// Paragraph origin in field-local coordinates.
    pub fn text_origin(&self) -> Offset {
        self.content_rect.origin() + self.scroll_offset
    }

    pub fn scroll_offset(&self) -> Offset {
        self.scroll_offset
    }

    /// Move the caret to `index` (clamped, collapsing any selection) and
    /// refresh its rect. With `move_content` the viewport scrolls so the
    /// caret stays visible. Without `force_update` the rect is reused when
    /// neither the index nor the affinity changed.
    pub fn move_caret_to_content_rect(
        &mut self,
        index: usize,
        affinity: TextAffinity,
        force_update: bool,
        move_content: bool,
    ) {
        let index = index.min(self.text_len);
        let unchanged = self.caret.index == index
            && self.caret.affinity == affinity
            && !self.is_selected();
        self.update_caret_index(index);
        self.caret.affinity = affinity;
        if unchanged && !force_update {
            return;
        }
        if move_content {
            self.scroll_to_index(index, affinity);
        }
        self.caret.rect = self.caret_rect_at(index, affinity);
        self.update_first_handle_offset();
        self.update_second_handle_offset();
    }

    /// Recompute caret and handle rects from the current indices.
    pub fn calculate_handle_offset(&mut self) {
        self.update_caret_offset();
        self.update_first_handle_offset();
        self.update_second_handle_offset();
    }

    pub fn update_caret_offset(&mut self) {
        self.caret.rect = self.caret_rect_at(self.caret.index, self.caret.affinity);
    }

    pub fn update_first_handle_offset(&mut self) {
        let affinity = self.handle_affinity(self.first_handle.index);
        self.first_handle.rect = self.caret_rect_at(self.first_handle.index, affinity);
    }

    pub fn update_second_handle_offset(&mut self) {
        let affinity = self.handle_affinity(self.second_handle.index);
        self.second_handle.rect = self.caret_rect_at(self.second_handle.index, affinity);
    }

    /// Field-local caret rect for `index`.
    pub fn caret_rect_at(&self, index: usize, affinity: TextAffinity) -> Rect {
        let origin = self.text_origin();
        match self
            .paragraph
            .as_ref()
            .and_then(|p| p.caret_metrics(index.min(self.text_len), affinity))
        {
            Some(m) => Rect::new(
                origin.x + m.offset.x,
                origin.y + m.offset.y,
                self.caret_width,
                m.height,
            ),
            None => Rect::new(origin.x, origin.y, self.caret_width, 0.0),
        }
    }

    /// Map a field-local point to a text position. Empty text maps to 0.
    pub fn convert_touch_offset_to_position(&self, local: Offset) -> PositionWithAffinity {
        let zero = PositionWithAffinity {
            index: 0,
            affinity: TextAffinity::Downstream,
        };
        if self.text_len == 0 {
            return zero;
        }
        let Some(paragraph) = self.paragraph.as_ref() else {
            return zero;
        };
        let mut pos = paragraph.glyph_position_at_coordinate(local - self.text_origin());
        pos.index = pos.index.min(self.text_len);
        pos
    }

    pub fn convert_touch_offset_to_index(&self, local: Offset) -> usize {
        self.convert_touch_offset_to_position(local).index
    }

    /// Word run under `index`, as reported by the paragraph.
    pub fn word_boundary(&self, index: usize) -> Range<usize> {
        match self.paragraph.as_ref() {
            Some(p) if self.text_len > 0 => {
                let r = p.word_boundary(index.min(self.text_len));
                r.start.min(self.text_len)..r.end.min(self.text_len)
            }
            _ => 0..0,
        }
    }

    /// Word run under a field-local point.
    pub fn word_range_at_offset(&self, local: Offset) -> Range<usize> {
        self.word_boundary(self.convert_touch_offset_to_index(local))
    }

    /// Field-local rects covering the selection.
    pub fn selected_rects(&self) -> Vec<Rect> {
        let Some(paragraph) = self.paragraph.as_ref() else {
            return Vec::new();
        };
        if !self.is_selected() {
            return Vec::new();
        }
        let origin = self.text_origin();
        paragraph
            .rects_for_range(self.start(), self.end())
            .into_iter()
            .map(|r| r.translate(origin))
            .collect()
    }

    /// Index one visual line above or below `index`. Past the first line the
    /// target is 0, past the last line it is the text length.
    pub fn vertical_target(&self, index: usize, up: bool) -> usize {
        let Some(paragraph) = self.paragraph.as_ref() else {
            return if up { 0 } else { self.text_len };
        };
        if !self.multiline {
            return if up { 0 } else { self.text_len };
        }
        let Some(m) = paragraph.caret_metrics(index.min(self.text_len), self.caret.affinity)
        else {
            return index.min(self.text_len);
        };
        let y = if up {
            m.offset.y - m.height / 2.0
        } else {
            m.offset.y + m.height * 1.5
        };
        if y < 0.0 {
            return 0;
        }
        if y >= paragraph.height() {
            return self.text_len;
        }
        paragraph
            .glyph_index_by_coordinate(Offset::new(m.offset.x, y))
            .min(self.text_len)
    }

    // ---------------------------------------------------------------------
    // Scrolling
    // ---------------------------------------------------------------------

    /// Largest scroll distance along the scroll axis.
    pub fn max_scroll(&self) -> f32 {
        let Some(p) = self.paragraph.as_ref() else {
            return 0.0;
        };
        if self.multiline {
            (p.height() - self.content_rect.height).max(0.0)
        } else {
            (p.longest_line() + self.caret_width - self.content_rect.width).max(0.0)
        }
    }

    /// Scroll the text by `delta` along the scroll axis (positive moves the
    /// viewport towards the end of the text). Returns the distance applied.
    pub fn scroll_by(&mut self, delta: f32) -> f32 {
        let before = self.axis_scroll();
        let target = (before + delta).clamp(0.0, self.max_scroll());
        self.set_axis_scroll(target);
        let applied = target - before;
        if applied != 0.0 {
            trace!(target: "state.select", applied, scroll = target, "scroll_by");
            self.calculate_handle_offset();
        }
        applied
    }

    /// Scroll so the caret rect at `index` sits inside the viewport.
    pub fn scroll_to_index(&mut self, index: usize, affinity: TextAffinity) {
        let rect = self.caret_rect_at(index, affinity);
        let (lo, hi, view_lo, view_hi) = if self.multiline {
            (
                rect.top(),
                rect.bottom(),
                self.content_rect.top(),
                self.content_rect.bottom(),
            )
        } else {
            (
                rect.left(),
                rect.right(),
                self.content_rect.left(),
                self.content_rect.right(),
            )
        };
        if lo < view_lo {
            self.scroll_by(lo - view_lo);
        } else if hi > view_hi {
            self.scroll_by(hi - view_hi);
        }
    }

    fn axis_scroll(&self) -> f32 {
        if self.multiline {
            -self.scroll_offset.y
        } else {
            -self.scroll_offset.x
        }
    }

    fn set_axis_scroll(&mut self, value: f32) {
        if self.multiline {
            self.scroll_offset = Offset::new(0.0, -value);
        } else {
            self.scroll_offset = Offset::new(-value, 0.0);
        }
    }

    fn clamp_scroll(&mut self) {
        let clamped = self.axis_scroll().clamp(0.0, self.max_scroll());
        self.set_axis_scroll(clamped);
    }

    fn clamp_indices(&mut self) {
        let len = self.text_len;
        self.caret.index = self.caret.index.min(len);
        self.first_handle.index = self.first_handle.index.min(len);
        self.second_handle.index = self.second_handle.index.min(len);
    }

    fn handle_affinity(&self, index: usize) -> TextAffinity {
        if self.is_selected() && index == self.end() {
            TextAffinity::Upstream
        } else {
            TextAffinity::Downstream
        }
    }
}
