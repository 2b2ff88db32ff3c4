//! Paragraph service consumed by the editing core.
//!
//! A `Paragraph` is an immutable shaping result for one piece of text that
//! answers hit-testing, caret and range queries. It is rebuilt, never mutated,
//! whenever the text changes; a `ParagraphFactory` produces new instances.
//! All indices are UTF-16 offsets into the text the paragraph was built from.
//!
//! Real backends (platform text shaping) live outside this workspace. The
//! `monospace` module provides a deterministic implementation with fixed
//! cluster advances that the editor tests and the demo binary run against.

pub mod geometry;
pub mod monospace;

pub use geometry::{Offset, Rect};
pub use monospace::{MonospaceParagraph, MonospaceParagraphFactory};

use std::ops::Range;

/// Disambiguates the visual line of an index sitting on a soft line-wrap boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAffinity {
    /// Attached to the logically following character (next line).
    #[default]
    Downstream,
    /// Attached to the logically preceding character (previous line).
    Upstream,
}

/// Result of a coordinate hit test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionWithAffinity {
    pub index: usize,
    pub affinity: TextAffinity,
}

/// Caret placement relative to the paragraph origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaretMetrics {
    pub offset: Offset,
    pub height: f32,
}

/// Style inputs a paragraph is built with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParagraphStyle {
    pub font_size: f32,
    /// Hard breaks and soft wrapping are honoured only for multiline paragraphs.
    pub multiline: bool,
}

impl Default for ParagraphStyle {
    fn default() -> Self {
        Self {
            font_size: 16.0,
            multiline: false,
        }
    }
}

pub trait Paragraph {
    /// Lay the text out within `max_width`.
    fn layout(&mut self, max_width: f32);
    /// UTF-16 length of the laid out text.
    fn text_len(&self) -> usize;
    fn height(&self) -> f32;
    fn longest_line(&self) -> f32;
    fn line_count(&self) -> usize;
    fn glyph_position_at_coordinate(&self, offset: Offset) -> PositionWithAffinity;
    fn word_boundary(&self, index: usize) -> Range<usize>;
    fn caret_metrics(&self, index: usize, affinity: TextAffinity) -> Option<CaretMetrics>;
    fn rects_for_range(&self, start: usize, end: usize) -> Vec<Rect>;

    fn glyph_index_by_coordinate(&self, offset: Offset) -> usize {
        self.glyph_position_at_coordinate(offset).index
    }
}

pub trait ParagraphFactory {
    fn create(&self, text: &str, style: &ParagraphStyle) -> Box<dyn Paragraph>;
}
