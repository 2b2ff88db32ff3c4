//! UTF-16 text buffer abstraction.
//!
//! The buffer stores UTF-16 code units because every index exchanged with the
//! input method, the paragraph engine and accessibility clients is a UTF-16
//! offset. Grapheme safety is enforced here: insert and delete boundaries snap
//! to cluster boundaries so an emoji sequence or a combining mark is never
//! split by an edit.

pub mod filter;
pub mod segment;

pub use filter::{FilterOutcome, InputFilter, TextInputType};
pub use segment::utf16_len;

use std::fmt;

/// Text content addressed in UTF-16 code units.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct TextBuffer {
    units: Vec<u16>,
}

impl fmt::Debug for TextBuffer {
    // Content is deliberately not printed; lengths only.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextBuffer")
            .field("len", &self.units.len())
            .finish()
    }
}

impl From<&str> for TextBuffer {
    fn from(value: &str) -> Self {
        Self::from_text(value)
    }
}

impl TextBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct a buffer from an in-memory string slice.
    pub fn from_text(content: &str) -> Self {
        Self {
            units: content.encode_utf16().collect(),
        }
    }

    /// Length in UTF-16 code units.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn units(&self) -> &[u16] {
        &self.units
    }

    /// Whole content as an owned `String`.
    pub fn text(&self) -> String {
        String::from_utf16_lossy(&self.units)
    }

    /// Clamp an index into `0..=len`.
    pub fn clamp(&self, index: usize) -> usize {
        index.min(self.units.len())
    }

    /// Content of `[start,end)` (clamped, order-insensitive).
    pub fn slice(&self, start: usize, end: usize) -> String {
        let (s, e) = self.ordered(start, end);
        String::from_utf16_lossy(&self.units[s..e])
    }

    /// All grapheme cluster boundaries, including `0` and `len`.
    pub fn boundaries(&self) -> Vec<usize> {
        segment::grapheme_boundaries(&self.text())
    }

    /// Largest cluster boundary `<= index`.
    pub fn floor_boundary(&self, index: usize) -> usize {
        let index = self.clamp(index);
        let bounds = self.boundaries();
        match bounds.binary_search(&index) {
            Ok(_) => index,
            Err(pos) => bounds[pos.saturating_sub(1)],
        }
    }

    /// Smallest cluster boundary `>= index`.
    pub fn ceil_boundary(&self, index: usize) -> usize {
        let index = self.clamp(index);
        let bounds = self.boundaries();
        match bounds.binary_search(&index) {
            Ok(_) => index,
            Err(pos) => bounds.get(pos).copied().unwrap_or(self.units.len()),
        }
    }

    /// Previous grapheme boundary (returns 0 if already at the first boundary).
    pub fn prev_boundary(&self, index: usize) -> usize {
        let index = self.clamp(index);
        if index == 0 {
            return 0;
        }
        let bounds = self.boundaries();
        match bounds.binary_search(&index) {
            Ok(pos) | Err(pos) => bounds[pos.saturating_sub(1)],
        }
    }

    /// Next grapheme boundary (returns len if at or beyond end).
    pub fn next_boundary(&self, index: usize) -> usize {
        let index = self.clamp(index);
        let bounds = self.boundaries();
        match bounds.binary_search(&index) {
            Ok(pos) => bounds.get(pos + 1).copied().unwrap_or(self.units.len()),
            Err(pos) => bounds.get(pos).copied().unwrap_or(self.units.len()),
        }
    }

    /// Insert `value` at the cluster boundary at or before `index`.
    /// Returns the index the text actually landed at.
    pub fn insert(&mut self, index: usize, value: &str) -> usize {
        let at = self.floor_boundary(index);
        let encoded: Vec<u16> = value.encode_utf16().collect();
        self.units.splice(at..at, encoded);
        at
    }

    /// Remove `[start,end)` widened outward to cluster boundaries.
    /// Returns the removed text.
    pub fn remove(&mut self, start: usize, end: usize) -> String {
        let (s, e) = self.ordered(start, end);
        if s == e {
            return String::new();
        }
        let s = self.floor_boundary(s);
        let e = self.ceil_boundary(e);
        let removed: Vec<u16> = self.units.drain(s..e).collect();
        String::from_utf16_lossy(&removed)
    }

    /// Replace the whole content.
    pub fn set(&mut self, value: &str) {
        self.units = value.encode_utf16().collect();
    }

    pub fn clear(&mut self) {
        self.units.clear();
    }

    fn ordered(&self, a: usize, b: usize) -> (usize, usize) {
        let a = self.clamp(a);
        let b = self.clamp(b);
        if a <= b { (a, b) } else { (b, a) }
    }
}
