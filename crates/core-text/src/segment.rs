//! Segmentation adapter producing UTF-16 offsets.
//!
//! Contract:
//! - Input: &str content (may be received from IME, paste, accessibility etc.)
//! - Output: boundaries or ranges expressed in UTF-16 code units of that content.
//! - Guarantees: boundaries are strictly increasing, start at 0 and end at the
//!   UTF-16 length; ranges never split a grapheme cluster.
//! - Safety: does not log content.

use std::ops::Range;
use unicode_segmentation::UnicodeSegmentation;

/// Length of `s` in UTF-16 code units.
pub fn utf16_len(s: &str) -> usize {
    s.chars().map(char::len_utf16).sum()
}

/// Byte offset in `s` for a UTF-16 offset (clamped to `s.len()`).
pub fn utf16_to_byte(s: &str, index: usize) -> usize {
    let mut units = 0usize;
    for (byte, ch) in s.char_indices() {
        if units >= index {
            return byte;
        }
        units += ch.len_utf16();
    }
    s.len()
}

/// UTF-16 offset for a byte offset of `s`.
pub fn byte_to_utf16(s: &str, byte: usize) -> usize {
    let byte = byte.min(s.len());
    utf16_len(&s[..floor_char_boundary(s, byte)])
}

fn floor_char_boundary(s: &str, mut byte: usize) -> usize {
    while byte > 0 && !s.is_char_boundary(byte) {
        byte -= 1;
    }
    byte
}

/// Grapheme cluster boundaries of `s` in UTF-16 units (includes `0` and the length).
pub fn grapheme_boundaries(s: &str) -> Vec<usize> {
    let mut out = Vec::with_capacity(s.len() + 1);
    out.push(0);
    let mut units = 0usize;
    for g in s.graphemes(true) {
        units += utf16_len(g);
        out.push(units);
    }
    out
}

/// Number of grapheme clusters in `s`.
pub fn grapheme_count(s: &str) -> usize {
    s.graphemes(true).count()
}

/// Word-bound ranges (UAX #29) covering `s`, in UTF-16 units.
pub fn word_ranges(s: &str) -> Vec<Range<usize>> {
    let mut out = Vec::new();
    let mut units = 0usize;
    for piece in s.split_word_bounds() {
        let len = utf16_len(piece);
        out.push(units..units + len);
        units += len;
    }
    out
}

fn is_blank(s: &str) -> bool {
    s.chars().all(char::is_whitespace)
}

/// The word run that contains `index`.
///
/// A caret sitting right after a word (on whitespace or at the end of the
/// text) resolves to that preceding word. Empty text yields `0..0`.
pub fn word_range_at(s: &str, index: usize) -> Range<usize> {
    let ranges = word_ranges(s);
    let Some(last) = ranges.last().cloned() else {
        return 0..0;
    };
    let pos = ranges
        .iter()
        .position(|r| r.start <= index && index < r.end);
    let Some(pos) = pos else {
        return last;
    };
    let current = ranges[pos].clone();
    let text = slice_utf16(s, current.clone());
    if is_blank(text) && pos > 0 && current.start == index {
        let prev = ranges[pos - 1].clone();
        if !is_blank(slice_utf16(s, prev.clone())) {
            return prev;
        }
    }
    current
}

/// The paragraph (newline-delimited run, newline excluded) containing `index`.
pub fn paragraph_range_at(s: &str, index: usize) -> Range<usize> {
    let units: Vec<u16> = s.encode_utf16().collect();
    let index = index.min(units.len());
    let newline = u16::from(b'\n');
    let start = units[..index]
        .iter()
        .rposition(|u| *u == newline)
        .map(|p| p + 1)
        .unwrap_or(0);
    let end = units[index..]
        .iter()
        .position(|u| *u == newline)
        .map(|p| index + p)
        .unwrap_or(units.len());
    start..end
}

/// Sub-slice of `s` addressed by a UTF-16 range (clamped).
pub fn slice_utf16(s: &str, range: Range<usize>) -> &str {
    let start = utf16_to_byte(s, range.start);
    let end = utf16_to_byte(s, range.end.max(range.start));
    &s[start..end]
}

/// Longest prefix of `s` made of whole clusters whose UTF-16 length fits in
/// `max_units`. Returns the prefix and whether anything was cut.
pub fn truncate_to_units(s: &str, max_units: usize) -> (&str, bool) {
    let mut units = 0usize;
    let mut end = 0usize;
    for (byte, g) in s.grapheme_indices(true) {
        let len = utf16_len(g);
        if units + len > max_units {
            return (&s[..byte], true);
        }
        units += len;
        end = byte + g.len();
    }
    (&s[..end], false)
}
