//! Authoritative text content of a field.
//!
//! Every mutation of the text goes through [`ContentController`]; the
//! selection controller and the pattern only ever read it. Indices are UTF-16
//! offsets, clamped on entry. Edits never split a grapheme cluster.

use crate::error::{EditError, EditResult};
use core_text::segment::paragraph_range_at;
use core_text::{InputFilter, TextBuffer, utf16_len};
use std::ops::Range;
use tracing::trace;

/// What an accepted insertion actually did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InsertOutcome {
    /// Index the text landed at.
    pub start: usize,
    /// UTF-16 length of the inserted text.
    pub inserted_len: usize,
    /// Clusters removed by the filter.
    pub rejected: String,
    /// Max length cut the value short.
    pub truncated: bool,
}

impl InsertOutcome {
    pub fn end(&self) -> usize {
        self.start + self.inserted_len
    }

    pub fn is_filtered(&self) -> bool {
        !self.rejected.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct ContentController {
    buffer: TextBuffer,
    filter: InputFilter,
    /// Bumped on every mutation; paragraphs built from older versions are stale.
    version: u64,
}

impl ContentController {
    pub fn new(filter: InputFilter) -> Self {
        Self {
            buffer: TextBuffer::new(),
            filter,
            version: 0,
        }
    }

    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    pub fn text(&self) -> String {
        self.buffer.text()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn filter(&self) -> &InputFilter {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: InputFilter) {
        self.filter = filter;
    }

    pub fn max_length(&self) -> Option<usize> {
        self.filter.max_length()
    }

    /// Cluster boundary at or before `index`.
    pub fn snap(&self, index: usize) -> usize {
        self.buffer.floor_boundary(index)
    }

    /// Insert `value` at `index`, filtered and cut to the max-length room.
    ///
    /// Fails with [`EditError::Rejected`] (and leaves the content untouched)
    /// when the filter removed every cluster of a non-empty value. A value
    /// cut to nothing by max length is not an error.
    pub fn insert_value(&mut self, index: usize, value: &str) -> EditResult<InsertOutcome> {
        let at = self.buffer.floor_boundary(index);
        let filtered = self.filter.apply(value, &self.buffer.text());
        if filtered.accepted.is_empty() && filtered.is_filtered() {
            trace!(target: "state.content", rejected_len = utf16_len(&filtered.rejected), "insert_rejected");
            return Err(EditError::Rejected);
        }
        let inserted_len = utf16_len(&filtered.accepted);
        if inserted_len > 0 {
            self.buffer.insert(at, &filtered.accepted);
            self.version += 1;
        }
        trace!(target: "state.content", at, inserted_len, truncated = filtered.truncated, len = self.buffer.len(), "insert_value");
        Ok(InsertOutcome {
            start: at,
            inserted_len,
            rejected: filtered.rejected,
            truncated: filtered.truncated,
        })
    }

    /// Replace `[start,end)` with `value` in one step. The filter sees the
    /// content with the range already removed; on rejection nothing changes.
    pub fn replace_selected_value(
        &mut self,
        start: usize,
        end: usize,
        value: &str,
    ) -> EditResult<InsertOutcome> {
        let range = self.cluster_range(start, end);
        if range.is_empty() {
            return self.insert_value(range.start, value);
        }
        let mut remaining = self.buffer.clone();
        remaining.remove(range.start, range.end);
        let filtered = self.filter.apply(value, &remaining.text());
        if filtered.accepted.is_empty() && filtered.is_filtered() {
            trace!(target: "state.content", "replace_rejected");
            return Err(EditError::Rejected);
        }
        self.buffer = remaining;
        let at = self.buffer.insert(range.start, &filtered.accepted);
        self.version += 1;
        let inserted_len = utf16_len(&filtered.accepted);
        trace!(target: "state.content", start = range.start, end = range.end, inserted_len, "replace_selected_value");
        Ok(InsertOutcome {
            start: at,
            inserted_len,
            rejected: filtered.rejected,
            truncated: filtered.truncated,
        })
    }

    /// Replace `[start,end)` with `value` bypassing the filter. Used for
    /// composition text, which is filtered once when it is committed.
    /// Returns the range the value now occupies.
    pub fn replace_preview_value(&mut self, start: usize, end: usize, value: &str) -> Range<usize> {
        let range = self.cluster_range(start, end);
        if range.is_empty() && value.is_empty() {
            return range;
        }
        self.buffer.remove(range.start, range.end);
        let at = self.buffer.insert(range.start, value);
        self.version += 1;
        let len = utf16_len(value);
        trace!(target: "state.content", start = at, replaced = range.end - range.start, len, "replace_preview_value");
        at..at + len
    }

    /// UTF-16 length covered by `length` clusters from `index` in the given
    /// direction, stopping at the buffer edge.
    pub fn get_delete_length(&self, index: usize, length: usize, backward: bool) -> usize {
        let range = self.delete_span(index, length, backward);
        range.end - range.start
    }

    /// Delete `length` clusters from `index`. Returns the UTF-16 units removed.
    pub fn delete(&mut self, index: usize, length: usize, backward: bool) -> usize {
        let range = self.delete_span(index, length, backward);
        if range.is_empty() {
            return 0;
        }
        self.buffer.remove(range.start, range.end);
        self.version += 1;
        let deleted = range.end - range.start;
        trace!(target: "state.content", start = range.start, deleted, backward, "delete");
        deleted
    }

    /// Remove `[start,end)` (widened to clusters) and return the removed text.
    pub fn delete_range(&mut self, start: usize, end: usize) -> String {
        let range = self.cluster_range(start, end);
        if range.is_empty() {
            return String::new();
        }
        let removed = self.buffer.remove(range.start, range.end);
        self.version += 1;
        trace!(target: "state.content", start = range.start, end = range.end, "delete_range");
        removed
    }

    pub fn get_selected_value(&self, start: usize, end: usize) -> String {
        self.buffer.slice(start, end)
    }

    /// Re-run the filter over the whole content. Returns whether anything changed.
    pub fn filter_value(&mut self) -> bool {
        let current = self.buffer.text();
        let filtered = self.filter.apply(&current, "");
        if filtered.accepted == current {
            return false;
        }
        self.buffer.set(&filtered.accepted);
        self.version += 1;
        trace!(target: "state.content", len = self.buffer.len(), "filter_value_changed");
        true
    }

    /// Replace the whole content without filtering (restore paths, imperative set).
    pub fn set_text_value(&mut self, value: &str) {
        if self.buffer.text() == value {
            return;
        }
        self.buffer.set(value);
        self.version += 1;
        trace!(target: "state.content", len = self.buffer.len(), "set_text_value");
    }

    /// Clear everything. Returns whether there was anything to clear.
    pub fn erase(&mut self) -> bool {
        if self.buffer.is_empty() {
            return false;
        }
        self.buffer.clear();
        self.version += 1;
        trace!(target: "state.content", "erase");
        true
    }

    /// Newline-delimited run around `index`.
    pub fn paragraph_range_at(&self, index: usize) -> Range<usize> {
        paragraph_range_at(&self.buffer.text(), index)
    }

    /// Cluster boundary one step before/after `index`.
    pub fn prev_boundary(&self, index: usize) -> usize {
        self.buffer.prev_boundary(index)
    }

    pub fn next_boundary(&self, index: usize) -> usize {
        self.buffer.next_boundary(index)
    }

    fn cluster_range(&self, start: usize, end: usize) -> Range<usize> {
        let (s, e) = if start <= end { (start, end) } else { (end, start) };
        let s = self.buffer.floor_boundary(s);
        let e = self.buffer.ceil_boundary(e);
        s..e.max(s)
    }

    fn delete_span(&self, index: usize, length: usize, backward: bool) -> Range<usize> {
        if length == 0 || self.buffer.is_empty() {
            let at = self.buffer.clamp(index);
            return at..at;
        }
        let bounds = self.buffer.boundaries();
        let at = self.buffer.floor_boundary(index);
        let pos = bounds.binary_search(&at).unwrap_or_else(|p| p.saturating_sub(1));
        if backward {
            let first = pos.saturating_sub(length);
            bounds[first]..at
        } else {
            let last = (pos + length).min(bounds.len() - 1);
            at..bounds[last]
        }
    }
}
