//! Preview (composition) text bookkeeping.

use crate::error::{EditError, EditResult};
use std::ops::Range;
use tracing::trace;

/// Range as exchanged with input methods; `-1/-1` means "no range".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewRange {
    pub start: i32,
    pub end: i32,
}

impl Default for PreviewRange {
    fn default() -> Self {
        Self::INACTIVE
    }
}

impl PreviewRange {
    pub const INACTIVE: PreviewRange = PreviewRange { start: -1, end: -1 };

    pub fn new(start: i32, end: i32) -> Self {
        Self { start, end }
    }

    pub fn is_sentinel(&self) -> bool {
        *self == Self::INACTIVE
    }

    /// Validate against a text of `text_len` units. `Ok(None)` for the
    /// sentinel; a half sentinel, a reversed or out of bounds range is
    /// [`EditError::BadParameters`].
    pub fn validate(&self, text_len: usize) -> EditResult<Option<Range<usize>>> {
        if self.is_sentinel() {
            return Ok(None);
        }
        if self.start < 0 || self.end < 0 || self.start > self.end {
            return Err(EditError::BadParameters);
        }
        let (start, end) = (self.start as usize, self.end as usize);
        if end > text_len {
            return Err(EditError::BadParameters);
        }
        Ok(Some(start..end))
    }

    fn from_range(range: &Range<usize>) -> Self {
        Self {
            start: i32::try_from(range.start).unwrap_or(i32::MAX),
            end: i32::try_from(range.end).unwrap_or(i32::MAX),
        }
    }
}

/// Active composition range plus the committed text it was started over.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviewTextState {
    range: Option<Range<usize>>,
    body_before: Option<String>,
}

impl PreviewTextState {
    pub fn is_active(&self) -> bool {
        self.range.is_some()
    }

    pub fn range(&self) -> Option<Range<usize>> {
        self.range.clone()
    }

    pub fn public_range(&self) -> PreviewRange {
        self.range
            .as_ref()
            .map(PreviewRange::from_range)
            .unwrap_or(PreviewRange::INACTIVE)
    }

    /// Committed text from before the composition started.
    pub fn body_before(&self) -> Option<&str> {
        self.body_before.as_deref()
    }

    /// Enter composition. Only the first call of a composition snapshots.
    pub fn begin(&mut self, committed: &str) {
        if self.body_before.is_none() {
            self.body_before = Some(committed.to_string());
            trace!(target: "state.content", "preview_begin");
        }
    }

    pub fn set_range(&mut self, range: Range<usize>) {
        self.range = Some(range);
    }

    /// Leave composition and return the last range, if any.
    pub fn finish(&mut self) -> Option<Range<usize>> {
        self.body_before = None;
        let range = self.range.take();
        if range.is_some() {
            trace!(target: "state.content", "preview_finish");
        }
        range
    }

    /// Clamp the range into `len`; returns false when it no longer fits and
    /// the composition had to be dropped.
    pub fn clamp_to(&mut self, len: usize) -> bool {
        match &self.range {
            Some(r) if r.end <= len => true,
            Some(_) => {
                self.finish();
                false
            }
            None => true,
        }
    }
}
