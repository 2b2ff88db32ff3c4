//! Input filtering: input-type character classes, custom regex filters and
//! max-length truncation.
//!
//! Filtering is applied per grapheme cluster so a rejected cluster is removed
//! whole. Counting constraints (one `@` for email, one `.` for decimals) are
//! evaluated against the surrounding content the value is inserted into.

use crate::segment::{truncate_to_units, utf16_len};
use regex::Regex;
use serde::Deserialize;
use unicode_segmentation::UnicodeSegmentation;

/// Keyboard / content class of a text field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextInputType {
    #[default]
    Text,
    Multiline,
    Number,
    NumberDecimal,
    Phone,
    Email,
    Url,
    Password,
}

impl TextInputType {
    pub fn is_multiline(self) -> bool {
        matches!(self, TextInputType::Multiline)
    }

    pub fn is_obscured(self) -> bool {
        matches!(self, TextInputType::Password)
    }

    fn allows_char(self, c: char) -> bool {
        match self {
            TextInputType::Multiline => true,
            TextInputType::Text | TextInputType::Password => c != '\n' && c != '\r',
            TextInputType::Number => c.is_ascii_digit(),
            TextInputType::NumberDecimal => c.is_ascii_digit() || c == '.',
            TextInputType::Phone => c.is_ascii_digit() || " +-*#()".contains(c),
            TextInputType::Email => c.is_alphanumeric() || "._-@".contains(c),
            TextInputType::Url => !c.is_whitespace(),
        }
    }

    /// Character that may appear at most once in the whole content.
    fn unique_char(self) -> Option<char> {
        match self {
            TextInputType::Email => Some('@'),
            TextInputType::NumberDecimal => Some('.'),
            _ => None,
        }
    }
}

/// Result of filtering a candidate value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOutcome {
    /// Clusters that passed every filter, in order.
    pub accepted: String,
    /// Clusters removed by the input type or the custom filter.
    pub rejected: String,
    /// True when max-length room cut part of `accepted` away.
    pub truncated: bool,
}

impl FilterOutcome {
    pub fn is_filtered(&self) -> bool {
        !self.rejected.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct InputFilter {
    input_type: TextInputType,
    custom: Option<Regex>,
    max_length: Option<usize>,
}

impl InputFilter {
    pub fn new(input_type: TextInputType) -> Self {
        Self {
            input_type,
            custom: None,
            max_length: None,
        }
    }

    /// Attach a custom filter; each cluster must match `pattern` to be kept.
    pub fn with_pattern(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.custom = Some(Regex::new(pattern)?);
        Ok(self)
    }

    pub fn with_max_length(mut self, max_length: Option<usize>) -> Self {
        self.max_length = max_length;
        self
    }

    pub fn input_type(&self) -> TextInputType {
        self.input_type
    }

    pub fn max_length(&self) -> Option<usize> {
        self.max_length
    }

    pub fn has_custom_pattern(&self) -> bool {
        self.custom.is_some()
    }

    /// Filter `value` for insertion into `surrounding` (the content that stays
    /// around the insertion point) and cut it to the remaining max-length room.
    pub fn apply(&self, value: &str, surrounding: &str) -> FilterOutcome {
        let mut outcome = FilterOutcome::default();
        let unique = self.input_type.unique_char();
        let mut unique_seen = unique.is_some_and(|u| surrounding.contains(u));
        for g in value.graphemes(true) {
            let mut keep = g.chars().all(|c| self.input_type.allows_char(c));
            if keep && let Some(u) = unique && g.contains(u) {
                if unique_seen {
                    keep = false;
                } else {
                    unique_seen = true;
                }
            }
            if keep && let Some(re) = &self.custom {
                keep = re.is_match(g);
            }
            if keep {
                outcome.accepted.push_str(g);
            } else {
                outcome.rejected.push_str(g);
            }
        }
        if let Some(max) = self.max_length {
            let room = max.saturating_sub(utf16_len(surrounding));
            let (kept, truncated) = truncate_to_units(&outcome.accepted, room);
            if truncated {
                outcome.accepted = kept.to_string();
                outcome.truncated = true;
            }
        }
        outcome
    }
}
