//! Fixed-advance paragraph.
//!
//! Every grapheme cluster advances by the same width and every line has the
//! same height, which makes caret geometry exact and predictable. Wrapping is
//! per cluster; a `\n` cluster ends its line and occupies no width.

use crate::{
    CaretMetrics, Offset, Paragraph, ParagraphFactory, ParagraphStyle, PositionWithAffinity, Rect,
    TextAffinity,
};
use core_text::segment::{grapheme_boundaries, word_range_at};
use std::ops::Range;

#[derive(Debug, Clone, Copy)]
struct Cluster {
    start: usize,
    end: usize,
    hard_break: bool,
}

#[derive(Debug, Clone, Copy)]
struct Line {
    /// First cluster index.
    first: usize,
    /// One past the last visible cluster (newline excluded).
    last: usize,
    start: usize,
    end: usize,
    top: f32,
}

#[derive(Debug, Clone)]
pub struct MonospaceParagraph {
    text: String,
    text_len: usize,
    clusters: Vec<Cluster>,
    lines: Vec<Line>,
    advance: f32,
    line_height: f32,
    multiline: bool,
}

impl MonospaceParagraph {
    pub fn new(text: &str, advance: f32, line_height: f32, multiline: bool) -> Self {
        let bounds = grapheme_boundaries(text);
        let units: Vec<u16> = text.encode_utf16().collect();
        let newline = u16::from(b'\n');
        let clusters = bounds
            .windows(2)
            .map(|w| Cluster {
                start: w[0],
                end: w[1],
                hard_break: units[w[0]] == newline,
            })
            .collect();
        let mut paragraph = Self {
            text: text.to_string(),
            text_len: units.len(),
            clusters,
            lines: Vec::new(),
            advance,
            line_height,
            multiline,
        };
        paragraph.layout(f32::INFINITY);
        paragraph
    }

    pub fn advance(&self) -> f32 {
        self.advance
    }

    pub fn line_height(&self) -> f32 {
        self.line_height
    }

    fn push_line(&mut self, first: usize, last: usize) {
        let start = self
            .clusters
            .get(first)
            .map(|c| c.start)
            .unwrap_or(self.text_len);
        let end = if last > first {
            self.clusters[last - 1].end
        } else {
            start
        };
        let top = self.lines.len() as f32 * self.line_height;
        self.lines.push(Line {
            first,
            last,
            start,
            end,
            top,
        });
    }

    fn line_width(&self, line: &Line) -> f32 {
        (line.last - line.first) as f32 * self.advance
    }

    /// Line holding `index`; on a soft-wrap boundary the affinity picks the side.
    fn line_for_index(&self, index: usize, affinity: TextAffinity) -> usize {
        let mut hits = self
            .lines
            .iter()
            .enumerate()
            .filter(|(_, l)| l.start <= index && index <= l.end)
            .map(|(i, _)| i);
        let first = hits.next();
        let last = hits.last();
        match (first, last, affinity) {
            (Some(_), Some(next), TextAffinity::Downstream) => next,
            (Some(line), _, _) => line,
            _ => self
                .lines
                .iter()
                .rposition(|l| l.start <= index)
                .unwrap_or(0),
        }
    }

    fn x_in_line(&self, line: &Line, index: usize) -> f32 {
        let columns = self.clusters[line.first..line.last]
            .iter()
            .take_while(|c| c.end <= index)
            .count();
        columns as f32 * self.advance
    }

    fn is_soft_wrapped(&self, line_idx: usize) -> bool {
        match (self.lines.get(line_idx), self.lines.get(line_idx + 1)) {
            (Some(line), Some(next)) => line.end == next.start,
            _ => false,
        }
    }
}

impl Paragraph for MonospaceParagraph {
    fn layout(&mut self, max_width: f32) {
        self.lines.clear();
        let mut line_first = 0usize;
        let mut x = 0.0f32;
        for i in 0..self.clusters.len() {
            let cluster = self.clusters[i];
            if self.multiline && cluster.hard_break {
                self.push_line(line_first, i);
                line_first = i + 1;
                x = 0.0;
                continue;
            }
            if self.multiline && i > line_first && x + self.advance > max_width {
                self.push_line(line_first, i);
                line_first = i;
                x = 0.0;
            }
            x += self.advance;
        }
        self.push_line(line_first, self.clusters.len());
    }

    fn text_len(&self) -> usize {
        self.text_len
    }

    fn height(&self) -> f32 {
        self.lines.len() as f32 * self.line_height
    }

    fn longest_line(&self) -> f32 {
        self.lines
            .iter()
            .map(|l| self.line_width(l))
            .fold(0.0, f32::max)
    }

    fn line_count(&self) -> usize {
        self.lines.len()
    }

    fn glyph_position_at_coordinate(&self, offset: Offset) -> PositionWithAffinity {
        if self.text_len == 0 || self.lines.is_empty() {
            return PositionWithAffinity {
                index: 0,
                affinity: TextAffinity::Downstream,
            };
        }
        let row = (offset.y / self.line_height).floor().max(0.0) as usize;
        let line_idx = row.min(self.lines.len() - 1);
        let line = self.lines[line_idx];
        let count = line.last - line.first;
        let col = ((offset.x / self.advance).round().max(0.0) as usize).min(count);
        let index = if col == 0 {
            line.start
        } else {
            self.clusters[line.first + col - 1].end
        };
        let affinity = if col == count && count > 0 && self.is_soft_wrapped(line_idx) {
            TextAffinity::Upstream
        } else {
            TextAffinity::Downstream
        };
        PositionWithAffinity { index, affinity }
    }

    fn word_boundary(&self, index: usize) -> Range<usize> {
        word_range_at(&self.text, index.min(self.text_len))
    }

    fn caret_metrics(&self, index: usize, affinity: TextAffinity) -> Option<CaretMetrics> {
        if index > self.text_len {
            return None;
        }
        let line = self.lines.get(self.line_for_index(index, affinity))?;
        Some(CaretMetrics {
            offset: Offset::new(self.x_in_line(line, index), line.top),
            height: self.line_height,
        })
    }

    fn rects_for_range(&self, start: usize, end: usize) -> Vec<Rect> {
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        self.lines
            .iter()
            .filter_map(|line| {
                let s = start.max(line.start);
                let e = end.min(line.end);
                if s >= e {
                    return None;
                }
                let x0 = self.x_in_line(line, s);
                let x1 = self.x_in_line(line, e);
                Some(Rect::new(x0, line.top, x1 - x0, self.line_height))
            })
            .collect()
    }
}

/// Builds `MonospaceParagraph`s with a fixed advance and line height.
#[derive(Debug, Clone, Copy)]
pub struct MonospaceParagraphFactory {
    pub advance: f32,
    pub line_height: f32,
}

impl Default for MonospaceParagraphFactory {
    fn default() -> Self {
        Self {
            advance: 10.0,
            line_height: 20.0,
        }
    }
}

impl ParagraphFactory for MonospaceParagraphFactory {
    fn create(&self, text: &str, style: &ParagraphStyle) -> Box<dyn Paragraph> {
        Box::new(MonospaceParagraph::new(
            text,
            self.advance,
            self.line_height,
            style.multiline,
        ))
    }
}
