//! Mouse selection over the rendered buffer.
//!
//! Endpoints are stored in buffer coordinates (line index, display column), so
//! a selection keeps pointing at the same text while the view scrolls. A plain
//! click never becomes a selection; only a drag moves the head.

use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthChar;

use crate::render::line_text;
use crate::text::{display_width, slice_columns};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TextPoint {
    pub line: usize,
    pub column: usize,
}

impl TextPoint {
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Normalized range with `start <= end`; the end column is inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionRange {
    pub start: TextPoint,
    pub end: TextPoint,
}

impl SelectionRange {
    pub fn new(a: TextPoint, b: TextPoint) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    /// Inclusive column span selected on `line`, if any.
    pub fn columns_on(&self, line: usize) -> Option<(usize, usize)> {
        if line < self.start.line || line > self.end.line {
            return None;
        }
        let from = if line == self.start.line {
            self.start.column
        } else {
            0
        };
        let to = if line == self.end.line {
            self.end.column
        } else {
            usize::MAX
        };
        Some((from, to))
    }
}

/// Turns mouse press/drag/release into a [`SelectionRange`].
#[derive(Debug, Clone, Default)]
pub struct SelectionMapper {
    area: Rect,
    anchor: Option<TextPoint>,
    head: Option<TextPoint>,
    range: Option<SelectionRange>,
}

impl SelectionMapper {
    pub fn new(area: Rect) -> Self {
        Self {
            area,
            ..Default::default()
        }
    }

    /// Screen area the buffer is drawn into.
    pub fn set_area(&mut self, area: Rect) {
        self.area = area;
    }

    /// Screen cell to buffer point; rows outside the area clamp to its edge.
    fn to_point(&self, column: u16, row: u16, offset: usize) -> TextPoint {
        let bottom = self.area.bottom().saturating_sub(1).max(self.area.y);
        let row = row.clamp(self.area.y, bottom);
        TextPoint::new(
            offset + usize::from(row - self.area.y),
            usize::from(column.saturating_sub(self.area.x)),
        )
    }

    fn contains(&self, column: u16, row: u16) -> bool {
        column >= self.area.x
            && column < self.area.right()
            && row >= self.area.y
            && row < self.area.bottom()
    }

    pub fn press(&mut self, column: u16, row: u16, offset: usize) {
        self.range = None;
        self.head = None;
        self.anchor = self
            .contains(column, row)
            .then(|| self.to_point(column, row, offset));
    }

    pub fn drag(&mut self, column: u16, row: u16, offset: usize) {
        if self.anchor.is_some() {
            self.head = Some(self.to_point(column, row, offset));
        }
    }

    /// Finish the gesture. Returns the range when the mouse was dragged.
    pub fn release(&mut self, column: u16, row: u16, offset: usize) -> Option<SelectionRange> {
        let anchor = self.anchor.take()?;
        self.head?;
        let head = self.to_point(column, row, offset);
        self.head = None;
        self.range = Some(SelectionRange::new(anchor, head));
        self.range
    }

    /// The finished selection, or the live one while dragging.
    pub fn current(&self) -> Option<SelectionRange> {
        match (self.anchor, self.head) {
            (Some(anchor), Some(head)) => Some(SelectionRange::new(anchor, head)),
            _ => self.range,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.anchor.is_some()
    }

    pub fn clear(&mut self) {
        *self = Self::new(self.area);
    }
}

/// Plain text under `range`, lines trimmed of trailing blanks and joined
/// with `\n`.
pub fn extract_text(lines: &[Line<'_>], range: &SelectionRange) -> String {
    let last = range.end.line.min(lines.len().saturating_sub(1));
    if lines.is_empty() || range.start.line > last {
        return String::new();
    }
    (range.start.line..=last)
        .filter_map(|index| {
            let (from, to) = range.columns_on(index)?;
            let text = line_text(&lines[index]);
            let to = to.min(display_width(&text).saturating_sub(1));
            if from > to {
                return Some(String::new());
            }
            Some(slice_columns(&text, from, to).trim_end().to_string())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Copy of `line` with columns `from..=to` patched with `highlight`.
pub fn highlight_line(line: &Line<'_>, from: usize, to: usize, highlight: Style) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut column = 0;
    for span in &line.spans {
        let mut current = String::new();
        let mut current_selected = None;
        for ch in span.content.chars() {
            let selected = column >= from && column <= to;
            if current_selected.is_some_and(|s| s != selected) {
                spans.push(styled(std::mem::take(&mut current), span.style, current_selected, highlight));
            }
            current_selected = Some(selected);
            current.push(ch);
            column += ch.width().unwrap_or(0);
        }
        if !current.is_empty() {
            spans.push(styled(current, span.style, current_selected, highlight));
        }
    }
    let mut out = Line::from(spans);
    out.style = line.style;
    out.alignment = line.alignment;
    out
}

fn styled(content: String, base: Style, selected: Option<bool>, highlight: Style) -> Span<'static> {
    if selected == Some(true) {
        Span::styled(content, base.patch(highlight))
    } else {
        Span::styled(content, base)
    }
}
