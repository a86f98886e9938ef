//! Scrollable window over the rendered line buffer.
//!
//! The view follows the tail while it sits at the bottom. Once the user scrolls
//! away, new content no longer moves it.

use ratatui::style::Style;
use ratatui::text::Line;
use std::collections::HashMap;
use std::sync::Arc;

use crate::selection::{highlight_line, SelectionRange};

#[derive(Debug, Clone)]
pub struct Viewport {
    lines: Arc<Vec<Line<'static>>>,
    message_offsets: HashMap<String, usize>,
    offset: usize,
    height: usize,
    tail_follow: bool,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            lines: Arc::new(Vec::new()),
            message_offsets: HashMap::new(),
            offset: 0,
            height: 0,
            tail_follow: true,
        }
    }
}

impl Viewport {
    pub fn new(height: usize) -> Self {
        Self {
            height,
            ..Default::default()
        }
    }

    pub fn lines(&self) -> &Arc<Vec<Line<'static>>> {
        &self.lines
    }

    pub fn total_lines(&self) -> usize {
        self.lines.len()
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn is_following(&self) -> bool {
        self.tail_follow
    }

    pub fn message_offsets(&self) -> &HashMap<String, usize> {
        &self.message_offsets
    }

    pub fn message_offset(&self, message_id: &str) -> Option<usize> {
        self.message_offsets.get(message_id).copied()
    }

    pub fn max_offset(&self) -> usize {
        self.total_lines().saturating_sub(self.height)
    }

    pub fn is_at_bottom(&self) -> bool {
        self.offset >= self.max_offset()
    }

    /// Swap in a freshly rendered buffer.
    pub fn apply(&mut self, lines: Vec<Line<'static>>, message_offsets: HashMap<String, usize>) {
        let pinned = self.tail_follow || self.is_at_bottom();
        self.lines = Arc::new(lines);
        self.message_offsets = message_offsets;
        if pinned {
            self.tail_follow = true;
            self.offset = self.max_offset();
        } else {
            self.offset = self.offset.min(self.max_offset());
        }
    }

    pub fn set_height(&mut self, height: usize) {
        self.height = height;
        if self.tail_follow {
            self.offset = self.max_offset();
        } else {
            self.offset = self.offset.min(self.max_offset());
        }
    }

    fn set_offset(&mut self, offset: usize) {
        self.offset = offset.min(self.max_offset());
        self.tail_follow = self.is_at_bottom();
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.set_offset(self.offset.saturating_sub(lines));
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.set_offset(self.offset.saturating_add(lines));
    }

    pub fn page_up(&mut self) {
        self.scroll_up(self.height.max(1));
    }

    pub fn page_down(&mut self) {
        self.scroll_down(self.height.max(1));
    }

    pub fn scroll_to_top(&mut self) {
        self.set_offset(0);
    }

    pub fn scroll_to_bottom(&mut self) {
        self.offset = self.max_offset();
        self.tail_follow = true;
    }

    /// Scroll so the message's first line is at the top. Returns `false` for
    /// messages that are not in the buffer.
    pub fn jump_to_message(&mut self, message_id: &str) -> bool {
        match self.message_offset(message_id) {
            Some(line) => {
                self.set_offset(line);
                true
            }
            None => false,
        }
    }

    /// The visible window, with the selection highlighted on copies.
    pub fn visible(&self, selection: Option<&SelectionRange>, highlight: Style) -> Vec<Line<'static>> {
        let end = (self.offset + self.height).min(self.lines.len());
        let start = self.offset.min(end);
        self.lines[start..end]
            .iter()
            .enumerate()
            .map(|(row, line)| {
                let index = start + row;
                match selection.and_then(|range| range.columns_on(index)) {
                    Some((from, to)) => highlight_line(line, from, to, highlight),
                    None => line.clone(),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::TextPoint;
    use ratatui::style::Modifier;

    fn buffer(n: usize) -> Vec<Line<'static>> {
        (0..n).map(|i| Line::from(format!("line {i}"))).collect()
    }

    #[test]
    fn test_follows_tail_while_at_bottom() {
        let mut viewport = Viewport::new(20);
        viewport.apply(buffer(100), HashMap::new());
        assert_eq!(viewport.offset(), 80);
        viewport.apply(buffer(120), HashMap::new());
        assert_eq!(viewport.offset(), 100);
        assert!(viewport.is_following());
    }

    #[test]
    fn test_scrolled_position_survives_growth() {
        let mut viewport = Viewport::new(20);
        viewport.apply(buffer(100), HashMap::new());
        viewport.scroll_to_top();
        viewport.scroll_down(10);
        assert_eq!(viewport.offset(), 10);
        assert!(!viewport.is_following());

        viewport.apply(buffer(120), HashMap::new());
        assert_eq!(viewport.offset(), 10);
    }

    #[test]
    fn test_shrinking_buffer_clamps_offset() {
        let mut viewport = Viewport::new(20);
        viewport.apply(buffer(100), HashMap::new());
        viewport.scroll_up(10);
        assert_eq!(viewport.offset(), 70);
        viewport.apply(buffer(50), HashMap::new());
        assert_eq!(viewport.offset(), 30);
    }

    #[test]
    fn test_scrolling_back_down_resumes_following() {
        let mut viewport = Viewport::new(20);
        viewport.apply(buffer(100), HashMap::new());
        viewport.page_up();
        assert!(!viewport.is_following());
        viewport.page_down();
        assert!(viewport.is_following());
        viewport.apply(buffer(110), HashMap::new());
        assert_eq!(viewport.offset(), 90);
    }

    #[test]
    fn test_jump_to_message() {
        let mut viewport = Viewport::new(20);
        let offsets = HashMap::from([("msg_01".to_string(), 0), ("msg_02".to_string(), 40)]);
        viewport.apply(buffer(100), offsets);
        assert!(viewport.jump_to_message("msg_02"));
        assert_eq!(viewport.offset(), 40);
        assert!(!viewport.jump_to_message("msg_99"));
        assert_eq!(viewport.offset(), 40);
    }

    #[test]
    fn test_visible_highlights_copies_only() {
        let mut viewport = Viewport::new(3);
        viewport.apply(buffer(3), HashMap::new());
        let range = SelectionRange::new(TextPoint::new(1, 0), TextPoint::new(1, 3));
        let highlight = Style::default().add_modifier(Modifier::REVERSED);
        let visible = viewport.visible(Some(&range), highlight);
        assert_eq!(visible.len(), 3);
        assert_eq!(visible[1].spans[0].style, highlight);
        assert_eq!(viewport.lines()[1].spans[0].style, Style::default());
    }
}
