//! String formatters for markdown, diffs and file previews.
//!
//! Real highlighting lives outside the engine; the renderer only needs
//! something that turns text into width-bounded lines. [`PlainFormatter`] is
//! the built-in implementation.

use ratatui::style::Color;

use crate::text::{truncate_to_width, wrap_text};

/// Pure text formatters consumed by the part renderer.
pub trait Formatter: Send + Sync {
    /// Render markdown to lines no wider than `width`.
    fn markdown(&self, text: &str, width: usize, background: Color) -> String;

    /// Render a unified diff. Lines keep their `+`/`-`/` ` prefix.
    fn diff(&self, diff: &str, width: usize, background: Color) -> String;

    /// Render the start of a file.
    fn file_preview(&self, path: &str, content: &str, width: usize, background: Color) -> String;
}

/// Formatter that wraps and truncates without any markup.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainFormatter;

impl Formatter for PlainFormatter {
    fn markdown(&self, text: &str, width: usize, _background: Color) -> String {
        wrap_text(text.trim_end(), width).join("\n")
    }

    fn diff(&self, diff: &str, width: usize, _background: Color) -> String {
        diff.lines()
            .filter(|l| !l.starts_with("diff --git") && !l.starts_with("index "))
            .filter(|l| !l.starts_with("--- ") && !l.starts_with("+++ "))
            .map(|l| truncate_to_width(l, width))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn file_preview(&self, _path: &str, content: &str, width: usize, _background: Color) -> String {
        content
            .lines()
            .map(|l| truncate_to_width(&l.replace('\t', "    "), width))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
