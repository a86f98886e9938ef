//! Display-width aware string helpers.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Word-wrap `text` to `max_width` columns. Explicit newlines are kept and
/// words longer than a line are hard-broken.
pub fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    if max_width == 0 {
        return text.lines().map(str::to_string).collect();
    }
    let mut out = Vec::new();
    for raw in text.split('\n') {
        let raw = raw.trim_end_matches('\r');
        if display_width(raw) <= max_width {
            out.push(raw.to_string());
            continue;
        }
        let mut line = String::new();
        let mut width = 0;
        for word in raw.split_inclusive(' ') {
            let word_width = display_width(word);
            if width + word_width > max_width && width > 0 {
                out.push(line.trim_end().to_string());
                line.clear();
                width = 0;
            }
            if word_width > max_width {
                for ch in word.chars() {
                    let w = ch.width().unwrap_or(0);
                    if width + w > max_width && width > 0 {
                        out.push(std::mem::take(&mut line));
                        width = 0;
                    }
                    line.push(ch);
                    width += w;
                }
                continue;
            }
            line.push_str(word);
            width += word_width;
        }
        out.push(line.trim_end().to_string());
    }
    out
}

/// Cut `s` to at most `max_width` columns, marking the cut with `…`.
pub fn truncate_to_width(s: &str, max_width: usize) -> String {
    if display_width(s) <= max_width {
        return s.to_string();
    }
    let mut out = String::new();
    let mut width = 0;
    for ch in s.chars() {
        let w = ch.width().unwrap_or(0);
        if width + w + 1 > max_width {
            break;
        }
        out.push(ch);
        width += w;
    }
    out.push('…');
    out
}

/// Characters of `s` that occupy columns `from..=to` (inclusive, 0-based).
///
/// A wide character is included when its first column is inside the range.
pub fn slice_columns(s: &str, from: usize, to: usize) -> String {
    let mut out = String::new();
    let mut col = 0;
    for ch in s.chars() {
        if col > to {
            break;
        }
        if col >= from {
            out.push(ch);
        }
        col += ch.width().unwrap_or(0);
    }
    out
}
