//! Message-level blocks: user and assistant text, reasoning, footers, errors
//! and the revert summary.

use ratatui::style::Modifier;
use ratatui::text::{Line, Span};
use threadline_core::{
    AssistantMessage, MessageError, MessagePart, MessageWithParts, Permission, ReasoningPart,
    RevertSummary, TextPart, ToolPart,
};

use super::tool::{full_block, spinner_frame};
use super::{RenderContext, RenderedBlock};
use crate::text::{truncate_to_width, wrap_text};

const USER_BAR: &str = "┃ ";
const INDENT: &str = "  ";
const REASONING_BAR: &str = "  ┊ ";

/// User text behind the accent bar.
pub(super) fn user_text(part: &TextPart, ctx: &RenderContext<'_>, lines: &mut Vec<Line<'static>>) {
    let width = ctx.content_width(USER_BAR.chars().count());
    let bar = ctx.theme.primary_style();
    for line in wrap_text(part.text.trim_end(), width) {
        lines.push(Line::from(vec![
            Span::styled(USER_BAR, bar),
            Span::styled(line, ctx.theme.text_style()),
        ]));
    }
}

/// Assistant text through the markdown formatter, with a live cursor while
/// it is still streaming.
pub(super) fn assistant_text(
    part: &TextPart,
    ctx: &RenderContext<'_>,
    lines: &mut Vec<Line<'static>>,
) {
    let width = ctx.content_width(INDENT.len());
    let formatted = ctx
        .formatter
        .markdown(&part.text, width, ctx.theme.background);
    let start = lines.len();
    for line in formatted.lines() {
        lines.push(Line::from(vec![
            Span::raw(INDENT),
            Span::styled(line.to_string(), ctx.theme.text_style()),
        ]));
    }
    if part.is_streaming() {
        let cursor = Span::styled(format!(" {}", spinner_frame(ctx.frame)), ctx.theme.primary_style());
        match lines.get_mut(start..).and_then(|added| added.last_mut()) {
            Some(last) => last.spans.push(cursor),
            None => lines.push(Line::from(vec![Span::raw(INDENT), cursor])),
        }
    }
}

pub(super) fn reasoning(
    part: &ReasoningPart,
    ctx: &RenderContext<'_>,
    lines: &mut Vec<Line<'static>>,
) {
    let width = ctx.content_width(REASONING_BAR.chars().count());
    let style = ctx.theme.thinking_style();
    let mut header = vec![Span::styled(format!("{INDENT}Thinking"), ctx.theme.muted_style())];
    if part.is_streaming() {
        header.push(Span::styled(format!(" {}", spinner_frame(ctx.frame)), ctx.theme.primary_style()));
    }
    lines.push(Line::from(header));
    for line in wrap_text(part.text.trim(), width) {
        lines.push(Line::from(vec![
            Span::styled(REASONING_BAR, ctx.theme.muted_style()),
            Span::styled(line, style),
        ]));
    }
}

/// Attachment chips under a user message, if it has any files.
pub(super) fn attachments(parts: &[MessagePart], ctx: &RenderContext<'_>) -> Option<RenderedBlock> {
    let chips: Vec<Span<'static>> = parts
        .iter()
        .filter_map(|p| match p {
            MessagePart::File(file) => Some(file),
            _ => None,
        })
        .flat_map(|file| {
            [
                Span::styled(format!("[{}]", file.display_name()), ctx.theme.primary_style()),
                Span::raw(" "),
            ]
        })
        .collect();
    if chips.is_empty() {
        return None;
    }
    let mut spans = vec![Span::styled(USER_BAR, ctx.theme.primary_style())];
    spans.extend(chips);
    Some(RenderedBlock::new(vec![Line::from(spans)]))
}

/// Placeholder while an assistant message has produced nothing yet.
pub(super) fn thinking_indicator(ctx: &RenderContext<'_>) -> RenderedBlock {
    RenderedBlock::new(vec![Line::from(vec![
        Span::raw(INDENT),
        Span::styled(spinner_frame(ctx.frame), ctx.theme.primary_style()),
        Span::styled(" Working…", ctx.theme.muted_style()),
    ])])
}

/// `▣ model · tokens · elapsed` once the response has completed.
pub(super) fn footer(info: &AssistantMessage, ctx: &RenderContext<'_>) -> Option<RenderedBlock> {
    let completed = info.time.completed?;
    let mut fields = vec![info.model_id.clone()];
    let tokens = info.tokens.total();
    if tokens > 0 {
        fields.push(format!("{tokens} tokens"));
    }
    let elapsed = completed.saturating_sub(info.time.created);
    fields.push(format!("{:.1}s", elapsed as f64 / 1000.0));
    Some(RenderedBlock::new(vec![Line::from(vec![
        Span::raw(INDENT),
        Span::styled("▣ ", ctx.theme.primary_style()),
        Span::styled(fields.join(" · "), ctx.theme.muted_style()),
    ])]))
}

fn error_text(error: &MessageError) -> (&'static str, Option<&str>) {
    match error {
        MessageError::Auth { message } => ("Authentication failed", Some(message)),
        MessageError::OutputLength => ("Output length limit reached", None),
        MessageError::Aborted => ("Request aborted", None),
        MessageError::Unknown { message } => ("Unexpected error", Some(message)),
    }
}

pub(super) fn error_block(error: &MessageError, ctx: &RenderContext<'_>) -> RenderedBlock {
    let style = ctx.theme.error_style();
    let width = ctx.content_width(4);
    let (title, detail) = error_text(error);
    let mut lines = vec![Line::from(vec![
        Span::styled("  ╭─ ", style),
        Span::styled(title, style.add_modifier(Modifier::BOLD)),
    ])];
    if let Some(detail) = detail.filter(|d| !d.is_empty()) {
        for line in wrap_text(detail, width) {
            lines.push(Line::from(vec![
                Span::styled("  │ ", style),
                Span::styled(line, ctx.theme.text_style()),
            ]));
        }
    }
    lines.push(Line::from(Span::styled("  ╰─", style)));
    RenderedBlock::new(lines)
}

/// Shown in place of everything the boundary hides.
pub(super) fn revert_summary(summary: &RevertSummary, ctx: &RenderContext<'_>) -> RenderedBlock {
    let muted = ctx.theme.muted_style();
    let mut lines = vec![Line::from(vec![
        Span::styled("  ── ", muted),
        Span::styled(summary.messages_label(), ctx.theme.warning_style()),
        Span::styled(" ──", muted),
    ])];
    if summary.hidden_tool_calls > 0 {
        lines.push(Line::from(Span::styled(
            format!("{INDENT}{}", summary.tool_calls_label()),
            muted,
        )));
    }
    let width = ctx.content_width(INDENT.len() + 12);
    for file in &summary.files {
        lines.push(Line::from(vec![
            Span::raw(INDENT),
            Span::styled(truncate_to_width(&file.path, width), ctx.theme.text_style()),
            Span::styled(format!(" +{}", file.added), ctx.theme.success_style()),
            Span::styled(format!(" -{}", file.removed), ctx.theme.error_style()),
        ]));
    }
    lines.push(Line::from(Span::styled(
        format!("{INDENT}redo to restore"),
        muted,
    )));
    RenderedBlock::new(lines)
}

/// Tool call from another session that is waiting on a permission here.
pub(super) fn permission_preview(
    permission: &Permission,
    message: &MessageWithParts,
    ctx: &RenderContext<'_>,
) -> Option<RenderedBlock> {
    let tool: &ToolPart = message.parts.iter().find_map(|p| match p {
        MessagePart::Tool(tool) if permission.call_id.as_deref() == Some(tool.call_id.as_str()) => {
            Some(tool)
        }
        _ => None,
    })?;
    let mut lines = vec![Line::from(vec![
        Span::styled(format!("{INDENT}△ "), ctx.theme.warning_style()),
        Span::styled(
            format!("Subtask needs permission ({})", permission.session_id),
            ctx.theme.muted_style(),
        ),
    ])];
    full_block(tool, Some(permission), ctx, &mut lines);
    Some(RenderedBlock::new(lines))
}
