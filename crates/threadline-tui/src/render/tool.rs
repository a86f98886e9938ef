//! Tool call rendering: titles, collapsed trailers and full bordered blocks.

use ratatui::style::Style;
use ratatui::text::{Line, Span};
use threadline_core::decode::normalize_tool_name;
use threadline_core::{Permission, ToolInput, ToolPart, ToolState};

use super::RenderContext;
use crate::text::truncate_to_width;

/// Braille spinner used as the shimmer for in-flight work.
pub const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

const BLOCK_TOP: &str = "  ╭─ ";
const BLOCK_SIDE: &str = "  │ ";
const BLOCK_BOTTOM: &str = "  ╰─";
const TRAILER: &str = "  ∟ ";

pub fn spinner_frame(frame: usize) -> &'static str {
    SPINNER_FRAMES[frame % SPINNER_FRAMES.len()]
}

fn tool_icon(name: &str) -> &'static str {
    match normalize_tool_name(name) {
        "bash" => "#",
        "read" | "list" => "→",
        "write" | "edit" => "←",
        "glob" | "grep" => "✱",
        "task" => "◉",
        "webfetch" => "%",
        "todowrite" => "⚙",
        _ => "◇",
    }
}

/// Human-readable title built from typed input and metadata.
pub fn tool_title(part: &ToolPart) -> String {
    let metadata = part.state.metadata();
    let count = |suffix: &str, n: Option<u64>| n.map(|n| format!(" ({n} {suffix})")).unwrap_or_default();
    match part.state.input() {
        ToolInput::Bash(bash) => match &bash.description {
            Some(desc) if !desc.is_empty() => desc.clone(),
            _ if !bash.command.is_empty() => bash.command.clone(),
            _ => "Shell".to_string(),
        },
        ToolInput::Read(read) => {
            let mut params = Vec::new();
            if let Some(offset) = read.offset {
                params.push(format!("offset={offset}"));
            }
            if let Some(limit) = read.limit {
                params.push(format!("limit={limit}"));
            }
            let params = if params.is_empty() {
                String::new()
            } else {
                format!(" [{}]", params.join(", "))
            };
            format!("Read {}{}", shorten_path(&read.file_path), params)
        }
        ToolInput::Write(write) => format!("Write {}", shorten_path(&write.file_path)),
        ToolInput::Edit(edit) => {
            let all = if edit.replace_all { " [replaceAll]" } else { "" };
            format!("Edit {}{}", shorten_path(&edit.file_path), all)
        }
        ToolInput::Glob(search) | ToolInput::Grep(search) => {
            let verb = if matches!(part.state.input(), ToolInput::Glob(_)) {
                "Glob"
            } else {
                "Grep"
            };
            let matches = metadata.and_then(|m| m.matches.or(m.count));
            let scope = search
                .path
                .as_deref()
                .map(|p| format!(" in {}", shorten_path(p)))
                .unwrap_or_default();
            format!("{verb} \"{}\"{scope}{}", search.pattern, count("matches", matches))
        }
        ToolInput::List(list) => {
            let path = list.path.as_deref().unwrap_or(".");
            format!(
                "List {}{}",
                shorten_path(path),
                count("items", metadata.and_then(|m| m.count))
            )
        }
        ToolInput::Task(task) => match &task.subagent_type {
            Some(agent) => format!("{agent} Task \"{}\"", task.description),
            None => format!("Task \"{}\"", task.description),
        },
        ToolInput::WebFetch(fetch) => format!("WebFetch {}", shorten_url(&fetch.url)),
        ToolInput::TodoWrite(todos) => {
            let by_status = |status: &str| todos.todos.iter().filter(|t| t.status == status).count();
            if todos.todos.is_empty() {
                "Update todos".to_string()
            } else {
                format!(
                    "Update todos ({} pending, {} in progress, {} done)",
                    by_status("pending"),
                    by_status("in_progress"),
                    by_status("completed")
                )
            }
        }
        ToolInput::Other { args } => {
            if let ToolState::Completed { title, .. } = &part.state {
                if !title.is_empty() {
                    return title.clone();
                }
            }
            if args.is_empty() {
                part.tool.clone()
            } else {
                let args: Vec<String> = args.iter().map(|(k, v)| format!("{k}={v}")).collect();
                format!("{} {}", part.tool, args.join(", "))
            }
        }
    }
}

fn shorten_path(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn shorten_url(url: &str) -> String {
    let url = url
        .trim_start_matches("https://")
        .trim_start_matches("http://");
    truncate_to_width(url, 40)
}

fn status_span(state: &ToolState, ctx: &RenderContext<'_>) -> Span<'static> {
    let theme = ctx.theme;
    match state {
        ToolState::Pending { .. } | ToolState::Running { .. } => {
            Span::styled(spinner_frame(ctx.frame).to_string(), theme.primary_style())
        }
        ToolState::Completed { .. } => Span::styled("●", theme.success_style()),
        ToolState::Error { .. } => Span::styled("✗", theme.error_style()),
    }
}

/// Collapsed one-line form: `∟ <title>`.
pub fn trailer_line(part: &ToolPart, ctx: &RenderContext<'_>) -> Line<'static> {
    let style = match &part.state {
        ToolState::Error { .. } => ctx.theme.error_style(),
        ToolState::Completed { .. } => ctx.theme.muted_style(),
        _ => ctx.theme.primary_style(),
    };
    let width = ctx.content_width(TRAILER.chars().count());
    Line::from(vec![
        Span::styled(TRAILER, ctx.theme.muted_style()),
        Span::styled(truncate_to_width(&tool_title(part), width), style),
    ])
}

/// Full bordered block with arguments, output and any pending permission.
pub fn full_block(
    part: &ToolPart,
    permission: Option<&Permission>,
    ctx: &RenderContext<'_>,
    lines: &mut Vec<Line<'static>>,
) {
    let theme = ctx.theme;
    let border = theme.tool_border_style();
    let width = ctx.content_width(BLOCK_SIDE.chars().count());

    lines.push(Line::from(vec![
        Span::styled(BLOCK_TOP, border),
        Span::styled(format!("{} ", tool_icon(&part.tool)), theme.muted_style()),
        Span::styled(truncate_to_width(&tool_title(part), width.saturating_sub(4)), theme.bold()),
        Span::raw(" "),
        status_span(&part.state, ctx),
    ]));

    let side = |content: Span<'static>| Line::from(vec![Span::styled(BLOCK_SIDE, border), content]);

    if let ToolInput::Bash(bash) = part.state.input() {
        if !bash.command.is_empty() {
            let command = truncate_to_width(&format!("$ {}", bash.command), width);
            lines.push(side(Span::styled(command, theme.text_style())));
        }
    }

    for line in body_lines(part, ctx, width) {
        lines.push(side(line));
    }

    if let Some(permission) = permission {
        lines.push(side(Span::styled(
            truncate_to_width(&format!("△ Permission required: {}", permission.title), width),
            theme.warning_style(),
        )));
        lines.push(side(Span::styled(
            "accept · accept always · reject",
            theme.muted_style(),
        )));
    }

    lines.push(Line::from(Span::styled(BLOCK_BOTTOM, border)));
}

fn body_lines(part: &ToolPart, ctx: &RenderContext<'_>, width: usize) -> Vec<Span<'static>> {
    let theme = ctx.theme;
    let background = theme.background_element;
    match &part.state {
        ToolState::Pending { .. } => Vec::new(),
        ToolState::Error { error, .. } => limit(
            error.lines().map(|l| (l.to_string(), theme.error_style())),
            ctx,
            width,
        ),
        ToolState::Running { metadata, .. } | ToolState::Completed { metadata, .. } => {
            if let Some(diff) = &metadata.diff {
                let formatted = ctx.formatter.diff(diff, width, background);
                return limit(
                    formatted
                        .lines()
                        .map(|l| (l.to_string(), diff_style(l, ctx)))
                        .collect::<Vec<_>>(),
                    ctx,
                    width,
                );
            }
            let preview = match part.state.input() {
                ToolInput::Write(write) => Some((write.file_path.as_str(), write.content.as_str())),
                ToolInput::Read(read) => metadata
                    .preview
                    .as_deref()
                    .map(|p| (read.file_path.as_str(), p)),
                _ => None,
            };
            if let Some((path, content)) = preview {
                let formatted = ctx.formatter.file_preview(path, content, width, background);
                return limit(
                    formatted
                        .lines()
                        .map(|l| (l.to_string(), theme.text_style()))
                        .collect::<Vec<_>>(),
                    ctx,
                    width,
                );
            }
            match &part.state {
                ToolState::Completed { output, .. } => limit(
                    output.lines().map(|l| (l.to_string(), theme.muted_style())),
                    ctx,
                    width,
                ),
                _ => Vec::new(),
            }
        }
    }
}

fn diff_style(line: &str, ctx: &RenderContext<'_>) -> Style {
    let theme = ctx.theme;
    if line.starts_with('+') {
        Style::default().fg(theme.diff_added).bg(theme.diff_added_bg)
    } else if line.starts_with('-') {
        Style::default().fg(theme.diff_removed).bg(theme.diff_removed_bg)
    } else if line.starts_with("@@") {
        theme.muted_style()
    } else {
        theme.text_style()
    }
}

/// Keep at most `max_tool_output_lines`, noting how many were cut.
fn limit(
    lines: impl IntoIterator<Item = (String, Style)>,
    ctx: &RenderContext<'_>,
    width: usize,
) -> Vec<Span<'static>> {
    let all: Vec<(String, Style)> = lines.into_iter().collect();
    let max = ctx.max_tool_output_lines;
    let mut out: Vec<Span<'static>> = all
        .iter()
        .take(max)
        .map(|(text, style)| Span::styled(truncate_to_width(text, width), *style))
        .collect();
    if all.len() > max {
        out.push(Span::styled(
            format!("… {} more lines", all.len() - max),
            ctx.theme.muted_style(),
        ));
    }
    out
}
