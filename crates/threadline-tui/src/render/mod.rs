//! Part renderer.
//!
//! A message's parts are grouped so each text part carries the tool calls and
//! reasoning that follow it. Each group renders to one [`RenderedBlock`];
//! settled groups go through the [`BlockCache`], in-flight ones are redrawn
//! every pass.

mod blocks;
pub mod tool;

use ratatui::text::Line;
use std::collections::HashMap;
use std::sync::Arc;
use threadline_core::{
    Message, MessagePart, MessageWithParts, Permission, RevertInfo, RevertState, RevertSummary,
    TextPart,
};
use threadline_util::TimingGuard;

use crate::cache::{BlockCache, CacheKey, CacheMap, PassCache};
use crate::format::Formatter;
use crate::theme::Theme;

/// Everything besides content that changes how a block looks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderFlags {
    pub width: u16,
    pub show_tool_details: bool,
    pub show_thinking: bool,
}

/// Styled lines for one group or decoration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedBlock {
    pub lines: Vec<Line<'static>>,
}

impl RenderedBlock {
    pub fn new(lines: Vec<Line<'static>>) -> Self {
        Self { lines }
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Unstyled text, one row per line.
    pub fn plain_text(&self) -> String {
        self.lines.iter().map(line_text).collect::<Vec<_>>().join("\n")
    }
}

pub fn line_text(line: &Line<'_>) -> String {
    line.spans.iter().map(|s| s.content.as_ref()).collect()
}

pub struct RenderContext<'a> {
    pub flags: RenderFlags,
    pub theme: &'a Theme,
    pub formatter: &'a dyn Formatter,
    /// Pending permissions keyed by the tool call they gate.
    pub pending: &'a HashMap<String, Permission>,
    /// Animation frame for spinners.
    pub frame: usize,
    pub max_tool_output_lines: usize,
}

impl RenderContext<'_> {
    /// Columns left after an indent, never zero.
    pub fn content_width(&self, indent: usize) -> usize {
        (self.flags.width as usize).saturating_sub(indent).max(1)
    }
}

/// A text part and the tool/reasoning parts attached to it.
///
/// `text` is `None` only for a trailing group of parts that arrived before any
/// text existed in the message.
#[derive(Debug, Clone, PartialEq)]
pub struct PartGroup<'a> {
    pub text: Option<&'a TextPart>,
    pub attached: Vec<&'a MessagePart>,
}

impl PartGroup<'_> {
    /// Finished text and settled attachments only.
    pub fn is_cacheable(&self) -> bool {
        self.text.map_or(true, |t| !t.is_streaming())
            && self.attached.iter().all(|part| match part {
                MessagePart::Tool(tool) => tool.state.is_terminal(),
                MessagePart::Reasoning(reasoning) => !reasoning.is_streaming(),
                _ => true,
            })
    }

    pub fn part_id(&self) -> Option<&str> {
        self.text.map(|t| t.id.as_str())
    }
}

fn is_attachable(part: &MessagePart) -> bool {
    matches!(part, MessagePart::Tool(_) | MessagePart::Reasoning(_))
}

/// Tool and reasoning parts following a text part, up to the next text part.
pub fn attached_parts(rest: &[MessagePart]) -> Vec<&MessagePart> {
    rest.iter()
        .take_while(|p| !matches!(p, MessagePart::Text(_)))
        .filter(|p| is_attachable(p))
        .collect()
}

/// Group parts by the text they follow.
///
/// Tool and reasoning parts seen before the first text part attach to that
/// text once it exists; while no text exists they form a trailing group of
/// their own.
pub fn group_parts(parts: &[MessagePart]) -> Vec<PartGroup<'_>> {
    let mut groups = Vec::new();
    let mut orphans: Vec<&MessagePart> = Vec::new();
    for (idx, part) in parts.iter().enumerate() {
        match part {
            MessagePart::Text(text) => {
                let mut attached = std::mem::take(&mut orphans);
                attached.extend(attached_parts(&parts[idx + 1..]));
                groups.push(PartGroup {
                    text: Some(text),
                    attached,
                });
            }
            p if groups.is_empty() && is_attachable(p) => orphans.push(p),
            _ => {}
        }
    }
    if !orphans.is_empty() {
        groups.push(PartGroup {
            text: None,
            attached: orphans,
        });
    }
    groups
}

/// Render one group without consulting any cache.
pub fn render_group(info: &Message, group: &PartGroup<'_>, ctx: &RenderContext<'_>) -> RenderedBlock {
    let mut lines = Vec::new();
    if let Some(text) = group.text {
        if info.is_user() {
            blocks::user_text(text, ctx, &mut lines);
        } else {
            blocks::assistant_text(text, ctx, &mut lines);
        }
    }
    for part in &group.attached {
        match part {
            MessagePart::Tool(tool) => {
                let permission = ctx.pending.get(&tool.call_id);
                if ctx.flags.show_tool_details || permission.is_some() {
                    tool::full_block(tool, permission, ctx, &mut lines);
                } else {
                    lines.push(tool::trailer_line(tool, ctx));
                }
            }
            MessagePart::Reasoning(reasoning) if ctx.flags.show_thinking => {
                blocks::reasoning(reasoning, ctx, &mut lines);
            }
            _ => {}
        }
    }
    RenderedBlock::new(lines)
}

fn render_cached<C: BlockCache>(
    info: &Message,
    group: &PartGroup<'_>,
    ctx: &RenderContext<'_>,
    cache: &mut C,
) -> Arc<RenderedBlock> {
    if group.is_cacheable() {
        let key = CacheKey::for_group(info.id(), group, ctx.flags, ctx.pending);
        cache.get_or_render(key, || render_group(info, group, ctx))
    } else {
        cache.bypass(|| render_group(info, group, ctx))
    }
}

/// Blocks for one message, in display order.
pub fn render_message<C: BlockCache>(
    message: &MessageWithParts,
    ctx: &RenderContext<'_>,
    cache: &mut C,
) -> Vec<Arc<RenderedBlock>> {
    let mut out = Vec::new();
    match &message.info {
        Message::User(_) => {
            for part in &message.parts {
                if let MessagePart::Text(text) = part {
                    if text.synthetic {
                        continue;
                    }
                    let group = PartGroup {
                        text: Some(text),
                        attached: Vec::new(),
                    };
                    out.push(render_cached(&message.info, &group, ctx, cache));
                }
            }
            if let Some(chips) = blocks::attachments(&message.parts, ctx) {
                out.push(Arc::new(chips));
            }
        }
        Message::Assistant(info) => {
            let groups = group_parts(&message.parts);
            for group in &groups {
                out.push(render_cached(&message.info, group, ctx, cache));
            }
            if groups.is_empty() && message.info.is_in_flight() {
                out.push(Arc::new(blocks::thinking_indicator(ctx)));
            }
            if let Some(error) = &info.error {
                out.push(Arc::new(blocks::error_block(error, ctx)));
            } else if let Some(footer) = blocks::footer(info, ctx) {
                out.push(Arc::new(footer));
            }
        }
    }
    out.retain(|block| !block.is_empty());
    out
}

/// Immutable input of one render pass.
#[derive(Clone)]
pub struct RenderSnapshot {
    /// Cache generation the pass was started against.
    pub generation: u64,
    pub cache: Arc<CacheMap>,
    pub messages: Vec<MessageWithParts>,
    pub revert: Option<RevertInfo>,
    pub flags: RenderFlags,
    pub theme: Theme,
    pub formatter: Arc<dyn Formatter>,
    pub pending: HashMap<String, Permission>,
    /// Tool calls from child sessions waiting on a permission.
    pub previews: Vec<(Permission, MessageWithParts)>,
    pub frame: usize,
    pub max_tool_output_lines: usize,
}

/// Result of one render pass.
#[derive(Debug, Clone)]
pub struct RenderOutput {
    pub generation: u64,
    pub lines: Vec<Line<'static>>,
    /// First buffer line of every visible message.
    pub message_offsets: HashMap<String, usize>,
    /// Blocks rendered in this pass that may be cached.
    pub fresh: Vec<(CacheKey, Arc<RenderedBlock>)>,
    pub cache_hits: usize,
    /// Groups whose body was rendered in this pass rather than reused.
    pub computed: usize,
}

/// Assemble the full line buffer for a snapshot.
pub fn render_pass(snapshot: &RenderSnapshot) -> RenderOutput {
    let _timing = TimingGuard::render("render_pass").with_warn_threshold(100);
    let ctx = RenderContext {
        flags: snapshot.flags,
        theme: &snapshot.theme,
        formatter: snapshot.formatter.as_ref(),
        pending: &snapshot.pending,
        frame: snapshot.frame,
        max_tool_output_lines: snapshot.max_tool_output_lines,
    };
    let state = match &snapshot.revert {
        Some(info) => RevertState::Reverted {
            boundary: info.message_id.clone(),
        },
        None => RevertState::Normal,
    };

    let mut cache = PassCache::new(&snapshot.cache);
    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut message_offsets = HashMap::new();

    for message in &snapshot.messages {
        if state.hides(message.id()) {
            continue;
        }
        let blocks = render_message(message, &ctx, &mut cache);
        if blocks.is_empty() {
            continue;
        }
        message_offsets.insert(message.id().to_string(), lines.len());
        for (idx, block) in blocks.iter().enumerate() {
            if idx > 0 {
                lines.push(Line::default());
            }
            lines.extend(block.lines.iter().cloned());
        }
        lines.push(Line::default());
    }

    if let Some(info) = &snapshot.revert {
        let summary = RevertSummary::compute(&snapshot.messages, info);
        lines.extend(blocks::revert_summary(&summary, &ctx).lines);
        lines.push(Line::default());
    }

    for (permission, message) in &snapshot.previews {
        if let Some(preview) = blocks::permission_preview(permission, message, &ctx) {
            lines.extend(preview.lines);
            lines.push(Line::default());
        }
    }

    let cache_hits = cache.hits();
    let computed = cache.computed();
    RenderOutput {
        generation: snapshot.generation,
        lines,
        message_offsets,
        fresh: cache.into_fresh(),
        cache_hits,
        computed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::PartCache;
    use crate::format::PlainFormatter;
    use threadline_core::{MessageError, RevertInfo, ToolStatus};
    use threadline_test_utils::builders::{user, AssistantBuilder};

    fn snapshot(messages: Vec<MessageWithParts>) -> RenderSnapshot {
        RenderSnapshot {
            generation: 0,
            cache: Arc::new(CacheMap::new()),
            messages,
            revert: None,
            flags: RenderFlags {
                width: 80,
                show_tool_details: false,
                show_thinking: false,
            },
            theme: Theme::default(),
            formatter: Arc::new(PlainFormatter),
            pending: HashMap::new(),
            previews: Vec::new(),
            frame: 0,
            max_tool_output_lines: 10,
        }
    }

    fn text_of(output: &RenderOutput) -> String {
        output.lines.iter().map(line_text).collect::<Vec<_>>().join("\n")
    }

    fn listing() -> Vec<MessageWithParts> {
        vec![
            user("msg_01", "list the files"),
            AssistantBuilder::new("msg_02")
                .text("Sure.")
                .bash("ls", "List files")
                .completed()
                .build(),
        ]
    }

    #[test]
    fn test_tools_attach_to_preceding_text() {
        let message = AssistantBuilder::new("msg_02")
            .text("A")
            .bash("ls", "one")
            .bash("pwd", "two")
            .text("B")
            .bash("date", "three")
            .build();
        let groups = group_parts(&message.parts);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].text.map(|t| t.text.as_str()), Some("A"));
        assert_eq!(groups[0].attached.len(), 2);
        assert_eq!(groups[1].text.map(|t| t.text.as_str()), Some("B"));
        assert_eq!(groups[1].attached.len(), 1);
        assert_eq!(attached_parts(&message.parts[1..]).len(), 2);
    }

    #[test]
    fn test_early_tools_wait_for_first_text() {
        let before_text = AssistantBuilder::new("msg_02").bash("ls", "one").build();
        let groups = group_parts(&before_text.parts);
        assert_eq!(groups.len(), 1);
        assert!(groups[0].text.is_none());

        let with_text = AssistantBuilder::new("msg_02")
            .bash("ls", "one")
            .text("A")
            .build();
        let groups = group_parts(&with_text.parts);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].text.map(|t| t.text.as_str()), Some("A"));
        assert_eq!(groups[0].attached.len(), 1);
    }

    #[test]
    fn test_collapsed_and_detailed_tools() {
        let mut snap = snapshot(listing());
        let collapsed = text_of(&render_pass(&snap));
        assert!(collapsed.contains("┃ list the files"));
        assert!(collapsed.contains("∟ List files"));
        assert!(collapsed.contains("▣ test-model · 200 tokens · 2.0s"));
        assert!(!collapsed.contains("$ ls"));

        snap.flags.show_tool_details = true;
        let detailed = text_of(&render_pass(&snap));
        assert!(detailed.contains("╭─ # List files ●"));
        assert!(detailed.contains("│ $ ls"));
        assert!(detailed.contains("│ ok"));
    }

    #[test]
    fn test_message_offsets_point_at_first_line() {
        let output = render_pass(&snapshot(listing()));
        assert_eq!(output.message_offsets.get("msg_01"), Some(&0));
        assert_eq!(output.message_offsets.get("msg_02"), Some(&2));
        assert_eq!(line_text(&output.lines[2]), "  Sure.");
    }

    #[test]
    fn test_settled_groups_render_once() {
        let mut cache = PartCache::new();
        let mut snap = snapshot(listing());
        snap.cache = cache.snapshot();
        let first = render_pass(&snap);
        assert_eq!(first.computed, 2);
        assert!(cache.merge(first.generation, first.fresh.clone()));

        snap.cache = cache.snapshot();
        let second = render_pass(&snap);
        assert_eq!(second.computed, 0);
        assert_eq!(second.cache_hits, 2);
        assert_eq!(second.lines, first.lines);
    }

    #[test]
    fn test_streaming_text_is_never_cached() {
        let mut cache = PartCache::new();
        let mut snap = snapshot(vec![
            user("msg_01", "hi"),
            AssistantBuilder::new("msg_02").streaming_text("Typing").build(),
        ]);
        let first = render_pass(&snap);
        assert_eq!(first.fresh.len(), 1);
        cache.merge(first.generation, first.fresh);

        snap.cache = cache.snapshot();
        let second = render_pass(&snap);
        assert_eq!(second.computed, 1);
        assert!(text_of(&second).contains("Typing ⠋"));
    }

    #[test]
    fn test_running_tool_blocks_caching_of_its_group() {
        let snap = snapshot(vec![AssistantBuilder::new("msg_02")
            .text("Working on it")
            .bash_with_status("sleep 5", "Wait", ToolStatus::Running)
            .build()]);
        let output = render_pass(&snap);
        assert!(output.fresh.is_empty());
        assert!(text_of(&output).contains("∟ Wait"));
    }

    #[test]
    fn test_reverted_messages_are_replaced_by_summary() {
        let mut snap = snapshot(vec![
            user("msg_01", "first question"),
            AssistantBuilder::new("msg_02").text("first answer").completed().build(),
            user("msg_03", "second question"),
            AssistantBuilder::new("msg_04")
                .text("second answer")
                .bash("ls", "List files")
                .completed()
                .build(),
        ]);
        snap.revert = Some(RevertInfo {
            message_id: "msg_03".to_string(),
            part_id: None,
            snapshot: None,
            diff: Some("--- a/src/lib.rs\n+++ b/src/lib.rs\n@@ -1 +1,2 @@\n-a\n+b\n+c\n".to_string()),
        });
        let output = render_pass(&snap);
        let text = text_of(&output);
        assert!(text.contains("first answer"));
        assert!(!text.contains("second answer"));
        assert!(text.contains("── 2 messages reverted ──"));
        assert!(text.contains("1 tool call reverted"));
        assert!(text.contains("src/lib.rs +2 -1"));
        assert!(!output.message_offsets.contains_key("msg_03"));
    }

    #[test]
    fn test_synthetic_user_text_is_hidden() {
        let mut message = user("msg_01", "injected context");
        if let MessagePart::Text(text) = &mut message.parts[0] {
            text.synthetic = true;
        }
        let output = render_pass(&snapshot(vec![message]));
        assert!(output.lines.is_empty());
        assert!(output.message_offsets.is_empty());
    }

    #[test]
    fn test_pending_permission_expands_tool() {
        let message = AssistantBuilder::new("msg_02")
            .text("Deleting")
            .bash_with_status("rm -rf build", "Clean build", ToolStatus::Pending)
            .build();
        let mut snap = snapshot(vec![message]);
        snap.pending.insert(
            "call_msg_02_p02".to_string(),
            Permission {
                id: "per_1".to_string(),
                session_id: "ses_test".to_string(),
                message_id: "msg_02".to_string(),
                call_id: Some("call_msg_02_p02".to_string()),
                kind: "bash".to_string(),
                title: "rm -rf build".to_string(),
                pattern: None,
            },
        );
        let text = text_of(&render_pass(&snap));
        assert!(text.contains("╭─ # Clean build ⠋"));
        assert!(text.contains("△ Permission required: rm -rf build"));
    }

    #[test]
    fn test_error_replaces_footer() {
        let message = AssistantBuilder::new("msg_02")
            .text("Partial")
            .error(MessageError::Auth {
                message: "token expired".to_string(),
            })
            .completed()
            .build();
        let text = text_of(&render_pass(&snapshot(vec![message])));
        assert!(text.contains("╭─ Authentication failed"));
        assert!(text.contains("│ token expired"));
        assert!(!text.contains("▣"));
    }

    #[test]
    fn test_long_output_is_truncated() {
        let mut snap = snapshot(vec![AssistantBuilder::new("msg_02")
            .text("Here")
            .tool(
                "bash",
                threadline_test_utils::builders::tool_state(
                    ToolStatus::Completed,
                    threadline_core::ToolInput::default(),
                    &(1..=14).map(|n| format!("line {n}")).collect::<Vec<_>>().join("\n"),
                ),
            )
            .build()]);
        snap.flags.show_tool_details = true;
        snap.max_tool_output_lines = 10;
        let text = text_of(&render_pass(&snap));
        assert!(text.contains("│ line 10"));
        assert!(!text.contains("│ line 11"));
        assert!(text.contains("… 4 more lines"));
    }
}
