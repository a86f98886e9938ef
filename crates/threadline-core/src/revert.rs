//! Undo/redo over the conversation.
//!
//! Reverting never deletes anything locally. The server records a boundary on
//! the session; every message at or after it is hidden from rendering until the
//! boundary moves or is cleared. The functions here only pick targets and
//! summarize; the boundary itself changes only from confirmed session info.

use crate::message::{Message, MessagePart};
use crate::session::{MessageWithParts, RevertInfo, Session};

/// Where the conversation currently ends for display purposes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RevertState {
    #[default]
    Normal,
    Reverted { boundary: String },
}

impl RevertState {
    pub fn from_session(session: &Session) -> Self {
        match &session.revert {
            Some(info) => RevertState::Reverted {
                boundary: info.message_id.clone(),
            },
            None => RevertState::Normal,
        }
    }

    pub fn boundary(&self) -> Option<&str> {
        match self {
            RevertState::Normal => None,
            RevertState::Reverted { boundary } => Some(boundary),
        }
    }

    /// Whether a message is hidden by the boundary.
    pub fn hides(&self, message_id: &str) -> bool {
        self.boundary().is_some_and(|b| message_id >= b)
    }
}

/// A request to send to the session service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevertRequest {
    Revert { message_id: String },
    Unrevert,
}

/// Nearest user message before the boundary (or the end), scanning from the tail.
pub fn undo_target(messages: &[MessageWithParts], state: &RevertState) -> Option<RevertRequest> {
    messages
        .iter()
        .rev()
        .filter(|m| m.info.is_user())
        .find(|m| state.boundary().map_or(true, |b| m.id() < b))
        .map(|m| RevertRequest::Revert {
            message_id: m.id().to_string(),
        })
}

/// Move the boundary to the next user message, or restore everything.
///
/// Returns `None` when nothing is reverted.
pub fn redo_target(messages: &[MessageWithParts], state: &RevertState) -> Option<RevertRequest> {
    let boundary = state.boundary()?;
    let next = messages
        .iter()
        .filter(|m| m.info.is_user())
        .find(|m| m.id() > boundary);
    Some(match next {
        Some(m) => RevertRequest::Revert {
            message_id: m.id().to_string(),
        },
        None => RevertRequest::Unrevert,
    })
}

/// Added/removed line counts for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    pub path: String,
    pub added: usize,
    pub removed: usize,
}

/// What a revert currently hides.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RevertSummary {
    pub hidden_messages: usize,
    pub hidden_tool_calls: usize,
    pub files: Vec<FileChange>,
}

impl RevertSummary {
    pub fn compute(messages: &[MessageWithParts], info: &RevertInfo) -> Self {
        let hidden: Vec<&MessageWithParts> = messages
            .iter()
            .filter(|m| m.id() >= info.message_id.as_str())
            .collect();
        let hidden_tool_calls = hidden
            .iter()
            .filter(|m| matches!(m.info, Message::Assistant(_)))
            .flat_map(|m| m.parts.iter())
            .filter(|p| matches!(p, MessagePart::Tool(_)))
            .count();
        Self {
            hidden_messages: hidden.len(),
            hidden_tool_calls,
            files: info.diff.as_deref().map(diff_stats).unwrap_or_default(),
        }
    }

    /// "1 message reverted" / "3 messages reverted".
    pub fn messages_label(&self) -> String {
        plural(self.hidden_messages, "message", "reverted")
    }

    pub fn tool_calls_label(&self) -> String {
        plural(self.hidden_tool_calls, "tool call", "reverted")
    }
}

fn plural(n: usize, noun: &str, verb: &str) -> String {
    let s = if n == 1 { "" } else { "s" };
    format!("{n} {noun}{s} {verb}")
}

/// Per-file line counts from a unified diff.
///
/// `---`/`+++` pairs are file headers only outside a hunk; inside one they are
/// removed or added lines. Hunk extents come from the `@@` line counts.
pub fn diff_stats(diff: &str) -> Vec<FileChange> {
    let lines: Vec<&str> = diff.lines().collect();
    let mut files: Vec<FileChange> = Vec::new();
    // Old and new lines still expected in the current hunk.
    let (mut old_left, mut new_left) = (0usize, 0usize);
    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        i += 1;
        let in_hunk = old_left > 0 || new_left > 0;
        if !in_hunk {
            let header = line.starts_with("--- ")
                && lines.get(i).is_some_and(|next| next.starts_with("+++ "));
            if header {
                let old = strip_diff_path(&line[4..]);
                let new = strip_diff_path(&lines[i][4..]);
                let path = if new == "/dev/null" { old } else { new };
                files.push(FileChange {
                    path: path.to_string(),
                    added: 0,
                    removed: 0,
                });
                i += 1;
                continue;
            }
            if line.starts_with("@@") {
                (old_left, new_left) = hunk_counts(line).unwrap_or((0, 0));
                continue;
            }
        }
        let Some(current) = files.last_mut() else {
            continue;
        };
        match line.as_bytes().first() {
            Some(b'+') => {
                current.added += 1;
                new_left = new_left.saturating_sub(1);
            }
            Some(b'-') => {
                current.removed += 1;
                old_left = old_left.saturating_sub(1);
            }
            Some(b'\\') => {}
            _ => {
                old_left = old_left.saturating_sub(1);
                new_left = new_left.saturating_sub(1);
            }
        }
    }
    files
}

/// `(old, new)` line counts from `@@ -a,b +c,d @@`. A missing count means 1.
fn hunk_counts(line: &str) -> Option<(usize, usize)> {
    let mut ranges = line.strip_prefix("@@")?.split_whitespace();
    let old = ranges.next()?.strip_prefix('-')?;
    let new = ranges.next()?.strip_prefix('+')?;
    let count = |range: &str| match range.split_once(',') {
        Some((_, n)) => n.parse().ok(),
        None => Some(1),
    };
    Some((count(old)?, count(new)?))
}

fn strip_diff_path(raw: &str) -> &str {
    let raw = raw.split('\t').next().unwrap_or(raw).trim();
    raw.strip_prefix("a/")
        .or_else(|| raw.strip_prefix("b/"))
        .unwrap_or(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{AssistantMessage, ToolInput, ToolPart, ToolState, UserMessage};

    /// `[U1, A1, U2, A2, ...]` as msg_01, msg_02, ...
    fn conversation(len: usize) -> Vec<MessageWithParts> {
        (1..=len)
            .map(|i| {
                let id = format!("msg_{i:02}");
                let info = if i % 2 == 1 {
                    Message::User(UserMessage::with_id(id, "ses_1"))
                } else {
                    Message::Assistant(AssistantMessage::new(id, "ses_1", "model"))
                };
                MessageWithParts::new(info)
            })
            .collect()
    }

    fn reverted(boundary: &str) -> RevertState {
        RevertState::Reverted {
            boundary: boundary.to_string(),
        }
    }

    fn revert_to(id: &str) -> Option<RevertRequest> {
        Some(RevertRequest::Revert {
            message_id: id.to_string(),
        })
    }

    #[test]
    fn test_undo_picks_last_user_message() {
        let msgs = conversation(4);
        assert_eq!(undo_target(&msgs, &RevertState::Normal), revert_to("msg_03"));
        assert_eq!(undo_target(&msgs, &reverted("msg_03")), revert_to("msg_01"));
        assert_eq!(undo_target(&msgs, &reverted("msg_01")), None);
    }

    #[test]
    fn test_redo_moves_forward_then_unreverts() {
        let msgs = conversation(4);
        assert_eq!(redo_target(&msgs, &reverted("msg_01")), revert_to("msg_03"));
        assert_eq!(
            redo_target(&msgs, &reverted("msg_03")),
            Some(RevertRequest::Unrevert)
        );
        assert_eq!(redo_target(&msgs, &RevertState::Normal), None);
    }

    #[test]
    fn test_summary_counts_hidden_messages_and_tools() {
        let mut msgs = conversation(4);
        msgs[3].parts.push(MessagePart::Tool(ToolPart {
            id: "prt_1".to_string(),
            session_id: "ses_1".to_string(),
            message_id: "msg_04".to_string(),
            call_id: "call_1".to_string(),
            tool: "bash".to_string(),
            state: ToolState::Pending {
                input: ToolInput::default(),
            },
        }));
        let info = RevertInfo {
            message_id: "msg_03".to_string(),
            part_id: None,
            snapshot: None,
            diff: None,
        };
        let summary = RevertSummary::compute(&msgs, &info);
        assert_eq!(summary.hidden_messages, 2);
        assert_eq!(summary.hidden_tool_calls, 1);
        assert_eq!(summary.messages_label(), "2 messages reverted");
        assert_eq!(summary.tool_calls_label(), "1 tool call reverted");
        assert!(reverted("msg_03").hides("msg_03"));
        assert!(reverted("msg_03").hides("msg_04"));
        assert!(!reverted("msg_03").hides("msg_02"));
    }

    #[test]
    fn test_diff_stats_dash_lines_inside_hunk() {
        let diff = "\
--- a/query.sql
+++ b/query.sql
@@ -1,2 +1,2 @@
--- old comment
+++ new comment
 select 1;
";
        assert_eq!(
            diff_stats(diff),
            vec![FileChange {
                path: "query.sql".to_string(),
                added: 1,
                removed: 1
            }]
        );
    }

    #[test]
    fn test_diff_stats_per_file() {
        let diff = "\
diff --git a/src/lib.rs b/src/lib.rs
--- a/src/lib.rs
+++ b/src/lib.rs
@@ -1,2 +1,3 @@
 fn a() {}
-fn b() {}
+fn b() -> u8 { 1 }
+fn c() {}
--- a/old.txt
+++ /dev/null
@@ -1,2 +0,0 @@
-one
-two
";
        let files = diff_stats(diff);
        assert_eq!(
            files,
            vec![
                FileChange {
                    path: "src/lib.rs".to_string(),
                    added: 2,
                    removed: 1
                },
                FileChange {
                    path: "old.txt".to_string(),
                    added: 0,
                    removed: 2
                },
            ]
        );
    }
}
