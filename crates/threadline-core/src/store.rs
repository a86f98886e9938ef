//! In-memory message/part store for one session.
//!
//! Messages are kept sorted by ascending id. Lookups and inserts are linear
//! scans from the tail, which is where nearly every new message lands; a
//! conversation is small enough that no secondary index is kept.

use tracing::{debug, warn};

use crate::message::{Message, MessagePart};
use crate::session::MessageWithParts;

/// What a store operation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Inserted,
    Updated,
    Removed,
    /// Identical to what was already stored.
    Unchanged,
    /// Addressed to another session; ignored.
    ForeignSession,
    /// The message or part it refers to is not in the store.
    NotFound,
    /// Would break an invariant (tool state regression).
    Rejected,
}

impl ApplyOutcome {
    /// Whether the store content changed.
    pub fn changed(self) -> bool {
        matches!(
            self,
            ApplyOutcome::Inserted | ApplyOutcome::Updated | ApplyOutcome::Removed
        )
    }
}

/// Ordered messages of the active session.
#[derive(Debug, Clone, Default)]
pub struct MessageStore {
    session_id: String,
    messages: Vec<MessageWithParts>,
}

impl MessageStore {
    /// Empty store for `session_id`.
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            messages: Vec::new(),
        }
    }

    /// Session whose events are accepted.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// All messages in ascending id order.
    pub fn messages(&self) -> &[MessageWithParts] {
        &self.messages
    }

    /// Number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Look up a message by id.
    pub fn get(&self, message_id: &str) -> Option<&MessageWithParts> {
        self.messages.iter().rev().find(|m| m.id() == message_id)
    }

    /// Replace everything, e.g. when switching sessions.
    pub fn reset(&mut self, session_id: impl Into<String>, mut messages: Vec<MessageWithParts>) {
        self.session_id = session_id.into();
        messages.retain(|m| m.info.session_id() == self.session_id);
        messages.sort_by(|a, b| a.id().cmp(b.id()));
        self.messages = messages;
    }

    /// Any assistant message still generating, or any tool not finished.
    pub fn has_in_flight(&self) -> bool {
        self.messages.iter().any(MessageWithParts::is_in_flight)
    }

    /// Insert or update message info. Existing parts are kept.
    pub fn upsert_message(&mut self, info: Message) -> ApplyOutcome {
        if info.session_id() != self.session_id {
            return ApplyOutcome::ForeignSession;
        }
        if let Some(existing) = self.find_mut(info.id()) {
            if existing.info == info {
                return ApplyOutcome::Unchanged;
            }
            existing.info = info;
            return ApplyOutcome::Updated;
        }
        let idx = self.insertion_index(info.id());
        self.messages.insert(idx, MessageWithParts::new(info));
        ApplyOutcome::Inserted
    }

    /// Insert or update a part within its message, keeping part order.
    pub fn upsert_part(&mut self, part: MessagePart) -> ApplyOutcome {
        if part.session_id() != self.session_id {
            return ApplyOutcome::ForeignSession;
        }
        let Some(message) = self.find_mut(part.message_id()) else {
            debug!(
                message_id = %part.message_id(),
                part_id = %part.id(),
                "Part for unknown message"
            );
            return ApplyOutcome::NotFound;
        };
        let Some(existing) = message.parts.iter_mut().find(|p| p.id() == part.id()) else {
            message.parts.push(part);
            return ApplyOutcome::Inserted;
        };
        if *existing == part {
            return ApplyOutcome::Unchanged;
        }
        if let (MessagePart::Tool(old), MessagePart::Tool(new)) = (&*existing, &part) {
            if !old.state.can_become(&new.state) {
                warn!(
                    part_id = %new.id,
                    from = ?old.state.status(),
                    to = ?new.state.status(),
                    "Rejected tool state regression"
                );
                return ApplyOutcome::Rejected;
            }
        }
        *existing = part;
        ApplyOutcome::Updated
    }

    /// Remove one part. Remaining parts keep their order.
    pub fn remove_part(&mut self, session_id: &str, message_id: &str, part_id: &str) -> ApplyOutcome {
        if session_id != self.session_id {
            return ApplyOutcome::ForeignSession;
        }
        let Some(message) = self.find_mut(message_id) else {
            return ApplyOutcome::NotFound;
        };
        let Some(idx) = message.parts.iter().position(|p| p.id() == part_id) else {
            return ApplyOutcome::NotFound;
        };
        message.parts.remove(idx);
        ApplyOutcome::Removed
    }

    /// Remove a message together with its parts.
    pub fn remove_message(&mut self, session_id: &str, message_id: &str) -> ApplyOutcome {
        if session_id != self.session_id {
            return ApplyOutcome::ForeignSession;
        }
        match self.messages.iter().rposition(|m| m.id() == message_id) {
            Some(idx) => {
                self.messages.remove(idx);
                ApplyOutcome::Removed
            }
            None => ApplyOutcome::NotFound,
        }
    }

    fn find_mut(&mut self, message_id: &str) -> Option<&mut MessageWithParts> {
        self.messages.iter_mut().rev().find(|m| m.id() == message_id)
    }

    /// First index whose id sorts after `id`, scanning from the tail.
    fn insertion_index(&self, id: &str) -> usize {
        let mut idx = self.messages.len();
        while idx > 0 && self.messages[idx - 1].id() > id {
            idx -= 1;
        }
        idx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{
        AssistantMessage, TextPart, ToolInput, ToolMetadata, ToolPart, ToolState, ToolTime,
        UserMessage,
    };

    fn user(id: &str) -> Message {
        Message::User(UserMessage::with_id(id, "ses_1"))
    }

    fn text(message_id: &str, id: &str, body: &str) -> MessagePart {
        let mut part = TextPart::new("ses_1", message_id, body);
        part.id = id.to_string();
        MessagePart::Text(part)
    }

    fn tool(message_id: &str, id: &str, state: ToolState) -> MessagePart {
        MessagePart::Tool(ToolPart {
            id: id.to_string(),
            session_id: "ses_1".to_string(),
            message_id: message_id.to_string(),
            call_id: format!("call_{id}"),
            tool: "bash".to_string(),
            state,
        })
    }

    fn ids(store: &MessageStore) -> Vec<&str> {
        store.messages().iter().map(|m| m.id()).collect()
    }

    #[test]
    fn test_out_of_order_inserts_are_sorted() {
        let mut store = MessageStore::new("ses_1");
        for id in ["msg_003", "msg_001", "msg_002"] {
            assert_eq!(store.upsert_message(user(id)), ApplyOutcome::Inserted);
        }
        assert_eq!(ids(&store), vec!["msg_001", "msg_002", "msg_003"]);
    }

    #[test]
    fn test_message_update_is_idempotent_and_keeps_parts() {
        let mut store = MessageStore::new("ses_1");
        let info = Message::Assistant(AssistantMessage::new("msg_002", "ses_1", "model"));
        store.upsert_message(info.clone());
        store.upsert_part(text("msg_002", "prt_1", "hello"));

        assert_eq!(store.upsert_message(info.clone()), ApplyOutcome::Unchanged);
        let before = store.messages().to_vec();
        store.upsert_message(info);
        assert_eq!(store.messages(), before.as_slice());
        assert_eq!(store.get("msg_002").unwrap().parts.len(), 1);
    }

    #[test]
    fn test_foreign_session_ignored() {
        let mut store = MessageStore::new("ses_1");
        let foreign = Message::User(UserMessage::with_id("msg_001", "ses_2"));
        assert_eq!(store.upsert_message(foreign), ApplyOutcome::ForeignSession);
        assert_eq!(
            store.remove_message("ses_2", "msg_001"),
            ApplyOutcome::ForeignSession
        );
        assert!(store.is_empty());
    }

    #[test]
    fn test_part_update_in_place_and_append() {
        let mut store = MessageStore::new("ses_1");
        store.upsert_message(user("msg_001"));
        store.upsert_part(text("msg_001", "prt_1", "a"));
        store.upsert_part(text("msg_001", "prt_2", "b"));
        assert_eq!(
            store.upsert_part(text("msg_001", "prt_1", "a2")),
            ApplyOutcome::Updated
        );
        let parts = &store.get("msg_001").unwrap().parts;
        assert_eq!(parts[0].id(), "prt_1");
        assert_eq!(parts[1].id(), "prt_2");
    }

    #[test]
    fn test_part_for_missing_message() {
        let mut store = MessageStore::new("ses_1");
        assert_eq!(
            store.upsert_part(text("msg_404", "prt_1", "a")),
            ApplyOutcome::NotFound
        );
    }

    #[test]
    fn test_remove_part_preserves_order() {
        let mut store = MessageStore::new("ses_1");
        store.upsert_message(user("msg_001"));
        for id in ["prt_1", "prt_2", "prt_3"] {
            store.upsert_part(text("msg_001", id, id));
        }
        assert_eq!(
            store.remove_part("ses_1", "msg_001", "prt_2"),
            ApplyOutcome::Removed
        );
        let parts: Vec<_> = store
            .get("msg_001")
            .unwrap()
            .parts
            .iter()
            .map(|p| p.id())
            .collect();
        assert_eq!(parts, vec!["prt_1", "prt_3"]);
        assert_eq!(
            store.remove_part("ses_1", "msg_001", "prt_2"),
            ApplyOutcome::NotFound
        );
    }

    #[test]
    fn test_tool_regression_rejected() {
        let mut store = MessageStore::new("ses_1");
        store.upsert_message(user("msg_001"));
        let time = ToolTime { start: 1, end: Some(2) };
        let done = ToolState::Completed {
            input: ToolInput::default(),
            output: "ok".to_string(),
            title: "ls".to_string(),
            metadata: ToolMetadata::default(),
            time,
        };
        let running = ToolState::Running {
            input: ToolInput::default(),
            title: None,
            metadata: ToolMetadata::default(),
            time,
        };
        store.upsert_part(tool("msg_001", "prt_1", done.clone()));
        assert_eq!(
            store.upsert_part(tool("msg_001", "prt_1", running)),
            ApplyOutcome::Rejected
        );
        assert_eq!(
            store.upsert_part(tool("msg_001", "prt_1", done)),
            ApplyOutcome::Unchanged
        );
    }

    #[test]
    fn test_pending_tool_cannot_jump_to_completed() {
        let mut store = MessageStore::new("ses_1");
        store.upsert_message(user("msg_001"));
        let pending = ToolState::Pending {
            input: ToolInput::default(),
        };
        let done = ToolState::Completed {
            input: ToolInput::default(),
            output: "ok".to_string(),
            title: "ls".to_string(),
            metadata: ToolMetadata::default(),
            time: ToolTime { start: 1, end: Some(2) },
        };
        store.upsert_part(tool("msg_001", "prt_1", pending.clone()));
        assert_eq!(
            store.upsert_part(tool("msg_001", "prt_1", done)),
            ApplyOutcome::Rejected
        );
        match &store.get("msg_001").unwrap().parts[0] {
            MessagePart::Tool(part) => assert_eq!(part.state, pending),
            other => panic!("unexpected part {other:?}"),
        }
    }

    #[test]
    fn test_reset_sorts_and_filters() {
        let mut store = MessageStore::new("ses_1");
        store.upsert_message(user("msg_009"));
        store.reset(
            "ses_2",
            vec![
                MessageWithParts::new(Message::User(UserMessage::with_id("msg_002", "ses_2"))),
                MessageWithParts::new(Message::User(UserMessage::with_id("msg_001", "ses_2"))),
                MessageWithParts::new(Message::User(UserMessage::with_id("msg_003", "ses_x"))),
            ],
        );
        assert_eq!(store.session_id(), "ses_2");
        assert_eq!(ids(&store), vec!["msg_001", "msg_002"]);
    }
}
