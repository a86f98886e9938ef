//! Session info and the revert pointer it carries.

use serde::Deserialize;

use crate::message::{Message, MessagePart};

/// Session information as last confirmed by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Session {
    pub id: String,

    /// Parent session for child sessions spawned by tasks.
    #[serde(default)]
    pub parent_id: Option<String>,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub time: SessionTime,

    /// Present while part of the conversation is reverted.
    #[serde(default)]
    pub revert: Option<RevertInfo>,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Whether `other` belongs to the same family (parent or child).
    pub fn is_related(&self, other: &str) -> bool {
        self.id == other || self.parent_id.as_deref() == Some(other)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SessionTime {
    pub created: i64,
    pub updated: i64,
}

/// Revert boundary: everything from `message_id` on is hidden.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RevertInfo {
    pub message_id: String,

    #[serde(default)]
    pub part_id: Option<String>,

    #[serde(default)]
    pub snapshot: Option<String>,

    /// Unified diff of the file changes the revert undid.
    #[serde(default)]
    pub diff: Option<String>,
}

/// A message together with its parts.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MessageWithParts {
    pub info: Message,
    #[serde(default)]
    pub parts: Vec<MessagePart>,
}

impl MessageWithParts {
    pub fn new(info: Message) -> Self {
        Self {
            info,
            parts: Vec::new(),
        }
    }

    pub fn with_parts(info: Message, parts: Vec<MessagePart>) -> Self {
        Self { info, parts }
    }

    pub fn id(&self) -> &str {
        self.info.id()
    }

    pub fn part(&self, part_id: &str) -> Option<&MessagePart> {
        self.parts.iter().find(|p| p.id() == part_id)
    }

    /// In flight if the assistant has not completed or a tool is still running.
    pub fn is_in_flight(&self) -> bool {
        self.info.is_in_flight() || self.parts.iter().any(MessagePart::is_in_flight)
    }
}
