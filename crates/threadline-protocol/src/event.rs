//! Mutation events delivered by the session event stream.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A mutation event for the conversation of some session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Message info was created or changed. Parts are not included.
    MessageUpdated { info: Value },

    /// A whole message was deleted.
    MessageRemoved {
        session_id: String,
        message_id: String,
    },

    /// A part was created or changed.
    PartUpdated { part: Value },

    /// A single part was deleted.
    PartRemoved {
        session_id: String,
        message_id: String,
        part_id: String,
    },

    /// Session info changed (title, revert pointer, ...).
    SessionUpdated { info: Value },

    /// A permission request was raised or re-sent.
    PermissionUpdated { permission: Value },

    /// A permission request was answered.
    PermissionReplied {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session_id: Option<String>,
        permission_id: String,
    },
}

impl ServerEvent {
    /// Event type name, for logging.
    pub fn event_type(&self) -> &'static str {
        match self {
            ServerEvent::MessageUpdated { .. } => "message_updated",
            ServerEvent::MessageRemoved { .. } => "message_removed",
            ServerEvent::PartUpdated { .. } => "part_updated",
            ServerEvent::PartRemoved { .. } => "part_removed",
            ServerEvent::SessionUpdated { .. } => "session_updated",
            ServerEvent::PermissionUpdated { .. } => "permission_updated",
            ServerEvent::PermissionReplied { .. } => "permission_replied",
        }
    }

    /// Best-effort session id, read from the envelope or the raw payload.
    pub fn session_id(&self) -> Option<&str> {
        match self {
            ServerEvent::MessageRemoved { session_id, .. }
            | ServerEvent::PartRemoved { session_id, .. } => Some(session_id),
            ServerEvent::MessageUpdated { info } => info.get("session_id").and_then(Value::as_str),
            ServerEvent::PartUpdated { part } => part.get("session_id").and_then(Value::as_str),
            ServerEvent::SessionUpdated { info } => info.get("id").and_then(Value::as_str),
            ServerEvent::PermissionUpdated { permission } => {
                permission.get("session_id").and_then(Value::as_str)
            }
            ServerEvent::PermissionReplied { session_id, .. } => session_id.as_deref(),
        }
    }

    /// Parse one event from a JSON line.
    pub fn from_json(line: &str) -> serde_json::Result<Self> {
        serde_json::from_str(line)
    }
}
