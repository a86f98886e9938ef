//! Decoding raw event payloads into typed model values.
//!
//! This is the only place where `serde_json::Value` is looked at. Parts are
//! dispatched on their `type` tag, tool input on the tool name, and tool
//! metadata into a fixed set of known fields.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{DecodeError, DecodeResult};
use crate::message::{
    Message, MessagePart, ToolInput, ToolMetadata, ToolPart, ToolState, ToolTime, PART_TYPES,
};
use crate::permission::Permission;
use crate::session::Session;

/// Decode message info (role-tagged).
pub fn decode_message(value: Value) -> DecodeResult<Message> {
    serde_json::from_value(value).map_err(|e| DecodeError::Malformed {
        what: "message",
        source: e,
    })
}

/// Decode a part. Unknown `type` tags are reported separately from malformed
/// payloads so callers can log them as unsupported rather than broken.
pub fn decode_part(value: Value) -> DecodeResult<MessagePart> {
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or(DecodeError::MissingType)?;
    if !PART_TYPES.contains(&kind) {
        return Err(DecodeError::UnknownPartType(kind.to_string()));
    }
    serde_json::from_value(value).map_err(|e| DecodeError::Malformed {
        what: "part",
        source: e,
    })
}

pub fn decode_session(value: Value) -> DecodeResult<Session> {
    serde_json::from_value(value).map_err(|e| DecodeError::Malformed {
        what: "session",
        source: e,
    })
}

pub fn decode_permission(value: Value) -> DecodeResult<Permission> {
    serde_json::from_value(value).map_err(|e| DecodeError::Malformed {
        what: "permission",
        source: e,
    })
}

/// Strip the `mcp__<server>__` prefix from MCP tool names.
pub fn normalize_tool_name(name: &str) -> &str {
    if let Some(rest) = name.strip_prefix("mcp__") {
        if let Some(idx) = rest.rfind("__") {
            return &rest[idx + 2..];
        }
    }
    name
}

/// Decode tool arguments by tool name. Falls back to [`ToolInput::Other`].
pub fn decode_tool_input(tool: &str, input: Value) -> ToolInput {
    let typed = match normalize_tool_name(tool) {
        "bash" => typed_input(&input, ToolInput::Bash),
        "read" => typed_input(&input, ToolInput::Read),
        "write" => typed_input(&input, ToolInput::Write),
        "edit" => typed_input(&input, ToolInput::Edit),
        "glob" => typed_input(&input, ToolInput::Glob),
        "grep" => typed_input(&input, ToolInput::Grep),
        "list" => typed_input(&input, ToolInput::List),
        "task" => typed_input(&input, ToolInput::Task),
        "webfetch" => typed_input(&input, ToolInput::WebFetch),
        "todowrite" => typed_input(&input, ToolInput::TodoWrite),
        _ => None,
    };
    typed.unwrap_or_else(|| ToolInput::Other {
        args: scalar_args(&input),
    })
}

/// Decode tool metadata, keeping only known fields.
pub fn decode_tool_metadata(metadata: Value) -> ToolMetadata {
    if metadata.is_null() {
        return ToolMetadata::default();
    }
    serde_json::from_value(metadata).unwrap_or_else(|e| {
        debug!(error = %e, "Ignoring unreadable tool metadata");
        ToolMetadata::default()
    })
}

fn typed_input<T: DeserializeOwned>(input: &Value, wrap: fn(T) -> ToolInput) -> Option<ToolInput> {
    if input.is_null() {
        return None;
    }
    serde_json::from_value::<T>(input.clone()).ok().map(wrap)
}

fn scalar_args(input: &Value) -> Vec<(String, String)> {
    let Some(map) = input.as_object() else {
        return Vec::new();
    };
    let mut args: Vec<(String, String)> = map
        .iter()
        .filter_map(|(key, value)| {
            let text = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => return None,
            };
            Some((key.clone(), text))
        })
        .collect();
    args.sort();
    args
}

/// Tool part as it arrives on the wire.
#[derive(Debug, Deserialize)]
pub(crate) struct RawToolPart {
    id: String,
    session_id: String,
    message_id: String,
    call_id: String,
    tool: String,
    state: RawToolState,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum RawToolState {
    Pending {
        #[serde(default)]
        input: Value,
    },
    Running {
        #[serde(default)]
        input: Value,
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        metadata: Value,
        time: ToolTime,
    },
    Completed {
        #[serde(default)]
        input: Value,
        output: String,
        #[serde(default)]
        title: String,
        #[serde(default)]
        metadata: Value,
        time: ToolTime,
    },
    Error {
        #[serde(default)]
        input: Value,
        error: String,
        #[serde(default)]
        metadata: Value,
        time: ToolTime,
    },
}

impl From<RawToolPart> for ToolPart {
    fn from(raw: RawToolPart) -> Self {
        let tool = raw.tool;
        let state = match raw.state {
            RawToolState::Pending { input } => ToolState::Pending {
                input: decode_tool_input(&tool, input),
            },
            RawToolState::Running {
                input,
                title,
                metadata,
                time,
            } => ToolState::Running {
                input: decode_tool_input(&tool, input),
                title,
                metadata: decode_tool_metadata(metadata),
                time,
            },
            RawToolState::Completed {
                input,
                output,
                title,
                metadata,
                time,
            } => ToolState::Completed {
                input: decode_tool_input(&tool, input),
                output,
                title,
                metadata: decode_tool_metadata(metadata),
                time,
            },
            RawToolState::Error {
                input,
                error,
                metadata,
                time,
            } => ToolState::Error {
                input: decode_tool_input(&tool, input),
                error,
                metadata: decode_tool_metadata(metadata),
                time,
            },
        };
        ToolPart {
            id: raw.id,
            session_id: raw.session_id,
            message_id: raw.message_id,
            call_id: raw.call_id,
            tool,
            state,
        }
    }
}
