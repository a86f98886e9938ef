//! Inbound events, as the event stream would deliver them.

use serde_json::json;
use threadline_protocol::ServerEvent;

use crate::SESSION;

pub fn user_message(id: &str) -> ServerEvent {
    ServerEvent::MessageUpdated {
        info: json!({
            "role": "user",
            "id": id,
            "session_id": SESSION,
            "time": {"created": 1_000}
        }),
    }
}

/// Assistant info; `completed` sets a completion time.
pub fn assistant_message(id: &str, completed: bool) -> ServerEvent {
    let completed_at = completed.then_some(3_000);
    ServerEvent::MessageUpdated {
        info: json!({
            "role": "assistant",
            "id": id,
            "session_id": SESSION,
            "time": {"created": 1_000, "completed": completed_at},
            "model_id": "test-model",
            "tokens": {"input": 120, "output": 80}
        }),
    }
}

/// Text part; `finished` closes its time window.
pub fn text_part(message_id: &str, id: &str, text: &str, finished: bool) -> ServerEvent {
    let end = finished.then_some(2_000);
    ServerEvent::PartUpdated {
        part: json!({
            "type": "text",
            "id": id,
            "session_id": SESSION,
            "message_id": message_id,
            "text": text,
            "time": {"start": 1_000, "end": end}
        }),
    }
}

/// Completed bash call.
pub fn bash_part(message_id: &str, id: &str, command: &str, output: &str) -> ServerEvent {
    ServerEvent::PartUpdated {
        part: json!({
            "type": "tool",
            "id": id,
            "session_id": SESSION,
            "message_id": message_id,
            "call_id": format!("call_{id}"),
            "tool": "bash",
            "state": {
                "status": "completed",
                "input": {"command": command, "description": format!("Run {command}")},
                "output": output,
                "title": command,
                "metadata": {"exit": 0},
                "time": {"start": 1_000, "end": 2_000}
            }
        }),
    }
}

pub fn part_removed(message_id: &str, id: &str) -> ServerEvent {
    ServerEvent::PartRemoved {
        session_id: SESSION.to_string(),
        message_id: message_id.to_string(),
        part_id: id.to_string(),
    }
}

/// Session info with an optional revert boundary.
pub fn session_updated(revert_to: Option<&str>) -> ServerEvent {
    let revert = revert_to.map(|id| json!({"message_id": id}));
    ServerEvent::SessionUpdated {
        info: json!({"id": SESSION, "title": "fixture", "revert": revert}),
    }
}

/// Serialize events as JSON lines.
pub fn to_jsonl(events: &[ServerEvent]) -> String {
    events
        .iter()
        .filter_map(|e| serde_json::to_string(e).ok())
        .map(|line| line + "\n")
        .collect()
}
