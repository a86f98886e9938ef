//! Builders for typed messages.

use threadline_core::{
    AssistantMessage, BashInput, Message, MessageError, MessagePart, MessageWithParts, PartTime,
    ReasoningPart, TextPart, ToolInput, ToolMetadata, ToolPart, ToolState, ToolStatus, ToolTime,
    UserMessage,
};

use crate::SESSION;

/// A user message with a single text part.
pub fn user(id: &str, text: &str) -> MessageWithParts {
    let info = Message::User(UserMessage::with_id(id, SESSION));
    let mut part = TextPart::new(SESSION, id, text);
    part.id = format!("{id}_p01");
    MessageWithParts::with_parts(info, vec![MessagePart::Text(part)])
}

/// A tool state with the given status and input.
pub fn tool_state(status: ToolStatus, input: ToolInput, output: &str) -> ToolState {
    let started = ToolTime {
        start: 1_000,
        end: None,
    };
    let finished = ToolTime {
        start: 1_000,
        end: Some(2_000),
    };
    match status {
        ToolStatus::Pending => ToolState::Pending { input },
        ToolStatus::Running => ToolState::Running {
            input,
            title: None,
            metadata: ToolMetadata::default(),
            time: started,
        },
        ToolStatus::Completed => ToolState::Completed {
            input,
            output: output.to_string(),
            title: String::new(),
            metadata: ToolMetadata::default(),
            time: finished,
        },
        ToolStatus::Error => ToolState::Error {
            input,
            error: output.to_string(),
            metadata: ToolMetadata::default(),
            time: finished,
        },
    }
}

/// Fluent builder for assistant messages.
pub struct AssistantBuilder {
    info: AssistantMessage,
    parts: Vec<MessagePart>,
}

impl AssistantBuilder {
    pub fn new(id: &str) -> Self {
        let mut info = AssistantMessage::new(id, SESSION, "test-model");
        info.time.created = 1_000;
        Self {
            info,
            parts: Vec::new(),
        }
    }

    fn next_part_id(&self) -> String {
        format!("{}_p{:02}", self.info.id, self.parts.len() + 1)
    }

    /// Finished text.
    pub fn text(mut self, body: &str) -> Self {
        let mut part = TextPart::new(SESSION, &self.info.id, body);
        part.id = self.next_part_id();
        part.time = Some(PartTime {
            start: 1_000,
            end: Some(2_000),
        });
        self.parts.push(MessagePart::Text(part));
        self
    }

    /// Text that is still streaming.
    pub fn streaming_text(mut self, body: &str) -> Self {
        let mut part = TextPart::new(SESSION, &self.info.id, body);
        part.id = self.next_part_id();
        part.time = Some(PartTime {
            start: 1_000,
            end: None,
        });
        self.parts.push(MessagePart::Text(part));
        self
    }

    pub fn reasoning(mut self, body: &str) -> Self {
        let part = ReasoningPart {
            id: self.next_part_id(),
            session_id: SESSION.to_string(),
            message_id: self.info.id.clone(),
            text: body.to_string(),
            time: Some(PartTime {
                start: 1_000,
                end: Some(1_500),
            }),
        };
        self.parts.push(MessagePart::Reasoning(part));
        self
    }

    /// A tool part; the call id is `call_<part id>`.
    pub fn tool(mut self, tool: &str, state: ToolState) -> Self {
        let id = self.next_part_id();
        self.parts.push(MessagePart::Tool(ToolPart {
            call_id: format!("call_{id}"),
            id,
            session_id: SESSION.to_string(),
            message_id: self.info.id.clone(),
            tool: tool.to_string(),
            state,
        }));
        self
    }

    /// A completed bash call.
    pub fn bash(self, command: &str, description: &str) -> Self {
        self.bash_with_status(command, description, ToolStatus::Completed)
    }

    pub fn bash_with_status(self, command: &str, description: &str, status: ToolStatus) -> Self {
        let input = ToolInput::Bash(BashInput {
            command: command.to_string(),
            description: Some(description.to_string()),
            timeout: None,
        });
        self.tool("bash", tool_state(status, input, "ok"))
    }

    pub fn error(mut self, error: MessageError) -> Self {
        self.info.error = Some(error);
        self
    }

    pub fn completed(mut self) -> Self {
        self.info.time.completed = Some(3_000);
        self.info.tokens.input = 120;
        self.info.tokens.output = 80;
        self
    }

    pub fn build(self) -> MessageWithParts {
        MessageWithParts::with_parts(Message::Assistant(self.info), self.parts)
    }
}
