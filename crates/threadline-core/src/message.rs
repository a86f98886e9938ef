//! Message and part types.
//!
//! Messages are the unit of conversation. Each belongs to a session and owns
//! an ordered list of parts (text, tool calls, files, ...). Every type here is
//! fully typed: raw tool input and metadata are decoded on the way in (see
//! [`crate::decode`]) so nothing untyped reaches the store.

use serde::Deserialize;
use threadline_util::Identifier;

use crate::decode::RawToolPart;

/// A message in a session.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    User(UserMessage),
    Assistant(AssistantMessage),
}

impl Message {
    /// Message id; ids sort by creation time.
    pub fn id(&self) -> &str {
        match self {
            Message::User(m) => &m.id,
            Message::Assistant(m) => &m.id,
        }
    }

    /// Owning session.
    pub fn session_id(&self) -> &str {
        match self {
            Message::User(m) => &m.session_id,
            Message::Assistant(m) => &m.session_id,
        }
    }

    /// Creation time (ms).
    pub fn created_at(&self) -> i64 {
        match self {
            Message::User(m) => m.time.created,
            Message::Assistant(m) => m.time.created,
        }
    }

    /// Check if this is a user message.
    pub fn is_user(&self) -> bool {
        matches!(self, Message::User(_))
    }

    /// Check if this is an assistant message.
    pub fn is_assistant(&self) -> bool {
        matches!(self, Message::Assistant(_))
    }

    /// An assistant message that has not completed yet.
    pub fn is_in_flight(&self) -> bool {
        match self {
            Message::User(_) => false,
            Message::Assistant(m) => m.time.completed.is_none(),
        }
    }
}

/// A user message.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserMessage {
    pub id: String,
    pub session_id: String,
    pub time: MessageTime,
}

impl UserMessage {
    /// A fresh user message with a client-generated ascending id.
    pub fn new(session_id: impl Into<String>) -> Self {
        Self::with_id(Identifier::message(), session_id)
    }

    /// A user message with a known id, e.g. one echoed by the server.
    pub fn with_id(id: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            session_id: session_id.into(),
            time: MessageTime::now(),
        }
    }
}

/// An assistant message.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AssistantMessage {
    pub id: String,
    pub session_id: String,
    pub time: AssistantTime,

    /// The user message this answers.
    #[serde(default)]
    pub parent_id: Option<String>,

    pub model_id: String,
    #[serde(default)]
    pub provider_id: String,

    /// Cost in dollars.
    #[serde(default)]
    pub cost: f64,
    #[serde(default)]
    pub tokens: TokenUsage,

    /// Set when the response failed.
    #[serde(default)]
    pub error: Option<MessageError>,
}

impl AssistantMessage {
    /// A new in-flight assistant message for `model_id`.
    pub fn new(
        id: impl Into<String>,
        session_id: impl Into<String>,
        model_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            session_id: session_id.into(),
            time: AssistantTime::started(),
            parent_id: None,
            model_id: model_id.into(),
            provider_id: String::new(),
            cost: 0.0,
            tokens: TokenUsage::default(),
            error: None,
        }
    }

    /// Mark the message as completed now.
    pub fn complete(&mut self) {
        self.time.completed = Some(chrono::Utc::now().timestamp_millis());
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MessageTime {
    pub created: i64,
}

impl MessageTime {
    /// Created now.
    pub fn now() -> Self {
        Self {
            created: chrono::Utc::now().timestamp_millis(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AssistantTime {
    pub created: i64,
    #[serde(default)]
    pub completed: Option<i64>,
}

impl AssistantTime {
    /// Created now, not completed.
    pub fn started() -> Self {
        Self {
            created: chrono::Utc::now().timestamp_millis(),
            completed: None,
        }
    }
}

/// Why an assistant response failed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageError {
    Auth { message: String },
    OutputLength,
    Aborted,
    Unknown { message: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TokenUsage {
    pub input: u64,
    pub output: u64,
    pub reasoning: u64,
    pub cache: CacheUsage,
}

impl TokenUsage {
    /// Input plus output tokens.
    pub fn total(&self) -> u64 {
        self.input + self.output + self.reasoning + self.cache.read + self.cache.write
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheUsage {
    pub read: u64,
    pub write: u64,
}

// ============================================================================
// Message Parts
// ============================================================================

/// A part of a message.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum MessagePart {
    Text(TextPart),
    Reasoning(ReasoningPart),
    File(FilePart),
    Tool(ToolPart),
    StepStart(StepStartPart),
    StepFinish(StepFinishPart),
    Snapshot(SnapshotPart),
    Patch(PatchPart),
    Agent(AgentPart),
}

/// Wire names of every part variant, in declaration order.
pub const PART_TYPES: [&str; 9] = [
    "text",
    "reasoning",
    "file",
    "tool",
    "step-start",
    "step-finish",
    "snapshot",
    "patch",
    "agent",
];

impl MessagePart {
    /// Part id, unique within its message.
    pub fn id(&self) -> &str {
        match self {
            MessagePart::Text(p) => &p.id,
            MessagePart::Reasoning(p) => &p.id,
            MessagePart::File(p) => &p.id,
            MessagePart::Tool(p) => &p.id,
            MessagePart::StepStart(p) => &p.id,
            MessagePart::StepFinish(p) => &p.id,
            MessagePart::Snapshot(p) => &p.id,
            MessagePart::Patch(p) => &p.id,
            MessagePart::Agent(p) => &p.id,
        }
    }

    /// Message the part belongs to.
    pub fn message_id(&self) -> &str {
        match self {
            MessagePart::Text(p) => &p.message_id,
            MessagePart::Reasoning(p) => &p.message_id,
            MessagePart::File(p) => &p.message_id,
            MessagePart::Tool(p) => &p.message_id,
            MessagePart::StepStart(p) => &p.message_id,
            MessagePart::StepFinish(p) => &p.message_id,
            MessagePart::Snapshot(p) => &p.message_id,
            MessagePart::Patch(p) => &p.message_id,
            MessagePart::Agent(p) => &p.message_id,
        }
    }

    /// Owning session.
    pub fn session_id(&self) -> &str {
        match self {
            MessagePart::Text(p) => &p.session_id,
            MessagePart::Reasoning(p) => &p.session_id,
            MessagePart::File(p) => &p.session_id,
            MessagePart::Tool(p) => &p.session_id,
            MessagePart::StepStart(p) => &p.session_id,
            MessagePart::StepFinish(p) => &p.session_id,
            MessagePart::Snapshot(p) => &p.session_id,
            MessagePart::Patch(p) => &p.session_id,
            MessagePart::Agent(p) => &p.session_id,
        }
    }

    /// A tool call that has not reached a terminal state.
    pub fn is_in_flight(&self) -> bool {
        match self {
            MessagePart::Tool(tool) => !tool.state.is_terminal(),
            _ => false,
        }
    }
}

/// Text part.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct TextPart {
    pub id: String,
    pub session_id: String,
    pub message_id: String,
    pub text: String,

    /// Injected by the server rather than typed by anyone.
    #[serde(default)]
    pub synthetic: bool,

    #[serde(default)]
    pub time: Option<PartTime>,
}

impl TextPart {
    /// A static text part with a fresh part id.
    pub fn new(
        session_id: impl Into<String>,
        message_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: Identifier::part(),
            session_id: session_id.into(),
            message_id: message_id.into(),
            text: text.into(),
            synthetic: false,
            time: None,
        }
    }

    /// Text whose time window is open is still being streamed.
    ///
    /// Parts without any time window are static (user-authored) content.
    pub fn is_streaming(&self) -> bool {
        matches!(self.time, Some(PartTime { end: None, .. }))
    }
}

/// Reasoning/thinking part.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct ReasoningPart {
    pub id: String,
    pub session_id: String,
    pub message_id: String,
    pub text: String,
    #[serde(default)]
    pub time: Option<PartTime>,
}

impl ReasoningPart {
    /// Started but not ended.
    pub fn is_streaming(&self) -> bool {
        matches!(self.time, Some(PartTime { end: None, .. }))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub struct PartTime {
    pub start: i64,
    #[serde(default)]
    pub end: Option<i64>,
}

impl PartTime {
    /// Open window starting now.
    pub fn started() -> Self {
        Self {
            start: chrono::Utc::now().timestamp_millis(),
            end: None,
        }
    }

    /// Close the window now.
    pub fn finish(&mut self) {
        self.end = Some(chrono::Utc::now().timestamp_millis());
    }
}

/// File attachment part.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct FilePart {
    pub id: String,
    pub session_id: String,
    pub message_id: String,
    pub mime: String,
    #[serde(default)]
    pub filename: Option<String>,
    pub url: String,
    #[serde(default)]
    pub source: Option<FileSource>,
}

impl FilePart {
    /// Name shown in attachment chips.
    pub fn display_name(&self) -> &str {
        if let Some(name) = &self.filename {
            return name;
        }
        match &self.source {
            Some(FileSource::File { path }) | Some(FileSource::Symbol { path, .. }) => path,
            None => &self.url,
        }
    }
}

/// Where an attached file came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FileSource {
    File {
        path: String,
    },
    Symbol {
        path: String,
        name: String,
        #[serde(default)]
        kind: u32,
    },
}

/// Tool call part.
///
/// Decoded through [`RawToolPart`] so input and metadata get typed by tool name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "RawToolPart")]
pub struct ToolPart {
    pub id: String,
    pub session_id: String,
    pub message_id: String,
    pub call_id: String,
    pub tool: String,
    pub state: ToolState,
}

/// Tool execution state. Moves strictly Pending, Running, then Completed or Error.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ToolState {
    Pending {
        input: ToolInput,
    },
    Running {
        input: ToolInput,
        title: Option<String>,
        metadata: ToolMetadata,
        time: ToolTime,
    },
    Completed {
        input: ToolInput,
        output: String,
        title: String,
        metadata: ToolMetadata,
        time: ToolTime,
    },
    Error {
        input: ToolInput,
        error: String,
        metadata: ToolMetadata,
        time: ToolTime,
    },
}

/// Discriminant of [`ToolState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ToolStatus {
    Pending,
    Running,
    Completed,
    Error,
}

impl ToolStatus {
    fn rank(self) -> u8 {
        match self {
            ToolStatus::Pending => 0,
            ToolStatus::Running => 1,
            ToolStatus::Completed | ToolStatus::Error => 2,
        }
    }
}

impl ToolState {
    /// Status without the payload.
    pub fn status(&self) -> ToolStatus {
        match self {
            ToolState::Pending { .. } => ToolStatus::Pending,
            ToolState::Running { .. } => ToolStatus::Running,
            ToolState::Completed { .. } => ToolStatus::Completed,
            ToolState::Error { .. } => ToolStatus::Error,
        }
    }

    /// Completed or Error.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ToolState::Completed { .. } | ToolState::Error { .. })
    }

    /// Arguments the tool was called with.
    pub fn input(&self) -> &ToolInput {
        match self {
            ToolState::Pending { input }
            | ToolState::Running { input, .. }
            | ToolState::Completed { input, .. }
            | ToolState::Error { input, .. } => input,
        }
    }

    /// Metadata reported once the tool started. `None` while pending.
    pub fn metadata(&self) -> Option<&ToolMetadata> {
        match self {
            ToolState::Pending { .. } => None,
            ToolState::Running { metadata, .. }
            | ToolState::Completed { metadata, .. }
            | ToolState::Error { metadata, .. } => Some(metadata),
        }
    }

    /// Whether `next` may replace this state.
    ///
    /// Only single steps along Pending, Running, Completed or Error are valid.
    /// Re-sending the same status is allowed (progress updates, idempotent
    /// replays).
    pub fn can_become(&self, next: &ToolState) -> bool {
        let (from, to) = (self.status(), next.status());
        from == to || to.rank() == from.rank() + 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub struct ToolTime {
    pub start: i64,
    #[serde(default)]
    pub end: Option<i64>,
}

/// Typed tool arguments, decoded by tool name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ToolInput {
    Bash(BashInput),
    Read(ReadInput),
    Write(WriteInput),
    Edit(EditInput),
    Glob(SearchInput),
    Grep(SearchInput),
    List(ListInput),
    Task(TaskInput),
    WebFetch(WebFetchInput),
    TodoWrite(TodoWriteInput),
    /// Any other tool: top-level scalar arguments, stringified, in key order.
    Other { args: Vec<(String, String)> },
}

impl Default for ToolInput {
    fn default() -> Self {
        ToolInput::Other { args: Vec::new() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(default)]
pub struct BashInput {
    pub command: String,
    pub description: Option<String>,
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReadInput {
    #[serde(alias = "file_path")]
    pub file_path: String,
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WriteInput {
    #[serde(alias = "file_path")]
    pub file_path: String,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditInput {
    #[serde(alias = "file_path")]
    pub file_path: String,
    #[serde(alias = "old_string")]
    pub old_string: String,
    #[serde(alias = "new_string")]
    pub new_string: String,
    #[serde(alias = "replace_all")]
    pub replace_all: bool,
}

/// Arguments shared by glob and grep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(default)]
pub struct SearchInput {
    pub pattern: String,
    pub path: Option<String>,
    pub include: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(default)]
pub struct ListInput {
    pub path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(default)]
pub struct TaskInput {
    pub description: String,
    pub prompt: String,
    pub subagent_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(default)]
pub struct WebFetchInput {
    pub url: String,
    pub format: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(default)]
pub struct TodoWriteInput {
    pub todos: Vec<TodoItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(default)]
pub struct TodoItem {
    pub content: String,
    pub status: String,
}

/// Typed tool metadata. Unknown keys are dropped during decoding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(default)]
pub struct ToolMetadata {
    /// Unified diff produced by edit/write tools.
    pub diff: Option<String>,
    /// Short file preview produced by read.
    pub preview: Option<String>,
    pub count: Option<u64>,
    pub matches: Option<u64>,
    /// Process exit code for bash.
    pub exit: Option<i64>,
    pub truncated: bool,
    /// Child session spawned by a task tool.
    pub session_id: Option<String>,
}

/// Step start marker.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StepStartPart {
    pub id: String,
    pub session_id: String,
    pub message_id: String,
}

/// Step finish with usage.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StepFinishPart {
    pub id: String,
    pub session_id: String,
    pub message_id: String,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub cost: f64,
    #[serde(default)]
    pub tokens: TokenUsage,
}

/// Snapshot reference.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SnapshotPart {
    pub id: String,
    pub session_id: String,
    pub message_id: String,
    pub snapshot: String,
}

/// Files touched by a step.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PatchPart {
    pub id: String,
    pub session_id: String,
    pub message_id: String,
    pub hash: String,
    #[serde(default)]
    pub files: Vec<String>,
}

/// Agent switch marker.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AgentPart {
    pub id: String,
    pub session_id: String,
    pub message_id: String,
    pub name: String,
}
