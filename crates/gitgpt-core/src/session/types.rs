//! Session types for the agent loop
//!
//! `Message` and `ToolCall` are the persisted conversation model. `SessionOutput`
//! is the progress protocol the agent loop emits for frontends, and
//! `TurnOutcome` is what a finished turn hands back to its caller.

use serde::{Deserialize, Serialize};

use super::chat_log::ChatLog;

/// Role of a message in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A model-issued request to run one local tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Opaque id, unique within the assistant message that emitted it
    pub id: String,
    /// Tool name as advertised in the registry
    pub name: String,
    /// JSON object of named parameters
    #[serde(default)]
    pub arguments: serde_json::Value,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// One conversation turn, as sent to the completion service and persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Only present on assistant messages that request tool execution
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// Only present on tool messages; correlates the result to its `ToolCall`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Create an assistant message. Content is never absent, only empty.
    pub fn assistant(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content: Some(content.into()),
            tool_calls,
            tool_call_id: None,
        }
    }

    /// Create a tool result message
    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }

    /// Text content, empty when absent
    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// Progress events emitted by the agent loop while a turn runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionOutput {
    /// Non-empty assistant text, emitted before any of its tool calls run
    AssistantMessage { content: String },
    /// Tool execution starting
    ToolStart {
        id: String,
        name: String,
        arguments: serde_json::Value,
    },
    /// Tool execution completed
    ToolDone {
        id: String,
        name: String,
        success: bool,
        output: String,
    },
    /// Turn was cancelled by the user
    Cancelled,
}

impl SessionOutput {
    /// Create an assistant message
    pub fn assistant_message(content: impl Into<String>) -> Self {
        Self::AssistantMessage {
            content: content.into(),
        }
    }

    /// Create a tool start notification
    pub fn tool_start(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: serde_json::Value,
    ) -> Self {
        Self::ToolStart {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }

    /// Create a tool done notification
    pub fn tool_done(
        id: impl Into<String>,
        name: impl Into<String>,
        success: bool,
        output: impl Into<String>,
    ) -> Self {
        Self::ToolDone {
            id: id.into(),
            name: name.into(),
            success,
            output: output.into(),
        }
    }
}

/// How a turn ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnStatus {
    /// The model replied without tool calls, or returned no candidate at all
    Done,
    /// The user interrupted an in-flight completion request
    Cancelled,
    /// The configured round guard stopped the loop after a complete round
    RoundLimitReached,
}

/// Result of one agent turn
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// Log as of the last fully completed round
    pub log: ChatLog,
    pub status: TurnStatus,
    /// Set once any round dispatched the restart tool; the caller should
    /// delete the persisted log instead of saving it
    pub reset_requested: bool,
    /// Number of completion requests that returned
    pub rounds: usize,
}

impl TurnOutcome {
    pub fn is_cancelled(&self) -> bool {
        self.status == TurnStatus::Cancelled
    }
}

/// Join command-line words into one instruction.
///
/// Returns `None` when nothing but whitespace remains.
pub fn join_instruction<S: AsRef<str>>(words: &[S]) -> Option<String> {
    let joined = words
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(" ");
    if joined.trim().is_empty() {
        None
    } else {
        Some(joined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_serialization_omits_absent_fields() {
        let json = serde_json::to_value(Message::user("hi")).unwrap();
        assert_eq!(json, json!({ "role": "user", "content": "hi" }));

        let json = serde_json::to_value(Message::tool("call_1", "ok")).unwrap();
        assert_eq!(
            json,
            json!({ "role": "tool", "content": "ok", "tool_call_id": "call_1" })
        );
    }

    #[test]
    fn test_assistant_message_with_tool_calls() {
        let call = ToolCall::new("call_1", "GitStage", json!({ "files": ["*.rs"] }));
        let msg = Message::assistant("", vec![call.clone()]);

        assert_eq!(msg.role, Role::Assistant);
        assert_eq!(msg.content.as_deref(), Some(""));
        assert!(msg.has_tool_calls());

        let json = serde_json::to_string(&msg).unwrap();
        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(back.tool_calls, vec![call]);
    }

    #[test]
    fn test_message_deserializes_without_optional_fields() {
        let msg: Message = serde_json::from_str(r#"{"role":"assistant"}"#).unwrap();
        assert_eq!(msg.role, Role::Assistant);
        assert_eq!(msg.text(), "");
        assert!(msg.tool_calls.is_empty());
        assert!(msg.tool_call_id.is_none());
    }

    #[test]
    fn test_session_output_serialization() {
        let output = SessionOutput::tool_done("t1", "GitStatus", true, "Current branch: main");
        let json = serde_json::to_string(&output).unwrap();
        assert!(json.contains("tool_done"));

        let back: SessionOutput = serde_json::from_str(&json).unwrap();
        assert_eq!(back, output);
    }

    #[test]
    fn test_join_instruction() {
        assert_eq!(
            join_instruction(&["commit", "my", "changes"]).as_deref(),
            Some("commit my changes")
        );
        assert_eq!(join_instruction::<&str>(&[]), None);
        assert_eq!(join_instruction(&["  ", "\t"]), None);
    }
}
