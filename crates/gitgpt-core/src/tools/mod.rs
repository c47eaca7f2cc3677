//! Tool system for the git agent
//!
//! The tool set is closed: every capability the model can invoke is a
//! `ToolKind` variant. Each tool has
//! - a name and description for the LLM
//! - a JSON schema for its parameters
//! - a handler that returns a short text result

mod git;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::session::ToolCall;
use crate::vcs::VersionControl;

/// Output from a tool execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    /// Text fed back to the model as the tool message
    pub content: String,
    /// Whether the tool did what it was asked
    pub success: bool,
    /// The restart tool ran; the caller should discard the persisted log
    pub restart_requested: bool,
}

impl ToolOutput {
    pub fn success(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            success: true,
            restart_requested: false,
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            success: false,
            restart_requested: false,
        }
    }

    fn restart() -> Self {
        Self {
            content: "The session was restarted.".to_string(),
            success: true,
            restart_requested: true,
        }
    }
}

/// Tool definition for LLM consumption
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Every tool the model may call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    RestartSession,
    GitStatus,
    GitStage,
    GitUnstage,
    GitCommit,
}

impl ToolKind {
    /// All tools, in advertisement order
    pub const ALL: [ToolKind; 5] = [
        ToolKind::RestartSession,
        ToolKind::GitStatus,
        ToolKind::GitStage,
        ToolKind::GitUnstage,
        ToolKind::GitCommit,
    ];

    /// Tool name (used by LLM to invoke)
    pub fn name(self) -> &'static str {
        match self {
            ToolKind::RestartSession => "RestartSession",
            ToolKind::GitStatus => "GitStatus",
            ToolKind::GitStage => "GitStage",
            ToolKind::GitUnstage => "GitUnstage",
            ToolKind::GitCommit => "GitCommit",
        }
    }

    /// Resolve a name sent by the model
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub fn description(self) -> &'static str {
        match self {
            ToolKind::RestartSession => "Restarts the chat session.",
            ToolKind::GitStatus => "Get the current status of git in the current directory.",
            ToolKind::GitStage => "Stages files for commit.",
            ToolKind::GitUnstage => "Unstages files.",
            ToolKind::GitCommit => "Commits staged changes with the specified commit message.",
        }
    }

    /// JSON schema for parameters
    pub fn parameters_schema(self) -> Value {
        match self {
            ToolKind::RestartSession | ToolKind::GitStatus => json!({
                "type": "object",
                "properties": {}
            }),
            ToolKind::GitStage => files_schema("Name of file to stage. This can use a glob syntax."),
            ToolKind::GitUnstage => {
                files_schema("Name of file to unstage. This can use a glob syntax.")
            }
            ToolKind::GitCommit => json!({
                "type": "object",
                "properties": {
                    "commitMessage": {
                        "type": "string",
                        "description": "The commit message to use."
                    }
                },
                "required": ["commitMessage"]
            }),
        }
    }

    pub fn to_definition(self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

fn files_schema(item_description: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "files": {
                "type": "array",
                "items": {
                    "type": "string",
                    "description": item_description
                }
            }
        },
        "required": ["files"]
    })
}

#[derive(Debug, Deserialize)]
struct FilesArgs {
    files: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CommitArgs {
    #[serde(rename = "commitMessage")]
    commit_message: String,
}

/// Registry of available tools, read-only once built
#[derive(Clone)]
pub struct ToolRegistry {
    vcs: Arc<dyn VersionControl>,
    definitions: Vec<ToolDefinition>,
}

impl ToolRegistry {
    pub fn new(vcs: Arc<dyn VersionControl>) -> Self {
        Self {
            vcs,
            definitions: ToolKind::ALL.into_iter().map(ToolKind::to_definition).collect(),
        }
    }

    /// Definitions advertised with every completion request
    pub fn definitions(&self) -> &[ToolDefinition] {
        &self.definitions
    }

    /// Run one tool call. Never fails: unknown tools, bad arguments and git
    /// errors all come back as text for the model.
    pub async fn dispatch(&self, call: &ToolCall) -> ToolOutput {
        let Some(kind) = ToolKind::from_name(&call.name) else {
            warn!(tool = %call.name, call_id = %call.id, "Model requested an unknown tool");
            return ToolOutput::error(format!("{} could not be found.", call.name));
        };

        debug!(tool = kind.name(), call_id = %call.id, "Dispatching tool");
        let vcs = self.vcs.as_ref();
        match kind {
            ToolKind::RestartSession => ToolOutput::restart(),
            ToolKind::GitStatus => git::status(vcs).await,
            ToolKind::GitStage => match parse_args::<FilesArgs>(kind, &call.arguments) {
                Ok(args) => git::stage(vcs, &args.files).await,
                Err(output) => output,
            },
            ToolKind::GitUnstage => match parse_args::<FilesArgs>(kind, &call.arguments) {
                Ok(args) => git::unstage(vcs, &args.files).await,
                Err(output) => output,
            },
            ToolKind::GitCommit => match parse_args::<CommitArgs>(kind, &call.arguments) {
                Ok(args) => git::commit(vcs, &args.commit_message).await,
                Err(output) => output,
            },
        }
    }
}

/// Deserialize tool arguments. Some providers deliver them as a JSON string
/// rather than an object.
fn parse_args<T: DeserializeOwned>(kind: ToolKind, arguments: &Value) -> Result<T, ToolOutput> {
    let parsed = match arguments {
        Value::String(raw) => serde_json::from_str(raw),
        other => T::deserialize(other),
    };
    parsed.map_err(|e| {
        ToolOutput::error(format!("Error: invalid arguments for {}: {}", kind.name(), e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_round_trips_every_tool() {
        for kind in ToolKind::ALL {
            assert_eq!(ToolKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(ToolKind::from_name("git_status"), None);
    }

    #[test]
    fn test_array_parameter_schema() {
        let schema = ToolKind::GitStage.parameters_schema();
        assert_eq!(schema["properties"]["files"]["type"], "array");
        assert_eq!(schema["properties"]["files"]["items"]["type"], "string");
        assert_eq!(schema["required"], json!(["files"]));
    }

    #[test]
    fn test_commit_schema_uses_wire_name() {
        let schema = ToolKind::GitCommit.parameters_schema();
        assert_eq!(schema["properties"]["commitMessage"]["type"], "string");
    }

    #[test]
    fn test_parse_args_accepts_string_encoded_json() {
        let args: FilesArgs =
            parse_args(ToolKind::GitStage, &json!(r#"{"files":["a.rs"]}"#)).unwrap();
        assert_eq!(args.files, vec!["a.rs"]);
    }

    #[test]
    fn test_parse_args_reports_missing_parameter() {
        let err = parse_args::<CommitArgs>(ToolKind::GitCommit, &json!({})).unwrap_err();
        assert!(!err.success);
        assert!(err.content.starts_with("Error: invalid arguments for GitCommit"));
    }
}
