//! LLM request/response logging
//!
//! Set the `GITGPT_LLM_LOG` environment variable to a file path to append one
//! JSON line per completion request, including the full transcript sent.
//!
//! Example: `GITGPT_LLM_LOG=/tmp/llm.log gitgpt stage everything`

use serde_json::json;
use std::io::Write;
use tracing::{debug, warn};

use super::CompletionResult;
use crate::session::Message;
use crate::tools::ToolDefinition;

/// Environment variable naming the log file
pub const LLM_LOG_ENV: &str = "GITGPT_LLM_LOG";

/// What to include in the log entry
#[derive(Default)]
pub struct LogConfig<'a> {
    /// The model used for this request
    pub model: &'a str,
    /// Messages in the request
    pub messages: &'a [Message],
    /// Tools available for the request
    pub tools: Option<&'a [ToolDefinition]>,
    /// Parsed completion result
    pub result: Option<&'a CompletionResult>,
    /// Error message if the request failed
    pub error: Option<&'a str>,
}

fn entry_json(config: &LogConfig<'_>) -> serde_json::Value {
    json!({
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "model": config.model,
        "request": {
            "messages": config.messages,
            "message_count": config.messages.len(),
            "tools": config.tools.map(|t| t.iter().map(|tool| tool.name.as_str()).collect::<Vec<_>>()),
        },
        "response": config.result.map(|r| json!({
            "type": if r.has_tool_calls() { "tool_calls" } else { "message" },
            "content": r.content,
            "tool_calls": r.tool_calls,
        })),
        "error": config.error,
    })
}

/// Append an interaction to the log file if `GITGPT_LLM_LOG` is set
pub fn log_llm_interaction(config: LogConfig<'_>) {
    let Ok(log_file) = std::env::var(LLM_LOG_ENV) else {
        return;
    };

    let entry = entry_json(&config);

    match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file)
    {
        Ok(mut file) => {
            if let Err(e) = writeln!(file, "{}", serde_json::to_string(&entry).unwrap_or_default()) {
                warn!("Failed to write to LLM log file: {}", e);
            }
        }
        Err(e) => {
            warn!("Failed to open LLM log file {}: {}", log_file, e);
        }
    }

    debug!("Logged LLM interaction to {}", log_file);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_includes_transcript_and_tool_names() {
        let messages = vec![Message::user("[2024-01-01T00:00:00]: hi")];
        let tools = vec![crate::tools::ToolKind::GitStatus.to_definition()];
        let result = CompletionResult {
            content: Some("Hello".into()),
            tool_calls: Vec::new(),
        };
        let entry = entry_json(&LogConfig {
            model: "gpt-4o",
            messages: &messages,
            tools: Some(&tools),
            result: Some(&result),
            error: None,
        });

        assert_eq!(entry["model"], "gpt-4o");
        assert_eq!(entry["request"]["message_count"], 1);
        assert_eq!(entry["request"]["tools"][0], "GitStatus");
        assert_eq!(entry["response"]["type"], "message");
    }
}
