//! GenAI-based LLM provider implementation
//!
//! Uses the genai framework with manual tool control: tool calls come back to
//! the agent loop instead of being executed by the framework.

use std::time::Duration;

use async_trait::async_trait;
use genai::chat::{
    ChatMessage, ChatOptions, ChatRequest, ContentPart, MessageContent, Tool,
    ToolCall as GenAIToolCall, ToolResponse,
};
use genai::resolver::{AuthData, AuthResolver};
use genai::{Client, WebConfig};
use tracing::debug;

use super::logging::{log_llm_interaction, LogConfig};
use super::{CompletionRequest, CompletionResult, CompletionService, ProviderType};
use crate::error::{Error, Result};
use crate::session::{Message, Role, ToolCall};
use crate::tools::ToolDefinition;

/// A provider implementation using genai
pub struct GenAIProvider {
    client: Client,
    provider_type: ProviderType,
    model: String,
}

impl GenAIProvider {
    /// Default timeout for LLM API requests (5 minutes)
    const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

    /// Create WebConfig with appropriate timeouts for LLM requests
    fn default_web_config() -> WebConfig {
        WebConfig::default()
            .with_timeout(Self::DEFAULT_TIMEOUT)
            .with_connect_timeout(Duration::from_secs(30))
    }

    /// Create a new provider with default settings (uses environment variables for auth)
    pub fn new(provider_type: ProviderType, model: Option<&str>) -> Self {
        let client = Client::builder()
            .with_web_config(Self::default_web_config())
            .build();
        Self {
            client,
            provider_type,
            model: model.unwrap_or(provider_type.default_model()).to_string(),
        }
    }

    /// Create a provider with a specific API key
    pub fn with_api_key(provider_type: ProviderType, api_key: &str, model: Option<&str>) -> Self {
        let api_key = api_key.to_string();
        let auth_resolver = AuthResolver::from_resolver_fn(
            move |_model_iden| -> std::result::Result<Option<AuthData>, genai::resolver::Error> {
                Ok(Some(AuthData::from_single(api_key.clone())))
            },
        );

        let client = Client::builder()
            .with_web_config(Self::default_web_config())
            .with_auth_resolver(auth_resolver)
            .build();

        Self {
            client,
            provider_type,
            model: model.unwrap_or(provider_type.default_model()).to_string(),
        }
    }

    /// Get the provider type
    pub fn provider_type(&self) -> ProviderType {
        self.provider_type
    }

    /// Get the model name
    pub fn model(&self) -> &str {
        &self.model
    }
}

/// Convert the transcript and tool list into a genai request
fn build_chat_request(messages: &[Message], tools: &[ToolDefinition]) -> ChatRequest {
    let mut chat_req = ChatRequest::default();

    for msg in messages {
        chat_req = match msg.role {
            Role::System => chat_req.append_message(ChatMessage::system(msg.text())),
            Role::User => chat_req.append_message(ChatMessage::user(msg.text())),
            Role::Assistant if msg.has_tool_calls() => {
                // Narration and tool calls go out as one assistant message
                let mut parts = Vec::with_capacity(msg.tool_calls.len() + 1);
                if !msg.text().is_empty() {
                    parts.push(ContentPart::Text(msg.text().to_string()));
                }
                parts.extend(msg.tool_calls.iter().map(|tc| {
                    ContentPart::ToolCall(GenAIToolCall {
                        call_id: tc.id.clone(),
                        fn_name: tc.name.clone(),
                        fn_arguments: tc.arguments.clone(),
                        thought_signatures: None,
                    })
                }));
                chat_req.append_message(ChatMessage::assistant(MessageContent::from_parts(parts)))
            }
            Role::Assistant => chat_req.append_message(ChatMessage::assistant(msg.text())),
            Role::Tool => {
                let call_id = msg.tool_call_id.clone().unwrap_or_default();
                chat_req.append_message(ToolResponse::new(call_id, msg.text().to_string()))
            }
        };
    }

    if !tools.is_empty() {
        let genai_tools: Vec<Tool> = tools
            .iter()
            .map(|t| {
                Tool::new(&t.name)
                    .with_description(&t.description)
                    .with_schema(t.parameters.clone())
            })
            .collect();
        chat_req = chat_req.with_tools(genai_tools);
    }

    chat_req
}

/// Tool arguments sometimes arrive as a JSON-encoded string
fn normalize_arguments(arguments: serde_json::Value) -> serde_json::Value {
    match arguments {
        serde_json::Value::String(raw) => {
            serde_json::from_str(&raw).unwrap_or(serde_json::Value::String(raw))
        }
        serde_json::Value::Null => serde_json::json!({}),
        other => other,
    }
}

#[async_trait]
impl CompletionService for GenAIProvider {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<Vec<CompletionResult>> {
        let chat_req = build_chat_request(request.messages, request.tools);
        let options = ChatOptions::default().with_temperature(request.temperature);

        debug!(
            model = %self.model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "Sending completion request"
        );

        let response = match self.client.exec_chat(&self.model, chat_req, Some(&options)).await {
            Ok(response) => response,
            Err(e) => {
                // Use Debug format to get full error chain
                let error_msg = format!("GenAI error: {:?}", e);
                log_llm_interaction(LogConfig {
                    model: &self.model,
                    messages: request.messages,
                    tools: Some(request.tools),
                    error: Some(&error_msg),
                    ..Default::default()
                });
                tracing::error!(error = ?e, model = %self.model, "LLM request failed");
                return Err(Error::Provider(error_msg));
            }
        };

        let content = response.content.joined_texts().filter(|c| !c.is_empty());
        let tool_calls = response
            .into_tool_calls()
            .into_iter()
            .map(|tc| ToolCall::new(tc.call_id, tc.fn_name, normalize_arguments(tc.fn_arguments)))
            .collect();

        let result = CompletionResult { content, tool_calls };

        log_llm_interaction(LogConfig {
            model: &self.model,
            messages: request.messages,
            tools: Some(request.tools),
            result: Some(&result),
            ..Default::default()
        });

        // genai exposes a single choice per response
        Ok(vec![result])
    }
}

/// Create a provider from an optional API key and model override
pub fn create_provider(
    provider_type: ProviderType,
    api_key: Option<&str>,
    model: Option<&str>,
) -> GenAIProvider {
    match api_key {
        Some(key) => GenAIProvider::with_api_key(provider_type, key, model),
        None => GenAIProvider::new(provider_type, model),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_arguments() {
        assert_eq!(
            normalize_arguments(json!(r#"{"files":["a"]}"#)),
            json!({ "files": ["a"] })
        );
        assert_eq!(normalize_arguments(json!(null)), json!({}));
        assert_eq!(normalize_arguments(json!("not json")), json!("not json"));
    }

    #[test]
    fn test_assistant_narration_kept_with_tool_calls() {
        let messages = vec![
            Message::user("stage the readme"),
            Message::assistant(
                "I will stage README first.",
                vec![ToolCall::new("c1", "GitStatus", json!({}))],
            ),
            Message::tool("c1", "Current branch: refs/heads/main\n"),
        ];

        let req = build_chat_request(&messages, &[]);

        assert_eq!(req.messages.len(), 3);
        let assistant = &req.messages[1].content;
        assert_eq!(
            assistant.joined_texts().as_deref(),
            Some("I will stage README first.")
        );
        assert_eq!(assistant.tool_calls().len(), 1);
        assert_eq!(assistant.tool_calls()[0].call_id, "c1");
    }

    #[test]
    fn test_provider_uses_default_model() {
        let provider = create_provider(ProviderType::OpenAI, Some("sk-test"), None);
        assert_eq!(provider.model(), "gpt-4o");
        assert_eq!(provider.provider_type(), ProviderType::OpenAI);

        let provider = create_provider(ProviderType::Anthropic, None, Some("claude-3-5-haiku-latest"));
        assert_eq!(provider.model(), "claude-3-5-haiku-latest");
    }
}
