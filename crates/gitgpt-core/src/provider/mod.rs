//! LLM completion service
//!
//! The agent loop talks to the model through the `CompletionService` trait.
//! `GenAIProvider` implements it on top of the genai framework, which covers
//! OpenAI, Anthropic, Gemini, DeepSeek, xAI and local Ollama models.

pub mod factory;
mod genai_provider;
mod logging;

pub use factory::{create_provider_from_config, get_api_key};
pub use genai_provider::{create_provider, GenAIProvider};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::session::{Message, ToolCall};
use crate::tools::ToolDefinition;

/// Sampling temperature used for every request unless configured otherwise.
///
/// Non-zero so replies vary in phrasing.
pub const DEFAULT_TEMPERATURE: f64 = 0.8;

/// Supported LLM provider types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    /// OpenAI (GPT-4o, etc.)
    OpenAI,
    /// Anthropic (Claude)
    Anthropic,
    /// Google Gemini
    Gemini,
    /// DeepSeek
    DeepSeek,
    /// xAI (Grok)
    XAI,
    /// Ollama (local)
    Ollama,
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProviderType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(ProviderType::OpenAI),
            "anthropic" => Ok(ProviderType::Anthropic),
            "gemini" | "google" => Ok(ProviderType::Gemini),
            "deepseek" => Ok(ProviderType::DeepSeek),
            "xai" | "grok" => Ok(ProviderType::XAI),
            "ollama" => Ok(ProviderType::Ollama),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

impl ProviderType {
    /// Get the provider type as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderType::OpenAI => "openai",
            ProviderType::Anthropic => "anthropic",
            ProviderType::Gemini => "gemini",
            ProviderType::DeepSeek => "deepseek",
            ProviderType::XAI => "xai",
            ProviderType::Ollama => "ollama",
        }
    }

    /// Get the default model for this provider
    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderType::OpenAI => "gpt-4o",
            ProviderType::Anthropic => "claude-sonnet-4-20250514",
            ProviderType::Gemini => "gemini-2.0-flash",
            ProviderType::DeepSeek => "deepseek-chat",
            ProviderType::XAI => "grok-3",
            ProviderType::Ollama => "llama3.1",
        }
    }

    /// Get the environment variable name for the API key
    pub fn api_key_env(&self) -> Option<&'static str> {
        match self {
            ProviderType::OpenAI => Some("OPENAI_API_KEY"),
            ProviderType::Anthropic => Some("ANTHROPIC_API_KEY"),
            ProviderType::Gemini => Some("GEMINI_API_KEY"),
            ProviderType::DeepSeek => Some("DEEPSEEK_API_KEY"),
            ProviderType::XAI => Some("XAI_API_KEY"),
            ProviderType::Ollama => None,
        }
    }
}

/// One completion request: the whole transcript plus the tool list
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub messages: &'a [Message],
    pub tools: &'a [ToolDefinition],
    pub temperature: f64,
}

/// One candidate reply from the model
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionResult {
    /// Text content from the assistant (may be present even with tool calls)
    pub content: Option<String>,
    /// Tool calls requested by the assistant, in the order given
    pub tool_calls: Vec<ToolCall>,
}

impl CompletionResult {
    /// Check if this result has any tool calls
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// A chat completion backend
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Send the request and return zero or more candidate replies
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<Vec<CompletionResult>>;
}
