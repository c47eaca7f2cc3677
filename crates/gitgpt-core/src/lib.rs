//! GitGPT Core - a chat agent that drives git
//!
//! This crate provides:
//! - The persisted chat log and its system prompt
//! - The git tool set the model may call
//! - The agent loop that turns one instruction into tool calls and a reply
//! - Completion providers and configuration

pub mod config;
pub mod error;
pub mod provider;
pub mod session;
pub mod tools;
pub mod vcs;

pub use config::{Config, ConfigManager, GeneralConfig, ProviderConfig};
pub use error::{Error, GitError, Result};
pub use provider::{
    create_provider, create_provider_from_config, CompletionRequest, CompletionResult,
    CompletionService, GenAIProvider, ProviderType,
};
pub use session::{
    join_instruction, AgentLoop, ChatLog, Message, Role, SessionOutput, SystemPrompt, ToolCall,
    TurnOutcome, TurnStatus,
};
pub use tools::{ToolDefinition, ToolKind, ToolOutput, ToolRegistry};
pub use vcs::{CommitInfo, GitCli, RepoStatus, VersionControl};
