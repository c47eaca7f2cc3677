//! Session module - the conversation and the loop that extends it
//!
//! - `ChatLog`: the persisted, value-like transcript
//! - `SystemPrompt`: seeds a fresh log
//! - `AgentLoop`: runs one turn against the completion service and tools
//!
//! # Example Usage
//!
//! ```ignore
//! let log = ChatLog::load(&path, &SystemPrompt::from_environment(), Local::now()).await?;
//! let log = log.add_user_message("stage and commit the docs", Local::now());
//!
//! let outcome = agent.run_turn(log, &cancel).await?;
//! ChatLog::persist_outcome(&outcome, &path).await?;
//! ```

mod agent_loop;
mod chat_log;
mod system_prompt;
mod types;

pub use agent_loop::AgentLoop;
pub use chat_log::ChatLog;
pub use system_prompt::{SystemPrompt, USER_TIMESTAMP_FORMAT};
pub use types::{
    join_instruction, Message, Role, SessionOutput, ToolCall, TurnOutcome, TurnStatus,
};
