//! Error types for GitGPT Core

use thiserror::Error;

/// Result type alias using GitGPT Error
pub type Result<T> = std::result::Result<T, Error>;

/// GitGPT error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Git error: {0}")]
    Git(#[from] GitError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failures reported by the version-control backend.
///
/// These never abort a turn: tool handlers render them as text so the model
/// can react to them.
#[derive(Error, Debug)]
pub enum GitError {
    #[error("the current directory is not inside a git work tree")]
    NotARepository,

    #[error("nothing is staged for commit")]
    NothingStaged,

    #[error("`git {command}` failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("failed to run git: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("unexpected git output: {0}")]
    Parse(String),
}
