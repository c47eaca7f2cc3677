//! Version-control backend
//!
//! The tools only need four operations from git, expressed by the
//! `VersionControl` trait. `GitCli` implements it by running the `git` binary.

mod git;

pub use git::GitCli;

use async_trait::async_trait;

use crate::error::GitError;

/// Snapshot of the working tree, as reported to the model
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoStatus {
    /// Canonical name of the checked out ref, e.g. `refs/heads/main`
    pub branch: String,
    /// Paths with changes in the index (renames by their new path)
    pub staged: Vec<String>,
    /// Tracked paths modified in the working tree
    pub modified: Vec<String>,
    /// Tracked paths deleted from the working tree
    pub missing: Vec<String>,
    pub untracked: Vec<String>,
}

/// A freshly created commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    pub sha: String,
    pub author: String,
}

#[async_trait]
pub trait VersionControl: Send + Sync {
    /// Current branch plus staged, modified, missing and untracked files
    async fn status(&self) -> Result<RepoStatus, GitError>;

    /// Stage files matching the given pathspec globs
    async fn stage(&self, patterns: &[String]) -> Result<(), GitError>;

    /// Remove files matching the given pathspec globs from the index
    async fn unstage(&self, patterns: &[String]) -> Result<(), GitError>;

    /// Commit what is staged. Fails with `GitError::NothingStaged` rather than
    /// creating an empty commit.
    async fn commit(&self, message: &str) -> Result<CommitInfo, GitError>;
}
