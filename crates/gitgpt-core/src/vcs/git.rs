//! `git` command-line backend

use std::path::PathBuf;
use std::process::Output;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::{CommitInfo, RepoStatus, VersionControl};
use crate::error::GitError;

/// Runs `git` in a fixed working directory
#[derive(Debug, Clone)]
pub struct GitCli {
    workdir: PathBuf,
}

impl GitCli {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    /// Run git and return the raw process output, whatever the exit status
    async fn run_raw(&self, args: &[&str]) -> Result<Output, GitError> {
        debug!(args = ?args, "Running git");
        Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .env("LC_ALL", "C")
            .env("GIT_TERMINAL_PROMPT", "0")
            .output()
            .await
            .map_err(GitError::Spawn)
    }

    /// Run git and return stdout, mapping a non-zero exit to an error
    async fn run(&self, args: &[&str]) -> Result<String, GitError> {
        let output = self.run_raw(args).await?;
        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            Err(failure(args, &output))
        }
    }

    async fn has_head(&self) -> Result<bool, GitError> {
        let output = self.run_raw(&["rev-parse", "--verify", "-q", "HEAD"]).await?;
        match output.status.code() {
            Some(0) => Ok(true),
            Some(1) => Ok(false),
            _ => Err(failure(&["rev-parse", "--verify", "-q", "HEAD"], &output)),
        }
    }

    async fn current_branch(&self) -> Result<String, GitError> {
        let args = ["symbolic-ref", "-q", "HEAD"];
        let output = self.run_raw(&args).await?;
        match output.status.code() {
            Some(0) => Ok(String::from_utf8_lossy(&output.stdout).trim().to_string()),
            // HEAD is not a symbolic ref
            Some(1) => Ok("HEAD (detached)".to_string()),
            _ => Err(failure(&args, &output)),
        }
    }
}

#[async_trait]
impl VersionControl for GitCli {
    async fn status(&self) -> Result<RepoStatus, GitError> {
        let branch = self.current_branch().await?;
        let porcelain = self
            .run(&[
                "status",
                "--porcelain=v1",
                "-z",
                "--untracked-files=all",
                "--find-renames",
            ])
            .await?;
        parse_porcelain(&porcelain, branch)
    }

    async fn stage(&self, patterns: &[String]) -> Result<(), GitError> {
        let pathspecs = from_top(patterns);
        let mut args = vec!["add", "--"];
        args.extend(pathspecs.iter().map(String::as_str));
        self.run(&args).await?;
        Ok(())
    }

    async fn unstage(&self, patterns: &[String]) -> Result<(), GitError> {
        let pathspecs = from_top(patterns);
        let mut args = if self.has_head().await? {
            vec!["restore", "--staged", "--"]
        } else {
            // `restore --staged` needs a HEAD to restore from
            vec!["rm", "-r", "--cached", "-q", "--"]
        };
        args.extend(pathspecs.iter().map(String::as_str));
        self.run(&args).await?;
        Ok(())
    }

    async fn commit(&self, message: &str) -> Result<CommitInfo, GitError> {
        let args = ["diff", "--cached", "--quiet"];
        let output = self.run_raw(&args).await?;
        match output.status.code() {
            Some(0) => return Err(GitError::NothingStaged),
            Some(1) => {}
            _ => return Err(failure(&args, &output)),
        }

        self.run(&["commit", "-q", "-m", message]).await?;

        let log = self.run(&["log", "-1", "--format=%H%x00%an"]).await?;
        let (sha, author) = log
            .trim_end()
            .split_once('\0')
            .ok_or_else(|| GitError::Parse(log.clone()))?;
        Ok(CommitInfo {
            sha: sha.to_string(),
            author: author.to_string(),
        })
    }
}

/// Anchor pathspecs at the repository root, where `status` paths are relative
/// to. Patterns already carrying pathspec magic are passed through.
fn from_top(patterns: &[String]) -> Vec<String> {
    patterns
        .iter()
        .map(|p| {
            if p.starts_with(':') {
                p.clone()
            } else {
                format!(":(top){p}")
            }
        })
        .collect()
}

fn failure(args: &[&str], output: &Output) -> GitError {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if stderr.contains("not a git repository") {
        return GitError::NotARepository;
    }
    GitError::CommandFailed {
        command: args.join(" "),
        stderr,
    }
}

/// Parse `git status --porcelain=v1 -z` output.
///
/// Each record is `XY PATH`; renames and copies are followed by an extra
/// record holding the original path.
pub(crate) fn parse_porcelain(output: &str, branch: String) -> Result<RepoStatus, GitError> {
    let mut status = RepoStatus {
        branch,
        ..Default::default()
    };

    let mut records = output.split('\0').filter(|r| !r.is_empty());
    while let Some(record) = records.next() {
        let mut chars = record.chars();
        let (Some(x), Some(y), Some(' ')) = (chars.next(), chars.next(), chars.next()) else {
            return Err(GitError::Parse(record.to_string()));
        };
        let path = chars.as_str();
        if path.is_empty() {
            return Err(GitError::Parse(record.to_string()));
        }
        let path = path.to_string();

        if matches!(x, 'R' | 'C') || matches!(y, 'R' | 'C') {
            records.next();
        }

        match (x, y) {
            ('?', '?') => status.untracked.push(path),
            ('!', '!') => {}
            _ => {
                if x != ' ' {
                    status.staged.push(path.clone());
                }
                match y {
                    'M' | 'T' => status.modified.push(path),
                    'D' => status.missing.push(path),
                    _ => {}
                }
            }
        }
    }

    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_porcelain_classifies_entries() {
        let output = "M  src/lib.rs\0 M README.md\0 D old.txt\0?? notes.md\0MM both.rs\0";
        let status = parse_porcelain(output, "refs/heads/main".into()).unwrap();

        assert_eq!(status.branch, "refs/heads/main");
        assert_eq!(status.staged, vec!["src/lib.rs", "both.rs"]);
        assert_eq!(status.modified, vec!["README.md", "both.rs"]);
        assert_eq!(status.missing, vec!["old.txt"]);
        assert_eq!(status.untracked, vec!["notes.md"]);
    }

    #[test]
    fn test_parse_porcelain_rename_skips_original_path() {
        let output = "R  new name.rs\0old name.rs\0A  added.rs\0";
        let status = parse_porcelain(output, "refs/heads/dev".into()).unwrap();

        assert_eq!(status.staged, vec!["new name.rs", "added.rs"]);
        assert!(status.untracked.is_empty());
    }

    #[test]
    fn test_parse_porcelain_empty_is_clean() {
        let status = parse_porcelain("", "refs/heads/main".into()).unwrap();
        assert_eq!(
            status,
            RepoStatus {
                branch: "refs/heads/main".into(),
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_pathspecs_are_anchored_at_top() {
        let patterns = vec!["src/*.rs".to_string(), ":(exclude)docs".to_string()];
        assert_eq!(from_top(&patterns), vec![":(top)src/*.rs", ":(exclude)docs"]);
    }

    #[test]
    fn test_parse_porcelain_rejects_garbage() {
        assert!(matches!(
            parse_porcelain("XYZ", "HEAD".into()),
            Err(GitError::Parse(_))
        ));
    }
}
