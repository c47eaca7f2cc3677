//! Git tool handlers
//!
//! Each handler calls the version-control backend and renders a short text
//! result. Backend failures are rendered too, never propagated.

use std::fmt::Write;

use tracing::warn;

use super::ToolOutput;
use crate::error::GitError;
use crate::vcs::{RepoStatus, VersionControl};

pub(super) async fn status(vcs: &dyn VersionControl) -> ToolOutput {
    match vcs.status().await {
        Ok(status) => ToolOutput::success(render_status(&status)),
        Err(e) => failed("GitStatus", e),
    }
}

pub(super) async fn stage(vcs: &dyn VersionControl, files: &[String]) -> ToolOutput {
    if files.is_empty() {
        return ToolOutput::error("Error: no files were given to stage.");
    }
    if let Err(e) = vcs.stage(files).await {
        return failed("GitStage", e);
    }
    staged_listing(vcs, "GitStage").await
}

pub(super) async fn unstage(vcs: &dyn VersionControl, files: &[String]) -> ToolOutput {
    if files.is_empty() {
        return ToolOutput::error("Error: no files were given to unstage.");
    }
    if let Err(e) = vcs.unstage(files).await {
        return failed("GitUnstage", e);
    }
    staged_listing(vcs, "GitUnstage").await
}

pub(super) async fn commit(vcs: &dyn VersionControl, message: &str) -> ToolOutput {
    if message.trim().is_empty() {
        return ToolOutput::error("Error: the commit message is empty.");
    }
    match vcs.commit(message).await {
        Ok(info) => ToolOutput::success(format!(
            "Commit {} created for author {}.",
            info.sha, info.author
        )),
        Err(e) => failed("GitCommit", e),
    }
}

async fn staged_listing(vcs: &dyn VersionControl, tool: &str) -> ToolOutput {
    match vcs.status().await {
        Ok(status) => {
            let mut out = String::from("Staged files:\n");
            for path in &status.staged {
                let _ = writeln!(out, "- {path}");
            }
            ToolOutput::success(out)
        }
        Err(e) => failed(tool, e),
    }
}

fn failed(tool: &str, error: GitError) -> ToolOutput {
    warn!(tool, error = %error, "Git operation failed");
    let text = match error {
        GitError::NothingStaged => {
            "Error: nothing is staged for commit. Stage files with GitStage first.".to_string()
        }
        other => format!("Error: {other}"),
    };
    ToolOutput::error(text)
}

/// Render a status snapshot; empty sections are left out
pub(crate) fn render_status(status: &RepoStatus) -> String {
    let mut out = format!("Current branch: {}\n", status.branch);
    let sections = [
        ("Staged for commit:", &status.staged),
        ("Modified:", &status.modified),
        ("Deleted:", &status.missing),
        ("Untracked:", &status.untracked),
    ];
    for (title, paths) in sections {
        if paths.is_empty() {
            continue;
        }
        out.push_str(title);
        out.push('\n');
        for path in paths {
            let _ = writeln!(out, " - {path}");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_status_skips_empty_sections() {
        let status = RepoStatus {
            branch: "refs/heads/main".into(),
            staged: vec!["src/lib.rs".into()],
            untracked: vec!["notes.md".into()],
            ..Default::default()
        };

        assert_eq!(
            render_status(&status),
            "Current branch: refs/heads/main\n\
             Staged for commit:\n - src/lib.rs\n\
             Untracked:\n - notes.md\n"
        );
    }

    #[test]
    fn test_render_clean_status() {
        let status = RepoStatus {
            branch: "refs/heads/main".into(),
            ..Default::default()
        };
        assert_eq!(render_status(&status), "Current branch: refs/heads/main\n");
    }
}
