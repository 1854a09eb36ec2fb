//! A thin async wrapper over the system `git` binary.
//!
//! jbpm shells out to `git` rather than linking `libgit2`, for the same
//! reason the teacher project does: maximum compatibility with the
//! user's existing authentication setup (credential helpers, SSH
//! agents, `.netrc`) with none of it passing through our code.
//!
//! This module is intentionally small — it implements exactly the
//! operations the remote [`crate::source`] driver needs (clone at a
//! revision, resolve a symbolic revision to a commit, export a
//! subdirectory) and nothing of the teacher's worktree/caching
//! machinery, which this crate's own [`crate::cache`] module replaces
//! with a simpler content-addressed-by-version staging area.

use anyhow::{Context, Result};
use std::path::Path;
use tokio::process::Command;

use crate::core::JbError;

/// Run `git` with `args` in `cwd`, returning captured stdout on success
/// and a [`JbError::GitCommandFailed`] on a non-zero exit.
async fn run(args: &[&str], cwd: Option<&Path>) -> Result<String> {
    let mut cmd = Command::new("git");
    cmd.args(args);
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }
    let output = cmd.output().await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            JbError::GitNotFound
        } else {
            JbError::Other { message: format!("failed to spawn git: {e}") }
        }
    })?;

    if !output.status.success() {
        return Err(JbError::GitCommandFailed {
            operation: args.join(" "),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
        .into());
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Clone `url` into `target`, checked out at `revision`. Returns the
/// resolved commit SHA.
pub async fn clone_at_revision(url: &str, revision: &str, target: &Path) -> Result<String> {
    crate::utils::fs::ensure_parent_dir(target)?;
    run(&["clone", "--quiet", url, &target.to_string_lossy()], None)
        .await
        .with_context(|| format!("cloning {url}"))?;
    checkout(target, revision)
        .await
        .map_err(|_| JbError::UnknownRevision { url: url.to_string(), revision: revision.to_string() })?;
    resolve_to_sha(target, "HEAD").await
}

/// Check out `revision` (branch, tag, or commit) in the repository at
/// `repo_path`.
pub async fn checkout(repo_path: &Path, revision: &str) -> Result<()> {
    run(&["checkout", "--quiet", revision], Some(repo_path)).await?;
    Ok(())
}

/// Resolve a symbolic revision (branch, tag, `HEAD`, ...) to an
/// immutable commit SHA.
pub async fn resolve_to_sha(repo_path: &Path, revision: &str) -> Result<String> {
    run(&["rev-parse", revision], Some(repo_path)).await
}

/// Whether `git` is reachable on `PATH`.
#[must_use]
pub fn is_git_installed() -> bool {
    which::which("git").is_ok()
}
