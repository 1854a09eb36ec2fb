//! Source drivers (spec §4.1): the two ways a dependency's content can
//! be materialized — a remote Git repository at some revision, or a
//! directory already on the local filesystem.
//!
//! Both drivers share one contract in spirit (`Install(name, target,
//! requested_version) -> (resolved_version, error)`), but the local
//! driver's output shape differs enough from the remote one — it never
//! copies anything, it just reports where the real content already
//! lives — that each gets its own return type here rather than forcing
//! both through one signature. [`crate::cache`] is what unifies them
//! into a single "where do I stage a symlink to" answer for the linker.

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::core::JbError;

/// A remote dependency cloned into a scratch directory, with its
/// symbolic revision already resolved to an immutable commit.
///
/// The clone lives for as long as this value does — `content_root`
/// points inside it — so callers must stage it into the cache (see
/// [`stage_remote`]) before dropping it.
pub struct RemoteClone {
    /// Immutable commit SHA `requested_version` resolved to.
    pub resolved_version: String,
    /// The declared subdirectory within the clone holding the package.
    pub content_root: PathBuf,
    _scratch: tempfile::TempDir,
}

/// Clone `url` at `requested_version` into a scratch location and
/// resolve it to an immutable commit SHA.
///
/// This must happen *before* the cache key for this fetch is decided:
/// `requested_version` may be symbolic (a branch or tag), and the
/// cache is keyed by the resolved commit so that two different
/// requests which happen to resolve to the same commit share one
/// staging directory (spec §4.3, §6).
pub async fn clone_remote(url: &str, subdir: &str, requested_version: &str) -> Result<RemoteClone> {
    let scratch = tempfile::tempdir()
        .map_err(|e| JbError::io("<tempdir>".to_string(), e))?;
    let resolved_version =
        crate::git::clone_at_revision(url, requested_version, scratch.path()).await?;

    let content_root = if subdir.is_empty() { scratch.path().to_path_buf() } else { scratch.path().join(subdir) };
    if !content_root.is_dir() {
        return Err(JbError::MissingSubdirectory { url: url.to_string(), subdir: subdir.to_string() }.into());
    }

    Ok(RemoteClone { resolved_version, content_root, _scratch: scratch })
}

/// Copy a cloned dependency's content into `target_dir/<name>`,
/// replacing whatever was staged there before.
pub fn stage_remote(content_root: &Path, target_dir: &Path, name: &str) -> Result<()> {
    let dest = target_dir.join(name);
    crate::utils::fs::purge_and_recreate(&dest)?;
    copy_tree(content_root, &dest)?;
    Ok(())
}

/// Install (resolve) a local dependency: interpret `path` relative to
/// the directory of the manifest that declared it, not the process's
/// working directory or the orchestrator's vendor root. No content is
/// copied; the caller links directly to the resolved directory.
///
/// Integrity for local sources is existence-only (spec §1 Non-goals:
/// "no network access for local-source dependencies and does not
/// attempt to validate their contents beyond existence").
pub fn resolve_local(name: &str, path: &str, referencing_manifest_dir: &Path) -> Result<PathBuf> {
    let resolved = referencing_manifest_dir.join(path);
    if !resolved.is_dir() {
        return Err(JbError::LocalSourceMissing { name: name.to_string(), path: resolved.display().to_string() }.into());
    }
    Ok(resolved)
}

fn copy_tree(src: &Path, dst: &Path) -> Result<()> {
    // `.git` is VCS metadata, not package content: its bytes vary
    // clone-to-clone for the same commit (packfiles, reflogs, config),
    // which would make the content hash unstable across refetches of
    // identical upstream content.
    let walker = walkdir::WalkDir::new(src).into_iter().filter_entry(|e| e.file_name() != ".git");
    for entry in walker {
        let entry = entry?;
        let rel = entry.path().strip_prefix(src).unwrap();
        let target = dst.join(rel);
        if entry.file_type().is_dir() {
            crate::utils::fs::ensure_dir(&target)?;
        } else if entry.file_type().is_symlink() {
            let link_target = std::fs::read_link(entry.path())?;
            crate::utils::fs::ensure_parent_dir(&target)?;
            symlink::symlink_auto(&link_target, &target)?;
        } else {
            crate::utils::fs::ensure_parent_dir(&target)?;
            std::fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
