//! Cross-platform filesystem helpers used throughout the `Ensure`
//! pipeline: directory creation/removal, and symlink materialization
//! for the vendor tree.

use anyhow::{Context, Result};
use std::path::Path;

/// Ensure a directory (and its parents) exists.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory: {}", path.display()))?;
    } else if !path.is_dir() {
        anyhow::bail!("path exists but is not a directory: {}", path.display());
    }
    Ok(())
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    Ok(())
}

/// Recursively remove a directory if it exists; a no-op otherwise.
pub fn remove_dir_all(path: &Path) -> Result<()> {
    if path.exists() {
        std::fs::remove_dir_all(path)
            .with_context(|| format!("failed to remove directory: {}", path.display()))?;
    }
    Ok(())
}

/// Purge and recreate a directory, leaving it empty. Used before
/// staging a fresh download so no content from a previously failed
/// fetch survives.
pub fn purge_and_recreate(path: &Path) -> Result<()> {
    remove_dir_all(path)?;
    ensure_dir(path)
}

/// Remove whatever currently occupies `path` — file, directory, or
/// symlink — without erroring if nothing is there.
pub fn remove_any(path: &Path) -> Result<()> {
    let meta = match std::fs::symlink_metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e).with_context(|| format!("failed to stat: {}", path.display())),
    };
    if meta.is_dir() && !meta.file_type().is_symlink() {
        remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
            .with_context(|| format!("failed to remove: {}", path.display()))
    }
}

/// Create a symlink at `link` pointing to `target`, replacing whatever
/// is currently at `link` (file, directory, or stale symlink).
/// Parent directories of `link` are created as needed.
pub fn replace_symlink(link: &Path, target: &Path) -> Result<()> {
    ensure_parent_dir(link)?;
    remove_any(link)?;
    symlink::symlink_auto(target, link)
        .with_context(|| format!("failed to link {} -> {}", link.display(), target.display()))?;
    Ok(())
}

/// True if `path` is a symlink (does not follow it).
pub fn is_symlink(path: &Path) -> bool {
    std::fs::symlink_metadata(path).map(|m| m.file_type().is_symlink()).unwrap_or(false)
}
