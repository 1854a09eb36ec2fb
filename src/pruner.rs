//! Vendor tree pruning (spec §4.7).
//!
//! After the linker has written every entry the current manifest graph
//! needs, the vendor tree may still hold directories and symlinks left
//! over from a prior run whose manifest has since changed. The pruner
//! removes anything that doesn't belong, using the same bidirectional
//! prefix test in both directions the spec calls out: a directory is
//! kept if it is an *ancestor* of some locked name (so `org/repo` stays
//! when `org/repo/pkg` is locked) or if it is *inside* one (so
//! `org/repo/pkg/internal` stays too). Anything satisfying neither is
//! removed, `.cache` is never visited, and afterward every symlink that
//! doesn't correspond exactly to a lock entry's vendor path is removed
//! as well, leaving the compatibility-link step a clean slate to
//! rebuild from.

use std::collections::HashSet;
use std::path::Path;

use crate::cache::CACHE_DIR_NAME;
use crate::lockfile::Lock;
use crate::utils::fs::remove_any;
use crate::utils::path::{is_prefix_or_prefixed, relative_slash_path};

/// Remove vendor-tree directories with no surviving lock entry, then
/// remove any symlink that isn't exactly one lock entry's vendor path.
pub fn prune(vendor_dir: &Path, lock: &Lock) -> anyhow::Result<()> {
    let names: Vec<&str> = lock.names().collect();
    prune_directories(vendor_dir, vendor_dir, &names)?;
    prune_stray_symlinks(vendor_dir, lock)?;
    Ok(())
}

fn prune_directories(vendor_dir: &Path, dir: &Path, names: &[&str]) -> anyhow::Result<()> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    };

    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type()?;

        if path.file_name().and_then(|n| n.to_str()) == Some(CACHE_DIR_NAME) && path.parent() == Some(vendor_dir) {
            continue;
        }
        if file_type.is_symlink() {
            continue;
        }
        if !file_type.is_dir() {
            continue;
        }

        let rel = relative_slash_path(vendor_dir, &path);
        let keep = names.iter().any(|name| is_prefix_or_prefixed(&rel, name));
        if keep {
            prune_directories(vendor_dir, &path, names)?;
        } else {
            crate::utils::fs::remove_dir_all(&path)?;
        }
    }
    Ok(())
}

fn prune_stray_symlinks(vendor_dir: &Path, lock: &Lock) -> anyhow::Result<()> {
    let wanted: HashSet<std::path::PathBuf> = lock.names().map(|name| vendor_dir.join(name)).collect();
    walk_symlinks(vendor_dir, vendor_dir, &wanted)
}

fn walk_symlinks(vendor_dir: &Path, dir: &Path, wanted: &HashSet<std::path::PathBuf>) -> anyhow::Result<()> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    };

    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type()?;

        if path.file_name().and_then(|n| n.to_str()) == Some(CACHE_DIR_NAME) && path.parent() == Some(vendor_dir) {
            continue;
        }

        if file_type.is_symlink() {
            if !wanted.contains(&path) {
                remove_any(&path)?;
            }
        } else if file_type.is_dir() {
            walk_symlinks(vendor_dir, &path, wanted)?;
        }
    }
    Ok(())
}
