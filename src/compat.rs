//! Legacy-import compatibility links (spec §4.8).
//!
//! Active only when a manifest sets `legacy_imports`. Older import paths
//! in this ecosystem referred to packages by a short name — typically
//! the last path segment of a fully-qualified `org/repo/pkg` name —
//! rather than the canonical vendor path. This step recreates that
//! short-name symlink alongside the canonical one, without letting it
//! ever shadow something that's already there for an unrelated reason.

use tracing::warn;

use crate::lockfile::Lock;
use crate::manifest::Dependency;
use crate::utils::fs::{is_symlink, replace_symlink};
use std::path::Path;

/// Create (or refresh) each non-local lock entry's legacy short-name
/// symlink, and drop `legacy_name_compat` overrides that turn out to
/// equal the source-derived default so the persisted lock stays
/// minimal.
pub fn make_compat_links(lock: &mut Lock, vendor_dir: &Path) -> anyhow::Result<()> {
    let names: Vec<String> = lock.names().map(str::to_string).collect();

    for name in &names {
        if let Some(dep) = lock.get(name) {
            if let Some(legacy) = &dep.legacy_name_compat {
                if legacy.as_str() == dep.default_legacy_name() {
                    let mut updated = dep.clone();
                    updated.legacy_name_compat = None;
                    lock.insert(updated);
                }
            }
        }
    }

    for name in &names {
        let Some(dep) = lock.get(name) else { continue };
        if dep.is_local() {
            continue;
        }
        link_one(dep, vendor_dir)?;
    }

    Ok(())
}

fn link_one(dep: &Dependency, vendor_dir: &Path) -> anyhow::Result<()> {
    let alias = dep.legacy_name();
    let alias_path = vendor_dir.join(alias);
    let canonical_path = vendor_dir.join(&dep.name);

    if alias_path == canonical_path {
        return Ok(());
    }

    if alias_path.exists() || is_symlink(&alias_path) {
        let already_ours = std::fs::read_link(&alias_path).map(|t| t == canonical_path).unwrap_or(false);
        if already_ours {
            return Ok(());
        }
        warn!(
            name = %dep.name,
            alias = %alias,
            "skipping legacy compatibility link: {} already exists",
            alias_path.display()
        );
        return Ok(());
    }

    replace_symlink(&alias_path, &canonical_path)
}
