//! Cache path resolution and concurrency-safe staging (spec §4.3).
//!
//! `cache_path` maps a `(name, version)` pair to a stable staging
//! directory under a cache root. By default that root is
//! `<vendor_dir>/.cache` (spec §6), but [`crate::config::GlobalConfig`]
//! lets a host override it, so every function here takes the resolved
//! cache root directly rather than deriving it from `vendor_dir`
//! itself — the caller (`cli::install`) is the one place that knows
//! about global configuration; this module stays as agnostic of it as
//! the spec's own core is.
//!
//! The cache layout intentionally does *not* mirror the vendor layout:
//! it is keyed by name *and* version, so two versions of the same
//! package can be staged side by side without colliding, at the cost
//! of duplicating identical content across versions — an explicit
//! trade-off the spec calls out (§9 Design Notes) in favor of
//! simplicity over a true content-addressed store.
//!
//! [`CacheGuard`] adds the one piece of cross-process safety the spec's
//! concurrency model doesn't itself require but the teacher project
//! always provides for its own Git cache: an advisory file lock so two
//! concurrent `jb` invocations staging the same `(name, version)` don't
//! race on the same purge-then-recreate directory.

use anyhow::{Context, Result};
use fs4::fs_std::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::utils::path::percent_encode_component;

/// The name of the staging root beneath `vendor_dir`, in the default
/// (unconfigured) layout. Never pruned or treated as part of the
/// published vendor tree (spec §3 invariant 5).
pub const CACHE_DIR_NAME: &str = ".cache";

/// Staging directory for `name` at `version` beneath `cache_root`.
#[must_use]
pub fn cache_path(cache_root: &Path, name: &str, version: &str) -> PathBuf {
    let key = percent_encode_component(&format!("{name}-{version}"));
    cache_root.join(key)
}

/// An exclusive, process-scoped lock over one cache entry. Held for the
/// duration of a purge-recreate-fetch cycle; released on drop.
pub struct CacheGuard {
    _file: File,
    path: PathBuf,
}

impl CacheGuard {
    /// Acquire the lock for `name`@`version`'s cache entry, blocking
    /// (off the async runtime, via `spawn_blocking`) until it's free.
    pub async fn acquire(cache_root: &Path, name: &str, version: &str) -> Result<Self> {
        let locks_dir = cache_root.join(".locks");
        crate::utils::fs::ensure_dir(&locks_dir)?;

        let key = percent_encode_component(&format!("{name}-{version}"));
        let lock_path = locks_dir.join(format!("{key}.lock"));
        let lock_path_clone = lock_path.clone();

        let file = tokio::task::spawn_blocking(move || -> Result<File> {
            let file = OpenOptions::new()
                .create(true)
                .truncate(false)
                .write(true)
                .open(&lock_path_clone)
                .with_context(|| format!("failed to open lock file {}", lock_path_clone.display()))?;
            file.lock_exclusive()
                .with_context(|| format!("failed to lock {}", lock_path_clone.display()))?;
            Ok(file)
        })
        .await
        .context("lock acquisition task panicked")??;

        Ok(Self { _file: file, path: lock_path })
    }
}

impl Drop for CacheGuard {
    fn drop(&mut self) {
        let _ = fs4::fs_std::FileExt::unlock(&self._file);
        let _ = &self.path;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_path_is_keyed_by_name_and_version() {
        let root = Path::new("/vendor/.cache");
        let a = cache_path(root, "org/pkg", "v1");
        let b = cache_path(root, "org/pkg", "v2");
        assert_ne!(a, b);
        assert!(a.starts_with(root));
    }

    #[test]
    fn cache_path_is_safe_for_slashy_names() {
        let root = Path::new("/vendor/.cache");
        let p = cache_path(root, "org/repo/pkg", "main");
        // single path component beneath the cache root, no literal slash from the name
        assert_eq!(p.parent().unwrap(), root);
    }
}
