//! Single-package fetch (spec §4.4): decide download vs. reuse, stage,
//! and verify integrity for exactly one dependency.

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::cache::{CacheGuard, cache_path};
use crate::core::JbError;
use crate::hash::hash_directory;
use crate::manifest::{Dependency, Source};
use crate::source;

/// Result of fetching one dependency: its record with version/sum
/// resolved, and the directory holding its actual content (used by the
/// downloader to look for a nested manifest, and by the linker as the
/// symlink target).
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    /// The dependency with `version` and `sum` filled in.
    pub dependency: Dependency,
    /// Directory containing the package's own files.
    pub content_dir: PathBuf,
}

/// Fetch (or reuse) one dependency.
///
/// `referencing_manifest_dir` is the directory of the manifest that
/// declared `dep` — required by the local driver, which must resolve
/// relative to it rather than to the orchestrator's own working
/// directory (spec §4.1, §9 Design Notes).
///
/// `cache_root` is the resolved staging root for this run (normally
/// `vendor_dir/.cache`, but see [`crate::config::GlobalConfig`]).
///
/// `locked` is this name's pre-existing lock entry, if any.
pub async fn fetch_one(
    dep: &Dependency,
    cache_root: &Path,
    referencing_manifest_dir: &Path,
    locked: Option<&Dependency>,
) -> Result<FetchOutcome> {
    match &dep.source {
        Source::Local { path } => fetch_local(dep, path, referencing_manifest_dir),
        Source::Remote { url, subdir } => fetch_remote(dep, url, subdir, cache_root, locked).await,
    }
}

fn fetch_local(dep: &Dependency, path: &str, referencing_manifest_dir: &Path) -> Result<FetchOutcome> {
    let content_dir = source::resolve_local(&dep.name, path, referencing_manifest_dir)?;
    let mut resolved = dep.clone();
    resolved.version.clear();
    resolved.sum.clear();
    Ok(FetchOutcome { dependency: resolved, content_dir })
}

async fn fetch_remote(
    dep: &Dependency,
    url: &str,
    subdir: &str,
    cache_root: &Path,
    locked: Option<&Dependency>,
) -> Result<FetchOutcome> {
    // Step 1: a prior lock entry pins the requested version — already
    // an immutable commit, never a branch — and gives us an expected
    // sum to verify the existing cache entry against, with no network
    // access needed if it still matches.
    let (requested_version, expected_sum) = match locked {
        Some(locked_dep) => (locked_dep.version.clone(), Some(locked_dep.sum.clone())),
        None => (dep.version.clone(), None),
    };

    if let Some(expected) = expected_sum.as_deref().filter(|s| !s.is_empty()) {
        let staging_dir = cache_path(cache_root, &dep.name, &requested_version);
        let content_dir = staging_dir.join(&dep.name);
        if content_dir.is_dir() {
            if let Ok(actual) = hash_directory(&content_dir) {
                if actual == expected {
                    let mut resolved = dep.clone();
                    resolved.version = requested_version;
                    resolved.sum = actual;
                    return Ok(FetchOutcome { dependency: resolved, content_dir });
                }
            }
        }
    }

    // Step 2: not intact (or nothing locked yet) — clone to resolve
    // `requested_version`, which may still be symbolic (a branch or
    // tag) when nothing was locked yet, to an immutable commit. The
    // cache must be keyed by *that* resolved commit rather than by the
    // requested version: the linker rebuilds each vendor symlink's
    // target from the lock's resolved version (spec §4.6), so staging
    // under the symbolic key here would leave that link dangling.
    let _guard = CacheGuard::acquire(cache_root, &dep.name, &requested_version).await?;
    let clone = source::clone_remote(url, subdir, &requested_version).await?;
    let staging_dir = cache_path(cache_root, &dep.name, &clone.resolved_version);
    source::stage_remote(&clone.content_root, &staging_dir, &dep.name)?;
    let content_dir = staging_dir.join(&dep.name);
    let actual_sum = hash_directory(&content_dir)?;

    // Step 3: integrity check against a known-good sum, if any.
    if let Some(expected) = expected_sum.as_deref().filter(|s| !s.is_empty()) {
        if expected != actual_sum {
            return Err(JbError::IntegrityMismatch {
                name: dep.name.clone(),
                expected: expected.to_string(),
                actual: actual_sum,
            }
            .into());
        }
    }

    let mut resolved = dep.clone();
    resolved.version = clone.resolved_version;
    resolved.sum = actual_sum;
    Ok(FetchOutcome { dependency: resolved, content_dir })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_local_resolves_relative_to_referencing_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let manifest_dir = dir.path().join("pkg_a");
        let dep_dir = dir.path().join("pkg_b");
        std::fs::create_dir_all(&manifest_dir).unwrap();
        std::fs::create_dir_all(&dep_dir).unwrap();

        let dep = Dependency {
            name: "pkg_b".to_string(),
            source: Source::Local { path: "../pkg_b".to_string() },
            version: String::new(),
            sum: String::new(),
            legacy_name_compat: None,
            single: false,
        };

        let outcome = fetch_local(&dep, "../pkg_b", &manifest_dir).unwrap();
        assert_eq!(outcome.content_dir, dep_dir);
        assert!(outcome.dependency.sum.is_empty());
    }

    #[test]
    fn fetch_local_missing_directory_errors() {
        let dir = tempfile::tempdir().unwrap();
        let dep = Dependency {
            name: "missing".to_string(),
            source: Source::Local { path: "../nope".to_string() },
            version: String::new(),
            sum: String::new(),
            legacy_name_compat: None,
            single: false,
        };
        let err = fetch_local(&dep, "../nope", dir.path());
        assert!(err.is_err());
    }
}
