//! The `Ensure` orchestrator (spec §4.9): the one entry point that
//! sequences every other module in this crate into the full
//! download → link → prune → compat pipeline.

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::info;

use crate::compat::make_compat_links;
use crate::downloader::ensure as download_all;
use crate::linker::link;
use crate::lockfile::Lock;
use crate::manifest::Manifest;
use crate::pruner::prune;

/// Run the full pipeline for `manifest`, declared at `manifest_path`,
/// against `old_lock` (the prior lock, or an empty one on first run).
/// Writes the vendor tree under `vendor_dir` and returns the new lock.
///
/// `cache_root` is the resolved staging root the downloader fetches
/// into and the linker recomputes remote symlink targets against —
/// normally `vendor_dir/.cache`, but overridable via
/// [`crate::config::GlobalConfig`]. `max_concurrent_fetches` caps the
/// downloader's fan-out the same way.
///
/// Early-exits on the first terminal error from the downloader (via the
/// linker, which is where recorded fetch failures actually surface) or
/// from linking/pruning itself — but only after every spawned download
/// task has completed (spec §5, §7).
pub async fn run(
    manifest: &Manifest,
    manifest_path: &Path,
    vendor_dir: &Path,
    cache_root: &Path,
    old_lock: Lock,
    max_concurrent_fetches: Option<usize>,
) -> Result<Lock> {
    let manifest_dir = manifest_path.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));

    info!(deps = manifest.dependencies.len(), "starting ensure");

    let downloaded = download_all(
        manifest.dependencies.clone(),
        cache_root.to_path_buf(),
        manifest_dir,
        old_lock,
        max_concurrent_fetches,
    )
    .await;

    let mut lock = Lock::new();
    link(&manifest.dependencies, &downloaded, vendor_dir, cache_root, &mut lock)?;

    prune(vendor_dir, &lock)?;

    if manifest.legacy_imports {
        make_compat_links(&mut lock, vendor_dir)?;
    }

    info!(entries = lock.len(), "ensure complete");
    Ok(lock)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{Dependency, Source};

    fn local_dep(name: &str, path: &str) -> Dependency {
        Dependency {
            name: name.to_string(),
            source: Source::Local { path: path.to_string() },
            version: String::new(),
            sum: String::new(),
            legacy_name_compat: None,
            single: false,
        }
    }

    #[tokio::test]
    async fn fresh_install_of_a_local_dependency_links_and_locks_it() {
        let root = tempfile::tempdir().unwrap();
        let project_dir = root.path().join("project");
        let vendor_dir = project_dir.join("vendor");
        let dep_dir = root.path().join("helper");
        std::fs::create_dir_all(&project_dir).unwrap();
        std::fs::create_dir_all(&vendor_dir).unwrap();
        std::fs::create_dir_all(&dep_dir).unwrap();

        let manifest = Manifest { legacy_imports: false, dependencies: vec![local_dep("helper", "../helper")] };
        let manifest_path = project_dir.join(crate::manifest::FILE_NAME);
        let cache_root = vendor_dir.join(crate::cache::CACHE_DIR_NAME);

        let lock = run(&manifest, &manifest_path, &vendor_dir, &cache_root, Lock::new(), None).await.unwrap();

        assert_eq!(lock.len(), 1);
        assert!(vendor_dir.join("helper").exists());
    }

    #[tokio::test]
    async fn idempotent_on_a_second_run_over_its_own_output() {
        let root = tempfile::tempdir().unwrap();
        let project_dir = root.path().join("project");
        let vendor_dir = project_dir.join("vendor");
        let dep_dir = root.path().join("helper");
        std::fs::create_dir_all(&project_dir).unwrap();
        std::fs::create_dir_all(&vendor_dir).unwrap();
        std::fs::create_dir_all(&dep_dir).unwrap();

        let manifest = Manifest { legacy_imports: false, dependencies: vec![local_dep("helper", "../helper")] };
        let manifest_path = project_dir.join(crate::manifest::FILE_NAME);
        let cache_root = vendor_dir.join(crate::cache::CACHE_DIR_NAME);

        let first = run(&manifest, &manifest_path, &vendor_dir, &cache_root, Lock::new(), None).await.unwrap();
        let second = run(&manifest, &manifest_path, &vendor_dir, &cache_root, first.clone(), None).await.unwrap();

        assert_eq!(first.names().collect::<Vec<_>>(), second.names().collect::<Vec<_>>());
    }
}
