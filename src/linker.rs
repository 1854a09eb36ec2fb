//! Deterministic linking phase (spec §4.6).
//!
//! The downloader explores the dependency graph with no ordering
//! guarantees at all — tasks interleave freely, a diamond might resolve
//! from either branch first. The linker restores determinism by
//! re-walking the *same* graph on a single logical thread, strictly in
//! declared order, looking up each node's already-fetched result rather
//! than fetching anything itself. Two manifests that list the same
//! transitive dependency always produce the same lock, because the walk
//! order is fixed by declaration order and "first seen wins" rather than
//! by whichever download happened to finish first.

use std::collections::HashSet;
use std::path::Path;

use crate::cache::cache_path;
use crate::core::JbError;
use crate::downloader::{DownloadKey, DownloadedEntry};
use crate::lockfile::Lock;
use crate::manifest::Dependency;
use crate::utils::fs::replace_symlink;

/// Walk `direct` depth-first in declared order, writing vendor symlinks
/// and lock entries as it goes. `downloaded` is the downloader's output
/// map; `lock` is mutated in place and becomes the returned lock's
/// contents once every stage of `Ensure` has run.
///
/// `cache_root` must be the same resolved staging root the downloader
/// fetched into, so a remote entry's recomputed symlink target lands on
/// the directory that's actually there (spec §8 scenario 1, invariant
/// 3) rather than one keyed by a stale or symbolic version.
///
/// Returns the first graph-inconsistency or recorded fetch error
/// encountered, in declared-order-first traversal — the linker is where
/// the downloader's per-key errors actually surface (spec §7).
pub fn link(
    direct: &[Dependency],
    downloaded: &std::collections::HashMap<DownloadKey, DownloadedEntry>,
    vendor_dir: &Path,
    cache_root: &Path,
    lock: &mut Lock,
) -> Result<(), JbError> {
    let mut seen = HashSet::new();
    link_level(direct, downloaded, vendor_dir, cache_root, lock, &mut seen)
}

fn link_level(
    deps: &[Dependency],
    downloaded: &std::collections::HashMap<DownloadKey, DownloadedEntry>,
    vendor_dir: &Path,
    cache_root: &Path,
    lock: &mut Lock,
    seen: &mut HashSet<String>,
) -> Result<(), JbError> {
    for dep in deps {
        if !seen.insert(dep.name.clone()) {
            continue;
        }

        let key: DownloadKey = (dep.name.clone(), dep.version.clone());
        let entry = downloaded
            .get(&key)
            .ok_or_else(|| JbError::GraphInconsistency { name: dep.name.clone(), version: dep.version.clone() })?;

        if let Some(reason) = &entry.error {
            return Err(JbError::FetchFailed { name: dep.name.clone(), reason: reason.clone() });
        }

        lock.insert(entry.dependency.clone());

        let link_path = vendor_dir.join(&entry.dependency.name);
        let target = if entry.dependency.is_local() {
            entry.content_dir.clone()
        } else {
            cache_path(cache_root, &entry.dependency.name, &entry.dependency.version).join(&entry.dependency.name)
        };
        replace_symlink(&link_path, &target)
            .map_err(|e| JbError::Other { message: format!("failed to link {}: {e:#}", link_path.display()) })?;

        if let Some(nested) = &entry.nested_manifest {
            link_level(&nested.dependencies, downloaded, vendor_dir, cache_root, lock, seen)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::Source;
    use std::collections::HashMap;

    fn remote_dep(name: &str, version: &str) -> Dependency {
        Dependency {
            name: name.to_string(),
            source: Source::Remote { url: "https://example.com/repo.git".to_string(), subdir: String::new() },
            version: version.to_string(),
            sum: "abc".to_string(),
            legacy_name_compat: None,
            single: false,
        }
    }

    fn entry_for(dep: Dependency, content_dir: std::path::PathBuf) -> DownloadedEntry {
        DownloadedEntry { dependency: dep, content_dir, nested_manifest: None, error: None }
    }

    #[test]
    fn transitive_diamond_keeps_first_seen_version() {
        let root = tempfile::tempdir().unwrap();
        let vendor_dir = root.path().join("vendor");
        std::fs::create_dir_all(&vendor_dir).unwrap();

        let c_v1 = remote_dep("C", "v1");
        let c_v2 = remote_dep("C", "v2");
        let b = crate::manifest::Manifest { legacy_imports: false, dependencies: vec![c_v1.clone()] };
        let d = crate::manifest::Manifest { legacy_imports: false, dependencies: vec![c_v2.clone()] };

        let mut downloaded = HashMap::new();
        downloaded.insert(
            ("B".to_string(), String::new()),
            DownloadedEntry {
                dependency: remote_dep("B", ""),
                content_dir: root.path().join("b"),
                nested_manifest: Some(b),
                error: None,
            },
        );
        downloaded.insert(
            ("D".to_string(), String::new()),
            DownloadedEntry {
                dependency: remote_dep("D", ""),
                content_dir: root.path().join("d"),
                nested_manifest: Some(d),
                error: None,
            },
        );
        downloaded.insert(("C".to_string(), "v1".to_string()), entry_for(c_v1, root.path().join("c1")));
        downloaded.insert(("C".to_string(), "v2".to_string()), entry_for(c_v2, root.path().join("c2")));

        let direct = vec![remote_dep("B", ""), remote_dep("D", "")];
        let mut lock = Lock::new();
        let cache_root = vendor_dir.join(".cache");
        link(&direct, &downloaded, &vendor_dir, &cache_root, &mut lock).unwrap();

        assert_eq!(lock.get("C").unwrap().version, "v1");
        assert!(vendor_dir.join("C").exists());
    }

    #[test]
    fn missing_downloader_result_is_a_graph_inconsistency() {
        let root = tempfile::tempdir().unwrap();
        let vendor_dir = root.path().join("vendor");
        std::fs::create_dir_all(&vendor_dir).unwrap();

        let direct = vec![remote_dep("Ghost", "main")];
        let downloaded = HashMap::new();
        let mut lock = Lock::new();
        let cache_root = vendor_dir.join(".cache");
        let err = link(&direct, &downloaded, &vendor_dir, &cache_root, &mut lock);
        assert!(matches!(err, Err(JbError::GraphInconsistency { .. })));
    }
}
