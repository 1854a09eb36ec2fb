//! Parallel, recursive, deduplicated download phase (spec §4.5).
//!
//! `Ensure`'s first phase walks the dependency graph breadth over
//! depth: every direct dependency gets its own task, and every nested
//! dependency discovered along the way spawns another. Two tasks that
//! land on the same `(name, version)` pair — a diamond in the graph —
//! must do the work exactly once; this is the one place in the crate
//! that needs real concurrent state, so it is the one place that reaches
//! for [`dashmap`], in the same claim-slot style the teacher project
//! uses in its own resolver (`src/resolver/version_resolver.rs`):
//! an atomic "first task to land here owns it" check on a shared map,
//! everyone else backs off immediately.
//!
//! Because nothing consumes [`DownloadedEntry`] records until every
//! spawned task (including ones not yet spawned when `ensure` was
//! called) has finished, there's no need for the claimants to wait on
//! each other — the loser of a claim just returns, and the linker phase
//! only runs once the whole fan-out has drained.

use futures::future::BoxFuture;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Semaphore;

use crate::fetch::fetch_one;
use crate::lockfile::Lock;
use crate::manifest::{Dependency, Manifest};

/// A `(name, version)` pair identifying one resolved package instance.
pub type DownloadKey = (String, String);

/// The outcome of fetching and (if applicable) recursing into one
/// dependency instance.
#[derive(Debug, Clone)]
pub struct DownloadedEntry {
    /// The dependency record with version/sum resolved.
    pub dependency: Dependency,
    /// Directory holding the package's own files — the linker's symlink
    /// target.
    pub content_dir: PathBuf,
    /// This package's own manifest, if it has one and isn't `single`.
    /// The linker recurses into `dependencies` here rather than
    /// re-reading it from disk.
    pub nested_manifest: Option<Manifest>,
    /// Set when fetching or recursing into this dependency failed.
    /// Recorded rather than propagated, so one broken branch of the
    /// graph doesn't abort fetches that are otherwise independent
    /// (spec §4.5, §7).
    pub error: Option<String>,
}

/// Shared state for one `ensure` call. Cheap to clone: every field is
/// an `Arc`, so handing a copy to each spawned task is just a refcount
/// bump.
#[derive(Clone)]
struct Shared {
    cache_root: Arc<PathBuf>,
    old_locks: Arc<Lock>,
    claims: Arc<DashMap<DownloadKey, ()>>,
    results: Arc<DashMap<DownloadKey, DownloadedEntry>>,
    fetch_permits: Arc<Option<Semaphore>>,
}

/// Download every reachable dependency starting from `direct`, the
/// manifest found at `parent_manifest_path`'s declared dependencies.
///
/// `old_locks` pins versions and integrity sums left over from a
/// previous lock file; an entry there takes precedence over a
/// dependency's own requested version (spec §4.2, §4.4).
///
/// `max_concurrent_fetches` caps how many `fetch_one` calls run at
/// once, per [`crate::config::GlobalConfig`]; `None` leaves the fan-out
/// unbounded, as it always was before that config existed.
pub async fn ensure(
    direct: Vec<Dependency>,
    cache_root: PathBuf,
    parent_manifest_path: PathBuf,
    old_locks: Lock,
    max_concurrent_fetches: Option<usize>,
) -> HashMap<DownloadKey, DownloadedEntry> {
    let shared = Shared {
        cache_root: Arc::new(cache_root),
        old_locks: Arc::new(old_locks),
        claims: Arc::new(DashMap::new()),
        results: Arc::new(DashMap::new()),
        fetch_permits: Arc::new(max_concurrent_fetches.map(Semaphore::new)),
    };

    let handles: Vec<_> = direct
        .into_iter()
        .map(|dep| tokio::spawn(process(shared.clone(), dep, parent_manifest_path.clone())))
        .collect();

    for handle in handles {
        // A task itself never returns an `Err`; fetch/recursion
        // failures are recorded in `results`, not propagated. A `Join`
        // failure here means the task panicked, which we treat as an
        // internal bug rather than something the rest of the graph can
        // route around.
        let _ = handle.await;
    }

    Arc::try_unwrap(shared.results)
        .map(DashMap::into_iter)
        .unwrap_or_else(|arc| arc.iter().map(|r| (r.key().clone(), r.value().clone())).collect::<Vec<_>>().into_iter())
        .collect()
}

/// Process one dependency instance: claim its slot, fetch it, and if it
/// isn't `single` and has its own manifest, spawn tasks for its nested
/// dependencies too.
///
/// Recursive `async fn`s need boxing in Rust since the compiler can't
/// otherwise size the resulting state machine; `Box::pin` is the
/// standard way around that.
fn process(shared: Shared, dep: Dependency, parent_manifest_path: PathBuf) -> BoxFuture<'static, ()> {
    Box::pin(process_inner(shared, dep, parent_manifest_path))
}

async fn process_inner(shared: Shared, dep: Dependency, parent_manifest_path: PathBuf) {
    let key: DownloadKey = (dep.name.clone(), dep.version.clone());

    // Claim-slot dedup: only the task that successfully inserts the key
    // proceeds. Everyone else — a later arrival at the same (name,
    // version) via a different path through the graph — backs off
    // immediately; the eventual result in `shared.results` covers them
    // too, since a result key carries no information about which
    // branch discovered it first.
    let is_new = match shared.claims.entry(key.clone()) {
        dashmap::mapref::entry::Entry::Occupied(_) => false,
        dashmap::mapref::entry::Entry::Vacant(v) => {
            v.insert(());
            true
        }
    };
    if !is_new {
        return;
    }

    let locked = shared.old_locks.get(&dep.name).cloned();
    let _permit = match shared.fetch_permits.as_ref() {
        Some(sem) => Some(sem.acquire().await.expect("fetch semaphore is never closed")),
        None => None,
    };
    let outcome = fetch_one(&dep, &shared.cache_root, &parent_manifest_path, locked.as_ref()).await;

    let (resolved, content_dir) = match outcome {
        Ok(outcome) => (outcome.dependency, outcome.content_dir),
        Err(e) => {
            shared.results.insert(
                key,
                DownloadedEntry {
                    dependency: dep,
                    content_dir: PathBuf::new(),
                    nested_manifest: None,
                    error: Some(e.to_string()),
                },
            );
            return;
        }
    };

    if resolved.single {
        shared.results.insert(
            key,
            DownloadedEntry { dependency: resolved, content_dir, nested_manifest: None, error: None },
        );
        return;
    }

    let nested = match Manifest::load_optional(&content_dir) {
        Ok(nested) => nested,
        Err(e) => {
            shared.results.insert(
                key,
                DownloadedEntry {
                    dependency: resolved,
                    content_dir,
                    nested_manifest: None,
                    error: Some(e.to_string()),
                },
            );
            return;
        }
    };

    shared.results.insert(
        key.clone(),
        DownloadedEntry {
            dependency: resolved,
            content_dir: content_dir.clone(),
            nested_manifest: nested.clone(),
            error: None,
        },
    );

    let Some(nested_manifest) = nested else { return };

    // Resolve through any symlinks before handing this path down as the
    // next level's "referencing manifest directory" — a local
    // dependency nested several levels deep must resolve relative to
    // where its declaring manifest *actually* lives, not a symlink that
    // happens to point at it (spec §9 Design Notes).
    let next_parent = std::fs::canonicalize(&content_dir).unwrap_or(content_dir);

    let handles: Vec<_> = nested_manifest
        .dependencies
        .into_iter()
        .map(|child| tokio::spawn(process(shared.clone(), child, next_parent.clone())))
        .collect();
    for handle in handles {
        let _ = handle.await;
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::Source;

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
    async fn same_name_and_version_is_claimed_and_fetched_only_once() {
        let root = tempfile::tempdir().unwrap();
        let vendor_dir = root.path().join("vendor");
        std::fs::create_dir_all(&vendor_dir).unwrap();

        let shared_dir = root.path().join("shared");
        std::fs::create_dir_all(&shared_dir).unwrap();

        // Two direct dependency declarations landing on the same
        // (name, version) key, as two branches of a diamond would.
        let direct = vec![local_dep("shared", "../shared"), local_dep("shared", "../shared")];
        let result = ensure(direct, vendor_dir, root.path().to_path_buf(), Lock::new(), None).await;
        assert_eq!(result.len(), 1);
        let entry = result.values().next().unwrap();
        assert!(entry.error.is_none());
        assert_eq!(entry.content_dir, shared_dir);
    }

    #[tokio::test]
    async fn missing_local_dependency_is_recorded_as_an_error_not_a_panic() {
        let root = tempfile::tempdir().unwrap();
        let vendor_dir = root.path().join("vendor");
        std::fs::create_dir_all(&vendor_dir).unwrap();

        let direct = vec![local_dep("ghost", "../does-not-exist")];
        let result = ensure(direct, vendor_dir, root.path().to_path_buf(), Lock::new(), None).await;
        assert_eq!(result.len(), 1);
        let entry = result.values().next().unwrap();
        assert!(entry.error.is_some());
    }
}
