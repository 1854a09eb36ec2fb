//! Property-style checks from the spec's testable-invariants section,
//! run against real Git repositories standing in for remote sources.

use jbpm::ensure;
use jbpm::lockfile::Lock;
use jbpm::test_utils::{TestRepo, manifest, remote_dep};

fn project(root: &std::path::Path) -> (std::path::PathBuf, std::path::PathBuf, std::path::PathBuf) {
    let project_dir = root.join("project");
    std::fs::create_dir_all(&project_dir).unwrap();
    let vendor_dir = project_dir.join("vendor");
    let cache_root = vendor_dir.join(jbpm::cache::CACHE_DIR_NAME);
    let manifest_path = project_dir.join(jbpm::manifest::FILE_NAME);
    (manifest_path, vendor_dir, cache_root)
}

#[tokio::test]
async fn lock_completeness_every_declared_name_appears_exactly_once() {
    let root = tempfile::tempdir().unwrap();
    let a = TestRepo::init(&root.path().join("a"), &[("a.libsonnet", "{}")]).unwrap();
    let b = TestRepo::init(&root.path().join("b"), &[("b.libsonnet", "{}")]).unwrap();
    let (manifest_path, vendor_dir, cache_root) = project(root.path());

    let m = manifest(vec![remote_dep("A", &a, "", "main"), remote_dep("B", &b, "", "main")]);
    let lock = ensure::run(&m, &manifest_path, &vendor_dir, &cache_root, Lock::new(), None).await.unwrap();

    let names: Vec<&str> = lock.names().collect();
    assert_eq!(names, vec!["A", "B"]);
}

#[tokio::test]
async fn integrity_holds_for_every_non_local_entry() {
    let root = tempfile::tempdir().unwrap();
    let a = TestRepo::init(&root.path().join("a"), &[("a.libsonnet", "{ ok: true }")]).unwrap();
    let (manifest_path, vendor_dir, cache_root) = project(root.path());

    let m = manifest(vec![remote_dep("A", &a, "", "main")]);
    let lock = ensure::run(&m, &manifest_path, &vendor_dir, &cache_root, Lock::new(), None).await.unwrap();

    let entry = lock.get("A").unwrap();
    let content_dir = vendor_dir.join(".cache").join(format!("A-{}", entry.version)).join("A");
    let actual = jbpm::hash::hash_directory(&content_dir).unwrap();
    assert_eq!(actual, entry.sum);
}

#[tokio::test]
async fn vendor_tightness_no_unexpected_directories_survive() {
    let root = tempfile::tempdir().unwrap();
    let a = TestRepo::init(&root.path().join("a"), &[("a.libsonnet", "{}")]).unwrap();
    let (manifest_path, vendor_dir, cache_root) = project(root.path());

    // A stray leftover directory from a manifest that no longer
    // references it.
    std::fs::create_dir_all(vendor_dir.join("leftover/old-package")).unwrap();

    let m = manifest(vec![remote_dep("A", &a, "", "main")]);
    ensure::run(&m, &manifest_path, &vendor_dir, &cache_root, Lock::new(), None).await.unwrap();

    assert!(!vendor_dir.join("leftover").exists());
}

#[tokio::test]
async fn idempotence_rerunning_ensure_over_its_own_output_is_a_no_op() {
    let root = tempfile::tempdir().unwrap();
    let a = TestRepo::init(&root.path().join("a"), &[("a.libsonnet", "{}")]).unwrap();
    let (manifest_path, vendor_dir, cache_root) = project(root.path());

    let m = manifest(vec![remote_dep("A", &a, "", "main")]);
    let first = ensure::run(&m, &manifest_path, &vendor_dir, &cache_root, Lock::new(), None).await.unwrap();
    let second = ensure::run(&m, &manifest_path, &vendor_dir, &cache_root, first.clone(), None).await.unwrap();

    assert_eq!(first.get("A").unwrap().version, second.get("A").unwrap().version);
    assert_eq!(first.get("A").unwrap().sum, second.get("A").unwrap().sum);
    assert_eq!(first.names().collect::<Vec<_>>(), second.names().collect::<Vec<_>>());
}
