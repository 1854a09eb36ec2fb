//! Fixture helpers shared by this crate's own tests and its
//! integration tests. Mirrors the teacher project's `tests/common`
//! pattern — a thin `TestGit` command wrapper plus small builders for
//! manifests and lock entries — but lives in-crate behind the
//! `test-utils` feature so both unit tests and `tests/*.rs` files can
//! use it without duplicating fixture code.
#![allow(dead_code)]

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::lockfile::Lock;
use crate::manifest::{Dependency, Manifest, Source};

/// A disposable Git repository used as a "remote" source in tests —
/// `git` clones local filesystem paths just as readily as network URLs,
/// so this gives the downloader and source driver something real to
/// exercise without any network access.
pub struct TestRepo {
    pub path: PathBuf,
}

impl TestRepo {
    /// Initialize a new repository at `path` with an initial commit
    /// containing `files` (relative path, content).
    pub fn init(path: &Path, files: &[(&str, &str)]) -> Result<Self> {
        std::fs::create_dir_all(path)?;
        let repo = Self { path: path.to_path_buf() };
        repo.git(&["init", "--quiet", "--initial-branch=main"])?;
        repo.git(&["config", "user.email", "test@jbpm.example"])?;
        repo.git(&["config", "user.name", "jbpm tests"])?;
        for (rel, content) in files {
            let file_path = repo.path.join(rel);
            if let Some(parent) = file_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&file_path, content)?;
        }
        repo.git(&["add", "."])?;
        repo.git(&["commit", "--quiet", "-m", "initial"])?;
        Ok(repo)
    }

    /// Append another commit with updated/new files, on top of the
    /// initial one — used to simulate an upstream branch moving.
    pub fn commit(&self, files: &[(&str, &str)], message: &str) -> Result<String> {
        for (rel, content) in files {
            let file_path = self.path.join(rel);
            if let Some(parent) = file_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&file_path, content)?;
        }
        self.git(&["add", "."])?;
        self.git(&["commit", "--quiet", "-m", message])?;
        self.head_sha()
    }

    /// The current `HEAD` commit SHA.
    pub fn head_sha(&self) -> Result<String> {
        let out = self.git(&["rev-parse", "HEAD"])?;
        Ok(out.trim().to_string())
    }

    /// This repository's path as a `file://`-free local clone URL —
    /// `git` accepts a bare filesystem path directly.
    pub fn url(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }

    fn git(&self, args: &[&str]) -> Result<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.path)
            .output()
            .with_context(|| format!("failed to run git {args:?}"))?;
        if !output.status.success() {
            anyhow::bail!("git {args:?} failed: {}", String::from_utf8_lossy(&output.stderr));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Build a remote dependency pointed at `repo`.
#[must_use]
pub fn remote_dep(name: &str, repo: &TestRepo, subdir: &str, version: &str) -> Dependency {
    Dependency {
        name: name.to_string(),
        source: Source::Remote { url: repo.url(), subdir: subdir.to_string() },
        version: version.to_string(),
        sum: String::new(),
        legacy_name_compat: None,
        single: false,
    }
}

/// Build a local dependency pointed at a relative path.
#[must_use]
pub fn local_dep(name: &str, path: &str) -> Dependency {
    Dependency {
        name: name.to_string(),
        source: Source::Local { path: path.to_string() },
        version: String::new(),
        sum: String::new(),
        legacy_name_compat: None,
        single: false,
    }
}

/// A manifest with the given direct dependencies and no legacy-imports.
#[must_use]
pub fn manifest(dependencies: Vec<Dependency>) -> Manifest {
    Manifest { legacy_imports: false, dependencies }
}

/// An empty lock, named for readability at call sites.
#[must_use]
pub fn empty_lock() -> Lock {
    Lock::new()
}
