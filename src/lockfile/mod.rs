//! Lock file (`jbpm.lock`) handling.
//!
//! The lock is an **ordered** mapping from canonical name to a resolved
//! [`Dependency`] — ordered because the linker's deterministic
//! depth-first walk produces entries in a stable sequence, and a
//! reproducible lockfile depends on that sequence surviving a
//! load/save round trip unchanged. [`indexmap::IndexMap`] gives us name
//! lookup and insertion-order iteration in one structure, the way
//! `cargo`'s own resolver keeps its output ordered (`indexmap` is a
//! direct dependency of `cargo` itself).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::JbError;
use crate::manifest::Dependency;

/// On-disk shape of `jbpm.lock`: a version tag plus the dependency list
/// in file order, array-of-tables style (matching the teacher's own
/// `agpm.lock` layout of `[[agents]]`, `[[snippets]]`, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
struct LockFile {
    version: u32,
    #[serde(default, rename = "dependency")]
    dependencies: Vec<Dependency>,
}

/// The resolved, ordered set of every package `Ensure` has vendored.
#[derive(Debug, Clone, Default)]
pub struct Lock {
    entries: IndexMap<String, Dependency>,
}

impl Lock {
    /// An empty lock, as used for a project's first `Ensure` run.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a lock file from disk. A missing file is treated as an
    /// empty lock, matching `Ensure`'s "fresh install" scenario.
    pub fn load(path: &Path) -> Result<Self, JbError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::parse(&text, path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::new()),
            Err(e) => Err(JbError::io(path.display().to_string(), e)),
        }
    }

    /// Parse lock file text directly. `path` is used only for error
    /// reporting.
    pub fn parse(text: &str, path: &Path) -> Result<Self, JbError> {
        let file: LockFile = toml::from_str(text).map_err(|e| JbError::LockfileParseError {
            file: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let mut entries = IndexMap::with_capacity(file.dependencies.len());
        for dep in file.dependencies {
            entries.insert(dep.name.clone(), dep);
        }
        Ok(Self { entries })
    }

    /// Serialize and write the lock to disk, creating parent
    /// directories as needed.
    pub fn save(&self, path: &Path) -> Result<(), JbError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| JbError::io(parent.display().to_string(), e))?;
        }
        let file = LockFile { version: 1, dependencies: self.entries.values().cloned().collect() };
        let text = toml::to_string_pretty(&file)
            .map_err(|e| JbError::Other { message: format!("failed to serialize lockfile: {e}") })?;
        std::fs::write(path, text).map_err(|e| JbError::io(path.display().to_string(), e))
    }

    /// Look up an entry by canonical name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Dependency> {
        self.entries.get(name)
    }

    /// Insert or overwrite the entry for `dep.name`, preserving its
    /// original position if it already existed (the spec requires the
    /// *first* resolution's version to win; callers that intend to
    /// overwrite handle that check themselves before calling this).
    pub fn insert(&mut self, dep: Dependency) {
        self.entries.insert(dep.name.clone(), dep);
    }

    /// Remove an entry, returning it if present.
    pub fn remove(&mut self, name: &str) -> Option<Dependency> {
        self.entries.shift_remove(name)
    }

    /// Iterate entries in insertion (declaration) order.
    pub fn iter(&self) -> impl Iterator<Item = &Dependency> {
        self.entries.values()
    }

    /// Number of entries currently locked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the lock has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All canonical names currently locked, in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::Source;

    fn dep(name: &str, version: &str) -> Dependency {
        Dependency {
            name: name.to_string(),
            source: Source::Remote { url: "https://example.com/repo.git".to_string(), subdir: String::new() },
            version: version.to_string(),
            sum: String::new(),
            legacy_name_compat: None,
            single: false,
        }
    }

    #[test]
    fn round_trips_through_toml_preserving_order() {
        let mut lock = Lock::new();
        lock.insert(dep("b/pkg", "v2"));
        lock.insert(dep("a/pkg", "v1"));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jbpm.lock");
        lock.save(&path).unwrap();

        let reloaded = Lock::load(&path).unwrap();
        let names: Vec<&str> = reloaded.names().collect();
        assert_eq!(names, vec!["b/pkg", "a/pkg"]);
        assert_eq!(reloaded.get("a/pkg").unwrap().version, "v1");
    }

    #[test]
    fn missing_file_is_an_empty_lock() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("does-not-exist.lock");
        let lock = Lock::load(&path).unwrap();
        assert!(lock.is_empty());
    }
}
