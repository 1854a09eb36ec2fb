//! Manifest (`jbpm.toml`) parsing for jbpm projects.
//!
//! A manifest declares the *direct* dependencies of a project: each one
//! identified by a canonical, slash-normalized [`name`](Dependency::name),
//! a [`Source`] (remote Git location or local path), a requested
//! [`version`](Dependency) and a couple of optional modifiers. The
//! manifest format mirrors the teacher project's `agpm.toml` in spirit —
//! TOML, array-of-tables for the dependency list — but the schema itself
//! is this ecosystem's own (closer to `jsonnetfile.json`'s shape than to
//! `agpm.toml`'s).
//!
//! ```toml
//! legacy_imports = true
//!
//! [[dependency]]
//! name = "github.com/org/pkg"
//! version = "main"
//!
//! [dependency.source.remote]
//! url = "https://github.com/org/pkg.git"
//! subdir = "lib"
//!
//! [[dependency]]
//! name = "local/helper"
//!
//! [dependency.source.local]
//! path = "../helper"
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::JbError;

/// A single declared dependency, shared between the manifest (as a
/// request) and the lockfile (as a resolved record) — see
/// [`crate::lockfile`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// Canonical, slash-normalized package name.
    pub name: String,
    /// Where the package's content comes from.
    pub source: Source,
    /// Requested version: a branch, tag, or commit for remote sources;
    /// unused (left empty) for local sources.
    #[serde(default)]
    pub version: String,
    /// Base64-encoded SHA-256 digest of the vendored directory. Empty
    /// for local sources and for remote sources not yet resolved.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sum: String,
    /// Short alias for legacy import paths, if the user overrode the
    /// source-derived default.
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "legacy_name")]
    pub legacy_name_compat: Option<String>,
    /// Suppresses recursion into this dependency's own manifest.
    #[serde(default, skip_serializing_if = "is_false")]
    pub single: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl Dependency {
    /// The legacy alias this dependency would use if the user never
    /// overrode it: the final path segment of its canonical name.
    #[must_use]
    pub fn default_legacy_name(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    /// The legacy alias to actually use, falling back to the default
    /// when no override is set.
    #[must_use]
    pub fn legacy_name(&self) -> &str {
        self.legacy_name_compat.as_deref().unwrap_or_else(|| self.default_legacy_name())
    }

    /// Whether this dependency resolves to a local filesystem path.
    #[must_use]
    pub const fn is_local(&self) -> bool {
        matches!(self.source, Source::Local { .. })
    }
}

/// Where a [`Dependency`]'s content is retrieved from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// A directory within a remote Git repository at some revision.
    Remote {
        /// Repository URL (any form the `git` CLI accepts).
        url: String,
        /// Subdirectory within the repository holding the package.
        #[serde(default)]
        subdir: String,
    },
    /// A directory on the local filesystem, relative to the manifest
    /// that declared it.
    Local {
        /// Path relative to the referencing manifest's directory.
        path: String,
    },
}

/// The full contents of a `jbpm.toml` manifest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    /// When set, `Ensure` additionally creates short-name compatibility
    /// symlinks for every non-local dependency (see
    /// [`crate::compat`]).
    #[serde(default)]
    pub legacy_imports: bool,
    /// Direct dependencies, in declaration order. Order matters: it is
    /// the basis for the linker's deterministic, first-seen-wins walk.
    #[serde(default, rename = "dependency")]
    pub dependencies: Vec<Dependency>,
}

/// Conventional manifest file name within a package or project
/// directory, looked for by the downloader when deciding whether a
/// staged package has its own transitive dependencies.
pub const FILE_NAME: &str = "jbpm.toml";

impl Manifest {
    /// Parse a manifest from its TOML text. `path` is used only for
    /// error reporting.
    pub fn parse(text: &str, path: &Path) -> Result<Self, JbError> {
        let mut manifest: Self = toml::from_str(text).map_err(|e| JbError::ManifestParseError {
            file: path.display().to_string(),
            reason: e.to_string(),
        })?;
        for dep in &mut manifest.dependencies {
            dep.name = crate::utils::path::normalize_name(&dep.name);
        }
        Ok(manifest)
    }

    /// Load and parse a manifest from disk.
    pub fn load(path: &Path) -> Result<Self, JbError> {
        let text = std::fs::read_to_string(path).map_err(|e| JbError::io(path.display().to_string(), e))?;
        Self::parse(&text, path)
    }

    /// Load `<dir>/jbpm.toml` if it exists. Returns `Ok(None)` when the
    /// file is simply absent (spec §4.5 step 4: "If absent, record
    /// success without a nested manifest"); any other I/O or parse
    /// failure propagates.
    pub fn load_optional(dir: &Path) -> Result<Option<Self>, JbError> {
        let path = dir.join(FILE_NAME);
        match std::fs::read_to_string(&path) {
            Ok(text) => Self::parse(&text, &path).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(JbError::io(path.display().to_string(), e)),
        }
    }

    /// Serialize the manifest back to TOML text.
    pub fn to_toml(&self) -> Result<String, JbError> {
        toml::to_string_pretty(self)
            .map_err(|e| JbError::Other { message: format!("failed to serialize manifest: {e}") })
    }
}
