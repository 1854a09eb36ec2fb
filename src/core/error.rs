//! Error handling for jbpm.
//!
//! Mirrors a two-layer design: a strongly-typed [`JbError`] enum for
//! precise matching in library code, and an [`ErrorContext`] wrapper that
//! attaches a user-facing suggestion for CLI display. Library functions
//! return `Result<T, JbError>`; orchestration code (the CLI, and the
//! `Ensure` pipeline's own error aggregation across concurrent tasks)
//! works in terms of [`anyhow::Error`] so context can be layered with
//! `.context(...)` at each call site.

use std::fmt;

/// All failure modes surfaced by jbpm's core engine.
///
/// Error kinds correspond directly to the categories in the `Ensure`
/// engine's error design: source-fetch failure, integrity mismatch,
/// graph inconsistency, and filesystem errors are all fatal for the
/// dependency they concern; collision warnings are reported separately
/// and never constructed as a `JbError`.
#[derive(Debug, thiserror::Error)]
pub enum JbError {
    /// The `git` executable could not be located on `PATH`.
    #[error("git is not installed or not found in PATH")]
    GitNotFound,

    /// A `git` subprocess exited non-zero.
    #[error("git {operation} failed: {stderr}")]
    GitCommandFailed {
        /// The git subcommand that was run (clone, fetch, checkout, ...).
        operation: String,
        /// Captured stderr from the failed invocation.
        stderr: String,
    },

    /// A remote dependency's requested revision does not exist.
    #[error("revision '{revision}' not found for {url}")]
    UnknownRevision {
        /// Repository URL.
        url: String,
        /// The branch, tag, or commit that could not be resolved.
        revision: String,
    },

    /// The declared subdirectory is missing from a fetched repository.
    #[error("subdirectory '{subdir}' not found in {url}")]
    MissingSubdirectory {
        /// Repository URL.
        url: String,
        /// Subdirectory that was expected to exist.
        subdir: String,
    },

    /// A local dependency's directory does not exist relative to its
    /// referencing manifest.
    #[error("local dependency '{name}' not found at {path}")]
    LocalSourceMissing {
        /// Dependency name.
        name: String,
        /// Resolved path that was checked.
        path: String,
    },

    /// The manifest file could not be parsed.
    #[error("invalid manifest {file}: {reason}")]
    ManifestParseError {
        /// Path to the offending manifest.
        file: String,
        /// Parser error message.
        reason: String,
    },

    /// The lock file could not be parsed.
    #[error("invalid lockfile {file}: {reason}")]
    LockfileParseError {
        /// Path to the offending lockfile.
        file: String,
        /// Parser error message.
        reason: String,
    },

    /// A freshly computed content digest disagreed with the digest
    /// recorded in the lock.
    #[error(
        "integrity mismatch for '{name}': expected {expected}, got {actual}"
    )]
    IntegrityMismatch {
        /// Dependency name.
        name: String,
        /// Digest recorded in the lock.
        expected: String,
        /// Digest computed from the freshly staged directory.
        actual: String,
    },

    /// The linker could not find a downloader result for a referenced
    /// `(name, version)` pair. Indicates a bug in the downloader's
    /// traversal, not a user-facing condition.
    #[error("graph inconsistency: no downloaded record for {name}@{version}")]
    GraphInconsistency {
        /// Dependency name.
        name: String,
        /// Requested version.
        version: String,
    },

    /// A dependency's own download failed and is being surfaced at the
    /// point the linker needed its result.
    #[error("failed to fetch '{name}': {reason}")]
    FetchFailed {
        /// Dependency name.
        name: String,
        /// Underlying failure description.
        reason: String,
    },

    /// Wraps any I/O failure encountered while staging, linking, or
    /// pruning the vendor tree.
    #[error("filesystem error at {path}: {source}")]
    Io {
        /// Path the operation was acting on.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Catch-all for conditions that don't warrant their own variant.
    #[error("{message}")]
    Other {
        /// Free-form description.
        message: String,
    },
}

impl JbError {
    /// Wrap an I/O error with the path that triggered it.
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}

/// A [`JbError`] paired with an optional actionable suggestion, for CLI
/// display.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error.
    pub error: JbError,
    /// Suggested remediation, shown after the error message.
    pub suggestion: Option<String>,
}

impl ErrorContext {
    /// Wrap an error with no suggestion yet.
    #[must_use]
    pub const fn new(error: JbError) -> Self {
        Self { error, suggestion: None }
    }

    /// Attach an actionable suggestion.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Print the error (and suggestion, if any) to stderr.
    pub fn display(&self) {
        eprintln!("error: {}", self.error);
        if let Some(suggestion) = &self.suggestion {
            eprintln!("suggestion: {suggestion}");
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nsuggestion: {suggestion}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Attach a best-guess suggestion to an arbitrary error for CLI display.
///
/// Recognizes [`JbError`] variants that have an obvious remediation;
/// everything else passes through with no suggestion.
pub fn user_friendly_error(err: anyhow::Error) -> ErrorContext {
    match err.downcast::<JbError>() {
        Ok(jb_err) => {
            let suggestion = match &jb_err {
                JbError::GitNotFound => {
                    Some("install git and ensure it is on PATH".to_string())
                }
                JbError::UnknownRevision { .. } => Some(
                    "check that the branch, tag, or commit exists on the remote".to_string(),
                ),
                JbError::IntegrityMismatch { .. } => Some(
                    "the cached content no longer matches the lockfile; remove the \
                     .cache entry to force a clean refetch"
                        .to_string(),
                ),
                _ => None,
            };
            let mut ctx = ErrorContext::new(jb_err);
            if let Some(s) = suggestion {
                ctx = ctx.with_suggestion(s);
            }
            ctx
        }
        Err(other) => ErrorContext::new(JbError::Other { message: format!("{other:#}") }),
    }
}
