//! Command-line surface for `jb`.
//!
//! This is deliberately a thin shell around [`crate::ensure`]: `jb
//! install` and `jb update` both read the manifest and lock, run
//! `Ensure`, and write the lock back; `jb init` just scaffolds an empty
//! manifest. The resolution engine itself lives entirely in the library
//! crate and knows nothing about `clap` or stdout.

mod init;
mod install;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// A Git-based vendoring package manager for jsonnet-style configuration
/// modules.
#[derive(Parser)]
#[command(name = "jb", about = "Vendor jsonnet-style dependencies", version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug-level logging, equivalent to `RUST_LOG=debug`.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the manifest file (defaults to `jbpm.toml` in the
    /// current directory).
    #[arg(long, global = true)]
    manifest: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new, empty manifest in the current directory.
    Init(init::InitArgs),
    /// Resolve and vendor every dependency in the manifest.
    Install,
    /// Like `install`, but first drops the named entries from the lock
    /// so they re-resolve against their manifest-declared version.
    Update {
        /// Dependency names to re-resolve. With none given, every
        /// dependency re-resolves.
        names: Vec<String>,
    },
}

impl Cli {
    /// Whether `--verbose` was passed.
    #[must_use]
    pub const fn verbose(&self) -> bool {
        self.verbose
    }

    /// Resolve the manifest path this invocation should use.
    #[must_use]
    pub fn manifest_path(&self) -> PathBuf {
        self.manifest.clone().unwrap_or_else(|| PathBuf::from(crate::manifest::FILE_NAME))
    }

    /// Dispatch to the selected subcommand.
    pub async fn run(&self) -> anyhow::Result<()> {
        let manifest_path = self.manifest_path();
        match &self.command {
            Commands::Init(args) => init::run(args, &manifest_path),
            Commands::Install => install::run(&manifest_path, install::Refresh::None).await,
            Commands::Update { names } => {
                let refresh =
                    if names.is_empty() { install::Refresh::All } else { install::Refresh::Named(names) };
                install::run(&manifest_path, refresh).await
            }
        }
    }
}
