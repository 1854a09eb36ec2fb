//! `jb init` — scaffold a new, empty manifest.

use anyhow::{Result, bail};
use clap::Args;
use std::path::Path;

use crate::manifest::Manifest;

/// Arguments for `jb init`.
#[derive(Args)]
pub struct InitArgs {
    /// Overwrite an existing manifest instead of erroring.
    #[arg(long)]
    force: bool,
}

/// Write an empty manifest to `manifest_path`, unless one already
/// exists and `--force` wasn't given.
pub fn run(args: &InitArgs, manifest_path: &Path) -> Result<()> {
    if manifest_path.exists() && !args.force {
        bail!("{} already exists (use --force to overwrite)", manifest_path.display());
    }
    if let Some(parent) = manifest_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let manifest = Manifest::default();
    std::fs::write(manifest_path, manifest.to_toml()?)?;
    println!("wrote {}", manifest_path.display());
    Ok(())
}
