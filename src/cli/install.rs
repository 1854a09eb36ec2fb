//! `jb install` / `jb update` — run `Ensure` against the manifest at
//! `manifest_path` and persist the resulting lock.
//!
//! The two commands share this one code path, but only `update` is
//! allowed to touch the prior lock before `Ensure` runs: `install` must
//! honor lock precedence exactly as loaded (spec §4.4 step 1, §8 lock
//! precedence / idempotence), while `update` drops the named entries
//! (or, with none given, every entry) so they re-resolve against
//! whatever the manifest currently requests.

use anyhow::Result;
use std::path::Path;
use tracing::info;

use crate::config::GlobalConfig;
use crate::ensure;
use crate::lockfile::Lock;
use crate::manifest::Manifest;

const LOCK_FILE_NAME: &str = "jbpm.lock";

/// Which entries of the prior lock, if any, should be dropped before
/// `Ensure` runs so they re-resolve against the manifest instead of
/// staying pinned.
pub enum Refresh<'a> {
    /// `jb install`: honor the lock exactly as loaded.
    None,
    /// `jb update` with no names: drop every entry.
    All,
    /// `jb update <names>...`: drop only the named entries.
    Named(&'a [String]),
}

/// Run `Ensure` for the manifest at `manifest_path`, applying `refresh`
/// to the prior lock first.
pub async fn run(manifest_path: &Path, refresh: Refresh<'_>) -> Result<()> {
    let manifest = Manifest::load(manifest_path)?;
    let lock_path = manifest_path.with_file_name(LOCK_FILE_NAME);
    let mut old_lock = Lock::load(&lock_path)?;

    match refresh {
        Refresh::None => {}
        Refresh::All => old_lock = Lock::new(),
        Refresh::Named(names) => {
            for name in names {
                old_lock.remove(name);
            }
        }
    }

    let vendor_dir = manifest_path.parent().unwrap_or_else(|| Path::new(".")).join("vendor");

    let global_config = GlobalConfig::load()?;
    let cache_root = global_config.resolve_cache_dir(&vendor_dir);

    let new_lock =
        ensure::run(&manifest, manifest_path, &vendor_dir, &cache_root, old_lock, global_config.max_concurrent_fetches)
            .await?;
    new_lock.save(&lock_path)?;

    info!(entries = new_lock.len(), path = %lock_path.display(), "wrote lockfile");
    println!("vendored {} dependencies into {}", new_lock.len(), vendor_dir.display());
    Ok(())
}
