//! Content hashing for staged package directories (spec §4.2).
//!
//! The digest is deliberately light on semantics: it streams the
//! concatenation of regular-file contents only, in the order a
//! recursive filesystem walk yields them, skipping directories and
//! symlinks. No file metadata (permissions, mtimes, names) enters the
//! hash, so permission noise across machines can't break verification —
//! and skipping symlinks specifically prevents a package from forging
//! another's digest by nesting a symlink back into shared content.

use anyhow::{Context, Result};
use base64::Engine as _;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use walkdir::WalkDir;

/// Compute the base64-encoded SHA-256 digest of `dir`'s regular-file
/// contents, walked in `walkdir`'s (sorted-by-default) traversal order.
pub fn hash_directory(dir: &Path) -> Result<String> {
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.with_context(|| format!("failed to walk {}", dir.display()))?;
        let file_type = entry.file_type();
        if file_type.is_dir() || file_type.is_symlink() {
            continue;
        }
        let mut file = BufReader::new(
            File::open(entry.path())
                .with_context(|| format!("failed to open {}", entry.path().display()))?,
        );
        loop {
            let n = file
                .read(&mut buf)
                .with_context(|| format!("failed to read {}", entry.path().display()))?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }
    }

    Ok(base64::engine::general_purpose::STANDARD.encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn stable_across_permission_changes() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("a.txt");
        std::fs::write(&file_path, b"hello").unwrap();

        let first = hash_directory(dir.path()).unwrap();

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&file_path, std::fs::Permissions::from_mode(0o600)).unwrap();
        }

        let second = hash_directory(dir.path()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn symlinks_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("real.txt"), b"content").unwrap();
        let without_symlink = hash_directory(dir.path()).unwrap();

        #[cfg(unix)]
        {
            std::os::unix::fs::symlink(dir.path().join("real.txt"), dir.path().join("link.txt"))
                .unwrap();
            let with_symlink = hash_directory(dir.path()).unwrap();
            assert_eq!(without_symlink, with_symlink);
        }
    }

    #[test]
    fn differs_when_content_changes() {
        let dir = tempfile::tempdir().unwrap();
        let mut f = File::create(dir.path().join("a.txt")).unwrap();
        f.write_all(b"one").unwrap();
        drop(f);
        let first = hash_directory(dir.path()).unwrap();

        let mut f = File::create(dir.path().join("a.txt")).unwrap();
        f.write_all(b"two").unwrap();
        drop(f);
        let second = hash_directory(dir.path()).unwrap();

        assert_ne!(first, second);
    }
}
