//! Name and path helpers used by the cache resolver, linker, and
//! pruner: canonical-name normalization, percent-encoding of cache
//! keys, and the bidirectional prefix test that decides what the
//! pruner keeps.

use std::path::Path;

/// Slash-normalize a package name: collapse repeated slashes, drop
/// leading/trailing slashes, and turn any backslashes (as might appear
/// on a Windows-authored manifest) into forward slashes.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.replace('\\', "/")
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Percent-encode a string for safe use as a single path component,
/// e.g. a cache directory name derived from `name + "-" + version`
/// where `name` may itself contain slashes.
#[must_use]
pub fn percent_encode_component(s: &str) -> String {
    url::form_urlencoded::byte_serialize(s.as_bytes()).collect()
}

/// Split a `/`-joined canonical name into its components.
fn components(name: &str) -> Vec<&str> {
    name.split('/').filter(|s| !s.is_empty()).collect()
}

/// The pruner's keep test: `candidate` (a path relative to the vendor
/// root) is kept if it is a prefix of `locked_name`'s components, or
/// `locked_name` is a prefix of its components — i.e. either it's an
/// ancestor directory of a locked package, or it's inside one.
#[must_use]
pub fn is_prefix_or_prefixed(candidate: &str, locked_name: &str) -> bool {
    let a = components(candidate);
    let b = components(locked_name);
    let n = a.len().min(b.len());
    a[..n] == b[..n]
}

/// Render a filesystem path relative to `root` as a `/`-joined string,
/// regardless of the platform's native separator.
#[must_use]
pub fn relative_slash_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_slashes() {
        assert_eq!(normalize_name("/org//repo/pkg/"), "org/repo/pkg");
        assert_eq!(normalize_name("org\\repo\\pkg"), "org/repo/pkg");
    }

    #[test]
    fn prefix_test_is_bidirectional() {
        // ancestor directory of a locked name is kept
        assert!(is_prefix_or_prefixed("org/repo", "org/repo/pkg"));
        // a path inside a locked name is kept
        assert!(is_prefix_or_prefixed("org/repo/pkg/internal", "org/repo/pkg"));
        // unrelated paths are not
        assert!(!is_prefix_or_prefixed("org/other", "org/repo/pkg"));
    }
}
