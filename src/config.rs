//! Global user configuration (`~/.config/jbpm/config.toml` or
//! platform equivalent via [`dirs`]).
//!
//! Scoped deliberately small: jbpm's core engine takes its inputs
//! (manifest, lock, vendor directory) as explicit arguments, so the only
//! things worth a persistent global override are host-level concerns
//! that don't belong in a project's checked-in manifest — where the
//! cache lives, and how much fetch concurrency to allow. Mirrors the
//! teacher's `GlobalConfig` in spirit: a `serde`-mapped TOML file, an
//! environment variable that overrides its location, defaults when
//! the file is absent.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::JbError;

/// Environment variable overriding the global config file's location.
pub const CONFIG_PATH_ENV: &str = "JBPM_CONFIG_PATH";

/// Environment variable overriding the vendor cache directory.
pub const CACHE_DIR_ENV: &str = "JBPM_CACHE_DIR";

/// User-wide jbpm settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Overrides the default vendor cache location for every project,
    /// unless a project-local override takes precedence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
    /// Caps how many dependencies the downloader fetches concurrently.
    /// `None` leaves the runtime's own scheduling unbounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrent_fetches: Option<usize>,
}

impl GlobalConfig {
    /// The default location: `JBPM_CONFIG_PATH` if set, otherwise
    /// `<config-dir>/jbpm/config.toml`.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return Some(PathBuf::from(path));
        }
        dirs::config_dir().map(|dir| dir.join("jbpm").join("config.toml"))
    }

    /// Load the global config, falling back to defaults if no file
    /// exists at the resolved path.
    pub fn load() -> Result<Self, JbError> {
        let Some(path) = Self::default_path() else { return Ok(Self::default()) };
        Self::load_from(&path)
    }

    /// Load from a specific path, treating a missing file as defaults.
    pub fn load_from(path: &Path) -> Result<Self, JbError> {
        match std::fs::read_to_string(path) {
            Ok(text) => toml::from_str(&text)
                .map_err(|e| JbError::ManifestParseError { file: path.display().to_string(), reason: e.to_string() }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(JbError::io(path.display().to_string(), e)),
        }
    }

    /// Persist the config to `path`, creating parent directories as
    /// needed.
    pub fn save(&self, path: &Path) -> Result<(), JbError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| JbError::io(parent.display().to_string(), e))?;
        }
        let text = toml::to_string_pretty(self)
            .map_err(|e| JbError::Other { message: format!("failed to serialize config: {e}") })?;
        std::fs::write(path, text).map_err(|e| JbError::io(path.display().to_string(), e))
    }

    /// Resolve the effective cache directory for `vendor_dir`: an
    /// environment override, then this config's override, then the
    /// vendor directory's own `.cache` subdirectory.
    #[must_use]
    pub fn resolve_cache_dir(&self, vendor_dir: &Path) -> PathBuf {
        if let Ok(dir) = std::env::var(CACHE_DIR_ENV) {
            return PathBuf::from(dir);
        }
        if let Some(dir) = &self.cache_dir {
            return dir.clone();
        }
        vendor_dir.join(crate::cache::CACHE_DIR_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_as_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let config = GlobalConfig::load_from(&path).unwrap();
        assert!(config.cache_dir.is_none());
        assert!(config.max_concurrent_fetches.is_none());
    }

    #[test]
    fn round_trips_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let config = GlobalConfig { cache_dir: Some(PathBuf::from("/tmp/jbpm-cache")), max_concurrent_fetches: Some(8) };
        config.save(&path).unwrap();

        let reloaded = GlobalConfig::load_from(&path).unwrap();
        assert_eq!(reloaded.max_concurrent_fetches, Some(8));
    }
}
