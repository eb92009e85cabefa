//! Configuration loading.
//!
//! Configuration is optional. When no file exists, defaults apply: the
//! service namespace is derived from the running executable and the OS
//! keychain is preferred.
//!
//! # File Location
//!
//! `keychest.toml` in the platform configuration directory, e.g.
//! `~/.config/keychest/keychest.toml` on Linux.
//!
//! ```toml
//! service = "com.example.app"
//! backend = "keyring"
//! ```

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Namespace used when neither the caller nor the executable name supplies one.
pub const FALLBACK_SERVICE_NAME: &str = "keychest";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error reading the configuration file.
    #[error("failed to read config from {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The file is not valid TOML or has unexpected fields.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Configuration directory not available.
    #[error("configuration directory not available")]
    ConfigDirUnavailable,
}

/// Which secret store backs the accessor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// The OS keychain, falling back to memory when it is unavailable.
    #[default]
    Keyring,

    /// A process-local map. Nothing persists.
    Memory,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeychestConfig {
    /// Service namespace. `None` means [`default_service_name`].
    #[serde(default)]
    pub service: Option<String>,

    #[serde(default)]
    pub backend: Backend,
}

impl KeychestConfig {
    /// Load from the default location, or return defaults if no file exists.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path()?;
        if !path.exists() {
            tracing::debug!("No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        Self::load_from_path(&path)
    }

    /// Load from a specific file.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&contents)?;
        tracing::debug!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Path of `keychest.toml` in the platform configuration directory.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let dirs = ProjectDirs::from("", "", "keychest").ok_or(ConfigError::ConfigDirUnavailable)?;
        Ok(dirs.config_dir().join("keychest.toml"))
    }

    /// The configured namespace, or the default one.
    pub fn service_name(&self) -> String {
        self.service.clone().unwrap_or_else(default_service_name)
    }
}

/// Namespace for the host application: the running executable's file stem.
///
/// Falls back to [`FALLBACK_SERVICE_NAME`] when the executable path is unknown.
pub fn default_service_name() -> String {
    std::env::current_exe()
        .ok()
        .and_then(|path| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| FALLBACK_SERVICE_NAME.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = KeychestConfig::default();
        assert_eq!(config.service, None);
        assert_eq!(config.backend, Backend::Keyring);
        assert!(!config.service_name().is_empty());
    }

    #[test]
    fn test_parse_full() {
        let config = KeychestConfig::from_toml_str(
            r#"
            service = "com.example.app"
            backend = "memory"
            "#,
        )
        .unwrap();

        assert_eq!(config.service_name(), "com.example.app");
        assert_eq!(config.backend, Backend::Memory);
    }

    #[test]
    fn test_parse_empty() {
        let config = KeychestConfig::from_toml_str("").unwrap();
        assert_eq!(config, KeychestConfig::default());
    }

    #[test]
    fn test_parse_rejects_unknown_backend() {
        let result = KeychestConfig::from_toml_str(r#"backend = "cloud""#);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_parse_rejects_unknown_field() {
        let result = KeychestConfig::from_toml_str(r#"servce = "typo""#);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_from_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("keychest.toml");
        fs::write(&path, "service = \"from-file\"\n").unwrap();

        let config = KeychestConfig::load_from_path(&path).unwrap();
        assert_eq!(config.service.as_deref(), Some("from-file"));
        assert_eq!(config.backend, Backend::Keyring);
    }

    #[test]
    fn test_load_from_missing_path() {
        let temp_dir = TempDir::new().unwrap();
        let result = KeychestConfig::load_from_path(&temp_dir.path().join("missing.toml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_default_service_name_not_empty() {
        assert!(!default_service_name().is_empty());
    }
}
