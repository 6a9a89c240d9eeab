//! # Configuration
//!
//! Cashback configuration is loaded with [`confique`] from layered sources,
//! in priority order:
//!
//! 1. **Environment variables**: `CASHBACK_STORAGE`.
//! 2. **Config file**: `cashback.toml` in the startup root (see [`crate::init`]),
//!    ignored when absent.
//! 3. **Compiled defaults**: via `#[config(default = ...)]`.
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `storage` | `sqlite` | Backend to open: `sqlite`, `json` or `xml` |
//! | `data_dir` | (none) | Moves the backends' files elsewhere; relative paths start at the config file's directory |
//!
//! `--storage` overrides `storage`. `--data-dir` and `CASHBACK_DATA_DIR` pick
//! the startup root the config file is read from.

use crate::error::{CashbackError, Result};
use crate::store::factory::StorageKind;
use confique::Config;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

pub const CONFIG_FILE_NAME: &str = "cashback.toml";

/// Configuration for cashback, stored in `cashback.toml`.
#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CashbackConfig {
    /// Storage backend tag (sqlite, json, xml).
    #[config(env = "CASHBACK_STORAGE", default = "sqlite")]
    pub storage: String,

    /// Directory for the backends' data files. When absent, the startup root
    /// holding this config file is used.
    pub data_dir: Option<PathBuf>,
}

impl Default for CashbackConfig {
    fn default() -> Self {
        Self {
            storage: StorageKind::default().to_string(),
            data_dir: None,
        }
    }
}

impl CashbackConfig {
    /// Load from the environment, then `<data_root>/cashback.toml`, then defaults.
    pub fn load(data_root: &Path) -> Result<Self> {
        Self::builder()
            .env()
            .file(data_root.join(CONFIG_FILE_NAME))
            .load()
            .map_err(|e| CashbackError::Config(e.to_string()))
    }

    /// The configured backend. An unrecognized tag is a configuration error.
    pub fn storage_kind(&self) -> Result<StorageKind> {
        self.storage.parse()
    }

    /// Where the backends keep their files, given the root this config was
    /// loaded from.
    pub fn data_root(&self, config_root: &Path) -> PathBuf {
        match &self.data_dir {
            Some(dir) => config_root.join(dir),
            None => config_root.to_path_buf(),
        }
    }

    /// The configured backend, falling back to SQLite on an unrecognized tag.
    pub fn storage_kind_or_default(&self) -> StorageKind {
        self.storage_kind().unwrap_or_else(|e| {
            warn!(error = %e, "Falling back to default storage");
            StorageKind::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = CashbackConfig::default();
        assert_eq!(config.storage, "sqlite");
        assert_eq!(config.data_dir, None);
        assert_eq!(config.storage_kind().unwrap(), StorageKind::Sqlite);
    }

    #[test]
    fn test_storage_kind_from_config() {
        let config = CashbackConfig {
            storage: "XML".to_string(),
            ..Default::default()
        };
        assert_eq!(config.storage_kind().unwrap(), StorageKind::Xml);
    }

    #[test]
    fn test_invalid_storage_is_config_error() {
        let config = CashbackConfig {
            storage: "mongo".to_string(),
            ..Default::default()
        };
        assert!(config.storage_kind().unwrap_err().is_config());
        assert_eq!(config.storage_kind_or_default(), StorageKind::Sqlite);
    }

    #[test]
    fn test_load_reads_config_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "storage = \"json\"\n").unwrap();
        let config = CashbackConfig::load(dir.path()).unwrap();
        assert_eq!(config.storage_kind().unwrap(), StorageKind::Json);
    }

    #[test]
    fn test_data_root_defaults_to_config_root() {
        let config = CashbackConfig::default();
        assert_eq!(config.data_root(Path::new("/srv/cashback")), Path::new("/srv/cashback"));
    }

    #[test]
    fn test_data_root_resolves_relative_and_absolute_dirs() {
        let relative = CashbackConfig {
            data_dir: Some(PathBuf::from("cards")),
            ..Default::default()
        };
        assert_eq!(
            relative.data_root(Path::new("/srv/cashback")),
            Path::new("/srv/cashback/cards")
        );

        let absolute = CashbackConfig {
            data_dir: Some(PathBuf::from("/var/lib/cards")),
            ..Default::default()
        };
        assert_eq!(
            absolute.data_root(Path::new("/srv/cashback")),
            Path::new("/var/lib/cards")
        );
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = CashbackConfig::load(dir.path()).unwrap();
        assert_eq!(config.storage_kind_or_default(), StorageKind::Sqlite);
    }
}
