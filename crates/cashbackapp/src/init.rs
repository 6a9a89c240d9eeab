//! # Startup
//!
//! [`initialize`] turns the few things a UI knows at startup (an optional data
//! directory, an optional storage tag) into a ready [`CardService`].
//!
//! ## Data Root Resolution
//!
//! The startup root is found first:
//!
//! 1. `data_override` (the CLI's `--data-dir`), used as given.
//! 2. `CASHBACK_DATA_DIR` environment variable.
//! 3. The OS data directory, via the `directories` crate.
//!
//! The config file is read from the startup root. If it sets `data_dir`, the
//! backends keep their files there instead; otherwise they use the startup
//! root.
//!
//! ## Storage Resolution
//!
//! An explicit `storage_override` wins over the configured `storage` key. An
//! unrecognized tag from either source is logged and replaced by SQLite, so a
//! bad setting never stops the program from starting.

use crate::config::CashbackConfig;
use crate::error::{CashbackError, Result};
use crate::service::CardService;
use crate::store::factory::{StorageKind, StoreFactory};
use directories::ProjectDirs;
use std::path::PathBuf;
use tracing::{info, warn};

pub const DATA_DIR_ENV: &str = "CASHBACK_DATA_DIR";

pub struct CashbackContext {
    pub service: CardService,
    pub config: CashbackConfig,
    pub data_root: PathBuf,
}

/// Resolve where all backends keep their files.
pub fn resolve_data_root(data_override: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = data_override {
        return Ok(path);
    }
    if let Some(path) = std::env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    ProjectDirs::from("com", "cashback", "cashback")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| CashbackError::Config("could not determine a data directory".to_string()))
}

fn resolve_kind(config: &CashbackConfig, storage_override: Option<&str>) -> StorageKind {
    match storage_override {
        Some(tag) => tag.parse().unwrap_or_else(|e| {
            warn!(error = %e, "Falling back to default storage");
            StorageKind::default()
        }),
        None => config.storage_kind_or_default(),
    }
}

pub fn initialize(
    data_override: Option<PathBuf>,
    storage_override: Option<&str>,
) -> Result<CashbackContext> {
    let config_root = resolve_data_root(data_override)?;
    let config = CashbackConfig::load(&config_root)?;
    let data_root = config.data_root(&config_root);
    let kind = resolve_kind(&config, storage_override);

    info!(data_root = %data_root.display(), storage = %kind, "Initializing");
    let service = CardService::open(StoreFactory::new(&data_root), kind)?;

    Ok(CashbackContext {
        service,
        config,
        data_root,
    })
}
