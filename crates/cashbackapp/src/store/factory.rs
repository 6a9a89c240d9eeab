use super::flat_file::{JsonStore, XmlStore};
use super::sqlite::{SqliteStore, DEFAULT_DB_FILENAME};
use super::CardStore;
use crate::error::{CashbackError, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

/// Which backend a [`StoreFactory`] builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StorageKind {
    #[default]
    Sqlite,
    Json,
    Xml,
}

impl StorageKind {
    pub const ALL: [StorageKind; 3] = [StorageKind::Sqlite, StorageKind::Json, StorageKind::Xml];

    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKind::Sqlite => "sqlite",
            StorageKind::Json => "json",
            StorageKind::Xml => "xml",
        }
    }

    /// Subdirectory of the data root holding this backend's files.
    pub fn dir_name(&self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageKind {
    type Err = CashbackError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(StorageKind::Sqlite),
            "json" => Ok(StorageKind::Json),
            "xml" => Ok(StorageKind::Xml),
            _ => Err(CashbackError::UnknownStorageKind(s.to_string())),
        }
    }
}

/// Builds card stores under one data root.
///
/// Stateless apart from the root: every [`create`](Self::create) call returns a
/// fresh, independent backend.
#[derive(Debug, Clone)]
pub struct StoreFactory {
    data_root: PathBuf,
}

impl StoreFactory {
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
        }
    }

    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    /// The directory (file backends) or database file (SQLite) for `kind`.
    pub fn location(&self, kind: StorageKind) -> PathBuf {
        let dir = self.data_root.join(kind.dir_name());
        match kind {
            StorageKind::Sqlite => dir.join(DEFAULT_DB_FILENAME),
            StorageKind::Json | StorageKind::Xml => dir,
        }
    }

    pub fn create(&self, kind: StorageKind) -> Result<Box<dyn CardStore>> {
        let location = self.location(kind);
        info!(kind = %kind, location = %location.display(), "Creating card store");
        let store: Box<dyn CardStore> = match kind {
            StorageKind::Sqlite => Box::new(SqliteStore::open(location)?),
            StorageKind::Json => Box::new(JsonStore::open(location)?),
            StorageKind::Xml => Box::new(XmlStore::open(location)?),
        };
        Ok(store)
    }
}
