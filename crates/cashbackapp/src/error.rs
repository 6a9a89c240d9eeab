use crate::model::CardId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CashbackError {
    #[error("Unknown storage kind: {0} (expected one of: sqlite, json, xml)")]
    UnknownStorageKind(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid card: {0}")]
    InvalidCard(String),

    #[error("Card has no identifier: {0}")]
    MissingId(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Corrupt record for card {card_id}: {reason}")]
    Corrupt { card_id: CardId, reason: String },
}

impl CashbackError {
    /// Configuration problems are reported before any storage is touched.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            CashbackError::UnknownStorageKind(_) | CashbackError::Config(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CashbackError>;
