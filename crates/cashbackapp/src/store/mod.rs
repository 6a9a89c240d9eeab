//! # Storage Layer
//!
//! This module defines the storage abstraction for cashback data. The
//! [`CardStore`] trait is the one contract every backend implements, and the
//! [`factory`] module picks a backend by [`StorageKind`](factory::StorageKind).
//!
//! ## Backends
//!
//! - [`sqlite::SqliteStore`]: a single SQLite database with `cards` and
//!   `card_history` tables. Each call opens its own connection.
//! - [`flat_file::JsonStore`] / [`flat_file::XmlStore`]: the full card list and
//!   the full history list held in memory and rewritten to disk, whole, on
//!   every mutation.
//! - [`memory::InMemoryStore`]: no persistence at all, for testing logic.
//!
//! ## The History Rule
//!
//! Every backend enforces the same invariant itself rather than leaving it to
//! callers:
//!
//! 1. `save_card` assigns the id and writes exactly one history record with the
//!    card's initial category and rate.
//! 2. `update_card` compares the incoming card with the stored one. If the
//!    category or the rate differs, one history record is appended *before*
//!    the new card state is persisted.
//! 3. Nothing else writes history implicitly. A status flip alone does not.
//!
//! ## Shared Semantics
//!
//! - Unknown ids are never errors: `update_card` upserts (without history),
//!   `delete_card` is a no-op, `get_card_by_id` returns `None`.
//! - Category lookups are case-insensitive in every backend.
//! - "Expiring" means active with a change date on or before the given date.
//! - History comes back newest-first by record timestamp.
//! - Text fields are stored with surrounding whitespace trimmed.
//!
//! ## Storage Layout
//!
//! ```text
//! <data root>/
//! ├── sqlite/cashback.db
//! ├── json/cards.json
//! ├── json/card_history.json
//! ├── xml/cards.xml
//! └── xml/card_history.xml
//! ```

use crate::error::Result;
use crate::model::{Card, CardHistory, CardId, HistoryId};
use chrono::NaiveDate;

pub mod factory;
pub mod flat_file;
pub mod json;
pub mod memory;
pub mod sqlite;
pub mod xml;

/// Abstract interface for card storage.
///
/// Implementations own durability and the history-on-change rule; callers
/// only ever see plain [`Card`] and [`CardHistory`] values.
pub trait CardStore: Send {
    /// Assign an id, persist the card and record its initial terms.
    /// The assigned id is written back into `card`.
    fn save_card(&mut self, card: &mut Card) -> Result<CardId>;

    /// Replace the stored card with the same id, recording a history entry
    /// first if the category or rate changed.
    fn update_card(&mut self, card: &Card) -> Result<()>;

    /// Remove a card. Absent ids are ignored and history is kept.
    fn delete_card(&mut self, id: CardId) -> Result<()>;

    fn get_all_cards(&self) -> Result<Vec<Card>>;

    fn get_card_by_id(&self, id: CardId) -> Result<Option<Card>>;

    /// Append a history record, assigning its id.
    /// The record's timestamp is stored as given.
    fn save_history(&mut self, record: &mut CardHistory) -> Result<HistoryId>;

    /// All history for a card, newest first.
    fn find_history_by_card_id(&self, card_id: CardId) -> Result<Vec<CardHistory>>;

    /// Cards in the given category, compared case-insensitively.
    fn find_by_category(&self, category: &str) -> Result<Vec<Card>>;

    /// Active cards whose category-change date is on or before `date`.
    fn find_by_expiring_category(&self, date: NaiveDate) -> Result<Vec<Card>>;
}

/// The id an update targets, or an error for a card that was never saved.
pub(crate) fn require_id(card: &Card) -> Result<CardId> {
    card.id.ok_or_else(|| {
        crate::error::CashbackError::MissingId(format!(
            "{} {} has not been saved",
            card.bank_name, card.card_name
        ))
    })
}
