//! SQLite-backed card store.
//!
//! # Schema
//!
//! - `cards`: one row per card, `status` stored as its `ACTIVE`/`EXPIRED` tag
//! - `card_history`: append-only snapshots, `card_id` references `cards(id)`
//!
//! Dates are `YYYY-MM-DD` text and record timestamps are RFC 3339 text with
//! nanoseconds (always nine digits), so both sort correctly as strings.
//!
//! The `card_history.card_id` foreign key is declared for documentation only.
//! Bundled SQLite enforces foreign keys by default, so every connection turns
//! enforcement off: history must outlive a deleted card.

use super::{require_id, CardStore};
use crate::error::{CashbackError, Result};
use crate::model::{Card, CardHistory, CardId, CardStatus, HistoryId};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const DEFAULT_DB_FILENAME: &str = "cashback.db";

const DATE_FORMAT: &str = "%Y-%m-%d";

const CARD_COLUMNS: &str =
    "id, bank_name, card_name, category, cashback, category_change_date, status";

const HISTORY_COLUMNS: &str = "id, card_id, category, cashback, change_date, recorded_at";

/// A card store over one SQLite database file.
///
/// Holds only the path. Every call opens its own connection, which is closed
/// when the call returns on any path.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    db_path: PathBuf,
}

impl SqliteStore {
    /// Open the database at `db_path`, creating the parent directory and the
    /// schema if they don't exist.
    pub fn open(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let store = Self { db_path };
        store.create_schema()?;
        info!(path = %store.db_path.display(), "Opened SQLite store");
        Ok(store)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn connection(&self) -> Result<Connection> {
        let conn = Connection::open(&self.db_path)?;
        conn.pragma_update(None, "foreign_keys", false)?;
        Ok(conn)
    }

    fn create_schema(&self) -> Result<()> {
        self.connection()?.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS cards (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                bank_name TEXT NOT NULL,
                card_name TEXT NOT NULL,
                category TEXT NOT NULL,
                cashback REAL NOT NULL,
                category_change_date TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'ACTIVE'
            );

            CREATE TABLE IF NOT EXISTS card_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                card_id INTEGER NOT NULL REFERENCES cards(id),
                category TEXT NOT NULL,
                cashback REAL NOT NULL,
                change_date TEXT NOT NULL,
                recorded_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_card_history_card_id ON card_history(card_id);
            "#,
        )?;
        Ok(())
    }

    fn select_cards(&self, filter: &str, date: Option<&str>) -> Result<Vec<Card>> {
        let conn = self.connection()?;
        let sql = format!("SELECT {} FROM cards {} ORDER BY id", CARD_COLUMNS, filter);
        let mut stmt = conn.prepare(&sql)?;
        let rows = match date {
            Some(d) => stmt
                .query_map([d], CardRow::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?,
            None => stmt
                .query_map([], CardRow::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?,
        };
        rows.into_iter().map(Card::try_from).collect()
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn find_card(conn: &Connection, id: CardId) -> Result<Option<Card>> {
    let sql = format!("SELECT {} FROM cards WHERE id = ?1", CARD_COLUMNS);
    let row = conn
        .query_row(&sql, [id], CardRow::from_row)
        .optional()?;
    row.map(Card::try_from).transpose()
}

fn insert_history(conn: &Connection, record: &CardHistory) -> Result<HistoryId> {
    conn.execute(
        "INSERT INTO card_history (card_id, category, cashback, change_date, recorded_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            record.card_id,
            record.category,
            record.cashback,
            format_date(record.change_date),
            format_timestamp(&record.recorded_at),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// A `cards` row as stored, before its text columns are parsed.
struct CardRow {
    id: CardId,
    bank_name: String,
    card_name: String,
    category: String,
    cashback: f64,
    category_change_date: String,
    status: String,
}

impl CardRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            bank_name: row.get(1)?,
            card_name: row.get(2)?,
            category: row.get(3)?,
            cashback: row.get(4)?,
            category_change_date: row.get(5)?,
            status: row.get(6)?,
        })
    }
}

impl TryFrom<CardRow> for Card {
    type Error = CashbackError;

    fn try_from(row: CardRow) -> Result<Self> {
        let corrupt = |reason: String| CashbackError::Corrupt {
            card_id: row.id,
            reason,
        };
        let category_change_date = NaiveDate::parse_from_str(&row.category_change_date, DATE_FORMAT)
            .map_err(|e| corrupt(format!("bad date '{}': {}", row.category_change_date, e)))?;
        let status: CardStatus = row
            .status
            .parse()
            .map_err(|_| corrupt(format!("bad status '{}'", row.status)))?;

        Ok(Card {
            id: Some(row.id),
            bank_name: row.bank_name,
            card_name: row.card_name,
            category: row.category,
            cashback: row.cashback,
            category_change_date,
            status,
        })
    }
}

struct HistoryRow {
    id: HistoryId,
    card_id: CardId,
    category: String,
    cashback: f64,
    change_date: String,
    recorded_at: String,
}

impl HistoryRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            card_id: row.get(1)?,
            category: row.get(2)?,
            cashback: row.get(3)?,
            change_date: row.get(4)?,
            recorded_at: row.get(5)?,
        })
    }
}

impl TryFrom<HistoryRow> for CardHistory {
    type Error = CashbackError;

    fn try_from(row: HistoryRow) -> Result<Self> {
        let corrupt = |reason: String| CashbackError::Corrupt {
            card_id: row.card_id,
            reason,
        };
        let change_date = NaiveDate::parse_from_str(&row.change_date, DATE_FORMAT)
            .map_err(|e| corrupt(format!("bad change date '{}': {}", row.change_date, e)))?;
        let recorded_at = DateTime::parse_from_rfc3339(&row.recorded_at)
            .map_err(|e| corrupt(format!("bad timestamp '{}': {}", row.recorded_at, e)))?
            .with_timezone(&Utc);

        Ok(CardHistory {
            id: Some(row.id),
            card_id: row.card_id,
            category: row.category,
            cashback: row.cashback,
            change_date,
            recorded_at,
        })
    }
}

impl CardStore for SqliteStore {
    fn save_card(&mut self, card: &mut Card) -> Result<CardId> {
        card.trim_text();
        let mut conn = self.connection()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO cards (bank_name, card_name, category, cashback, category_change_date, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                card.bank_name,
                card.card_name,
                card.category,
                card.cashback,
                format_date(card.category_change_date),
                card.status.as_str(),
            ],
        )?;
        let id = tx.last_insert_rowid();
        insert_history(&tx, &CardHistory::snapshot(id, card))?;
        tx.commit()?;

        card.id = Some(id);
        debug!(id, "Saved card");
        Ok(id)
    }

    fn update_card(&mut self, card: &Card) -> Result<()> {
        let id = require_id(card)?;
        let card = &card.trimmed();
        let mut conn = self.connection()?;
        let tx = conn.transaction()?;

        let terms_changed = find_card(&tx, id)?.map(|old| old.terms_differ(card));
        if terms_changed == Some(true) {
            insert_history(&tx, &CardHistory::snapshot(id, card))?;
        }
        if terms_changed.is_none() {
            debug!(id, "Update for unknown card, inserting");
        }

        tx.execute(
            "INSERT INTO cards (id, bank_name, card_name, category, cashback, category_change_date, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(id) DO UPDATE SET
                bank_name = excluded.bank_name,
                card_name = excluded.card_name,
                category = excluded.category,
                cashback = excluded.cashback,
                category_change_date = excluded.category_change_date,
                status = excluded.status",
            params![
                id,
                card.bank_name,
                card.card_name,
                card.category,
                card.cashback,
                format_date(card.category_change_date),
                card.status.as_str(),
            ],
        )?;
        tx.commit()?;

        debug!(id, history = terms_changed == Some(true), "Updated card");
        Ok(())
    }

    fn delete_card(&mut self, id: CardId) -> Result<()> {
        let removed = self
            .connection()?
            .execute("DELETE FROM cards WHERE id = ?1", [id])?;
        debug!(id, removed, "Deleted card");
        Ok(())
    }

    fn get_all_cards(&self) -> Result<Vec<Card>> {
        self.select_cards("", None)
    }

    fn get_card_by_id(&self, id: CardId) -> Result<Option<Card>> {
        find_card(&self.connection()?, id)
    }

    fn save_history(&mut self, record: &mut CardHistory) -> Result<HistoryId> {
        record.trim_text();
        let id = insert_history(&self.connection()?, record)?;
        record.id = Some(id);
        Ok(id)
    }

    fn find_history_by_card_id(&self, card_id: CardId) -> Result<Vec<CardHistory>> {
        let conn = self.connection()?;
        let sql = format!(
            "SELECT {} FROM card_history WHERE card_id = ?1 ORDER BY recorded_at DESC, id DESC",
            HISTORY_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map([card_id], HistoryRow::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(CardHistory::try_from).collect()
    }

    fn find_by_category(&self, category: &str) -> Result<Vec<Card>> {
        // NOCASE only folds ASCII, so match in Rust.
        let mut cards = self.get_all_cards()?;
        cards.retain(|c| c.matches_category(category));
        Ok(cards)
    }

    fn find_by_expiring_category(&self, date: NaiveDate) -> Result<Vec<Card>> {
        self.select_cards(
            "WHERE status = 'ACTIVE' AND category_change_date <= ?1",
            Some(&format_date(date)),
        )
    }
}
