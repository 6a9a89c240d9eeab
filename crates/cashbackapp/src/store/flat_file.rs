use super::json::JsonFormat;
use super::xml::XmlFormat;
use super::{require_id, CardStore};
use crate::error::{CashbackError, Result};
use crate::model::{sort_newest_first, Card, CardHistory, CardId, HistoryId};
use chrono::NaiveDate;
use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const CARDS_FILE_STEM: &str = "cards";
pub const HISTORY_FILE_STEM: &str = "card_history";

/// Serialization format for a flat-file store.
///
/// This trait handles the "how" of encoding (JSON vs XML), while
/// [`FlatFileStore`] handles the "what" (id assignment, the history rule,
/// queries and whole-file rewrites).
pub trait FileFormat {
    /// File extension without the leading dot.
    const EXTENSION: &'static str;

    fn encode_cards(cards: &[Card]) -> Result<String>;

    fn decode_cards(raw: &str) -> Result<Vec<Card>>;

    fn encode_history(records: &[CardHistory]) -> Result<String>;

    fn decode_history(raw: &str) -> Result<Vec<CardHistory>>;
}

/// A card store backed by two files in one directory.
///
/// Both collections live in memory for the lifetime of the store. Every
/// mutating call rewrites the affected file in full (tmp file + rename);
/// there are no partial or append-only writes.
pub struct FlatFileStore<F: FileFormat> {
    dir: PathBuf,
    cards: Vec<Card>,
    history: Vec<CardHistory>,
    next_card_id: CardId,
    next_history_id: HistoryId,
    _format: PhantomData<F>,
}

pub type JsonStore = FlatFileStore<JsonFormat>;
pub type XmlStore = FlatFileStore<XmlFormat>;

enum Loaded<T> {
    Records(Vec<T>),
    /// Missing or empty file: write an empty collection back.
    Blank,
    /// Unparseable file: start empty, leave the bytes alone until the next write.
    Corrupt,
}

impl<F: FileFormat> FlatFileStore<F> {
    /// Open (or create) the store in `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        ensure_dir(&dir)?;

        let mut store = Self {
            dir,
            cards: Vec::new(),
            history: Vec::new(),
            next_card_id: 1,
            next_history_id: 1,
            _format: PhantomData,
        };

        match store.load(&store.cards_path(), F::decode_cards)? {
            Loaded::Records(cards) => store.cards = cards,
            Loaded::Blank => store.write_cards()?,
            Loaded::Corrupt => {}
        }
        match store.load(&store.history_path(), F::decode_history)? {
            Loaded::Records(history) => store.history = history,
            Loaded::Blank => store.write_history()?,
            Loaded::Corrupt => {}
        }

        store.seed_counters();
        info!(
            dir = %store.dir.display(),
            format = F::EXTENSION,
            cards = store.cards.len(),
            history = store.history.len(),
            "Opened flat-file store"
        );
        Ok(store)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn cards_path(&self) -> PathBuf {
        self.dir
            .join(format!("{}.{}", CARDS_FILE_STEM, F::EXTENSION))
    }

    pub fn history_path(&self) -> PathBuf {
        self.dir
            .join(format!("{}.{}", HISTORY_FILE_STEM, F::EXTENSION))
    }

    fn load<T>(&self, path: &Path, decode: fn(&str) -> Result<Vec<T>>) -> Result<Loaded<T>> {
        if !path.exists() {
            return Ok(Loaded::Blank);
        }
        let raw = fs::read_to_string(path).map_err(CashbackError::Io)?;
        if raw.trim().is_empty() {
            return Ok(Loaded::Blank);
        }
        match decode(&raw) {
            Ok(records) => Ok(Loaded::Records(records)),
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Corrupt data file, starting with an empty collection"
                );
                Ok(Loaded::Corrupt)
            }
        }
    }

    /// Ids continue after the highest one seen. Card ids also account for
    /// history, so a recreated id never inherits a deleted card's history.
    fn seed_counters(&mut self) {
        let max_card = self
            .cards
            .iter()
            .filter_map(|c| c.id)
            .chain(self.history.iter().map(|h| h.card_id))
            .max()
            .unwrap_or(0);
        let max_history = self.history.iter().filter_map(|h| h.id).max().unwrap_or(0);
        self.next_card_id = max_card + 1;
        self.next_history_id = max_history + 1;
    }

    fn write_cards(&self) -> Result<()> {
        let content = F::encode_cards(&self.cards)?;
        write_atomic(&self.dir, &self.cards_path(), &content)
    }

    fn write_history(&self) -> Result<()> {
        let content = F::encode_history(&self.history)?;
        write_atomic(&self.dir, &self.history_path(), &content)
    }

    fn append_history(&mut self, mut record: CardHistory) -> Result<HistoryId> {
        let id = self.next_history_id;
        record.id = Some(id);
        self.history.push(record);
        if let Err(e) = self.write_history() {
            self.history.pop();
            return Err(e);
        }
        self.next_history_id += 1;
        Ok(id)
    }
}

impl<F: FileFormat + Send> CardStore for FlatFileStore<F> {
    fn save_card(&mut self, card: &mut Card) -> Result<CardId> {
        card.trim_text();
        let id = self.next_card_id;

        // History goes first: a card on disk always has its initial record.
        self.append_history(CardHistory::snapshot(id, card))?;

        let mut stored = card.clone();
        stored.id = Some(id);
        self.cards.push(stored);
        let written = self.write_cards();
        // The id is now referenced by history either way, so it is spent.
        self.next_card_id += 1;
        if let Err(e) = written {
            self.cards.pop();
            return Err(e);
        }

        card.id = Some(id);
        debug!(id, format = F::EXTENSION, "Saved card");
        Ok(id)
    }

    fn update_card(&mut self, card: &Card) -> Result<()> {
        let id = require_id(card)?;
        let card = &card.trimmed();

        let terms_changed = self
            .cards
            .iter()
            .find(|c| c.id == Some(id))
            .map(|old| old.terms_differ(card));
        if terms_changed == Some(true) {
            self.append_history(CardHistory::snapshot(id, card))?;
        }

        let previous = match self.cards.iter_mut().find(|c| c.id == Some(id)) {
            Some(slot) => Some(std::mem::replace(slot, card.clone())),
            None => {
                debug!(id, "Update for unknown card, inserting");
                self.cards.push(card.clone());
                None
            }
        };
        if let Err(e) = self.write_cards() {
            // Keep memory in step with what is on disk.
            match previous {
                Some(old) => {
                    if let Some(slot) = self.cards.iter_mut().find(|c| c.id == Some(id)) {
                        *slot = old;
                    }
                }
                None => {
                    self.cards.pop();
                }
            }
            return Err(e);
        }
        self.next_card_id = self.next_card_id.max(id + 1);
        debug!(id, history = terms_changed == Some(true), "Updated card");
        Ok(())
    }

    fn delete_card(&mut self, id: CardId) -> Result<()> {
        let Some(pos) = self.cards.iter().position(|c| c.id == Some(id)) else {
            return Ok(());
        };
        let removed = self.cards.remove(pos);
        if let Err(e) = self.write_cards() {
            self.cards.insert(pos, removed);
            return Err(e);
        }
        debug!(id, "Deleted card");
        Ok(())
    }

    fn get_all_cards(&self) -> Result<Vec<Card>> {
        Ok(self.cards.clone())
    }

    fn get_card_by_id(&self, id: CardId) -> Result<Option<Card>> {
        Ok(self.cards.iter().find(|c| c.id == Some(id)).cloned())
    }

    fn save_history(&mut self, record: &mut CardHistory) -> Result<HistoryId> {
        record.trim_text();
        let id = self.append_history(record.clone())?;
        record.id = Some(id);
        Ok(id)
    }

    fn find_history_by_card_id(&self, card_id: CardId) -> Result<Vec<CardHistory>> {
        let mut records: Vec<CardHistory> = self
            .history
            .iter()
            .filter(|h| h.card_id == card_id)
            .cloned()
            .collect();
        sort_newest_first(&mut records);
        Ok(records)
    }

    fn find_by_category(&self, category: &str) -> Result<Vec<Card>> {
        Ok(self
            .cards
            .iter()
            .filter(|c| c.matches_category(category))
            .cloned()
            .collect())
    }

    fn find_by_expiring_category(&self, date: NaiveDate) -> Result<Vec<Card>> {
        Ok(self
            .cards
            .iter()
            .filter(|c| c.is_due(date))
            .cloned()
            .collect())
    }
}

fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path).map_err(CashbackError::Io)?;
    }
    Ok(())
}

/// Replace `target` with `content` via a sibling temp file.
fn write_atomic(dir: &Path, target: &Path, content: &str) -> Result<()> {
    ensure_dir(dir)?;
    let tmp = dir.join(format!(".cashback-{}.tmp", Uuid::new_v4()));
    fs::write(&tmp, content).map_err(CashbackError::Io)?;
    fs::rename(&tmp, target).map_err(CashbackError::Io)?;
    Ok(())
}
