//! # Card Service
//!
//! The service is the single entry point for UIs (the CLI today). It holds
//! exactly one active [`CardStore`] and, when built with [`CardService::open`],
//! the [`StoreFactory`] used to build it.
//!
//! ## What the Service Does
//!
//! - Validates cards before they reach a store
//! - Answers the one cross-card question: the best card for a category
//! - Swaps the active backend at runtime
//! - Runs the expiry sweep and the list filters the UI offers
//!
//! ## What It Leaves to the Store
//!
//! Id assignment, durability and the history rule. The service never writes
//! history itself, and it adds no error translation: store errors come back
//! as they are.
//!
//! ## Switching Storage
//!
//! `switch_storage` builds the new backend first and only then drops the old
//! one, so a failure leaves the previous backend in place. Nothing is migrated
//! between backends; each keeps its own data on disk.

use crate::error::{CashbackError, Result};
use crate::model::{categories_match, Card, CardHistory, CardId, CardStatus};
use crate::store::factory::{StorageKind, StoreFactory};
use crate::store::CardStore;
use chrono::NaiveDate;
use tracing::{debug, info};

/// Optional narrowing for [`CardService::filter_cards`]. Empty fields match all.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CardFilter {
    /// Exact bank name.
    pub bank: Option<String>,
    /// Category, compared case-insensitively.
    pub category: Option<String>,
    pub status: Option<CardStatus>,
}

impl CardFilter {
    pub fn matches(&self, card: &Card) -> bool {
        self.bank.as_deref().map_or(true, |b| card.bank_name == b)
            && self
                .category
                .as_deref()
                .map_or(true, |c| categories_match(&card.category, c))
            && self.status.map_or(true, |s| card.status == s)
    }
}

pub struct CardService {
    store: Box<dyn CardStore>,
    factory: Option<StoreFactory>,
    kind: Option<StorageKind>,
}

impl CardService {
    /// Build the initial backend of `kind` through `factory`.
    pub fn open(factory: StoreFactory, kind: StorageKind) -> Result<Self> {
        let store = factory.create(kind)?;
        Ok(Self {
            store,
            factory: Some(factory),
            kind: Some(kind),
        })
    }

    /// Wrap an already-built store. Such a service cannot switch storage.
    pub fn with_store(store: Box<dyn CardStore>) -> Self {
        Self {
            store,
            factory: None,
            kind: None,
        }
    }

    /// The kind currently active, if the service was built from a factory.
    pub fn storage_kind(&self) -> Option<StorageKind> {
        self.kind
    }

    pub fn add_card(&mut self, card: &mut Card) -> Result<CardId> {
        card.validate()?;
        self.store.save_card(card)
    }

    pub fn update_card(&mut self, card: &Card) -> Result<()> {
        card.validate()?;
        self.store.update_card(card)
    }

    pub fn delete_card(&mut self, id: CardId) -> Result<()> {
        self.store.delete_card(id)
    }

    pub fn get_all_cards(&self) -> Result<Vec<Card>> {
        self.store.get_all_cards()
    }

    pub fn get_card(&self, id: CardId) -> Result<Option<Card>> {
        self.store.get_card_by_id(id)
    }

    pub fn get_expiring_cards(&self, date: NaiveDate) -> Result<Vec<Card>> {
        self.store.find_by_expiring_category(date)
    }

    pub fn get_card_history(&self, card_id: CardId) -> Result<Vec<CardHistory>> {
        self.store.find_history_by_card_id(card_id)
    }

    /// The active card with the highest rate in `category`. Ties go to the
    /// card the store returned first.
    pub fn find_best_card_for_category(&self, category: &str) -> Result<Option<Card>> {
        let mut best: Option<Card> = None;
        for card in self.store.find_by_category(category)? {
            if !card.is_active() {
                continue;
            }
            if best.as_ref().map_or(true, |b| card.cashback > b.cashback) {
                best = Some(card);
            }
        }
        Ok(best)
    }

    /// Replace the active backend with a fresh one of `kind`.
    pub fn switch_storage(&mut self, kind: StorageKind) -> Result<()> {
        let Some(factory) = &self.factory else {
            return Err(CashbackError::Config(
                "storage switching needs a store factory".to_string(),
            ));
        };
        let store = factory.create(kind)?;
        self.store = store;
        let previous = self.kind.replace(kind);
        info!(from = ?previous, to = %kind, "Switched storage");
        Ok(())
    }

    /// Mark every card due on `date` as expired. Returns the cards flipped.
    pub fn expire_due_cards(&mut self, date: NaiveDate) -> Result<Vec<Card>> {
        let due = self.get_expiring_cards(date)?;
        let mut expired = Vec::with_capacity(due.len());
        for card in due {
            let card = card.with_status(CardStatus::Expired);
            self.store.update_card(&card)?;
            expired.push(card);
        }
        info!(%date, count = expired.len(), "Expired due cards");
        Ok(expired)
    }

    pub fn filter_cards(&self, filter: &CardFilter) -> Result<Vec<Card>> {
        let mut cards = self.get_all_cards()?;
        cards.retain(|c| filter.matches(c));
        debug!(?filter, count = cards.len(), "Filtered cards");
        Ok(cards)
    }

    /// Distinct bank names, first-seen order.
    pub fn banks(&self) -> Result<Vec<String>> {
        Ok(distinct(self.get_all_cards()?.into_iter().map(|c| c.bank_name)))
    }

    /// Distinct categories, first-seen order.
    pub fn categories(&self) -> Result<Vec<String>> {
        Ok(distinct(self.get_all_cards()?.into_iter().map(|c| c.category)))
    }
}

fn distinct(values: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = Vec::new();
    for value in values {
        if !seen.contains(&value) {
            seen.push(value);
        }
    }
    seen
}
