use super::{require_id, CardStore};
use crate::error::{CashbackError, Result};
use crate::model::{sort_newest_first, Card, CardHistory, CardId, HistoryId};
use chrono::NaiveDate;

/// In-memory card store for testing.
///
/// Keeps the same semantics as the persistent backends, including the
/// history rule, without touching the filesystem.
#[derive(Debug)]
pub struct InMemoryStore {
    cards: Vec<Card>,
    history: Vec<CardHistory>,
    next_card_id: CardId,
    next_history_id: HistoryId,
    simulate_write_error: bool,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self {
            cards: Vec::new(),
            history: Vec::new(),
            next_card_id: 1,
            next_history_id: 1,
            simulate_write_error: false,
        }
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&mut self, simulate: bool) {
        self.simulate_write_error = simulate;
    }

    fn check_writable(&self) -> Result<()> {
        if self.simulate_write_error {
            return Err(CashbackError::Io(std::io::Error::other(
                "Simulated write error",
            )));
        }
        Ok(())
    }
}

impl CardStore for InMemoryStore {
    fn save_card(&mut self, card: &mut Card) -> Result<CardId> {
        self.check_writable()?;
        card.trim_text();
        let id = self.next_card_id;
        self.next_card_id += 1;
        card.id = Some(id);
        self.cards.push(card.clone());

        let mut record = CardHistory::snapshot(id, card);
        self.save_history(&mut record)?;
        Ok(id)
    }

    fn update_card(&mut self, card: &Card) -> Result<()> {
        let id = require_id(card)?;
        self.check_writable()?;
        let card = &card.trimmed();

        if let Some(old) = self.cards.iter().find(|c| c.id == Some(id)) {
            if old.terms_differ(card) {
                let mut record = CardHistory::snapshot(id, card);
                self.save_history(&mut record)?;
            }
        }

        match self.cards.iter_mut().find(|c| c.id == Some(id)) {
            Some(slot) => *slot = card.clone(),
            None => {
                self.cards.push(card.clone());
                self.next_card_id = self.next_card_id.max(id + 1);
            }
        }
        Ok(())
    }

    fn delete_card(&mut self, id: CardId) -> Result<()> {
        self.check_writable()?;
        self.cards.retain(|c| c.id != Some(id));
        Ok(())
    }

    fn get_all_cards(&self) -> Result<Vec<Card>> {
        Ok(self.cards.clone())
    }

    fn get_card_by_id(&self, id: CardId) -> Result<Option<Card>> {
        Ok(self.cards.iter().find(|c| c.id == Some(id)).cloned())
    }

    fn save_history(&mut self, record: &mut CardHistory) -> Result<HistoryId> {
        self.check_writable()?;
        record.trim_text();
        let id = self.next_history_id;
        self.next_history_id += 1;
        record.id = Some(id);
        self.history.push(record.clone());
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

// --- Test Fixtures ---

#[cfg(any(test, feature = "test_utils"))]
pub mod fixtures {
    use super::*;
    use crate::model::CardStatus;

    pub struct StoreFixture {
        pub store: InMemoryStore,
    }

    impl Default for StoreFixture {
        fn default() -> Self {
            Self::new()
        }
    }

    impl StoreFixture {
        pub fn new() -> Self {
            Self {
                store: InMemoryStore::new(),
            }
        }

        pub fn with_card(mut self, bank: &str, category: &str, cashback: f64) -> Self {
            let mut card = Card::new(bank, "Card", category, cashback, fixture_date());
            self.store.save_card(&mut card).unwrap();
            self
        }

        pub fn with_expired_card(mut self, bank: &str, category: &str, cashback: f64) -> Self {
            let mut card = Card::new(bank, "Card", category, cashback, fixture_date())
                .with_status(CardStatus::Expired);
            self.store.save_card(&mut card).unwrap();
            self
        }
    }

    pub fn fixture_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }
}
