//! # Domain Model: Cards and Their Cashback History
//!
//! This module defines the two records the whole crate revolves around:
//! [`Card`] and [`CardHistory`].
//!
//! ## Cards
//!
//! A card carries its *current* cashback terms: one free-text category and one
//! rate (a percentage between 0 and 100). The `category_change_date` marks when
//! those terms were set, or the date after which they must be reconsidered.
//! Once that date is reached an active card is considered due, and the expiry
//! sweep flips it to [`CardStatus::Expired`].
//!
//! The identifier is `None` until a store assigns one in `save_card`, and never
//! changes afterwards.
//!
//! ## History
//!
//! History is an append-only audit log. A record is written when a card is
//! first saved and again whenever an update changes its category or rate.
//! Status flips alone never produce a record. Records are keyed by the owning
//! card id but are not owned by the card: deleting a card leaves its history
//! in place.
//!
//! ## Timestamps
//!
//! Record timestamps are truncated to microseconds at creation. Every backend
//! (SQLite text columns, JSON, XML) stores timestamps at full nanosecond
//! precision, so a record read back compares equal to the record written,
//! including one built by the caller with an arbitrary timestamp.
//!
//! ## Text Fields
//!
//! Stores trim surrounding whitespace from names and categories before
//! writing. XML text nodes lose that whitespace on read, so every backend
//! stores the trimmed value to read back the same card.

use crate::error::{CashbackError, Result};
use chrono::{DateTime, NaiveDate, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type CardId = i64;
pub type HistoryId = i64;

pub const MIN_CASHBACK: f64 = 0.0;
pub const MAX_CASHBACK: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CardStatus {
    #[default]
    Active,
    Expired,
}

impl CardStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardStatus::Active => "ACTIVE",
            CardStatus::Expired => "EXPIRED",
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, CardStatus::Active)
    }
}

impl fmt::Display for CardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CardStatus {
    type Err = CashbackError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ACTIVE" => Ok(CardStatus::Active),
            "EXPIRED" => Ok(CardStatus::Expired),
            other => Err(CashbackError::InvalidCard(format!(
                "unknown status '{}' (expected ACTIVE or EXPIRED)",
                other
            ))),
        }
    }
}

impl TryFrom<String> for CardStatus {
    type Error = CashbackError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<CardStatus> for String {
    fn from(status: CardStatus) -> Self {
        status.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    #[serde(default)]
    pub id: Option<CardId>,
    pub bank_name: String,
    pub card_name: String,
    pub category: String,
    pub cashback: f64,
    pub category_change_date: NaiveDate,
    #[serde(default)]
    pub status: CardStatus,
}

impl Card {
    /// A new, unsaved, active card.
    pub fn new(
        bank_name: impl Into<String>,
        card_name: impl Into<String>,
        category: impl Into<String>,
        cashback: f64,
        category_change_date: NaiveDate,
    ) -> Self {
        Self {
            id: None,
            bank_name: bank_name.into(),
            card_name: card_name.into(),
            category: category.into(),
            cashback,
            category_change_date,
            status: CardStatus::Active,
        }
    }

    pub fn with_status(mut self, status: CardStatus) -> Self {
        self.status = status;
        self
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Check the field-level invariants: names present, rate within 0..=100.
    pub fn validate(&self) -> Result<()> {
        if self.bank_name.trim().is_empty() {
            return Err(CashbackError::InvalidCard(
                "bank name must not be empty".to_string(),
            ));
        }
        if self.card_name.trim().is_empty() {
            return Err(CashbackError::InvalidCard(
                "card name must not be empty".to_string(),
            ));
        }
        if self.category.trim().is_empty() {
            return Err(CashbackError::InvalidCard(
                "category must not be empty".to_string(),
            ));
        }
        if !self.cashback.is_finite()
            || self.cashback < MIN_CASHBACK
            || self.cashback > MAX_CASHBACK
        {
            return Err(CashbackError::InvalidCard(format!(
                "cashback must be between {} and {}%, got {}",
                MIN_CASHBACK, MAX_CASHBACK, self.cashback
            )));
        }
        Ok(())
    }

    /// Strip surrounding whitespace from the bank name, card name and category.
    pub fn trim_text(&mut self) {
        trim_in_place(&mut self.bank_name);
        trim_in_place(&mut self.card_name);
        trim_in_place(&mut self.category);
    }

    /// A copy with [`trim_text`](Self::trim_text) applied.
    pub fn trimmed(&self) -> Card {
        let mut card = self.clone();
        card.trim_text();
        card
    }

    /// Case-insensitive category comparison shared by every backend.
    pub fn matches_category(&self, category: &str) -> bool {
        categories_match(&self.category, category)
    }

    /// Active and its category-change date is on or before `date`.
    pub fn is_due(&self, date: NaiveDate) -> bool {
        self.is_active() && self.category_change_date <= date
    }

    /// True when `other` earns different cashback terms than `self`.
    ///
    /// Category comparison is exact here: a change in spelling or case is a
    /// change worth recording.
    pub fn terms_differ(&self, other: &Card) -> bool {
        self.category != other.category || self.cashback != other.cashback
    }
}

fn trim_in_place(s: &mut String) {
    let trimmed = s.trim();
    if trimmed.len() != s.len() {
        *s = trimmed.to_string();
    }
}

pub fn categories_match(a: &str, b: &str) -> bool {
    a == b || a.to_lowercase() == b.to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardHistory {
    #[serde(default)]
    pub id: Option<HistoryId>,
    pub card_id: CardId,
    pub category: String,
    pub cashback: f64,
    pub change_date: NaiveDate,
    pub recorded_at: DateTime<Utc>,
}

impl CardHistory {
    /// Snapshot the card's current terms, stamped with the current time.
    pub fn snapshot(card_id: CardId, card: &Card) -> Self {
        Self {
            id: None,
            card_id,
            category: card.category.clone(),
            cashback: card.cashback,
            change_date: card.category_change_date,
            recorded_at: now(),
        }
    }

    pub fn trim_text(&mut self) {
        trim_in_place(&mut self.category);
    }
}

/// Current time at the precision the stores persist.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Sort newest record first; equal timestamps fall back to the higher id.
pub fn sort_newest_first(records: &mut [CardHistory]) {
    records.sort_by(|a, b| {
        b.recorded_at
            .cmp(&a.recorded_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn card() -> Card {
        Card::new("Tinkoff", "Black", "Groceries", 5.0, date("2024-05-01"))
    }

    #[test]
    fn new_card_is_active_and_unsaved() {
        let card = card();
        assert_eq!(card.id, None);
        assert!(card.is_active());
    }

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("active".parse::<CardStatus>().unwrap(), CardStatus::Active);
        assert_eq!(
            " Expired ".parse::<CardStatus>().unwrap(),
            CardStatus::Expired
        );
        assert!("gone".parse::<CardStatus>().is_err());
    }

    #[test]
    fn status_serializes_as_upper_case_tag() {
        let json = serde_json::to_string(&CardStatus::Expired).unwrap();
        assert_eq!(json, "\"EXPIRED\"");
        let back: CardStatus = serde_json::from_str("\"active\"").unwrap();
        assert_eq!(back, CardStatus::Active);
    }

    #[test]
    fn validate_rejects_out_of_range_rate() {
        let mut c = card();
        c.cashback = 100.5;
        assert!(matches!(c.validate(), Err(CashbackError::InvalidCard(_))));
        c.cashback = -1.0;
        assert!(c.validate().is_err());
        c.cashback = f64::NAN;
        assert!(c.validate().is_err());
    }

    #[test]
    fn validate_accepts_range_bounds() {
        let mut c = card();
        c.cashback = 0.0;
        assert!(c.validate().is_ok());
        c.cashback = 100.0;
        assert!(c.validate().is_ok());
    }

    #[test]
    fn validate_rejects_blank_names() {
        let mut c = card();
        c.bank_name = "   ".into();
        assert!(c.validate().is_err());

        let mut c = card();
        c.category = "".into();
        assert!(c.validate().is_err());
    }

    #[test]
    fn category_match_ignores_case_including_cyrillic() {
        let c = Card::new("Sber", "Prime", "Продукты", 3.0, date("2024-05-01"));
        assert!(c.matches_category("продукты"));
        assert!(c.matches_category("ПРОДУКТЫ"));
        assert!(!c.matches_category("Кафе"));
    }

    #[test]
    fn due_includes_the_boundary_date() {
        let c = card();
        let d = c.category_change_date;
        assert!(c.is_due(d));
        assert!(c.is_due(d + Duration::days(1)));
        assert!(!c.is_due(d - Duration::days(1)));
    }

    #[test]
    fn expired_card_is_never_due() {
        let c = card().with_status(CardStatus::Expired);
        assert!(!c.is_due(date("2030-01-01")));
    }

    #[test]
    fn terms_differ_on_category_or_rate_only() {
        let a = card();
        let mut b = a.clone();
        b.status = CardStatus::Expired;
        b.bank_name = "Other".into();
        assert!(!a.terms_differ(&b));

        b.cashback = 7.0;
        assert!(a.terms_differ(&b));

        let mut c = a.clone();
        c.category = "groceries".into();
        assert!(a.terms_differ(&c));
    }

    #[test]
    fn trim_text_strips_surrounding_whitespace_only() {
        let mut c = Card::new("Alfa ", "  Black Card", "Fuel\n", 1.0, date("2024-05-01"));
        c.trim_text();
        assert_eq!(c.bank_name, "Alfa");
        assert_eq!(c.card_name, "Black Card");
        assert_eq!(c.category, "Fuel");
        assert_eq!(c.trimmed(), c);
    }

    #[test]
    fn snapshot_copies_terms() {
        let c = card();
        let h = CardHistory::snapshot(7, &c);
        assert_eq!(h.id, None);
        assert_eq!(h.card_id, 7);
        assert_eq!(h.category, "Groceries");
        assert_eq!(h.cashback, 5.0);
        assert_eq!(h.change_date, c.category_change_date);
        assert_eq!(h.recorded_at.timestamp_subsec_nanos() % 1000, 0);
    }

    #[test]
    fn sort_newest_first_breaks_ties_by_id() {
        let c = card();
        let t = now();
        let mut a = CardHistory::snapshot(1, &c);
        a.id = Some(1);
        a.recorded_at = t;
        let mut b = a.clone();
        b.id = Some(2);
        let mut older = a.clone();
        older.id = Some(3);
        older.recorded_at = t - Duration::seconds(10);

        let mut records = vec![older.clone(), a.clone(), b.clone()];
        sort_newest_first(&mut records);
        let ids: Vec<_> = records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![Some(2), Some(1), Some(3)]);
    }
}
