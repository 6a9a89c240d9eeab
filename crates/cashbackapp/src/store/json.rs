use super::flat_file::FileFormat;
use crate::error::{CashbackError, Result};
use crate::model::{Card, CardHistory};

/// Pretty-printed JSON arrays: `cards.json` and `card_history.json`.
pub struct JsonFormat;

impl FileFormat for JsonFormat {
    const EXTENSION: &'static str = "json";

    fn encode_cards(cards: &[Card]) -> Result<String> {
        serde_json::to_string_pretty(cards).map_err(CashbackError::Serialization)
    }

    fn decode_cards(raw: &str) -> Result<Vec<Card>> {
        serde_json::from_str(raw).map_err(CashbackError::Serialization)
    }

    fn encode_history(records: &[CardHistory]) -> Result<String> {
        serde_json::to_string_pretty(records).map_err(CashbackError::Serialization)
    }

    fn decode_history(raw: &str) -> Result<Vec<CardHistory>> {
        serde_json::from_str(raw).map_err(CashbackError::Serialization)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn cards_use_snake_case_fields_and_status_tags() {
        let mut card = Card::new(
            "Alfa",
            "Cashback",
            "Fuel",
            3.5,
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
        );
        card.id = Some(4);
        let raw = JsonFormat::encode_cards(&[card.clone()]).unwrap();
        assert!(raw.contains("\"bank_name\": \"Alfa\""));
        assert!(raw.contains("\"category_change_date\": \"2024-02-29\""));
        assert!(raw.contains("\"status\": \"ACTIVE\""));
        assert_eq!(JsonFormat::decode_cards(&raw).unwrap(), vec![card]);
    }

    #[test]
    fn missing_status_defaults_to_active() {
        let raw = r#"[{"id":1,"bank_name":"A","card_name":"B","category":"C",
                      "cashback":1.0,"category_change_date":"2024-01-01"}]"#;
        let cards = JsonFormat::decode_cards(raw).unwrap();
        assert!(cards[0].is_active());
    }

    #[test]
    fn malformed_input_is_an_error() {
        assert!(JsonFormat::decode_history("[{]").is_err());
    }
}
