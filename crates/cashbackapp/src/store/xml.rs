//! XML encoding for the flat-file store.
//!
//! ```text
//! <?xml version="1.0" encoding="UTF-8"?>
//! <cards>
//!   <card>
//!     <id>1</id>
//!     <bank_name>Alfa</bank_name>
//!     ...
//!   </card>
//! </cards>
//! ```
//!
//! History uses `<card_history>` with one `<record>` per entry.

use super::flat_file::FileFormat;
use crate::error::{CashbackError, Result};
use crate::model::{Card, CardHistory};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

const DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";

pub struct XmlFormat;

#[derive(Serialize, Deserialize)]
#[serde(rename = "cards")]
struct CardList {
    #[serde(rename = "card", default)]
    cards: Vec<Card>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename = "card_history")]
struct HistoryList {
    #[serde(rename = "record", default)]
    records: Vec<CardHistory>,
}

fn to_xml<T: Serialize>(value: &T) -> Result<String> {
    let mut body = String::new();
    let mut serializer = quick_xml::se::Serializer::new(&mut body);
    serializer.indent(' ', 2);
    value
        .serialize(serializer)
        .map_err(|e| CashbackError::Xml(e.to_string()))?;
    Ok(format!("{}{}\n", DECLARATION, body))
}

fn from_xml<T: DeserializeOwned>(raw: &str) -> Result<T> {
    quick_xml::de::from_str(raw).map_err(|e| CashbackError::Xml(e.to_string()))
}

impl FileFormat for XmlFormat {
    const EXTENSION: &'static str = "xml";

    fn encode_cards(cards: &[Card]) -> Result<String> {
        to_xml(&CardList {
            cards: cards.to_vec(),
        })
    }

    fn decode_cards(raw: &str) -> Result<Vec<Card>> {
        from_xml::<CardList>(raw).map(|list| list.cards)
    }

    fn encode_history(records: &[CardHistory]) -> Result<String> {
        to_xml(&HistoryList {
            records: records.to_vec(),
        })
    }

    fn decode_history(raw: &str) -> Result<Vec<CardHistory>> {
        from_xml::<HistoryList>(raw).map(|list| list.records)
    }
}
