//! Item Data Structures
//!
//! Items are leaf text entries stored in the `items` sub-collection of their
//! space. The owning space id is not a stored field; it is recovered from the
//! document's collection path.

use crate::db::Document;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Date format used for item dates and group keys
pub(crate) const ITEM_DATE_FORMAT: &str = "%Y-%m-%d";

/// Display format for date group labels
const LABEL_DATE_FORMAT: &str = "%d.%m.%Y";

/// A text entry belonging to exactly one space.
///
/// `date` is a `YYYY-MM-DD` string for items of dated spaces and the empty
/// string for items of plain spaces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub space_id: String,
    pub text: String,
    pub date: String,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemRecord {
    text: String,
    #[serde(default)]
    date: String,
    owner_id: String,
}

impl Item {
    /// Decode an item from a store document.
    ///
    /// Fails if the document is not stored under a space (its collection path
    /// has no parent document).
    pub fn from_document(document: &Document) -> Result<Self, serde_json::Error> {
        let record: ItemRecord = document.decode()?;
        let space_id = document
            .collection
            .parent_document_id()
            .ok_or_else(|| {
                <serde_json::Error as serde::de::Error>::custom(format!(
                    "item {} is not stored under a space (collection '{}')",
                    document.id, document.collection
                ))
            })?
            .to_string();

        Ok(Item {
            id: document.id.clone(),
            space_id,
            text: record.text,
            date: record.date,
            owner_id: record.owner_id,
            created_at: document.created_at,
            updated_at: document.updated_at,
        })
    }
}

/// Parameters for adding an item.
///
/// `date` is only honoured for dated spaces; plain spaces always store an
/// empty date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    pub text: String,
    pub date: Option<String>,
}

impl NewItem {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            date: None,
        }
    }

    pub fn dated(text: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            date: Some(date.into()),
        }
    }
}

/// Items sharing one date, in subscription order
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateGroup {
    pub date: String,
    pub items: Vec<Item>,
}

impl DateGroup {
    /// Human-readable label, `DD.MM.YYYY`.
    ///
    /// Dates that do not parse are returned unchanged (this includes the empty
    /// date of items that were written while the space was plain).
    pub fn label(&self) -> String {
        match NaiveDate::parse_from_str(&self.date, ITEM_DATE_FORMAT) {
            Ok(date) => date.format(LABEL_DATE_FORMAT).to_string(),
            Err(_) => self.date.clone(),
        }
    }
}
