//! Document envelope and collection paths
//!
//! Collections are addressed by slash-separated paths with an odd number of
//! segments: `spaces` is a top-level collection and `spaces/{id}/items` is the
//! sub-collection owned by document `{id}`. The last segment is the
//! collection id, used by collection-group queries.

use super::error::StoreError;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fmt;

/// Address of a collection
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionPath {
    segments: Vec<String>,
}

impl CollectionPath {
    /// Top-level collection
    pub fn root(name: &str) -> Self {
        Self {
            segments: vec![name.to_string()],
        }
    }

    /// Parse a slash-separated path such as `spaces/abc/items`
    pub fn parse(path: &str) -> Result<Self, StoreError> {
        let segments: Vec<String> = path.split('/').map(str::to_string).collect();
        if segments.len() % 2 == 0 || segments.iter().any(|s| !is_valid_segment(s)) {
            return Err(StoreError::invalid_path(path));
        }
        Ok(Self { segments })
    }

    /// Sub-collection `name` of document `document_id` in this collection
    pub fn child(&self, document_id: &str, name: &str) -> Result<Self, StoreError> {
        if !is_valid_segment(document_id) || !is_valid_segment(name) {
            return Err(StoreError::invalid_path(format!(
                "{}/{}/{}",
                self, document_id, name
            )));
        }
        let mut segments = self.segments.clone();
        segments.push(document_id.to_string());
        segments.push(name.to_string());
        Ok(Self { segments })
    }

    /// Last segment, e.g. `items` for `spaces/abc/items`
    pub fn collection_id(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// Id of the document owning this sub-collection, `None` for top-level collections
    pub fn parent_document_id(&self) -> Option<&str> {
        let len = self.segments.len();
        if len >= 3 {
            Some(self.segments[len - 2].as_str())
        } else {
            None
        }
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty() && !segment.contains('/')
}

/// A stored document.
///
/// `created_at` and `updated_at` are assigned by the store, never by callers.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub collection: CollectionPath,
    pub data: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Store-wide insertion sequence, used to order collection-group results
    pub(crate) sequence: u64,
}

impl Document {
    /// Deserialize the document body into a typed record
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(Value::Object(self.data.clone()))
    }

    /// Field value, with missing fields reading as `null`
    pub fn field(&self, name: &str) -> &Value {
        self.data.get(name).unwrap_or(&Value::Null)
    }
}
