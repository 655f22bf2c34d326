//! Field-equality queries
//!
//! A query targets a single collection or a collection group (every
//! collection whose last path segment matches), narrowed by equality filters.
//! Filters are evaluated against the document body; a field missing from the
//! body compares equal to `null`, so `parentId == null` selects root spaces
//! whether or not the field was written.

use super::document::{CollectionPath, Document};
use super::events::StoreChange;
use serde_json::Value;

/// What a query reads from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryTarget {
    /// One concrete collection
    Collection(CollectionPath),
    /// Every collection with this collection id, across all parents
    Group(String),
}

impl QueryTarget {
    pub fn collection_id(&self) -> &str {
        match self {
            QueryTarget::Collection(path) => path.collection_id(),
            QueryTarget::Group(id) => id,
        }
    }

    /// Whether documents of `collection` are visible to this target
    pub fn includes(&self, collection: &CollectionPath) -> bool {
        match self {
            QueryTarget::Collection(path) => path == collection,
            QueryTarget::Group(id) => collection.collection_id() == id,
        }
    }
}

/// `field == value`
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub field: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub target: QueryTarget,
    pub filters: Vec<FieldFilter>,
    /// Restrict the result to a single document id
    pub document_id: Option<String>,
}

impl Query {
    pub fn collection(path: CollectionPath) -> Self {
        Self {
            target: QueryTarget::Collection(path),
            filters: Vec::new(),
            document_id: None,
        }
    }

    pub fn group(collection_id: impl Into<String>) -> Self {
        Self {
            target: QueryTarget::Group(collection_id.into()),
            filters: Vec::new(),
            document_id: None,
        }
    }

    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(FieldFilter {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn with_document_id(mut self, id: impl Into<String>) -> Self {
        self.document_id = Some(id.into());
        self
    }

    /// Whether `document` belongs to this query's result set
    pub fn matches(&self, document: &Document) -> bool {
        self.target.includes(&document.collection)
            && self
                .document_id
                .as_deref()
                .map_or(true, |id| id == document.id)
            && self
                .filters
                .iter()
                .all(|filter| document.field(&filter.field) == &filter.value)
    }

    /// Whether a store change can alter this query's result set
    pub fn is_affected_by(&self, change: &StoreChange) -> bool {
        match change {
            StoreChange::DocumentCreated(document) | StoreChange::DocumentDeleted(document) => {
                self.matches(document)
            }
            StoreChange::SubscriptionFault { collection_id, .. } => {
                self.target.collection_id() == collection_id
            }
        }
    }
}
