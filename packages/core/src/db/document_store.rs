//! DocumentStore Trait - Store Abstraction Layer
//!
//! This module defines the `DocumentStore` trait that abstracts the document
//! database backing SpaceNotes. Repositories depend only on this trait, so a
//! hosted backend can replace the bundled in-memory store without changing
//! business logic.
//!
//! # Design Decisions
//!
//! 1. **Async-First**: All methods are async so network backends fit
//! 2. **Full Snapshots**: Subscriptions push the complete result set on every
//!    relevant change
//! 3. **Server Timestamps**: `created_at` / `updated_at` are assigned by the
//!    store, never by callers
//! 4. **Idempotent Delete**: Deleting a missing document is not an error
//!
//! # Examples
//!
//! ```rust,no_run
//! use spacenotes_core::db::{CollectionPath, DocumentStore, InMemoryDocumentStore, Query};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = InMemoryDocumentStore::new();
//!     let spaces = CollectionPath::root("spaces");
//!
//!     let mut live = store
//!         .subscribe(Query::collection(spaces.clone()).where_eq("ownerId", "user-1"))
//!         .await?;
//!
//!     let body = json!({ "title": "Journal", "ownerId": "user-1" });
//!     store.create(&spaces, body.as_object().cloned().unwrap_or_default()).await?;
//!
//!     while let Some(snapshot) = live.next().await {
//!         println!("{} spaces", snapshot?.len());
//!     }
//!     Ok(())
//! }
//! ```

use super::document::{CollectionPath, Document};
use super::error::StoreError;
use super::query::Query;
use super::subscription::Subscription;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Abstraction over an owner-scoped document database with live queries
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; repositories share them through
/// `Arc<dyn DocumentStore>`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create a document with a generated id in `collection`
    ///
    /// # Returns
    ///
    /// The stored document, including its id and server timestamps
    async fn create(
        &self,
        collection: &CollectionPath,
        data: Map<String, Value>,
    ) -> Result<Document, StoreError>;

    /// Get a document by id
    ///
    /// - `Ok(Some(document))` if it exists
    /// - `Ok(None)` if it doesn't (not an error)
    async fn get(&self, collection: &CollectionPath, id: &str)
        -> Result<Option<Document>, StoreError>;

    /// Delete a document by id
    ///
    /// Returns whether a document was removed. Deleting a missing document
    /// succeeds with `false`. Sub-collections of the document are untouched.
    async fn delete(&self, collection: &CollectionPath, id: &str) -> Result<bool, StoreError>;

    /// One-shot query, results in insertion order
    async fn query(&self, query: &Query) -> Result<Vec<Document>, StoreError>;

    /// Open a live query
    ///
    /// The first snapshot is available immediately; further snapshots follow
    /// every change affecting the result set. The returned subscription must
    /// be unsubscribed (or dropped) when its consumer goes away.
    async fn subscribe(&self, query: Query) -> Result<Subscription, StoreError>;
}
