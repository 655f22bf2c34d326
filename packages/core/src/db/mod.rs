//! Document Store Layer
//!
//! This module handles all interaction with the document database:
//!
//! - Collection paths and the stored document envelope
//! - Field-equality and collection-group queries
//! - Live subscriptions with explicit unsubscribe
//! - The `DocumentStore` abstraction and its in-memory implementation
//!
//! # Architecture
//!
//! Repositories never talk to a concrete backend. They receive an
//! `Arc<dyn DocumentStore>` at construction time; the bundled
//! `InMemoryDocumentStore` broadcasts a `StoreChange` after every mutation
//! and drives each subscription from that feed.

mod document;
mod document_store;
mod error;
pub mod events;
mod memory_store;
mod query;
mod subscription;

pub use document::{CollectionPath, Document};
pub use document_store::DocumentStore;
pub use error::StoreError;
pub use events::StoreChange;
pub use memory_store::InMemoryDocumentStore;
pub use query::{FieldFilter, Query, QueryTarget};
pub use subscription::{
    SnapshotResult, Subscription, SubscriptionHandle, SubscriptionRegistry,
};
