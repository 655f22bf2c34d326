//! Store Change Events
//!
//! Changes are emitted by the document store on a tokio broadcast channel
//! after each successful mutation. Live subscriptions listen to this channel
//! and re-run their query when a change can affect their result set.
//!
//! # Event Flow
//!
//! 1. The store performs a mutation (create, delete)
//! 2. A `StoreChange` carrying the affected document is broadcast
//! 3. Each subscription task checks `Query::is_affected_by`
//! 4. Affected subscriptions push a fresh full snapshot to their consumer

use super::document::Document;

#[derive(Debug, Clone)]
pub enum StoreChange {
    /// A document was created
    DocumentCreated(Document),

    /// A document was deleted; carries the last stored version
    DocumentDeleted(Document),

    /// Subscriptions over `collection_id` must fail with `message`
    SubscriptionFault {
        collection_id: String,
        message: String,
    },
}

impl StoreChange {
    /// Get a string representation of the event type, used in log lines
    pub fn event_type(&self) -> &str {
        match self {
            StoreChange::DocumentCreated(_) => "document:created",
            StoreChange::DocumentDeleted(_) => "document:deleted",
            StoreChange::SubscriptionFault { .. } => "subscription:fault",
        }
    }
}
