//! InMemoryDocumentStore - DocumentStore Implementation held in process memory
//!
//! Documents are kept per collection in insertion order. Every mutation is
//! broadcast as a [`StoreChange`]; each live subscription runs as a spawned
//! task that listens to the broadcast channel and re-runs its query when a
//! change can affect its result set.
//!
//! The store is the reference backend for tests and for embedding the core
//! without a hosted database. `inject_fault` simulates transport or
//! permission failures of live queries.

use super::document::{CollectionPath, Document};
use super::document_store::DocumentStore;
use super::error::StoreError;
use super::events::StoreChange;
use super::query::{Query, QueryTarget};
use super::subscription::{SnapshotResult, Subscription, SubscriptionHandle, SubscriptionRegistry};
use crate::config::CoreConfig;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Default)]
struct StoreState {
    collections: HashMap<CollectionPath, Vec<Document>>,
    next_sequence: u64,
}

impl StoreState {
    /// Documents matching `query`, in store insertion order
    fn run(&self, query: &Query) -> Vec<Document> {
        match &query.target {
            QueryTarget::Collection(path) => self
                .collections
                .get(path)
                .map(|docs| docs.iter().filter(|d| query.matches(d)).cloned().collect())
                .unwrap_or_default(),
            QueryTarget::Group(_) => {
                let mut docs: Vec<Document> = self
                    .collections
                    .iter()
                    .filter(|(path, _)| query.target.includes(path))
                    .flat_map(|(_, docs)| docs.iter().filter(|d| query.matches(d)).cloned())
                    .collect();
                docs.sort_by_key(|d| d.sequence);
                docs
            }
        }
    }
}

/// In-process document store with live queries
pub struct InMemoryDocumentStore {
    state: Arc<RwLock<StoreState>>,
    changes: broadcast::Sender<StoreChange>,
    registry: Arc<SubscriptionRegistry>,
    snapshot_buffer: usize,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::with_config(&CoreConfig::default())
    }

    pub fn with_config(config: &CoreConfig) -> Self {
        let (changes, _) = broadcast::channel(config.change_channel_capacity.max(1));
        Self {
            state: Arc::new(RwLock::new(StoreState::default())),
            changes,
            registry: Arc::new(SubscriptionRegistry::default()),
            snapshot_buffer: config.snapshot_buffer.max(1),
        }
    }

    /// Number of live subscriptions that have not been unsubscribed
    pub fn active_subscriptions(&self) -> usize {
        self.registry.len()
    }

    /// Raw change feed, mainly for diagnostics and tests
    pub fn subscribe_to_changes(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }

    /// Fail every live subscription whose target collection id is `collection_id`.
    ///
    /// Each affected subscription receives one `Err` and then ends; other
    /// subscriptions are unaffected.
    pub fn inject_fault(&self, collection_id: &str, message: &str) {
        warn!(collection_id, message, "Injecting subscription fault");
        self.emit(StoreChange::SubscriptionFault {
            collection_id: collection_id.to_string(),
            message: message.to_string(),
        });
    }

    /// Ignores errors if no subscribers.
    fn emit(&self, change: StoreChange) {
        debug!(event = change.event_type(), "Store change");
        let _ = self.changes.send(change);
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn create(
        &self,
        collection: &CollectionPath,
        data: Map<String, Value>,
    ) -> Result<Document, StoreError> {
        let document = {
            let mut state = self.state.write().await;
            let now = Utc::now();
            let document = Document {
                id: Uuid::new_v4().to_string(),
                collection: collection.clone(),
                data,
                created_at: now,
                updated_at: now,
                sequence: state.next_sequence,
            };
            state.next_sequence += 1;
            state
                .collections
                .entry(collection.clone())
                .or_default()
                .push(document.clone());
            document
        };

        debug!(collection = %collection, id = %document.id, "Document created");
        self.emit(StoreChange::DocumentCreated(document.clone()));
        Ok(document)
    }

    async fn get(
        &self,
        collection: &CollectionPath,
        id: &str,
    ) -> Result<Option<Document>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| d.id == id))
            .cloned())
    }

    async fn delete(&self, collection: &CollectionPath, id: &str) -> Result<bool, StoreError> {
        let removed = {
            let mut state = self.state.write().await;
            state.collections.get_mut(collection).and_then(|docs| {
                let position = docs.iter().position(|d| d.id == id)?;
                Some(docs.remove(position))
            })
        };

        match removed {
            Some(document) => {
                debug!(collection = %collection, id, "Document deleted");
                self.emit(StoreChange::DocumentDeleted(document));
                Ok(true)
            }
            None => {
                debug!(collection = %collection, id, "Delete of missing document ignored");
                Ok(false)
            }
        }
    }

    async fn query(&self, query: &Query) -> Result<Vec<Document>, StoreError> {
        Ok(self.state.read().await.run(query))
    }

    async fn subscribe(&self, query: Query) -> Result<Subscription, StoreError> {
        // Listen before reading the initial snapshot so no change falls in between.
        let changes = self.changes.subscribe();
        let (tx, rx) = mpsc::channel(self.snapshot_buffer);

        let initial = self.state.read().await.run(&query);
        tx.try_send(Ok(initial))
            .map_err(|_| StoreError::ChannelClosed)?;

        let id = self.registry.register();
        info!(
            subscription = id,
            target = query.target.collection_id(),
            "Subscription opened"
        );
        let task = tokio::spawn(run_subscription(
            id,
            query,
            self.state.clone(),
            changes,
            tx,
        ));

        Ok(Subscription::new(
            rx,
            SubscriptionHandle::new(id, task, self.registry.clone()),
        ))
    }
}

/// Push a fresh snapshot for every change affecting `query` until the
/// consumer goes away, the store shuts down, or a fault is delivered.
async fn run_subscription(
    id: u64,
    query: Query,
    state: Arc<RwLock<StoreState>>,
    mut changes: broadcast::Receiver<StoreChange>,
    tx: mpsc::Sender<SnapshotResult>,
) {
    loop {
        let change = tokio::select! {
            _ = tx.closed() => break,
            change = changes.recv() => change,
        };

        let push = match change {
            Ok(change) if !query.is_affected_by(&change) => continue,
            Ok(StoreChange::SubscriptionFault { message, .. }) => {
                let _ = tx.send(Err(StoreError::subscription_failed(message))).await;
                break;
            }
            Ok(_) => Ok(state.read().await.run(&query)),
            Err(RecvError::Lagged(skipped)) => {
                warn!(subscription = id, skipped, "Subscription lagged, resending snapshot");
                Ok(state.read().await.run(&query))
            }
            Err(RecvError::Closed) => break,
        };

        if tx.send(push).await.is_err() {
            break;
        }
    }
    debug!(subscription = id, "Subscription task finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::time::{timeout, Duration};

    fn body(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    async fn next_snapshot(subscription: &mut Subscription) -> Vec<Document> {
        timeout(Duration::from_secs(1), subscription.next())
            .await
            .expect("Snapshot should arrive within 1 second")
            .expect("Subscription should be open")
            .expect("Snapshot should not be an error")
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_timestamps() {
        let store = InMemoryDocumentStore::new();
        let spaces = CollectionPath::root("spaces");

        let doc = store.create(&spaces, body(json!({"title": "A"}))).await.unwrap();
        assert!(!doc.id.is_empty());
        assert_eq!(doc.created_at, doc.updated_at);

        let fetched = store.get(&spaces, &doc.id).await.unwrap().unwrap();
        assert_eq!(fetched, doc);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = InMemoryDocumentStore::new();
        let spaces = CollectionPath::root("spaces");
        let doc = store.create(&spaces, body(json!({}))).await.unwrap();

        assert!(store.delete(&spaces, &doc.id).await.unwrap());
        assert!(!store.delete(&spaces, &doc.id).await.unwrap());
        assert!(!store.delete(&spaces, "never-existed").await.unwrap());
        assert!(store.get(&spaces, &doc.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_group_query_preserves_insertion_order_across_collections() {
        let store = InMemoryDocumentStore::new();
        let spaces = CollectionPath::root("spaces");
        let a = spaces.child("a", "items").unwrap();
        let b = spaces.child("b", "items").unwrap();

        let first = store.create(&b, body(json!({"n": 1}))).await.unwrap();
        let second = store.create(&a, body(json!({"n": 2}))).await.unwrap();
        let third = store.create(&b, body(json!({"n": 3}))).await.unwrap();

        let ids: Vec<String> = store
            .query(&Query::group("items"))
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, vec![first.id, second.id, third.id]);
    }

    #[tokio::test]
    async fn test_subscription_pushes_initial_and_full_snapshots() {
        let store = InMemoryDocumentStore::new();
        let spaces = CollectionPath::root("spaces");
        store
            .create(&spaces, body(json!({"ownerId": "u1"})))
            .await
            .unwrap();

        let mut live = store
            .subscribe(Query::collection(spaces.clone()).where_eq("ownerId", "u1"))
            .await
            .unwrap();
        assert_eq!(next_snapshot(&mut live).await.len(), 1);

        let second = store
            .create(&spaces, body(json!({"ownerId": "u1"})))
            .await
            .unwrap();
        assert_eq!(next_snapshot(&mut live).await.len(), 2);

        store.delete(&spaces, &second.id).await.unwrap();
        assert_eq!(next_snapshot(&mut live).await.len(), 1);
    }

    #[tokio::test]
    async fn test_unrelated_changes_do_not_push() {
        let store = InMemoryDocumentStore::new();
        let spaces = CollectionPath::root("spaces");

        let mut live = store
            .subscribe(Query::collection(spaces.clone()).where_eq("ownerId", "u1"))
            .await
            .unwrap();
        assert!(next_snapshot(&mut live).await.is_empty());

        store
            .create(&spaces, body(json!({"ownerId": "someone-else"})))
            .await
            .unwrap();

        let pushed = timeout(Duration::from_millis(100), live.next()).await;
        assert!(pushed.is_err(), "No snapshot expected for another owner's document");
    }

    #[tokio::test]
    async fn test_fault_terminates_only_matching_subscriptions() {
        let store = InMemoryDocumentStore::new();
        let spaces = CollectionPath::root("spaces");

        let mut items = store.subscribe(Query::group("items")).await.unwrap();
        let mut all_spaces = store.subscribe(Query::collection(spaces.clone())).await.unwrap();
        next_snapshot(&mut items).await;
        next_snapshot(&mut all_spaces).await;

        store.inject_fault("items", "permission denied");

        let failed = timeout(Duration::from_secs(1), items.next())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(failed, Err(StoreError::SubscriptionFailed(_))));
        let ended = timeout(Duration::from_secs(1), items.next()).await.unwrap();
        assert!(ended.is_none());

        store.create(&spaces, body(json!({}))).await.unwrap();
        assert_eq!(next_snapshot(&mut all_spaces).await.len(), 1);
    }

    #[tokio::test]
    async fn test_unsubscribe_updates_active_count() {
        let store = InMemoryDocumentStore::new();
        let first = store.subscribe(Query::group("items")).await.unwrap();
        let second = store.subscribe(Query::group("items")).await.unwrap();
        assert_eq!(store.active_subscriptions(), 2);

        first.unsubscribe();
        assert_eq!(store.active_subscriptions(), 1);

        drop(second);
        assert_eq!(store.active_subscriptions(), 0);
    }
}
