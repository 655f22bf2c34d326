//! Live subscriptions
//!
//! A [`Subscription`] delivers full result snapshots for one query. Every
//! snapshot supersedes the previous one; there is no diff contract. A store
//! error is delivered once as `Err` and ends the subscription.
//!
//! Unsubscribing (explicitly or by dropping the subscription) aborts the
//! store-side task and removes the subscription from the store's registry
//! before returning, so no live query outlives its consumer.

use super::document::Document;
use super::error::StoreError;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// One push from a live query
pub type SnapshotResult = Result<Vec<Document>, StoreError>;

/// Registry of subscriptions that have not been torn down yet
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    next_id: AtomicU64,
    active: Mutex<HashSet<u64>>,
}

impl SubscriptionRegistry {
    pub fn register(&self) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.lock().insert(id);
        id
    }

    fn release(&self, id: u64) {
        self.lock().remove(&id);
    }

    /// Number of live subscriptions
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashSet<u64>> {
        // A poisoned set of ids is still a valid set of ids.
        self.active.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[derive(Debug)]
struct HandleInner {
    id: u64,
    cancelled: AtomicBool,
    task: Mutex<Option<JoinHandle<()>>>,
    registry: Arc<SubscriptionRegistry>,
}

/// Cloneable unsubscribe capability for a [`Subscription`]
#[derive(Debug, Clone)]
pub struct SubscriptionHandle {
    inner: Arc<HandleInner>,
}

impl SubscriptionHandle {
    pub fn new(id: u64, task: JoinHandle<()>, registry: Arc<SubscriptionRegistry>) -> Self {
        Self {
            inner: Arc::new(HandleInner {
                id,
                cancelled: AtomicBool::new(false),
                task: Mutex::new(Some(task)),
                registry,
            }),
        }
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Tear down the live query. Idempotent.
    pub fn unsubscribe(&self) {
        if self.inner.cancelled.swap(true, Ordering::SeqCst) {
            return;
        }
        let task = self
            .inner
            .task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(task) = task {
            task.abort();
        }
        self.inner.registry.release(self.inner.id);
        debug!(subscription = self.inner.id, "Subscription closed");
    }

    pub fn is_active(&self) -> bool {
        !self.inner.cancelled.load(Ordering::SeqCst)
    }
}

/// Live snapshot stream for one query
#[derive(Debug)]
pub struct Subscription {
    receiver: mpsc::Receiver<SnapshotResult>,
    handle: SubscriptionHandle,
}

impl Subscription {
    pub fn new(receiver: mpsc::Receiver<SnapshotResult>, handle: SubscriptionHandle) -> Self {
        Self { receiver, handle }
    }

    /// Wait for the next snapshot.
    ///
    /// Returns `None` once the subscription has been unsubscribed or the store
    /// side has ended (after delivering an error, or on store shutdown).
    /// Snapshots buffered before an unsubscribe are discarded.
    pub async fn next(&mut self) -> Option<SnapshotResult> {
        if !self.handle.is_active() {
            return None;
        }
        let snapshot = self.receiver.recv().await;
        if !self.handle.is_active() {
            return None;
        }
        snapshot
    }

    pub fn handle(&self) -> SubscriptionHandle {
        self.handle.clone()
    }

    pub fn unsubscribe(&self) {
        self.handle.unsubscribe();
    }

    pub fn is_active(&self) -> bool {
        self.handle.is_active()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.unsubscribe();
    }
}
