//! Typed live queries
//!
//! `LiveQuery<T>` wraps a store [`Subscription`] and decodes every snapshot
//! into domain records. Documents that fail to decode are skipped with a
//! warning; they never poison the rest of the snapshot.

use crate::db::{Document, Subscription, SubscriptionHandle};
use crate::services::error::RepositoryError;
use std::fmt;
use tracing::warn;

type Decoder<T> = Box<dyn Fn(&Document) -> Result<T, serde_json::Error> + Send + Sync>;

/// Live sequence of `T`; each item is a full replacement of the previous one.
pub struct LiveQuery<T> {
    subscription: Subscription,
    decode: Decoder<T>,
    finished: bool,
}

impl<T> LiveQuery<T> {
    pub(crate) fn new<F>(subscription: Subscription, decode: F) -> Self
    where
        F: Fn(&Document) -> Result<T, serde_json::Error> + Send + Sync + 'static,
    {
        Self {
            subscription,
            decode: Box::new(decode),
            finished: false,
        }
    }

    /// Wait for the next snapshot.
    ///
    /// `Some(Err(_))` is terminal: the subscription is closed and every later
    /// call returns `None`. Recovery means subscribing again.
    pub async fn next(&mut self) -> Option<Result<Vec<T>, RepositoryError>> {
        if self.finished {
            return None;
        }

        match self.subscription.next().await {
            Some(Ok(documents)) => Some(Ok(self.decode_all(&documents))),
            Some(Err(e)) => {
                self.finished = true;
                self.subscription.unsubscribe();
                Some(Err(RepositoryError::subscription_failed(e.to_string())))
            }
            None => {
                self.finished = true;
                None
            }
        }
    }

    fn decode_all(&self, documents: &[Document]) -> Vec<T> {
        documents
            .iter()
            .filter_map(|document| match (self.decode)(document) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(
                        id = %document.id,
                        collection = %document.collection,
                        "Skipping malformed document: {}",
                        e
                    );
                    None
                }
            })
            .collect()
    }

    /// Unsubscribe capability usable after the query has been moved elsewhere
    pub fn handle(&self) -> SubscriptionHandle {
        self.subscription.handle()
    }

    pub fn unsubscribe(&self) {
        self.subscription.unsubscribe();
    }

    pub fn is_active(&self) -> bool {
        !self.finished && self.subscription.is_active()
    }
}

impl<T> fmt::Debug for LiveQuery<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveQuery")
            .field("subscription", &self.subscription.handle().id())
            .field("finished", &self.finished)
            .finish()
    }
}
