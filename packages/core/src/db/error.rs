//! Document Store Error Types
//!
//! This module defines error types for document store operations: path
//! construction, live subscription failures and document encoding.

use thiserror::Error;

/// Document store operation errors
///
/// Covers the failures a store adapter can report. Subscription failures are
/// delivered through the subscription itself and are terminal for that
/// subscription only.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Collection path or document id is malformed
    #[error("Invalid document path: {path}")]
    InvalidPath { path: String },

    /// Live subscription failed (transport or permission failure)
    #[error("Subscription failed: {0}")]
    SubscriptionFailed(String),

    /// The store has shut down its change channel
    #[error("Store change channel closed")]
    ChannelClosed,

    /// Document body could not be encoded or decoded
    #[error("Document serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Create an invalid path error
    pub fn invalid_path(path: impl Into<String>) -> Self {
        Self::InvalidPath { path: path.into() }
    }

    /// Create a subscription failed error
    pub fn subscription_failed(msg: impl Into<String>) -> Self {
        Self::SubscriptionFailed(msg.into())
    }
}
