//! Service Layer Error Types
//!
//! This module defines error types for repository and aggregator operations.

use crate::db::StoreError;
use crate::models::ValidationError;
use thiserror::Error;

/// Repository operation errors
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// No signed-in user; mutations and subscriptions refuse to run
    #[error("Not authenticated")]
    Unauthenticated,

    /// Input rejected before anything was written
    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),

    /// Space missing or owned by another user
    #[error("Space not found: {id}")]
    SpaceNotFound { id: String },

    /// Store operation failed
    #[error("Store operation failed: {0}")]
    Store(#[from] StoreError),

    /// Live subscription ended with an error; resubscribe to recover
    #[error("Subscription failed: {message}")]
    SubscriptionFailed { message: String },
}

impl RepositoryError {
    /// Create a space not found error
    pub fn space_not_found(id: impl Into<String>) -> Self {
        Self::SpaceNotFound { id: id.into() }
    }

    /// Create a subscription failed error
    pub fn subscription_failed(message: impl Into<String>) -> Self {
        Self::SubscriptionFailed {
            message: message.into(),
        }
    }
}
