//! Identity Provider Layer
//!
//! The identity provider supplies the current user (or none) to every
//! repository. Repositories resolve the owner on each call, so signing out
//! immediately makes mutations and new subscriptions fail with
//! `Unauthenticated`.

mod local;

pub use local::LocalIdentityProvider;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tokio::sync::watch;

/// Stable opaque user identifier issued by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

impl User {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: UserId::new(id),
            display_name: None,
            email: None,
        }
    }
}

/// Sign-in failures are not distinguished further (dismissed, blocked and
/// network failures all surface the same way).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Sign-in failed: {0}")]
    SignInFailed(String),

    #[error("Sign-out failed: {0}")]
    SignOutFailed(String),
}

/// Source of the current user
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self) -> Result<User, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;

    /// The signed-in user, if any
    fn current_user(&self) -> Option<User>;

    /// Receiver notified whenever the current user changes
    fn watch_user(&self) -> watch::Receiver<Option<User>>;
}
