use super::{AuthError, IdentityProvider, User};
use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{info, warn};

/// Identity provider backed by a fixed account.
///
/// `sign_in` yields the configured account, or fails when the provider was
/// built with [`LocalIdentityProvider::failing`]. Used by tests and by hosts
/// that authenticate elsewhere and only need to hand the core a user id.
pub struct LocalIdentityProvider {
    account: Result<User, String>,
    current: watch::Sender<Option<User>>,
}

impl LocalIdentityProvider {
    /// Signed out; `sign_in` will yield `account`
    pub fn new(account: User) -> Self {
        let (current, _) = watch::channel(None);
        Self {
            account: Ok(account),
            current,
        }
    }

    /// Already signed in as `account`
    pub fn signed_in(account: User) -> Self {
        let provider = Self::new(account.clone());
        provider.current.send_replace(Some(account));
        provider
    }

    /// Every `sign_in` fails with `reason`
    pub fn failing(reason: impl Into<String>) -> Self {
        let (current, _) = watch::channel(None);
        Self {
            account: Err(reason.into()),
            current,
        }
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    async fn sign_in(&self) -> Result<User, AuthError> {
        match &self.account {
            Ok(user) => {
                info!(user = %user.id, "User signed in");
                self.current.send_replace(Some(user.clone()));
                Ok(user.clone())
            }
            Err(reason) => {
                warn!(reason = %reason, "Sign-in failed");
                Err(AuthError::SignInFailed(reason.clone()))
            }
        }
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        if let Some(user) = self.current.send_replace(None) {
            info!(user = %user.id, "User signed out");
        }
        Ok(())
    }

    fn current_user(&self) -> Option<User> {
        self.current.borrow().clone()
    }

    fn watch_user(&self) -> watch::Receiver<Option<User>> {
        self.current.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sign_in_and_out_notify_watchers() {
        let provider = LocalIdentityProvider::new(User::new("user-1"));
        let mut watcher = provider.watch_user();
        assert!(provider.current_user().is_none());

        let user = provider.sign_in().await.unwrap();
        assert_eq!(user.id.as_str(), "user-1");
        watcher.changed().await.unwrap();
        assert_eq!(watcher.borrow_and_update().as_ref(), Some(&user));

        provider.sign_out().await.unwrap();
        watcher.changed().await.unwrap();
        assert!(watcher.borrow_and_update().is_none());
        assert!(provider.current_user().is_none());
    }

    #[test]
    fn test_failing_provider_stays_signed_out() {
        let provider = LocalIdentityProvider::failing("popup closed");

        let err = tokio_test::block_on(provider.sign_in()).unwrap_err();
        assert_eq!(err, AuthError::SignInFailed("popup closed".to_string()));
        assert!(provider.current_user().is_none());
    }

    #[test]
    fn test_signed_in_constructor() {
        let provider = LocalIdentityProvider::signed_in(User::new("user-2"));
        assert_eq!(
            provider.current_user().map(|u| u.id.to_string()),
            Some("user-2".to_string())
        );
    }
}
