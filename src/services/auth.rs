//! Authentication state of one browser session.

use std::sync::Arc;

use tokio::sync::watch;

use crate::ports::{AuthError, IdentityProvider, UserIdentity};

/// Current identity plus a change stream, backed by the identity provider.
pub struct AuthSession<I> {
    identity: Arc<I>,
    current: watch::Sender<Option<UserIdentity>>,
}

impl<I> AuthSession<I>
where
    I: IdentityProvider + Send + Sync + 'static,
{
    pub fn new(identity: Arc<I>) -> Self {
        let (current, _) = watch::channel(None);
        Self { identity, current }
    }

    pub fn current_user(&self) -> Option<UserIdentity> { self.current.borrow().clone() }

    /// The signed-in identity, or `SignInRequired`.
    pub fn require_user(&self) -> Result<UserIdentity, AuthError> {
        self.current_user().ok_or(AuthError::SignInRequired)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<UserIdentity, AuthError> {
        let user = self.identity.sign_in(email, password).await?;
        tracing::info!(user_id = %user.uid, "signed in");
        self.current.send_replace(Some(user.clone()));
        Ok(user)
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<UserIdentity, AuthError> {
        let user = self.identity.sign_up(email, password).await?;
        tracing::info!(user_id = %user.uid, "account created");
        self.current.send_replace(Some(user.clone()));
        Ok(user)
    }

    /// Returns the identity that was signed out, if any.
    pub fn sign_out(&self) -> Option<UserIdentity> {
        let previous = self.current.send_replace(None);
        if let Some(user) = &previous {
            tracing::info!(user_id = %user.uid, "signed out");
        }
        previous
    }

    /// Notified on every sign-in and sign-out.
    pub fn subscribe(&self) -> watch::Receiver<Option<UserIdentity>> { self.current.subscribe() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::InMemoryIdentity;

    #[tokio::test]
    async fn test_state_changes_are_broadcast() {
        let auth = AuthSession::new(Arc::new(InMemoryIdentity::new()));
        let mut changes = auth.subscribe();
        assert!(matches!(auth.require_user(), Err(AuthError::SignInRequired)));

        let user = auth.sign_up("ravi@example.com", "comfort1").await.unwrap();
        changes.changed().await.unwrap();
        assert_eq!(changes.borrow_and_update().as_ref(), Some(&user));

        assert_eq!(auth.sign_out(), Some(user));
        changes.changed().await.unwrap();
        assert!(changes.borrow().is_none());
        assert!(auth.current_user().is_none());
    }

    #[tokio::test]
    async fn test_failed_sign_in_keeps_state() {
        let auth = AuthSession::new(Arc::new(InMemoryIdentity::new()));
        auth.sign_up("ravi@example.com", "comfort1").await.unwrap();
        auth.sign_out();
        assert!(matches!(auth.sign_in("ravi@example.com", "nope-nope").await, Err(AuthError::InvalidCredentials)));
        assert!(auth.current_user().is_none());
    }
}
