//! In-process identity provider.
//!
//! Keeps accounts in memory and behaves like a remote provider: listeners
//! are told about every change of the signed-in user, federated tokens are
//! bound to the hashed nonce they were requested with, and outages or
//! failed sign-outs can be switched on for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use uuid::Uuid;

use super::nonce::sha256_hex;
use super::provider::{
    FederatedAssertion, FederatedCredential, FederatedProvider, IdentityProvider, ListenerId,
    ProviderUser, StateListener,
};
use super::AuthError;

/// Minimum password length accepted for new accounts.
pub const MIN_PASSWORD_LENGTH: usize = 6;

#[derive(Debug, Clone)]
struct Account {
    uid: String,
    password: String,
}

/// Identity provider holding its accounts in memory.
#[derive(Default)]
pub struct InMemoryIdentityProvider {
    accounts: Mutex<HashMap<String, Account>>,
    current: Mutex<Option<ProviderUser>>,
    listeners: Mutex<HashMap<ListenerId, StateListener>>,
    next_listener: AtomicU64,
    unavailable: AtomicBool,
    fail_sign_out: AtomicBool,
    omit_id_token: AtomicBool,
}

impl InMemoryIdentityProvider {
    /// Create a provider with no accounts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an email/password account without signing it in.
    pub fn register(&self, email: &str, password: &str) -> Result<String, AuthError> {
        validate_credentials(email, password)?;

        let mut accounts = self.accounts.lock().unwrap_or_else(PoisonError::into_inner);
        let key = email.trim().to_lowercase();
        if accounts.contains_key(&key) {
            return Err(AuthError::AccountExists);
        }

        let uid = new_uid();
        accounts.insert(
            key,
            Account {
                uid: uid.clone(),
                password: password.to_string(),
            },
        );
        Ok(uid)
    }

    /// Simulate the provider being unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Make the next sign-outs fail remotely.
    pub fn set_sign_out_failure(&self, fail: bool) {
        self.fail_sign_out.store(fail, Ordering::SeqCst);
    }

    /// Return assertions without an identity token.
    pub fn set_omit_id_token(&self, omit: bool) {
        self.omit_id_token.store(omit, Ordering::SeqCst);
    }

    /// The user the provider currently considers signed in.
    pub fn current_user(&self) -> Option<ProviderUser> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of registered state listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// End the provider session from the provider's side (token expiry,
    /// account disabled).
    pub fn revoke_session(&self) {
        tracing::info!("Provider session revoked");
        self.set_current(None);
    }

    fn check_available(&self) -> Result<(), AuthError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AuthError::ProviderUnavailable(
                "Identity provider is unreachable".to_string(),
            ));
        }
        Ok(())
    }

    fn set_current(&self, user: Option<ProviderUser>) {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = user.clone();

        // Listeners run without any provider lock held.
        let listeners: Vec<StateListener> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        for listener in listeners {
            listener(user.as_ref());
        }
    }

    fn sign_in(&self, user: ProviderUser) -> ProviderUser {
        self.set_current(Some(user.clone()));
        user
    }
}

impl IdentityProvider for InMemoryIdentityProvider {
    async fn create_account(&self, email: &str, password: &str) -> Result<ProviderUser, AuthError> {
        self.check_available()?;
        let uid = self.register(email, password)?;

        tracing::info!(uid = %uid, "Account created");
        Ok(self.sign_in(ProviderUser {
            uid,
            email: Some(email.trim().to_string()),
            is_anonymous: false,
        }))
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ProviderUser, AuthError> {
        self.check_available()?;

        let account = self
            .accounts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&email.trim().to_lowercase())
            .cloned()
            .ok_or_else(|| AuthError::InvalidCredentials("No account for this email".to_string()))?;

        if account.password != password {
            return Err(AuthError::InvalidCredentials("Wrong password".to_string()));
        }

        Ok(self.sign_in(ProviderUser {
            uid: account.uid,
            email: Some(email.trim().to_string()),
            is_anonymous: false,
        }))
    }

    async fn sign_in_anonymously(&self) -> Result<ProviderUser, AuthError> {
        self.check_available()?;

        Ok(self.sign_in(ProviderUser {
            uid: new_uid(),
            email: None,
            is_anonymous: true,
        }))
    }

    async fn request_assertion(
        &self,
        provider: FederatedProvider,
        hashed_nonce: &str,
    ) -> Result<FederatedAssertion, AuthError> {
        self.check_available()?;

        if self.omit_id_token.load(Ordering::SeqCst) {
            return Ok(FederatedAssertion {
                id_token: None,
                access_token: Some(new_uid()),
            });
        }

        let access_token = match provider {
            FederatedProvider::Google => Some(new_uid()),
            FederatedProvider::Apple => None,
        };
        Ok(FederatedAssertion {
            id_token: Some(format!("{}|{}|{}", provider.as_str(), new_uid(), hashed_nonce)),
            access_token,
        })
    }

    async fn sign_in_with_assertion(
        &self,
        credential: FederatedCredential,
    ) -> Result<ProviderUser, AuthError> {
        self.check_available()?;

        let mut parts = credential.id_token.splitn(3, '|');
        let (issuer, subject, bound_nonce) = match (parts.next(), parts.next(), parts.next()) {
            (Some(issuer), Some(subject), Some(nonce)) => (issuer, subject, nonce),
            _ => return Err(AuthError::TokenError),
        };

        if issuer != credential.provider.as_str()
            || bound_nonce != sha256_hex(credential.raw_nonce())
        {
            return Err(AuthError::TokenError);
        }

        Ok(self.sign_in(ProviderUser {
            uid: format!("{}:{}", issuer, subject),
            email: None,
            is_anonymous: false,
        }))
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        if self.fail_sign_out.load(Ordering::SeqCst) {
            return Err(AuthError::SignOutFailed(
                "Provider rejected sign-out".to_string(),
            ));
        }

        self.set_current(None);
        Ok(())
    }

    fn add_state_listener(&self, listener: StateListener) -> ListenerId {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::SeqCst));
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, listener);
        id
    }

    fn remove_state_listener(&self, id: ListenerId) {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
    }
}

fn new_uid() -> String {
    Uuid::new_v4().simple().to_string()
}

fn validate_credentials(email: &str, password: &str) -> Result<(), AuthError> {
    let email = email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(AuthError::InvalidCredentials(
            "Email address is malformed".to_string(),
        ));
    }
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::InvalidCredentials(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::nonce::NonceIssuer;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_password_sign_in() {
        let provider = InMemoryIdentityProvider::new();
        let uid = provider.register("ana@example.com", "secret123").unwrap();

        let user = provider
            .sign_in_with_password("ana@example.com", "secret123")
            .await
            .expect("Sign-in failed");
        assert_eq!(user.uid, uid);
        assert!(!user.is_anonymous);
        assert_eq!(provider.current_user(), Some(user));

        let wrong = provider
            .sign_in_with_password("ana@example.com", "nope")
            .await;
        assert!(matches!(wrong, Err(AuthError::InvalidCredentials(_))));
    }

    #[tokio::test]
    async fn test_create_account_rejects_duplicates() {
        let provider = InMemoryIdentityProvider::new();
        provider
            .create_account("ana@example.com", "secret123")
            .await
            .expect("Account creation failed");

        let duplicate = provider.create_account("ANA@example.com", "other123").await;
        assert_eq!(duplicate, Err(AuthError::AccountExists));

        let short = provider.create_account("bo@example.com", "123").await;
        assert!(matches!(short, Err(AuthError::InvalidCredentials(_))));
    }

    #[tokio::test]
    async fn test_unavailable() {
        let provider = InMemoryIdentityProvider::new();
        provider.set_unavailable(true);

        assert!(matches!(
            provider.sign_in_anonymously().await,
            Err(AuthError::ProviderUnavailable(_))
        ));
        assert!(provider.current_user().is_none());
    }

    #[tokio::test]
    async fn test_assertion_bound_to_nonce() {
        let provider = InMemoryIdentityProvider::new();
        let issuer = NonceIssuer::default();

        let nonce = issuer.issue();
        let assertion = provider
            .request_assertion(FederatedProvider::Apple, &nonce.hashed())
            .await
            .unwrap();
        let credential = FederatedCredential::new(
            FederatedProvider::Apple,
            assertion.id_token.clone().unwrap(),
            assertion.access_token.clone(),
            nonce,
        );
        let user = provider.sign_in_with_assertion(credential).await.unwrap();
        assert!(user.uid.starts_with("apple.com:"));

        // Same token presented with a different nonce.
        let replay = FederatedCredential::new(
            FederatedProvider::Apple,
            assertion.id_token.unwrap(),
            None,
            issuer.issue(),
        );
        assert_eq!(
            provider.sign_in_with_assertion(replay).await,
            Err(AuthError::TokenError)
        );
    }

    #[tokio::test]
    async fn test_listeners_notified() {
        let provider = InMemoryIdentityProvider::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let signed_in = Arc::new(AtomicBool::new(false));

        let id = provider.add_state_listener({
            let calls = Arc::clone(&calls);
            let signed_in = Arc::clone(&signed_in);
            Arc::new(move |user: Option<&ProviderUser>| {
                calls.fetch_add(1, Ordering::SeqCst);
                signed_in.store(user.is_some(), Ordering::SeqCst);
            })
        });
        assert_eq!(provider.listener_count(), 1);

        provider.sign_in_anonymously().await.unwrap();
        assert!(signed_in.load(Ordering::SeqCst));

        provider.revoke_session();
        assert!(!signed_in.load(Ordering::SeqCst));
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        provider.remove_state_listener(id);
        assert_eq!(provider.listener_count(), 0);
        provider.sign_in_anonymously().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_sign_out_failure_keeps_session() {
        let provider = InMemoryIdentityProvider::new();
        provider.sign_in_anonymously().await.unwrap();
        provider.set_sign_out_failure(true);

        assert!(matches!(
            provider.sign_out().await,
            Err(AuthError::SignOutFailed(_))
        ));
        assert!(provider.current_user().is_some());
    }
}
