//! Session facade over an identity provider.
//!
//! Normalizes password, guest and federated sign-in into one state machine
//! (`SignedOut -> Authenticating -> SignedIn`). Every attempt carries an
//! [`AttemptToken`]; a result whose token is no longer the one in flight
//! is discarded without touching state.

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock, RwLockWriteGuard};
use tokio::sync::broadcast;

use super::nonce::{Nonce, NonceIssuer};
use super::provider::{
    FederatedCredential, FederatedProvider, IdentityProvider, ListenerId, ProviderUser,
    StateListener,
};
use super::AuthError;
use crate::storage::config::AuthSettings;

/// Capacity of the session event channel.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No user signed in.
    SignedOut,
    /// A sign-in attempt is in flight.
    Authenticating,
    /// A user is signed in.
    SignedIn,
}

/// How the current identity was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignInMethod {
    /// Email and password.
    Password,
    /// Anonymous guest.
    Anonymous,
    /// Federated provider.
    Federated(FederatedProvider),
    /// Provider session restored without an explicit attempt.
    Restored,
}

/// The signed-in user as seen by the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub uid: String,
    pub email: Option<String>,
    pub is_guest: bool,
    pub method: SignInMethod,
}

impl UserIdentity {
    fn from_provider(user: &ProviderUser, method: SignInMethod) -> Self {
        Self {
            uid: user.uid.clone(),
            email: user.email.clone(),
            is_guest: user.is_anonymous || method == SignInMethod::Anonymous,
            method,
        }
    }
}

/// Generation number of one sign-in attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AttemptToken(u64);

impl AttemptToken {
    pub fn generation(&self) -> u64 {
        self.0
    }
}

/// Session event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// An attempt started.
    Authenticating(AttemptToken),
    /// A user is signed in.
    SignedIn(UserIdentity),
    /// The session ended, or an attempt failed or was cancelled.
    SignedOut,
}

#[derive(Debug)]
struct SessionInner {
    state: SessionState,
    identity: Option<UserIdentity>,
    in_flight: Option<AttemptToken>,
    /// Attempts whose provider call has not returned yet, current or not.
    outstanding: BTreeSet<AttemptToken>,
    next_generation: u64,
}

impl SessionInner {
    fn new() -> Self {
        Self {
            state: SessionState::SignedOut,
            identity: None,
            in_flight: None,
            outstanding: BTreeSet::new(),
            next_generation: 0,
        }
    }

    fn sign_out(&mut self) -> bool {
        let changed = self.state != SessionState::SignedOut;
        self.state = SessionState::SignedOut;
        self.identity = None;
        self.in_flight = None;
        changed
    }
}

enum Attempt {
    Started(AttemptToken),
    AlreadySignedIn(UserIdentity),
}

/// Session facade.
pub struct SessionFacade<P: IdentityProvider> {
    provider: Arc<P>,
    settings: AuthSettings,
    nonces: NonceIssuer,
    inner: Arc<RwLock<SessionInner>>,
    event_tx: broadcast::Sender<SessionEvent>,
    listener: ListenerId,
}

impl<P: IdentityProvider> SessionFacade<P> {
    /// Create a facade and register its listener with the provider.
    pub fn new(provider: Arc<P>, settings: AuthSettings) -> Self {
        let (tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let inner = Arc::new(RwLock::new(SessionInner::new()));

        let listener = provider.add_state_listener(state_listener(Arc::clone(&inner), tx.clone()));

        Self {
            provider,
            nonces: NonceIssuer::new(settings.nonce_length),
            settings,
            inner,
            event_tx: tx,
            listener,
        }
    }

    /// Get current session state.
    pub fn state(&self) -> SessionState {
        self.read(|inner| inner.state)
    }

    /// Get the signed-in identity, if any.
    pub fn identity(&self) -> Option<UserIdentity> {
        self.read(|inner| inner.identity.clone())
    }

    /// Whether the signed-in user is a guest; `false` when signed out.
    pub fn is_guest(&self) -> bool {
        self.read(|inner| inner.identity.as_ref().is_some_and(|id| id.is_guest))
    }

    /// Token of the attempt currently in flight.
    pub fn attempt_in_flight(&self) -> Option<AttemptToken> {
        self.read(|inner| inner.in_flight)
    }

    /// Subscribe to session events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    /// Sign in with email and password.
    pub async fn sign_in_with_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<UserIdentity, AuthError> {
        self.run_attempt(
            SignInMethod::Password,
            self.provider.sign_in_with_password(email, password),
        )
        .await
    }

    /// Create an email/password account and sign it in.
    pub async fn create_account(
        &self,
        email: &str,
        password: &str,
    ) -> Result<UserIdentity, AuthError> {
        self.run_attempt(
            SignInMethod::Password,
            self.provider.create_account(email, password),
        )
        .await
    }

    /// Sign in as an anonymous guest.
    pub async fn sign_in_as_guest(&self) -> Result<UserIdentity, AuthError> {
        self.run_attempt(SignInMethod::Anonymous, self.provider.sign_in_anonymously())
            .await
    }

    /// Sign in through a federated provider.
    ///
    /// A fresh nonce is issued for the attempt; its digest goes to the
    /// provider's interactive step and the raw value is consumed by the
    /// credential exchange.
    pub async fn sign_in_with_external_provider(
        &self,
        provider: FederatedProvider,
    ) -> Result<UserIdentity, AuthError> {
        if let Some(identity) = self.identity() {
            return Ok(identity);
        }
        self.settings.ensure_configured(provider)?;

        let nonce = self.nonces.issue();
        self.run_attempt(
            SignInMethod::Federated(provider),
            self.exchange_federated(provider, nonce),
        )
        .await
    }

    /// Sign out.
    ///
    /// Local state is cleared first and any in-flight attempt is
    /// invalidated; a provider failure is reported afterwards but the
    /// facade stays signed out.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        let changed = self.write().sign_out();
        if changed {
            let _ = self.event_tx.send(SessionEvent::SignedOut);
        }
        tracing::info!("Signed out");

        match self.provider.sign_out().await {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::warn!(error = %e, "Provider sign-out failed");
                match e {
                    AuthError::SignOutFailed(reason) => Err(AuthError::SignOutFailed(reason)),
                    other => Err(AuthError::SignOutFailed(other.to_string())),
                }
            }
        }
    }

    /// Abandon the attempt in flight, if any; its late result is discarded.
    pub fn cancel_sign_in(&self) -> bool {
        let mut inner = self.write();
        let Some(token) = inner.in_flight.take() else {
            return false;
        };
        inner.state = SessionState::SignedOut;
        drop(inner);

        tracing::info!(attempt = token.generation(), "Sign-in cancelled");
        let _ = self.event_tx.send(SessionEvent::SignedOut);
        true
    }

    async fn exchange_federated(
        &self,
        provider: FederatedProvider,
        nonce: Nonce,
    ) -> Result<ProviderUser, AuthError> {
        let hashed_nonce = nonce.hashed();
        let assertion = self
            .provider
            .request_assertion(provider, &hashed_nonce)
            .await?;

        let id_token = assertion
            .id_token
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::TokenError)?;

        let credential = FederatedCredential::new(provider, id_token, assertion.access_token, nonce);
        self.provider.sign_in_with_assertion(credential).await
    }

    async fn run_attempt(
        &self,
        method: SignInMethod,
        call: impl Future<Output = Result<ProviderUser, AuthError>>,
    ) -> Result<UserIdentity, AuthError> {
        let token = match self.begin_attempt() {
            Attempt::Started(token) => token,
            Attempt::AlreadySignedIn(identity) => return Ok(identity),
        };

        let pending = PendingAttempt {
            inner: &self.inner,
            event_tx: &self.event_tx,
            token: Some(token),
        };
        let result = call.await;
        pending.disarm();
        self.finish_attempt(token, method, result)
    }

    fn begin_attempt(&self) -> Attempt {
        let mut inner = self.write();
        if let (SessionState::SignedIn, Some(identity)) = (inner.state, &inner.identity) {
            return Attempt::AlreadySignedIn(identity.clone());
        }

        inner.next_generation += 1;
        let token = AttemptToken(inner.next_generation);
        if let Some(previous) = inner.in_flight.replace(token) {
            tracing::debug!(attempt = previous.generation(), "Attempt superseded by a newer one");
        }
        inner.outstanding.insert(token);
        inner.state = SessionState::Authenticating;
        drop(inner);

        tracing::debug!(attempt = token.generation(), "Sign-in attempt started");
        let _ = self.event_tx.send(SessionEvent::Authenticating(token));
        Attempt::Started(token)
    }

    fn finish_attempt(
        &self,
        token: AttemptToken,
        method: SignInMethod,
        result: Result<ProviderUser, AuthError>,
    ) -> Result<UserIdentity, AuthError> {
        let mut inner = self.write();
        inner.outstanding.remove(&token);

        if inner.in_flight != Some(token) {
            drop(inner);
            tracing::warn!(
                attempt = token.generation(),
                succeeded = result.is_ok(),
                "Discarding stale sign-in result"
            );
            return Err(AuthError::Superseded);
        }
        inner.in_flight = None;

        match result {
            Ok(user) => {
                let identity = UserIdentity::from_provider(&user, method);
                inner.state = SessionState::SignedIn;
                inner.identity = Some(identity.clone());
                drop(inner);

                tracing::info!(
                    uid = %identity.uid,
                    guest = identity.is_guest,
                    method = ?identity.method,
                    "Signed in"
                );
                let _ = self.event_tx.send(SessionEvent::SignedIn(identity.clone()));
                Ok(identity)
            }
            Err(e) => {
                inner.sign_out();
                drop(inner);

                tracing::info!(error = %e, "Sign-in failed");
                let _ = self.event_tx.send(SessionEvent::SignedOut);
                Err(e)
            }
        }
    }

    fn read<T>(&self, f: impl FnOnce(&SessionInner) -> T) -> T {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        f(&inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Attempt whose provider call is being awaited.
///
/// If the caller drops the sign-in future before the call returns, the
/// attempt is retired here: it stops counting as outstanding and, when it
/// was still the one in flight, the session falls back to signed out.
struct PendingAttempt<'a> {
    inner: &'a RwLock<SessionInner>,
    event_tx: &'a broadcast::Sender<SessionEvent>,
    token: Option<AttemptToken>,
}

impl PendingAttempt<'_> {
    fn disarm(mut self) {
        self.token = None;
    }
}

impl Drop for PendingAttempt<'_> {
    fn drop(&mut self) {
        let Some(token) = self.token.take() else {
            return;
        };

        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.outstanding.remove(&token);
        if inner.in_flight != Some(token) {
            return;
        }
        inner.sign_out();
        drop(inner);

        tracing::info!(attempt = token.generation(), "Sign-in abandoned");
        let _ = self.event_tx.send(SessionEvent::SignedOut);
    }
}

impl<P: IdentityProvider> Drop for SessionFacade<P> {
    fn drop(&mut self) {
        self.provider.remove_state_listener(self.listener);
    }
}

/// Listener mirroring provider-side changes into the facade.
///
/// Provider sign-out while signed in ends the session (remote revocation).
/// A provider user appearing while signed out with no attempt outstanding
/// restores the session. Events during an attempt are ignored; the
/// attempt's own result decides.
fn state_listener(
    inner: Arc<RwLock<SessionInner>>,
    event_tx: broadcast::Sender<SessionEvent>,
) -> StateListener {
    Arc::new(move |user: Option<&ProviderUser>| {
        let mut inner = inner.write().unwrap_or_else(PoisonError::into_inner);

        match (inner.state, user) {
            (SessionState::SignedIn, None) => {
                inner.sign_out();
                drop(inner);

                tracing::info!("Provider session ended, signing out");
                let _ = event_tx.send(SessionEvent::SignedOut);
            }
            (SessionState::SignedOut, Some(user)) if inner.outstanding.is_empty() => {
                let identity = UserIdentity::from_provider(user, SignInMethod::Restored);
                inner.state = SessionState::SignedIn;
                inner.identity = Some(identity.clone());
                drop(inner);

                tracing::info!(uid = %identity.uid, "Provider session restored");
                let _ = event_tx.send(SessionEvent::SignedIn(identity));
            }
            _ => {}
        }
    })
}
