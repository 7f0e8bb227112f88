//! Identity provider capability.
//!
//! The session facade talks to the remote identity service only through
//! [`IdentityProvider`]; wire protocols live behind it.

use std::sync::Arc;

use super::nonce::Nonce;
use super::AuthError;

/// A user as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderUser {
    /// Opaque provider identifier
    pub uid: String,
    /// Email address, absent for anonymous and some federated users
    pub email: Option<String>,
    /// Whether the provider considers the user anonymous
    pub is_anonymous: bool,
}

/// Federated identity providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FederatedProvider {
    Google,
    Apple,
}

impl FederatedProvider {
    /// Provider identifier as used in credentials.
    pub fn as_str(&self) -> &'static str {
        match self {
            FederatedProvider::Google => "google.com",
            FederatedProvider::Apple => "apple.com",
        }
    }
}

impl std::fmt::Display for FederatedProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FederatedProvider::Google => write!(f, "Google"),
            FederatedProvider::Apple => write!(f, "Apple"),
        }
    }
}

/// Result of the interactive step with a federated provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FederatedAssertion {
    /// Signed identity token, bound to the hashed nonce
    pub id_token: Option<String>,
    /// Access token, when the provider issues one
    pub access_token: Option<String>,
}

/// Credential exchanged with the identity provider for a session.
///
/// Built from an assertion and the raw nonce it was requested with; the
/// nonce is consumed so it cannot be sent twice.
#[derive(Debug)]
pub struct FederatedCredential {
    pub provider: FederatedProvider,
    pub id_token: String,
    pub access_token: Option<String>,
    raw_nonce: String,
}

impl FederatedCredential {
    /// Bind an identity token to the nonce it was issued for.
    pub fn new(
        provider: FederatedProvider,
        id_token: String,
        access_token: Option<String>,
        nonce: Nonce,
    ) -> Self {
        Self {
            provider,
            id_token,
            access_token,
            raw_nonce: nonce.into_raw(),
        }
    }

    /// The raw nonce the identity token must be bound to.
    pub fn raw_nonce(&self) -> &str {
        &self.raw_nonce
    }
}

/// Callback invoked whenever the provider's signed-in user changes.
pub type StateListener = Arc<dyn Fn(Option<&ProviderUser>) + Send + Sync>;

/// Handle for removing a state listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Trait for identity provider access
pub trait IdentityProvider: Send + Sync {
    /// Create an email/password account and sign it in
    fn create_account(
        &self,
        email: &str,
        password: &str,
    ) -> impl std::future::Future<Output = Result<ProviderUser, AuthError>> + Send;

    /// Sign in with email and password
    fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> impl std::future::Future<Output = Result<ProviderUser, AuthError>> + Send;

    /// Sign in without an account
    fn sign_in_anonymously(
        &self,
    ) -> impl std::future::Future<Output = Result<ProviderUser, AuthError>> + Send;

    /// Run the federated provider's interactive step, binding the result
    /// to `hashed_nonce`
    fn request_assertion(
        &self,
        provider: FederatedProvider,
        hashed_nonce: &str,
    ) -> impl std::future::Future<Output = Result<FederatedAssertion, AuthError>> + Send;

    /// Exchange a federated credential for a session
    fn sign_in_with_assertion(
        &self,
        credential: FederatedCredential,
    ) -> impl std::future::Future<Output = Result<ProviderUser, AuthError>> + Send;

    /// End the provider session
    fn sign_out(&self) -> impl std::future::Future<Output = Result<(), AuthError>> + Send;

    /// Register a callback for signed-in user changes
    fn add_state_listener(&self, listener: StateListener) -> ListenerId;

    /// Remove a callback registered with `add_state_listener`
    fn remove_state_listener(&self, id: ListenerId);
}
