//! Authentication: identity provider boundary and session facade.

pub mod memory;
pub mod nonce;
pub mod provider;
pub mod session;

pub use memory::InMemoryIdentityProvider;
pub use nonce::{Nonce, NonceIssuer};
pub use provider::{
    FederatedAssertion, FederatedCredential, FederatedProvider, IdentityProvider, ListenerId,
    ProviderUser, StateListener,
};
pub use session::{
    AttemptToken, SessionEvent, SessionFacade, SessionState, SignInMethod, UserIdentity,
};

/// Authentication errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("An account already exists for this email")]
    AccountExists,

    #[error("Identity provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Identity token missing or invalid")]
    TokenError,

    #[error("Sign-in attempt was superseded")]
    Superseded,

    #[error("Sign-out failed: {0}")]
    SignOutFailed(String),
}
