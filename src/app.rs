//! Application composition root.
//!
//! `GymApp` owns the record store and the session facade. Repositories are
//! handed out as short-lived borrows of the store, and every successful
//! sign-in makes sure a profile exists.

use std::sync::Arc;

use crate::auth::{
    AuthError, FederatedProvider, IdentityProvider, SessionFacade, SessionState, UserIdentity,
};
use crate::profile::UserProfile;
use crate::storage::config::{AppConfig, AuthSettings};
use crate::storage::{
    ExerciseRepository, ProfileRepository, RecordStore, StoreError, WorkoutRepository,
};

/// A signed-in user together with their profile.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveUser {
    pub identity: UserIdentity,
    pub profile: UserProfile,
}

/// Application state.
pub struct GymApp<P: IdentityProvider> {
    store: RecordStore,
    session: SessionFacade<P>,
}

impl<P: IdentityProvider> GymApp<P> {
    /// Assemble the app from an open store and a provider.
    pub fn new(store: RecordStore, provider: Arc<P>, settings: AuthSettings) -> Self {
        Self {
            store,
            session: SessionFacade::new(provider, settings),
        }
    }

    /// Open the store named by the configuration and assemble the app.
    pub fn open(config: &AppConfig, provider: Arc<P>) -> Result<Self, AppError> {
        let store = RecordStore::open(&config.database_path())?;
        Ok(Self::new(store, provider, config.auth.clone()))
    }

    /// The record store.
    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// The session facade.
    pub fn session(&self) -> &SessionFacade<P> {
        &self.session
    }

    pub fn profiles(&self) -> ProfileRepository<'_> {
        ProfileRepository::new(&self.store)
    }

    pub fn workouts(&self) -> WorkoutRepository<'_> {
        WorkoutRepository::new(&self.store)
    }

    pub fn exercises(&self) -> ExerciseRepository<'_> {
        ExerciseRepository::new(&self.store)
    }

    /// Sign in with email and password.
    pub async fn sign_in_with_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ActiveUser, AppError> {
        let identity = self.session.sign_in_with_credentials(email, password).await?;
        self.activate(identity)
    }

    /// Create an account and sign it in.
    pub async fn create_account(&self, email: &str, password: &str) -> Result<ActiveUser, AppError> {
        let identity = self.session.create_account(email, password).await?;
        self.activate(identity)
    }

    /// Sign in as a guest.
    pub async fn sign_in_as_guest(&self) -> Result<ActiveUser, AppError> {
        let identity = self.session.sign_in_as_guest().await?;
        self.activate(identity)
    }

    /// Sign in through a federated provider.
    pub async fn sign_in_with_external_provider(
        &self,
        provider: FederatedProvider,
    ) -> Result<ActiveUser, AppError> {
        let identity = self.session.sign_in_with_external_provider(provider).await?;
        self.activate(identity)
    }

    /// The active user, if signed in (including restored sessions).
    ///
    /// Creates and saves the default profile when none exists yet, like
    /// every successful sign-in does.
    pub fn activate_current_user(&self) -> Result<Option<ActiveUser>, AppError> {
        if self.session.state() != SessionState::SignedIn {
            return Ok(None);
        }
        match self.session.identity() {
            Some(identity) => self.activate(identity).map(Some),
            None => Ok(None),
        }
    }

    /// Sign out.
    pub async fn sign_out(&self) -> Result<(), AppError> {
        self.session.sign_out().await?;
        Ok(())
    }

    fn activate(&self, identity: UserIdentity) -> Result<ActiveUser, AppError> {
        let profile = self.profiles().ensure_profile()?;
        Ok(ActiveUser { identity, profile })
    }
}

/// Application errors.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}
