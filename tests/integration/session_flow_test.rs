//! Integration tests for sign-in flows through the application root.

use std::sync::Arc;

use gymanager::auth::{
    FederatedProvider, InMemoryIdentityProvider, SessionEvent, SessionState, SignInMethod,
};
use gymanager::profile::ProfileUpdate;
use gymanager::storage::config::{load_config_from, save_config_to, AppConfig};
use gymanager::workouts::NewWorkoutPlan;
use gymanager::{AppError, AuthError, GymApp};
use tempfile::TempDir;

fn config_in(dir: &TempDir) -> AppConfig {
    let mut config = AppConfig::default();
    config.auth.google_client_id = Some("test-client".to_string());
    let path = dir.path().join("config.toml");
    save_config_to(&config, &path).expect("Failed to save config");
    load_config_from(&path).expect("Failed to load config")
}

#[tokio::test]
async fn test_account_lifecycle_with_file_store() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir);
    let provider = Arc::new(InMemoryIdentityProvider::new());

    {
        let app = GymApp::open(&config, Arc::clone(&provider)).expect("Failed to open app");
        let active = app
            .create_account("ana@example.com", "secret123")
            .await
            .expect("Account creation failed");
        assert!(!active.identity.is_guest);

        app.profiles()
            .update_profile(&active.profile, ProfileUpdate::weight(59.0))
            .unwrap();
        app.workouts()
            .create_workout_plan(NewWorkoutPlan {
                name: "Full Body".to_string(),
                week_days: vec!["Saturday".to_string()],
                icon: "figure".to_string(),
            })
            .unwrap();
        app.sign_out().await.unwrap();
        assert_eq!(app.session().state(), SessionState::SignedOut);
    }

    assert!(config.database_path().exists());
    assert_eq!(provider.listener_count(), 0);

    let app = GymApp::open(&config, Arc::clone(&provider)).unwrap();
    let active = app
        .sign_in_with_credentials("ana@example.com", "secret123")
        .await
        .unwrap();
    assert_eq!(active.profile.weight_kg, 59.0);
    assert_eq!(app.workouts().count_workout_plans().unwrap(), 1);
}

#[tokio::test]
async fn test_federated_sign_in_through_app() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir);
    let app = GymApp::open(&config, Arc::new(InMemoryIdentityProvider::new())).unwrap();
    let mut events = app.session().subscribe();

    let active = app
        .sign_in_with_external_provider(FederatedProvider::Google)
        .await
        .expect("Google sign-in failed");

    assert_eq!(
        active.identity.method,
        SignInMethod::Federated(FederatedProvider::Google)
    );
    assert!(matches!(
        events.recv().await.unwrap(),
        SessionEvent::Authenticating(_)
    ));
    assert_eq!(
        events.recv().await.unwrap(),
        SessionEvent::SignedIn(active.identity.clone())
    );
}

#[tokio::test]
async fn test_guest_then_revocation() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir);
    let provider = Arc::new(InMemoryIdentityProvider::new());
    let app = GymApp::open(&config, Arc::clone(&provider)).unwrap();

    let guest = app.sign_in_as_guest().await.unwrap();
    assert!(guest.identity.is_guest);
    assert!(app.session().is_guest());

    provider.revoke_session();

    assert_eq!(app.session().state(), SessionState::SignedOut);
    assert!(app.activate_current_user().unwrap().is_none());
    // The profile outlives the session.
    assert_eq!(app.profiles().count_profiles().unwrap(), 1);
}

#[tokio::test]
async fn test_provider_outage_reported() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir);
    let provider = Arc::new(InMemoryIdentityProvider::new());
    provider.set_unavailable(true);
    let app = GymApp::open(&config, Arc::clone(&provider)).unwrap();

    let result = app.sign_in_with_credentials("ana@example.com", "secret123").await;

    assert!(matches!(
        result,
        Err(AppError::Auth(AuthError::ProviderUnavailable(_)))
    ));
    assert_eq!(app.profiles().count_profiles().unwrap(), 0);
}
