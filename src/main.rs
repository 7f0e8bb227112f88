//! GYManager - headless entry point.
//!
//! Opens the local store, optionally seeds the sample data, signs in as a
//! guest so the default profile exists, and reports what the store holds.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use gymanager::auth::InMemoryIdentityProvider;
use gymanager::storage::config::{load_config, load_config_from};
use gymanager::storage::seed_sample_data;
use gymanager::GymApp;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "gymanager")]
#[command(about = "Open the GYManager record store and report what it holds")]
#[command(version)]
struct Options {
    /// Write the sample profile and workout plan into an empty store
    #[arg(long)]
    seed: bool,

    /// Configuration file; its directory holds the database
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting GYManager v{}", env!("CARGO_PKG_VERSION"));

    let options = Options::parse();
    let config = match &options.config {
        Some(path) => load_config_from(path),
        None => load_config(),
    }
    .context("Failed to load configuration")?;

    let provider = Arc::new(InMemoryIdentityProvider::new());
    let app = GymApp::open(&config, provider).context("Failed to open record store")?;

    if options.seed {
        if app.workouts().count_workout_plans()? == 0 && app.profiles().count_profiles()? == 0 {
            seed_sample_data(app.store()).context("Failed to seed sample data")?;
        } else {
            tracing::info!("Store already has data, skipping seed");
        }
    }

    let active = app.sign_in_as_guest().await?;
    tracing::info!(
        uid = %active.identity.uid,
        profile = %active.profile.name,
        bmi = ?active.profile.bmi(),
        "Session ready"
    );

    for plan in app.workouts().fetch_workout_plans()? {
        let exercises = app.exercises().fetch_exercises(&plan)?;
        tracing::info!(
            plan = %plan.name,
            days = ?plan.scheduled_weekdays(),
            exercises = exercises.len(),
            total_reps = exercises.iter().map(|e| e.total_reps()).sum::<u32>(),
            "Workout plan"
        );
    }

    app.sign_out().await?;
    Ok(())
}
