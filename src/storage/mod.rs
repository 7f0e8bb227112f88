//! Storage module for the record store, repositories and configuration.

pub mod config;
pub mod database;
pub mod exercise_store;
pub mod fixtures;
pub mod profile_store;
pub mod schema;
pub mod workout_store;

pub use config::{AppConfig, AuthSettings, ConfigError, StoreSettings};
pub use database::{Filter, Record, RecordStore, StoreError};
pub use exercise_store::ExerciseRepository;
pub use fixtures::{seed_sample_data, SampleData};
pub use profile_store::ProfileRepository;
pub use workout_store::WorkoutRepository;
