//! GYManager - Gym Workout and Body-Measurement Tracking Core
//!
//! The data and session layer of a fitness-tracking application: a local
//! record store with profile, workout plan and exercise repositories, and a
//! session facade that normalizes password, guest and federated sign-in
//! over an external identity provider.

pub mod app;
pub mod auth;
pub mod profile;
pub mod storage;
pub mod workouts;

// Re-export commonly used types
pub use app::{ActiveUser, AppError, GymApp};
pub use auth::{AuthError, IdentityProvider, SessionFacade};
pub use profile::UserProfile;
pub use storage::{RecordStore, StoreError};
pub use workouts::{Exercise, WorkoutPlan};
