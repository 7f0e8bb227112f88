//! Body-measurement profile.

pub mod types;

pub use types::{BodyMeasurements, NewProfile, ProfileUpdate, UserProfile};
