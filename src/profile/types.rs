//! Profile types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Name given to the profile created on first sign-in.
pub const DEFAULT_PROFILE_NAME: &str = "New User";

/// Optional body-circumference measurements, in centimetres.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BodyMeasurements {
    pub arm_left: Option<f64>,
    pub arm_right: Option<f64>,
    pub thigh_left: Option<f64>,
    pub thigh_right: Option<f64>,
    pub calf_left: Option<f64>,
    pub calf_right: Option<f64>,
    pub shoulder: Option<f64>,
    pub abdomen: Option<f64>,
}

impl BodyMeasurements {
    /// Whether no measurement has been recorded.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// User body-measurement profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Unique identifier
    pub id: Uuid,
    /// Display name
    pub name: String,
    /// Age in years
    pub age: u16,
    /// Free-text gender
    pub gender: String,
    /// Weight in kilograms
    pub weight_kg: f64,
    /// Height in centimetres
    pub height_cm: f64,
    /// Circumference measurements
    pub measurements: BodyMeasurements,
    /// Profile creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// Build a fresh record from creation fields.
    pub fn from_new(fields: NewProfile) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: fields.name,
            age: fields.age,
            gender: fields.gender,
            weight_kg: fields.weight_kg,
            height_cm: fields.height_cm,
            measurements: fields.measurements,
            created_at: now,
            updated_at: now,
        }
    }

    /// Body mass index, if height and weight are known.
    pub fn bmi(&self) -> Option<f64> {
        if self.height_cm <= 0.0 || self.weight_kg <= 0.0 {
            return None;
        }
        let height_m = self.height_cm / 100.0;
        Some(self.weight_kg / (height_m * height_m))
    }
}

/// Fields for creating a profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewProfile {
    pub name: String,
    pub age: u16,
    pub gender: String,
    pub weight_kg: f64,
    pub height_cm: f64,
    #[serde(default)]
    pub measurements: BodyMeasurements,
}

impl NewProfile {
    /// The placeholder profile created on first sign-in.
    pub fn placeholder() -> Self {
        Self {
            name: DEFAULT_PROFILE_NAME.to_string(),
            ..Default::default()
        }
    }
}

/// Partial profile update. `None` leaves a field unchanged; for the
/// optional measurements `Some(None)` clears the value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub age: Option<u16>,
    pub gender: Option<String>,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub arm_left: Option<Option<f64>>,
    pub arm_right: Option<Option<f64>>,
    pub thigh_left: Option<Option<f64>>,
    pub thigh_right: Option<Option<f64>>,
    pub calf_left: Option<Option<f64>>,
    pub calf_right: Option<Option<f64>>,
    pub shoulder: Option<Option<f64>>,
    pub abdomen: Option<Option<f64>>,
}

impl ProfileUpdate {
    /// Update that only changes the weight.
    pub fn weight(weight_kg: f64) -> Self {
        Self {
            weight_kg: Some(weight_kg),
            ..Default::default()
        }
    }

    /// Whether the update changes nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply the present fields to a profile.
    pub fn apply_to(self, profile: &mut UserProfile) {
        if let Some(name) = self.name {
            profile.name = name;
        }
        if let Some(age) = self.age {
            profile.age = age;
        }
        if let Some(gender) = self.gender {
            profile.gender = gender;
        }
        if let Some(weight_kg) = self.weight_kg {
            profile.weight_kg = weight_kg;
        }
        if let Some(height_cm) = self.height_cm {
            profile.height_cm = height_cm;
        }

        let m = &mut profile.measurements;
        for (slot, value) in [
            (&mut m.arm_left, self.arm_left),
            (&mut m.arm_right, self.arm_right),
            (&mut m.thigh_left, self.thigh_left),
            (&mut m.thigh_right, self.thigh_right),
            (&mut m.calf_left, self.calf_left),
            (&mut m.calf_right, self.calf_right),
            (&mut m.shoulder, self.shoulder),
            (&mut m.abdomen, self.abdomen),
        ] {
            if let Some(value) = value {
                *slot = value;
            }
        }

        profile.updated_at = Utc::now();
    }
}
