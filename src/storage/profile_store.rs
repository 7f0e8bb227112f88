//! Profile persistence.

use rusqlite::types::Value;
use rusqlite::Row;
use uuid::Uuid;

use crate::profile::{BodyMeasurements, NewProfile, ProfileUpdate, UserProfile};
use crate::storage::database::{
    optional_real, timestamp_column, uuid_column, Filter, Record, RecordStore, StoreError,
};

impl Record for UserProfile {
    const TABLE: &'static str = "profiles";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "age",
        "gender",
        "weight_kg",
        "height_cm",
        "arm_left",
        "arm_right",
        "thigh_left",
        "thigh_right",
        "calf_left",
        "calf_right",
        "shoulder",
        "abdomen",
        "created_at",
        "updated_at",
    ];

    fn id(&self) -> Uuid {
        self.id
    }

    fn values(&self) -> Result<Vec<Value>, StoreError> {
        let m = &self.measurements;
        Ok(vec![
            Value::Text(self.id.to_string()),
            Value::Text(self.name.clone()),
            Value::Integer(i64::from(self.age)),
            Value::Text(self.gender.clone()),
            Value::Real(self.weight_kg),
            Value::Real(self.height_cm),
            optional_real(m.arm_left),
            optional_real(m.arm_right),
            optional_real(m.thigh_left),
            optional_real(m.thigh_right),
            optional_real(m.calf_left),
            optional_real(m.calf_right),
            optional_real(m.shoulder),
            optional_real(m.abdomen),
            Value::Text(self.created_at.to_rfc3339()),
            Value::Text(self.updated_at.to_rfc3339()),
        ])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(UserProfile {
            id: uuid_column(row, 0)?,
            name: row.get(1)?,
            age: row.get(2)?,
            gender: row.get(3)?,
            weight_kg: row.get(4)?,
            height_cm: row.get(5)?,
            measurements: BodyMeasurements {
                arm_left: row.get(6)?,
                arm_right: row.get(7)?,
                thigh_left: row.get(8)?,
                thigh_right: row.get(9)?,
                calf_left: row.get(10)?,
                calf_right: row.get(11)?,
                shoulder: row.get(12)?,
                abdomen: row.get(13)?,
            },
            created_at: timestamp_column(row, 14)?,
            updated_at: timestamp_column(row, 15)?,
        })
    }
}

/// Repository for the user's body-measurement profile.
pub struct ProfileRepository<'a> {
    store: &'a RecordStore,
}

impl<'a> ProfileRepository<'a> {
    /// Create a repository over the given store.
    pub fn new(store: &'a RecordStore) -> Self {
        Self { store }
    }

    /// Create and save a profile.
    pub fn create_profile(&self, fields: NewProfile) -> Result<UserProfile, StoreError> {
        let profile = UserProfile::from_new(fields);
        self.store.write(|store| store.insert(&profile))?;

        tracing::debug!(profile_id = %profile.id, "Profile created");
        Ok(profile)
    }

    /// Get the first profile, or `None` if there is none.
    ///
    /// A failed query is reported as [`StoreError::LookupFailed`], never
    /// as "no profile".
    pub fn fetch_profile(&self) -> Result<Option<UserProfile>, StoreError> {
        self.store.first(&Filter::All)
    }

    /// Get a profile by ID.
    pub fn fetch_profile_by_id(&self, id: &Uuid) -> Result<Option<UserProfile>, StoreError> {
        self.store.get(id)
    }

    /// Return the existing profile or create the placeholder one.
    pub fn ensure_profile(&self) -> Result<UserProfile, StoreError> {
        if let Some(profile) = self.fetch_profile()? {
            return Ok(profile);
        }

        tracing::info!("No profile found, creating default profile");
        self.create_profile(NewProfile::placeholder())
    }

    /// Apply a partial update and save it.
    ///
    /// Only the fields present in `update` change; everything else keeps
    /// the value currently stored.
    pub fn update_profile(
        &self,
        profile: &UserProfile,
        update: ProfileUpdate,
    ) -> Result<UserProfile, StoreError> {
        let updated = self.store.write(|store| {
            let mut current: UserProfile = store
                .get(&profile.id)?
                .ok_or_else(|| StoreError::NotFound(format!("Profile {}", profile.id)))?;
            if update.is_empty() {
                return Ok(current);
            }
            update.apply_to(&mut current);
            store.update(&current)?;
            Ok(current)
        })?;

        tracing::debug!(profile_id = %updated.id, "Profile updated");
        Ok(updated)
    }

    /// Delete a profile and save.
    pub fn delete_profile(&self, profile: &UserProfile) -> Result<(), StoreError> {
        self.store.write(|store| {
            if !store.delete::<UserProfile>(&profile.id)? {
                return Err(StoreError::NotFound(format!("Profile {}", profile.id)));
            }
            Ok(())
        })?;

        tracing::debug!(profile_id = %profile.id, "Profile deleted");
        Ok(())
    }

    /// Count stored profiles.
    pub fn count_profiles(&self) -> Result<usize, StoreError> {
        self.store.count::<UserProfile>(&Filter::All)
    }
}
