//! Sample data for previews and first runs.

use crate::profile::{BodyMeasurements, NewProfile, UserProfile};
use crate::storage::database::{RecordStore, StoreError};
use crate::workouts::{Exercise, NewExercise, NewWorkoutPlan, WorkoutPlan};

/// Records written by [`seed_sample_data`].
#[derive(Debug, Clone)]
pub struct SampleData {
    pub profile: UserProfile,
    pub plan: WorkoutPlan,
    pub exercise: Exercise,
}

/// Write the sample profile, plan and exercise in one unit of work.
pub fn seed_sample_data(store: &RecordStore) -> Result<SampleData, StoreError> {
    let profile = UserProfile::from_new(NewProfile {
        name: "Danilo Diniz".to_string(),
        age: 20,
        gender: "Male".to_string(),
        weight_kg: 72.0,
        height_cm: 178.0,
        measurements: BodyMeasurements {
            arm_left: Some(34.5),
            arm_right: Some(34.0),
            thigh_left: Some(54.5),
            thigh_right: Some(55.0),
            calf_left: Some(37.0),
            calf_right: Some(37.0),
            shoulder: Some(110.0),
            abdomen: Some(85.0),
        },
    });

    let plan = WorkoutPlan::from_new(NewWorkoutPlan {
        name: "Upper Body A".to_string(),
        week_days: ["Monday", "Wednesday", "Friday"]
            .iter()
            .map(|d| d.to_string())
            .collect(),
        icon: "dumbbell".to_string(),
    });

    let exercise = Exercise::from_new(
        plan.id,
        NewExercise {
            name: "Bench Press".to_string(),
            sets: 3,
            reps: 12,
            notes: Some("Keep shoulder blades retracted".to_string()),
        },
    );

    store.write(|store| {
        store.insert(&profile)?;
        store.insert(&plan)?;
        store.insert(&exercise)
    })?;

    tracing::info!(plan = %plan.name, "Sample data seeded");
    Ok(SampleData {
        profile,
        plan,
        exercise,
    })
}
