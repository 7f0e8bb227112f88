//! Integration tests for the file-backed record store.
//!
//! Exercises the repositories against a database file and reopens it to
//! check what was made durable.

use chrono::Weekday;
use gymanager::profile::{BodyMeasurements, NewProfile, ProfileUpdate};
use gymanager::storage::{
    seed_sample_data, ExerciseRepository, Filter, ProfileRepository, RecordStore, StoreError,
    WorkoutRepository,
};
use gymanager::workouts::{ExerciseUpdate, NewExercise, NewWorkoutPlan, WorkoutPlanUpdate};
use gymanager::Exercise;
use tempfile::TempDir;
use uuid::Uuid;

fn plan_fields(name: &str, days: &[&str]) -> NewWorkoutPlan {
    NewWorkoutPlan {
        name: name.to_string(),
        week_days: days.iter().map(|d| d.to_string()).collect(),
        icon: "dumbbell".to_string(),
    }
}

fn exercise_fields(name: &str, sets: u16, reps: u16) -> NewExercise {
    NewExercise {
        name: name.to_string(),
        sets,
        reps,
        notes: None,
    }
}

#[test]
fn test_full_catalogue_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("gymanager.db");

    let (profile_id, plan_id) = {
        let store = RecordStore::open(&path).expect("Failed to open store");
        let profiles = ProfileRepository::new(&store);
        let workouts = WorkoutRepository::new(&store);
        let exercises = ExerciseRepository::new(&store);

        let profile = profiles
            .create_profile(NewProfile {
                name: "Ana".to_string(),
                age: 31,
                gender: "Female".to_string(),
                weight_kg: 61.5,
                height_cm: 165.0,
                measurements: BodyMeasurements {
                    abdomen: Some(72.0),
                    ..Default::default()
                },
            })
            .unwrap();
        profiles
            .update_profile(&profile, ProfileUpdate::weight(60.8))
            .unwrap();

        let plan = workouts
            .create_workout_plan(plan_fields("Lower Body", &["Terça", "Quinta"]))
            .unwrap();
        let squat = exercises
            .create_exercise(&plan, exercise_fields("Squat", 5, 5))
            .unwrap();
        exercises
            .create_exercise(&plan, exercise_fields("Lunge", 3, 10))
            .unwrap();
        exercises
            .update_exercise(
                &squat,
                ExerciseUpdate {
                    notes: Some(Some("Belt on top set".to_string())),
                    ..Default::default()
                },
            )
            .unwrap();

        assert!(!store.has_changes());
        (profile.id, plan.id)
    };

    let store = RecordStore::open(&path).expect("Failed to reopen store");
    let profile = ProfileRepository::new(&store)
        .fetch_profile()
        .unwrap()
        .expect("Profile lost on reopen");
    assert_eq!(profile.id, profile_id);
    assert_eq!(profile.weight_kg, 60.8);
    assert_eq!(profile.measurements.abdomen, Some(72.0));

    let plan = WorkoutRepository::new(&store)
        .fetch_workout_plan(&plan_id)
        .unwrap()
        .expect("Plan lost on reopen");
    assert_eq!(plan.scheduled_weekdays(), vec![Weekday::Tue, Weekday::Thu]);

    let exercises = ExerciseRepository::new(&store).fetch_exercises(&plan).unwrap();
    let names: Vec<&str> = exercises.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["Squat", "Lunge"]);
    assert_eq!(exercises[0].notes.as_deref(), Some("Belt on top set"));
}

#[test]
fn test_cascade_delete_is_durable() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("gymanager.db");

    let plan = {
        let store = RecordStore::open(&path).unwrap();
        let plan = WorkoutRepository::new(&store)
            .create_workout_plan(plan_fields("Push", &["Monday"]))
            .unwrap();
        let exercises = ExerciseRepository::new(&store);
        exercises
            .create_exercise(&plan, exercise_fields("Bench Press", 3, 12))
            .unwrap();
        exercises
            .create_exercise(&plan, exercise_fields("Dips", 3, 8))
            .unwrap();

        let removed = WorkoutRepository::new(&store)
            .delete_workout_plan(&plan)
            .unwrap();
        assert_eq!(removed, 2);
        plan
    };

    let store = RecordStore::open(&path).unwrap();
    assert!(WorkoutRepository::new(&store)
        .fetch_workout_plan(&plan.id)
        .unwrap()
        .is_none());
    assert!(ExerciseRepository::new(&store)
        .fetch_exercises(&plan)
        .unwrap()
        .is_empty());
    assert_eq!(store.count::<Exercise>(&Filter::All).unwrap(), 0);
}

#[test]
fn test_failed_save_is_not_persisted() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("gymanager.db");

    {
        let store = RecordStore::open(&path).unwrap();
        let workouts = WorkoutRepository::new(&store);
        let plan = workouts
            .create_workout_plan(plan_fields("Pull", &["Friday"]))
            .unwrap();

        // Pending rename plus an exercise pointing at no plan.
        let mut renamed = plan.clone();
        renamed.name = "Renamed".to_string();
        store.update(&renamed).unwrap();
        store
            .insert(&Exercise::from_new(
                Uuid::new_v4(),
                exercise_fields("Orphan", 1, 1),
            ))
            .unwrap();

        assert!(matches!(
            store.save(),
            Err(StoreError::PersistenceFailed(_))
        ));
        assert_eq!(
            workouts.fetch_workout_plan(&plan.id).unwrap().map(|p| p.name),
            Some("Pull".to_string())
        );

        // The store stays usable after the failure.
        workouts
            .update_workout_plan(
                &plan,
                WorkoutPlanUpdate {
                    icon: Some("rope".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
    }

    let store = RecordStore::open(&path).unwrap();
    let plans = WorkoutRepository::new(&store).fetch_workout_plans().unwrap();
    assert_eq!(plans.len(), 1);
    assert_eq!(plans[0].name, "Pull");
    assert_eq!(plans[0].icon, "rope");
    assert_eq!(store.count::<Exercise>(&Filter::All).unwrap(), 0);
}

#[test]
fn test_seeded_store_reopens() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("gymanager.db");

    let seeded = {
        let store = RecordStore::open(&path).unwrap();
        seed_sample_data(&store).expect("Failed to seed")
    };

    let store = RecordStore::open(&path).unwrap();
    let monday = WorkoutRepository::new(&store)
        .fetch_plans_for_weekday(Weekday::Mon)
        .unwrap();
    assert_eq!(monday, vec![seeded.plan.clone()]);
    assert_eq!(
        ExerciseRepository::new(&store)
            .count_exercises(&seeded.plan)
            .unwrap(),
        1
    );
}
