//! Exercise persistence, scoped by the owning workout plan.

use rusqlite::types::Value;
use rusqlite::Row;
use uuid::Uuid;

use crate::storage::database::{
    optional_text, timestamp_column, uuid_column, Filter, Record, RecordStore, StoreError,
};
use crate::workouts::{Exercise, ExerciseUpdate, NewExercise, WorkoutPlan};

impl Record for Exercise {
    const TABLE: &'static str = "exercises";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "plan_id",
        "name",
        "sets",
        "reps",
        "notes",
        "created_at",
        "updated_at",
    ];

    fn id(&self) -> Uuid {
        self.id
    }

    fn values(&self) -> Result<Vec<Value>, StoreError> {
        Ok(vec![
            Value::Text(self.id.to_string()),
            Value::Text(self.plan_id.to_string()),
            Value::Text(self.name.clone()),
            Value::Integer(i64::from(self.sets)),
            Value::Integer(i64::from(self.reps)),
            optional_text(self.notes.as_deref()),
            Value::Text(self.created_at.to_rfc3339()),
            Value::Text(self.updated_at.to_rfc3339()),
        ])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Exercise {
            id: uuid_column(row, 0)?,
            plan_id: uuid_column(row, 1)?,
            name: row.get(2)?,
            sets: row.get(3)?,
            reps: row.get(4)?,
            notes: row.get(5)?,
            created_at: timestamp_column(row, 6)?,
            updated_at: timestamp_column(row, 7)?,
        })
    }
}

fn plan_filter(plan_id: &Uuid) -> Filter {
    Filter::eq("plan_id", plan_id.to_string())
}

/// Repository for the exercises of workout plans.
pub struct ExerciseRepository<'a> {
    store: &'a RecordStore,
}

impl<'a> ExerciseRepository<'a> {
    /// Create a repository over the given store.
    pub fn new(store: &'a RecordStore) -> Self {
        Self { store }
    }

    /// Create an exercise inside `plan` and save it.
    ///
    /// Fails with [`StoreError::MissingParent`] if the plan is no longer
    /// stored; nothing is written in that case.
    pub fn create_exercise(
        &self,
        plan: &WorkoutPlan,
        fields: NewExercise,
    ) -> Result<Exercise, StoreError> {
        let exercise = Exercise::from_new(plan.id, fields);

        self.store.write(|store| {
            if store.get::<WorkoutPlan>(&plan.id)?.is_none() {
                return Err(StoreError::MissingParent(plan.id));
            }
            store.insert(&exercise)
        })?;

        tracing::debug!(
            exercise_id = %exercise.id,
            plan_id = %plan.id,
            name = %exercise.name,
            "Exercise created"
        );
        Ok(exercise)
    }

    /// Get the exercises of a plan, oldest first.
    pub fn fetch_exercises(&self, plan: &WorkoutPlan) -> Result<Vec<Exercise>, StoreError> {
        self.store.fetch(&plan_filter(&plan.id))
    }

    /// Get an exercise by ID.
    pub fn fetch_exercise(&self, id: &Uuid) -> Result<Option<Exercise>, StoreError> {
        self.store.get(id)
    }

    /// Apply a partial update and save it. The owning plan never changes.
    pub fn update_exercise(
        &self,
        exercise: &Exercise,
        update: ExerciseUpdate,
    ) -> Result<Exercise, StoreError> {
        let updated = self.store.write(|store| {
            let mut current: Exercise = store
                .get(&exercise.id)?
                .ok_or_else(|| StoreError::NotFound(format!("Exercise {}", exercise.id)))?;
            update.apply_to(&mut current);
            store.update(&current)?;
            Ok(current)
        })?;

        tracing::debug!(exercise_id = %updated.id, "Exercise updated");
        Ok(updated)
    }

    /// Delete an exercise and save.
    pub fn delete_exercise(&self, exercise: &Exercise) -> Result<(), StoreError> {
        self.store.write(|store| {
            if !store.delete::<Exercise>(&exercise.id)? {
                return Err(StoreError::NotFound(format!("Exercise {}", exercise.id)));
            }
            Ok(())
        })?;

        tracing::debug!(exercise_id = %exercise.id, "Exercise deleted");
        Ok(())
    }

    /// Count the exercises of a plan.
    pub fn count_exercises(&self, plan: &WorkoutPlan) -> Result<usize, StoreError> {
        self.store.count::<Exercise>(&plan_filter(&plan.id))
    }
}
