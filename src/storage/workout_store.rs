//! Workout plan persistence.

use chrono::Weekday;
use rusqlite::types::{Type, Value};
use rusqlite::Row;
use uuid::Uuid;

use crate::storage::database::{
    timestamp_column, uuid_column, Filter, Record, RecordStore, StoreError,
};
use crate::workouts::{Exercise, NewWorkoutPlan, WorkoutPlan, WorkoutPlanUpdate};

impl Record for WorkoutPlan {
    const TABLE: &'static str = "workout_plans";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "week_days_json",
        "icon",
        "created_at",
        "updated_at",
    ];

    fn id(&self) -> Uuid {
        self.id
    }

    fn values(&self) -> Result<Vec<Value>, StoreError> {
        let week_days_json = serde_json::to_string(&self.week_days)
            .map_err(|e| StoreError::SerializationError(e.to_string()))?;

        Ok(vec![
            Value::Text(self.id.to_string()),
            Value::Text(self.name.clone()),
            Value::Text(week_days_json),
            Value::Text(self.icon.clone()),
            Value::Text(self.created_at.to_rfc3339()),
            Value::Text(self.updated_at.to_rfc3339()),
        ])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let week_days_json: String = row.get(2)?;
        let week_days: Vec<String> = serde_json::from_str(&week_days_json)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;

        Ok(WorkoutPlan {
            id: uuid_column(row, 0)?,
            name: row.get(1)?,
            week_days,
            icon: row.get(3)?,
            created_at: timestamp_column(row, 4)?,
            updated_at: timestamp_column(row, 5)?,
        })
    }
}

/// Repository for workout plans.
pub struct WorkoutRepository<'a> {
    store: &'a RecordStore,
}

impl<'a> WorkoutRepository<'a> {
    /// Create a repository over the given store.
    pub fn new(store: &'a RecordStore) -> Self {
        Self { store }
    }

    /// Create and save a plan. Week-day labels are stored as given.
    pub fn create_workout_plan(&self, fields: NewWorkoutPlan) -> Result<WorkoutPlan, StoreError> {
        let plan = WorkoutPlan::from_new(fields);
        self.store.write(|store| store.insert(&plan))?;

        tracing::debug!(plan_id = %plan.id, name = %plan.name, "Workout plan created");
        Ok(plan)
    }

    /// Get all plans, oldest first.
    pub fn fetch_workout_plans(&self) -> Result<Vec<WorkoutPlan>, StoreError> {
        self.store.fetch(&Filter::All)
    }

    /// Get a plan by ID; `None` if it does not exist or was deleted.
    pub fn fetch_workout_plan(&self, id: &Uuid) -> Result<Option<WorkoutPlan>, StoreError> {
        self.store.get(id)
    }

    /// Get the plans scheduled on a given week day.
    pub fn fetch_plans_for_weekday(&self, day: Weekday) -> Result<Vec<WorkoutPlan>, StoreError> {
        Ok(self
            .fetch_workout_plans()?
            .into_iter()
            .filter(|plan| plan.is_scheduled_on(day))
            .collect())
    }

    /// Apply a partial update and save it.
    pub fn update_workout_plan(
        &self,
        plan: &WorkoutPlan,
        update: WorkoutPlanUpdate,
    ) -> Result<WorkoutPlan, StoreError> {
        let updated = self.store.write(|store| {
            let mut current: WorkoutPlan = store
                .get(&plan.id)?
                .ok_or_else(|| StoreError::NotFound(format!("Workout plan {}", plan.id)))?;
            update.apply_to(&mut current);
            store.update(&current)?;
            Ok(current)
        })?;

        tracing::debug!(plan_id = %updated.id, "Workout plan updated");
        Ok(updated)
    }

    /// Delete a plan together with all of its exercises.
    ///
    /// Returns the number of exercises removed with it.
    pub fn delete_workout_plan(&self, plan: &WorkoutPlan) -> Result<usize, StoreError> {
        let removed = self.store.write(|store| {
            let exercises =
                store.count::<Exercise>(&Filter::eq("plan_id", plan.id.to_string()))?;
            if !store.delete::<WorkoutPlan>(&plan.id)? {
                return Err(StoreError::NotFound(format!("Workout plan {}", plan.id)));
            }
            Ok(exercises)
        })?;

        tracing::debug!(plan_id = %plan.id, exercises = removed, "Workout plan deleted");
        Ok(removed)
    }

    /// Count stored plans.
    pub fn count_workout_plans(&self) -> Result<usize, StoreError> {
        self.store.count::<WorkoutPlan>(&Filter::All)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(days: &[&str]) -> Vec<String> {
        days.iter().map(|d| d.to_string()).collect()
    }

    fn new_plan(name: &str, days: &[&str]) -> NewWorkoutPlan {
        NewWorkoutPlan {
            name: name.to_string(),
            week_days: labels(days),
            icon: "dumbbell".to_string(),
        }
    }

    #[test]
    fn test_create_and_fetch() {
        let store = RecordStore::open_in_memory().expect("Failed to create store");
        let repo = WorkoutRepository::new(&store);

        let plan = repo
            .create_workout_plan(new_plan("Upper Body A", &["Monday", "Wednesday", "Friday"]))
            .expect("Failed to create plan");

        let fetched = repo
            .fetch_workout_plan(&plan.id)
            .expect("Failed to fetch")
            .expect("Plan not found");
        assert_eq!(fetched, plan);
        assert_eq!(fetched.week_days, labels(&["Monday", "Wednesday", "Friday"]));
    }

    #[test]
    fn test_labels_stored_verbatim() {
        let store = RecordStore::open_in_memory().unwrap();
        let repo = WorkoutRepository::new(&store);
        let days = ["Friday", "Friday", "Funday", "", "Segunda"];

        let plan = repo.create_workout_plan(new_plan("Odd", &days)).unwrap();
        let fetched = repo.fetch_workout_plan(&plan.id).unwrap().unwrap();

        assert_eq!(fetched.week_days, labels(&days));
    }

    #[test]
    fn test_fetch_all_in_creation_order() {
        let store = RecordStore::open_in_memory().unwrap();
        let repo = WorkoutRepository::new(&store);

        let a = repo.create_workout_plan(new_plan("A", &[])).unwrap();
        let b = repo.create_workout_plan(new_plan("B", &[])).unwrap();

        let ids: Vec<Uuid> = repo
            .fetch_workout_plans()
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![a.id, b.id]);
        assert_eq!(repo.count_workout_plans().unwrap(), 2);
    }

    #[test]
    fn test_fetch_deleted_plan_returns_none() {
        let store = RecordStore::open_in_memory().unwrap();
        let repo = WorkoutRepository::new(&store);
        let plan = repo.create_workout_plan(new_plan("Gone", &[])).unwrap();

        repo.delete_workout_plan(&plan).expect("Failed to delete");

        assert!(repo.fetch_workout_plan(&plan.id).unwrap().is_none());
        assert!(repo.fetch_workout_plan(&Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn test_update_partial() {
        let store = RecordStore::open_in_memory().unwrap();
        let repo = WorkoutRepository::new(&store);
        let plan = repo
            .create_workout_plan(new_plan("Push", &["Tuesday"]))
            .unwrap();

        let updated = repo
            .update_workout_plan(
                &plan,
                WorkoutPlanUpdate {
                    week_days: Some(labels(&["Tuesday", "Thursday"])),
                    ..Default::default()
                },
            )
            .expect("Failed to update");

        assert_eq!(updated.name, "Push");
        assert_eq!(updated.icon, "dumbbell");
        assert_eq!(updated.week_days, labels(&["Tuesday", "Thursday"]));
        assert_eq!(repo.fetch_workout_plan(&plan.id).unwrap(), Some(updated));
    }

    #[test]
    fn test_update_deleted_plan() {
        let store = RecordStore::open_in_memory().unwrap();
        let repo = WorkoutRepository::new(&store);
        let plan = repo.create_workout_plan(new_plan("Pull", &[])).unwrap();
        repo.delete_workout_plan(&plan).unwrap();

        let result = repo.update_workout_plan(&plan, WorkoutPlanUpdate::default());
        assert!(matches!(result, Err(StoreError::NotFound(_))));
        assert!(matches!(
            repo.delete_workout_plan(&plan),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_fetch_plans_for_weekday() {
        let store = RecordStore::open_in_memory().unwrap();
        let repo = WorkoutRepository::new(&store);
        let upper = repo
            .create_workout_plan(new_plan("Upper", &["Segunda", "Quarta"]))
            .unwrap();
        let lower = repo
            .create_workout_plan(new_plan("Lower", &["Tuesday", "wednesday"]))
            .unwrap();
        repo.create_workout_plan(new_plan("Unscheduled", &["whenever"]))
            .unwrap();

        let monday: Vec<Uuid> = repo
            .fetch_plans_for_weekday(Weekday::Mon)
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(monday, vec![upper.id]);

        let wednesday = repo.fetch_plans_for_weekday(Weekday::Wed).unwrap();
        assert_eq!(wednesday.len(), 2);
        assert!(wednesday.iter().any(|p| p.id == lower.id));

        assert!(repo.fetch_plans_for_weekday(Weekday::Sun).unwrap().is_empty());
    }
}
