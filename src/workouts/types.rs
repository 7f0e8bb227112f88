//! Workout plan and exercise types.

use chrono::{DateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::weekdays::resolve_weekdays;

/// A named workout plan scheduled on a set of week days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutPlan {
    /// Unique identifier
    pub id: Uuid,
    /// Plan name
    pub name: String,
    /// Week-day labels, stored verbatim
    pub week_days: Vec<String>,
    /// Icon identifier
    pub icon: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

impl WorkoutPlan {
    /// Build a fresh record from creation fields.
    pub fn from_new(fields: NewWorkoutPlan) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: fields.name,
            week_days: fields.week_days,
            icon: fields.icon,
            created_at: now,
            updated_at: now,
        }
    }

    /// Week days the labels resolve to, Monday first, without duplicates.
    pub fn scheduled_weekdays(&self) -> Vec<Weekday> {
        resolve_weekdays(&self.week_days)
    }

    /// Whether the plan is scheduled on the given day.
    pub fn is_scheduled_on(&self, day: Weekday) -> bool {
        self.scheduled_weekdays().contains(&day)
    }
}

/// Fields for creating a workout plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewWorkoutPlan {
    pub name: String,
    #[serde(default)]
    pub week_days: Vec<String>,
    #[serde(default)]
    pub icon: String,
}

/// Partial workout plan update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkoutPlanUpdate {
    pub name: Option<String>,
    pub week_days: Option<Vec<String>>,
    pub icon: Option<String>,
}

impl WorkoutPlanUpdate {
    /// Apply the present fields to a plan.
    pub fn apply_to(self, plan: &mut WorkoutPlan) {
        if let Some(name) = self.name {
            plan.name = name;
        }
        if let Some(week_days) = self.week_days {
            plan.week_days = week_days;
        }
        if let Some(icon) = self.icon {
            plan.icon = icon;
        }
        plan.updated_at = Utc::now();
    }
}

/// An exercise inside a workout plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    /// Unique identifier
    pub id: Uuid,
    /// Owning plan; fixed at creation
    pub plan_id: Uuid,
    /// Exercise name
    pub name: String,
    /// Target sets
    pub sets: u16,
    /// Target repetitions per set
    pub reps: u16,
    /// Free-text notes
    pub notes: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

impl Exercise {
    /// Build a fresh record owned by `plan_id`.
    pub fn from_new(plan_id: Uuid, fields: NewExercise) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            plan_id,
            name: fields.name,
            sets: fields.sets,
            reps: fields.reps,
            notes: fields.notes,
            created_at: now,
            updated_at: now,
        }
    }

    /// Total repetitions across all sets.
    pub fn total_reps(&self) -> u32 {
        u32::from(self.sets) * u32::from(self.reps)
    }
}

/// Fields for creating an exercise.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewExercise {
    pub name: String,
    pub sets: u16,
    pub reps: u16,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Partial exercise update. The owning plan cannot be changed;
/// `notes: Some(None)` clears the notes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExerciseUpdate {
    pub name: Option<String>,
    pub sets: Option<u16>,
    pub reps: Option<u16>,
    pub notes: Option<Option<String>>,
}

impl ExerciseUpdate {
    /// Apply the present fields to an exercise.
    pub fn apply_to(self, exercise: &mut Exercise) {
        if let Some(name) = self.name {
            exercise.name = name;
        }
        if let Some(sets) = self.sets {
            exercise.sets = sets;
        }
        if let Some(reps) = self.reps {
            exercise.reps = reps;
        }
        if let Some(notes) = self.notes {
            exercise.notes = notes;
        }
        exercise.updated_at = Utc::now();
    }
}
