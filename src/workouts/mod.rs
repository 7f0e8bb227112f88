//! Workout plans and their exercises.

pub mod types;
pub mod weekdays;

pub use types::{
    Exercise, ExerciseUpdate, NewExercise, NewWorkoutPlan, WorkoutPlan, WorkoutPlanUpdate,
};
pub use weekdays::{parse_weekday_label, resolve_weekdays};
