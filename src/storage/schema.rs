//! Database schema definitions for GYManager.

/// Current schema version.
pub const CURRENT_VERSION: i32 = 1;

/// Schema version tracking table.
pub const SCHEMA_VERSION_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
);
"#;

/// SQL schema for creating all record tables.
///
/// Exercises reference their plan with a deferred foreign key so that a
/// pending change set is only checked when it is saved.
pub const SCHEMA: &str = r#"
-- Body-measurement profile
CREATE TABLE IF NOT EXISTS profiles (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    age INTEGER NOT NULL DEFAULT 0 CHECK (age >= 0),
    gender TEXT NOT NULL DEFAULT '',
    weight_kg REAL NOT NULL DEFAULT 0,
    height_cm REAL NOT NULL DEFAULT 0,
    arm_left REAL,
    arm_right REAL,
    thigh_left REAL,
    thigh_right REAL,
    calf_left REAL,
    calf_right REAL,
    shoulder REAL,
    abdomen REAL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Workout plans
CREATE TABLE IF NOT EXISTS workout_plans (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    week_days_json TEXT NOT NULL DEFAULT '[]',
    icon TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Exercises, owned by exactly one plan
CREATE TABLE IF NOT EXISTS exercises (
    id TEXT PRIMARY KEY,
    plan_id TEXT NOT NULL
        REFERENCES workout_plans(id) ON DELETE CASCADE DEFERRABLE INITIALLY DEFERRED,
    name TEXT NOT NULL,
    sets INTEGER NOT NULL DEFAULT 0 CHECK (sets >= 0),
    reps INTEGER NOT NULL DEFAULT 0 CHECK (reps >= 0),
    notes TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_exercises_plan_id ON exercises(plan_id);
"#;
