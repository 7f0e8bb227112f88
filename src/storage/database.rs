//! Record store built on rusqlite.
//!
//! The store owns the only connection to the local database. Mutations go
//! into a pending change set (a deferred SQLite transaction opened by the
//! first write) and become durable on [`RecordStore::save`]. Reads use the
//! same connection, so pending writes are visible to every reader in the
//! process before they are saved.

use chrono::{DateTime, Utc};
use rusqlite::types::{Type, Value};
use rusqlite::{params_from_iter, Connection, Row};
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

use crate::storage::schema::{CURRENT_VERSION, SCHEMA, SCHEMA_VERSION_TABLE};

/// A persisted entity kind.
///
/// `COLUMNS[0]` must be `"id"`, and `values()` must line up with `COLUMNS`.
pub trait Record: Sized {
    /// Table holding records of this kind.
    const TABLE: &'static str;
    /// Column names, in the order used by `values` and `from_row`.
    const COLUMNS: &'static [&'static str];

    /// Primary key.
    fn id(&self) -> Uuid;

    /// Column values for insert/update.
    fn values(&self) -> Result<Vec<Value>, StoreError>;

    /// Decode a row selected with `COLUMNS`.
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

/// Predicate for generic fetches.
#[derive(Debug, Clone)]
pub enum Filter {
    /// Every record of the kind.
    All,
    /// Records whose column equals the value.
    Eq { column: &'static str, value: Value },
}

impl Filter {
    /// Match records whose `column` equals `value`.
    pub fn eq(column: &'static str, value: impl Into<Value>) -> Self {
        Filter::Eq {
            column,
            value: value.into(),
        }
    }

    fn clause(&self) -> (String, Vec<Value>) {
        match self {
            Filter::All => (String::new(), Vec::new()),
            Filter::Eq { column, value } => (format!(" WHERE {} = ?1", column), vec![value.clone()]),
        }
    }
}

/// Local record store.
pub struct RecordStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl RecordStore {
    /// Open or create a store at the given path.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::IoError(e.to_string()))?;
        }

        let conn =
            Connection::open(path).map_err(|e| StoreError::ConnectionFailed(e.to_string()))?;

        let store = Self {
            conn,
            path: Some(path.to_path_buf()),
        };
        store.initialize()?;

        tracing::info!(path = %path.display(), "Record store opened");
        Ok(store)
    }

    /// Open an in-memory store (for testing and previews).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StoreError::ConnectionFailed(e.to_string()))?;

        let store = Self { conn, path: None };
        store.initialize()?;

        Ok(store)
    }

    /// Location of the database file, `None` when in memory.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn initialize(&self) -> Result<(), StoreError> {
        self.conn
            .execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| StoreError::ConnectionFailed(e.to_string()))?;

        self.conn
            .execute_batch(SCHEMA_VERSION_TABLE)
            .map_err(|e| StoreError::MigrationFailed(e.to_string()))?;

        let current_version = self.schema_version()?;
        if current_version < CURRENT_VERSION {
            self.migrate(current_version)?;
        }

        Ok(())
    }

    /// Get the current schema version.
    fn schema_version(&self) -> Result<i32, StoreError> {
        self.conn
            .query_row(
                "SELECT COALESCE(MAX(version), 0) FROM schema_version",
                [],
                |row| row.get(0),
            )
            .map_err(|e| StoreError::MigrationFailed(e.to_string()))
    }

    fn migrate(&self, from_version: i32) -> Result<(), StoreError> {
        if from_version < 1 {
            self.conn
                .execute_batch(SCHEMA)
                .map_err(|e| StoreError::MigrationFailed(e.to_string()))?;

            self.conn
                .execute(
                    "INSERT INTO schema_version (version, applied_at) VALUES (?1, ?2)",
                    rusqlite::params![CURRENT_VERSION, Utc::now().to_rfc3339()],
                )
                .map_err(|e| StoreError::MigrationFailed(e.to_string()))?;

            tracing::info!("Record store migrated to version {}", CURRENT_VERSION);
        }

        Ok(())
    }

    // ========== Change Set ==========

    /// Whether there are mutations that have not been saved yet.
    pub fn has_changes(&self) -> bool {
        !self.conn.is_autocommit()
    }

    fn begin_if_needed(&self) -> Result<(), StoreError> {
        if self.conn.is_autocommit() {
            self.conn
                .execute_batch("BEGIN DEFERRED")
                .map_err(|e| StoreError::PersistenceFailed(e.to_string()))?;
        }
        Ok(())
    }

    /// Make every pending mutation durable.
    ///
    /// On failure the pending set is rolled back before the error is
    /// returned, so readers only ever see previously saved state.
    pub fn save(&self) -> Result<(), StoreError> {
        if !self.has_changes() {
            return Ok(());
        }

        match self.conn.execute_batch("COMMIT") {
            Ok(()) => {
                tracing::debug!("Record store saved");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Save failed, rolling back pending changes");
                self.rollback()?;
                Err(StoreError::PersistenceFailed(e.to_string()))
            }
        }
    }

    /// Discard every pending mutation.
    pub fn rollback(&self) -> Result<(), StoreError> {
        if !self.has_changes() {
            return Ok(());
        }

        self.conn
            .execute_batch("ROLLBACK")
            .map_err(|e| StoreError::PersistenceFailed(format!("Rollback failed: {}", e)))
    }

    /// Run a unit of work and save it.
    ///
    /// The store has a single change set, so this also commits whatever
    /// earlier bare `insert`/`update`/`delete` calls left pending. If the
    /// closure or the save fails, everything pending is rolled back,
    /// including those earlier unsaved mutations.
    pub fn write<T>(
        &self,
        work: impl FnOnce(&Self) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        match work(self) {
            Ok(value) => {
                self.save()?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback_err) = self.rollback() {
                    tracing::warn!(error = %rollback_err, "Failed to discard pending changes");
                }
                Err(e)
            }
        }
    }

    // ========== Mutating Primitives ==========

    /// Add a record to the pending change set.
    pub fn insert<R: Record>(&self, record: &R) -> Result<(), StoreError> {
        let values = record.values()?;
        let placeholders: Vec<String> = (1..=R::COLUMNS.len()).map(|i| format!("?{}", i)).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            R::TABLE,
            R::COLUMNS.join(", "),
            placeholders.join(", ")
        );

        self.begin_if_needed()?;
        self.conn
            .execute(&sql, params_from_iter(values))
            .map_err(|e| StoreError::PersistenceFailed(e.to_string()))?;

        Ok(())
    }

    /// Overwrite a record in the pending change set.
    ///
    /// Returns `false` when no record has the given id.
    pub fn update<R: Record>(&self, record: &R) -> Result<bool, StoreError> {
        let values = record.values()?;
        let assignments: Vec<String> = R::COLUMNS
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, column)| format!("{} = ?{}", column, i + 1))
            .collect();
        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?1",
            R::TABLE,
            assignments.join(", ")
        );

        self.begin_if_needed()?;
        let rows_affected = self
            .conn
            .execute(&sql, params_from_iter(values))
            .map_err(|e| StoreError::PersistenceFailed(e.to_string()))?;

        Ok(rows_affected > 0)
    }

    /// Mark a record for removal; it is gone once the change set is saved.
    ///
    /// Returns `false` when no record has the given id.
    pub fn delete<R: Record>(&self, id: &Uuid) -> Result<bool, StoreError> {
        let sql = format!("DELETE FROM {} WHERE id = ?1", R::TABLE);

        self.begin_if_needed()?;
        let rows_affected = self
            .conn
            .execute(&sql, [id.to_string()])
            .map_err(|e| StoreError::PersistenceFailed(e.to_string()))?;

        Ok(rows_affected > 0)
    }

    // ========== Reads ==========

    /// Fetch every record matching the filter, oldest first.
    pub fn fetch<R: Record>(&self, filter: &Filter) -> Result<Vec<R>, StoreError> {
        let (clause, params) = filter.clause();
        let sql = format!(
            "SELECT {} FROM {}{} ORDER BY created_at ASC, rowid ASC",
            R::COLUMNS.join(", "),
            R::TABLE,
            clause
        );

        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(|e| StoreError::LookupFailed(e.to_string()))?;

        let rows = stmt
            .query_map(params_from_iter(params), |row| R::from_row(row))
            .map_err(|e| StoreError::LookupFailed(e.to_string()))?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row.map_err(|e| StoreError::LookupFailed(e.to_string()))?);
        }

        Ok(records)
    }

    /// Fetch the first record matching the filter.
    pub fn first<R: Record>(&self, filter: &Filter) -> Result<Option<R>, StoreError> {
        Ok(self.fetch::<R>(filter)?.into_iter().next())
    }

    /// Fetch a record by id; `None` if it does not exist (any more).
    pub fn get<R: Record>(&self, id: &Uuid) -> Result<Option<R>, StoreError> {
        self.first(&Filter::eq("id", id.to_string()))
    }

    /// Count records matching the filter.
    pub fn count<R: Record>(&self, filter: &Filter) -> Result<usize, StoreError> {
        let (clause, params) = filter.clause();
        let sql = format!("SELECT COUNT(*) FROM {}{}", R::TABLE, clause);

        let count: i64 = self
            .conn
            .query_row(&sql, params_from_iter(params), |row| row.get(0))
            .map_err(|e| StoreError::LookupFailed(e.to_string()))?;

        Ok(count as usize)
    }
}

impl Drop for RecordStore {
    fn drop(&mut self) {
        if self.has_changes() {
            tracing::warn!("Record store closed with unsaved changes; they are discarded");
        }
    }
}

// ========== Row Helpers ==========

/// Read a UUID stored as text.
pub(crate) fn uuid_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let text: String = row.get(idx)?;
    Uuid::parse_str(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Read an RFC 3339 timestamp stored as text.
pub(crate) fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Optional float column value.
pub(crate) fn optional_real(value: Option<f64>) -> Value {
    value.map(Value::Real).unwrap_or(Value::Null)
}

/// Optional text column value.
pub(crate) fn optional_text(value: Option<&str>) -> Value {
    value
        .map(|s| Value::Text(s.to_string()))
        .unwrap_or(Value::Null)
}

/// Record store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Lookup failed: {0}")]
    LookupFailed(String),

    #[error("Persistence failed: {0}")]
    PersistenceFailed(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Parent workout plan {0} does not exist")]
    MissingParent(Uuid),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}
