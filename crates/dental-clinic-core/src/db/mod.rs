//! Database layer for the clinic.
//!
//! One `impl Database` block per table lives in its own file. Rows are
//! read into private `*Row` structs and converted with `TryFrom`, so
//! JSON columns and enum strings are decoded in one place per entity.

mod appointments;
mod doctors;
mod inventory;
mod invoices;
mod odontograms;
mod patients;
mod schema;
mod treatments;

pub use patients::PatientMatch;
pub use schema::*;

use rusqlite::Connection;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

use crate::models::ValidationError;
use crate::schedule::{ConflictPolicy, ScheduleError};

/// Database errors.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("{entity} {id} was modified by someone else")]
    StaleRevision { entity: &'static str, id: String },

    #[error("{entity} {id} still has {count} {dependents}")]
    InUse {
        entity: &'static str,
        id: String,
        dependents: &'static str,
        count: usize,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Schedule(#[from] ScheduleError),
}

impl DbError {
    pub(crate) fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity,
            id: id.into(),
        }
    }
}

pub type DbResult<T> = Result<T, DbError>;

/// Database connection wrapper.
pub struct Database {
    conn: Connection,
    conflict_policy: ConflictPolicy,
}

impl Database {
    /// Open database at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "opening clinic database");
        let conn = Connection::open(path)?;
        let db = Self::with_connection(conn);
        db.initialize()?;
        Ok(db)
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self::with_connection(conn);
        db.initialize()?;
        Ok(db)
    }

    fn with_connection(conn: Connection) -> Self {
        Self {
            conn,
            conflict_policy: ConflictPolicy::default(),
        }
    }

    /// Initialize schema.
    fn initialize(&self) -> DbResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        debug!("schema initialized");
        Ok(())
    }

    /// Set how overlapping appointments are handled on write.
    pub fn set_conflict_policy(&mut self, policy: ConflictPolicy) {
        self.conflict_policy = policy;
    }

    pub fn conflict_policy(&self) -> ConflictPolicy {
        self.conflict_policy
    }

    /// Get raw connection (for advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Begin a transaction.
    pub fn transaction(&mut self) -> DbResult<rusqlite::Transaction<'_>> {
        Ok(self.conn.transaction()?)
    }
}

/// Decode a JSON column, naming the column on failure.
pub(crate) fn from_json<T: serde::de::DeserializeOwned>(column: &str, raw: &str) -> DbResult<T> {
    serde_json::from_str(raw).map_err(|e| {
        DbError::Constraint(format!("column '{}' holds invalid JSON: {}", column, e))
    })
}
