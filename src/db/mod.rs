pub mod repository;
pub mod sqlite;

pub use repository::*;
pub use sqlite::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },

    #[error("Migration failed at version {version}: {reason}")]
    MigrationFailed { version: i64, reason: String },

    #[error("Database directory error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Constraint violated: {0}")]
    ConstraintViolation(String),
}

impl DatabaseError {
    /// Maps SQLite UNIQUE / PRIMARY KEY failures to `ConstraintViolation`.
    pub(crate) fn from_insert(err: rusqlite::Error, what: &str) -> Self {
        let constraint_hit = matches!(
            &err,
            rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
        );
        if constraint_hit {
            DatabaseError::ConstraintViolation(format!("{what}: {err}"))
        } else {
            DatabaseError::Sqlite(err)
        }
    }
}
