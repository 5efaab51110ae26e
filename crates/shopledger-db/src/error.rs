//! # Store Errors
//!
//! Every repository call returns [`DbResult`]. SQLite failures are sorted
//! into the few cases callers act on differently.
//!
//! ```text
//! sqlx::Error ──► DbError ──► EngineError::Store
//!                   │
//!                   ├─ NotFound         → not found at the façade
//!                   ├─ UniqueViolation  → conflict
//!                   └─ everything else  → logged, generic store failure
//! ```
//!
//! A stock guard that refuses an update is not an error here: the guarded
//! statements return `None` and the engine decides what it means.

use thiserror::Error;

/// Store failure.
#[derive(Debug, Error)]
pub enum DbError {
    /// No row for the given id.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation (e.g. duplicate user email).
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Movement or service part referencing a missing product
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// CHECK constraint violation.
    ///
    /// ## When This Occurs
    /// - A write that would leave `products.stock` negative slipped past the
    ///   guarded update (the constraint is the last line)
    /// - Non-positive movement quantity
    #[error("Check constraint violation: {message}")]
    CheckViolation { message: String },

    /// Could not open the database file or the pool was closed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// SQLite rejected the statement for a non-constraint reason.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Transaction begin/commit failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Every connection stayed busy past the acquire timeout.
    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Wraps a begin/commit failure.
    pub fn transaction(err: sqlx::Error) -> Self {
        DbError::TransactionFailed(err.to_string())
    }
}

/// Sorts a SQLite error message by the constraint it names.
///
/// SQLite phrases these as `UNIQUE constraint failed: <table>.<column>`,
/// `FOREIGN KEY constraint failed` and `CHECK constraint failed: <expr>`.
fn from_sqlite_message(msg: &str) -> DbError {
    if let Some(column) = msg.strip_prefix("UNIQUE constraint failed: ") {
        DbError::UniqueViolation {
            field: column.to_string(),
            value: "unknown".to_string(),
        }
    } else if msg.contains("FOREIGN KEY constraint failed") {
        DbError::ForeignKeyViolation {
            message: msg.to_string(),
        }
    } else if msg.contains("CHECK constraint failed") {
        DbError::CheckViolation {
            message: msg.to_string(),
        }
    } else {
        DbError::QueryFailed(msg.to_string())
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("row", "unknown"),
            sqlx::Error::Database(db_err) => from_sqlite_message(db_err.message()),
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool is closed".to_string()),
            other => DbError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;
