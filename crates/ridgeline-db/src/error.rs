//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                │
//! │                                                                     │
//! │  SQLite Error (sqlx::Error)                                         │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  DbError (this module) ← adds context and categorization            │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  Presentation layer decides how to surface it                       │
//! │                                                                     │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Four families, mirroring the workflow's failure semantics: not-found,
//! conflicts (duplicate / in-use), domain rejections (state conflict,
//! insufficient stock, validation, all wrapped in [`CoreError`]), and
//! infrastructure failures that roll back the enclosing transaction.

use thiserror::Error;

use ridgeline_core::CoreError;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in the database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },

    /// Unique constraint violation (duplicate name, login, ...).
    ///
    /// Raised by the pre-write existence checks, or mapped from the engine's
    /// UNIQUE violation when a concurrent write slips between check and
    /// insert.
    #[error("duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// The entity is referenced by other records and cannot be deleted.
    ///
    /// ## When This Occurs
    /// - deleting an article that appears in any rental, past or present
    #[error("{entity} {id} is referenced by existing rentals")]
    InUse { entity: &'static str, id: i64 },

    /// Foreign key constraint violation.
    #[error("foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Business rule rejection (state conflict, insufficient stock,
    /// validation). No partial write is left behind.
    #[error(transparent)]
    Domain(#[from] CoreError),

    /// Database connection failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and id.
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        DbError::NotFound { entity, id }
    }

    /// Creates a UniqueViolation error.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::Internal (repos use fetch_optional)
/// sqlx::Error::Database       → analyze message for constraint type
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // SQLite constraint messages:
                // "UNIQUE constraint failed: <table>.<column>"
                // "FOREIGN KEY constraint failed"
                if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field,
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

impl From<bcrypt::BcryptError> for DbError {
    fn from(err: bcrypt::BcryptError) -> Self {
        DbError::Internal(format!("credential hashing failed: {err}"))
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;
