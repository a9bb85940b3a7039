//! Error types for the database client

use thiserror::Error;

/// Errors that can occur when working with the database client
#[derive(Debug, Error)]
pub enum DbError {
    /// Error from SQLx
    #[error("Database error: {0}")]
    SqlxError(#[from] sqlx::Error),

    /// Error with the database configuration
    #[error("Database configuration error: {0}")]
    ConfigError(String),

    /// Error with database URL parsing
    #[error("Database URL error: {0}")]
    UrlError(String),

    /// Error with database pool creation
    #[error("Database pool error: {0}")]
    PoolError(String),

    /// Error with database query
    #[error("Database query error: {0}")]
    QueryError(String),

    /// Error with database transaction
    #[error("Database transaction error: {0}")]
    TransactionError(String),

    /// A unique constraint rejected the write
    #[error("Duplicate record: {0}")]
    Conflict(String),

    /// A stored value could not be mapped back into a model
    #[error("Invalid stored value: {0}")]
    MappingError(String),
}

/// Whether the error is a unique or primary key violation reported by the driver.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation())
}

impl From<DbError> for clinic_common::ClinicError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Conflict(msg) => clinic_common::ClinicError::ConflictError(msg),
            DbError::ConfigError(msg) | DbError::UrlError(msg) => {
                clinic_common::ClinicError::ConfigError(msg)
            }
            other => clinic_common::ClinicError::DatabaseError(other.to_string()),
        }
    }
}
