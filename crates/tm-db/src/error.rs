//! Error types for tm-db

use thiserror::Error;

/// Database operation errors
#[derive(Error, Debug)]
pub enum DbError {
    /// Connection error (D001)
    #[error("[D001] Database connection failed: {0}")]
    ConnectionError(String),

    /// Query execution error (D002)
    #[error("[D002] SQL execution failed: {0}")]
    ExecutionError(String),

    /// Constraint violation, e.g. duplicate primary key (D003)
    #[error("[D003] Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Transaction control error (D004)
    #[error("[D004] Transaction {operation} failed: {message}")]
    TransactionError { operation: String, message: String },

    /// Mutex poisoned (D005)
    #[error("[D005] Database mutex poisoned: {0}")]
    MutexPoisoned(String),
}

/// Result type alias for DbError
pub type DbResult<T> = Result<T, DbError>;

impl DbError {
    /// Build a [`DbError::TransactionError`] for `BEGIN`, `COMMIT` or `ROLLBACK`.
    pub fn transaction(operation: &str, err: impl std::fmt::Display) -> Self {
        DbError::TransactionError {
            operation: operation.to_string(),
            message: err.to_string(),
        }
    }
}

impl From<duckdb::Error> for DbError {
    fn from(err: duckdb::Error) -> Self {
        // duckdb::Error does not expose structured variants for constraint
        // failures, so classify by message.
        let msg = err.to_string();
        if msg.contains("Constraint Error")
            || msg.contains("violates primary key constraint")
            || msg.contains("Duplicate key")
        {
            DbError::ConstraintViolation(msg)
        } else {
            DbError::ExecutionError(msg)
        }
    }
}
