use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// Broad error category, used by callers to decide between field-level and banner-level display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or out-of-range input
    Validation,
    /// Referenced record does not exist
    NotFound,
    /// Unique constraint violation
    Conflict,
    /// Failure while updating balances inside a transaction
    Reconciliation,
    /// Configuration problem
    Config,
    /// Any other database failure
    Database,
    /// I/O failure
    Io,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Reconciliation failed: {message}")]
    Reconciliation { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Database error: {0}")]
    Database(DbErr),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Wraps a failure raised while rewriting order balances.
    pub fn reconciliation(err: impl std::fmt::Display) -> Self {
        Self::Reconciliation {
            message: err.to_string(),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Reconciliation { .. } => ErrorKind::Reconciliation,
            Self::Config { .. } => ErrorKind::Config,
            Self::Database(_) => ErrorKind::Database,
            Self::Io(_) => ErrorKind::Io,
        }
    }
}

impl From<DbErr> for Error {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(message)) => Self::Conflict { message },
            _ => Self::Database(err),
        }
    }
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
