//! Error types shared by every Bookshelf crate
//!
//! Errors fall into three severity tiers:
//! - **Recoverable**: the same call may succeed if retried (timeouts, locked database)
//! - **Degraded**: the operation failed but the last good snapshot stays usable
//! - **Fatal**: the library handle cannot be used any more (corrupted database)

use std::fmt;
use std::io;
use thiserror::Error;

/// Error severity classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Error can be automatically recovered from
    Recoverable,
    /// Feature degraded but app can continue
    Degraded,
    /// Critical error requiring restart or user action
    Fatal,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recoverable => write!(f, "Recoverable"),
            Self::Degraded => write!(f, "Degraded"),
            Self::Fatal => write!(f, "Fatal"),
        }
    }
}

/// Main error type for Bookshelf
#[derive(Error, Debug)]
pub enum AppError {
    // ===== Database Errors =====
    /// Database operation failed
    #[error("Database error: {message}")]
    DatabaseError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Database is locked by another process
    #[error("Database locked: {operation}")]
    DatabaseLocked { operation: String },

    /// Database migration failed
    #[error("Migration failed: {version} - {reason}")]
    MigrationFailed { version: String, reason: String },

    /// Record not found in database
    #[error("Record not found: {entity} with {identifier}")]
    RecordNotFound { entity: String, identifier: String },

    // ===== File System Errors =====
    /// General I/O error
    #[error("I/O error: {message}")]
    IoError {
        message: String,
        #[source]
        source: io::Error,
    },

    // ===== Generic Errors =====
    /// Invalid argument provided
    #[error("Invalid argument: {argument} - {reason}")]
    InvalidArgument { argument: String, reason: String },
}

impl AppError {
    /// Returns the severity level of this error
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::DatabaseLocked { .. } => ErrorSeverity::Recoverable,

            Self::MigrationFailed { .. } => ErrorSeverity::Fatal,

            _ => ErrorSeverity::Degraded,
        }
    }

    /// Returns true if this error can be automatically retried
    pub fn is_retryable(&self) -> bool {
        self.severity() == ErrorSeverity::Recoverable
    }

    /// Returns a user-friendly error message suitable for display in the UI
    pub fn user_message(&self) -> String {
        match self {
            Self::DatabaseError { .. } | Self::DatabaseLocked { .. } => {
                "The library database is temporarily unavailable. Please try again.".to_string()
            }
            Self::MigrationFailed { .. } => {
                "The library database could not be upgraded.".to_string()
            }
            Self::RecordNotFound { entity, .. } => format!("The requested {} was not found.", entity.to_lowercase()),
            Self::IoError { .. } => "A file operation failed. Please try again.".to_string(),
            Self::InvalidArgument { .. } => "Invalid input provided.".to_string(),
        }
    }

    /// Wraps a database failure; SQLite lock contention becomes `DatabaseLocked`
    pub fn database<E: std::error::Error + Send + Sync + 'static>(
        message: impl Into<String>,
        source: E,
    ) -> Self {
        let message = message.into();
        if source.to_string().contains("database is locked") {
            return Self::DatabaseLocked { operation: message };
        }
        Self::DatabaseError {
            message,
            source: Some(Box::new(source)),
        }
    }

    /// Helper to create a not-found error for an entity
    pub fn not_found(entity: impl Into<String>, identifier: impl fmt::Display) -> Self {
        Self::RecordNotFound {
            entity: entity.into(),
            identifier: identifier.to_string(),
        }
    }
}

/// Convenience type alias for Results using AppError
pub type Result<T> = std::result::Result<T, AppError>;

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        Self::IoError {
            message: err.to_string(),
            source: err,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_severity_ordering() {
        assert!(ErrorSeverity::Recoverable < ErrorSeverity::Degraded);
        assert!(ErrorSeverity::Degraded < ErrorSeverity::Fatal);
    }

    #[test]
    fn test_database_helper_keeps_source() {
        let io_err = io::Error::new(io::ErrorKind::Other, "disk on fire");
        let err = AppError::database("Failed to list books", io_err);

        assert_eq!(err.to_string(), "Database error: Failed to list books");
        assert!(err.source().is_some());
        assert_eq!(err.severity(), ErrorSeverity::Degraded);
    }

    #[test]
    fn test_locked_database_is_retryable() {
        let err = AppError::DatabaseLocked {
            operation: "update".to_string(),
        };
        assert!(err.is_retryable());
        assert!(!AppError::not_found("Book", "1").is_retryable());
    }

    #[test]
    fn test_lock_contention_is_classified() {
        let busy = io::Error::new(io::ErrorKind::Other, "error returned from database: database is locked");
        let err = AppError::database("Failed to update book", busy);
        assert!(matches!(err, AppError::DatabaseLocked { ref operation } if operation == "Failed to update book"));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_not_found_message() {
        let err = AppError::not_found("Author", "a-1");
        assert_eq!(err.to_string(), "Record not found: Author with a-1");
        assert_eq!(err.user_message(), "The requested author was not found.");
    }

    #[test]
    fn test_from_io_error() {
        let err: AppError = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, AppError::IoError { .. }));
    }
}
