//! Error types and recovery strategies for Shelfmark
//!
//! Errors fall into three severity tiers:
//! - **Recoverable**: the caller can retry or correct its input (locked database,
//!   invalid state transition, unknown sort field)
//! - **Degraded**: the operation failed but the session can continue (missing record)
//! - **Fatal**: the store itself is unusable (corrupted database, failed migration)
//!
//! Each error includes a recovery action to guide the presentation layer.

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Recovery actions that can be taken when an error occurs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Retry the operation with backoff (e.g., database briefly locked)
    RetryWithBackoff,
    /// Ask the user to correct the input and try again
    CorrectInput,
    /// Re-fetch the records; the on-screen view is stale
    Refresh,
    /// Attempt to repair the database and retry
    RepairDatabase,
    /// Restore from the most recent backup
    RestoreBackup,
    /// No automatic recovery - user intervention required
    UserIntervention,
}

impl fmt::Display for RecoveryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RetryWithBackoff => write!(f, "Run the command again shortly"),
            Self::CorrectInput => write!(f, "Correct the input and retry"),
            Self::Refresh => write!(f, "List the records again"),
            Self::RepairDatabase => write!(f, "Repair the database"),
            Self::RestoreBackup => write!(f, "Restore the database from a backup"),
            Self::UserIntervention => write!(f, "User intervention required"),
        }
    }
}

/// Error severity classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Error can be recovered from by retrying or correcting input
    Recoverable,
    /// Operation failed but the session can continue
    Degraded,
    /// Critical error requiring user action on the store
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

/// Main error type for Shelfmark storage and domain primitives
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

    /// Database is corrupted and needs repair
    #[error("Database corrupted: {details}")]
    DatabaseCorrupted { details: String },

    /// Database migration failed
    #[error("Migration failed: {version} - {reason}")]
    MigrationFailed { version: String, reason: String },

    /// Database is locked by another process
    #[error("Database locked: {operation}")]
    DatabaseLocked { operation: String },

    /// Record not found in database
    #[error("Record not found: {entity} with {identifier}")]
    RecordNotFound { entity: String, identifier: String },

    // ===== Domain Errors =====
    /// A state machine rejected an event
    #[error("Invalid transition for {entity} {identifier}: cannot {event} while {from}")]
    InvalidTransition {
        entity: String,
        identifier: String,
        from: String,
        event: String,
    },

    /// Sorting was requested on a field the entity does not expose
    #[error("Unknown sort field '{field}' for {entity} (valid: {valid})")]
    UnknownSortField {
        entity: String,
        field: String,
        valid: String,
    },

    // ===== File System Errors =====
    /// File not found
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Permission denied for file operation
    #[error("Permission denied: {operation} on {path}")]
    PermissionDenied { operation: String, path: PathBuf },

    /// General I/O error
    #[error("I/O error: {message}")]
    IoError {
        message: String,
        #[source]
        source: io::Error,
    },

    // ===== Generic Errors =====
    /// Generic internal error
    #[error("Internal error: {message}")]
    InternalError { message: String },

    /// Invalid argument provided
    #[error("Invalid argument: {argument} - {reason}")]
    InvalidArgument { argument: String, reason: String },
}

impl AppError {
    /// Returns the severity level of this error
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::DatabaseLocked { .. }
            | Self::InvalidTransition { .. }
            | Self::UnknownSortField { .. }
            | Self::InvalidArgument { .. } => ErrorSeverity::Recoverable,

            Self::DatabaseCorrupted { .. }
            | Self::MigrationFailed { .. }
            | Self::PermissionDenied { .. } => ErrorSeverity::Fatal,

            _ => ErrorSeverity::Degraded,
        }
    }

    /// Returns the recommended recovery action for this error
    pub fn recovery_action(&self) -> RecoveryAction {
        match self {
            Self::DatabaseError { .. } | Self::DatabaseLocked { .. } => {
                RecoveryAction::RetryWithBackoff
            }

            Self::InvalidTransition { .. }
            | Self::UnknownSortField { .. }
            | Self::InvalidArgument { .. } => RecoveryAction::CorrectInput,

            Self::RecordNotFound { .. } => RecoveryAction::Refresh,

            Self::DatabaseCorrupted { .. } => RecoveryAction::RepairDatabase,

            Self::MigrationFailed { .. } => RecoveryAction::RestoreBackup,

            _ => RecoveryAction::UserIntervention,
        }
    }

    /// Returns a user-friendly error message suitable for display
    pub fn user_message(&self) -> String {
        match self {
            Self::DatabaseError { .. } | Self::DatabaseLocked { .. } => {
                "The library database is temporarily unavailable. Please try again.".to_string()
            }
            Self::DatabaseCorrupted { .. } => {
                "The library database is damaged and needs repair.".to_string()
            }
            Self::MigrationFailed { .. } => {
                "Failed to update the library database. Restore it from a backup.".to_string()
            }
            Self::RecordNotFound { entity, .. } => {
                format!("The requested {} was not found.", entity.to_lowercase())
            }
            Self::InvalidTransition { entity, event, from, .. } => {
                format!("Cannot {} this {} while it is {}.", event, entity.to_lowercase(), from)
            }
            Self::UnknownSortField { valid, .. } => {
                format!("That column cannot be sorted. Choose one of: {}.", valid)
            }
            Self::FileNotFound { .. } => {
                "The file was not found. It may have been moved or deleted.".to_string()
            }
            Self::PermissionDenied { .. } => {
                "Permission denied. Check the access rights of the library files.".to_string()
            }
            Self::IoError { .. } => "A file operation failed. Please try again.".to_string(),
            Self::InternalError { .. } => {
                "An unexpected error occurred. Please try again.".to_string()
            }
            Self::InvalidArgument { .. } => "Invalid input provided.".to_string(),
        }
    }

    /// Returns true if this error should be logged at ERROR level
    pub fn is_critical(&self) -> bool {
        self.severity() == ErrorSeverity::Fatal
    }

    /// Returns true if this error can be automatically retried
    pub fn is_retryable(&self) -> bool {
        self.recovery_action() == RecoveryAction::RetryWithBackoff
    }

    /// Helper to create a database error from any error type
    ///
    /// SQLite reports a busy database as "database is locked"; those become
    /// `DatabaseLocked` so callers can tell them apart from real failures.
    pub fn database<E: std::error::Error + Send + Sync + 'static>(
        message: impl Into<String>,
        source: E,
    ) -> Self {
        if source.to_string().contains("database is locked") {
            return Self::DatabaseLocked {
                operation: message.into(),
            };
        }

        Self::DatabaseError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Helper to create a not-found error
    pub fn not_found(entity: impl Into<String>, identifier: impl ToString) -> Self {
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
        match err.kind() {
            io::ErrorKind::NotFound => Self::FileNotFound {
                path: PathBuf::from("unknown"),
            },
            io::ErrorKind::PermissionDenied => Self::PermissionDenied {
                operation: "file operation".to_string(),
                path: PathBuf::from("unknown"),
            },
            _ => Self::IoError {
                message: err.to_string(),
                source: err,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_recovery_action_display() {
        assert_eq!(
            RecoveryAction::RetryWithBackoff.to_string(),
            "Run the command again shortly"
        );
        assert_eq!(RecoveryAction::Refresh.to_string(), "List the records again");
        assert_eq!(
            RecoveryAction::UserIntervention.to_string(),
            "User intervention required"
        );
    }

    #[test]
    fn test_error_severity_ordering() {
        assert!(ErrorSeverity::Recoverable < ErrorSeverity::Degraded);
        assert!(ErrorSeverity::Degraded < ErrorSeverity::Fatal);
    }

    #[test]
    fn test_database_error_is_retryable() {
        let err = AppError::database(
            "Query failed",
            io::Error::new(io::ErrorKind::Other, "busy"),
        );
        assert_eq!(err.recovery_action(), RecoveryAction::RetryWithBackoff);
        assert!(err.is_retryable());
        assert!(!err.is_critical());
        assert!(err.source().is_some());
    }

    #[test]
    fn test_busy_database_becomes_locked() {
        let err = AppError::database(
            "Failed to record lend",
            io::Error::new(io::ErrorKind::Other, "database is locked"),
        );
        assert!(matches!(err, AppError::DatabaseLocked { .. }));
        assert_eq!(err.severity(), ErrorSeverity::Recoverable);
        assert!(err.is_retryable());
        assert!(err.user_message().contains("temporarily unavailable"));
    }

    #[test]
    fn test_database_corrupted_severity() {
        let err = AppError::DatabaseCorrupted {
            details: "Invalid header".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Fatal);
        assert_eq!(err.recovery_action(), RecoveryAction::RepairDatabase);
        assert!(err.is_critical());
    }

    #[test]
    fn test_invalid_transition_message() {
        let err = AppError::InvalidTransition {
            entity: "BookCopy".to_string(),
            identifier: "3".to_string(),
            from: "on_loan".to_string(),
            event: "lend".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Recoverable);
        assert_eq!(err.recovery_action(), RecoveryAction::CorrectInput);
        assert!(err.to_string().contains("cannot lend while on_loan"));
        assert!(err.user_message().contains("bookcopy"));
    }

    #[test]
    fn test_not_found_helper() {
        let err = AppError::not_found("Book", 42);
        assert!(matches!(err, AppError::RecordNotFound { .. }));
        assert_eq!(err.recovery_action(), RecoveryAction::Refresh);
        assert_eq!(err.to_string(), "Record not found: Book with 42");
    }

    #[test]
    fn test_user_messages_hide_internals() {
        let err = AppError::DatabaseCorrupted {
            details: "SQLite header corrupted".to_string(),
        };
        let msg = err.user_message();
        assert!(!msg.contains("SQLite"));
        assert!(msg.contains("database"));
    }

    #[test]
    fn test_from_io_error() {
        let not_found: AppError = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(not_found, AppError::FileNotFound { .. }));

        let denied: AppError = io::Error::new(io::ErrorKind::PermissionDenied, "no").into();
        assert!(matches!(denied, AppError::PermissionDenied { .. }));

        let other: AppError = io::Error::new(io::ErrorKind::Other, "boom").into();
        assert!(matches!(other, AppError::IoError { .. }));
    }

    #[test]
    fn test_migration_failed_recovery() {
        let err = AppError::MigrationFailed {
            version: "2".to_string(),
            reason: "syntax error".to_string(),
        };
        assert_eq!(err.recovery_action(), RecoveryAction::RestoreBackup);
        assert!(err.is_critical());
    }
}
