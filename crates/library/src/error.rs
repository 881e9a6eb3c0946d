// FILE: crates/library/src/error.rs

use shelfmark_core::{AppError, CopyState};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    #[error("{entity} already exists: {key}")]
    AlreadyExists { entity: &'static str, key: String },

    #[error("The copy is not available: copy {copy_id} is {state}")]
    CopyUnavailable { copy_id: i64, state: CopyState },

    #[error("Copy in use: copy {copy_id} is {state}")]
    CopyInUse { copy_id: i64, state: CopyState },

    #[error("Copies in use: {count} copy(ies) of {entity} {id} are lent out")]
    CopiesInUse {
        entity: &'static str,
        id: i64,
        count: i64,
    },

    #[error("Member {member_id} still has {open} open loan(s)")]
    MemberHasOpenLoans { member_id: i64, open: i64 },

    #[error("Loan {loan_id} was already returned")]
    LoanAlreadyReturned { loan_id: i64 },

    #[error("Loan {loan_id} is still open")]
    LoanStillOpen { loan_id: i64 },

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },

    #[error("Storage error: {0}")]
    Storage(#[from] AppError),
}

/// Coarse classification of a failed operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Input rejected before anything was stored
    Validation,
    /// The records are in a state that forbids the operation
    Conflict,
    NotFound,
    Storage,
}

impl LibraryError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Validation { .. } | Self::AlreadyExists { .. } => FailureKind::Validation,
            Self::CopyUnavailable { .. }
            | Self::CopyInUse { .. }
            | Self::CopiesInUse { .. }
            | Self::MemberHasOpenLoans { .. }
            | Self::LoanAlreadyReturned { .. }
            | Self::LoanStillOpen { .. } => FailureKind::Conflict,
            Self::NotFound { .. } => FailureKind::NotFound,
            Self::Storage(_) => FailureKind::Storage,
        }
    }

    /// Builds a validation error from the messages a `Validator` returned
    pub fn validation(field: impl Into<String>, messages: Vec<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: messages.join("; "),
        }
    }

    /// Maps a failed sort lookup to a validation error
    pub fn from_sort(err: AppError) -> Self {
        match err {
            AppError::UnknownSortField { entity, field, valid } => Self::Validation {
                field: "sort".to_string(),
                message: format!(
                    "unknown sort field '{}' for {} (valid: {})",
                    field, entity, valid
                ),
            },
            other => Self::Storage(other),
        }
    }
}

// Both type aliases for convenience
pub type Result<T> = std::result::Result<T, LibraryError>;
pub type LibraryResult<T> = std::result::Result<T, LibraryError>;
