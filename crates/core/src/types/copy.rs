//! Physical book copies and their availability state machine
//!
//! A copy moves between three states:
//!
//! ```text
//!              Lend                   DueDatePassed
//!  Available ---------> OnLoan ------------------> Overdue
//!      ^                  |                           |
//!      +----- Return -----+---------- Return ---------+
//! ```
//!
//! Any other (state, event) pair is rejected with `AppError::InvalidTransition`
//! and leaves the copy untouched.

use crate::error::AppError;
use crate::types::{BookId, CopyId, Validator};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Availability of a physical copy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CopyState {
    /// On the shelf; also the state a copy re-enters when returned
    #[default]
    Available,
    /// Lent to a member
    OnLoan,
    /// Lent to a member and past its due date
    Overdue,
}

/// Events that drive copy state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CopyEvent {
    /// Lend the copy to a member
    Lend,
    /// The member brought the copy back
    Return,
    /// The open loan's due date has passed
    DueDatePassed,
}

impl CopyState {
    /// Every state, in storage order
    pub const ALL: [CopyState; 3] = [Self::Available, Self::OnLoan, Self::Overdue];

    /// Returns true if the copy can be lent
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available)
    }

    /// Stable name used for storage and display
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::OnLoan => "on_loan",
            Self::Overdue => "overdue",
        }
    }

    /// Computes the state reached by applying `event`
    pub fn next(self, event: CopyEvent) -> Option<CopyState> {
        match (self, event) {
            (Self::Available, CopyEvent::Lend) => Some(Self::OnLoan),
            (Self::OnLoan | Self::Overdue, CopyEvent::Return) => Some(Self::Available),
            (Self::OnLoan, CopyEvent::DueDatePassed) => Some(Self::Overdue),
            _ => None,
        }
    }
}

impl fmt::Display for CopyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CopyState {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| AppError::InvalidArgument {
                argument: "copy state".to_string(),
                reason: format!("unknown state '{}'", s),
            })
    }
}

impl fmt::Display for CopyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lend => write!(f, "lend"),
            Self::Return => write!(f, "return"),
            Self::DueDatePassed => write!(f, "due date passed"),
        }
    }
}

/// A persisted physical copy of a book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookCopy {
    pub id: CopyId,
    pub book_id: BookId,
    /// Wear level; decreases as the copy is lent out, never below zero
    pub condition: i32,
    pub state: CopyState,
}

impl BookCopy {
    /// Applies a state machine event, leaving the copy unchanged on failure
    pub fn apply(&mut self, event: CopyEvent) -> Result<CopyState, AppError> {
        let next = self
            .state
            .next(event)
            .ok_or_else(|| AppError::InvalidTransition {
                entity: "BookCopy".to_string(),
                identifier: self.id.to_string(),
                from: self.state.to_string(),
                event: event.to_string(),
            })?;
        self.state = next;
        Ok(next)
    }

    /// Marks the copy as lent
    pub fn lend(&mut self) -> Result<(), AppError> {
        self.apply(CopyEvent::Lend).map(|_| ())
    }

    /// Puts the copy back on the shelf and applies `wear` to its condition
    pub fn return_with_wear(&mut self, wear: i32) -> Result<(), AppError> {
        self.apply(CopyEvent::Return)?;
        self.condition = (self.condition - wear.max(0)).max(0);
        Ok(())
    }

    /// Flags a lent copy as overdue
    pub fn mark_overdue(&mut self) -> Result<(), AppError> {
        self.apply(CopyEvent::DueDatePassed).map(|_| ())
    }
}

impl fmt::Display for BookCopy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]-[{}] book {}", self.state, self.id, self.book_id)
    }
}

impl Validator for BookCopy {
    fn validate(&self) -> Result<(), Vec<String>> {
        validate_condition(self.condition)
    }
}

/// A copy that has not been stored yet; always starts `Available`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBookCopy {
    pub book_id: BookId,
    pub condition: i32,
}

impl NewBookCopy {
    pub fn new(book_id: BookId, condition: i32) -> Self {
        Self { book_id, condition }
    }

    /// Attaches the id assigned by the store
    pub fn with_id(self, id: CopyId) -> BookCopy {
        BookCopy {
            id,
            book_id: self.book_id,
            condition: self.condition,
            state: CopyState::Available,
        }
    }
}

impl Validator for NewBookCopy {
    fn validate(&self) -> Result<(), Vec<String>> {
        validate_condition(self.condition)
    }
}

fn validate_condition(condition: i32) -> Result<(), Vec<String>> {
    if condition < 0 {
        Err(vec!["Condition cannot be negative".to_string()])
    } else {
        Ok(())
    }
}
