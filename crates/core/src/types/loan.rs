//! Loan domain model

use crate::error::AppError;
use crate::types::{CopyId, LoanId, MemberId, Timestamp, Validator};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default number of days a member may keep a copy
pub const DEFAULT_LOAN_PERIOD_DAYS: u32 = 15;

/// Default late fee charged per whole day past the due date
pub const DEFAULT_FEE_PER_DAY: i64 = 10;

/// A persisted loan of one copy to one member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    pub id: LoanId,
    pub copy_id: CopyId,
    pub member_id: MemberId,
    pub loaned_at: Timestamp,
    pub due_at: Timestamp,
    /// Set exactly once, when the copy comes back
    pub returned_at: Option<Timestamp>,
}

impl Loan {
    /// Returns true while the copy has not been returned
    pub fn is_open(&self) -> bool {
        self.returned_at.is_none()
    }

    /// Returns true if the loan is open and its due date has passed at `now`
    pub fn is_overdue(&self, now: Timestamp) -> bool {
        self.is_open() && now > self.due_at
    }

    /// Closes the loan; fails if it was already closed
    pub fn close(&mut self, at: Timestamp) -> Result<(), AppError> {
        if let Some(returned_at) = self.returned_at {
            return Err(AppError::InvalidTransition {
                entity: "Loan".to_string(),
                identifier: self.id.to_string(),
                from: format!("returned at {}", returned_at),
                event: "return".to_string(),
            });
        }
        self.returned_at = Some(at);
        Ok(())
    }
}

impl fmt::Display for Loan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] copy {} to member {}",
            self.id, self.copy_id, self.member_id
        )
    }
}

impl Validator for Loan {
    fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = validate_period(self.loaned_at, self.due_at);

        if let Some(returned_at) = self.returned_at {
            if returned_at < self.loaned_at {
                errors.push("Return time cannot precede loan time".to_string());
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// A loan that has not been stored yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLoan {
    pub copy_id: CopyId,
    pub member_id: MemberId,
    pub loaned_at: Timestamp,
    pub due_at: Timestamp,
}

impl NewLoan {
    /// Opens a loan at `now` that falls due `period_days` later
    pub fn starting_at(
        copy_id: CopyId,
        member_id: MemberId,
        now: Timestamp,
        period_days: u32,
    ) -> Self {
        Self {
            copy_id,
            member_id,
            loaned_at: now,
            due_at: now.plus_days(period_days),
        }
    }

    /// Attaches the id assigned by the store
    pub fn with_id(self, id: LoanId) -> Loan {
        Loan {
            id,
            copy_id: self.copy_id,
            member_id: self.member_id,
            loaned_at: self.loaned_at,
            due_at: self.due_at,
            returned_at: None,
        }
    }
}

impl Validator for NewLoan {
    fn validate(&self) -> Result<(), Vec<String>> {
        let errors = validate_period(self.loaned_at, self.due_at);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn validate_period(loaned_at: Timestamp, due_at: Timestamp) -> Vec<String> {
    if due_at < loaned_at {
        vec!["Due date cannot precede loan time".to_string()]
    } else {
        Vec::new()
    }
}

/// Informational late-return notice; the fee is reported, never collected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverdueNotice {
    /// Whole days past the due date, truncated
    pub days_late: i64,
    pub fee: i64,
}

impl OverdueNotice {
    /// Builds a notice if `returned_at` is after the loan's due date
    pub fn assess(loan: &Loan, returned_at: Timestamp, fee_per_day: i64) -> Option<Self> {
        if returned_at <= loan.due_at {
            return None;
        }
        let days_late = returned_at.whole_days_since(loan.due_at);
        Some(Self {
            days_late,
            fee: days_late * fee_per_day,
        })
    }
}

impl fmt::Display for OverdueNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "returned {} day(s) late, fee due: {}",
            self.days_late, self.fee
        )
    }
}
