pub mod error;
pub mod sort;
pub mod types;

// Re-export commonly used types
pub use error::{AppError, ErrorSeverity, RecoveryAction, Result};
pub use sort::{sort_by_field, SortFields, SortKey, SortOrder};
pub use types::{
    Author, AuthorId, Book, BookCopy, BookId, CopyEvent, CopyId, CopyState, Loan, LoanId, Member,
    MemberId, NewAuthor, NewBook, NewBookCopy, NewLoan, NewMember, OverdueNotice, Timestamp,
    Validator, DAY_MILLIS, DEFAULT_FEE_PER_DAY, DEFAULT_LOAN_PERIOD_DAYS,
};
