//! Domain types for Shelfmark
//!
//! This module contains all domain models organized by responsibility:
//! - `author`: Authors
//! - `book`: Book titles
//! - `copy`: Physical copies and the availability state machine
//! - `member`: Library members
//! - `loan`: Loans and late-return notices
//! - `common`: Ids, timestamps and the `Validator` trait

mod author;
mod book;
mod common;
mod copy;
mod loan;
mod member;

// Re-export all public types
pub use author::{Author, NewAuthor};
pub use book::{Book, NewBook};
pub use common::{AuthorId, BookId, CopyId, LoanId, MemberId, Timestamp, Validator, DAY_MILLIS};
pub use copy::{BookCopy, CopyEvent, CopyState, NewBookCopy};
pub use loan::{Loan, NewLoan, OverdueNotice, DEFAULT_FEE_PER_DAY, DEFAULT_LOAN_PERIOD_DAYS};
pub use member::{Member, NewMember};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_types_are_exported() {
        let author = NewAuthor::new("A. Orwell").with_id(AuthorId::new(1));
        let book = NewBook::new(author.id, "1984").with_id(BookId::new(1));
        let copy = NewBookCopy::new(book.id, 10).with_id(CopyId::new(1));
        let member = NewMember::new("Eric", "123").with_id(MemberId::new(1));
        let loan = NewLoan::starting_at(copy.id, member.id, Timestamp::now(), 15)
            .with_id(LoanId::new(1));

        assert!(author.is_valid());
        assert!(book.is_valid());
        assert!(copy.is_valid());
        assert!(member.is_valid());
        assert!(loan.is_valid());
    }
}
