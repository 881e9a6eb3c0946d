//! Per-entity repositories over the query layer
//!
//! Each repository wraps a pool handle and exposes the uniform
//! add/all/find/edit/remove contract plus the lookups its entity needs.
//! Every call is durable when it returns.

use crate::queries::{authors, books, copies, loans, members};
use crate::DbPool;
use async_trait::async_trait;
use shelfmark_core::{
    AppError, Author, AuthorId, Book, BookCopy, BookId, CopyId, CopyState, Loan, LoanId, Member,
    MemberId, NewAuthor, NewBook, NewBookCopy, NewLoan, NewMember, Timestamp,
};

/// Uniform persistence contract shared by all entity repositories
#[async_trait]
pub trait Repository: Send + Sync {
    type Entity: Send + Sync;
    type Draft: Send + Sync;
    type Id: Send + Copy;

    /// Stores a new record and returns it with its assigned id
    async fn add(&self, draft: &Self::Draft) -> Result<Self::Entity, AppError>;

    /// Returns every record in id order
    async fn all(&self) -> Result<Vec<Self::Entity>, AppError>;

    /// Looks up one record; absence is `Ok(None)`
    async fn find(&self, id: Self::Id) -> Result<Option<Self::Entity>, AppError>;

    /// Overwrites a stored record
    async fn edit(&self, entity: &Self::Entity) -> Result<(), AppError>;

    /// Deletes a record and everything that cascades from it
    async fn remove(&self, id: Self::Id) -> Result<(), AppError>;
}

/// Declares a repository struct holding a pool handle
macro_rules! repository {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name {
            pool: DbPool,
        }

        impl $name {
            pub fn new(pool: DbPool) -> Self {
                Self { pool }
            }
        }
    };
}

repository!(
    /// Storage for authors
    AuthorRepository
);
repository!(
    /// Storage for books
    BookRepository
);
repository!(
    /// Storage for physical copies
    CopyRepository
);
repository!(
    /// Storage for members
    MemberRepository
);
repository!(
    /// Storage for loans
    LoanRepository
);

#[async_trait]
impl Repository for AuthorRepository {
    type Entity = Author;
    type Draft = NewAuthor;
    type Id = AuthorId;

    async fn add(&self, draft: &NewAuthor) -> Result<Author, AppError> {
        authors::create_author(&self.pool, draft).await
    }

    async fn all(&self) -> Result<Vec<Author>, AppError> {
        authors::list_authors(&self.pool).await
    }

    async fn find(&self, id: AuthorId) -> Result<Option<Author>, AppError> {
        authors::find_author(&self.pool, id).await
    }

    async fn edit(&self, entity: &Author) -> Result<(), AppError> {
        authors::update_author(&self.pool, entity).await
    }

    async fn remove(&self, id: AuthorId) -> Result<(), AppError> {
        authors::delete_author(&self.pool, id).await
    }
}

impl AuthorRepository {
    pub async fn by_name(&self, name: &str) -> Result<Vec<Author>, AppError> {
        authors::find_authors_by_name(&self.pool, name).await
    }
}

#[async_trait]
impl Repository for BookRepository {
    type Entity = Book;
    type Draft = NewBook;
    type Id = BookId;

    async fn add(&self, draft: &NewBook) -> Result<Book, AppError> {
        books::create_book(&self.pool, draft).await
    }

    async fn all(&self) -> Result<Vec<Book>, AppError> {
        books::list_books(&self.pool).await
    }

    async fn find(&self, id: BookId) -> Result<Option<Book>, AppError> {
        books::find_book(&self.pool, id).await
    }

    async fn edit(&self, entity: &Book) -> Result<(), AppError> {
        books::update_book(&self.pool, entity).await
    }

    async fn remove(&self, id: BookId) -> Result<(), AppError> {
        books::delete_book(&self.pool, id).await
    }
}

impl BookRepository {
    pub async fn by_author(&self, author_id: AuthorId) -> Result<Vec<Book>, AppError> {
        books::get_books_by_author(&self.pool, author_id).await
    }

    pub async fn search_title(&self, fragment: &str) -> Result<Vec<Book>, AppError> {
        books::search_books_by_title(&self.pool, fragment).await
    }

    /// Books with at least one copy on the shelf
    pub async fn available(&self) -> Result<Vec<Book>, AppError> {
        books::get_available_books(&self.pool).await
    }
}

#[async_trait]
impl Repository for CopyRepository {
    type Entity = BookCopy;
    type Draft = NewBookCopy;
    type Id = CopyId;

    async fn add(&self, draft: &NewBookCopy) -> Result<BookCopy, AppError> {
        copies::create_copy(&self.pool, draft).await
    }

    async fn all(&self) -> Result<Vec<BookCopy>, AppError> {
        copies::list_copies(&self.pool).await
    }

    async fn find(&self, id: CopyId) -> Result<Option<BookCopy>, AppError> {
        copies::find_copy(&self.pool, id).await
    }

    async fn edit(&self, entity: &BookCopy) -> Result<(), AppError> {
        copies::update_copy(&self.pool, entity).await
    }

    async fn remove(&self, id: CopyId) -> Result<(), AppError> {
        copies::delete_copy(&self.pool, id).await
    }
}

impl CopyRepository {
    pub async fn by_book(&self, book_id: BookId) -> Result<Vec<BookCopy>, AppError> {
        copies::get_copies_by_book(&self.pool, book_id).await
    }

    pub async fn by_state(&self, state: CopyState) -> Result<Vec<BookCopy>, AppError> {
        copies::get_copies_by_state(&self.pool, state).await
    }

    /// Copies a member holds through open loans
    pub async fn held_by(&self, member_id: MemberId) -> Result<Vec<BookCopy>, AppError> {
        copies::get_copies_held_by_member(&self.pool, member_id).await
    }

    pub async fn in_use_for_book(&self, book_id: BookId) -> Result<i64, AppError> {
        copies::count_copies_in_use_for_book(&self.pool, book_id).await
    }

    pub async fn in_use_for_author(&self, author_id: AuthorId) -> Result<i64, AppError> {
        copies::count_copies_in_use_for_author(&self.pool, author_id).await
    }

    /// Writes all `copies` in one transaction
    pub async fn edit_many(&self, copies: &[BookCopy]) -> Result<(), AppError> {
        copies::update_copies(&self.pool, copies).await
    }
}

#[async_trait]
impl Repository for MemberRepository {
    type Entity = Member;
    type Draft = NewMember;
    type Id = MemberId;

    async fn add(&self, draft: &NewMember) -> Result<Member, AppError> {
        members::create_member(&self.pool, draft).await
    }

    async fn all(&self) -> Result<Vec<Member>, AppError> {
        members::list_members(&self.pool).await
    }

    async fn find(&self, id: MemberId) -> Result<Option<Member>, AppError> {
        members::find_member(&self.pool, id).await
    }

    async fn edit(&self, entity: &Member) -> Result<(), AppError> {
        members::update_member(&self.pool, entity).await
    }

    async fn remove(&self, id: MemberId) -> Result<(), AppError> {
        members::delete_member(&self.pool, id).await
    }
}

impl MemberRepository {
    pub async fn by_ssn(&self, ssn: &str) -> Result<Option<Member>, AppError> {
        members::find_member_by_ssn(&self.pool, ssn).await
    }
}

#[async_trait]
impl Repository for LoanRepository {
    type Entity = Loan;
    type Draft = NewLoan;
    type Id = LoanId;

    async fn add(&self, draft: &NewLoan) -> Result<Loan, AppError> {
        loans::create_loan(&self.pool, draft).await
    }

    async fn all(&self) -> Result<Vec<Loan>, AppError> {
        loans::list_loans(&self.pool).await
    }

    async fn find(&self, id: LoanId) -> Result<Option<Loan>, AppError> {
        loans::find_loan(&self.pool, id).await
    }

    async fn edit(&self, entity: &Loan) -> Result<(), AppError> {
        loans::update_loan(&self.pool, entity).await
    }

    async fn remove(&self, id: LoanId) -> Result<(), AppError> {
        loans::delete_loan(&self.pool, id).await
    }
}

impl LoanRepository {
    /// Opens `loan` and stores the lent `copy` in one transaction
    pub async fn lend(&self, copy: &BookCopy, loan: &NewLoan) -> Result<Loan, AppError> {
        loans::record_lend(&self.pool, copy, loan).await
    }

    /// Closes `loan` and stores the returned `copy` in one transaction
    pub async fn close(&self, loan: &Loan, copy: &BookCopy) -> Result<(), AppError> {
        loans::record_return(&self.pool, loan, copy).await
    }

    pub async fn open(&self) -> Result<Vec<Loan>, AppError> {
        loans::get_open_loans(&self.pool).await
    }

    pub async fn past_due(&self, now: Timestamp) -> Result<Vec<Loan>, AppError> {
        loans::get_past_due_loans(&self.pool, now).await
    }

    pub async fn by_member(&self, member_id: MemberId) -> Result<Vec<Loan>, AppError> {
        loans::get_loans_by_member(&self.pool, member_id).await
    }

    pub async fn open_for_copy(&self, copy_id: CopyId) -> Result<Option<Loan>, AppError> {
        loans::find_open_loan_for_copy(&self.pool, copy_id).await
    }

    pub async fn open_count_for_member(&self, member_id: MemberId) -> Result<i64, AppError> {
        loans::count_open_loans_for_member(&self.pool, member_id).await
    }
}

/// All repositories built over one pool
#[derive(Debug, Clone)]
pub struct Repositories {
    pub authors: AuthorRepository,
    pub books: BookRepository,
    pub copies: CopyRepository,
    pub members: MemberRepository,
    pub loans: LoanRepository,
}

impl Repositories {
    pub fn new(pool: DbPool) -> Self {
        Self {
            authors: AuthorRepository::new(pool.clone()),
            books: BookRepository::new(pool.clone()),
            copies: CopyRepository::new(pool.clone()),
            members: MemberRepository::new(pool.clone()),
            loans: LoanRepository::new(pool),
        }
    }
}
