//! Database query operations organized by entity

pub mod authors;
pub mod books;
pub mod copies;
pub mod loans;
pub mod members;

// Re-export commonly used query functions
pub use authors::{create_author, delete_author, find_author, get_author, list_authors, update_author};
pub use books::{
    create_book, delete_book, find_book, get_available_books, get_book, get_books_by_author,
    list_books, search_books_by_title, update_book,
};
pub use copies::{
    create_copy, delete_copy, find_copy, get_copies_by_book, get_copies_by_state, get_copy,
    list_copies, update_copy, update_copies,
};
pub use loans::{
    delete_loan, find_loan, get_loan, get_open_loans, list_loans, record_lend, record_return,
    update_loan,
};
pub use members::{
    create_member, delete_member, find_member, find_member_by_ssn, get_member, list_members,
    update_member,
};
