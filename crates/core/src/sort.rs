//! Field-name driven sorting
//!
//! Each entity publishes a static table of its integer-valued fields. Sorting
//! by name is a table lookup followed by a stable sort on the extracted key.

use crate::error::AppError;
use crate::types::{Author, Book, BookCopy, Loan, Member};
use serde::{Deserialize, Serialize};

/// Direction of a sort
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Extracts an integer sort key from an entity
pub type SortKey<T> = fn(&T) -> i64;

/// Entities that can be sorted by one of their integer fields
pub trait SortFields: Sized + 'static {
    /// Entity name used in error messages
    const ENTITY: &'static str;

    /// Sortable field names and their key extractors
    const FIELDS: &'static [(&'static str, SortKey<Self>)];

    /// Looks up the key extractor for `field`
    fn sort_key(field: &str) -> Option<SortKey<Self>> {
        Self::FIELDS
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, key)| *key)
    }

    /// Names of all sortable fields
    fn field_names() -> Vec<&'static str> {
        Self::FIELDS.iter().map(|(name, _)| *name).collect()
    }
}

/// Sorts `items` in place by the named integer field
pub fn sort_by_field<T: SortFields>(
    items: &mut [T],
    field: &str,
    order: SortOrder,
) -> Result<(), AppError> {
    let key = T::sort_key(field).ok_or_else(|| AppError::UnknownSortField {
        entity: T::ENTITY.to_string(),
        field: field.to_string(),
        valid: T::field_names().join(", "),
    })?;

    match order {
        SortOrder::Ascending => items.sort_by_key(|item| key(item)),
        SortOrder::Descending => items.sort_by(|a, b| key(b).cmp(&key(a))),
    }
    Ok(())
}

impl SortFields for Author {
    const ENTITY: &'static str = "Author";
    const FIELDS: &'static [(&'static str, SortKey<Self>)] = &[("id", |a: &Author| a.id.get())];
}

impl SortFields for Book {
    const ENTITY: &'static str = "Book";
    const FIELDS: &'static [(&'static str, SortKey<Self>)] = &[
        ("id", |b: &Book| b.id.get()),
        ("author_id", |b: &Book| b.author_id.get()),
    ];
}

impl SortFields for BookCopy {
    const ENTITY: &'static str = "BookCopy";
    const FIELDS: &'static [(&'static str, SortKey<Self>)] = &[
        ("id", |c: &BookCopy| c.id.get()),
        ("book_id", |c: &BookCopy| c.book_id.get()),
        ("condition", |c: &BookCopy| i64::from(c.condition)),
    ];
}

impl SortFields for Member {
    const ENTITY: &'static str = "Member";
    const FIELDS: &'static [(&'static str, SortKey<Self>)] = &[("id", |m: &Member| m.id.get())];
}

impl SortFields for Loan {
    const ENTITY: &'static str = "Loan";
    const FIELDS: &'static [(&'static str, SortKey<Self>)] = &[
        ("id", |l: &Loan| l.id.get()),
        ("copy_id", |l: &Loan| l.copy_id.get()),
        ("member_id", |l: &Loan| l.member_id.get()),
    ];
}
