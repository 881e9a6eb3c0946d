//! Domain services, one per entity
//!
//! A service wraps its repository, validates input, enforces the state rules
//! for its entity, and publishes a change notification after every
//! successful mutation. Failed operations publish nothing.

/// Adds `subscribe`/`unsubscribe` bound to one entity kind
macro_rules! change_feed {
    ($service:ident, $kind:expr) => {
        impl $service {
            /// Registers a listener called after every change to this entity set
            pub fn subscribe(
                &self,
                listener: $crate::notify::ChangeListener,
            ) -> $crate::notify::SubscriptionId {
                self.bus.subscribe($kind, listener)
            }

            pub fn unsubscribe(&self, id: $crate::notify::SubscriptionId) -> bool {
                self.bus.unsubscribe(id)
            }
        }
    };
}

mod authors;
mod books;
mod copies;
mod loans;
mod members;

pub use authors::AuthorService;
pub use books::BookService;
pub use copies::CopyService;
pub use loans::{LendingPolicy, LoanService, ReturnOutcome};
pub use members::MemberService;

use crate::error::{LibraryError, Result};
use shelfmark_core::{sort_by_field, SortFields, SortOrder, Validator};

fn validate<T: Validator>(entity: &str, value: &T) -> Result<()> {
    value
        .validate()
        .map_err(|messages| LibraryError::validation(entity, messages))
}

fn sort_items<T: SortFields>(mut items: Vec<T>, field: &str, order: SortOrder) -> Result<Vec<T>> {
    sort_by_field(&mut items, field, order).map_err(LibraryError::from_sort)?;
    Ok(items)
}
