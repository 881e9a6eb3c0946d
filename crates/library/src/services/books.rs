use super::{sort_items, validate};
use crate::error::{LibraryError, Result};
use crate::notify::{ChangeBus, EntityKind};
use shelfmark_core::{AuthorId, Book, BookId, NewBook, SortOrder};
use shelfmark_database::{Repositories, Repository};

/// Catalogue of titles
#[derive(Debug, Clone)]
pub struct BookService {
    repos: Repositories,
    bus: ChangeBus,
}

change_feed!(BookService, crate::notify::EntityKind::Book);

impl BookService {
    pub fn new(repos: Repositories, bus: ChangeBus) -> Self {
        Self { repos, bus }
    }

    pub async fn add(&self, draft: NewBook) -> Result<Book> {
        validate("Book", &draft)?;
        self.require_author(draft.author_id).await?;

        let book = self.repos.books.add(&draft).await?;
        log::info!("Added book '{}' ({})", book.title, book.id);
        self.bus.publish(EntityKind::Book);
        Ok(book)
    }

    pub async fn all(&self) -> Result<Vec<Book>> {
        Ok(self.repos.books.all().await?)
    }

    pub async fn find(&self, id: BookId) -> Result<Option<Book>> {
        Ok(self.repos.books.find(id).await?)
    }

    pub async fn sorted(&self, field: &str, order: SortOrder) -> Result<Vec<Book>> {
        sort_items(self.all().await?, field, order)
    }

    /// Books whose title contains `fragment`, case-insensitively
    pub async fn search_title(&self, fragment: &str) -> Result<Vec<Book>> {
        log::debug!("Searching titles for '{}'", fragment);
        Ok(self.repos.books.search_title(fragment).await?)
    }

    pub async fn books_by_author(&self, author_id: AuthorId) -> Result<Vec<Book>> {
        Ok(self.repos.books.by_author(author_id).await?)
    }

    /// Books with at least one copy on the shelf
    pub async fn available_books(&self) -> Result<Vec<Book>> {
        Ok(self.repos.books.available().await?)
    }

    /// True when no copy of the book is lent out, including when it has none
    pub async fn all_copies_available(&self, id: BookId) -> Result<bool> {
        let copies = self.repos.copies.by_book(id).await?;
        Ok(copies.iter().all(|copy| copy.state.is_available()))
    }

    pub async fn edit(&self, book: &Book) -> Result<()> {
        validate("Book", book)?;
        self.require(book.id).await?;
        self.require_author(book.author_id).await?;

        self.repos.books.edit(book).await?;
        log::info!("Updated book {}", book.id);
        self.bus.publish(EntityKind::Book);
        Ok(())
    }

    /// Removes the book with its copies and their past loans
    ///
    /// Refused while any copy is lent out; nothing is removed in that case.
    pub async fn remove(&self, id: BookId) -> Result<()> {
        self.require(id).await?;

        let in_use = self.repos.copies.in_use_for_book(id).await?;
        if in_use > 0 {
            log::warn!("Refusing to remove book {}: {} copies lent out", id, in_use);
            return Err(LibraryError::CopiesInUse {
                entity: "Book",
                id: id.get(),
                count: in_use,
            });
        }

        self.repos.books.remove(id).await?;
        log::info!("Removed book {}", id);

        self.bus.publish(EntityKind::Book);
        self.bus.publish(EntityKind::BookCopy);
        self.bus.publish(EntityKind::Loan);
        Ok(())
    }

    async fn require(&self, id: BookId) -> Result<Book> {
        self.find(id).await?.ok_or(LibraryError::NotFound {
            entity: "Book",
            id: id.get(),
        })
    }

    async fn require_author(&self, id: AuthorId) -> Result<()> {
        match self.repos.authors.find(id).await? {
            Some(_) => Ok(()),
            None => Err(LibraryError::NotFound {
                entity: "Author",
                id: id.get(),
            }),
        }
    }
}
