use super::{sort_items, validate};
use crate::error::{LibraryError, Result};
use crate::notify::{ChangeBus, EntityKind};
use shelfmark_core::{BookCopy, BookId, CopyId, CopyState, NewBookCopy, SortOrder};
use shelfmark_database::{Repositories, Repository};

/// Physical copies on the shelves
#[derive(Debug, Clone)]
pub struct CopyService {
    repos: Repositories,
    bus: ChangeBus,
}

change_feed!(CopyService, crate::notify::EntityKind::BookCopy);

impl CopyService {
    pub fn new(repos: Repositories, bus: ChangeBus) -> Self {
        Self { repos, bus }
    }

    /// Registers a new copy; it always starts out available
    pub async fn add(&self, draft: NewBookCopy) -> Result<BookCopy> {
        validate("BookCopy", &draft)?;
        if self.repos.books.find(draft.book_id).await?.is_none() {
            return Err(LibraryError::NotFound {
                entity: "Book",
                id: draft.book_id.get(),
            });
        }

        let copy = self.repos.copies.add(&draft).await?;
        log::info!("Added copy {} of book {}", copy.id, copy.book_id);
        self.bus.publish(EntityKind::BookCopy);
        Ok(copy)
    }

    pub async fn all(&self) -> Result<Vec<BookCopy>> {
        Ok(self.repos.copies.all().await?)
    }

    pub async fn find(&self, id: CopyId) -> Result<Option<BookCopy>> {
        Ok(self.repos.copies.find(id).await?)
    }

    pub async fn sorted(&self, field: &str, order: SortOrder) -> Result<Vec<BookCopy>> {
        sort_items(self.all().await?, field, order)
    }

    pub async fn available_copies(&self) -> Result<Vec<BookCopy>> {
        Ok(self.repos.copies.by_state(CopyState::Available).await?)
    }

    pub async fn copies_of_book(&self, book_id: BookId) -> Result<Vec<BookCopy>> {
        Ok(self.repos.copies.by_book(book_id).await?)
    }

    /// Overrides the recorded wear of a copy
    pub async fn set_condition(&self, id: CopyId, condition: i32) -> Result<BookCopy> {
        let mut copy = self.require(id).await?;
        copy.condition = condition;
        validate("condition", &copy)?;

        self.repos.copies.edit(&copy).await?;
        log::info!("Copy {} condition set to {}", id, condition);
        self.bus.publish(EntityKind::BookCopy);
        Ok(copy)
    }

    /// Removes a copy that is on the shelf, along with its past loans
    pub async fn remove(&self, id: CopyId) -> Result<()> {
        let copy = self.require(id).await?;
        if !copy.state.is_available() {
            log::warn!("Refusing to remove copy {}: {}", id, copy.state);
            return Err(LibraryError::CopyInUse {
                copy_id: id.get(),
                state: copy.state,
            });
        }

        self.repos.copies.remove(id).await?;
        log::info!("Removed copy {}", id);
        self.bus.publish(EntityKind::BookCopy);
        self.bus.publish(EntityKind::Loan);
        Ok(())
    }

    async fn require(&self, id: CopyId) -> Result<BookCopy> {
        self.find(id).await?.ok_or(LibraryError::NotFound {
            entity: "BookCopy",
            id: id.get(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{count_changes, seen, setup};
    use shelfmark_core::{Book, NewAuthor, NewBook};

    async fn with_book() -> Result<(CopyService, Repositories, ChangeBus, Book)> {
        let (repos, bus) = setup().await?;
        let author = repos.authors.add(&NewAuthor::new("A. Orwell")).await?;
        let book = repos.books.add(&NewBook::new(author.id, "1984")).await?;
        Ok((
            CopyService::new(repos.clone(), bus.clone()),
            repos,
            bus,
            book,
        ))
    }

    #[tokio::test]
    async fn test_new_copy_is_available() -> Result<()> {
        let (service, _repos, _bus, book) = with_book().await?;

        let copy = service.add(NewBookCopy::new(book.id, 10)).await?;
        assert_eq!(copy.state, CopyState::Available);
        assert_eq!(service.available_copies().await?, vec![copy.clone()]);
        assert_eq!(service.copies_of_book(book.id).await?, vec![copy]);
        Ok(())
    }

    #[tokio::test]
    async fn test_add_requires_existing_book() -> Result<()> {
        let (service, _repos, _bus, _book) = with_book().await?;

        let err = service
            .add(NewBookCopy::new(BookId::new(404), 10))
            .await
            .unwrap_err();
        assert!(matches!(err, LibraryError::NotFound { entity: "Book", .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_negative_condition_rejected() -> Result<()> {
        let (service, _repos, bus, book) = with_book().await?;
        let copy = service.add(NewBookCopy::new(book.id, 3)).await?;
        let changes = count_changes(&bus, EntityKind::BookCopy);

        let err = service.set_condition(copy.id, -1).await.unwrap_err();
        assert!(matches!(err, LibraryError::Validation { ref field, .. } if field == "condition"));
        assert_eq!(seen(&changes), 0);

        let updated = service.set_condition(copy.id, 7).await?;
        assert_eq!(updated.condition, 7);
        assert_eq!(seen(&changes), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_remove_only_when_available() -> Result<()> {
        let (service, repos, _bus, book) = with_book().await?;
        let mut copy = service.add(NewBookCopy::new(book.id, 10)).await?;
        copy.lend()?;
        repos.copies.edit(&copy).await?;

        let err = service.remove(copy.id).await.unwrap_err();
        assert!(matches!(
            err,
            LibraryError::CopyInUse {
                state: CopyState::OnLoan,
                ..
            }
        ));

        copy.return_with_wear(0)?;
        repos.copies.edit(&copy).await?;
        service.remove(copy.id).await?;
        assert!(service.find(copy.id).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_sorted_by_condition() -> Result<()> {
        let (service, _repos, _bus, book) = with_book().await?;
        let worn = service.add(NewBookCopy::new(book.id, 2)).await?;
        let fresh = service.add(NewBookCopy::new(book.id, 9)).await?;

        let sorted = service.sorted("condition", SortOrder::Descending).await?;
        assert_eq!(sorted, vec![fresh, worn]);
        Ok(())
    }
}
