use super::{sort_items, validate};
use crate::error::{LibraryError, Result};
use crate::notify::{ChangeBus, EntityKind};
use shelfmark_core::{Author, AuthorId, NewAuthor, SortOrder};
use shelfmark_database::{Repositories, Repository};

/// Registers and removes authors
#[derive(Debug, Clone)]
pub struct AuthorService {
    repos: Repositories,
    bus: ChangeBus,
}

change_feed!(AuthorService, crate::notify::EntityKind::Author);

impl AuthorService {
    pub fn new(repos: Repositories, bus: ChangeBus) -> Self {
        Self { repos, bus }
    }

    pub async fn add(&self, draft: NewAuthor) -> Result<Author> {
        validate("Author", &draft)?;

        let author = self.repos.authors.add(&draft).await?;
        log::info!("Added author {} ({})", author.name, author.id);
        self.bus.publish(EntityKind::Author);
        Ok(author)
    }

    pub async fn all(&self) -> Result<Vec<Author>> {
        Ok(self.repos.authors.all().await?)
    }

    pub async fn find(&self, id: AuthorId) -> Result<Option<Author>> {
        Ok(self.repos.authors.find(id).await?)
    }

    /// Authors whose name matches exactly
    pub async fn find_by_name(&self, name: &str) -> Result<Vec<Author>> {
        log::debug!("Looking up authors named '{}'", name);
        Ok(self.repos.authors.by_name(name).await?)
    }

    pub async fn sorted(&self, field: &str, order: SortOrder) -> Result<Vec<Author>> {
        sort_items(self.all().await?, field, order)
    }

    pub async fn edit(&self, author: &Author) -> Result<()> {
        validate("Author", author)?;
        self.require(author.id).await?;

        self.repos.authors.edit(author).await?;
        log::info!("Updated author {}", author.id);
        self.bus.publish(EntityKind::Author);
        Ok(())
    }

    /// Removes the author together with their books
    ///
    /// Refused while any copy of any of those books is lent out.
    pub async fn remove(&self, id: AuthorId) -> Result<()> {
        self.require(id).await?;

        let in_use = self.repos.copies.in_use_for_author(id).await?;
        if in_use > 0 {
            log::warn!("Refusing to remove author {}: {} copies lent out", id, in_use);
            return Err(LibraryError::CopiesInUse {
                entity: "Author",
                id: id.get(),
                count: in_use,
            });
        }

        self.repos.authors.remove(id).await?;
        log::info!("Removed author {}", id);

        for kind in [
            EntityKind::Author,
            EntityKind::Book,
            EntityKind::BookCopy,
            EntityKind::Loan,
        ] {
            self.bus.publish(kind);
        }
        Ok(())
    }

    async fn require(&self, id: AuthorId) -> Result<Author> {
        self.find(id).await?.ok_or(LibraryError::NotFound {
            entity: "Author",
            id: id.get(),
        })
    }
}
