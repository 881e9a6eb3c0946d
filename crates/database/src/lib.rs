//! Shelfmark Database Layer
//!
//! SQLite persistence for authors, books, copies, members and loans, built on
//! sqlx. Query functions live in [`queries`]; services normally go through the
//! per-entity repositories in [`repository`].

pub mod connection;
pub mod migrations;
pub mod queries;
pub mod repository;

pub use connection::{connect, DatabaseConfig, DbPool};
pub use migrations::{optimize, run_migrations, verify_integrity, CURRENT_VERSION};
pub use repository::{
    AuthorRepository, BookRepository, CopyRepository, LoanRepository, MemberRepository,
    Repositories, Repository,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::{authors, books, copies, loans, members};
    use connection::create_test_db;
    use shelfmark_core::{
        AppError, CopyState, NewAuthor, NewBook, NewBookCopy, NewLoan, NewMember, Timestamp,
    };

    #[tokio::test]
    async fn test_database_migrations() -> Result<(), AppError> {
        let pool = create_test_db().await?;
        run_migrations(&pool).await?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schema_migrations")
            .fetch_one(&pool)
            .await
            .map_err(|e| AppError::database("Failed to count migrations", e))?;

        assert_eq!(count, CURRENT_VERSION);
        Ok(())
    }

    #[tokio::test]
    async fn test_full_lending_workflow() -> Result<(), AppError> {
        let pool = create_test_db().await?;
        run_migrations(&pool).await?;

        let author = authors::create_author(&pool, &NewAuthor::new("A. Orwell")).await?;
        let book = books::create_book(&pool, &NewBook::new(author.id, "1984")).await?;
        let mut copy = copies::create_copy(&pool, &NewBookCopy::new(book.id, 10)).await?;
        let member = members::create_member(&pool, &NewMember::new("Ann", "123")).await?;

        copy.lend()?;
        let mut loan = loans::record_lend(
            &pool,
            &copy,
            &NewLoan::starting_at(copy.id, member.id, Timestamp::from_millis(0), 15),
        )
        .await?;

        loan.close(Timestamp::from_millis(1_000))?;
        copy.return_with_wear(2)?;
        loans::record_return(&pool, &loan, &copy).await?;

        let stored = copies::get_copy(&pool, copy.id).await?;
        assert_eq!(stored.state, CopyState::Available);
        assert_eq!(stored.condition, 8);

        books::delete_book(&pool, book.id).await?;
        assert!(loans::list_loans(&pool).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_one_open_loan_per_copy_enforced_by_schema() -> Result<(), AppError> {
        let pool = create_test_db().await?;
        run_migrations(&pool).await?;

        let author = authors::create_author(&pool, &NewAuthor::new("Orwell")).await?;
        let book = books::create_book(&pool, &NewBook::new(author.id, "1984")).await?;
        let copy = copies::create_copy(&pool, &NewBookCopy::new(book.id, 10)).await?;
        let member = members::create_member(&pool, &NewMember::new("Ann", "1")).await?;

        let draft = NewLoan::starting_at(copy.id, member.id, Timestamp::from_millis(0), 15);
        loans::create_loan(&pool, &draft).await?;

        assert!(loans::create_loan(&pool, &draft).await.is_err());
        Ok(())
    }
}
