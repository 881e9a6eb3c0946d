//! Author database operations

use crate::DbPool;
use shelfmark_core::{AppError, Author, AuthorId, NewAuthor};
use sqlx::sqlite::SqliteRow;

/// Inserts an author and returns it with its assigned id
pub async fn create_author(pool: &DbPool, author: &NewAuthor) -> Result<Author, AppError> {
    let id = sqlx::query("INSERT INTO authors (name) VALUES (?)")
        .bind(&author.name)
        .execute(pool)
        .await
        .map_err(|e| AppError::database("Failed to create author", e))?
        .last_insert_rowid();

    Ok(author.clone().with_id(AuthorId::new(id)))
}

/// Gets an author by ID
pub async fn get_author(pool: &DbPool, id: AuthorId) -> Result<Author, AppError> {
    find_author(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Author", id))
}

/// Looks up an author by ID
pub async fn find_author(pool: &DbPool, id: AuthorId) -> Result<Option<Author>, AppError> {
    let row = sqlx::query("SELECT id, name FROM authors WHERE id = ?")
        .bind(id.get())
        .fetch_optional(pool)
        .await
        .map_err(|e| AppError::database("Failed to fetch author", e))?;

    row.map(row_to_author).transpose()
}

/// Lists authors whose name matches exactly
pub async fn find_authors_by_name(pool: &DbPool, name: &str) -> Result<Vec<Author>, AppError> {
    let rows = sqlx::query("SELECT id, name FROM authors WHERE name = ? ORDER BY id")
        .bind(name)
        .fetch_all(pool)
        .await
        .map_err(|e| AppError::database("Failed to find authors by name", e))?;

    rows.into_iter().map(row_to_author).collect()
}

/// Lists all authors in id order
pub async fn list_authors(pool: &DbPool) -> Result<Vec<Author>, AppError> {
    let rows = sqlx::query("SELECT id, name FROM authors ORDER BY id")
        .fetch_all(pool)
        .await
        .map_err(|e| AppError::database("Failed to list authors", e))?;

    rows.into_iter().map(row_to_author).collect()
}

/// Updates an existing author
pub async fn update_author(pool: &DbPool, author: &Author) -> Result<(), AppError> {
    let result = sqlx::query("UPDATE authors SET name = ? WHERE id = ?")
        .bind(&author.name)
        .bind(author.id.get())
        .execute(pool)
        .await
        .map_err(|e| AppError::database("Failed to update author", e))?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Author", author.id));
    }
    Ok(())
}

/// Deletes an author; books, copies and loans cascade with it
pub async fn delete_author(pool: &DbPool, id: AuthorId) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM authors WHERE id = ?")
        .bind(id.get())
        .execute(pool)
        .await
        .map_err(|e| AppError::database("Failed to delete author", e))?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Author", id));
    }
    Ok(())
}

fn row_to_author(row: SqliteRow) -> Result<Author, AppError> {
    use sqlx::Row;

    let id: i64 = row
        .try_get("id")
        .map_err(|e| AppError::database("Missing author ID", e))?;

    Ok(Author {
        id: AuthorId::new(id),
        name: row
            .try_get("name")
            .map_err(|e| AppError::database("Missing author name", e))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::create_test_db;
    use crate::migrations::run_migrations;

    async fn setup() -> Result<DbPool, AppError> {
        let pool = create_test_db().await?;
        run_migrations(&pool).await?;
        Ok(pool)
    }

    #[tokio::test]
    async fn test_create_and_get_author() {
        let pool = setup().await.expect("Failed to setup database");

        let author = create_author(&pool, &NewAuthor::new("A. Orwell"))
            .await
            .expect("Failed to create author");
        let retrieved = get_author(&pool, author.id)
            .await
            .expect("Failed to get author");

        assert_eq!(retrieved, author);
    }

    #[tokio::test]
    async fn test_find_missing_author() {
        let pool = setup().await.expect("Failed to setup database");

        assert!(find_author(&pool, AuthorId::new(99)).await.unwrap().is_none());
        assert!(matches!(
            get_author(&pool, AuthorId::new(99)).await,
            Err(AppError::RecordNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_update_and_delete_author() {
        let pool = setup().await.expect("Failed to setup database");

        let mut author = create_author(&pool, &NewAuthor::new("Orwel"))
            .await
            .unwrap();
        author.name = "Orwell".to_string();
        update_author(&pool, &author).await.unwrap();
        assert_eq!(get_author(&pool, author.id).await.unwrap().name, "Orwell");

        delete_author(&pool, author.id).await.unwrap();
        assert!(list_authors(&pool).await.unwrap().is_empty());
        assert!(delete_author(&pool, author.id).await.is_err());
    }

    #[tokio::test]
    async fn test_find_authors_by_name() {
        let pool = setup().await.expect("Failed to setup database");

        create_author(&pool, &NewAuthor::new("Le Guin")).await.unwrap();
        create_author(&pool, &NewAuthor::new("Tolkien")).await.unwrap();

        let found = find_authors_by_name(&pool, "Tolkien").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Tolkien");
    }

    #[tokio::test]
    async fn test_empty_name_rejected_by_schema() {
        let pool = setup().await.expect("Failed to setup database");

        assert!(create_author(&pool, &NewAuthor::new("  ")).await.is_err());
    }
}
