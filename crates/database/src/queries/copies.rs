//! Book copy database operations

use crate::DbPool;
use shelfmark_core::{AppError, AuthorId, BookCopy, BookId, CopyId, CopyState, MemberId, NewBookCopy};
use sqlx::sqlite::SqliteRow;

const COPY_COLUMNS: &str = "id, book_id, condition, state";

/// Inserts a copy and returns it with its assigned id
pub async fn create_copy(pool: &DbPool, copy: &NewBookCopy) -> Result<BookCopy, AppError> {
    let id = sqlx::query("INSERT INTO book_copies (book_id, condition, state) VALUES (?, ?, ?)")
        .bind(copy.book_id.get())
        .bind(copy.condition)
        .bind(CopyState::Available.as_str())
        .execute(pool)
        .await
        .map_err(|e| AppError::database("Failed to create copy", e))?
        .last_insert_rowid();

    Ok(copy.clone().with_id(CopyId::new(id)))
}

/// Gets a copy by ID
pub async fn get_copy(pool: &DbPool, id: CopyId) -> Result<BookCopy, AppError> {
    find_copy(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("BookCopy", id))
}

/// Looks up a copy by ID
pub async fn find_copy(pool: &DbPool, id: CopyId) -> Result<Option<BookCopy>, AppError> {
    let row = sqlx::query(&format!("SELECT {COPY_COLUMNS} FROM book_copies WHERE id = ?"))
        .bind(id.get())
        .fetch_optional(pool)
        .await
        .map_err(|e| AppError::database("Failed to fetch copy", e))?;

    row.map(row_to_copy).transpose()
}

/// Lists all copies in id order
pub async fn list_copies(pool: &DbPool) -> Result<Vec<BookCopy>, AppError> {
    let rows = sqlx::query(&format!("SELECT {COPY_COLUMNS} FROM book_copies ORDER BY id"))
        .fetch_all(pool)
        .await
        .map_err(|e| AppError::database("Failed to list copies", e))?;

    rows.into_iter().map(row_to_copy).collect()
}

/// Gets the copies of one book
pub async fn get_copies_by_book(pool: &DbPool, book_id: BookId) -> Result<Vec<BookCopy>, AppError> {
    let rows = sqlx::query(&format!(
        "SELECT {COPY_COLUMNS} FROM book_copies WHERE book_id = ? ORDER BY id"
    ))
    .bind(book_id.get())
    .fetch_all(pool)
    .await
    .map_err(|e| AppError::database("Failed to get copies by book", e))?;

    rows.into_iter().map(row_to_copy).collect()
}

/// Gets copies in the given state
pub async fn get_copies_by_state(pool: &DbPool, state: CopyState) -> Result<Vec<BookCopy>, AppError> {
    let rows = sqlx::query(&format!(
        "SELECT {COPY_COLUMNS} FROM book_copies WHERE state = ? ORDER BY id"
    ))
    .bind(state.as_str())
    .fetch_all(pool)
    .await
    .map_err(|e| AppError::database("Failed to get copies by state", e))?;

    rows.into_iter().map(row_to_copy).collect()
}

/// Gets the copies a member currently holds through open loans
pub async fn get_copies_held_by_member(
    pool: &DbPool,
    member_id: MemberId,
) -> Result<Vec<BookCopy>, AppError> {
    let rows = sqlx::query(
        r#"
        SELECT c.id, c.book_id, c.condition, c.state
        FROM book_copies c
        JOIN loans l ON l.copy_id = c.id
        WHERE l.member_id = ? AND l.returned_at IS NULL
        ORDER BY c.id
        "#,
    )
    .bind(member_id.get())
    .fetch_all(pool)
    .await
    .map_err(|e| AppError::database("Failed to get copies held by member", e))?;

    rows.into_iter().map(row_to_copy).collect()
}

/// Counts copies of a book that are not on the shelf
pub async fn count_copies_in_use_for_book(pool: &DbPool, book_id: BookId) -> Result<i64, AppError> {
    sqlx::query_scalar("SELECT COUNT(*) FROM book_copies WHERE book_id = ? AND state != 'available'")
        .bind(book_id.get())
        .fetch_one(pool)
        .await
        .map_err(|e| AppError::database("Failed to count copies in use", e))
}

/// Counts copies of any of an author's books that are not on the shelf
pub async fn count_copies_in_use_for_author(
    pool: &DbPool,
    author_id: AuthorId,
) -> Result<i64, AppError> {
    sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM book_copies c
        JOIN books b ON b.id = c.book_id
        WHERE b.author_id = ? AND c.state != 'available'
        "#,
    )
    .bind(author_id.get())
    .fetch_one(pool)
    .await
    .map_err(|e| AppError::database("Failed to count copies in use", e))
}

/// Updates an existing copy
pub async fn update_copy(pool: &DbPool, copy: &BookCopy) -> Result<(), AppError> {
    let result = sqlx::query("UPDATE book_copies SET book_id = ?, condition = ?, state = ? WHERE id = ?")
        .bind(copy.book_id.get())
        .bind(copy.condition)
        .bind(copy.state.as_str())
        .bind(copy.id.get())
        .execute(pool)
        .await
        .map_err(|e| AppError::database("Failed to update copy", e))?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("BookCopy", copy.id));
    }
    Ok(())
}

/// Writes several copies in one transaction
pub async fn update_copies(pool: &DbPool, copies: &[BookCopy]) -> Result<(), AppError> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| AppError::database("Failed to begin transaction", e))?;

    for copy in copies {
        sqlx::query("UPDATE book_copies SET condition = ?, state = ? WHERE id = ?")
            .bind(copy.condition)
            .bind(copy.state.as_str())
            .bind(copy.id.get())
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database("Failed to update copy", e))?;
    }

    tx.commit()
        .await
        .map_err(|e| AppError::database("Failed to commit copy updates", e))
}

/// Deletes a copy; its loan history cascades with it
pub async fn delete_copy(pool: &DbPool, id: CopyId) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM book_copies WHERE id = ?")
        .bind(id.get())
        .execute(pool)
        .await
        .map_err(|e| AppError::database("Failed to delete copy", e))?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("BookCopy", id));
    }
    Ok(())
}

/// Converts a database row to a BookCopy
pub(crate) fn row_to_copy(row: SqliteRow) -> Result<BookCopy, AppError> {
    use sqlx::Row;

    let id: i64 = row
        .try_get("id")
        .map_err(|e| AppError::database("Missing copy ID", e))?;
    let book_id: i64 = row
        .try_get("book_id")
        .map_err(|e| AppError::database("Missing book ID", e))?;
    let state: String = row
        .try_get("state")
        .map_err(|e| AppError::database("Missing copy state", e))?;

    Ok(BookCopy {
        id: CopyId::new(id),
        book_id: BookId::new(book_id),
        condition: row
            .try_get("condition")
            .map_err(|e| AppError::database("Missing condition", e))?,
        state: state.parse()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::create_test_db;
    use crate::migrations::run_migrations;
    use crate::queries::{authors::create_author, books::create_book};
    use shelfmark_core::{NewAuthor, NewBook};

    async fn setup() -> Result<(DbPool, BookId), AppError> {
        let pool = create_test_db().await?;
        run_migrations(&pool).await?;
        let author = create_author(&pool, &NewAuthor::new("Test Author")).await?;
        let book = create_book(&pool, &NewBook::new(author.id, "Test Book")).await?;
        Ok((pool, book.id))
    }

    #[tokio::test]
    async fn test_create_copy_is_available() {
        let (pool, book_id) = setup().await.expect("Failed to setup database");

        let copy = create_copy(&pool, &NewBookCopy::new(book_id, 10))
            .await
            .expect("Failed to create copy");

        let stored = get_copy(&pool, copy.id).await.unwrap();
        assert_eq!(stored.state, CopyState::Available);
        assert_eq!(stored.condition, 10);
    }

    #[tokio::test]
    async fn test_copy_requires_existing_book() {
        let (pool, _) = setup().await.expect("Failed to setup database");

        let result = create_copy(&pool, &NewBookCopy::new(BookId::new(404), 10)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_state_roundtrips_through_storage() {
        let (pool, book_id) = setup().await.expect("Failed to setup database");
        let mut copy = create_copy(&pool, &NewBookCopy::new(book_id, 10)).await.unwrap();

        copy.lend().unwrap();
        copy.mark_overdue().unwrap();
        update_copy(&pool, &copy).await.unwrap();

        assert_eq!(get_copy(&pool, copy.id).await.unwrap().state, CopyState::Overdue);
        assert_eq!(count_copies_in_use_for_book(&pool, book_id).await.unwrap(), 1);
        assert_eq!(
            get_copies_by_state(&pool, CopyState::Overdue).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn test_update_copies_in_batch() {
        let (pool, book_id) = setup().await.expect("Failed to setup database");
        let mut a = create_copy(&pool, &NewBookCopy::new(book_id, 10)).await.unwrap();
        let mut b = create_copy(&pool, &NewBookCopy::new(book_id, 10)).await.unwrap();

        a.lend().unwrap();
        b.lend().unwrap();
        update_copies(&pool, &[a, b]).await.unwrap();

        assert!(get_copies_by_state(&pool, CopyState::Available)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_deleting_book_cascades_to_copies() {
        let (pool, book_id) = setup().await.expect("Failed to setup database");
        create_copy(&pool, &NewBookCopy::new(book_id, 10)).await.unwrap();
        create_copy(&pool, &NewBookCopy::new(book_id, 7)).await.unwrap();
        assert_eq!(get_copies_by_book(&pool, book_id).await.unwrap().len(), 2);

        crate::queries::books::delete_book(&pool, book_id).await.unwrap();

        assert!(list_copies(&pool).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_copy() {
        let (pool, book_id) = setup().await.expect("Failed to setup database");
        let copy = create_copy(&pool, &NewBookCopy::new(book_id, 10)).await.unwrap();

        delete_copy(&pool, copy.id).await.unwrap();

        assert!(find_copy(&pool, copy.id).await.unwrap().is_none());
        assert!(delete_copy(&pool, copy.id).await.is_err());
    }
}
