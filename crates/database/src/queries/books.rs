//! Book database operations

use crate::DbPool;
use shelfmark_core::{AppError, AuthorId, Book, BookId, NewBook};
use sqlx::sqlite::SqliteRow;

const BOOK_COLUMNS: &str = "id, author_id, title, description";

/// Inserts a book and returns it with its assigned id
pub async fn create_book(pool: &DbPool, book: &NewBook) -> Result<Book, AppError> {
    let id = sqlx::query("INSERT INTO books (author_id, title, description) VALUES (?, ?, ?)")
        .bind(book.author_id.get())
        .bind(&book.title)
        .bind(&book.description)
        .execute(pool)
        .await
        .map_err(|e| AppError::database("Failed to create book", e))?
        .last_insert_rowid();

    Ok(book.clone().with_id(BookId::new(id)))
}

/// Gets a book by ID
pub async fn get_book(pool: &DbPool, id: BookId) -> Result<Book, AppError> {
    find_book(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Book", id))
}

/// Looks up a book by ID
pub async fn find_book(pool: &DbPool, id: BookId) -> Result<Option<Book>, AppError> {
    let row = sqlx::query(&format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = ?"))
        .bind(id.get())
        .fetch_optional(pool)
        .await
        .map_err(|e| AppError::database("Failed to fetch book", e))?;

    row.map(row_to_book).transpose()
}

/// Lists all books in id order
pub async fn list_books(pool: &DbPool) -> Result<Vec<Book>, AppError> {
    let rows = sqlx::query(&format!("SELECT {BOOK_COLUMNS} FROM books ORDER BY id"))
        .fetch_all(pool)
        .await
        .map_err(|e| AppError::database("Failed to list books", e))?;

    rows.into_iter().map(row_to_book).collect()
}

/// Gets books written by an author
pub async fn get_books_by_author(pool: &DbPool, author_id: AuthorId) -> Result<Vec<Book>, AppError> {
    let rows = sqlx::query(&format!(
        "SELECT {BOOK_COLUMNS} FROM books WHERE author_id = ? ORDER BY id"
    ))
    .bind(author_id.get())
    .fetch_all(pool)
    .await
    .map_err(|e| AppError::database("Failed to get books by author", e))?;

    rows.into_iter().map(row_to_book).collect()
}

/// Finds books whose title contains `fragment`, ignoring ASCII case
pub async fn search_books_by_title(pool: &DbPool, fragment: &str) -> Result<Vec<Book>, AppError> {
    let pattern = format!("%{}%", escape_like(fragment));

    let rows = sqlx::query(&format!(
        "SELECT {BOOK_COLUMNS} FROM books WHERE title LIKE ? ESCAPE '\\' ORDER BY title, id"
    ))
    .bind(pattern)
    .fetch_all(pool)
    .await
    .map_err(|e| AppError::database("Failed to search books", e))?;

    rows.into_iter().map(row_to_book).collect()
}

/// Gets books with at least one copy on the shelf
pub async fn get_available_books(pool: &DbPool) -> Result<Vec<Book>, AppError> {
    let rows = sqlx::query(
        r#"
        SELECT b.id, b.author_id, b.title, b.description
        FROM books b
        WHERE EXISTS (
            SELECT 1 FROM book_copies c
            WHERE c.book_id = b.id AND c.state = 'available'
        )
        ORDER BY b.id
        "#,
    )
    .fetch_all(pool)
    .await
    .map_err(|e| AppError::database("Failed to get available books", e))?;

    rows.into_iter().map(row_to_book).collect()
}

/// Updates an existing book
pub async fn update_book(pool: &DbPool, book: &Book) -> Result<(), AppError> {
    let result =
        sqlx::query("UPDATE books SET author_id = ?, title = ?, description = ? WHERE id = ?")
            .bind(book.author_id.get())
            .bind(&book.title)
            .bind(&book.description)
            .bind(book.id.get())
            .execute(pool)
            .await
            .map_err(|e| AppError::database("Failed to update book", e))?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Book", book.id));
    }
    Ok(())
}

/// Deletes a book; its copies and their loans cascade with it
pub async fn delete_book(pool: &DbPool, id: BookId) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM books WHERE id = ?")
        .bind(id.get())
        .execute(pool)
        .await
        .map_err(|e| AppError::database("Failed to delete book", e))?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Book", id));
    }
    Ok(())
}

fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Converts a database row to a Book
pub(crate) fn row_to_book(row: SqliteRow) -> Result<Book, AppError> {
    use sqlx::Row;

    let id: i64 = row
        .try_get("id")
        .map_err(|e| AppError::database("Missing book ID", e))?;
    let author_id: i64 = row
        .try_get("author_id")
        .map_err(|e| AppError::database("Missing author ID", e))?;

    Ok(Book {
        id: BookId::new(id),
        author_id: AuthorId::new(author_id),
        title: row
            .try_get("title")
            .map_err(|e| AppError::database("Missing title", e))?,
        description: row
            .try_get("description")
            .map_err(|e| AppError::database("Missing description", e))?,
    })
}
