//! Loan database operations
//!
//! Lending and returning touch two tables; [`record_lend`] and [`record_return`]
//! write both rows in a single transaction and re-check the stored state so a
//! stale in-memory copy can never open a second loan.

use crate::DbPool;
use shelfmark_core::{
    AppError, BookCopy, CopyId, CopyState, Loan, LoanId, MemberId, NewLoan, Timestamp,
};
use sqlx::sqlite::SqliteRow;

const LOAN_COLUMNS: &str = "id, copy_id, member_id, loaned_at, due_at, returned_at";

/// Inserts a loan row as-is
pub async fn create_loan(pool: &DbPool, loan: &NewLoan) -> Result<Loan, AppError> {
    let id = sqlx::query(
        "INSERT INTO loans (copy_id, member_id, loaned_at, due_at) VALUES (?, ?, ?, ?)",
    )
    .bind(loan.copy_id.get())
    .bind(loan.member_id.get())
    .bind(loan.loaned_at.as_millis())
    .bind(loan.due_at.as_millis())
    .execute(pool)
    .await
    .map_err(|e| AppError::database("Failed to create loan", e))?
    .last_insert_rowid();

    Ok(loan.clone().with_id(LoanId::new(id)))
}

/// Opens a loan and moves the lent copy out of `available` atomically
///
/// `copy` must already carry its post-lend state.
pub async fn record_lend(pool: &DbPool, copy: &BookCopy, loan: &NewLoan) -> Result<Loan, AppError> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| AppError::database("Failed to begin lend", e))?;

    let updated = sqlx::query("UPDATE book_copies SET state = ? WHERE id = ? AND state = ?")
        .bind(copy.state.as_str())
        .bind(copy.id.get())
        .bind(CopyState::Available.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database("Failed to mark copy as lent", e))?
        .rows_affected();

    if updated == 0 {
        return Err(AppError::InvalidTransition {
            entity: "BookCopy".to_string(),
            identifier: copy.id.to_string(),
            from: "not available".to_string(),
            event: "lend".to_string(),
        });
    }

    let id = sqlx::query(
        "INSERT INTO loans (copy_id, member_id, loaned_at, due_at) VALUES (?, ?, ?, ?)",
    )
    .bind(loan.copy_id.get())
    .bind(loan.member_id.get())
    .bind(loan.loaned_at.as_millis())
    .bind(loan.due_at.as_millis())
    .execute(&mut *tx)
    .await
    .map_err(|e| AppError::database("Failed to create loan", e))?
    .last_insert_rowid();

    tx.commit()
        .await
        .map_err(|e| AppError::database("Failed to commit lend", e))?;

    Ok(loan.clone().with_id(LoanId::new(id)))
}

/// Closes a loan and writes the returned copy atomically
///
/// `loan` must carry its `returned_at`; `copy` its post-return state and condition.
pub async fn record_return(pool: &DbPool, loan: &Loan, copy: &BookCopy) -> Result<(), AppError> {
    let returned_at = loan.returned_at.ok_or_else(|| AppError::InvalidArgument {
        argument: "loan".to_string(),
        reason: format!("loan {} has no return time", loan.id),
    })?;

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| AppError::database("Failed to begin return", e))?;

    let closed = sqlx::query("UPDATE loans SET returned_at = ? WHERE id = ? AND returned_at IS NULL")
        .bind(returned_at.as_millis())
        .bind(loan.id.get())
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database("Failed to close loan", e))?
        .rows_affected();

    if closed == 0 {
        return Err(AppError::InvalidTransition {
            entity: "Loan".to_string(),
            identifier: loan.id.to_string(),
            from: "returned".to_string(),
            event: "return".to_string(),
        });
    }

    sqlx::query("UPDATE book_copies SET condition = ?, state = ? WHERE id = ?")
        .bind(copy.condition)
        .bind(copy.state.as_str())
        .bind(copy.id.get())
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database("Failed to update returned copy", e))?;

    tx.commit()
        .await
        .map_err(|e| AppError::database("Failed to commit return", e))
}

/// Gets a loan by ID
pub async fn get_loan(pool: &DbPool, id: LoanId) -> Result<Loan, AppError> {
    find_loan(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Loan", id))
}

/// Looks up a loan by ID
pub async fn find_loan(pool: &DbPool, id: LoanId) -> Result<Option<Loan>, AppError> {
    let row = sqlx::query(&format!("SELECT {LOAN_COLUMNS} FROM loans WHERE id = ?"))
        .bind(id.get())
        .fetch_optional(pool)
        .await
        .map_err(|e| AppError::database("Failed to fetch loan", e))?;

    row.map(row_to_loan).transpose()
}

/// Lists all loans in id order
pub async fn list_loans(pool: &DbPool) -> Result<Vec<Loan>, AppError> {
    let rows = sqlx::query(&format!("SELECT {LOAN_COLUMNS} FROM loans ORDER BY id"))
        .fetch_all(pool)
        .await
        .map_err(|e| AppError::database("Failed to list loans", e))?;

    rows.into_iter().map(row_to_loan).collect()
}

/// Gets loans that have not been returned
pub async fn get_open_loans(pool: &DbPool) -> Result<Vec<Loan>, AppError> {
    let rows = sqlx::query(&format!(
        "SELECT {LOAN_COLUMNS} FROM loans WHERE returned_at IS NULL ORDER BY id"
    ))
    .fetch_all(pool)
    .await
    .map_err(|e| AppError::database("Failed to get open loans", e))?;

    rows.into_iter().map(row_to_loan).collect()
}

/// Gets open loans whose due date is before `now`
pub async fn get_past_due_loans(pool: &DbPool, now: Timestamp) -> Result<Vec<Loan>, AppError> {
    let rows = sqlx::query(&format!(
        "SELECT {LOAN_COLUMNS} FROM loans WHERE returned_at IS NULL AND due_at < ? ORDER BY id"
    ))
    .bind(now.as_millis())
    .fetch_all(pool)
    .await
    .map_err(|e| AppError::database("Failed to get past due loans", e))?;

    rows.into_iter().map(row_to_loan).collect()
}

/// Gets every loan a member has taken, open or closed
pub async fn get_loans_by_member(pool: &DbPool, member_id: MemberId) -> Result<Vec<Loan>, AppError> {
    let rows = sqlx::query(&format!(
        "SELECT {LOAN_COLUMNS} FROM loans WHERE member_id = ? ORDER BY id"
    ))
    .bind(member_id.get())
    .fetch_all(pool)
    .await
    .map_err(|e| AppError::database("Failed to get loans by member", e))?;

    rows.into_iter().map(row_to_loan).collect()
}

/// Finds the open loan on a copy, if any
pub async fn find_open_loan_for_copy(pool: &DbPool, copy_id: CopyId) -> Result<Option<Loan>, AppError> {
    let row = sqlx::query(&format!(
        "SELECT {LOAN_COLUMNS} FROM loans WHERE copy_id = ? AND returned_at IS NULL"
    ))
    .bind(copy_id.get())
    .fetch_optional(pool)
    .await
    .map_err(|e| AppError::database("Failed to find open loan", e))?;

    row.map(row_to_loan).transpose()
}

/// Counts a member's open loans
pub async fn count_open_loans_for_member(pool: &DbPool, member_id: MemberId) -> Result<i64, AppError> {
    sqlx::query_scalar("SELECT COUNT(*) FROM loans WHERE member_id = ? AND returned_at IS NULL")
        .bind(member_id.get())
        .fetch_one(pool)
        .await
        .map_err(|e| AppError::database("Failed to count open loans", e))
}

/// Updates an existing loan
pub async fn update_loan(pool: &DbPool, loan: &Loan) -> Result<(), AppError> {
    let result = sqlx::query(
        r#"
        UPDATE loans SET
            copy_id = ?, member_id = ?, loaned_at = ?, due_at = ?, returned_at = ?
        WHERE id = ?
        "#,
    )
    .bind(loan.copy_id.get())
    .bind(loan.member_id.get())
    .bind(loan.loaned_at.as_millis())
    .bind(loan.due_at.as_millis())
    .bind(loan.returned_at.map(|t| t.as_millis()))
    .bind(loan.id.get())
    .execute(pool)
    .await
    .map_err(|e| AppError::database("Failed to update loan", e))?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Loan", loan.id));
    }
    Ok(())
}

/// Deletes a loan record
pub async fn delete_loan(pool: &DbPool, id: LoanId) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM loans WHERE id = ?")
        .bind(id.get())
        .execute(pool)
        .await
        .map_err(|e| AppError::database("Failed to delete loan", e))?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Loan", id));
    }
    Ok(())
}

fn row_to_loan(row: SqliteRow) -> Result<Loan, AppError> {
    use sqlx::Row;

    let id: i64 = row
        .try_get("id")
        .map_err(|e| AppError::database("Missing loan ID", e))?;
    let copy_id: i64 = row
        .try_get("copy_id")
        .map_err(|e| AppError::database("Missing copy ID", e))?;
    let member_id: i64 = row
        .try_get("member_id")
        .map_err(|e| AppError::database("Missing member ID", e))?;
    let loaned_at: i64 = row
        .try_get("loaned_at")
        .map_err(|e| AppError::database("Missing loaned_at", e))?;
    let due_at: i64 = row
        .try_get("due_at")
        .map_err(|e| AppError::database("Missing due_at", e))?;
    let returned_at: Option<i64> = row
        .try_get("returned_at")
        .map_err(|e| AppError::database("Invalid returned_at", e))?;

    Ok(Loan {
        id: LoanId::new(id),
        copy_id: CopyId::new(copy_id),
        member_id: MemberId::new(member_id),
        loaned_at: Timestamp::from_millis(loaned_at),
        due_at: Timestamp::from_millis(due_at),
        returned_at: returned_at.map(Timestamp::from_millis),
    })
}
