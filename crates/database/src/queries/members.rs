//! Member database operations

use crate::DbPool;
use shelfmark_core::{AppError, Member, MemberId, NewMember, Timestamp};
use sqlx::sqlite::SqliteRow;

const MEMBER_COLUMNS: &str = "id, name, ssn, member_since";

/// Inserts a member and returns it with its assigned id
pub async fn create_member(pool: &DbPool, member: &NewMember) -> Result<Member, AppError> {
    let id = sqlx::query("INSERT INTO members (name, ssn, member_since) VALUES (?, ?, ?)")
        .bind(&member.name)
        .bind(&member.ssn)
        .bind(member.member_since.as_millis())
        .execute(pool)
        .await
        .map_err(|e| AppError::database("Failed to create member", e))?
        .last_insert_rowid();

    Ok(member.clone().with_id(MemberId::new(id)))
}

/// Gets a member by ID
pub async fn get_member(pool: &DbPool, id: MemberId) -> Result<Member, AppError> {
    find_member(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Member", id))
}

/// Looks up a member by ID
pub async fn find_member(pool: &DbPool, id: MemberId) -> Result<Option<Member>, AppError> {
    let row = sqlx::query(&format!("SELECT {MEMBER_COLUMNS} FROM members WHERE id = ?"))
        .bind(id.get())
        .fetch_optional(pool)
        .await
        .map_err(|e| AppError::database("Failed to fetch member", e))?;

    row.map(row_to_member).transpose()
}

/// Looks up a member by SSN
pub async fn find_member_by_ssn(pool: &DbPool, ssn: &str) -> Result<Option<Member>, AppError> {
    let row = sqlx::query(&format!("SELECT {MEMBER_COLUMNS} FROM members WHERE ssn = ?"))
        .bind(ssn)
        .fetch_optional(pool)
        .await
        .map_err(|e| AppError::database("Failed to fetch member by SSN", e))?;

    row.map(row_to_member).transpose()
}

/// Lists all members in id order
pub async fn list_members(pool: &DbPool) -> Result<Vec<Member>, AppError> {
    let rows = sqlx::query(&format!("SELECT {MEMBER_COLUMNS} FROM members ORDER BY id"))
        .fetch_all(pool)
        .await
        .map_err(|e| AppError::database("Failed to list members", e))?;

    rows.into_iter().map(row_to_member).collect()
}

/// Updates an existing member
pub async fn update_member(pool: &DbPool, member: &Member) -> Result<(), AppError> {
    let result = sqlx::query("UPDATE members SET name = ?, ssn = ?, member_since = ? WHERE id = ?")
        .bind(&member.name)
        .bind(&member.ssn)
        .bind(member.member_since.as_millis())
        .bind(member.id.get())
        .execute(pool)
        .await
        .map_err(|e| AppError::database("Failed to update member", e))?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Member", member.id));
    }
    Ok(())
}

/// Deletes a member; their loan history cascades with them
pub async fn delete_member(pool: &DbPool, id: MemberId) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM members WHERE id = ?")
        .bind(id.get())
        .execute(pool)
        .await
        .map_err(|e| AppError::database("Failed to delete member", e))?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Member", id));
    }
    Ok(())
}

fn row_to_member(row: SqliteRow) -> Result<Member, AppError> {
    use sqlx::Row;

    let id: i64 = row
        .try_get("id")
        .map_err(|e| AppError::database("Missing member ID", e))?;
    let member_since: i64 = row
        .try_get("member_since")
        .map_err(|e| AppError::database("Missing member_since", e))?;

    Ok(Member {
        id: MemberId::new(id),
        name: row
            .try_get("name")
            .map_err(|e| AppError::database("Missing member name", e))?,
        ssn: row
            .try_get("ssn")
            .map_err(|e| AppError::database("Missing SSN", e))?,
        member_since: Timestamp::from_millis(member_since),
    })
}
