//! Book identifier operations (isbn, asin, ...)

use crate::DbPool;
use bookshelf_core::{AppError, BookId};

/// Sets the identifier `label` of a book, replacing any previous value
pub async fn upsert_identifier(
    pool: &DbPool,
    book_id: &BookId,
    label: &str,
    value: &str,
) -> Result<(), AppError> {
    let label = label.trim();
    if label.is_empty() {
        return Err(AppError::InvalidArgument {
            argument: "label".to_string(),
            reason: "identifier label cannot be empty".to_string(),
        });
    }

    ensure_book_exists(pool, book_id).await?;

    sqlx::query(
        r#"
        INSERT INTO identifiers (book, type, val) VALUES (?, ?, ?)
        ON CONFLICT(book, type) DO UPDATE SET val = excluded.val
        "#,
    )
    .bind(book_id.as_str())
    .bind(label)
    .bind(value)
    .execute(pool)
    .await
    .map_err(|e| AppError::database("Failed to upsert identifier", e))?;

    Ok(())
}

/// Removes the identifier `label` from a book; absent labels are ignored
pub async fn delete_identifier(pool: &DbPool, book_id: &BookId, label: &str) -> Result<(), AppError> {
    ensure_book_exists(pool, book_id).await?;

    sqlx::query("DELETE FROM identifiers WHERE book = ? AND type = ?")
        .bind(book_id.as_str())
        .bind(label.trim())
        .execute(pool)
        .await
        .map_err(|e| AppError::database("Failed to delete identifier", e))?;

    Ok(())
}

async fn ensure_book_exists(pool: &DbPool, book_id: &BookId) -> Result<(), AppError> {
    let exists: Option<String> = sqlx::query_scalar("SELECT id FROM books WHERE id = ?")
        .bind(book_id.as_str())
        .fetch_optional(pool)
        .await
        .map_err(|e| AppError::database("Failed to fetch book", e))?;

    match exists {
        Some(_) => Ok(()),
        None => Err(AppError::not_found("Book", book_id)),
    }
}
