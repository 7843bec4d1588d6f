//! Author database operations

use crate::DbPool;
use bookshelf_core::{AppError, Author, AuthorId, AuthorUpdate, NewAuthor, Validator};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

/// Lists every author, ordered by sortable name
pub async fn list_authors(pool: &DbPool) -> Result<Vec<Author>, AppError> {
    let rows = sqlx::query("SELECT id, name, sort FROM authors ORDER BY sort COLLATE NOCASE, id")
        .fetch_all(pool)
        .await
        .map_err(|e| AppError::database("Failed to list authors", e))?;

    rows.into_iter().map(row_to_author).collect()
}

/// Gets an author by ID
pub async fn get_author(pool: &DbPool, id: &AuthorId) -> Result<Author, AppError> {
    let row = sqlx::query("SELECT id, name, sort FROM authors WHERE id = ?")
        .bind(id.as_str())
        .fetch_optional(pool)
        .await
        .map_err(|e| AppError::database("Failed to fetch author", e))?
        .ok_or_else(|| AppError::not_found("Author", id))?;

    row_to_author(row)
}

/// Creates the given authors, returning them in input order
///
/// An author whose name is already present is not duplicated; the existing
/// record is returned in its place.
pub async fn create_authors(pool: &DbPool, authors: &[NewAuthor]) -> Result<Vec<Author>, AppError> {
    for author in authors {
        author.validate().map_err(|errors| AppError::InvalidArgument {
            argument: "authors".to_string(),
            reason: errors.join("; "),
        })?;
    }

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| AppError::database("Failed to start transaction", e))?;

    let mut created = Vec::with_capacity(authors.len());
    for author in authors {
        created.push(ensure_author(&mut tx, author).await?);
    }

    tx.commit()
        .await
        .map_err(|e| AppError::database("Failed to commit authors", e))?;

    Ok(created)
}

/// Inserts `author` unless one with the same name exists, returning the stored record
pub(crate) async fn ensure_author(
    conn: &mut SqliteConnection,
    author: &NewAuthor,
) -> Result<Author, AppError> {
    sqlx::query("INSERT INTO authors (id, name, sort) VALUES (?, ?, ?) ON CONFLICT(name) DO NOTHING")
        .bind(AuthorId::new().as_str())
        .bind(author.name.trim())
        .bind(author.sortable_name.trim())
        .execute(&mut *conn)
        .await
        .map_err(|e| AppError::database("Failed to create author", e))?;

    let row = sqlx::query("SELECT id, name, sort FROM authors WHERE name = ?")
        .bind(author.name.trim())
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| AppError::database("Failed to fetch created author", e))?;

    row_to_author(row)
}

/// Applies a partial update to an author
pub async fn update_author(
    pool: &DbPool,
    id: &AuthorId,
    update: &AuthorUpdate,
) -> Result<(), AppError> {
    let result = sqlx::query(
        "UPDATE authors SET name = COALESCE(?, name), sort = COALESCE(?, sort) WHERE id = ?",
    )
    .bind(update.name.as_deref())
    .bind(update.sortable_name.as_deref())
    .bind(id.as_str())
    .execute(pool)
    .await
    .map_err(|e| AppError::database("Failed to update author", e))?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Author", id));
    }
    Ok(())
}

/// Deletes an author; links to their books go with them
pub async fn delete_author(pool: &DbPool, id: &AuthorId) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM authors WHERE id = ?")
        .bind(id.as_str())
        .execute(pool)
        .await
        .map_err(|e| AppError::database("Failed to delete author", e))?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Author", id));
    }
    Ok(())
}

pub(crate) fn row_to_author(row: SqliteRow) -> Result<Author, AppError> {
    let id: String = row
        .try_get("id")
        .map_err(|e| AppError::database("Failed to read author id", e))?;
    let name: String = row
        .try_get("name")
        .map_err(|e| AppError::database("Failed to read author name", e))?;
    let sort: String = row
        .try_get("sort")
        .map_err(|e| AppError::database("Failed to read author sort", e))?;

    Ok(Author::new(AuthorId::from_string(id), name, sort))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::connect_in_memory;

    #[tokio::test]
    async fn test_create_and_list_authors() -> Result<(), AppError> {
        let pool = connect_in_memory().await?;

        let created = create_authors(
            &pool,
            &[NewAuthor::from_name("Mary Shelley"), NewAuthor::from_name("Jane Austen")],
        )
        .await?;

        assert_eq!(created.len(), 2);
        assert_eq!(created[0].name, "Mary Shelley");
        assert_eq!(created[1].sortable_name, "Austen, Jane");

        let listed = list_authors(&pool).await?;
        let names: Vec<_> = listed.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Jane Austen", "Mary Shelley"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_existing_author_returns_stored_record() -> Result<(), AppError> {
        let pool = connect_in_memory().await?;

        let first = create_authors(&pool, &[NewAuthor::from_name("Homer")]).await?;
        let second = create_authors(&pool, &[NewAuthor::from_name("Homer")]).await?;

        assert_eq!(first[0].id, second[0].id);
        assert_eq!(list_authors(&pool).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_blank_author_is_rejected() -> Result<(), AppError> {
        let pool = connect_in_memory().await?;

        let result = create_authors(&pool, &[NewAuthor::from_name("Homer"), NewAuthor::from_name("  ")]).await;
        assert!(matches!(result, Err(AppError::InvalidArgument { .. })));
        assert!(list_authors(&pool).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_update_author() -> Result<(), AppError> {
        let pool = connect_in_memory().await?;
        let author = create_authors(&pool, &[NewAuthor::from_name("Jane Austen")]).await?.remove(0);

        let update = AuthorUpdate {
            name: Some("J. Austen".to_string()),
            sortable_name: None,
        };
        update_author(&pool, &author.id, &update).await?;

        let stored = get_author(&pool, &author.id).await?;
        assert_eq!(stored.name, "J. Austen");
        assert_eq!(stored.sortable_name, "Austen, Jane");
        Ok(())
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_author() -> Result<(), AppError> {
        let pool = connect_in_memory().await?;
        let missing = AuthorId::from("nobody");

        let result = update_author(&pool, &missing, &AuthorUpdate::default()).await;
        assert!(matches!(result, Err(AppError::RecordNotFound { .. })));

        let result = delete_author(&pool, &missing).await;
        assert!(matches!(result, Err(AppError::RecordNotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_author() -> Result<(), AppError> {
        let pool = connect_in_memory().await?;
        let author = create_authors(&pool, &[NewAuthor::from_name("Homer")]).await?.remove(0);

        delete_author(&pool, &author.id).await?;
        assert!(list_authors(&pool).await?.is_empty());
        Ok(())
    }
}
