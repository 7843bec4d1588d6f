//! Book database operations
//!
//! Books are stored the way a Calibre library stores them: the `books` row
//! holds a directory relative to the library root, `data` holds one row per
//! attached format, and the cover (if any) is `cover.jpg` in that directory.

use crate::queries::authors::{ensure_author, row_to_author};
use crate::DbPool;
use bookshelf_core::{
    AppError, Author, Book, BookFile, BookId, BookUpdate, CoverImage, CoverKind,
    FileType, Identifier, NewAuthor, Timestamp,
};
use sqlx::Row;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// File name of a book's cover inside its directory
pub const COVER_FILE: &str = "cover.jpg";

const UNKNOWN_MIME_TYPE: &str = "application/octet-stream";

/// Everything needed to insert a freshly imported book
#[derive(Debug, Clone)]
pub struct NewBookRecord {
    pub id: BookId,
    pub title: String,
    pub sortable_title: Option<String>,
    /// Directory of the book relative to the library root
    pub relative_dir: String,
    /// Stem of the stored format file
    pub file_name: String,
    pub file_type: FileType,
    pub authors: Vec<NewAuthor>,
    pub identifiers: Vec<Identifier>,
    pub tags: Vec<String>,
    pub publisher: Option<String>,
    pub language: Option<String>,
    pub publication_date: Option<String>,
    pub has_cover: bool,
}

/// Absolute path of a stored format file
pub fn format_file_path(root: &Path, relative_dir: &str, file_name: &str, extension: &str) -> PathBuf {
    root.join(relative_dir)
        .join(format!("{}.{}", file_name, extension.to_lowercase()))
}

/// Inserts a book together with its authors, format, identifiers and tags
pub async fn create_book(pool: &DbPool, record: &NewBookRecord) -> Result<(), AppError> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| AppError::database("Failed to start transaction", e))?;

    sqlx::query(
        r#"
        INSERT INTO books (id, title, sort, path, has_cover, publisher, language, pubdate, timestamp)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(record.id.as_str())
    .bind(&record.title)
    .bind(record.sortable_title.as_deref())
    .bind(&record.relative_dir)
    .bind(record.has_cover as i64)
    .bind(record.publisher.as_deref())
    .bind(record.language.as_deref())
    .bind(record.publication_date.as_deref())
    .bind(Timestamp::now().as_millis())
    .execute(&mut *tx)
    .await
    .map_err(|e| AppError::database("Failed to create book", e))?;

    for (position, new_author) in record.authors.iter().enumerate() {
        let author = ensure_author(&mut tx, new_author).await?;
        sqlx::query(
            "INSERT OR IGNORE INTO books_authors_link (book, author, position) VALUES (?, ?, ?)",
        )
        .bind(record.id.as_str())
        .bind(author.id.as_str())
        .bind(position as i64)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database("Failed to link author", e))?;
    }

    sqlx::query("INSERT INTO data (book, format, name) VALUES (?, ?, ?)")
        .bind(record.id.as_str())
        .bind(record.file_type.extension().to_uppercase())
        .bind(&record.file_name)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database("Failed to record book format", e))?;

    for identifier in &record.identifiers {
        sqlx::query("INSERT OR REPLACE INTO identifiers (book, type, val) VALUES (?, ?, ?)")
            .bind(record.id.as_str())
            .bind(&identifier.label)
            .bind(&identifier.value)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database("Failed to store identifier", e))?;
    }

    for tag in record.tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        sqlx::query("INSERT INTO tags (name) VALUES (?) ON CONFLICT(name) DO NOTHING")
            .bind(tag)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database("Failed to create tag", e))?;
        sqlx::query(
            "INSERT OR IGNORE INTO books_tags_link (book, tag) SELECT ?, id FROM tags WHERE name = ?",
        )
        .bind(record.id.as_str())
        .bind(tag)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database("Failed to link tag", e))?;
    }

    tx.commit()
        .await
        .map_err(|e| AppError::database("Failed to commit book", e))?;

    log::debug!("Created book {} ({})", record.id, record.title);
    Ok(())
}

/// Lists all books of the library rooted at `root`, ordered by sort title
pub async fn list_books(pool: &DbPool, root: &Path) -> Result<Vec<Book>, AppError> {
    load_books(pool, root, None).await
}

/// Gets a book by ID
pub async fn get_book(pool: &DbPool, root: &Path, id: &BookId) -> Result<Book, AppError> {
    load_books(pool, root, Some(id))
        .await?
        .pop()
        .ok_or_else(|| AppError::not_found("Book", id))
}

/// Applies a partial update to a book
///
/// A present `author_id_list` replaces the book's author links, keeping the
/// given order.
pub async fn update_book(pool: &DbPool, id: &BookId, update: &BookUpdate) -> Result<(), AppError> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| AppError::database("Failed to start transaction", e))?;

    let result = sqlx::query(
        "UPDATE books SET title = COALESCE(?, title), sort = COALESCE(?, sort) WHERE id = ?",
    )
    .bind(update.title.as_deref())
    .bind(update.sortable_title.as_deref())
    .bind(id.as_str())
    .execute(&mut *tx)
    .await
    .map_err(|e| AppError::database("Failed to update book", e))?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Book", id));
    }

    if let Some(author_ids) = &update.author_id_list {
        sqlx::query("DELETE FROM books_authors_link WHERE book = ?")
            .bind(id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database("Failed to clear author links", e))?;

        for (position, author_id) in author_ids.iter().enumerate() {
            sqlx::query(
                "INSERT OR IGNORE INTO books_authors_link (book, author, position) VALUES (?, ?, ?)",
            )
            .bind(id.as_str())
            .bind(author_id.as_str())
            .bind(position as i64)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database("Failed to link author", e))?;
        }
    }

    tx.commit()
        .await
        .map_err(|e| AppError::database("Failed to commit book update", e))?;

    Ok(())
}

/// Tag names attached to a book, alphabetically
pub async fn book_tags(pool: &DbPool, id: &BookId) -> Result<Vec<String>, AppError> {
    sqlx::query_scalar(
        r#"
        SELECT t.name FROM tags t
        JOIN books_tags_link l ON l.tag = t.id
        WHERE l.book = ?
        ORDER BY t.name
        "#,
    )
    .bind(id.as_str())
    .fetch_all(pool)
    .await
    .map_err(|e| AppError::database("Failed to fetch tags", e))
}

async fn load_books(pool: &DbPool, root: &Path, only: Option<&BookId>) -> Result<Vec<Book>, AppError> {
    let only = only.map(BookId::as_str);

    let book_rows = sqlx::query(
        r#"
        SELECT id, title, sort, path, has_cover FROM books
        WHERE (?1 IS NULL OR id = ?1)
        ORDER BY COALESCE(sort, title) COLLATE NOCASE, id
        "#,
    )
    .bind(only)
    .fetch_all(pool)
    .await
    .map_err(|e| AppError::database("Failed to list books", e))?;

    let mut authors: HashMap<String, Vec<Author>> = HashMap::new();
    let author_rows = sqlx::query(
        r#"
        SELECT l.book, a.id, a.name, a.sort FROM books_authors_link l
        JOIN authors a ON a.id = l.author
        WHERE (?1 IS NULL OR l.book = ?1)
        ORDER BY l.book, l.position
        "#,
    )
    .bind(only)
    .fetch_all(pool)
    .await
    .map_err(|e| AppError::database("Failed to list book authors", e))?;
    for row in author_rows {
        let book: String = get(&row, "book")?;
        authors.entry(book).or_default().push(row_to_author(row)?);
    }

    let mut formats: HashMap<String, Vec<(String, String)>> = HashMap::new();
    let format_rows = sqlx::query(
        "SELECT book, format, name FROM data WHERE (?1 IS NULL OR book = ?1) ORDER BY book, id",
    )
    .bind(only)
    .fetch_all(pool)
    .await
    .map_err(|e| AppError::database("Failed to list book formats", e))?;
    for row in format_rows {
        let book: String = get(&row, "book")?;
        formats
            .entry(book)
            .or_default()
            .push((get(&row, "format")?, get(&row, "name")?));
    }

    let mut identifiers: HashMap<String, Vec<Identifier>> = HashMap::new();
    let identifier_rows = sqlx::query(
        "SELECT book, type, val FROM identifiers WHERE (?1 IS NULL OR book = ?1) ORDER BY book, type",
    )
    .bind(only)
    .fetch_all(pool)
    .await
    .map_err(|e| AppError::database("Failed to list identifiers", e))?;
    for row in identifier_rows {
        let book: String = get(&row, "book")?;
        identifiers
            .entry(book)
            .or_default()
            .push(Identifier::new(get::<String>(&row, "type")?, get::<String>(&row, "val")?));
    }

    let mut books = Vec::with_capacity(book_rows.len());
    for row in book_rows {
        let id: String = get(&row, "id")?;
        let relative_dir: String = get(&row, "path")?;
        let has_cover: i64 = get(&row, "has_cover")?;
        let book_dir = root.join(&relative_dir);

        let file_list = formats
            .remove(&id)
            .unwrap_or_default()
            .into_iter()
            .map(|(format, name)| {
                let mime_type = FileType::from_extension(&format)
                    .map(|t| t.mime_type())
                    .unwrap_or(UNKNOWN_MIME_TYPE);
                BookFile::Local {
                    path: format_file_path(root, &relative_dir, &name, &format),
                    mime_type: mime_type.to_string(),
                }
            })
            .collect();

        let cover_image = (has_cover != 0).then(|| {
            let path = book_dir.join(COVER_FILE);
            CoverImage {
                kind: CoverKind::Local,
                url: path.to_string_lossy().into_owned(),
                local_path: Some(path),
            }
        });

        books.push(Book {
            author_list: authors.remove(&id).unwrap_or_default(),
            identifier_list: identifiers.remove(&id).unwrap_or_default(),
            title: get(&row, "title")?,
            sortable_title: get(&row, "sort")?,
            id: BookId::from_string(id),
            file_list,
            cover_image,
        });
    }

    Ok(books)
}

fn get<'r, T>(row: &'r sqlx::sqlite::SqliteRow, column: &str) -> Result<T, AppError>
where
    T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(column)
        .map_err(|e| AppError::database(format!("Failed to read column '{}'", column), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::connect_in_memory;
    use crate::queries::authors::{create_authors, delete_author};

    fn record(id: &str, title: &str, authors: &[&str]) -> NewBookRecord {
        NewBookRecord {
            id: BookId::from(id),
            title: title.to_string(),
            sortable_title: None,
            relative_dir: format!("{}/{} ({})", authors.first().unwrap_or(&"Unknown"), title, id),
            file_name: title.to_string(),
            file_type: FileType::Epub,
            authors: authors.iter().map(|a| NewAuthor::from_name(*a)).collect(),
            identifiers: vec![Identifier::new("isbn", "9780141439518")],
            tags: vec!["Classic".to_string(), "classic ".to_string()],
            publisher: None,
            language: Some("eng".to_string()),
            publication_date: None,
            has_cover: false,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_book() -> Result<(), AppError> {
        let pool = connect_in_memory().await?;
        let root = Path::new("/library");
        create_book(&pool, &record("1", "Emma", &["Jane Austen"])).await?;

        let book = get_book(&pool, root, &BookId::from("1")).await?;
        assert_eq!(book.title, "Emma");
        assert_eq!(book.author_list.len(), 1);
        assert_eq!(book.author_list[0].sortable_name, "Austen, Jane");
        assert_eq!(book.identifier("isbn"), Some("9780141439518"));
        assert_eq!(
            book.primary_file().map(|f| f.location()),
            Some("/library/Jane Austen/Emma (1)/Emma.epub".to_string())
        );
        assert_eq!(book.primary_file().map(|f| f.mime_type()), Some("application/epub+zip"));
        assert!(book.cover_image.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_get_missing_book() -> Result<(), AppError> {
        let pool = connect_in_memory().await?;
        let result = get_book(&pool, Path::new("/"), &BookId::from("404")).await;
        assert!(matches!(result, Err(AppError::RecordNotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_list_books_keeps_author_order() -> Result<(), AppError> {
        let pool = connect_in_memory().await?;
        create_book(&pool, &record("1", "Good Omens", &["Terry Pratchett", "Neil Gaiman"])).await?;
        create_book(&pool, &record("2", "Coraline", &["Neil Gaiman"])).await?;

        let books = list_books(&pool, Path::new("/library")).await?;
        assert_eq!(books.len(), 2);
        assert_eq!(books[0].title, "Coraline");

        let omens = &books[1];
        let names: Vec<_> = omens.author_list.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Terry Pratchett", "Neil Gaiman"]);

        // Shared author is stored once
        let authors: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM authors")
            .fetch_one(&pool)
            .await
            .map_err(|e| AppError::database("count", e))?;
        assert_eq!(authors, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_cover_path() -> Result<(), AppError> {
        let pool = connect_in_memory().await?;
        let mut with_cover = record("1", "Emma", &["Jane Austen"]);
        with_cover.has_cover = true;
        create_book(&pool, &with_cover).await?;

        let book = get_book(&pool, Path::new("/library"), &BookId::from("1")).await?;
        let cover = book.cover_image.expect("cover");
        assert_eq!(cover.kind, CoverKind::Local);
        assert_eq!(
            cover.local_path,
            Some(PathBuf::from("/library/Jane Austen/Emma (1)/cover.jpg"))
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_tags_are_deduplicated() -> Result<(), AppError> {
        let pool = connect_in_memory().await?;
        create_book(&pool, &record("1", "Emma", &["Jane Austen"])).await?;

        // Names are trimmed; case is significant
        let tags = book_tags(&pool, &BookId::from("1")).await?;
        assert_eq!(tags, vec!["Classic".to_string(), "classic".to_string()]);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_book_title_and_authors() -> Result<(), AppError> {
        let pool = connect_in_memory().await?;
        create_book(&pool, &record("1", "Emma", &["Jane Austen"])).await?;
        let authors = create_authors(
            &pool,
            &[NewAuthor::from_name("Mary Shelley"), NewAuthor::from_name("Jane Austen")],
        )
        .await?;

        let update = BookUpdate {
            title: Some("Emma: A Novel".to_string()),
            sortable_title: Some("Emma".to_string()),
            author_id_list: Some(authors.iter().map(|a| a.id.clone()).collect()),
        };
        update_book(&pool, &BookId::from("1"), &update).await?;

        let book = get_book(&pool, Path::new("/"), &BookId::from("1")).await?;
        assert_eq!(book.title, "Emma: A Novel");
        assert_eq!(book.sort_title(), "Emma");
        let names: Vec<_> = book.author_list.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Mary Shelley", "Jane Austen"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_missing_book() -> Result<(), AppError> {
        let pool = connect_in_memory().await?;
        let result = update_book(&pool, &BookId::from("404"), &BookUpdate::title("x")).await;
        assert!(matches!(result, Err(AppError::RecordNotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_deleting_author_unlinks_books() -> Result<(), AppError> {
        let pool = connect_in_memory().await?;
        create_book(&pool, &record("1", "Emma", &["Jane Austen"])).await?;
        let book = get_book(&pool, Path::new("/"), &BookId::from("1")).await?;

        delete_author(&pool, &book.author_list[0].id).await?;

        let book = get_book(&pool, Path::new("/"), &BookId::from("1")).await?;
        assert!(book.author_list.is_empty());
        Ok(())
    }
}
