//! The uniform library client contract

use crate::error::ClientResult;
use async_trait::async_trait;
use bookshelf_core::{
    Author, AuthorId, AuthorUpdate, Book, BookId, BookUpdate, ConnectionKind, DeviceTarget,
    FileType, ImportableBookMetadata, ImportableFile, NewAuthor,
};
use std::path::Path;

/// Operations over a book/author catalog, whatever backend serves it
///
/// Every async operation may fail; a failure means the catalog state is
/// unknown. Backends that cannot perform an operation fail with
/// [`ClientError::Unsupported`](crate::ClientError::Unsupported) instead of
/// doing nothing.
///
/// The two synchronous lookups answer from a cache that each successful
/// [`list_books`](Self::list_books) replaces wholesale. They return `None`
/// for books absent from the last listing, books without a cover, and books
/// without a file.
#[async_trait]
pub trait LibraryClient: Send + Sync {
    /// Which backend variant this is
    fn kind(&self) -> ConnectionKind;

    async fn list_books(&self) -> ClientResult<Vec<Book>>;

    async fn list_authors(&self) -> ClientResult<Vec<Author>>;

    async fn update_book(&self, id: &BookId, update: &BookUpdate) -> ClientResult<()>;

    async fn update_author(&self, id: &AuthorId, update: &AuthorUpdate) -> ClientResult<()>;

    /// Creates authors, returning the stored records in input order
    async fn create_authors(&self, authors: &[NewAuthor]) -> ClientResult<Vec<Author>>;

    async fn delete_author(&self, id: &AuthorId) -> ClientResult<()>;

    async fn upsert_book_identifier(
        &self,
        book_id: &BookId,
        label: &str,
        value: &str,
    ) -> ClientResult<()>;

    async fn delete_book_identifier(&self, book_id: &BookId, label: &str) -> ClientResult<()>;

    async fn send_to_device(&self, book: &Book, target: &DeviceTarget) -> ClientResult<()>;

    /// `None` when the file cannot be imported
    async fn check_file_importable(&self, path: &Path) -> ClientResult<Option<ImportableFile>>;

    async fn get_importable_file_metadata(
        &self,
        file: &ImportableFile,
    ) -> ClientResult<Option<ImportableBookMetadata>>;

    /// Adds a book from import metadata; `None` when nothing was added
    async fn add_importable_file_by_metadata(
        &self,
        metadata: &ImportableBookMetadata,
    ) -> ClientResult<Option<BookId>>;

    async fn list_valid_file_types(&self) -> ClientResult<Vec<FileType>>;

    /// Cover location (path or url) from the last listing
    fn cover_path_for_book(&self, id: &BookId) -> Option<String>;

    /// Primary file location (path or url) from the last listing
    fn default_file_path_for_book(&self, id: &BookId) -> Option<String>;
}
