//! Client backed by the native host process

use crate::contract::LibraryClient;
use crate::error::{ClientError, ClientResult};
use crate::host::{
    AuthorArgs, CommandHost, CreateAuthorsArgs, FilePathArgs, HostCommand, IdentifierArgs,
    ImportableFileArgs, LibraryArgs, MetadataArgs, SendToDeviceArgs, UpdateAuthorArgs,
    UpdateBookArgs,
};
use crate::path_cache::BookPathCache;
use async_trait::async_trait;
use bookshelf_core::{
    Author, AuthorId, AuthorUpdate, Book, BookId, BookUpdate, ConnectionKind, DeviceTarget,
    FileType, ImportableBookMetadata, ImportableFile, NewAuthor,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Forwards every operation to a [`CommandHost`]
pub struct LocalClient {
    host: Arc<dyn CommandHost>,
    library_root: PathBuf,
    paths: BookPathCache,
}

impl LocalClient {
    /// Client for the library at `library_root`, without asking the host first
    pub fn new(host: Arc<dyn CommandHost>, library_root: impl Into<PathBuf>) -> Self {
        Self {
            host,
            library_root: library_root.into(),
            paths: BookPathCache::new(),
        }
    }

    /// Client for an existing library, validated by the host
    pub async fn connect(
        host: Arc<dyn CommandHost>,
        library_root: impl Into<PathBuf>,
    ) -> ClientResult<Self> {
        let library_root = library_root.into();
        if !Self::validate_library_path(host.as_ref(), &library_root).await? {
            return Err(ClientError::InvalidConnection(format!(
                "{} is not a library",
                library_root.display()
            )));
        }
        Ok(Self::new(host, library_root))
    }

    /// Asks the host whether `path` holds a library
    pub async fn validate_library_path(host: &dyn CommandHost, path: &Path) -> ClientResult<bool> {
        call(
            host,
            HostCommand::ValidateLibraryPath,
            LibraryArgs {
                library_root: path.to_path_buf(),
            },
        )
        .await
    }

    /// Asks the host to create an empty library at `path`
    pub async fn create_library(host: &dyn CommandHost, path: &Path) -> ClientResult<()> {
        call(
            host,
            HostCommand::CreateLibrary,
            LibraryArgs {
                library_root: path.to_path_buf(),
            },
        )
        .await
    }

    pub fn library_root(&self) -> &Path {
        &self.library_root
    }

    async fn call<A, T>(&self, command: HostCommand, args: A) -> ClientResult<T>
    where
        A: Serialize + Send,
        T: DeserializeOwned,
    {
        call(self.host.as_ref(), command, args).await
    }

    fn root(&self) -> PathBuf {
        self.library_root.clone()
    }
}

async fn call<A, T>(host: &dyn CommandHost, command: HostCommand, args: A) -> ClientResult<T>
where
    A: Serialize + Send,
    T: DeserializeOwned,
{
    let args = serde_json::to_value(args).map_err(|e| ClientError::decode(command, e))?;
    log::trace!("Invoking host command {}", command);

    let reply = host
        .invoke(command, args)
        .await
        .map_err(|source| ClientError::Host { command, source })?;

    serde_json::from_value(reply).map_err(|e| ClientError::decode(command, e))
}

#[async_trait]
impl LibraryClient for LocalClient {
    fn kind(&self) -> ConnectionKind {
        ConnectionKind::Local
    }

    async fn list_books(&self) -> ClientResult<Vec<Book>> {
        let books: Vec<Book> = self
            .call(
                HostCommand::ListBooks,
                LibraryArgs {
                    library_root: self.root(),
                },
            )
            .await?;
        self.paths.replace(&books);
        Ok(books)
    }

    async fn list_authors(&self) -> ClientResult<Vec<Author>> {
        self.call(
            HostCommand::ListAuthors,
            LibraryArgs {
                library_root: self.root(),
            },
        )
        .await
    }

    async fn update_book(&self, id: &BookId, update: &BookUpdate) -> ClientResult<()> {
        self.call(
            HostCommand::UpdateBook,
            UpdateBookArgs {
                library_root: self.root(),
                book_id: id.clone(),
                update: update.clone(),
            },
        )
        .await
    }

    async fn update_author(&self, id: &AuthorId, update: &AuthorUpdate) -> ClientResult<()> {
        self.call(
            HostCommand::UpdateAuthor,
            UpdateAuthorArgs {
                library_root: self.root(),
                author_id: id.clone(),
                update: update.clone(),
            },
        )
        .await
    }

    async fn create_authors(&self, authors: &[NewAuthor]) -> ClientResult<Vec<Author>> {
        self.call(
            HostCommand::CreateAuthors,
            CreateAuthorsArgs {
                library_root: self.root(),
                authors: authors.to_vec(),
            },
        )
        .await
    }

    async fn delete_author(&self, id: &AuthorId) -> ClientResult<()> {
        self.call(
            HostCommand::DeleteAuthor,
            AuthorArgs {
                library_root: self.root(),
                author_id: id.clone(),
            },
        )
        .await
    }

    async fn upsert_book_identifier(
        &self,
        book_id: &BookId,
        label: &str,
        value: &str,
    ) -> ClientResult<()> {
        self.call(
            HostCommand::UpsertBookIdentifier,
            IdentifierArgs {
                library_root: self.root(),
                book_id: book_id.clone(),
                label: label.to_string(),
                value: Some(value.to_string()),
            },
        )
        .await
    }

    async fn delete_book_identifier(&self, book_id: &BookId, label: &str) -> ClientResult<()> {
        self.call(
            HostCommand::DeleteBookIdentifier,
            IdentifierArgs {
                library_root: self.root(),
                book_id: book_id.clone(),
                label: label.to_string(),
                value: None,
            },
        )
        .await
    }

    async fn send_to_device(&self, book: &Book, target: &DeviceTarget) -> ClientResult<()> {
        self.call(
            HostCommand::SendBookToDevice,
            SendToDeviceArgs {
                library_root: self.root(),
                book: book.clone(),
                target: target.clone(),
            },
        )
        .await
    }

    async fn check_file_importable(&self, path: &Path) -> ClientResult<Option<ImportableFile>> {
        self.call(
            HostCommand::CheckFileImportable,
            FilePathArgs {
                library_root: self.root(),
                path: path.to_path_buf(),
            },
        )
        .await
    }

    async fn get_importable_file_metadata(
        &self,
        file: &ImportableFile,
    ) -> ClientResult<Option<ImportableBookMetadata>> {
        self.call(
            HostCommand::GetImportableFileMetadata,
            ImportableFileArgs {
                library_root: self.root(),
                file: file.clone(),
            },
        )
        .await
    }

    async fn add_importable_file_by_metadata(
        &self,
        metadata: &ImportableBookMetadata,
    ) -> ClientResult<Option<BookId>> {
        self.call(
            HostCommand::AddBookByMetadata,
            MetadataArgs {
                library_root: self.root(),
                metadata: metadata.clone(),
            },
        )
        .await
    }

    async fn list_valid_file_types(&self) -> ClientResult<Vec<FileType>> {
        self.call(
            HostCommand::ListValidFileTypes,
            LibraryArgs {
                library_root: self.root(),
            },
        )
        .await
    }

    fn cover_path_for_book(&self, id: &BookId) -> Option<String> {
        self.paths.cover_path(id)
    }

    fn default_file_path_for_book(&self, id: &BookId) -> Option<String> {
        self.paths.default_file_path(id)
    }
}
