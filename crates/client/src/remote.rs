//! Client for a content server reached over HTTP

use crate::contract::LibraryClient;
use crate::error::{ClientError, ClientResult};
use crate::path_cache::BookPathCache;
use async_trait::async_trait;
use bookshelf_core::{
    Author, AuthorId, AuthorUpdate, Book, BookFile, BookId, BookUpdate, ConnectionKind,
    CoverImage, CoverKind, DeviceTarget, FileType, Identifier, ImportableBookMetadata,
    ImportableFile, NewAuthor,
};
use bookshelf_network::{Client, ClientConfig, Url};
use serde::Deserialize;
use std::path::Path;

/// Book record as served by `GET {base}/books`
#[derive(Debug, Deserialize)]
struct RemoteBook {
    id: BookId,
    title: String,
    #[serde(default)]
    sortable_title: Option<String>,
    #[serde(default)]
    author_list: Vec<Author>,
    #[serde(default)]
    file_list: Vec<RemoteFile>,
    #[serde(default)]
    cover_url: Option<String>,
    #[serde(default)]
    identifier_list: Vec<Identifier>,
}

#[derive(Debug, Deserialize)]
struct RemoteFile {
    url: String,
    mime_type: String,
}

impl RemoteBook {
    fn into_book(self, base_url: &str) -> Book {
        Book {
            id: self.id,
            title: self.title,
            sortable_title: self.sortable_title,
            author_list: self.author_list,
            file_list: self
                .file_list
                .into_iter()
                .map(|file| BookFile::Remote {
                    url: resolve_url(base_url, &file.url),
                    mime_type: file.mime_type,
                })
                .collect(),
            cover_image: self.cover_url.map(|url| CoverImage {
                kind: CoverKind::Remote,
                url: resolve_url(base_url, &url),
                local_path: None,
            }),
            identifier_list: self.identifier_list,
        }
    }
}

/// Absolute urls pass through; anything else is taken relative to the server root
fn resolve_url(base_url: &str, url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("{}/{}", base_url, url.trim_start_matches('/'))
    }
}

/// Reads and patches books on a content server
///
/// Only book listing and book updates exist on the server side; every other
/// operation fails with [`ClientError::Unsupported`].
pub struct RemoteClient {
    http: Client,
    base_url: String,
    base: Url,
    paths: BookPathCache,
}

impl RemoteClient {
    pub fn new(base_url: impl Into<String>) -> ClientResult<Self> {
        Self::with_config(base_url, ClientConfig::default())
    }

    pub fn with_config(base_url: impl Into<String>, config: ClientConfig) -> ClientResult<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ClientError::InvalidConnection(format!(
                "'{}' is not an http(s) url",
                base_url
            )));
        }

        let base = Url::parse(&base_url).map_err(|e| {
            ClientError::InvalidConnection(format!("'{}' is not a valid url: {}", base_url, e))
        })?;
        if base.cannot_be_a_base() {
            return Err(ClientError::InvalidConnection(format!(
                "'{}' cannot hold book paths",
                base_url
            )));
        }

        Ok(Self {
            http: Client::with_config(config)?,
            base_url,
            base,
            paths: BookPathCache::new(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `{base}/books/{id}` with the id as one percent-encoded path segment
    fn book_url(&self, id: &BookId) -> ClientResult<String> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ClientError::InvalidConnection(format!("'{}' cannot hold book paths", self.base_url))
            })?
            .pop_if_empty()
            .push("books")
            .push(id.as_str());
        Ok(url.into())
    }

    fn unsupported<T>(&self, operation: &'static str) -> ClientResult<T> {
        log::debug!("Rejecting {} on remote library {}", operation, self.base_url);
        Err(ClientError::unsupported(ConnectionKind::Remote, operation))
    }
}

#[async_trait]
impl LibraryClient for RemoteClient {
    fn kind(&self) -> ConnectionKind {
        ConnectionKind::Remote
    }

    async fn list_books(&self) -> ClientResult<Vec<Book>> {
        let url = format!("{}/books", self.base_url);
        let remote: Vec<RemoteBook> = self.http.get_json(&url).await?;

        let books: Vec<Book> = remote
            .into_iter()
            .map(|book| book.into_book(&self.base_url))
            .collect();
        self.paths.replace(&books);
        Ok(books)
    }

    async fn list_authors(&self) -> ClientResult<Vec<Author>> {
        self.unsupported("list_authors")
    }

    async fn update_book(&self, id: &BookId, update: &BookUpdate) -> ClientResult<()> {
        let url = self.book_url(id)?;
        self.http.patch_json(&url, update).await?;
        Ok(())
    }

    async fn update_author(&self, _id: &AuthorId, _update: &AuthorUpdate) -> ClientResult<()> {
        self.unsupported("update_author")
    }

    async fn create_authors(&self, _authors: &[NewAuthor]) -> ClientResult<Vec<Author>> {
        self.unsupported("create_authors")
    }

    async fn delete_author(&self, _id: &AuthorId) -> ClientResult<()> {
        self.unsupported("delete_author")
    }

    async fn upsert_book_identifier(
        &self,
        _book_id: &BookId,
        _label: &str,
        _value: &str,
    ) -> ClientResult<()> {
        self.unsupported("upsert_book_identifier")
    }

    async fn delete_book_identifier(&self, _book_id: &BookId, _label: &str) -> ClientResult<()> {
        self.unsupported("delete_book_identifier")
    }

    async fn send_to_device(&self, _book: &Book, _target: &DeviceTarget) -> ClientResult<()> {
        self.unsupported("send_to_device")
    }

    async fn check_file_importable(&self, _path: &Path) -> ClientResult<Option<ImportableFile>> {
        self.unsupported("check_file_importable")
    }

    async fn get_importable_file_metadata(
        &self,
        _file: &ImportableFile,
    ) -> ClientResult<Option<ImportableBookMetadata>> {
        self.unsupported("get_importable_file_metadata")
    }

    async fn add_importable_file_by_metadata(
        &self,
        _metadata: &ImportableBookMetadata,
    ) -> ClientResult<Option<BookId>> {
        self.unsupported("add_importable_file_by_metadata")
    }

    async fn list_valid_file_types(&self) -> ClientResult<Vec<FileType>> {
        self.unsupported("list_valid_file_types")
    }

    fn cover_path_for_book(&self, id: &BookId) -> Option<String> {
        self.paths.cover_path(id)
    }

    fn default_file_path_for_book(&self, id: &BookId) -> Option<String> {
        self.paths.default_file_path(id)
    }
}
