//! Tagged dispatch over the backend variants

use crate::contract::LibraryClient;
use crate::embedded::EmbeddedClient;
use crate::error::{ClientError, ClientResult};
use crate::host::CommandHost;
use crate::local::LocalClient;
use crate::remote::RemoteClient;
use async_trait::async_trait;
use bookshelf_config::LibraryPath;
use bookshelf_core::{
    Author, AuthorId, AuthorUpdate, Book, BookId, BookUpdate, ConnectionKind, DeviceTarget,
    FileType, ImportableBookMetadata, ImportableFile, NewAuthor,
};
use bookshelf_network::ClientConfig;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Everything needed to reach one library
#[derive(Clone)]
pub enum LibraryConnection {
    /// Through a native host process
    Local {
        host: Arc<dyn CommandHost>,
        library_root: PathBuf,
    },
    /// A content server at `base_url`
    Remote { base_url: String },
    /// A library directory opened in-process
    Embedded { library_root: PathBuf },
}

impl LibraryConnection {
    pub fn kind(&self) -> ConnectionKind {
        match self {
            Self::Local { .. } => ConnectionKind::Local,
            Self::Remote { .. } => ConnectionKind::Remote,
            Self::Embedded { .. } => ConnectionKind::Embedded,
        }
    }
}

impl fmt::Debug for LibraryConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local { library_root, .. } => f
                .debug_struct("Local")
                .field("library_root", library_root)
                .finish_non_exhaustive(),
            Self::Remote { base_url } => f.debug_struct("Remote").field("base_url", base_url).finish(),
            Self::Embedded { library_root } => f
                .debug_struct("Embedded")
                .field("library_root", library_root)
                .finish(),
        }
    }
}

/// One connected backend, chosen once per session
pub enum LibraryBackend {
    Local(LocalClient),
    Remote(RemoteClient),
    Embedded(EmbeddedClient),
}

impl LibraryBackend {
    /// Builds the backend named by the connection's tag
    pub async fn connect(connection: LibraryConnection, http: &ClientConfig) -> ClientResult<Self> {
        log::info!("Connecting to {:?}", connection);
        Ok(match connection {
            LibraryConnection::Local { host, library_root } => {
                Self::Local(LocalClient::connect(host, library_root).await?)
            }
            LibraryConnection::Remote { base_url } => {
                Self::Remote(RemoteClient::with_config(base_url, http.clone())?)
            }
            LibraryConnection::Embedded { library_root } => {
                Self::Embedded(EmbeddedClient::open(library_root).await?)
            }
        })
    }
}

macro_rules! dispatch {
    ($self:ident, $client:ident => $call:expr) => {
        match $self {
            LibraryBackend::Local($client) => $call,
            LibraryBackend::Remote($client) => $call,
            LibraryBackend::Embedded($client) => $call,
        }
    };
}

#[async_trait]
impl LibraryClient for LibraryBackend {
    fn kind(&self) -> ConnectionKind {
        dispatch!(self, client => client.kind())
    }

    async fn list_books(&self) -> ClientResult<Vec<Book>> {
        dispatch!(self, client => client.list_books().await)
    }

    async fn list_authors(&self) -> ClientResult<Vec<Author>> {
        dispatch!(self, client => client.list_authors().await)
    }

    async fn update_book(&self, id: &BookId, update: &BookUpdate) -> ClientResult<()> {
        dispatch!(self, client => client.update_book(id, update).await)
    }

    async fn update_author(&self, id: &AuthorId, update: &AuthorUpdate) -> ClientResult<()> {
        dispatch!(self, client => client.update_author(id, update).await)
    }

    async fn create_authors(&self, authors: &[NewAuthor]) -> ClientResult<Vec<Author>> {
        dispatch!(self, client => client.create_authors(authors).await)
    }

    async fn delete_author(&self, id: &AuthorId) -> ClientResult<()> {
        dispatch!(self, client => client.delete_author(id).await)
    }

    async fn upsert_book_identifier(
        &self,
        book_id: &BookId,
        label: &str,
        value: &str,
    ) -> ClientResult<()> {
        dispatch!(self, client => client.upsert_book_identifier(book_id, label, value).await)
    }

    async fn delete_book_identifier(&self, book_id: &BookId, label: &str) -> ClientResult<()> {
        dispatch!(self, client => client.delete_book_identifier(book_id, label).await)
    }

    async fn send_to_device(&self, book: &Book, target: &DeviceTarget) -> ClientResult<()> {
        dispatch!(self, client => client.send_to_device(book, target).await)
    }

    async fn check_file_importable(&self, path: &Path) -> ClientResult<Option<ImportableFile>> {
        dispatch!(self, client => client.check_file_importable(path).await)
    }

    async fn get_importable_file_metadata(
        &self,
        file: &ImportableFile,
    ) -> ClientResult<Option<ImportableBookMetadata>> {
        dispatch!(self, client => client.get_importable_file_metadata(file).await)
    }

    async fn add_importable_file_by_metadata(
        &self,
        metadata: &ImportableBookMetadata,
    ) -> ClientResult<Option<BookId>> {
        dispatch!(self, client => client.add_importable_file_by_metadata(metadata).await)
    }

    async fn list_valid_file_types(&self) -> ClientResult<Vec<FileType>> {
        dispatch!(self, client => client.list_valid_file_types().await)
    }

    fn cover_path_for_book(&self, id: &BookId) -> Option<String> {
        dispatch!(self, client => client.cover_path_for_book(id))
    }

    fn default_file_path_for_book(&self, id: &BookId) -> Option<String> {
        dispatch!(self, client => client.default_file_path_for_book(id))
    }
}

/// Produces a connected client for a configured library
#[async_trait]
pub trait ClientFactory: Send + Sync {
    async fn connect(&self, path: &LibraryPath) -> ClientResult<Arc<dyn LibraryClient>>;
}

/// Maps each [`LibraryPath`] onto a [`LibraryBackend`]
///
/// Local libraries need a command host; without one they fail to connect.
#[derive(Clone, Default)]
pub struct ConnectionFactory {
    host: Option<Arc<dyn CommandHost>>,
    http: ClientConfig,
}

impl ConnectionFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_host(mut self, host: Arc<dyn CommandHost>) -> Self {
        self.host = Some(host);
        self
    }

    pub fn with_http_config(mut self, config: ClientConfig) -> Self {
        self.http = config;
        self
    }

    /// The connection a library path describes
    pub fn connection_for(&self, path: &LibraryPath) -> ClientResult<LibraryConnection> {
        match path.connection {
            ConnectionKind::Local => {
                let host = self.host.clone().ok_or_else(|| {
                    ClientError::InvalidConnection(format!(
                        "library '{}' needs a command host",
                        path.display_name
                    ))
                })?;
                Ok(LibraryConnection::Local {
                    host,
                    library_root: PathBuf::from(&path.absolute_path),
                })
            }
            ConnectionKind::Remote => Ok(LibraryConnection::Remote {
                base_url: path.absolute_path.clone(),
            }),
            ConnectionKind::Embedded => Ok(LibraryConnection::Embedded {
                library_root: PathBuf::from(&path.absolute_path),
            }),
        }
    }
}

#[async_trait]
impl ClientFactory for ConnectionFactory {
    async fn connect(&self, path: &LibraryPath) -> ClientResult<Arc<dyn LibraryClient>> {
        let connection = self.connection_for(path)?;
        let backend = LibraryBackend::connect(connection, &self.http).await?;
        Ok(Arc::new(backend))
    }
}
