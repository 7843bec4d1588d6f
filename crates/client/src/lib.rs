//! Bookshelf library clients
//!
//! [`LibraryClient`] is one interface over three kinds of catalog:
//!
//! - [`LocalClient`]: commands sent to a native host process
//! - [`RemoteClient`]: a content server spoken to over HTTP
//! - [`EmbeddedClient`]: a library directory opened in-process
//!
//! A session picks one through [`LibraryBackend::connect`], usually via a
//! [`ClientFactory`] fed with a configured [`LibraryPath`](bookshelf_config::LibraryPath).

mod backend;
mod catalog_host;
mod contract;
mod embedded;
mod error;
mod host;
mod local;
mod path_cache;
mod remote;

pub use backend::{ClientFactory, ConnectionFactory, LibraryBackend, LibraryConnection};
pub use catalog_host::CatalogHost;
pub use contract::LibraryClient;
pub use embedded::EmbeddedClient;
pub use error::{ClientError, ClientResult};
pub use host::{
    AuthorArgs, CommandHost, CreateAuthorsArgs, FilePathArgs, HostCommand, HostError,
    IdentifierArgs, ImportableFileArgs, LibraryArgs, MetadataArgs, SendToDeviceArgs,
    UpdateAuthorArgs, UpdateBookArgs,
};
pub use local::LocalClient;
pub use path_cache::BookPathCache;
pub use remote::RemoteClient;
