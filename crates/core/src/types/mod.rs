//! Domain types for Bookshelf
//!
//! - `book`: Book, attached files, covers and identifiers
//! - `author`: Author records and patches
//! - `file_type`: E-book formats
//! - `connection`: Backend variant tags
//! - `import`: Importable files and their best-guess metadata
//! - `common`: Shared traits and utilities

mod author;
mod book;
mod common;
mod connection;
mod file_type;
mod import;

pub use author::{sortable_name_for, Author, AuthorId, AuthorUpdate, NewAuthor};
pub use book::{Book, BookFile, BookId, BookUpdate, CoverImage, CoverKind, Identifier};
pub use common::{Timestamp, Validator};
pub use connection::ConnectionKind;
pub use file_type::FileType;
pub use import::{DeviceTarget, ImportableBookMetadata, ImportableFile};
