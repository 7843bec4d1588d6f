//! The native host command boundary
//!
//! A desktop shell answers a fixed set of named commands, each taking one
//! JSON argument record and returning one JSON result. [`CommandHost`] is
//! that boundary; the argument records are declared here so both sides of
//! it agree on their shape.

use async_trait::async_trait;
use bookshelf_core::{
    AuthorId, AuthorUpdate, Book, BookId, BookUpdate, DeviceTarget, ImportableBookMetadata,
    ImportableFile, NewAuthor,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Every command the host understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostCommand {
    ListBooks,
    ListAuthors,
    UpdateBook,
    UpdateAuthor,
    CreateAuthors,
    DeleteAuthor,
    UpsertBookIdentifier,
    DeleteBookIdentifier,
    CheckFileImportable,
    GetImportableFileMetadata,
    AddBookByMetadata,
    ListValidFileTypes,
    SendBookToDevice,
    ValidateLibraryPath,
    CreateLibrary,
}

impl HostCommand {
    pub const ALL: [HostCommand; 15] = [
        Self::ListBooks,
        Self::ListAuthors,
        Self::UpdateBook,
        Self::UpdateAuthor,
        Self::CreateAuthors,
        Self::DeleteAuthor,
        Self::UpsertBookIdentifier,
        Self::DeleteBookIdentifier,
        Self::CheckFileImportable,
        Self::GetImportableFileMetadata,
        Self::AddBookByMetadata,
        Self::ListValidFileTypes,
        Self::SendBookToDevice,
        Self::ValidateLibraryPath,
        Self::CreateLibrary,
    ];

    /// Wire name of the command
    pub fn name(&self) -> &'static str {
        match self {
            Self::ListBooks => "list_books",
            Self::ListAuthors => "list_authors",
            Self::UpdateBook => "update_book",
            Self::UpdateAuthor => "update_author",
            Self::CreateAuthors => "create_authors",
            Self::DeleteAuthor => "delete_author",
            Self::UpsertBookIdentifier => "upsert_book_identifier",
            Self::DeleteBookIdentifier => "delete_book_identifier",
            Self::CheckFileImportable => "check_file_importable",
            Self::GetImportableFileMetadata => "get_importable_file_metadata",
            Self::AddBookByMetadata => "add_book_by_metadata",
            Self::ListValidFileTypes => "list_valid_file_types",
            Self::SendBookToDevice => "send_book_to_device",
            Self::ValidateLibraryPath => "validate_library_path",
            Self::CreateLibrary => "create_library",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|command| command.name() == name)
    }
}

impl fmt::Display for HostCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Failure reported by the host for one command
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct HostError {
    pub message: String,
}

impl HostError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A process that executes host commands
#[async_trait]
pub trait CommandHost: Send + Sync {
    async fn invoke(&self, command: HostCommand, args: Value) -> Result<Value, HostError>;
}

// Argument records, one shape per command

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryArgs {
    pub library_root: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBookArgs {
    pub library_root: PathBuf,
    pub book_id: BookId,
    pub update: BookUpdate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAuthorArgs {
    pub library_root: PathBuf,
    pub author_id: AuthorId,
    pub update: AuthorUpdate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAuthorsArgs {
    pub library_root: PathBuf,
    pub authors: Vec<NewAuthor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorArgs {
    pub library_root: PathBuf,
    pub author_id: AuthorId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifierArgs {
    pub library_root: PathBuf,
    pub book_id: BookId,
    pub label: String,
    /// Absent for deletions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilePathArgs {
    pub library_root: PathBuf,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportableFileArgs {
    pub library_root: PathBuf,
    pub file: ImportableFile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataArgs {
    pub library_root: PathBuf,
    pub metadata: ImportableBookMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendToDeviceArgs {
    pub library_root: PathBuf,
    pub book: Book,
    pub target: DeviceTarget,
}
