//! In-process command host serving library directories on this machine

use crate::contract::LibraryClient;
use crate::embedded::EmbeddedClient;
use crate::error::ClientError;
use crate::host::{
    AuthorArgs, CommandHost, CreateAuthorsArgs, FilePathArgs, HostCommand, HostError,
    IdentifierArgs, ImportableFileArgs, LibraryArgs, MetadataArgs, SendToDeviceArgs,
    UpdateAuthorArgs, UpdateBookArgs,
};
use async_trait::async_trait;
use bookshelf_core::{Book, BookFile, DeviceTarget};
use bookshelf_database::is_library_root;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Answers host commands against embedded catalogs, one per library root
///
/// This is what a desktop shell runs on its side of the command boundary.
/// Catalogs are opened on first use and kept open.
#[derive(Default)]
pub struct CatalogHost {
    libraries: Mutex<HashMap<PathBuf, Arc<EmbeddedClient>>>,
}

impl CatalogHost {
    pub fn new() -> Self {
        Self::default()
    }

    async fn library(&self, root: &Path) -> Result<Arc<EmbeddedClient>, HostError> {
        let mut libraries = self.libraries.lock().await;
        if let Some(client) = libraries.get(root) {
            return Ok(Arc::clone(client));
        }

        let client = Arc::new(EmbeddedClient::open(root).await.map_err(host_error)?);
        libraries.insert(root.to_path_buf(), Arc::clone(&client));
        Ok(client)
    }

    async fn create_library(&self, root: &Path) -> Result<(), HostError> {
        let mut libraries = self.libraries.lock().await;
        if !libraries.contains_key(root) {
            let client = EmbeddedClient::create(root).await.map_err(host_error)?;
            libraries.insert(root.to_path_buf(), Arc::new(client));
        }
        Ok(())
    }

    async fn dispatch(&self, command: HostCommand, args: Value) -> Result<Value, HostError> {
        match command {
            HostCommand::ListBooks => {
                let args: LibraryArgs = parse(command, args)?;
                let library = self.library(&args.library_root).await?;
                reply(library.list_books().await)
            }
            HostCommand::ListAuthors => {
                let args: LibraryArgs = parse(command, args)?;
                let library = self.library(&args.library_root).await?;
                reply(library.list_authors().await)
            }
            HostCommand::UpdateBook => {
                let args: UpdateBookArgs = parse(command, args)?;
                let library = self.library(&args.library_root).await?;
                reply(library.update_book(&args.book_id, &args.update).await)
            }
            HostCommand::UpdateAuthor => {
                let args: UpdateAuthorArgs = parse(command, args)?;
                let library = self.library(&args.library_root).await?;
                reply(library.update_author(&args.author_id, &args.update).await)
            }
            HostCommand::CreateAuthors => {
                let args: CreateAuthorsArgs = parse(command, args)?;
                let library = self.library(&args.library_root).await?;
                reply(library.create_authors(&args.authors).await)
            }
            HostCommand::DeleteAuthor => {
                let args: AuthorArgs = parse(command, args)?;
                let library = self.library(&args.library_root).await?;
                reply(library.delete_author(&args.author_id).await)
            }
            HostCommand::UpsertBookIdentifier => {
                let args: IdentifierArgs = parse(command, args)?;
                let value = args
                    .value
                    .ok_or_else(|| HostError::new("upsert_book_identifier requires a value"))?;
                let library = self.library(&args.library_root).await?;
                reply(
                    library
                        .upsert_book_identifier(&args.book_id, &args.label, &value)
                        .await,
                )
            }
            HostCommand::DeleteBookIdentifier => {
                let args: IdentifierArgs = parse(command, args)?;
                let library = self.library(&args.library_root).await?;
                reply(
                    library
                        .delete_book_identifier(&args.book_id, &args.label)
                        .await,
                )
            }
            HostCommand::CheckFileImportable => {
                let args: FilePathArgs = parse(command, args)?;
                let library = self.library(&args.library_root).await?;
                reply(library.check_file_importable(&args.path).await)
            }
            HostCommand::GetImportableFileMetadata => {
                let args: ImportableFileArgs = parse(command, args)?;
                let library = self.library(&args.library_root).await?;
                reply(library.get_importable_file_metadata(&args.file).await)
            }
            HostCommand::AddBookByMetadata => {
                let args: MetadataArgs = parse(command, args)?;
                let library = self.library(&args.library_root).await?;
                reply(library.add_importable_file_by_metadata(&args.metadata).await)
            }
            HostCommand::ListValidFileTypes => {
                let args: LibraryArgs = parse(command, args)?;
                let library = self.library(&args.library_root).await?;
                reply(library.list_valid_file_types().await)
            }
            HostCommand::SendBookToDevice => {
                let args: SendToDeviceArgs = parse(command, args)?;
                send_to_device(&args.book, &args.target).await?;
                Ok(Value::Null)
            }
            HostCommand::ValidateLibraryPath => {
                let args: LibraryArgs = parse(command, args)?;
                Ok(Value::Bool(is_library_root(&args.library_root)))
            }
            HostCommand::CreateLibrary => {
                let args: LibraryArgs = parse(command, args)?;
                self.create_library(&args.library_root).await?;
                Ok(Value::Null)
            }
        }
    }
}

#[async_trait]
impl CommandHost for CatalogHost {
    async fn invoke(&self, command: HostCommand, args: Value) -> Result<Value, HostError> {
        let result = self.dispatch(command, args).await;
        if let Err(e) = &result {
            log::warn!("Host command {} failed: {}", command, e);
        }
        result
    }
}

/// Copies the book's first local file onto the device
async fn send_to_device(book: &Book, target: &DeviceTarget) -> Result<(), HostError> {
    let source = book
        .file_list
        .iter()
        .find_map(|file| match file {
            BookFile::Local { path, .. } => Some(path.clone()),
            BookFile::Remote { .. } => None,
        })
        .ok_or_else(|| HostError::new(format!("Book {} has no local file", book.id)))?;

    let DeviceTarget::ExternalDrive { path: device } = target;
    let file_name = source
        .file_name()
        .ok_or_else(|| HostError::new(format!("Invalid file path {}", source.display())))?;
    let destination = device.join(file_name);

    tokio::fs::copy(&source, &destination)
        .await
        .map_err(|e| HostError::new(format!("Copy to {} failed: {}", destination.display(), e)))?;
    log::info!("Sent '{}' to {}", book.title, device.display());
    Ok(())
}

fn parse<A: DeserializeOwned>(command: HostCommand, args: Value) -> Result<A, HostError> {
    serde_json::from_value(args)
        .map_err(|e| HostError::new(format!("Invalid arguments for {}: {}", command, e)))
}

fn reply<T: Serialize>(result: Result<T, ClientError>) -> Result<Value, HostError> {
    let value = result.map_err(host_error)?;
    serde_json::to_value(value).map_err(|e| HostError::new(e.to_string()))
}

fn host_error(error: ClientError) -> HostError {
    HostError::new(error.to_string())
}
