//! Interactive import: pick a file, guess its metadata, add it to the library

use crate::error::{LibraryError, LibraryResult};
use crate::store::LibraryStore;
use async_trait::async_trait;
use bookshelf_client::LibraryClient;
use bookshelf_core::{BookId, FileType, ImportableBookMetadata};
use console::{style, Term};
use std::path::PathBuf;

/// What came back from a file or directory dialog
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogSelection {
    /// The user cancelled
    Nothing,
    Single(PathBuf),
    Multiple(Vec<PathBuf>),
}

impl DialogSelection {
    /// The one selected path; several paths are a caller error
    pub fn into_single(self) -> LibraryResult<Option<PathBuf>> {
        match self {
            Self::Nothing => Ok(None),
            Self::Single(path) => Ok(Some(path)),
            Self::Multiple(paths) => Err(LibraryError::MultipleSelection { count: paths.len() }),
        }
    }
}

/// A named group of extensions offered by a file dialog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFilter {
    pub name: String,
    pub extensions: Vec<String>,
}

impl FileFilter {
    pub fn for_file_types(name: impl Into<String>, file_types: &[FileType]) -> Self {
        Self {
            name: name.into(),
            extensions: file_types
                .iter()
                .map(|file_type| file_type.extension().to_string())
                .collect(),
        }
    }
}

/// The operating system's file dialogs
#[async_trait]
pub trait FilePicker: Send + Sync {
    async fn pick_file(&self, filters: &[FileFilter]) -> LibraryResult<DialogSelection>;

    async fn pick_directory(&self) -> LibraryResult<DialogSelection>;
}

/// Asks for a book file and returns its best-guess metadata
///
/// `Ok(None)` when the user cancels or the file cannot be imported. Nothing
/// is added to the library; see [`commit_import`].
pub async fn prompt_to_add_book(
    client: &dyn LibraryClient,
    picker: &dyn FilePicker,
) -> LibraryResult<Option<ImportableBookMetadata>> {
    let file_types = client.list_valid_file_types().await?;
    let filters = [FileFilter::for_file_types("E-books", &file_types)];

    let Some(path) = picker.pick_file(&filters).await?.into_single()? else {
        return Ok(None);
    };

    let Some(file) = client.check_file_importable(&path).await? else {
        log::info!("{} cannot be imported", path.display());
        return Ok(None);
    };

    Ok(client.get_importable_file_metadata(&file).await?)
}

/// Adds a book picked with [`prompt_to_add_book`] to the ready library
pub async fn commit_import(
    store: &LibraryStore,
    metadata: &ImportableBookMetadata,
) -> LibraryResult<Option<BookId>> {
    store.add_book(metadata).await
}

/// Asks where a library lives, for first runs
pub async fn prompt_for_library_directory(picker: &dyn FilePicker) -> LibraryResult<Option<PathBuf>> {
    picker.pick_directory().await?.into_single()
}

/// Reads paths typed (or dropped) into the terminal
#[derive(Debug, Clone)]
pub struct TerminalPicker {
    term: Term,
}

impl TerminalPicker {
    pub fn new() -> Self {
        Self {
            term: Term::stderr(),
        }
    }

    async fn prompt(&self, message: String) -> LibraryResult<DialogSelection> {
        let term = self.term.clone();
        let line = tokio::task::spawn_blocking(move || {
            term.write_str(&message)?;
            term.read_line()
        })
        .await
        .map_err(|e| std::io::Error::other(e.to_string()))??;

        Ok(parse_selection(&line))
    }
}

impl Default for TerminalPicker {
    fn default() -> Self {
        Self::new()
    }
}

/// An empty line is a cancel; terminals quote dropped paths
fn parse_selection(line: &str) -> DialogSelection {
    let path = line.trim().trim_matches(|c| c == '"' || c == '\'');
    if path.is_empty() {
        DialogSelection::Nothing
    } else {
        DialogSelection::Single(PathBuf::from(path))
    }
}

#[async_trait]
impl FilePicker for TerminalPicker {
    async fn pick_file(&self, filters: &[FileFilter]) -> LibraryResult<DialogSelection> {
        let extensions: Vec<&str> = filters
            .iter()
            .flat_map(|filter| filter.extensions.iter().map(String::as_str))
            .collect();
        self.prompt(format!(
            "{} ({}), empty to cancel: ",
            style("Book file").bold(),
            extensions.join(", ")
        ))
        .await
    }

    async fn pick_directory(&self) -> LibraryResult<DialogSelection> {
        self.prompt(format!("{}, empty to cancel: ", style("Library directory").bold()))
            .await
    }
}
