use bookshelf_client::ClientError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error(transparent)]
    Client(#[from] ClientError),

    /// A mutation was attempted before a library finished initializing
    #[error("No library is ready")]
    NotReady,

    /// A single-file dialog came back with several files
    #[error("Expected one file, {count} were selected")]
    MultipleSelection { count: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LibraryError>;
pub type LibraryResult<T> = std::result::Result<T, LibraryError>;
