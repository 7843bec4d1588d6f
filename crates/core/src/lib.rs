//! Bookshelf core: domain types, the shared error taxonomy and the event bus

pub mod error;
pub mod events;
pub mod types;

// Re-export commonly used types
pub use error::{AppError, ErrorSeverity, Result};
pub use events::{EventEmitter, LibraryEvent, Subscription};
pub use types::{
    Author, AuthorId, AuthorUpdate, Book, BookFile, BookId, BookUpdate, ConnectionKind, CoverImage,
    CoverKind, DeviceTarget, FileType, Identifier, ImportableBookMetadata, ImportableFile, NewAuthor,
    Timestamp, Validator,
};
