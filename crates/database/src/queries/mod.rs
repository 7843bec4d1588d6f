//! Database query operations organized by entity

pub mod authors;
pub mod books;
pub mod identifiers;

// Re-export commonly used query functions
pub use authors::{create_authors, delete_author, get_author, list_authors, update_author};
pub use books::{
    book_tags, create_book, format_file_path, get_book, list_books, update_book, NewBookRecord,
    COVER_FILE,
};
pub use identifiers::{delete_identifier, upsert_identifier};
