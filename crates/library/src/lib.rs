//! Bookshelf Library State
//!
//! The reactive [`LibraryStore`] that views read books and authors from, the
//! sort and filter helpers applied to its snapshot, and the interactive
//! import flow.

pub mod error;
pub mod import;
pub mod query;
pub mod store;

pub use error::{LibraryError, LibraryResult};
pub use import::{
    commit_import, prompt_for_library_directory, prompt_to_add_book, DialogSelection, FileFilter,
    FilePicker, TerminalPicker,
};
pub use query::{format_author_list, BookQuery, SortOrder};
pub use store::{LibraryState, LibraryStatus, LibraryStore};
