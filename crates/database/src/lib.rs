//! Bookshelf Database Layer
//!
//! Embedded SQLite catalog for a library directory, laid out like a Calibre
//! library: `metadata.db` at the root, one directory per book holding its
//! format files and cover. Queries go through sqlx without compile-time
//! checking so the crate builds without a live database.

pub mod connection;
pub mod migrations;
pub mod queries;

pub use connection::{
    close, connect, connect_in_memory, is_library_root, open_library, DatabaseConfig, DbPool,
    LIBRARY_DB_FILE,
};
pub use migrations::{run_migrations, schema_version, CURRENT_VERSION};
