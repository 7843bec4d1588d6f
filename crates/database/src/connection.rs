//! Database connection management

use crate::migrations::run_migrations;
use bookshelf_core::AppError;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Pool, Sqlite};
use std::path::{Path, PathBuf};

/// Database connection pool
pub type DbPool = Pool<Sqlite>;

/// File name of the catalog database inside a library root
pub const LIBRARY_DB_FILE: &str = "metadata.db";

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    pub path: PathBuf,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Enable Write-Ahead Logging (WAL) mode
    pub enable_wal: bool,
    /// Create database if it doesn't exist
    pub create_if_missing: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(LIBRARY_DB_FILE),
            max_connections: 5,
            enable_wal: true,
            create_if_missing: true,
        }
    }
}

impl DatabaseConfig {
    /// Creates a new configuration with a custom path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Configuration for the catalog of the library rooted at `root`
    pub fn for_library(root: &Path) -> Self {
        Self::new(root.join(LIBRARY_DB_FILE))
    }

    /// Sets the maximum number of connections
    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Enables or disables WAL mode
    pub fn with_wal(mut self, enable: bool) -> Self {
        self.enable_wal = enable;
        self
    }

    /// Sets whether to create the database if missing
    pub fn with_create_if_missing(mut self, create: bool) -> Self {
        self.create_if_missing = create;
        self
    }
}

/// Establishes a connection pool to the database
pub async fn connect(config: DatabaseConfig) -> Result<DbPool, AppError> {
    let mut options = SqliteConnectOptions::new()
        .filename(&config.path)
        .create_if_missing(config.create_if_missing)
        .foreign_keys(true);

    if config.enable_wal {
        options = options
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(options)
        .await
        .map_err(|e| AppError::database("Failed to connect to database", e))?;

    log::debug!("Connected to catalog at {}", config.path.display());
    Ok(pool)
}

/// Creates a migrated in-memory catalog
///
/// The pool is capped at one connection since every SQLite in-memory
/// connection is its own database.
pub async fn connect_in_memory() -> Result<DbPool, AppError> {
    let options = SqliteConnectOptions::new()
        .in_memory(true)
        .journal_mode(SqliteJournalMode::Memory)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .map_err(|e| AppError::database("Failed to open in-memory database", e))?;

    run_migrations(&pool).await?;
    Ok(pool)
}

/// Opens the catalog of the library rooted at `root`, applying migrations
///
/// With `create` unset, a directory that is not yet a library is rejected
/// instead of being turned into one.
pub async fn open_library(root: &Path, create: bool) -> Result<DbPool, AppError> {
    if !create && !is_library_root(root) {
        return Err(AppError::InvalidArgument {
            argument: "library_root".to_string(),
            reason: format!("{} does not contain a {}", root.display(), LIBRARY_DB_FILE),
        });
    }

    if create {
        std::fs::create_dir_all(root)?;
    }

    let pool = connect(DatabaseConfig::for_library(root).with_create_if_missing(create)).await?;
    run_migrations(&pool).await?;
    log::info!("Opened library at {}", root.display());
    Ok(pool)
}

/// Returns true if `root` holds a library catalog
pub fn is_library_root(root: impl AsRef<Path>) -> bool {
    root.as_ref().join(LIBRARY_DB_FILE).is_file()
}

/// Closes the database connection pool
pub async fn close(pool: DbPool) {
    pool.close().await;
}
