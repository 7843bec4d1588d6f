//! Catalog schema versions
//!
//! A library's `metadata.db` records every schema step it has taken in
//! `schema_migrations`. Opening an older library brings it forward; a step
//! either lands completely (schema plus its version row) or not at all.

use crate::DbPool;
use bookshelf_core::AppError;

/// One step of the catalog schema
struct CatalogMigration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[CatalogMigration] = &[
    CatalogMigration {
        version: 1,
        name: "books, authors, formats, identifiers and tags",
        sql: include_str!("../migrations/001_initial_schema.sql"),
    },
    CatalogMigration {
        version: 2,
        name: "listing and lookup indexes",
        sql: include_str!("../migrations/002_add_indexes.sql"),
    },
];

/// Schema version a freshly opened catalog ends up at
pub const CURRENT_VERSION: i64 = 2;

/// Brings the catalog up to [`CURRENT_VERSION`]
pub async fn run_migrations(pool: &DbPool) -> Result<(), AppError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now') * 1000)
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| AppError::database("Failed to create migrations table", e))?;

    let current = schema_version(pool).await?;
    for migration in MIGRATIONS {
        if migration.version > current {
            apply(pool, migration).await?;
        }
    }
    Ok(())
}

/// Highest schema step recorded in the catalog, 0 for an empty one
pub async fn schema_version(pool: &DbPool) -> Result<i64, AppError> {
    let version: Option<i64> = sqlx::query_scalar("SELECT MAX(version) FROM schema_migrations")
        .fetch_one(pool)
        .await
        .map_err(|e| AppError::database("Failed to read catalog schema version", e))?;
    Ok(version.unwrap_or(0))
}

async fn apply(pool: &DbPool, migration: &CatalogMigration) -> Result<(), AppError> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| AppError::database("Failed to start migration transaction", e))?;

    sqlx::query(migration.sql)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::MigrationFailed {
            version: migration.version.to_string(),
            reason: e.to_string(),
        })?;

    sqlx::query("INSERT INTO schema_migrations (version) VALUES (?)")
        .bind(migration.version)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database("Failed to record migration", e))?;

    tx.commit()
        .await
        .map_err(|e| AppError::database("Failed to commit migration", e))?;

    log::info!("Catalog schema at version {} ({})", migration.version, migration.name);
    Ok(())
}
