//! SQLite connection management.
//!
//! The store lives in a directory (default `./db`) holding a single
//! database file, [`DB_FILE_NAME`]. The directory and file are created on
//! first use. WAL journaling is enabled so a reader such as `kb-ingest get`
//! can run while another process writes.

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::{Path, PathBuf};

/// Name of the database file inside the store directory.
pub const DB_FILE_NAME: &str = "store.sqlite3";

/// Path of the database file for a store directory.
pub fn db_file(store_dir: &Path) -> PathBuf {
    store_dir.join(DB_FILE_NAME)
}

/// Open a connection pool on the store in `store_dir`.
///
/// # Errors
///
/// Fails when the directory cannot be created (e.g. the path is a regular
/// file or read-only) or the database file cannot be opened.
pub async fn connect(store_dir: &Path) -> Result<SqlitePool> {
    std::fs::create_dir_all(store_dir)
        .with_context(|| format!("Failed to open store at {}", store_dir.display()))?;

    let options = SqliteConnectOptions::new()
        .filename(db_file(store_dir))
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to open store at {}", store_dir.display()))?;

    tracing::debug!(path = %store_dir.display(), "store opened");
    Ok(pool)
}

/// Open an existing store read-only. Creates nothing on disk and never
/// writes, so it works on a store directory the caller cannot write to.
pub async fn connect_read_only(store_dir: &Path) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .filename(db_file(store_dir))
        .read_only(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to open store at {}", store_dir.display()))?;

    tracing::debug!(path = %store_dir.display(), "store opened read-only");
    Ok(pool)
}
