//! Read-side commands: `kb-ingest get` and `kb-ingest collections`.
//!
//! Both refuse to run against a store directory that has never been
//! written, rather than creating an empty database as a side effect, and
//! open the database read-only.

use anyhow::{bail, Result};

use crate::config::Config;
use crate::db;
use crate::models::StoredDocument;
use crate::store::{CollectionSummary, SqliteStore, Store};

async fn open_existing(config: &Config) -> Result<SqliteStore> {
    let db_path = db::db_file(&config.store.path);
    if !db_path.exists() {
        bail!("no store found at {}", config.store.path.display());
    }
    SqliteStore::open_read_only(&config.store.path).await
}

/// Fetch a document from the configured collection.
pub async fn get_document(config: &Config, id: &str) -> Result<StoredDocument> {
    let store = open_existing(config).await?;
    let found = match store.get_collection(&config.ingest.collection).await? {
        Some(collection) => store.get_document(&collection, id).await?,
        None => None,
    };
    store.close().await;

    match found {
        Some(doc) => Ok(doc),
        None => bail!(
            "document not found: {} (collection '{}')",
            id,
            config.ingest.collection
        ),
    }
}

pub async fn run_get(config: &Config, id: &str) -> Result<()> {
    let doc = get_document(config, id).await?;

    println!("--- document ---");
    println!("id: {}", doc.id);
    println!("collection: {}", doc.collection);
    println!("hash: {}", doc.content_hash);
    println!("created: {}", format_ts_iso(doc.created_at));
    println!("updated: {}", format_ts_iso(doc.updated_at));
    match (&doc.embedding_model, doc.embedding_dims) {
        (Some(model), Some(dims)) => println!("embedding: {} ({} dims)", model, dims),
        _ => println!("embedding: none"),
    }
    println!();
    println!("--- content ---");
    println!("{}", doc.content);

    Ok(())
}

pub async fn list_collections(config: &Config) -> Result<Vec<CollectionSummary>> {
    let store = open_existing(config).await?;
    let summaries = store.list_collections().await;
    store.close().await;
    summaries
}

pub async fn run_collections(config: &Config) -> Result<()> {
    let summaries = list_collections(config).await?;

    if summaries.is_empty() {
        println!("No collections.");
        return Ok(());
    }

    println!("{:<24} {:>10}  CREATED", "COLLECTION", "DOCUMENTS");
    for s in &summaries {
        println!(
            "{:<24} {:>10}  {}",
            s.collection.name,
            s.documents,
            format_ts_iso(s.collection.created_at)
        );
    }

    Ok(())
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .unwrap_or_else(|| ts.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_ts_iso() {
        assert_eq!(format_ts_iso(0), "1970-01-01T00:00:00Z");
        assert_eq!(format_ts_iso(1_700_000_000), "2023-11-14T22:13:20Z");
    }

    #[tokio::test]
    async fn test_get_without_store_fails() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut config = Config::default();
        config.store.path = tmp.path().join("db");

        let err = get_document(&config, "kb").await.unwrap_err();
        assert!(err.to_string().contains("no store found"));
        assert!(!config.store.path.exists());
    }
}
