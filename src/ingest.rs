//! Ingestion pipeline.
//!
//! One linear pass: open store → get or create the collection → read the
//! input file → embed → write the document → confirm on stdout.
//!
//! The input file is read only after the collection is open, so a missing
//! file still leaves an (empty) collection behind but never a document.

use anyhow::{Context, Result};
use std::path::Path;

use crate::config::{Config, EmbeddingConfig, WriteMode};
use crate::embedding;
use crate::models::{NewDocument, WriteOutcome};
use crate::store::{SqliteStore, Store};

/// Line printed on stdout after a successful ingest.
pub const CONFIRMATION: &str = "Embedding stored in Chroma";

/// What a single ingest did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub collection: String,
    pub document_id: String,
    pub bytes: usize,
    pub outcome: WriteOutcome,
    pub embedding_model: Option<String>,
}

/// Run the ingest against the SQLite store named in `config` and print the
/// confirmation line.
pub async fn run_ingest(config: &Config) -> Result<IngestReport> {
    let store = SqliteStore::open(&config.store.path).await?;

    let report = ingest_file(
        &store,
        &config.ingest.input,
        &config.ingest.collection,
        &config.ingest.document_id,
        config.ingest.mode,
        &config.embedding,
    )
    .await;

    store.close().await;
    let report = report?;

    println!("{}", CONFIRMATION);
    Ok(report)
}

/// Store the full contents of `input` as document `document_id` in the
/// collection `collection_name`.
///
/// The content is stored verbatim. Under [`WriteMode::Add`] an existing
/// document with the same id is kept and a warning is logged.
pub async fn ingest_file(
    store: &dyn Store,
    input: &Path,
    collection_name: &str,
    document_id: &str,
    mode: WriteMode,
    embedding_config: &EmbeddingConfig,
) -> Result<IngestReport> {
    let collection = store
        .get_or_create_collection(collection_name)
        .await
        .with_context(|| format!("Failed to open collection '{}'", collection_name))?;

    let text = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read input file: {}", input.display()))?;

    let mut doc = NewDocument::new(document_id, text);
    if let Some(embedding) = embedding::embed_document(embedding_config, &doc.content).await? {
        doc = doc.with_embedding(embedding);
    }

    let outcome = match mode {
        WriteMode::Add => store.add_document(&collection, &doc).await,
        WriteMode::Upsert => store.upsert_document(&collection, &doc).await,
    }
    .with_context(|| {
        format!(
            "Failed to write document '{}' to collection '{}'",
            document_id, collection_name
        )
    })?;

    match outcome {
        WriteOutcome::Skipped => tracing::warn!(
            collection = collection_name,
            "Add of existing document ID: {}; stored content left unchanged",
            document_id
        ),
        WriteOutcome::Inserted | WriteOutcome::Replaced => tracing::info!(
            collection = collection_name,
            id = document_id,
            bytes = doc.content.len(),
            ?outcome,
            "document stored"
        ),
    }

    Ok(IngestReport {
        collection: collection.name,
        document_id: doc.id,
        bytes: doc.content.len(),
        outcome,
        embedding_model: doc.embedding.map(|e| e.model),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use tempfile::TempDir;

    fn write_input(tmp: &TempDir, content: &str) -> std::path::PathBuf {
        let path = tmp.path().join("kb.txt");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[tokio::test]
    async fn test_ingest_stores_verbatim_content() {
        let tmp = TempDir::new().unwrap();
        let content = "  Line one\r\n\tLine two with unicode: héllo ✓\n\n";
        let input = write_input(&tmp, content);
        let store = InMemoryStore::new();

        let report = ingest_file(
            &store,
            &input,
            "docs",
            "kb",
            WriteMode::Add,
            &EmbeddingConfig::disabled(),
        )
        .await
        .unwrap();

        assert_eq!(report.outcome, WriteOutcome::Inserted);
        assert_eq!(report.bytes, content.len());
        assert!(report.embedding_model.is_none());

        let coll = store.get_collection("docs").await.unwrap().unwrap();
        let doc = store.get_document(&coll, "kb").await.unwrap().unwrap();
        assert_eq!(doc.content, content);
        assert_eq!(store.count_documents(&coll).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_second_add_keeps_first_content() {
        let tmp = TempDir::new().unwrap();
        let store = InMemoryStore::new();
        let disabled = EmbeddingConfig::disabled();

        let input = write_input(&tmp, "version one");
        ingest_file(&store, &input, "docs", "kb", WriteMode::Add, &disabled)
            .await
            .unwrap();

        let input = write_input(&tmp, "version two");
        let report = ingest_file(&store, &input, "docs", "kb", WriteMode::Add, &disabled)
            .await
            .unwrap();
        assert_eq!(report.outcome, WriteOutcome::Skipped);

        let coll = store.get_collection("docs").await.unwrap().unwrap();
        let doc = store.get_document(&coll, "kb").await.unwrap().unwrap();
        assert_eq!(doc.content, "version one");
        assert_eq!(store.count_documents(&coll).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_upsert_mode_replaces_content() {
        let tmp = TempDir::new().unwrap();
        let store = InMemoryStore::new();
        let disabled = EmbeddingConfig::disabled();

        let input = write_input(&tmp, "version one");
        ingest_file(&store, &input, "docs", "kb", WriteMode::Upsert, &disabled)
            .await
            .unwrap();

        let input = write_input(&tmp, "version two");
        let report = ingest_file(&store, &input, "docs", "kb", WriteMode::Upsert, &disabled)
            .await
            .unwrap();
        assert_eq!(report.outcome, WriteOutcome::Replaced);

        let coll = store.get_collection("docs").await.unwrap().unwrap();
        let doc = store.get_document(&coll, "kb").await.unwrap().unwrap();
        assert_eq!(doc.content, "version two");
    }

    #[tokio::test]
    async fn test_missing_input_writes_no_document() {
        let tmp = TempDir::new().unwrap();
        let store = InMemoryStore::new();

        let err = ingest_file(
            &store,
            &tmp.path().join("kb.txt"),
            "docs",
            "kb",
            WriteMode::Add,
            &EmbeddingConfig::disabled(),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("Failed to read input file"));

        let coll = store.get_collection("docs").await.unwrap().unwrap();
        assert_eq!(store.count_documents(&coll).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_non_utf8_input_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("kb.txt");
        std::fs::write(&input, [0xff, 0xfe, 0x00, 0x80]).unwrap();
        let store = InMemoryStore::new();

        let result = ingest_file(
            &store,
            &input,
            "docs",
            "kb",
            WriteMode::Add,
            &EmbeddingConfig::disabled(),
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_embedding_failure_aborts_write() {
        let tmp = TempDir::new().unwrap();
        let input = write_input(&tmp, "Hello world");
        let store = InMemoryStore::new();
        // Nothing listens on port 9; every attempt fails at connect time.
        let embedding = EmbeddingConfig {
            provider: "ollama".to_string(),
            model: Some("nomic-embed-text".to_string()),
            dims: Some(768),
            max_retries: 0,
            timeout_secs: 2,
            url: Some("http://127.0.0.1:9".to_string()),
            ..EmbeddingConfig::default()
        };

        let result =
            ingest_file(&store, &input, "docs", "kb", WriteMode::Add, &embedding).await;
        assert!(result.is_err());

        let coll = store.get_collection("docs").await.unwrap().unwrap();
        assert_eq!(store.count_documents(&coll).await.unwrap(), 0);
    }
}
