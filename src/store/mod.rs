//! Storage abstraction.
//!
//! The [`Store`] trait covers everything the ingest pipeline and the
//! inspection commands need from a persistent collection backend.
//! [`SqliteStore`] is the on-disk implementation; [`InMemoryStore`] backs
//! unit tests.
//!
//! # Write semantics
//!
//! | Method | Id absent | Id present |
//! |--------|-----------|------------|
//! | [`add_document`](Store::add_document) | insert | leave stored document untouched, return [`WriteOutcome::Skipped`] |
//! | [`upsert_document`](Store::upsert_document) | insert | replace content and embedding |

pub mod memory;
pub mod sqlite;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Collection, NewDocument, StoredDocument, WriteOutcome};

pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;

/// A collection together with its document count.
#[derive(Debug, Clone)]
pub struct CollectionSummary {
    pub collection: Collection,
    pub documents: i64,
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Return the collection called `name`, creating it if absent.
    async fn get_or_create_collection(&self, name: &str) -> Result<Collection>;

    /// Look up a collection without creating it.
    async fn get_collection(&self, name: &str) -> Result<Option<Collection>>;

    /// All collections, ordered by name.
    async fn list_collections(&self) -> Result<Vec<CollectionSummary>>;

    /// Insert a document unless its id already exists.
    async fn add_document(&self, collection: &Collection, doc: &NewDocument)
        -> Result<WriteOutcome>;

    /// Insert a document, replacing any existing one with the same id.
    async fn upsert_document(
        &self,
        collection: &Collection,
        doc: &NewDocument,
    ) -> Result<WriteOutcome>;

    async fn get_document(&self, collection: &Collection, id: &str)
        -> Result<Option<StoredDocument>>;

    async fn count_documents(&self, collection: &Collection) -> Result<i64>;
}
