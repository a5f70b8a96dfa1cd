//! In-memory [`Store`] for tests.
//!
//! Same write semantics as the SQLite store, kept in `HashMap`s behind a
//! `RwLock`. Nothing survives the process.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{Collection, Embedding, NewDocument, StoredDocument, WriteOutcome};

use super::{CollectionSummary, Store};

struct StoredEntry {
    content: String,
    content_hash: String,
    created_at: i64,
    updated_at: i64,
    embedding: Option<Embedding>,
}

#[derive(Default)]
struct State {
    /// Keyed by collection name.
    collections: HashMap<String, Collection>,
    /// Keyed by (collection id, document id).
    documents: HashMap<(String, String), StoredEntry>,
}

#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|_| anyhow!("in-memory store lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|_| anyhow!("in-memory store lock poisoned"))
    }

    fn entry_for(doc: &NewDocument, now: i64) -> StoredEntry {
        StoredEntry {
            content: doc.content.clone(),
            content_hash: doc.content_hash(),
            created_at: now,
            updated_at: now,
            embedding: doc.embedding.clone(),
        }
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn get_or_create_collection(&self, name: &str) -> Result<Collection> {
        let mut state = self.write()?;
        let collection = state
            .collections
            .entry(name.to_string())
            .or_insert_with(|| Collection {
                id: Uuid::new_v4().to_string(),
                name: name.to_string(),
                created_at: chrono::Utc::now().timestamp(),
            });
        Ok(collection.clone())
    }

    async fn get_collection(&self, name: &str) -> Result<Option<Collection>> {
        Ok(self.read()?.collections.get(name).cloned())
    }

    async fn list_collections(&self) -> Result<Vec<CollectionSummary>> {
        let state = self.read()?;
        let mut summaries: Vec<CollectionSummary> = state
            .collections
            .values()
            .map(|c| CollectionSummary {
                collection: c.clone(),
                documents: state.documents.keys().filter(|(cid, _)| *cid == c.id).count() as i64,
            })
            .collect();
        summaries.sort_by(|a, b| a.collection.name.cmp(&b.collection.name));
        Ok(summaries)
    }

    async fn add_document(
        &self,
        collection: &Collection,
        doc: &NewDocument,
    ) -> Result<WriteOutcome> {
        let mut state = self.write()?;
        let key = (collection.id.clone(), doc.id.clone());
        if state.documents.contains_key(&key) {
            return Ok(WriteOutcome::Skipped);
        }
        let now = chrono::Utc::now().timestamp();
        state.documents.insert(key, Self::entry_for(doc, now));
        Ok(WriteOutcome::Inserted)
    }

    async fn upsert_document(
        &self,
        collection: &Collection,
        doc: &NewDocument,
    ) -> Result<WriteOutcome> {
        let mut guard = self.write()?;
        let documents = &mut guard.documents;
        let key = (collection.id.clone(), doc.id.clone());
        let now = chrono::Utc::now().timestamp();
        match documents.get_mut(&key) {
            Some(existing) => {
                let created_at = existing.created_at;
                *existing = Self::entry_for(doc, now);
                existing.created_at = created_at;
                Ok(WriteOutcome::Replaced)
            }
            None => {
                documents.insert(key, Self::entry_for(doc, now));
                Ok(WriteOutcome::Inserted)
            }
        }
    }

    async fn get_document(
        &self,
        collection: &Collection,
        id: &str,
    ) -> Result<Option<StoredDocument>> {
        let state = self.read()?;
        let key = (collection.id.clone(), id.to_string());
        Ok(state.documents.get(&key).map(|entry| StoredDocument {
            id: id.to_string(),
            collection: collection.name.clone(),
            content: entry.content.clone(),
            content_hash: entry.content_hash.clone(),
            created_at: entry.created_at,
            updated_at: entry.updated_at,
            embedding_model: entry.embedding.as_ref().map(|e| e.model.clone()),
            embedding_dims: entry.embedding.as_ref().map(|e| e.vector.len()),
        }))
    }

    async fn count_documents(&self, collection: &Collection) -> Result<i64> {
        let state = self.read()?;
        Ok(state
            .documents
            .keys()
            .filter(|(cid, _)| *cid == collection.id)
            .count() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_add_skips_existing_id() {
        let store = InMemoryStore::new();
        let coll = store.get_or_create_collection("docs").await.unwrap();
        store
            .add_document(&coll, &NewDocument::new("kb", "a"))
            .await
            .unwrap();
        let outcome = store
            .add_document(&coll, &NewDocument::new("kb", "b"))
            .await
            .unwrap();
        assert_eq!(outcome, WriteOutcome::Skipped);
        let doc = store.get_document(&coll, "kb").await.unwrap().unwrap();
        assert_eq!(doc.content, "a");
    }

    #[tokio::test]
    async fn test_upsert_keeps_created_at() {
        let store = InMemoryStore::new();
        let coll = store.get_or_create_collection("docs").await.unwrap();
        store
            .upsert_document(&coll, &NewDocument::new("kb", "a"))
            .await
            .unwrap();
        let before = store.get_document(&coll, "kb").await.unwrap().unwrap();
        store
            .upsert_document(&coll, &NewDocument::new("kb", "b"))
            .await
            .unwrap();
        let after = store.get_document(&coll, "kb").await.unwrap().unwrap();
        assert_eq!(after.content, "b");
        assert_eq!(after.created_at, before.created_at);
        assert_eq!(store.count_documents(&coll).await.unwrap(), 1);
    }
}
