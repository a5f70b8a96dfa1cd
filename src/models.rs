//! Data types shared by the store and the ingest pipeline.

use sha2::{Digest, Sha256};

/// A named group of documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    /// Generated UUID.
    pub id: String,
    pub name: String,
    pub created_at: i64,
}

/// Document as submitted to the store.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub id: String,
    pub content: String,
    pub embedding: Option<Embedding>,
}

impl NewDocument {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            embedding: None,
        }
    }

    pub fn with_embedding(mut self, embedding: Embedding) -> Self {
        self.embedding = Some(embedding);
        self
    }

    pub fn content_hash(&self) -> String {
        hash_text(&self.content)
    }
}

/// Vector computed for a document's content.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    pub model: String,
    pub vector: Vec<f32>,
}

/// Document as read back from the store.
#[derive(Debug, Clone)]
pub struct StoredDocument {
    pub id: String,
    pub collection: String,
    pub content: String,
    pub content_hash: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub embedding_model: Option<String>,
    pub embedding_dims: Option<usize>,
}

/// Result of a single write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Inserted,
    /// `add` found the id already present and left it alone.
    Skipped,
    /// `upsert` replaced an existing document.
    Replaced,
}

/// Hex SHA-256 of a text.
pub fn hash_text(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_stable_hex() {
        let h = hash_text("Hello world");
        assert_eq!(h.len(), 64);
        assert_eq!(h, hash_text("Hello world"));
        assert_ne!(h, hash_text("Hello world\n"));
    }

    #[test]
    fn test_new_document_has_no_embedding() {
        let doc = NewDocument::new("kb", "text");
        assert!(doc.embedding.is_none());
        let doc = doc.with_embedding(Embedding {
            model: "m".to_string(),
            vector: vec![0.5],
        });
        assert_eq!(doc.embedding.unwrap().vector, vec![0.5]);
    }
}
