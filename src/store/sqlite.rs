//! SQLite-backed [`Store`].

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

use crate::db;
use crate::embedding::{blob_to_vec, vec_to_blob};
use crate::migrate;
use crate::models::{Collection, NewDocument, StoredDocument, WriteOutcome};

use super::{CollectionSummary, Store};

/// Wraps a [`SqlitePool`] over the `collections`, `documents` and
/// `embeddings` tables.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if needed) the store in `store_dir` and apply the schema.
    pub async fn open(store_dir: &Path) -> Result<Self> {
        let pool = db::connect(store_dir).await?;
        migrate::run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    /// Open an existing store without creating or migrating anything.
    ///
    /// Used by the read-side commands, which must work on a store the
    /// caller can read but not write.
    pub async fn open_read_only(store_dir: &Path) -> Result<Self> {
        let pool = db::connect_read_only(store_dir).await?;
        Ok(Self { pool })
    }

    pub async fn close(self) {
        self.pool.close().await;
    }

    /// Raw vector stored for a document, if any.
    pub async fn get_embedding(&self, collection: &Collection, id: &str) -> Result<Option<Vec<f32>>> {
        let blob: Option<Vec<u8>> = sqlx::query_scalar(
            "SELECT vector FROM embeddings WHERE collection_id = ? AND document_id = ?",
        )
        .bind(&collection.id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(blob.map(|b| blob_to_vec(&b)))
    }
}

fn row_to_collection(row: &sqlx::sqlite::SqliteRow) -> Collection {
    Collection {
        id: row.get("id"),
        name: row.get("name"),
        created_at: row.get("created_at"),
    }
}

async fn write_embedding(
    tx: &mut Transaction<'_, Sqlite>,
    collection: &Collection,
    doc: &NewDocument,
    content_hash: &str,
    now: i64,
) -> Result<()> {
    sqlx::query("DELETE FROM embeddings WHERE collection_id = ? AND document_id = ?")
        .bind(&collection.id)
        .bind(&doc.id)
        .execute(&mut **tx)
        .await?;

    if let Some(embedding) = &doc.embedding {
        sqlx::query(
            r#"
            INSERT INTO embeddings (collection_id, document_id, model, dims, vector, hash, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&collection.id)
        .bind(&doc.id)
        .bind(&embedding.model)
        .bind(embedding.vector.len() as i64)
        .bind(vec_to_blob(&embedding.vector))
        .bind(content_hash)
        .bind(now)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

#[async_trait]
impl Store for SqliteStore {
    async fn get_or_create_collection(&self, name: &str) -> Result<Collection> {
        let now = chrono::Utc::now().timestamp();
        sqlx::query(
            "INSERT INTO collections (id, name, created_at) VALUES (?, ?, ?) ON CONFLICT(name) DO NOTHING",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(name)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let row = sqlx::query("SELECT id, name, created_at FROM collections WHERE name = ?")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;

        Ok(row_to_collection(&row))
    }

    async fn get_collection(&self, name: &str) -> Result<Option<Collection>> {
        let row = sqlx::query("SELECT id, name, created_at FROM collections WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(row_to_collection))
    }

    async fn list_collections(&self) -> Result<Vec<CollectionSummary>> {
        let rows = sqlx::query(
            r#"
            SELECT c.id, c.name, c.created_at, COUNT(d.id) AS documents
            FROM collections c
            LEFT JOIN documents d ON d.collection_id = c.id
            GROUP BY c.id
            ORDER BY c.name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| CollectionSummary {
                collection: row_to_collection(row),
                documents: row.get("documents"),
            })
            .collect())
    }

    async fn add_document(
        &self,
        collection: &Collection,
        doc: &NewDocument,
    ) -> Result<WriteOutcome> {
        let now = chrono::Utc::now().timestamp();
        let content_hash = doc.content_hash();
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO documents (collection_id, id, content, content_hash, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(collection_id, id) DO NOTHING
            "#,
        )
        .bind(&collection.id)
        .bind(&doc.id)
        .bind(&doc.content)
        .bind(&content_hash)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if inserted == 0 {
            tx.rollback().await?;
            return Ok(WriteOutcome::Skipped);
        }

        write_embedding(&mut tx, collection, doc, &content_hash, now).await?;
        tx.commit().await?;
        Ok(WriteOutcome::Inserted)
    }

    async fn upsert_document(
        &self,
        collection: &Collection,
        doc: &NewDocument,
    ) -> Result<WriteOutcome> {
        let now = chrono::Utc::now().timestamp();
        let content_hash = doc.content_hash();
        let mut tx = self.pool.begin().await?;

        let existed: bool = sqlx::query_scalar(
            "SELECT COUNT(*) > 0 FROM documents WHERE collection_id = ? AND id = ?",
        )
        .bind(&collection.id)
        .bind(&doc.id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO documents (collection_id, id, content, content_hash, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(collection_id, id) DO UPDATE SET
                content = excluded.content,
                content_hash = excluded.content_hash,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&collection.id)
        .bind(&doc.id)
        .bind(&doc.content)
        .bind(&content_hash)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        write_embedding(&mut tx, collection, doc, &content_hash, now).await?;
        tx.commit().await?;

        Ok(if existed {
            WriteOutcome::Replaced
        } else {
            WriteOutcome::Inserted
        })
    }

    async fn get_document(
        &self,
        collection: &Collection,
        id: &str,
    ) -> Result<Option<StoredDocument>> {
        let row = sqlx::query(
            r#"
            SELECT d.id, d.content, d.content_hash, d.created_at, d.updated_at,
                   e.model AS embedding_model, e.dims AS embedding_dims
            FROM documents d
            LEFT JOIN embeddings e ON e.collection_id = d.collection_id AND e.document_id = d.id
            WHERE d.collection_id = ? AND d.id = ?
            "#,
        )
        .bind(&collection.id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| {
            let dims: Option<i64> = row.get("embedding_dims");
            StoredDocument {
                id: row.get("id"),
                collection: collection.name.clone(),
                content: row.get("content"),
                content_hash: row.get("content_hash"),
                created_at: row.get("created_at"),
                updated_at: row.get("updated_at"),
                embedding_model: row.get("embedding_model"),
                embedding_dims: dims.map(|d| d as usize),
            }
        }))
    }

    async fn count_documents(&self, collection: &Collection) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents WHERE collection_id = ?")
            .bind(&collection.id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
