//! SQLite-backed [`VectorIndexStore`] implementation.
//!
//! Maps each store operation onto the schema created by [`crate::migrate`]:
//! documents, chunks, chunk_vectors, redaction_audit. Embeddings are stored
//! as little-endian f32 BLOBs. The write-once rule for embeddings is
//! enforced by a plain INSERT on chunk_vectors; only
//! [`replace_embedding`](VectorIndexStore::replace_embedding) carries an
//! upsert clause.

use anyhow::{bail, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use clausevault_core::embedding::{blob_to_vec, Embedding};
use clausevault_core::models::{Chunk, Document, DocumentStatus, RedactionEvent};
use clausevault_core::store::VectorIndexStore;

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn row_to_chunk(row: &sqlx::sqlite::SqliteRow) -> Chunk {
    let embedding: Option<Vec<u8>> = row.try_get("embedding").ok().flatten();
    let processed: i64 = row.get("processed");
    Chunk {
        id: row.get("id"),
        document_id: row.get("document_id"),
        tenant_id: row.get("tenant_id"),
        ordinal: row.get("ordinal"),
        text: row.get("text"),
        start_offset: row.get("start_offset"),
        end_offset: row.get("end_offset"),
        embedding: embedding.map(|blob| Embedding::from_stored(blob_to_vec(&blob))),
        processed: processed != 0,
    }
}

#[async_trait]
impl VectorIndexStore for SqliteStore {
    async fn upsert_document(&self, doc: &Document) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO documents (id, tenant_id, body, status, failure_reason,
                                   metadata_json, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                body = excluded.body,
                status = excluded.status,
                failure_reason = excluded.failure_reason,
                metadata_json = excluded.metadata_json,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&doc.id)
        .bind(&doc.tenant_id)
        .bind(&doc.body)
        .bind(doc.status.as_str())
        .bind(&doc.failure_reason)
        .bind(&doc.metadata_json)
        .bind(doc.created_at)
        .bind(doc.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn set_document_status(
        &self,
        document_id: &str,
        status: DocumentStatus,
        failure_reason: Option<&str>,
    ) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        let updated = sqlx::query(
            "UPDATE documents SET status = ?, failure_reason = ?, updated_at = ? WHERE id = ?",
        )
        .bind(status.as_str())
        .bind(failure_reason)
        .bind(now)
        .bind(document_id)
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            bail!("document not found: {}", document_id);
        }
        Ok(())
    }

    async fn insert_chunks(&self, chunks: &[Chunk]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for chunk in chunks {
            sqlx::query(
                r#"
                INSERT INTO chunks (id, document_id, tenant_id, ordinal, text,
                                    start_offset, end_offset, processed)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&chunk.id)
            .bind(&chunk.document_id)
            .bind(&chunk.tenant_id)
            .bind(chunk.ordinal)
            .bind(&chunk.text)
            .bind(chunk.start_offset)
            .bind(chunk.end_offset)
            .bind(chunk.processed as i64)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn attach_embedding(&self, chunk_id: &str, embedding: &Embedding) -> Result<()> {
        let row = sqlx::query("SELECT document_id, tenant_id FROM chunks WHERE id = ?")
            .bind(chunk_id)
            .fetch_optional(&self.pool)
            .await?;
        let row = match row {
            Some(row) => row,
            None => bail!("chunk not found: {}", chunk_id),
        };
        let document_id: String = row.get("document_id");
        let tenant_id: String = row.get("tenant_id");

        let now = chrono::Utc::now().timestamp();
        // Plain INSERT: a second attach hits the primary key and fails,
        // which is the write-once guarantee.
        let inserted = sqlx::query(
            r#"
            INSERT INTO chunk_vectors (chunk_id, document_id, tenant_id, dims, embedding, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(chunk_id)
        .bind(&document_id)
        .bind(&tenant_id)
        .bind(embedding.dims() as i64)
        .bind(embedding.to_blob())
        .bind(now)
        .execute(&self.pool)
        .await;

        if let Err(e) = inserted {
            bail!("chunk {} already has an embedding: {}", chunk_id, e);
        }

        Ok(())
    }

    async fn replace_embedding(&self, chunk_id: &str, embedding: &Embedding) -> Result<()> {
        let row = sqlx::query("SELECT document_id, tenant_id FROM chunks WHERE id = ?")
            .bind(chunk_id)
            .fetch_optional(&self.pool)
            .await?;
        let row = match row {
            Some(row) => row,
            None => bail!("chunk not found: {}", chunk_id),
        };
        let document_id: String = row.get("document_id");
        let tenant_id: String = row.get("tenant_id");

        let now = chrono::Utc::now().timestamp();
        sqlx::query(
            r#"
            INSERT INTO chunk_vectors (chunk_id, document_id, tenant_id, dims, embedding, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(chunk_id) DO UPDATE SET
                dims = excluded.dims,
                embedding = excluded.embedding,
                created_at = excluded.created_at
            "#,
        )
        .bind(chunk_id)
        .bind(&document_id)
        .bind(&tenant_id)
        .bind(embedding.dims() as i64)
        .bind(embedding.to_blob())
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn mark_document_chunks_processed(&self, document_id: &str) -> Result<()> {
        sqlx::query("UPDATE chunks SET processed = 1 WHERE document_id = ?")
            .bind(document_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_document(&self, document_id: &str) -> Result<Option<Document>> {
        let row = sqlx::query(
            r#"
            SELECT id, tenant_id, body, status, failure_reason, metadata_json,
                   created_at, updated_at
            FROM documents WHERE id = ?
            "#,
        )
        .bind(document_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| {
            let status: String = r.get("status");
            Document {
                id: r.get("id"),
                tenant_id: r.get("tenant_id"),
                body: r.get("body"),
                status: DocumentStatus::parse(&status).unwrap_or(DocumentStatus::Failed),
                failure_reason: r.get("failure_reason"),
                metadata_json: r.get("metadata_json"),
                created_at: r.get("created_at"),
                updated_at: r.get("updated_at"),
            }
        }))
    }

    async fn tenant_chunks(&self, tenant_id: &str) -> Result<Vec<Chunk>> {
        let rows = sqlx::query(
            r#"
            SELECT c.id, c.document_id, c.tenant_id, c.ordinal, c.text,
                   c.start_offset, c.end_offset, c.processed, cv.embedding
            FROM chunks c
            LEFT JOIN chunk_vectors cv ON cv.chunk_id = c.id
            WHERE c.tenant_id = ?
            ORDER BY c.document_id, c.ordinal
            "#,
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_chunk).collect())
    }

    async fn unembedded_chunks(
        &self,
        tenant_id: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<Chunk>> {
        let limit_val = limit.unwrap_or(usize::MAX) as i64;
        let rows = match tenant_id {
            Some(tenant) => {
                sqlx::query(
                    r#"
                    SELECT c.id, c.document_id, c.tenant_id, c.ordinal, c.text,
                           c.start_offset, c.end_offset, c.processed, NULL AS embedding
                    FROM chunks c
                    LEFT JOIN chunk_vectors cv ON cv.chunk_id = c.id
                    WHERE cv.chunk_id IS NULL AND c.tenant_id = ?
                    ORDER BY c.document_id, c.ordinal
                    LIMIT ?
                    "#,
                )
                .bind(tenant)
                .bind(limit_val)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    r#"
                    SELECT c.id, c.document_id, c.tenant_id, c.ordinal, c.text,
                           c.start_offset, c.end_offset, c.processed, NULL AS embedding
                    FROM chunks c
                    LEFT JOIN chunk_vectors cv ON cv.chunk_id = c.id
                    WHERE cv.chunk_id IS NULL
                    ORDER BY c.document_id, c.ordinal
                    LIMIT ?
                    "#,
                )
                .bind(limit_val)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows.iter().map(row_to_chunk).collect())
    }

    async fn record_redactions(
        &self,
        tenant_id: &str,
        document_id: &str,
        events: &[RedactionEvent],
    ) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        let mut tx = self.pool.begin().await?;
        for e in events {
            sqlx::query(
                r#"
                INSERT INTO redaction_audit (tenant_id, document_id, entity_type, confidence, redacted, created_at)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(tenant_id)
            .bind(document_id)
            .bind(&e.entity_type)
            .bind(e.confidence)
            .bind(&e.redacted)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn redaction_events(
        &self,
        tenant_id: &str,
        document_id: Option<&str>,
    ) -> Result<Vec<RedactionEvent>> {
        let rows = match document_id {
            Some(doc) => {
                sqlx::query(
                    r#"
                    SELECT entity_type, confidence, redacted
                    FROM redaction_audit
                    WHERE tenant_id = ? AND document_id = ?
                    ORDER BY id
                    "#,
                )
                .bind(tenant_id)
                .bind(doc)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    r#"
                    SELECT entity_type, confidence, redacted
                    FROM redaction_audit
                    WHERE tenant_id = ?
                    ORDER BY id
                    "#,
                )
                .bind(tenant_id)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows
            .iter()
            .map(|r| RedactionEvent {
                entity_type: r.get("entity_type"),
                confidence: r.get("confidence"),
                redacted: r.get("redacted"),
            })
            .collect())
    }
}
