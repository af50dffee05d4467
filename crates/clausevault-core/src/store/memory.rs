//! In-memory [`VectorIndexStore`] implementation for tests.
//!
//! Uses `HashMap` and `Vec` behind `std::sync::RwLock` for thread safety.
//! All operations return immediately-ready futures.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::embedding::Embedding;
use crate::models::{Chunk, Document, DocumentStatus, RedactionEvent};

use super::VectorIndexStore;

struct AuditRecord {
    tenant_id: String,
    document_id: String,
    event: RedactionEvent,
}

/// In-memory store for tests and examples.
#[derive(Default)]
pub struct InMemoryStore {
    docs: RwLock<HashMap<String, Document>>,
    chunks: RwLock<Vec<Chunk>>,
    audit: RwLock<Vec<AuditRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorIndexStore for InMemoryStore {
    async fn upsert_document(&self, doc: &Document) -> Result<()> {
        let mut docs = self.docs.write().unwrap();
        docs.insert(doc.id.clone(), doc.clone());
        Ok(())
    }

    async fn set_document_status(
        &self,
        document_id: &str,
        status: DocumentStatus,
        failure_reason: Option<&str>,
    ) -> Result<()> {
        let mut docs = self.docs.write().unwrap();
        match docs.get_mut(document_id) {
            Some(doc) => {
                doc.status = status;
                doc.failure_reason = failure_reason.map(|s| s.to_string());
                Ok(())
            }
            None => bail!("document not found: {}", document_id),
        }
    }

    async fn insert_chunks(&self, chunks: &[Chunk]) -> Result<()> {
        let mut stored = self.chunks.write().unwrap();
        for c in chunks {
            if stored
                .iter()
                .any(|s| s.document_id == c.document_id && s.ordinal == c.ordinal)
            {
                bail!(
                    "duplicate chunk ordinal {} for document {}",
                    c.ordinal,
                    c.document_id
                );
            }
            stored.push(c.clone());
        }
        Ok(())
    }

    async fn attach_embedding(&self, chunk_id: &str, embedding: &Embedding) -> Result<()> {
        let mut stored = self.chunks.write().unwrap();
        match stored.iter_mut().find(|c| c.id == chunk_id) {
            Some(chunk) => {
                if chunk.embedding.is_some() {
                    bail!("chunk {} already has an embedding", chunk_id);
                }
                chunk.embedding = Some(embedding.clone());
                Ok(())
            }
            None => bail!("chunk not found: {}", chunk_id),
        }
    }

    async fn replace_embedding(&self, chunk_id: &str, embedding: &Embedding) -> Result<()> {
        let mut stored = self.chunks.write().unwrap();
        match stored.iter_mut().find(|c| c.id == chunk_id) {
            Some(chunk) => {
                chunk.embedding = Some(embedding.clone());
                Ok(())
            }
            None => bail!("chunk not found: {}", chunk_id),
        }
    }

    async fn mark_document_chunks_processed(&self, document_id: &str) -> Result<()> {
        let mut stored = self.chunks.write().unwrap();
        for chunk in stored.iter_mut().filter(|c| c.document_id == document_id) {
            chunk.processed = true;
        }
        Ok(())
    }

    async fn get_document(&self, document_id: &str) -> Result<Option<Document>> {
        let docs = self.docs.read().unwrap();
        Ok(docs.get(document_id).cloned())
    }

    async fn tenant_chunks(&self, tenant_id: &str) -> Result<Vec<Chunk>> {
        let stored = self.chunks.read().unwrap();
        let mut chunks: Vec<Chunk> = stored
            .iter()
            .filter(|c| c.tenant_id == tenant_id)
            .cloned()
            .collect();
        chunks.sort_by(|a, b| {
            a.document_id
                .cmp(&b.document_id)
                .then(a.ordinal.cmp(&b.ordinal))
        });
        Ok(chunks)
    }

    async fn unembedded_chunks(
        &self,
        tenant_id: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<Chunk>> {
        let stored = self.chunks.read().unwrap();
        let mut chunks: Vec<Chunk> = stored
            .iter()
            .filter(|c| c.embedding.is_none())
            .filter(|c| tenant_id.map_or(true, |t| c.tenant_id == t))
            .cloned()
            .collect();
        chunks.sort_by(|a, b| {
            a.document_id
                .cmp(&b.document_id)
                .then(a.ordinal.cmp(&b.ordinal))
        });
        if let Some(limit) = limit {
            chunks.truncate(limit);
        }
        Ok(chunks)
    }

    async fn record_redactions(
        &self,
        tenant_id: &str,
        document_id: &str,
        events: &[RedactionEvent],
    ) -> Result<()> {
        let mut audit = self.audit.write().unwrap();
        for e in events {
            audit.push(AuditRecord {
                tenant_id: tenant_id.to_string(),
                document_id: document_id.to_string(),
                event: e.clone(),
            });
        }
        Ok(())
    }

    async fn redaction_events(
        &self,
        tenant_id: &str,
        document_id: Option<&str>,
    ) -> Result<Vec<RedactionEvent>> {
        let audit = self.audit.read().unwrap();
        Ok(audit
            .iter()
            .filter(|r| r.tenant_id == tenant_id)
            .filter(|r| document_id.map_or(true, |d| r.document_id == d))
            .map(|r| r.event.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str, tenant: &str) -> Document {
        Document {
            id: id.to_string(),
            tenant_id: tenant.to_string(),
            body: "body".to_string(),
            status: DocumentStatus::Processing,
            failure_reason: None,
            metadata_json: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn chunk(id: &str, doc_id: &str, tenant: &str, ordinal: i64) -> Chunk {
        Chunk {
            id: id.to_string(),
            document_id: doc_id.to_string(),
            tenant_id: tenant.to_string(),
            ordinal,
            text: format!("chunk {}", ordinal),
            start_offset: 0,
            end_offset: 7,
            embedding: None,
            processed: false,
        }
    }

    fn emb(values: Vec<f32>) -> Embedding {
        let dims = values.len();
        Embedding::new(values, dims).unwrap()
    }

    #[tokio::test]
    async fn test_embedding_is_write_once() {
        let store = InMemoryStore::new();
        store.upsert_document(&doc("d1", "t1")).await.unwrap();
        store
            .insert_chunks(&[chunk("c1", "d1", "t1", 0)])
            .await
            .unwrap();

        store
            .attach_embedding("c1", &emb(vec![1.0, 0.0]))
            .await
            .unwrap();
        let err = store.attach_embedding("c1", &emb(vec![0.0, 1.0])).await;
        assert!(err.is_err(), "second attach must be rejected");

        // The administrative path may overwrite.
        store
            .replace_embedding("c1", &emb(vec![0.0, 1.0]))
            .await
            .unwrap();
        let chunks = store.tenant_chunks("t1").await.unwrap();
        assert_eq!(
            chunks[0].embedding.as_ref().unwrap().as_slice(),
            &[0.0, 1.0]
        );
    }

    #[tokio::test]
    async fn test_duplicate_ordinal_rejected() {
        let store = InMemoryStore::new();
        store
            .insert_chunks(&[chunk("c1", "d1", "t1", 0)])
            .await
            .unwrap();
        assert!(store
            .insert_chunks(&[chunk("c2", "d1", "t1", 0)])
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_tenant_isolation() {
        let store = InMemoryStore::new();
        store
            .insert_chunks(&[chunk("c1", "d1", "t1", 0), chunk("c2", "d2", "t2", 0)])
            .await
            .unwrap();
        let t1 = store.tenant_chunks("t1").await.unwrap();
        assert_eq!(t1.len(), 1);
        assert_eq!(t1[0].id, "c1");
    }

    #[tokio::test]
    async fn test_unembedded_chunks_filter() {
        let store = InMemoryStore::new();
        store
            .insert_chunks(&[
                chunk("c1", "d1", "t1", 0),
                chunk("c2", "d1", "t1", 1),
            ])
            .await
            .unwrap();
        store
            .attach_embedding("c1", &emb(vec![1.0]))
            .await
            .unwrap();
        let pending = store.unembedded_chunks(Some("t1"), None).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, "c2");
    }

    #[tokio::test]
    async fn test_status_transitions() {
        let store = InMemoryStore::new();
        store.upsert_document(&doc("d1", "t1")).await.unwrap();
        store
            .set_document_status("d1", DocumentStatus::Failed, Some("redaction failed"))
            .await
            .unwrap();
        let d = store.get_document("d1").await.unwrap().unwrap();
        assert_eq!(d.status, DocumentStatus::Failed);
        assert_eq!(d.failure_reason.as_deref(), Some("redaction failed"));
    }
}
