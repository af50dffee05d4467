//! Ingestion pipeline orchestration.
//!
//! Coordinates the full flow for one document: redact → chunk → embed →
//! persist. Ingestion of different documents and different tenants is
//! independent; the only shared state is the per-tenant candidate set inside
//! the store.
//!
//! Chunk ordinals are assigned before any embedding call is dispatched, so
//! the final ordinal sequence never depends on the order in which embedding
//! calls finish. Embedding failure degrades exactly the affected chunks (no
//! vector attached) and never fails the document; a document is marked
//! failed only when redaction or chunking itself cannot execute.

use anyhow::Result;
use serde::Serialize;
use uuid::Uuid;

use clausevault_core::chunk::{chunk_text, normalize_whitespace};
use clausevault_core::error::CoreError;
use clausevault_core::models::{Chunk, Document, DocumentStatus};
use clausevault_core::redact::PiiRedactor;
use clausevault_core::store::VectorIndexStore;

use crate::config::ChunkingConfig;
use crate::embedding::EmbeddingOrchestrator;
use crate::metadata::MetadataExtractor;

/// Outcome of one ingestion call, returned to the upstream collaborator.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub document_id: String,
    pub chunks_created: usize,
    pub embeddings_created: usize,
    pub status: DocumentStatus,
}

/// Ingest one document's raw text for a tenant.
///
/// The raw text is scrubbed before anything else happens; only redacted
/// text is chunked, embedded, persisted, or handed to the metadata
/// provider.
pub async fn ingest_document<S>(
    store: &S,
    redactor: &PiiRedactor,
    embedder: &EmbeddingOrchestrator,
    extractor: &MetadataExtractor,
    chunking: &ChunkingConfig,
    tenant_id: &str,
    document_id: Option<&str>,
    raw_text: &str,
) -> Result<IngestReport>
where
    S: VectorIndexStore + ?Sized,
{
    if tenant_id.trim().is_empty() {
        return Err(CoreError::InputError("tenant_id must not be empty".to_string()).into());
    }

    let doc_id = document_id
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let now = chrono::Utc::now().timestamp();

    if raw_text.trim().is_empty() {
        // Redaction and chunking cannot execute on an empty document; this
        // is the one path that fails a document.
        let doc = Document {
            id: doc_id.clone(),
            tenant_id: tenant_id.to_string(),
            body: String::new(),
            status: DocumentStatus::Failed,
            failure_reason: Some("document text is empty".to_string()),
            metadata_json: None,
            created_at: now,
            updated_at: now,
        };
        store.upsert_document(&doc).await?;
        return Ok(IngestReport {
            document_id: doc_id,
            chunks_created: 0,
            embeddings_created: 0,
            status: DocumentStatus::Failed,
        });
    }

    // Scrub before the text crosses any boundary. The stored body is the
    // whitespace-normalized redacted text, the same offset space the chunk
    // spans index into.
    let (redacted, events) = redactor.scrub(raw_text);
    let body = normalize_whitespace(&redacted);

    let doc = Document {
        id: doc_id.clone(),
        tenant_id: tenant_id.to_string(),
        body,
        status: DocumentStatus::Processing,
        failure_reason: None,
        metadata_json: None,
        created_at: now,
        updated_at: now,
    };
    store.upsert_document(&doc).await?;
    store.record_redactions(tenant_id, &doc_id, &events).await?;

    // Ordinals are fixed here, before any embedding call goes out.
    let spans = chunk_text(&redacted, chunking.target_words, chunking.overlap_words);
    let chunks: Vec<Chunk> = spans
        .into_iter()
        .enumerate()
        .map(|(ordinal, span)| Chunk {
            id: Uuid::new_v4().to_string(),
            document_id: doc_id.clone(),
            tenant_id: tenant_id.to_string(),
            ordinal: ordinal as i64,
            text: span.text,
            start_offset: span.start_char as i64,
            end_offset: span.end_char as i64,
            embedding: None,
            processed: false,
        })
        .collect();
    store.insert_chunks(&chunks).await?;

    // Best-effort metadata; an empty record is stored as nothing.
    if extractor.is_available() {
        let meta = extractor.extract(&redacted).await;
        if let Ok(json) = serde_json::to_string(&meta) {
            let mut doc = doc.clone();
            doc.metadata_json = Some(json);
            store.upsert_document(&doc).await?;
        }
    }

    let mut embeddings_created = 0usize;
    if embedder.is_available() && !chunks.is_empty() {
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = embedder.embed_batch(&texts).await;
        for (chunk, slot) in chunks.iter().zip(vectors.into_iter()) {
            if let Some(embedding) = slot {
                match store.attach_embedding(&chunk.id, &embedding).await {
                    Ok(()) => embeddings_created += 1,
                    Err(e) => {
                        tracing::warn!(chunk_id = %chunk.id, error = %e, "failed to store embedding");
                    }
                }
            }
        }
    }

    store.mark_document_chunks_processed(&doc_id).await?;
    store
        .set_document_status(&doc_id, DocumentStatus::Processed, None)
        .await?;

    Ok(IngestReport {
        document_id: doc_id,
        chunks_created: chunks.len(),
        embeddings_created,
        status: DocumentStatus::Processed,
    })
}

/// CLI entry point: ingest a text file for a tenant and print the report.
pub async fn run_ingest(
    config: &crate::config::Config,
    tenant_id: &str,
    document_id: Option<&str>,
    file: &std::path::Path,
) -> Result<()> {
    let raw_text = std::fs::read_to_string(file)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {}", file.display(), e))?;

    let pool = crate::db::connect(config).await?;
    let store = crate::sqlite_store::SqliteStore::new(pool);
    let redactor = PiiRedactor::with_min_confidence(config.redaction.min_confidence);
    let embedder = EmbeddingOrchestrator::new(&config.embedding);
    let extractor = MetadataExtractor::new(&config.metadata);

    let report = ingest_document(
        &store,
        &redactor,
        &embedder,
        &extractor,
        &config.chunking,
        tenant_id,
        document_id,
        &raw_text,
    )
    .await?;

    println!("ingest {}", report.document_id);
    println!("  chunks created: {}", report.chunks_created);
    println!("  embeddings created: {}", report.embeddings_created);
    println!("  status: {}", report.status.as_str());
    println!("ok");

    store.pool().close().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EmbeddingConfig, MetadataConfig};
    use clausevault_core::store::memory::InMemoryStore;

    fn fixtures() -> (PiiRedactor, EmbeddingOrchestrator, MetadataExtractor, ChunkingConfig) {
        (
            PiiRedactor::new(),
            EmbeddingOrchestrator::new(&EmbeddingConfig::default()),
            MetadataExtractor::new(&MetadataConfig::default()),
            ChunkingConfig {
                target_words: 6,
                overlap_words: 2,
            },
        )
    }

    #[tokio::test]
    async fn test_ingest_redacts_before_persisting() {
        let store = InMemoryStore::new();
        let (redactor, embedder, extractor, chunking) = fixtures();

        let report = ingest_document(
            &store,
            &redactor,
            &embedder,
            &extractor,
            &chunking,
            "t1",
            Some("doc-1"),
            "Contact jane@example.com today. Payment is due monthly.",
        )
        .await
        .unwrap();

        assert_eq!(report.status, DocumentStatus::Processed);
        assert!(report.chunks_created > 0);

        let doc = store.get_document("doc-1").await.unwrap().unwrap();
        assert!(!doc.body.contains("jane@"), "raw PII reached the store");
        assert!(doc.body.contains("example.com"));

        let chunks = store.tenant_chunks("t1").await.unwrap();
        for c in &chunks {
            assert!(!c.text.contains("jane@"));
            assert!(c.processed);
        }
    }

    #[tokio::test]
    async fn test_ingest_assigns_contiguous_ordinals() {
        let store = InMemoryStore::new();
        let (redactor, embedder, extractor, chunking) = fixtures();

        ingest_document(
            &store,
            &redactor,
            &embedder,
            &extractor,
            &chunking,
            "t1",
            Some("doc-1"),
            "One two three. Four five six. Seven eight nine. Ten eleven twelve.",
        )
        .await
        .unwrap();

        let chunks = store.tenant_chunks("t1").await.unwrap();
        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.ordinal, i as i64);
        }
    }

    #[tokio::test]
    async fn test_embedding_failure_leaves_document_processed() {
        // Provider disabled: no embeddings, but the document still lands
        // in processed state with keyword-eligible chunks.
        let store = InMemoryStore::new();
        let (redactor, embedder, extractor, chunking) = fixtures();

        let report = ingest_document(
            &store,
            &redactor,
            &embedder,
            &extractor,
            &chunking,
            "t1",
            Some("doc-1"),
            "Term of agreement. Payment schedule. Termination clause.",
        )
        .await
        .unwrap();

        assert_eq!(report.status, DocumentStatus::Processed);
        assert_eq!(report.embeddings_created, 0);
        let chunks = store.tenant_chunks("t1").await.unwrap();
        assert!(chunks.iter().all(|c| c.embedding.is_none()));
    }

    #[tokio::test]
    async fn test_empty_text_fails_document() {
        let store = InMemoryStore::new();
        let (redactor, embedder, extractor, chunking) = fixtures();

        let report = ingest_document(
            &store,
            &redactor,
            &embedder,
            &extractor,
            &chunking,
            "t1",
            Some("doc-1"),
            "   \n ",
        )
        .await
        .unwrap();

        assert_eq!(report.status, DocumentStatus::Failed);
        assert_eq!(report.chunks_created, 0);
        let doc = store.get_document("doc-1").await.unwrap().unwrap();
        assert_eq!(doc.status, DocumentStatus::Failed);
        assert!(doc.failure_reason.is_some());
    }

    #[tokio::test]
    async fn test_audit_trail_recorded() {
        let store = InMemoryStore::new();
        let (redactor, embedder, extractor, chunking) = fixtures();

        ingest_document(
            &store,
            &redactor,
            &embedder,
            &extractor,
            &chunking,
            "t1",
            Some("doc-1"),
            "Call 415-555-0100 about SSN 123-45-6789.",
        )
        .await
        .unwrap();

        let events = store.redaction_events("t1", Some("doc-1")).await.unwrap();
        let types: Vec<&str> = events.iter().map(|e| e.entity_type.as_str()).collect();
        assert!(types.contains(&"phone_us"));
        assert!(types.contains(&"ssn_dashed"));
        for e in &events {
            assert!(!e.redacted.contains("123-45-6789"));
        }
    }

    #[tokio::test]
    async fn test_empty_tenant_rejected() {
        let store = InMemoryStore::new();
        let (redactor, embedder, extractor, chunking) = fixtures();

        let err = ingest_document(
            &store,
            &redactor,
            &embedder,
            &extractor,
            &chunking,
            "  ",
            None,
            "some text",
        )
        .await
        .unwrap_err();
        assert!(err.downcast_ref::<CoreError>().is_some());
    }
}
