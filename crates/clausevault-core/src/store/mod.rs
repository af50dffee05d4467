//! Storage abstraction for Clausevault.
//!
//! The [`VectorIndexStore`] trait defines every persistence operation the
//! ingestion and retrieval pipeline needs, scoped by tenant, enabling
//! pluggable backends (SQLite, in-memory, a future ANN-backed store).
//!
//! Implementations must be `Send + Sync` to work with async runtimes.
//!
//! # Write-once embeddings
//!
//! Chunk text is immutable once created and the embedding field may be
//! populated exactly once via [`attach_embedding`](VectorIndexStore::attach_embedding).
//! [`replace_embedding`](VectorIndexStore::replace_embedding) exists only for
//! the explicit administrative re-embedding pass; the query path never calls
//! it. Concurrent readers of the candidate set therefore need nothing beyond
//! atomic visibility of a fully-written record.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::embedding::Embedding;
use crate::models::{Chunk, Document, DocumentStatus, RedactionEvent};

/// Abstract tenant-scoped chunk and embedding store.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`upsert_document`](VectorIndexStore::upsert_document) | Insert or update a document record |
/// | [`set_document_status`](VectorIndexStore::set_document_status) | Advance the document lifecycle |
/// | [`insert_chunks`](VectorIndexStore::insert_chunks) | Persist a document's ordered chunk records |
/// | [`attach_embedding`](VectorIndexStore::attach_embedding) | Populate a chunk's embedding, write-once |
/// | [`replace_embedding`](VectorIndexStore::replace_embedding) | Administrative re-embed of one chunk |
/// | [`get_document`](VectorIndexStore::get_document) | Retrieve a document by id |
/// | [`tenant_chunks`](VectorIndexStore::tenant_chunks) | All chunks for one tenant, embeddings attached |
/// | [`unembedded_chunks`](VectorIndexStore::unembedded_chunks) | Chunks still lacking a vector |
#[async_trait]
pub trait VectorIndexStore: Send + Sync {
    /// Insert or update a document record.
    async fn upsert_document(&self, doc: &Document) -> Result<()>;

    /// Set a document's status, optionally attaching a failure reason.
    async fn set_document_status(
        &self,
        document_id: &str,
        status: DocumentStatus,
        failure_reason: Option<&str>,
    ) -> Result<()>;

    /// Persist the ordered chunk records for a document. Chunk text and
    /// spans are immutable after this call.
    async fn insert_chunks(&self, chunks: &[Chunk]) -> Result<()>;

    /// Populate a chunk's embedding. Fails if the chunk already carries one;
    /// re-embedding goes through [`replace_embedding`](Self::replace_embedding).
    async fn attach_embedding(&self, chunk_id: &str, embedding: &Embedding) -> Result<()>;

    /// Overwrite a chunk's embedding. Only the administrative re-embedding
    /// pass calls this.
    async fn replace_embedding(&self, chunk_id: &str, embedding: &Embedding) -> Result<()>;

    /// Flag every chunk of a document as processed, once the ingestion pass
    /// (including the embedding attempt, successful or not) has finished.
    async fn mark_document_chunks_processed(&self, document_id: &str) -> Result<()>;

    /// Retrieve a document by id.
    async fn get_document(&self, document_id: &str) -> Result<Option<Document>>;

    /// All chunks for one tenant in (document, ordinal) order, with any
    /// stored embeddings attached. This is the candidate set for both the
    /// keyword and the semantic engine.
    async fn tenant_chunks(&self, tenant_id: &str) -> Result<Vec<Chunk>>;

    /// Chunks that still lack an embedding, optionally scoped to a tenant
    /// and capped at `limit`.
    async fn unembedded_chunks(
        &self,
        tenant_id: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<Chunk>>;

    /// Append redaction audit records for a document. Events carry only the
    /// entity type, confidence, and redacted form.
    async fn record_redactions(
        &self,
        tenant_id: &str,
        document_id: &str,
        events: &[RedactionEvent],
    ) -> Result<()>;

    /// Read back the audit trail for a tenant, optionally for one document.
    async fn redaction_events(
        &self,
        tenant_id: &str,
        document_id: Option<&str>,
    ) -> Result<Vec<RedactionEvent>>;
}
