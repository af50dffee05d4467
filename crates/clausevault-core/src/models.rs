//! Core data models used throughout Clausevault.
//!
//! These types represent the documents, chunks, embeddings, and search
//! results that flow through the ingestion and retrieval pipeline. All
//! records are scoped to a tenant; the tenant identifier is the isolation
//! boundary for every store and search operation.

use serde::{Deserialize, Serialize};

use crate::embedding::Embedding;

/// Processing state of an ingested document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    /// Ingestion is in flight.
    Processing,
    /// Redaction, chunking, and the embedding pass have completed.
    /// Some chunks may still lack embeddings; that does not block this state.
    Processed,
    /// Redaction or chunking itself could not execute. Embedding failure
    /// alone never produces this state.
    Failed,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Processing => "processing",
            DocumentStatus::Processed => "processed",
            DocumentStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "processing" => Some(DocumentStatus::Processing),
            "processed" => Some(DocumentStatus::Processed),
            "failed" => Some(DocumentStatus::Failed),
            _ => None,
        }
    }
}

/// A document after upload-time text extraction, owned by the ingestion
/// pipeline. The stored body is the redacted text; raw text never reaches
/// the store.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    pub tenant_id: String,
    pub body: String,
    pub status: DocumentStatus,
    pub failure_reason: Option<String>,
    /// Best-effort structured fields from the metadata extractor, as JSON.
    pub metadata_json: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A bounded, offset-addressed segment of a document's redacted text.
///
/// Chunk text is immutable once created. Only `embedding` may be populated
/// after creation, exactly once; replacing an existing embedding is an
/// explicit administrative operation, never a side effect of querying.
/// Offsets index characters of the whitespace-normalized redacted body.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub id: String,
    pub document_id: String,
    pub tenant_id: String,
    /// Zero-based, sequence-unique within the document. Assigned before any
    /// embedding call is dispatched.
    pub ordinal: i64,
    pub text: String,
    pub start_offset: i64,
    pub end_offset: i64,
    pub embedding: Option<Embedding>,
    /// True once the ingestion pass (including the embedding attempt, whether
    /// or not it produced a vector) has completed for this chunk.
    pub processed: bool,
}

impl Chunk {
    pub fn has_embedding(&self) -> bool {
        self.embedding.is_some()
    }
}

/// Which retrieval strategy produced a search result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchSource {
    Semantic,
    Keyword,
    Hybrid,
}

/// A ranked retrieval hit.
///
/// `similarity` is raw cosine in [-1, 1] and is present for semantic and
/// hybrid hits. `combined_score` is present only for hybrid hits. Keyword
/// hits carry neither: their relevance derives from match position, which
/// the hybrid merger turns into a score.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub chunk_id: String,
    pub document_id: String,
    pub ordinal: i64,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub combined_score: Option<f64>,
    pub source: SearchSource,
}

/// Audit record of one redaction. Carries only the entity type, its fixed
/// confidence weight, and the redacted form. The original value is discarded
/// after replacement and must never appear here or in any log line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedactionEvent {
    pub entity_type: String,
    pub confidence: f64,
    pub redacted: String,
}
