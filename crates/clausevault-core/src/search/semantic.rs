//! Cosine-similarity ranking over a tenant's embedded chunks.

use crate::embedding::{cosine_similarity, Embedding};
use crate::models::{Chunk, SearchResult, SearchSource};

/// Outcome of a semantic search pass.
///
/// `NoCandidates` is a defined outcome, not an error: it tells the caller
/// that no chunk in the tenant's set carries an embedding, so a keyword
/// fallback is the right next step. An empty `Ranked` list means candidates
/// existed but none cleared the threshold.
#[derive(Debug)]
pub enum SemanticOutcome {
    Ranked(Vec<SearchResult>),
    NoCandidates,
}

/// Rank `candidates` against `query` by cosine similarity.
///
/// Every embedded candidate is scored (linear scan), results with similarity
/// at or below `threshold` are discarded, the remainder is sorted by
/// similarity descending, and the list is truncated to `k`. Equal scores are
/// ordered by ascending chunk ordinal so identical inputs always produce
/// identical output.
pub fn semantic_search(
    query: &Embedding,
    candidates: &[Chunk],
    k: usize,
    threshold: f64,
) -> SemanticOutcome {
    let embedded: Vec<&Chunk> = candidates.iter().filter(|c| c.has_embedding()).collect();
    if embedded.is_empty() {
        return SemanticOutcome::NoCandidates;
    }

    let mut hits: Vec<SearchResult> = embedded
        .iter()
        .filter_map(|chunk| {
            let vector = chunk.embedding.as_ref()?;
            let similarity = cosine_similarity(query.as_slice(), vector.as_slice()) as f64;
            if similarity <= threshold {
                return None;
            }
            Some(SearchResult {
                chunk_id: chunk.id.clone(),
                document_id: chunk.document_id.clone(),
                ordinal: chunk.ordinal,
                text: chunk.text.clone(),
                similarity: Some(similarity),
                combined_score: None,
                source: SearchSource::Semantic,
            })
        })
        .collect();

    hits.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.ordinal.cmp(&b.ordinal))
    });
    hits.truncate(k);

    SemanticOutcome::Ranked(hits)
}
