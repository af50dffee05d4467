//! Lexical containment search over chunk text.
//!
//! Keyword results intentionally carry no relevance score: relevance derives
//! only from match position, which the hybrid merger turns into a score.

use crate::models::{Chunk, SearchResult, SearchSource};

/// Find chunks whose text contains `query`, scoped to one tenant's chunks.
///
/// Matching is plain substring containment, case-insensitive unless
/// `case_sensitive` is set. Results are returned in (document, ordinal)
/// order and truncated to `limit`.
pub fn keyword_search(
    query: &str,
    chunks: &[Chunk],
    limit: usize,
    case_sensitive: bool,
) -> Vec<SearchResult> {
    let query = query.trim();
    if query.is_empty() {
        return Vec::new();
    }

    let needle = if case_sensitive {
        query.to_string()
    } else {
        query.to_lowercase()
    };

    let mut hits: Vec<&Chunk> = chunks
        .iter()
        .filter(|c| {
            if case_sensitive {
                c.text.contains(&needle)
            } else {
                c.text.to_lowercase().contains(&needle)
            }
        })
        .collect();

    hits.sort_by(|a, b| {
        a.document_id
            .cmp(&b.document_id)
            .then(a.ordinal.cmp(&b.ordinal))
    });
    hits.truncate(limit);

    hits.into_iter()
        .map(|c| SearchResult {
            chunk_id: c.id.clone(),
            document_id: c.document_id.clone(),
            ordinal: c.ordinal,
            text: c.text.clone(),
            similarity: None,
            combined_score: None,
            source: SearchSource::Keyword,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &str, doc: &str, ordinal: i64, text: &str) -> Chunk {
        Chunk {
            id: id.to_string(),
            document_id: doc.to_string(),
            tenant_id: "t1".to_string(),
            ordinal,
            text: text.to_string(),
            start_offset: 0,
            end_offset: text.len() as i64,
            embedding: None,
            processed: true,
        }
    }

    #[test]
    fn test_case_insensitive_by_default() {
        let chunks = vec![chunk("a", "d1", 0, "Termination for Convenience")];
        let hits = keyword_search("termination", &chunks, 10, false);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].source, SearchSource::Keyword);
    }

    #[test]
    fn test_case_sensitive_mode() {
        let chunks = vec![chunk("a", "d1", 0, "Termination for Convenience")];
        assert!(keyword_search("termination", &chunks, 10, true).is_empty());
        assert_eq!(keyword_search("Termination", &chunks, 10, true).len(), 1);
    }

    #[test]
    fn test_results_in_document_ordinal_order() {
        let chunks = vec![
            chunk("c", "d2", 0, "payment terms apply"),
            chunk("a", "d1", 3, "payment schedule"),
            chunk("b", "d1", 1, "late payment penalty"),
        ];
        let hits = keyword_search("payment", &chunks, 10, false);
        let order: Vec<(&str, i64)> = hits
            .iter()
            .map(|h| (h.document_id.as_str(), h.ordinal))
            .collect();
        assert_eq!(order, vec![("d1", 1), ("d1", 3), ("d2", 0)]);
    }

    #[test]
    fn test_no_score_attached() {
        let chunks = vec![chunk("a", "d1", 0, "indemnification clause")];
        let hits = keyword_search("indemnification", &chunks, 10, false);
        assert!(hits[0].similarity.is_none());
        assert!(hits[0].combined_score.is_none());
    }

    #[test]
    fn test_limit_applied() {
        let chunks: Vec<Chunk> = (0..10)
            .map(|i| chunk(&format!("c{}", i), "d1", i, "warranty text"))
            .collect();
        assert_eq!(keyword_search("warranty", &chunks, 3, false).len(), 3);
    }

    #[test]
    fn test_empty_query_yields_nothing() {
        let chunks = vec![chunk("a", "d1", 0, "anything")];
        assert!(keyword_search("   ", &chunks, 10, false).is_empty());
    }
}
