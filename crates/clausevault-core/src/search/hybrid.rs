//! Weighted merge of semantic and keyword result sets.
//!
//! The two inputs live in different score spaces: semantic hits carry raw
//! cosine similarity, keyword hits carry no score at all. The merge maps
//! each into a weighted contribution, sums contributions for chunks present
//! in both sets, and ranks the union, keeping the heterogeneous spaces
//! comparable without forcing a shared numeric scale.

use std::collections::HashMap;

use crate::error::CoreError;
use crate::models::{SearchResult, SearchSource};

/// Merge semantic and keyword results into one ranked list.
///
/// Each semantic result contributes `similarity * semantic_weight`. Each
/// keyword result at position `i` of `n` contributes
/// `(1 - i/n) * keyword_weight`: ordinal rank stands in for relevance. A
/// chunk present in both inputs gets the sum of its contributions and the
/// `hybrid` source tag. The union is sorted by combined score descending
/// (ties by ascending chunk ordinal) and truncated to `k`.
///
/// Weights outside `[0, 1]` are rejected synchronously.
pub fn merge(
    semantic: &[SearchResult],
    keyword: &[SearchResult],
    semantic_weight: f64,
    keyword_weight: f64,
    k: usize,
) -> Result<Vec<SearchResult>, CoreError> {
    for w in [semantic_weight, keyword_weight] {
        if !(0.0..=1.0).contains(&w) {
            return Err(CoreError::WeightOutOfRange(w));
        }
    }

    struct Entry {
        result: SearchResult,
        score: f64,
        in_both: bool,
    }

    let mut merged: HashMap<String, Entry> = HashMap::new();

    for r in semantic {
        let contribution = r.similarity.unwrap_or(0.0) * semantic_weight;
        merged.insert(
            r.chunk_id.clone(),
            Entry {
                result: r.clone(),
                score: contribution,
                in_both: false,
            },
        );
    }

    let n = keyword.len();
    for (i, r) in keyword.iter().enumerate() {
        let contribution = (1.0 - i as f64 / n as f64) * keyword_weight;
        match merged.get_mut(&r.chunk_id) {
            Some(entry) => {
                entry.score += contribution;
                entry.in_both = true;
            }
            None => {
                merged.insert(
                    r.chunk_id.clone(),
                    Entry {
                        result: r.clone(),
                        score: contribution,
                        in_both: false,
                    },
                );
            }
        }
    }

    let mut results: Vec<SearchResult> = merged
        .into_values()
        .map(|entry| {
            let mut r = entry.result;
            if entry.in_both {
                r.source = SearchSource::Hybrid;
            }
            r.combined_score = Some(entry.score);
            r
        })
        .collect();

    results.sort_by(|a, b| {
        b.combined_score
            .partial_cmp(&a.combined_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.ordinal.cmp(&b.ordinal))
    });
    results.truncate(k);

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn semantic_hit(chunk_id: &str, ordinal: i64, similarity: f64) -> SearchResult {
        SearchResult {
            chunk_id: chunk_id.to_string(),
            document_id: "d1".to_string(),
            ordinal,
            text: String::new(),
            similarity: Some(similarity),
            combined_score: None,
            source: SearchSource::Semantic,
        }
    }

    fn keyword_hit(chunk_id: &str, ordinal: i64) -> SearchResult {
        SearchResult {
            chunk_id: chunk_id.to_string(),
            document_id: "d1".to_string(),
            ordinal,
            text: String::new(),
            similarity: None,
            combined_score: None,
            source: SearchSource::Keyword,
        }
    }

    #[test]
    fn test_rejects_weight_above_one() {
        let err = merge(&[], &[], 0.7, 1.2, 10).unwrap_err();
        assert!(matches!(err, CoreError::WeightOutOfRange(w) if (w - 1.2).abs() < 1e-9));
    }

    #[test]
    fn test_rejects_negative_weight() {
        assert!(merge(&[], &[], -0.1, 0.5, 10).is_err());
    }

    #[test]
    fn test_chunk_in_both_sets_sums_and_tags_hybrid() {
        let semantic = vec![semantic_hit("c1", 0, 0.8)];
        let keyword = vec![keyword_hit("c1", 0), keyword_hit("c2", 1)];
        let merged = merge(&semantic, &keyword, 0.7, 0.3, 10).unwrap();

        let c1 = merged.iter().find(|r| r.chunk_id == "c1").unwrap();
        // semantic 0.8 * 0.7 plus keyword position 0 of 2: (1 - 0/2) * 0.3
        let expected = 0.8 * 0.7 + 1.0 * 0.3;
        assert!((c1.combined_score.unwrap() - expected).abs() < 1e-9);
        assert_eq!(c1.source, SearchSource::Hybrid);
    }

    #[test]
    fn test_single_source_entries_keep_their_tag() {
        let semantic = vec![semantic_hit("c1", 0, 0.9)];
        let keyword = vec![keyword_hit("c2", 1)];
        let merged = merge(&semantic, &keyword, 0.5, 0.5, 10).unwrap();

        let c1 = merged.iter().find(|r| r.chunk_id == "c1").unwrap();
        let c2 = merged.iter().find(|r| r.chunk_id == "c2").unwrap();
        assert_eq!(c1.source, SearchSource::Semantic);
        assert_eq!(c2.source, SearchSource::Keyword);
    }

    #[test]
    fn test_keyword_positional_scores_decay() {
        let keyword = vec![
            keyword_hit("c1", 0),
            keyword_hit("c2", 1),
            keyword_hit("c3", 2),
        ];
        let merged = merge(&[], &keyword, 0.0, 1.0, 10).unwrap();
        let scores: Vec<f64> = merged.iter().map(|r| r.combined_score.unwrap()).collect();
        // positions 0, 1, 2 of 3: 1.0, 2/3, 1/3
        assert!((scores[0] - 1.0).abs() < 1e-9);
        assert!((scores[1] - 2.0 / 3.0).abs() < 1e-9);
        assert!((scores[2] - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_sorted_descending_with_ordinal_tie_break() {
        let semantic = vec![semantic_hit("b", 4, 0.5), semantic_hit("a", 1, 0.5)];
        let merged = merge(&semantic, &[], 1.0, 0.0, 10).unwrap();
        let ids: Vec<&str> = merged.iter().map(|r| r.chunk_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_truncates_to_k() {
        let keyword: Vec<SearchResult> =
            (0..10).map(|i| keyword_hit(&format!("c{}", i), i)).collect();
        let merged = merge(&[], &keyword, 0.0, 1.0, 3).unwrap();
        assert_eq!(merged.len(), 3);
    }

    #[test]
    fn test_empty_inputs_merge_to_empty() {
        assert!(merge(&[], &[], 0.7, 0.3, 10).unwrap().is_empty());
    }

    #[test]
    fn test_scores_non_increasing() {
        let semantic = vec![
            semantic_hit("a", 0, 0.9),
            semantic_hit("b", 1, 0.2),
            semantic_hit("c", 2, 0.6),
        ];
        let keyword = vec![keyword_hit("b", 1), keyword_hit("d", 3)];
        let merged = merge(&semantic, &keyword, 0.7, 0.3, 10).unwrap();
        for pair in merged.windows(2) {
            assert!(pair[0].combined_score >= pair[1].combined_score);
        }
    }
}
