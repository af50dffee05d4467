//! Query engine: mode dispatch, degradation, and hybrid merging.
//!
//! Wires the pure retrieval engines from `clausevault-core` to a store and
//! the embedding orchestrator. A semantic query that cannot be served (the
//! provider is down, the query embedding fails, or no tenant chunk carries a
//! vector) silently degrades to keyword mode; the outcome records that the
//! fallback happened so callers branch deliberately instead of relying on
//! suppressed errors. Provider outages are invisible to the caller except as
//! reduced result quality.

use std::str::FromStr;

use anyhow::Result;
use serde::Serialize;

use clausevault_core::error::CoreError;
use clausevault_core::models::SearchResult;
use clausevault_core::search::{keyword_search, merge, semantic_search, SemanticOutcome};
use clausevault_core::store::VectorIndexStore;

use crate::embedding::EmbeddingOrchestrator;

/// Retrieval strategy requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMode {
    Semantic,
    Keyword,
    Hybrid,
}

impl FromStr for QueryMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "semantic" => Ok(QueryMode::Semantic),
            "keyword" => Ok(QueryMode::Keyword),
            "hybrid" => Ok(QueryMode::Hybrid),
            other => Err(CoreError::InputError(format!(
                "unknown search mode: {}. Use semantic, keyword, or hybrid.",
                other
            ))
            .into()),
        }
    }
}

/// Retrieval tuning parameters for one query.
#[derive(Debug, Clone)]
pub struct QueryOptions {
    pub k: usize,
    /// Raw cosine threshold in [-1, 1]; hits at or below it are discarded.
    pub threshold: f64,
    pub semantic_weight: f64,
    pub keyword_weight: f64,
    pub case_sensitive: bool,
}

/// A ranked result list plus an explicit marker for keyword fallback.
#[derive(Debug, Serialize)]
pub struct QueryOutcome {
    pub results: Vec<SearchResult>,
    /// True when a semantic or hybrid query fell back to keyword-only
    /// results because no semantic candidates were available.
    pub degraded: bool,
}

/// Run one tenant-scoped query.
pub async fn run_query<S>(
    store: &S,
    embedder: &EmbeddingOrchestrator,
    tenant_id: &str,
    query: &str,
    mode: QueryMode,
    opts: &QueryOptions,
) -> Result<QueryOutcome>
where
    S: VectorIndexStore + ?Sized,
{
    let trimmed = query.trim();
    if trimmed.len() < 2 {
        return Err(CoreError::InputError(
            "query must be at least 2 characters".to_string(),
        )
        .into());
    }

    // Weight validation is synchronous: a bad request never reaches the
    // provider or the store.
    if mode == QueryMode::Hybrid {
        for w in [opts.semantic_weight, opts.keyword_weight] {
            if !(0.0..=1.0).contains(&w) {
                return Err(CoreError::WeightOutOfRange(w).into());
            }
        }
    }

    let chunks = store.tenant_chunks(tenant_id).await?;

    match mode {
        QueryMode::Keyword => {
            let results = keyword_search(trimmed, &chunks, opts.k, opts.case_sensitive);
            Ok(QueryOutcome {
                results,
                degraded: false,
            })
        }
        QueryMode::Semantic => {
            match semantic_candidates(embedder, trimmed, &chunks, opts).await {
                Some(results) => Ok(QueryOutcome {
                    results,
                    degraded: false,
                }),
                None => {
                    let results = keyword_search(trimmed, &chunks, opts.k, opts.case_sensitive);
                    Ok(QueryOutcome {
                        results,
                        degraded: true,
                    })
                }
            }
        }
        QueryMode::Hybrid => {
            let keyword = keyword_search(trimmed, &chunks, opts.k, opts.case_sensitive);
            let (semantic, degraded) =
                match semantic_candidates(embedder, trimmed, &chunks, opts).await {
                    Some(results) => (results, false),
                    None => (Vec::new(), true),
                };
            let results = merge(
                &semantic,
                &keyword,
                opts.semantic_weight,
                opts.keyword_weight,
                opts.k,
            )
            .map_err(anyhow::Error::from)?;
            Ok(QueryOutcome { results, degraded })
        }
    }
}

/// Produce ranked semantic hits, or `None` when semantic search cannot be
/// served for this query (provider unavailable, embedding failed, or no
/// embedded candidates).
async fn semantic_candidates(
    embedder: &EmbeddingOrchestrator,
    query: &str,
    chunks: &[clausevault_core::models::Chunk],
    opts: &QueryOptions,
) -> Option<Vec<SearchResult>> {
    if !embedder.is_available() {
        tracing::debug!("embedding provider unavailable, keyword fallback");
        return None;
    }

    let query_vec = match embedder.embed_query(query).await {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = %e, "query embedding failed, keyword fallback");
            return None;
        }
    };

    match semantic_search(&query_vec, chunks, opts.k, opts.threshold) {
        SemanticOutcome::Ranked(results) => Some(results),
        SemanticOutcome::NoCandidates => {
            tracing::debug!("no embedded candidates for tenant, keyword fallback");
            None
        }
    }
}

/// CLI entry point: run a search and print ranked results.
#[allow(clippy::too_many_arguments)]
pub async fn run_search(
    config: &crate::config::Config,
    tenant_id: &str,
    query: &str,
    mode: &str,
    limit: Option<usize>,
    threshold: Option<f64>,
    case_sensitive: bool,
) -> Result<()> {
    let mode = QueryMode::from_str(mode)?;
    let opts = QueryOptions {
        k: limit.unwrap_or(config.retrieval.final_limit),
        threshold: threshold.unwrap_or(config.retrieval.similarity_threshold),
        semantic_weight: config.retrieval.semantic_weight,
        keyword_weight: config.retrieval.keyword_weight,
        case_sensitive,
    };

    let pool = crate::db::connect(config).await?;
    let store = crate::sqlite_store::SqliteStore::new(pool);
    let embedder = EmbeddingOrchestrator::new(&config.embedding);

    let outcome = run_query(&store, &embedder, tenant_id, query, mode, &opts).await?;

    if outcome.degraded {
        println!("(semantic candidates unavailable, keyword results shown)");
    }
    if outcome.results.is_empty() {
        println!("no results");
    }
    for (i, r) in outcome.results.iter().enumerate() {
        let score = r
            .combined_score
            .or(r.similarity)
            .map(|s| format!("{:.4}", s))
            .unwrap_or_else(|| "-".to_string());
        let preview: String = r.text.chars().take(120).collect();
        println!(
            "{:>2}. [{:?}] doc {} chunk {} score {}",
            i + 1,
            r.source,
            r.document_id,
            r.ordinal,
            score
        );
        println!("    {}", preview);
    }

    store.pool().close().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EmbeddingConfig;
    use clausevault_core::models::{Chunk, SearchSource};
    use clausevault_core::store::memory::InMemoryStore;
    use clausevault_core::store::VectorIndexStore;

    fn opts() -> QueryOptions {
        QueryOptions {
            k: 10,
            threshold: 0.0,
            semantic_weight: 0.7,
            keyword_weight: 0.3,
            case_sensitive: false,
        }
    }

    fn chunk(id: &str, ordinal: i64, text: &str) -> Chunk {
        Chunk {
            id: id.to_string(),
            document_id: "d1".to_string(),
            tenant_id: "t1".to_string(),
            ordinal,
            text: text.to_string(),
            start_offset: 0,
            end_offset: text.len() as i64,
            embedding: None,
            processed: true,
        }
    }

    async fn seeded_store() -> InMemoryStore {
        let store = InMemoryStore::new();
        store
            .insert_chunks(&[
                chunk("c1", 0, "termination for convenience"),
                chunk("c2", 1, "payment terms net thirty"),
            ])
            .await
            .unwrap();
        store
    }

    fn disabled_embedder() -> EmbeddingOrchestrator {
        EmbeddingOrchestrator::new(&EmbeddingConfig::default())
    }

    #[tokio::test]
    async fn test_keyword_mode() {
        let store = seeded_store().await;
        let outcome = run_query(
            &store,
            &disabled_embedder(),
            "t1",
            "payment",
            QueryMode::Keyword,
            &opts(),
        )
        .await
        .unwrap();
        assert_eq!(outcome.results.len(), 1);
        assert!(!outcome.degraded);
        assert_eq!(outcome.results[0].source, SearchSource::Keyword);
    }

    #[tokio::test]
    async fn test_semantic_degrades_to_keyword_when_provider_down() {
        let store = seeded_store().await;
        let outcome = run_query(
            &store,
            &disabled_embedder(),
            "t1",
            "payment",
            QueryMode::Semantic,
            &opts(),
        )
        .await
        .unwrap();
        assert!(outcome.degraded);
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].source, SearchSource::Keyword);
    }

    #[tokio::test]
    async fn test_hybrid_degrades_but_still_ranks_keyword_hits() {
        let store = seeded_store().await;
        let outcome = run_query(
            &store,
            &disabled_embedder(),
            "t1",
            "termination",
            QueryMode::Hybrid,
            &opts(),
        )
        .await
        .unwrap();
        assert!(outcome.degraded);
        assert_eq!(outcome.results.len(), 1);
        assert!(outcome.results[0].combined_score.is_some());
    }

    #[tokio::test]
    async fn test_invalid_weight_rejected_synchronously() {
        let store = seeded_store().await;
        let mut bad = opts();
        bad.keyword_weight = 1.2;
        let err = run_query(
            &store,
            &disabled_embedder(),
            "t1",
            "payment",
            QueryMode::Hybrid,
            &bad,
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CoreError>(),
            Some(CoreError::WeightOutOfRange(_))
        ));
    }

    #[tokio::test]
    async fn test_short_query_rejected() {
        let store = seeded_store().await;
        let err = run_query(
            &store,
            &disabled_embedder(),
            "t1",
            " a ",
            QueryMode::Keyword,
            &opts(),
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CoreError>(),
            Some(CoreError::InputError(_))
        ));
    }

    #[tokio::test]
    async fn test_tenant_isolation_in_queries() {
        let store = seeded_store().await;
        let outcome = run_query(
            &store,
            &disabled_embedder(),
            "other-tenant",
            "payment",
            QueryMode::Keyword,
            &opts(),
        )
        .await
        .unwrap();
        assert!(outcome.results.is_empty());
    }
}
