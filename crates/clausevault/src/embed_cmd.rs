//! Administrative embedding commands: `pending` and `rebuild`.
//!
//! This is the only path that may touch an existing embedding. The query
//! path never mutates vectors; a chunk left unembedded by ingestion stays
//! keyword-only until one of these passes runs.

use anyhow::{bail, Result};

use clausevault_core::store::VectorIndexStore;

use crate::config::Config;
use crate::db;
use crate::embedding::EmbeddingOrchestrator;
use crate::sqlite_store::SqliteStore;

/// Find and embed chunks that have no embedding yet.
pub async fn run_embed_pending(
    config: &Config,
    tenant: Option<&str>,
    limit: Option<usize>,
    batch_size_override: Option<usize>,
    dry_run: bool,
) -> Result<()> {
    if !config.embedding.is_enabled() {
        bail!("Embedding provider is disabled. Set [embedding] provider in config.");
    }

    let embedder = EmbeddingOrchestrator::new(&config.embedding);
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool);
    let batch_size = batch_size_override.unwrap_or(config.embedding.batch_size);

    let pending = store.unembedded_chunks(tenant, limit).await?;

    if dry_run {
        println!("embed pending (dry-run)");
        println!("  chunks needing embeddings: {}", pending.len());
        return Ok(());
    }

    if pending.is_empty() {
        println!("embed pending");
        println!("  all chunks up to date");
        return Ok(());
    }

    let total = pending.len();
    let mut embedded = 0u64;
    let mut failed = 0u64;

    for batch in pending.chunks(batch_size) {
        let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
        let vectors = embedder.embed_batch(&texts).await;

        for (chunk, slot) in batch.iter().zip(vectors.into_iter()) {
            match slot {
                Some(embedding) => match store.attach_embedding(&chunk.id, &embedding).await {
                    Ok(()) => embedded += 1,
                    Err(e) => {
                        eprintln!("Warning: failed to store embedding for {}: {}", chunk.id, e);
                        failed += 1;
                    }
                },
                None => failed += 1,
            }
        }
    }

    println!("embed pending");
    println!("  total pending: {}", total);
    println!("  embedded: {}", embedded);
    println!("  failed: {}", failed);

    store.pool().close().await;
    Ok(())
}

/// Regenerate embeddings for every chunk of one tenant.
///
/// Useful when switching embedding models or dimensions. Unlike ingestion,
/// this pass overwrites existing vectors.
pub async fn run_embed_rebuild(
    config: &Config,
    tenant: &str,
    batch_size_override: Option<usize>,
) -> Result<()> {
    if !config.embedding.is_enabled() {
        bail!("Embedding provider is disabled. Set [embedding] provider in config.");
    }

    let embedder = EmbeddingOrchestrator::new(&config.embedding);
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool);
    let batch_size = batch_size_override.unwrap_or(config.embedding.batch_size);

    let all_chunks = store.tenant_chunks(tenant).await?;

    if all_chunks.is_empty() {
        println!("embed rebuild");
        println!("  no chunks for tenant {}", tenant);
        store.pool().close().await;
        return Ok(());
    }

    let total = all_chunks.len();
    let mut embedded = 0u64;
    let mut failed = 0u64;

    for batch in all_chunks.chunks(batch_size) {
        let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
        let vectors = embedder.embed_batch(&texts).await;

        for (chunk, slot) in batch.iter().zip(vectors.into_iter()) {
            match slot {
                Some(embedding) => match store.replace_embedding(&chunk.id, &embedding).await {
                    Ok(()) => embedded += 1,
                    Err(e) => {
                        eprintln!("Warning: failed to store embedding for {}: {}", chunk.id, e);
                        failed += 1;
                    }
                },
                None => failed += 1,
            }
        }
    }

    println!("embed rebuild");
    println!("  total chunks: {}", total);
    println!("  embedded: {}", embedded);
    println!("  failed: {}", failed);

    store.pool().close().await;
    Ok(())
}
