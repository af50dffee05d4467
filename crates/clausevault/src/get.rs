//! Document retrieval by id.

use anyhow::{bail, Result};

use clausevault_core::store::VectorIndexStore;

use crate::config::Config;
use crate::db;
use crate::sqlite_store::SqliteStore;

pub async fn run_get(config: &Config, document_id: &str) -> Result<()> {
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool);

    let doc = match store.get_document(document_id).await? {
        Some(doc) => doc,
        None => bail!("document not found: {}", document_id),
    };

    let chunks = store.tenant_chunks(&doc.tenant_id).await?;
    let doc_chunks: Vec<_> = chunks
        .iter()
        .filter(|c| c.document_id == doc.id)
        .collect();
    let embedded = doc_chunks.iter().filter(|c| c.has_embedding()).count();

    println!("document {}", doc.id);
    println!("  tenant: {}", doc.tenant_id);
    println!("  status: {}", doc.status.as_str());
    if let Some(reason) = &doc.failure_reason {
        println!("  failure reason: {}", reason);
    }
    println!("  chunks: {} ({} embedded)", doc_chunks.len(), embedded);
    if let Some(meta) = &doc.metadata_json {
        println!("  metadata: {}", meta);
    }
    println!();
    for c in &doc_chunks {
        println!(
            "  [{}] {}..{}",
            c.ordinal, c.start_offset, c.end_offset
        );
        let preview: String = c.text.chars().take(120).collect();
        println!("      {}", preview);
    }

    store.pool().close().await;
    Ok(())
}
