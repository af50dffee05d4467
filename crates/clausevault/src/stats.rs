//! Per-tenant statistics: document, chunk, embedding, and audit counts.

use anyhow::Result;
use serde::Serialize;
use sqlx::{Row, SqlitePool};

use crate::config::Config;
use crate::db;

#[derive(Debug, Serialize)]
pub struct TenantStats {
    pub tenant_id: String,
    pub documents_processing: i64,
    pub documents_processed: i64,
    pub documents_failed: i64,
    pub chunks: i64,
    pub embedded_chunks: i64,
    pub redaction_events: i64,
}

pub async fn tenant_stats(pool: &SqlitePool, tenant_id: &str) -> Result<TenantStats> {
    let mut stats = TenantStats {
        tenant_id: tenant_id.to_string(),
        documents_processing: 0,
        documents_processed: 0,
        documents_failed: 0,
        chunks: 0,
        embedded_chunks: 0,
        redaction_events: 0,
    };

    let rows = sqlx::query(
        "SELECT status, COUNT(*) AS n FROM documents WHERE tenant_id = ? GROUP BY status",
    )
    .bind(tenant_id)
    .fetch_all(pool)
    .await?;
    for row in rows {
        let status: String = row.get("status");
        let n: i64 = row.get("n");
        match status.as_str() {
            "processing" => stats.documents_processing = n,
            "processed" => stats.documents_processed = n,
            "failed" => stats.documents_failed = n,
            _ => {}
        }
    }

    stats.chunks = sqlx::query_scalar("SELECT COUNT(*) FROM chunks WHERE tenant_id = ?")
        .bind(tenant_id)
        .fetch_one(pool)
        .await?;

    stats.embedded_chunks =
        sqlx::query_scalar("SELECT COUNT(*) FROM chunk_vectors WHERE tenant_id = ?")
            .bind(tenant_id)
            .fetch_one(pool)
            .await?;

    stats.redaction_events =
        sqlx::query_scalar("SELECT COUNT(*) FROM redaction_audit WHERE tenant_id = ?")
            .bind(tenant_id)
            .fetch_one(pool)
            .await?;

    Ok(stats)
}

pub async fn run_stats(config: &Config, tenant_id: &str) -> Result<()> {
    let pool = db::connect(config).await?;
    let stats = tenant_stats(&pool, tenant_id).await?;

    println!("stats for tenant {}", stats.tenant_id);
    println!("  documents processing: {}", stats.documents_processing);
    println!("  documents processed: {}", stats.documents_processed);
    println!("  documents failed: {}", stats.documents_failed);
    println!("  chunks: {}", stats.chunks);
    println!("  embedded chunks: {}", stats.embedded_chunks);
    println!("  redaction events: {}", stats.redaction_events);

    pool.close().await;
    Ok(())
}
