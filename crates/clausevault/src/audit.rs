//! Redaction audit reporting.
//!
//! Prints the persisted audit trail for a tenant: entity type, confidence,
//! and redacted form. Original values are never stored, so they cannot be
//! printed here.

use anyhow::Result;

use clausevault_core::store::VectorIndexStore;

use crate::config::Config;
use crate::db;
use crate::sqlite_store::SqliteStore;

pub async fn run_audit(config: &Config, tenant_id: &str, document_id: Option<&str>) -> Result<()> {
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool);

    let events = store.redaction_events(tenant_id, document_id).await?;

    if events.is_empty() {
        println!("no redaction events for tenant {}", tenant_id);
    } else {
        println!("redaction events for tenant {}", tenant_id);
        for e in &events {
            println!("  {:<18} {:.2}  {}", e.entity_type, e.confidence, e.redacted);
        }
        println!("  total: {}", events.len());
    }

    store.pool().close().await;
    Ok(())
}
