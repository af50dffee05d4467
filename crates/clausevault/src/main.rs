//! # Clausevault CLI (`cvt`)
//!
//! The `cvt` binary is the operator interface for Clausevault. It provides
//! commands for database initialization, document ingestion, search,
//! embedding management, audit inspection, and the HTTP server.
//!
//! ## Usage
//!
//! ```bash
//! cvt --config ./config/cvt.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `cvt init` | Create the SQLite database and run schema migrations |
//! | `cvt ingest --tenant T <file>` | Redact, chunk, embed, and store one document |
//! | `cvt search "<query>" --tenant T` | Search a tenant's indexed chunks |
//! | `cvt get <id>` | Show a document with its chunks |
//! | `cvt embed pending` | Backfill missing embeddings |
//! | `cvt embed rebuild --tenant T` | Regenerate a tenant's embeddings |
//! | `cvt audit --tenant T` | Print the redaction audit trail |
//! | `cvt stats --tenant T` | Per-tenant counts |
//! | `cvt serve` | Start the JSON HTTP server |

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod audit;
mod config;
mod db;
mod embed_cmd;
mod embedding;
mod get;
mod ingest;
mod metadata;
mod migrate;
mod query;
mod server;
mod sqlite_store;
mod stats;

/// Clausevault CLI — privacy-scrubbed document ingestion and hybrid
/// retrieval.
#[derive(Parser)]
#[command(
    name = "cvt",
    about = "Clausevault — privacy-scrubbed document ingestion and hybrid retrieval",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/cvt.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and all required tables (documents,
    /// chunks, chunk_vectors, redaction_audit). Idempotent.
    Init,

    /// Ingest a document for a tenant.
    ///
    /// Scrubs PII, chunks the redacted text, embeds the chunks when an
    /// embedding provider is configured, and stores everything. Embedding
    /// failure leaves chunks keyword-only; it never fails the document.
    Ingest {
        /// Path to a plain-text file (post-extraction document text).
        file: PathBuf,

        /// Tenant the document belongs to.
        #[arg(long)]
        tenant: String,

        /// Document id; generated when omitted.
        #[arg(long)]
        id: Option<String>,
    },

    /// Search a tenant's indexed chunks.
    ///
    /// A semantic or hybrid query with no embedded candidates degrades to
    /// keyword results and says so.
    Search {
        /// The search query string.
        query: String,

        /// Tenant scope for the query.
        #[arg(long)]
        tenant: String,

        /// Search mode: `keyword`, `semantic`, or `hybrid`.
        #[arg(long, default_value = "keyword")]
        mode: String,

        /// Maximum number of results to return.
        #[arg(long)]
        limit: Option<usize>,

        /// Cosine similarity threshold in [-1, 1]; hits at or below it are
        /// discarded.
        #[arg(long)]
        threshold: Option<f64>,

        /// Match keyword queries case-sensitively.
        #[arg(long)]
        case_sensitive: bool,
    },

    /// Show a document with its chunks.
    Get {
        /// Document id.
        id: String,
    },

    /// Manage embedding vectors.
    Embed {
        #[command(subcommand)]
        action: EmbedAction,
    },

    /// Print the redaction audit trail for a tenant.
    ///
    /// Shows entity type, confidence, and redacted form for every masked
    /// entity. Original values are never stored.
    Audit {
        #[arg(long)]
        tenant: String,

        /// Limit the trail to one document.
        #[arg(long)]
        document: Option<String>,
    },

    /// Per-tenant document, chunk, and embedding counts.
    Stats {
        #[arg(long)]
        tenant: String,
    },

    /// Start the JSON HTTP server.
    Serve,
}

/// Embedding management subcommands.
#[derive(Subcommand)]
enum EmbedAction {
    /// Embed chunks that have no embedding yet.
    ///
    /// This is the administrative path that backfills chunks left
    /// un-embedded by provider outages during ingestion.
    Pending {
        /// Restrict to one tenant.
        #[arg(long)]
        tenant: Option<String>,

        /// Maximum number of chunks to embed in this run.
        #[arg(long)]
        limit: Option<usize>,

        /// Override the batch size from config.
        #[arg(long)]
        batch_size: Option<usize>,

        /// Show counts without performing any embedding.
        #[arg(long)]
        dry_run: bool,
    },

    /// Regenerate all embeddings for one tenant.
    ///
    /// Useful when switching embedding models or dimensions. This is the
    /// only operation that overwrites existing vectors.
    Rebuild {
        #[arg(long)]
        tenant: String,

        /// Override the batch size from config.
        #[arg(long)]
        batch_size: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Ingest { file, tenant, id } => {
            ingest::run_ingest(&cfg, &tenant, id.as_deref(), &file).await?;
        }
        Commands::Search {
            query,
            tenant,
            mode,
            limit,
            threshold,
            case_sensitive,
        } => {
            query::run_search(&cfg, &tenant, &query, &mode, limit, threshold, case_sensitive)
                .await?;
        }
        Commands::Get { id } => {
            get::run_get(&cfg, &id).await?;
        }
        Commands::Embed { action } => match action {
            EmbedAction::Pending {
                tenant,
                limit,
                batch_size,
                dry_run,
            } => {
                embed_cmd::run_embed_pending(&cfg, tenant.as_deref(), limit, batch_size, dry_run)
                    .await?;
            }
            EmbedAction::Rebuild { tenant, batch_size } => {
                embed_cmd::run_embed_rebuild(&cfg, &tenant, batch_size).await?;
            }
        },
        Commands::Audit { tenant, document } => {
            audit::run_audit(&cfg, &tenant, document.as_deref()).await?;
        }
        Commands::Stats { tenant } => {
            stats::run_stats(&cfg, &tenant).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
