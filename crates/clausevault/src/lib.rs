//! # Clausevault
//!
//! **Privacy-scrubbed document ingestion and hybrid retrieval.**
//!
//! Clausevault ingests unstructured documents, masks sensitive entities
//! before any text leaves the boundary, splits the redacted text into
//! overlapping chunks, embeds them via an external provider, and serves
//! ranked retrieval across three strategies: lexical, semantic, and a
//! weighted hybrid of both.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────────────────┐   ┌──────────┐
//! │ Upstream │──▶│ Redact → Chunk → Embed │──▶│  SQLite   │
//! │  (text)  │   │       pipeline         │   │ + vectors │
//! └──────────┘   └───────────────────────┘   └────┬─────┘
//!                                                 │
//!                              ┌──────────────────┤
//!                              ▼                  ▼
//!                        ┌──────────┐       ┌──────────┐
//!                        │   CLI    │       │   HTTP   │
//!                        │  (cvt)   │       │  (JSON)  │
//!                        └──────────┘       └──────────┘
//! ```
//!
//! ## Data Flow
//!
//! 1. Raw text enters via the CLI or `POST /ingest`, scoped to a tenant.
//! 2. The **redactor** masks sensitive entities and emits an audit trail
//!    (type, confidence, redacted form; never the original value).
//! 3. The **chunker** splits the redacted text into overlapping,
//!    offset-addressed segments with ordinals assigned up front.
//! 4. The **embedding orchestrator** ([`embedding`]) batches provider calls,
//!    isolating per-item failures; vectors are validated against the
//!    declared dimension before they reach the store.
//! 5. The **query engine** ([`query`]) serves keyword, semantic, and hybrid
//!    retrieval, degrading to keyword-only when semantic candidates are
//!    unavailable.
//!
//! ## Search Modes
//!
//! | Mode | Engine | Requires Embeddings |
//! |------|--------|---------------------|
//! | `keyword` | Substring containment, (document, ordinal) order | No |
//! | `semantic` | Cosine similarity over vectors | Yes |
//! | `hybrid` | Weighted score merge | Falls back |
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`db`] | SQLite connection pool with WAL mode |
//! | [`migrate`] | Database schema migrations (idempotent) |
//! | [`sqlite_store`] | `VectorIndexStore` over SQLite |
//! | [`embedding`] | Embedding orchestrator: batching, retry, dimension checks |
//! | [`metadata`] | Best-effort structured extraction via a generative provider |
//! | [`ingest`] | Ingestion pipeline: redact → chunk → embed → persist |
//! | [`query`] | Keyword, semantic, and hybrid retrieval with fallback |
//! | [`embed_cmd`] | Administrative re-embedding: `pending` and `rebuild` |
//! | [`audit`] | Redaction audit reporting |
//! | [`stats`] | Per-tenant document/chunk/embedding counts |
//! | [`get`] | Document retrieval by id |
//! | [`server`] | JSON HTTP server (Axum) with CORS |

pub mod audit;
pub mod config;
pub mod db;
pub mod embed_cmd;
pub mod embedding;
pub mod get;
pub mod ingest;
pub mod metadata;
pub mod migrate;
pub mod query;
pub mod server;
pub mod sqlite_store;
pub mod stats;

pub use clausevault_core::store;
