//! JSON HTTP server exposing the ingestion and query interface.
//!
//! This is the surface the upstream collaborator (document/tenant/auth
//! layer) calls. Authentication and tenant administration live in that
//! layer, not here.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/ingest` | Redact, chunk, embed, and persist one document |
//! | `POST` | `/query` | Ranked retrieval: semantic, keyword, or hybrid |
//! | `GET`  | `/documents/{id}` | Document record by id |
//! | `GET`  | `/stats/{tenant}` | Per-tenant counts |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "query must be at least 2 characters" } }
//! ```
//!
//! Error codes: `bad_request` (400), `invalid_weight` (400), `not_found`
//! (404), `internal` (500). Provider outages never surface as errors; they
//! degrade the result set and set `degraded` on the query response.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted to support browser-based
//! clients.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use clausevault_core::error::CoreError;
use clausevault_core::redact::PiiRedactor;
use clausevault_core::store::VectorIndexStore;

use crate::config::Config;
use crate::db;
use crate::embedding::EmbeddingOrchestrator;
use crate::ingest::{ingest_document, IngestReport};
use crate::metadata::MetadataExtractor;
use crate::query::{run_query, QueryMode, QueryOptions, QueryOutcome};
use crate::sqlite_store::SqliteStore;
use crate::stats;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    store: Arc<SqliteStore>,
    redactor: Arc<PiiRedactor>,
    embedder: Arc<EmbeddingOrchestrator>,
    extractor: Arc<MetadataExtractor>,
}

/// Start the HTTP server on the configured bind address.
///
/// Runs until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let pool = db::connect(config).await?;

    let state = AppState {
        config: Arc::new(config.clone()),
        store: Arc::new(SqliteStore::new(pool)),
        redactor: Arc::new(PiiRedactor::with_min_confidence(
            config.redaction.min_confidence,
        )),
        embedder: Arc::new(EmbeddingOrchestrator::new(&config.embedding)),
        extractor: Arc::new(MetadataExtractor::new(&config.metadata)),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/ingest", post(handle_ingest))
        .route("/query", post(handle_query))
        .route("/documents/{id}", get(handle_get_document))
        .route("/stats/{tenant}", get(handle_stats))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state);

    tracing::info!(bind = %bind_addr, "server listening");
    println!("server listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(code: &str, message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: code.to_string(),
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

/// Map pipeline errors onto the HTTP error contract. Validation failures
/// from the core taxonomy become 400s; everything else is a 500.
fn classify_error(err: anyhow::Error) -> AppError {
    match err.downcast_ref::<CoreError>() {
        Some(CoreError::InputError(msg)) => bad_request("bad_request", msg.clone()),
        Some(CoreError::WeightOutOfRange(w)) => {
            bad_request("invalid_weight", format!("weight out of range [0, 1]: {}", w))
        }
        Some(CoreError::DimensionMismatch { expected, actual }) => internal(format!(
            "embedding dimension mismatch: expected {}, got {}",
            expected, actual
        )),
        _ => internal(err.to_string()),
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /ingest ============

#[derive(Deserialize)]
struct IngestRequest {
    tenant_id: String,
    document_id: Option<String>,
    text: String,
}

async fn handle_ingest(
    State(state): State<AppState>,
    Json(req): Json<IngestRequest>,
) -> Result<Json<IngestReport>, AppError> {
    let report = ingest_document(
        state.store.as_ref(),
        state.redactor.as_ref(),
        state.embedder.as_ref(),
        state.extractor.as_ref(),
        &state.config.chunking,
        &req.tenant_id,
        req.document_id.as_deref(),
        &req.text,
    )
    .await
    .map_err(classify_error)?;

    Ok(Json(report))
}

// ============ POST /query ============

#[derive(Deserialize)]
struct QueryRequest {
    tenant_id: String,
    query: String,
    #[serde(default = "default_mode")]
    mode: String,
    k: Option<usize>,
    threshold: Option<f64>,
    semantic_weight: Option<f64>,
    keyword_weight: Option<f64>,
    #[serde(default)]
    case_sensitive: bool,
}

fn default_mode() -> String {
    "hybrid".to_string()
}

async fn handle_query(
    State(state): State<AppState>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<QueryOutcome>, AppError> {
    let mode: QueryMode = req
        .mode
        .parse()
        .map_err(classify_error)?;

    let retrieval = &state.config.retrieval;
    let opts = QueryOptions {
        k: req.k.unwrap_or(retrieval.final_limit),
        threshold: req.threshold.unwrap_or(retrieval.similarity_threshold),
        semantic_weight: req.semantic_weight.unwrap_or(retrieval.semantic_weight),
        keyword_weight: req.keyword_weight.unwrap_or(retrieval.keyword_weight),
        case_sensitive: req.case_sensitive,
    };

    let outcome = run_query(
        state.store.as_ref(),
        state.embedder.as_ref(),
        &req.tenant_id,
        &req.query,
        mode,
        &opts,
    )
    .await
    .map_err(classify_error)?;

    Ok(Json(outcome))
}

// ============ GET /documents/{id} ============

#[derive(Serialize)]
struct DocumentResponse {
    id: String,
    tenant_id: String,
    status: String,
    failure_reason: Option<String>,
    metadata: serde_json::Value,
    body: String,
}

async fn handle_get_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DocumentResponse>, AppError> {
    let doc = state
        .store
        .get_document(&id)
        .await
        .map_err(|e| internal(e.to_string()))?
        .ok_or_else(|| not_found(format!("document not found: {}", id)))?;

    let metadata = doc
        .metadata_json
        .as_deref()
        .and_then(|s| serde_json::from_str(s).ok())
        .unwrap_or(serde_json::Value::Null);

    Ok(Json(DocumentResponse {
        id: doc.id,
        tenant_id: doc.tenant_id,
        status: doc.status.as_str().to_string(),
        failure_reason: doc.failure_reason,
        metadata,
        body: doc.body,
    }))
}

// ============ GET /stats/{tenant} ============

async fn handle_stats(
    State(state): State<AppState>,
    Path(tenant): Path<String>,
) -> Result<Json<stats::TenantStats>, AppError> {
    let stats = stats::tenant_stats(state.store.pool(), &tenant)
        .await
        .map_err(|e| internal(e.to_string()))?;
    Ok(Json(stats))
}
