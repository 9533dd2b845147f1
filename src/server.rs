//! HTTP server.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/upload` | Multipart upload of one or more `.pdf`/`.txt` files in field `files` |
//! | `GET`  | `/ask?query=...` | Answer a question with cited sources |
//! | `GET`  | `/health` | Readiness and configured index name |
//!
//! # Upload response
//!
//! ```json
//! { "results": [
//!     { "filename": "a.txt", "status": "success", "chunks": 3 },
//!     { "filename": "b.docx", "status": "error", "code": "unsupported_file_type",
//!       "error": "unsupported file type '.docx': only .pdf or .txt allowed" }
//! ] }
//! ```
//!
//! Per-file failures never fail the request; only a malformed multipart
//! body does.
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "generation_failure", "message": "generation failed: ..." } }
//! ```
//!
//! Caller mistakes (missing or empty question, malformed multipart) are `400`; any
//! embedding, store or generation failure is `500`.

use axum::{
    extract::{rejection::QueryRejection, DefaultBodyLimit, Multipart, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::error::PipelineError;
use crate::models::{AnswerResponse, Document, IngestionResult};
use crate::service::QaService;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    service: Arc<QaService>,
}

/// Build the router. Exposed separately from [`run_server`] so tests can
/// serve it on an ephemeral port.
pub fn router(service: Arc<QaService>, max_upload_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/upload", post(handle_upload))
        .route("/ask", get(handle_ask))
        .route("/health", get(handle_health))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(AppState { service })
}

/// Bind to `[server].bind` and serve until the process is terminated.
pub async fn run_server(config: &Config, service: Arc<QaService>) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let app = router(service, config.server.max_upload_mb * 1024 * 1024);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "server listening");
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

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        let status = if err.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        if status.is_server_error() {
            tracing::error!(code = err.code(), error = %err, "request failed");
        }
        AppError {
            status,
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    index: String,
    version: &'static str,
}

async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        index: state.service.index_name().to_string(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ============ POST /upload ============

#[derive(Serialize)]
struct UploadResponse {
    results: Vec<IngestionResult>,
}

/// Field name that carries uploaded files; may repeat.
const UPLOAD_FIELD: &str = "files";

/// Collects every `files` part that carries a filename, then ingests them
/// as one batch. Other fields are ignored.
async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut documents = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(format!("invalid multipart body: {}", e)))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| bad_request(format!("failed to read '{}': {}", filename, e)))?;
        documents.push(Document::new(filename, bytes.to_vec()));
    }

    if documents.is_empty() {
        return Err(bad_request("no files in upload"));
    }

    let results = state.service.ingest(documents).await;
    Ok(Json(UploadResponse { results }))
}

// ============ GET /ask ============

#[derive(Deserialize)]
struct AskParams {
    query: String,
    #[serde(default)]
    top_k: Option<usize>,
}

async fn handle_ask(
    State(state): State<AppState>,
    params: Result<Query<AskParams>, QueryRejection>,
) -> Result<Json<AnswerResponse>, AppError> {
    let Query(params) = params.map_err(|e| bad_request(e.body_text()))?;
    let response = state.service.ask(&params.query, params.top_k).await?;
    Ok(Json(response))
}
