//! HTTP API server for integration with other systems.
//!
//! A thin JSON layer over the orchestrator.

use crate::cli::Output;
use crate::config::{Settings, MAX_BATCH_WORKERS};
use crate::error::KortError;
use crate::orchestrator::{AskRequest, BatchRequest, Orchestrator, ProcessRequest};
use crate::source::youtube;
use crate::translate::check_language;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Largest batch accepted over HTTP.
const MAX_BATCH_SOURCES: usize = MAX_BATCH_WORKERS;

/// Shared application state.
struct AppState {
    orchestrator: Orchestrator,
}

/// Run the HTTP API server.
pub async fn run_serve(host: Option<String>, port: Option<u16>, settings: Settings) -> anyhow::Result<()> {
    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);

    let orchestrator = Orchestrator::new(settings).await?;
    let app = router(Arc::new(AppState { orchestrator }));

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Kort API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Process", "POST /process");
    Output::kv("Batch", "POST /process-batch");
    Output::kv("Info", "POST /info");
    Output::kv("Ask", "POST /ask");
    Output::kv("Suggestions", "POST /suggestions");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/process", post(process))
        .route("/process-batch", post(process_batch))
        .route("/info", post(info))
        .route("/ask", post(ask))
        .route("/suggestions", post(suggestions))
        .layer(cors)
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InfoRequest {
    source_reference: String,
}

#[derive(Deserialize)]
struct SuggestionsRequest {
    document: String,
}

#[derive(Serialize)]
struct SuggestionsResponse {
    suggestions: Vec<String>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (status, Json(ErrorResponse { error: error.into() })).into_response()
}

fn status_for(err: &KortError) -> StatusCode {
    match err {
        KortError::Validation(_) | KortError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Rejects anything that is neither a YouTube URL nor a bare video ID.
fn check_source(reference: &str) -> Result<(), Response> {
    let trimmed = reference.trim();
    if trimmed.is_empty() {
        return Err(error_response(StatusCode::BAD_REQUEST, "sourceReference is required"));
    }
    if youtube::extract_video_id(trimmed).is_none() && !youtube::is_youtube_url(trimmed) {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            format!("Not a YouTube URL or video ID: {}", trimmed),
        ));
    }
    Ok(())
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn process(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ProcessRequest>,
) -> Response {
    if let Err(response) = check_source(&req.source_reference) {
        return response;
    }
    if let Err(e) = check_language(&req.target_language) {
        return error_response(status_for(&e), e.to_string());
    }
    let outcome = state.orchestrator.process_single(req).await;
    let status = if outcome.error.is_some() {
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        StatusCode::OK
    };
    (status, Json(outcome)).into_response()
}

async fn process_batch(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BatchRequest>,
) -> Response {
    if req.source_references.len() > MAX_BATCH_SOURCES {
        return error_response(
            StatusCode::BAD_REQUEST,
            format!("At most {} sources per batch", MAX_BATCH_SOURCES),
        );
    }
    match state.orchestrator.process_batch(req).await {
        Ok(result) => Json(result).into_response(),
        Err(e) => error_response(status_for(&e), e.to_string()),
    }
}

async fn info(State(state): State<Arc<AppState>>, Json(req): Json<InfoRequest>) -> Response {
    if let Err(response) = check_source(&req.source_reference) {
        return response;
    }
    match state.orchestrator.video_info(&req.source_reference).await {
        Ok(metadata) => Json(metadata).into_response(),
        Err(e) => error_response(status_for(&e), e.to_string()),
    }
}

async fn ask(State(state): State<Arc<AppState>>, Json(req): Json<AskRequest>) -> Response {
    match state.orchestrator.ask(req).await {
        Ok(result) => Json(result).into_response(),
        Err(e) => error_response(status_for(&e), e.to_string()),
    }
}

async fn suggestions(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SuggestionsRequest>,
) -> Response {
    if req.document.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "document is required");
    }
    Json(SuggestionsResponse {
        suggestions: state.orchestrator.suggest_questions(&req.document),
    })
    .into_response()
}
