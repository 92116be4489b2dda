//! HTTP surface: `POST /extract`.
//!
//! | Outcome | Status | Body |
//! |---------|--------|------|
//! | record extracted | 200 | the record, keys as produced |
//! | no `document` file | 400 | `{"error":"No document provided"}` |
//! | empty filename | 400 | `{"error":"No selected file"}` |
//! | every field null | 400 | `{"error":"Could not extract any information from the document"}` |
//! | inference failed | 500 | `{"error":"Error processing document","details"?}` |
//! | anything else: oversized or broken upload, panic | 500 | `{"error":"Internal server error","details"?}` |
//!
//! `details` is present only in [`RuntimeMode::Development`].

use crate::config::{RuntimeMode, ServerConfig};
use crate::error::{DocScanError, ExtractError};
use crate::extract::extract_document;
use crate::output::ExtractedRecord;
use crate::pipeline::input::read_document;
use crate::pipeline::llm::InferenceAdapter;
use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::{DefaultBodyLimit, State};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;
use std::any::Any;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

/// Headroom above the file cap for multipart boundaries and part headers.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Shared, read-only state for every request.
#[derive(Clone)]
pub struct AppState {
    adapter: Arc<InferenceAdapter>,
    mode: RuntimeMode,
    max_upload_bytes: usize,
}

impl AppState {
    pub fn new(adapter: InferenceAdapter, config: &ServerConfig) -> Self {
        Self {
            adapter: Arc::new(adapter),
            mode: config.mode,
            max_upload_bytes: config.max_upload_bytes,
        }
    }
}

/// Build the application router.
///
/// CORS is the outermost layer so panic responses carry CORS headers too.
pub fn router(state: AppState) -> Router {
    let mode = state.mode;
    let body_limit = state.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES);

    Router::new()
        .route("/extract", post(extract_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(
            move |panic: Box<dyn Any + Send + 'static>| panic_response(panic, mode),
        ))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind `config.addr()` and serve until Ctrl-C.
pub async fn serve(config: ServerConfig, adapter: InferenceAdapter) -> Result<(), DocScanError> {
    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| DocScanError::Bind { addr, source })?;

    info!(
        "Server running on {} ({} mode, backend {})",
        addr,
        config.mode,
        adapter.backend_name()
    );
    let app = router(AppState::new(adapter, &config));

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(DocScanError::Server)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Ctrl-C handler unavailable ({}); shutdown only by kill", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

async fn extract_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ExtractedRecord>, ApiError> {
    let mode = state.mode;
    let mut multipart = multipart.map_err(|rejection| {
        debug!("Request is not multipart: {}", rejection);
        ApiError::new(ExtractError::NoDocument, mode)
    })?;

    // Dropped when the handler returns; the upload never outlives the request.
    let image = read_document(&mut multipart, state.max_upload_bytes)
        .await
        .map_err(|e| ApiError::new(e, mode))?;

    let record = extract_document(&state.adapter, &image)
        .await
        .map_err(|e| ApiError::new(e, mode))?;

    Ok(Json(record))
}

// ── Errors ───────────────────────────────────────────────────────────────

/// An [`ExtractError`] paired with the mode that decides whether `details` is shown.
#[derive(Debug)]
pub struct ApiError {
    error: ExtractError,
    mode: RuntimeMode,
}

impl ApiError {
    pub fn new(error: ExtractError, mode: RuntimeMode) -> Self {
        Self { error, mode }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self.error {
            ExtractError::Inference(e) => {
                error!("Error processing document: {}: {}", e, e.backend_error());
            }
            ExtractError::Unhandled(msg) => error!("Unhandled error: {}", msg),
            other => debug!("Client error: {}", other),
        }

        let details = if self.mode.exposes_details() {
            self.error.details()
        } else {
            None
        };
        let body = ErrorBody {
            error: self.error.user_message(),
            details,
        };
        (self.error.status_code(), Json(body)).into_response()
    }
}

fn panic_response(panic: Box<dyn Any + Send + 'static>, mode: RuntimeMode) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "handler panicked".to_string()
    };
    ApiError::new(ExtractError::Unhandled(detail), mode).into_response()
}
