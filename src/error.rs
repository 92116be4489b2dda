//! Error types for the docscan library.
//!
//! Four error types reflect four distinct layers:
//!
//! * [`DocScanError`]: **fatal**. The service cannot start or the adapter
//!   cannot be built (no provider configured, invalid config, port in use).
//!
//! * [`BackendError`]: what actually went wrong talking to the model
//!   (provider failure, empty input). Never shown to HTTP callers; logged
//!   server-side.
//!
//! * [`InferenceError`]: the single caller-facing inference failure. It
//!   wraps the [`BackendError`] as its `source` so logs keep the detail while
//!   the contract stays generic.
//!
//! * [`ExtractError`]: the per-request taxonomy the HTTP surface maps to
//!   status codes (validation, empty extraction, inference, unhandled).

use axum::http::StatusCode;
use std::net::SocketAddr;
use thiserror::Error;

/// Fatal errors raised while configuring or starting the service.
#[derive(Debug, Error)]
pub enum DocScanError {
    /// No usable inference backend could be built from the configuration.
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The listener could not bind to the requested address.
    #[error("Failed to bind {addr}: {source}\nIs another process using the port?")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// The HTTP server stopped with an I/O error.
    #[error("Server error: {0}")]
    Server(#[source] std::io::Error),

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Low-level failure reported by a [`crate::pipeline::llm::VisionBackend`].
#[derive(Debug, Error)]
pub enum BackendError {
    /// Error surfaced by an edgequake-llm provider (transport, HTTP status,
    /// content filter, malformed body).
    #[error("provider error: {0}")]
    Provider(String),

    /// An empty image was handed to the adapter.
    #[error("image data is empty")]
    EmptyImage,
}

/// The inference call could not be completed.
///
/// The display text is deliberately fixed; the cause is only reachable via
/// [`std::error::Error::source`].
#[derive(Debug, Error)]
#[error("Failed to process the document.")]
pub struct InferenceError {
    #[source]
    source: BackendError,
}

impl InferenceError {
    /// The backend failure that caused this error.
    pub fn backend_error(&self) -> &BackendError {
        &self.source
    }
}

impl From<BackendError> for InferenceError {
    fn from(source: BackendError) -> Self {
        Self { source }
    }
}

/// Every way a single extraction request can fail.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The request carried no `document` file.
    #[error("No document provided")]
    NoDocument,

    /// A `document` part was present but the browser sent no file with it.
    #[error("No selected file")]
    NoSelectedFile,

    /// Normalisation produced a record with every field null.
    #[error("Could not extract any information from the document")]
    EmptyExtraction,

    /// The model call failed.
    #[error(transparent)]
    Inference(#[from] InferenceError),

    /// Anything else that escaped the pipeline: oversized or broken uploads,
    /// handler panics.
    #[error("{0}")]
    Unhandled(String),
}

impl ExtractError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ExtractError::NoDocument
            | ExtractError::NoSelectedFile
            | ExtractError::EmptyExtraction => StatusCode::BAD_REQUEST,
            ExtractError::Inference(_) | ExtractError::Unhandled(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// The `error` string returned to HTTP callers.
    pub fn user_message(&self) -> String {
        match self {
            ExtractError::Inference(_) => "Error processing document".to_string(),
            ExtractError::Unhandled(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }

    /// The optional `details` string, only ever shown in development mode.
    pub fn details(&self) -> Option<String> {
        match self {
            ExtractError::Inference(e) => Some(e.to_string()),
            ExtractError::Unhandled(msg) => Some(msg.clone()),
            _ => None,
        }
    }
}
