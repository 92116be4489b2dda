//! End-to-end tests for `POST /extract`.
//!
//! The router is driven in-process through `axum-test`; the model is replaced
//! by a scripted [`VisionBackend`], so no network or API key is needed.
//!
//! Run with:
//!   cargo test --test endpoint

use async_trait::async_trait;
use axum::body::Bytes;
use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use docscan::server::{router, AppState};
use docscan::{
    BackendError, ExtractionPrompt, InferenceAdapter, RuntimeMode, ServerConfig, VisionBackend,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// ── Test helpers ─────────────────────────────────────────────────────────────

enum Script {
    Reply(&'static str),
    Fail(&'static str),
    Panic(&'static str),
}

struct ScriptedBackend {
    script: Script,
    calls: AtomicUsize,
}

impl ScriptedBackend {
    fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VisionBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, prompt: &ExtractionPrompt<'_>) -> Result<String, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert_eq!(prompt.image.mime_type, "image/png");
        match self.script {
            Script::Reply(text) => Ok(text.to_string()),
            Script::Fail(msg) => Err(BackendError::Provider(msg.to_string())),
            Script::Panic(msg) => panic!("{}", msg),
        }
    }
}

fn server_with(backend: Arc<ScriptedBackend>, mode: RuntimeMode, max_upload_bytes: usize) -> TestServer {
    let adapter = InferenceAdapter::new(backend);
    let config = ServerConfig {
        mode,
        max_upload_bytes,
        ..ServerConfig::default()
    };
    TestServer::new(router(AppState::new(adapter, &config))).expect("test server starts")
}

fn server(backend: Arc<ScriptedBackend>) -> TestServer {
    server_with(
        backend,
        RuntimeMode::Production,
        docscan::config::DEFAULT_MAX_UPLOAD_BYTES,
    )
}

fn document_form(bytes: Vec<u8>) -> MultipartForm {
    MultipartForm::new().add_part(
        "document",
        Part::bytes(bytes)
            .file_name("passport.jpg")
            .mime_type("image/jpeg"),
    )
}

fn jpeg() -> Vec<u8> {
    vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F']
}

// ── Scenarios ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_document_field_is_400() {
    let backend = ScriptedBackend::new(Script::Reply("unused"));
    let server = server(backend.clone());

    let response = server
        .post("/extract")
        .multipart(MultipartForm::new().add_text("note", "no file here"))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>(), json!({ "error": "No document provided" }));
    assert_eq!(backend.calls(), 0, "model must not be called without a file");
}

#[tokio::test]
async fn non_multipart_body_is_treated_as_missing_document() {
    let backend = ScriptedBackend::new(Script::Reply("unused"));
    let server = server(backend.clone());

    let response = server.post("/extract").json(&json!({ "document": "x" })).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>(), json!({ "error": "No document provided" }));
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn text_field_named_document_is_not_a_file() {
    let backend = ScriptedBackend::new(Script::Reply("unused"));
    let server = server(backend.clone());

    let response = server
        .post("/extract")
        .multipart(MultipartForm::new().add_text("document", "not an image"))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"], "No document provided");
}

#[tokio::test]
async fn json_reply_is_returned_verbatim() {
    let backend = ScriptedBackend::new(Script::Reply(
        r#"{"Name":"Jane Smith","documentNumber":"X123","expirationDate":"2026-05-01"}"#,
    ));
    let server = server(backend.clone());

    let response = server.post("/extract").multipart(document_form(jpeg())).await;

    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>(),
        json!({ "Name": "Jane Smith", "documentNumber": "X123", "expirationDate": "2026-05-01" })
    );
    assert_eq!(backend.calls(), 1);
}

#[tokio::test]
async fn free_text_reply_uses_label_fallback() {
    let backend = ScriptedBackend::new(Script::Reply(
        "Name: Jane Smith\nDocument Number: X123\nExpiration Date: 2026-05-01",
    ));
    let server = server(backend);

    let response = server.post("/extract").multipart(document_form(jpeg())).await;

    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>(),
        json!({ "fullName": "Jane Smith", "documentNumber": "X123", "expirationDate": "2026-05-01" })
    );
}

#[tokio::test]
async fn partial_fallback_keeps_nulls() {
    let backend = ScriptedBackend::new(Script::Reply("Here you go.\nDocument number: 998877"));
    let server = server(backend);

    let response = server.post("/extract").multipart(document_form(jpeg())).await;

    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>(),
        json!({ "fullName": null, "documentNumber": "998877", "expirationDate": null })
    );
}

#[tokio::test]
async fn unrelated_reply_is_400_could_not_extract() {
    let backend = ScriptedBackend::new(Script::Reply("This appears to be a photo of a cat."));
    let server = server(backend);

    let response = server.post("/extract").multipart(document_form(jpeg())).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>(),
        json!({ "error": "Could not extract any information from the document" })
    );
}

#[tokio::test]
async fn inference_failure_is_500_without_details_in_production() {
    let backend = ScriptedBackend::new(Script::Fail("API key not valid"));
    let server = server(backend);

    let response = server.post("/extract").multipart(document_form(jpeg())).await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body = response.json::<Value>();
    assert_eq!(body, json!({ "error": "Error processing document" }));
    assert!(body.get("details").is_none());
}

#[tokio::test]
async fn inference_failure_exposes_generic_details_in_development() {
    let backend = ScriptedBackend::new(Script::Fail("API key not valid"));
    let server = server_with(
        backend,
        RuntimeMode::Development,
        docscan::config::DEFAULT_MAX_UPLOAD_BYTES,
    );

    let response = server.post("/extract").multipart(document_form(jpeg())).await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body = response.json::<Value>();
    assert_eq!(body["error"], "Error processing document");
    assert_eq!(body["details"], "Failed to process the document.");
    assert!(
        !body.to_string().contains("API key not valid"),
        "backend detail must stay server-side: {body}"
    );
}

#[tokio::test]
async fn oversized_upload_is_unhandled_and_skips_inference() {
    let backend = ScriptedBackend::new(Script::Reply("unused"));
    let server = server_with(backend.clone(), RuntimeMode::Production, 16);

    let response = server.post("/extract").multipart(document_form(vec![7u8; 64])).await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json::<Value>(), json!({ "error": "Internal server error" }));
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn oversized_upload_details_in_development() {
    let backend = ScriptedBackend::new(Script::Reply("unused"));
    let server = server_with(backend, RuntimeMode::Development, 16);

    let response = server.post("/extract").multipart(document_form(vec![7u8; 64])).await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.json::<Value>(),
        json!({ "error": "Internal server error", "details": "File too large" })
    );
}

#[tokio::test]
async fn upload_at_the_limit_is_accepted() {
    let backend = ScriptedBackend::new(Script::Reply(r#"{"documentNumber":"A1"}"#));
    let server = server_with(backend, RuntimeMode::Production, 16);

    let response = server.post("/extract").multipart(document_form(vec![7u8; 16])).await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({ "documentNumber": "A1" }));
}

#[tokio::test]
async fn zero_length_file_is_missing_document() {
    let backend = ScriptedBackend::new(Script::Reply("unused"));
    let server = server(backend.clone());

    let response = server.post("/extract").multipart(document_form(Vec::new())).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"], "No document provided");
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn other_fields_are_ignored() {
    let backend = ScriptedBackend::new(Script::Reply("Name: A B"));
    let server = server(backend);

    let form = MultipartForm::new()
        .add_text("side", "front")
        .add_part("document", Part::bytes(jpeg()).file_name("id.jpg"));
    let response = server.post("/extract").multipart(form).await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["fullName"], "A B");
}

#[tokio::test]
async fn empty_filename_is_no_selected_file() {
    let backend = ScriptedBackend::new(Script::Reply("unused"));
    let server = server(backend.clone());

    let form = MultipartForm::new().add_part("document", Part::bytes(Vec::new()).file_name(""));
    let response = server.post("/extract").multipart(form).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>(), json!({ "error": "No selected file" }));
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn truncated_multipart_body_is_unhandled() {
    let backend = ScriptedBackend::new(Script::Reply("unused"));
    let server = server_with(
        backend.clone(),
        RuntimeMode::Development,
        docscan::config::DEFAULT_MAX_UPLOAD_BYTES,
    );

    // Part headers complete, closing boundary never arrives.
    let body = Bytes::from_static(
        b"--XBOUNDARY\r\n\
          Content-Disposition: form-data; name=\"document\"; filename=\"id.png\"\r\n\
          Content-Type: image/png\r\n\r\n\
          \x89PNG partial",
    );
    let response = server
        .post("/extract")
        .bytes(body)
        .content_type("multipart/form-data; boundary=XBOUNDARY")
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body = response.json::<Value>();
    assert_eq!(body["error"], "Internal server error");
    assert!(
        body["details"]
            .as_str()
            .is_some_and(|d| d.starts_with("Failed to parse multipart data")),
        "got: {body}"
    );
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn panicking_handler_hits_safety_net() {
    let backend = ScriptedBackend::new(Script::Panic("backend exploded"));
    let prod = server(backend.clone());

    let response = prod.post("/extract").multipart(document_form(jpeg())).await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json::<Value>(), json!({ "error": "Internal server error" }));

    let dev = server_with(
        backend,
        RuntimeMode::Development,
        docscan::config::DEFAULT_MAX_UPLOAD_BYTES,
    );
    let response = dev.post("/extract").multipart(document_form(jpeg())).await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body = response.json::<Value>();
    assert_eq!(body["error"], "Internal server error");
    assert_eq!(body["details"], "backend exploded");
}

#[tokio::test]
async fn panic_response_carries_cors_headers() {
    let backend = ScriptedBackend::new(Script::Panic("backend exploded"));
    let server = server(backend);

    let response = server
        .post("/extract")
        .add_header("origin", "http://localhost:3000")
        .multipart(document_form(jpeg()))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.header("access-control-allow-origin"), "*");
}
