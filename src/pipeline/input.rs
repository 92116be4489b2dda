//! Input resolution: pull the `document` file out of a multipart request.
//!
//! The upload is buffered in memory only. [`UploadedImage`] owns the bytes
//! for the lifetime of one request and drops them when the handler returns;
//! nothing is written to disk. The size cap is enforced while streaming, so
//! an oversized file is rejected as soon as it crosses the limit rather than
//! after it has been fully buffered.

use crate::error::ExtractError;
use axum::extract::multipart::{Multipart, MultipartError};
use axum::http::StatusCode;
use tracing::{debug, warn};

/// Name of the multipart field carrying the image.
pub const DOCUMENT_FIELD: &str = "document";

/// Failure message for an upload over the cap.
pub const FILE_TOO_LARGE: &str = "File too large";

/// A document image held in memory for one request.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    bytes: Vec<u8>,
    file_name: Option<String>,
    content_type: Option<String>,
}

impl UploadedImage {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            file_name: None,
            content_type: None,
        }
    }

    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// Content type declared by the client. Informational only.
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Read the first `document` file part, buffering at most `max_bytes`.
///
/// Parts with another name, and `document` parts without a filename (plain
/// text fields), are skipped.
///
/// # Errors
/// - [`ExtractError::NoDocument`]: no file part, or a zero-length file
/// - [`ExtractError::NoSelectedFile`]: a file part with an empty filename
/// - [`ExtractError::Unhandled`]: the file exceeds `max_bytes`, or the
///   multipart stream itself is broken
pub async fn read_document(
    multipart: &mut Multipart,
    max_bytes: usize,
) -> Result<UploadedImage, ExtractError> {
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(multipart_error)?
    {
        if field.name() != Some(DOCUMENT_FIELD) {
            debug!("Skipping multipart field {:?}", field.name());
            continue;
        }
        let Some(file_name) = field.file_name().map(str::to_string) else {
            debug!("Skipping non-file '{}' field", DOCUMENT_FIELD);
            continue;
        };
        if file_name.is_empty() {
            return Err(ExtractError::NoSelectedFile);
        }
        let content_type = field.content_type().map(str::to_string);

        let mut bytes = Vec::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(multipart_error)?
        {
            if bytes.len() + chunk.len() > max_bytes {
                warn!("Upload '{}' exceeds {} bytes", file_name, max_bytes);
                return Err(ExtractError::Unhandled(FILE_TOO_LARGE.to_string()));
            }
            bytes.extend_from_slice(&chunk);
        }

        if bytes.is_empty() {
            return Err(ExtractError::NoDocument);
        }

        debug!(
            "Received '{}' ({} bytes, {:?})",
            file_name,
            bytes.len(),
            content_type
        );
        let mut image = UploadedImage::new(bytes).with_file_name(file_name);
        image.content_type = content_type;
        return Ok(image);
    }

    Err(ExtractError::NoDocument)
}

fn multipart_error(e: MultipartError) -> ExtractError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ExtractError::Unhandled(FILE_TOO_LARGE.to_string())
    } else {
        ExtractError::Unhandled(format!("Failed to parse multipart data: {}", e.body_text()))
    }
}
