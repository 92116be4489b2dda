//! Image encoding: uploaded bytes → base64 wrapped in `ImageData`.
//!
//! The bytes are forwarded untouched. Every upload is tagged `image/png`
//! whatever its real format; Gemini sniffs the payload, so JPEG uploads
//! still decode, but the tag is not a statement about the content.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use tracing::debug;

/// MIME type attached to every document image.
pub const DOCUMENT_MIME_TYPE: &str = "image/png";

/// Encode a document image as base64 ready for the VLM API.
///
/// `detail: "high"` asks OpenAI-style providers for full tiling; ID cards have
/// small print (MRZ lines, dates) that a single low-detail tile loses.
pub fn encode_document(bytes: &[u8]) -> ImageData {
    let b64 = STANDARD.encode(bytes);
    debug!("Encoded {} bytes → {} bytes base64", bytes.len(), b64.len());

    ImageData::new(b64, DOCUMENT_MIME_TYPE).with_detail("high")
}
