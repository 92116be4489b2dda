//! Extraction entry point: one image in, one record (or one error) out.
//!
//! Runs the pipeline stages in order and applies the single rule the
//! normaliser deliberately does not: a record with every field null is a
//! failed extraction, not an empty success.

use crate::error::ExtractError;
use crate::output::ExtractedRecord;
use crate::pipeline::input::UploadedImage;
use crate::pipeline::llm::InferenceAdapter;
use crate::pipeline::normalize::normalize;
use tracing::{debug, info};

/// Extract the holder's name, document number and expiry from `image`.
///
/// # Errors
/// - [`ExtractError::NoDocument`]: `image` is empty
/// - [`ExtractError::Inference`]: the model call failed
/// - [`ExtractError::EmptyExtraction`]: the reply yielded no field at all
pub async fn extract_document(
    adapter: &InferenceAdapter,
    image: &UploadedImage,
) -> Result<ExtractedRecord, ExtractError> {
    if image.is_empty() {
        return Err(ExtractError::NoDocument);
    }
    info!(
        "Extracting from {} ({} bytes)",
        image.file_name().unwrap_or("<unnamed>"),
        image.len()
    );

    let raw = adapter.infer(image.bytes()).await?;
    let record = normalize(&raw);
    debug!("Normalised via {:?}: {:?}", record.source(), record);

    if record.is_empty() {
        info!("No field populated");
        return Err(ExtractError::EmptyExtraction);
    }

    info!("Successfully processed document");
    Ok(record)
}
