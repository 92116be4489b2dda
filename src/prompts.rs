//! The instruction sent alongside every document image.
//!
//! Kept as a constant so prompt regressions show up in unit tests without a
//! live model. Callers can override it via
//! [`crate::config::ExtractionConfig::prompt`].

/// Default extraction instruction.
///
/// The JSON keys listed here are returned verbatim when the model complies,
/// so `Name` (not `fullName`) is what a well-behaved model sends back.
pub const EXTRACTION_PROMPT: &str = r#"Extract the following information from this document image and return it in JSON format:
{
    "Name": "extracted name",
    "documentNumber": "extracted document number",
    "expirationDate": "extracted expiration date in YYYY-MM-DD format"
}
Only return the JSON object, no additional text."#;
