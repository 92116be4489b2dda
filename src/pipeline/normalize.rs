//! Response normalisation: model reply text → [`ExtractedRecord`].
//!
//! Two passes, strictly ordered:
//!
//! 1. **Strict decode.** The whole reply must be a JSON object. Preambles,
//!    code fences or trailing commentary make this fail on purpose; no
//!    repair is attempted.
//! 2. **Label match.** Only on decode failure. Three independent,
//!    case-insensitive searches each capture the rest of the line after
//!    `name`, `document number` and `expiration date`. First occurrence wins.
//!
//! [`normalize`] never fails. An all-null record is a valid return value;
//! deciding that it means "nothing extracted" is the caller's job.

use crate::output::{ExtractedRecord, MatchedFields, RawModelResponse};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

/// Why the strict decode pass rejected a reply.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("reply is not valid JSON: {0}")]
    Syntax(#[from] serde_json::Error),

    /// Valid JSON, but an array/string/number/bool/null rather than an object.
    #[error("reply is JSON {kind}, not an object")]
    NotAnObject { kind: &'static str },
}

/// Convert a raw model reply into a record.
pub fn normalize(raw: &RawModelResponse) -> ExtractedRecord {
    match decode_strict(raw.as_str()) {
        Ok(map) => ExtractedRecord::Decoded(map),
        Err(e) => {
            debug!("Strict decode failed ({}); falling back to label matching", e);
            ExtractedRecord::Matched(match_labels(raw.as_str()))
        }
    }
}

/// Decode the reply as a JSON object, keys and values untouched.
pub fn decode_strict(text: &str) -> Result<Map<String, Value>, DecodeError> {
    match serde_json::from_str::<Value>(text)? {
        Value::Object(map) => Ok(map),
        other => Err(DecodeError::NotAnObject {
            kind: json_kind(&other),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ── Label patterns ───────────────────────────────────────────────────────────
//
// `.` stops at `\n`, so each capture ends at the first newline after the label.
// `[:\s]+` may cross a newline, letting a value on the next line still match.

static RE_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)name[:\s]+(.+)").unwrap());

static RE_DOCUMENT_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)document\s+number[:\s]+(.+)").unwrap());

static RE_EXPIRATION_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)expiration\s+date[:\s]+(.+)").unwrap());

/// Run all three label searches against `text`.
pub fn match_labels(text: &str) -> MatchedFields {
    MatchedFields {
        full_name: first_capture(&RE_NAME, text),
        document_number: first_capture(&RE_DOCUMENT_NUMBER, text),
        expiration_date: first_capture(&RE_EXPIRATION_DATE, text),
    }
}

fn first_capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}

// ── Tests ────────────────────────────────────────────────────────────────────
