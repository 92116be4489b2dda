//! Output types: the raw model reply and the record handed back to callers.

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// Opaque text returned by the inference call. Untrusted input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawModelResponse(String);

impl RawModelResponse {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for RawModelResponse {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl From<&str> for RawModelResponse {
    fn from(text: &str) -> Self {
        Self(text.to_string())
    }
}

impl fmt::Display for RawModelResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fields recovered by label matching when the reply is not strict JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchedFields {
    pub full_name: Option<String>,
    pub document_number: Option<String>,
    pub expiration_date: Option<String>,
}

impl MatchedFields {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none() && self.document_number.is_none() && self.expiration_date.is_none()
    }
}

/// Which normalisation path produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordSource {
    /// The reply decoded as a JSON object.
    StrictJson,
    /// The reply was free text; fields came from label matching.
    LabelMatch,
}

/// The canonical extraction result.
///
/// Serialises without a tag: a decoded record is emitted with exactly the
/// keys the model wrote (typically `Name`, `documentNumber`,
/// `expirationDate`), a matched record as `fullName`, `documentNumber`,
/// `expirationDate`. The two key sets are not unified.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExtractedRecord {
    Decoded(Map<String, Value>),
    Matched(MatchedFields),
}

impl ExtractedRecord {
    pub fn source(&self) -> RecordSource {
        match self {
            ExtractedRecord::Decoded(_) => RecordSource::StrictJson,
            ExtractedRecord::Matched(_) => RecordSource::LabelMatch,
        }
    }

    /// True when no field carries a value: every value is JSON `null`, or
    /// the decoded object has no keys at all.
    pub fn is_empty(&self) -> bool {
        match self {
            ExtractedRecord::Decoded(map) => map.values().all(Value::is_null),
            ExtractedRecord::Matched(fields) => fields.is_empty(),
        }
    }

    /// Holder name, read from `fullName` or, for decoded replies, `Name`.
    pub fn full_name(&self) -> Option<&str> {
        match self {
            ExtractedRecord::Decoded(map) => decoded_str(map, &["fullName", "Name"]),
            ExtractedRecord::Matched(fields) => fields.full_name.as_deref(),
        }
    }

    pub fn document_number(&self) -> Option<&str> {
        match self {
            ExtractedRecord::Decoded(map) => decoded_str(map, &["documentNumber"]),
            ExtractedRecord::Matched(fields) => fields.document_number.as_deref(),
        }
    }

    pub fn expiration_date(&self) -> Option<&str> {
        match self {
            ExtractedRecord::Decoded(map) => decoded_str(map, &["expirationDate"]),
            ExtractedRecord::Matched(fields) => fields.expiration_date.as_deref(),
        }
    }
}

fn decoded_str<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|k| map.get(*k).and_then(Value::as_str))
}
