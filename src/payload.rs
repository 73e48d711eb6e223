//! The compact payload envelope and its validator.
//!
//! A compact payload pairs a shared field-name list with rows of positional
//! values, avoiding per-row key repetition:
//!
//! ```json
//! {
//!   "format": "compact",
//!   "fields": ["ts_code", "trade_date", "close"],
//!   "rows": [["000001.SZ", "20240101", 15.68]],
//!   "meta": {"total": 1}
//! }
//! ```
//!
//! [`CompactPayload`] is the typed form for callers deserializing response
//! bodies straight into the envelope; [`is_valid`] checks an untyped
//! [`Value`] against the contract without ever failing itself.

use crate::{Record, Value};
use serde::{Deserialize, Serialize};

/// The `format` discriminator every compact payload must carry.
pub const COMPACT_FORMAT: &str = "compact";

/// A decoded compact payload envelope.
///
/// The core never mutates a payload; parsing reads it and produces fresh
/// records.
///
/// # Examples
///
/// ```rust
/// use compact_rows::CompactPayload;
///
/// let body = r#"{
///     "format": "compact",
///     "fields": ["ts_code", "close"],
///     "rows": [["000001.SZ", 15.68]]
/// }"#;
/// let payload: CompactPayload = serde_json::from_str(body).unwrap();
/// assert_eq!(payload.fields.len(), 2);
/// assert!(payload.meta.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompactPayload {
    /// Format discriminator, expected to be `"compact"`.
    pub format: String,
    /// Ordered field names shared by every row.
    pub fields: Vec<String>,
    /// Positional value rows; each row's length should equal `fields.len()`.
    pub rows: Vec<Vec<Value>>,
    /// Optional open metadata passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

/// A parse result carrying the converted records together with the payload's
/// passthrough metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseResult {
    pub data: Vec<Record>,
    /// The payload's `meta` field; `None` when absent or null.
    pub meta: Option<Value>,
}

/// Checks an untyped candidate against the compact-format contract.
///
/// Never panics; any shape violation yields `false`. The checks, in order:
/// the candidate is an object, `format` is `"compact"`, `fields` and `rows`
/// are arrays, every field name is a string, every row is an array whose
/// length equals `fields.len()`. Empty `fields` and `rows` are valid.
///
/// This is stricter than [`crate::parse`], which tolerates
/// ragged rows by padding with nulls; callers needing hard rejection should
/// validate first.
///
/// # Examples
///
/// ```rust
/// use compact_rows::{is_valid, Value};
///
/// let good: Value = serde_json::from_str(
///     r#"{"format": "compact", "fields": [], "rows": []}"#,
/// ).unwrap();
/// assert!(is_valid(&good));
///
/// let ragged: Value = serde_json::from_str(
///     r#"{"format": "compact", "fields": ["a"], "rows": [["x", "y"]]}"#,
/// ).unwrap();
/// assert!(!is_valid(&ragged));
/// ```
#[must_use]
pub fn is_valid(candidate: &Value) -> bool {
    let obj = match candidate.as_object() {
        Some(obj) => obj,
        None => return false,
    };

    match obj.get("format").and_then(Value::as_str) {
        Some(COMPACT_FORMAT) => {}
        _ => return false,
    }

    let fields = match obj.get("fields").and_then(Value::as_array) {
        Some(fields) => fields,
        None => return false,
    };
    let rows = match obj.get("rows").and_then(Value::as_array) {
        Some(rows) => rows,
        None => return false,
    };

    if !fields.iter().all(Value::is_string) {
        return false;
    }

    rows.iter()
        .all(|row| matches!(row.as_array(), Some(cells) if cells.len() == fields.len()))
}
