//! # compact_rows
//!
//! A parser for the "compact" columnar JSON format: a shared list of field
//! names plus an array of positional value rows, turned into keyed records.
//!
//! ## What is the compact format?
//!
//! Instead of repeating keys on every object, a compact payload ships the
//! keys once and the values as rows:
//!
//! ```json
//! {
//!   "format": "compact",
//!   "fields": ["ts_code", "trade_date", "close"],
//!   "rows": [
//!     ["000001.SZ", "20240101", 15.68],
//!     ["000002.SZ", "20240101", 9.13]
//!   ]
//! }
//! ```
//!
//! Parsing produces one [`Record`] per row, with keys in `fields` order.
//!
//! ## Key Features
//!
//! - **Heuristic coercion**: string cells are typed by their field name —
//!   `*date*` fields become [`Value::Date`], `*nav*`/`*price*`/`*amount*`/
//!   `*ratio*`/`*chg*` fields become numbers; failures degrade to null
//!   rather than erroring (see [`coerce`])
//! - **Memoized mappers**: the row-to-record mapping is built once per
//!   distinct field list and cached (see [`MapperCache`])
//! - **Domain profiles**: equity, fund and index post-processors
//!   re-normalize well-known fields after generic conversion (see
//!   [`postprocess`])
//! - **No hidden state**: the cache lives inside the [`Parser`] you create,
//!   not in a process-wide singleton
//!
//! ## Quick Start
//!
//! ```rust
//! use compact_rows::{Parser, Value};
//!
//! let payload: Value = serde_json::from_str(r#"{
//!     "format": "compact",
//!     "fields": ["ts_code", "trade_date", "close"],
//!     "rows": [["000001.SZ", "20240101", 15.68]]
//! }"#).unwrap();
//!
//! let mut parser = Parser::new();
//! let records = parser.parse(&payload).unwrap();
//!
//! assert_eq!(records[0].get("ts_code"), Some(&Value::from("000001.SZ")));
//! assert!(records[0].get("trade_date").unwrap().is_date());
//! assert_eq!(records[0].get("close"), Some(&Value::from(15.68)));
//! ```
//!
//! One-shot helpers skip the explicit parser (and its cache reuse):
//!
//! ```rust
//! use compact_rows::{is_valid, parse, Value};
//!
//! let payload: Value = serde_json::from_str(
//!     r#"{"format": "compact", "fields": [], "rows": []}"#,
//! ).unwrap();
//!
//! assert!(is_valid(&payload));
//! assert!(parse(&payload).unwrap().is_empty());
//! ```
//!
//! ## Error Policy
//!
//! Structural problems (null payload, wrong `format` discriminator,
//! non-array `fields`/`rows`) raise an [`Error`]. Value-level problems —
//! ragged rows, unparseable numerals, unrecognizable dates — never do; they
//! degrade to null, or to the profile default during post-processing. Use
//! [`is_valid`] first when strict rejection is needed.
//!
//! ## Safety Guarantees
//!
//! - No `unsafe` code blocks
//! - All row indexing is bounds-checked; short rows pad with nulls
//! - No panics in the public API

pub mod cache;
pub mod coerce;
pub mod error;
pub mod map;
pub mod mapper;
pub mod parser;
pub mod payload;
pub mod postprocess;
pub mod value;

pub use cache::{CacheStats, MapperCache};
pub use error::{Error, Result};
pub use map::Record;
pub use mapper::RowMapper;
pub use parser::Parser;
pub use payload::{is_valid, CompactPayload, ParseResult};
pub use value::{Number, Value};

/// Parses an untyped compact payload into records with a transient [`Parser`].
///
/// Convenient for one-shot use; create a [`Parser`] to reuse the mapper
/// cache across payloads.
///
/// # Errors
///
/// Returns an error for structural violations of the compact envelope; see
/// [`Parser::parse`].
pub fn parse(payload: &Value) -> Result<Vec<Record>> {
    Parser::new().parse(payload)
}

/// Parses a payload and passes its `meta` field through; see
/// [`Parser::parse_with_meta`].
///
/// # Errors
///
/// Returns an error for structural violations of the compact envelope.
pub fn parse_with_meta(payload: &Value) -> Result<ParseResult> {
    Parser::new().parse_with_meta(payload)
}

/// Converts bare fields and rows into records; see [`Parser::convert`].
#[must_use]
pub fn convert(fields: &[String], rows: &[Vec<Value>]) -> Vec<Record> {
    Parser::new().convert(fields, rows)
}

/// Parses a payload and applies the equity quote profile; see
/// [`Parser::parse_equity`].
///
/// # Errors
///
/// Returns an error for structural violations of the compact envelope.
pub fn parse_equity(payload: &Value) -> Result<Vec<Record>> {
    Parser::new().parse_equity(payload)
}

/// Parses a payload and applies the fund NAV profile; see
/// [`Parser::parse_fund`].
///
/// # Errors
///
/// Returns an error for structural violations of the compact envelope.
pub fn parse_fund(payload: &Value) -> Result<Vec<Record>> {
    Parser::new().parse_fund(payload)
}

/// Parses a payload and applies the index quote profile; see
/// [`Parser::parse_index`].
///
/// # Errors
///
/// Returns an error for structural violations of the compact envelope.
pub fn parse_index(payload: &Value) -> Result<Vec<Record>> {
    Parser::new().parse_index(payload)
}
