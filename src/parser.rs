//! The parser: validation, conversion and post-processing entry points.
//!
//! A [`Parser`] owns its [`MapperCache`], so cache lifetime follows whoever
//! composes the parser (a request context, a test, a long-lived service)
//! instead of leaking across tenants through process-global state. All
//! operations are synchronous and run to completion; the parser holds the
//! only mutable state involved, so a host sharing one across threads must
//! wrap it in its own lock.

use crate::cache::{CacheStats, MapperCache};
use crate::payload::{CompactPayload, ParseResult, COMPACT_FORMAT};
use crate::postprocess::{EQUITY, FUND, INDEX};
use crate::{Error, Record, Result, RowMapper, Value};
use std::sync::Arc;

/// Converts compact payloads into keyed records, memoizing row mappers per
/// distinct field list.
///
/// # Examples
///
/// ```rust
/// use compact_rows::{Parser, Value};
///
/// let payload: Value = serde_json::from_str(r#"{
///     "format": "compact",
///     "fields": ["ts_code", "trade_date", "close"],
///     "rows": [["000001.SZ", "20240101", 15.68]]
/// }"#).unwrap();
///
/// let mut parser = Parser::new();
/// let records = parser.parse(&payload).unwrap();
/// assert_eq!(records.len(), 1);
/// assert_eq!(records[0].get("close"), Some(&Value::from(15.68)));
/// assert!(records[0].get("trade_date").unwrap().is_date());
/// ```
#[derive(Debug, Default)]
pub struct Parser {
    cache: MapperCache,
}

impl Parser {
    /// Creates a parser with an empty mapper cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses an untyped compact payload into records.
    ///
    /// Structural violations raise: [`Error::NullPayload`] for a null
    /// payload, [`Error::InvalidFormat`] for a non-object payload or a
    /// missing/wrong `format` discriminator, [`Error::InvalidFields`] /
    /// [`Error::InvalidRows`] for a malformed envelope. Empty `fields` or
    /// `rows` short-circuit to an empty vec.
    ///
    /// Row-level problems do not raise: a short or non-array row pads with
    /// nulls, and cell coercion failures become null (see [`crate::coerce`]).
    pub fn parse(&mut self, payload: &Value) -> Result<Vec<Record>> {
        let obj = match payload {
            Value::Null => return Err(Error::NullPayload),
            Value::Object(obj) => obj,
            _ => return Err(Error::InvalidFormat),
        };

        match obj.get("format") {
            Some(Value::String(format)) if format == COMPACT_FORMAT => {}
            _ => return Err(Error::InvalidFormat),
        }

        let field_values = obj
            .get("fields")
            .and_then(Value::as_array)
            .ok_or(Error::InvalidFields)?;
        let mut fields = Vec::with_capacity(field_values.len());
        for name in field_values {
            fields.push(name.as_str().ok_or(Error::InvalidFields)?.to_string());
        }

        let rows = obj
            .get("rows")
            .and_then(Value::as_array)
            .ok_or(Error::InvalidRows)?;

        if fields.is_empty() || rows.is_empty() {
            return Ok(Vec::new());
        }

        let mapper = self.cache.get_or_create(&fields);
        Ok(rows
            .iter()
            .map(|row| {
                let cells = row.as_array().map(Vec::as_slice).unwrap_or(&[]);
                mapper.map_row(cells)
            })
            .collect())
    }

    /// Parses a payload and passes its `meta` field through alongside the
    /// records. A missing or null `meta` becomes `None`.
    pub fn parse_with_meta(&mut self, payload: &Value) -> Result<ParseResult> {
        let data = self.parse(payload)?;
        let meta = payload
            .as_object()
            .and_then(|obj| obj.get("meta"))
            .filter(|meta| !meta.is_null())
            .cloned();
        Ok(ParseResult { data, meta })
    }

    /// Parses a typed [`CompactPayload`], for callers deserializing response
    /// bodies straight into the envelope with serde.
    ///
    /// The envelope's shape is already guaranteed by its type; only the
    /// `format` discriminator can still be wrong at runtime.
    pub fn parse_payload(&mut self, payload: &CompactPayload) -> Result<Vec<Record>> {
        if payload.format != COMPACT_FORMAT {
            return Err(Error::InvalidFormat);
        }
        Ok(self.convert(&payload.fields, &payload.rows))
    }

    /// Generic conversion over bare fields and rows, no envelope.
    ///
    /// Produces the same records `parse` would for an equivalent payload.
    #[must_use]
    pub fn convert(&mut self, fields: &[String], rows: &[Vec<Value>]) -> Vec<Record> {
        if fields.is_empty() || rows.is_empty() {
            return Vec::new();
        }
        let mapper = self.cache.get_or_create(fields);
        rows.iter().map(|row| mapper.map_row(row)).collect()
    }

    /// Returns the cache-backed mapper for a field list; repeated calls with
    /// an equal list return the same [`Arc`] (compare with [`Arc::ptr_eq`]).
    #[must_use]
    pub fn get_mapper(&mut self, fields: &[String]) -> Arc<RowMapper> {
        self.cache.get_or_create(fields)
    }

    /// Generic parse followed by the equity quote profile.
    pub fn parse_equity(&mut self, payload: &Value) -> Result<Vec<Record>> {
        Ok(EQUITY.apply(&self.parse(payload)?))
    }

    /// Generic parse followed by the fund NAV profile.
    pub fn parse_fund(&mut self, payload: &Value) -> Result<Vec<Record>> {
        Ok(FUND.apply(&self.parse(payload)?))
    }

    /// Generic parse followed by the index quote profile.
    pub fn parse_index(&mut self, payload: &Value) -> Result<Vec<Record>> {
        Ok(INDEX.apply(&self.parse(payload)?))
    }

    /// Removes all entries from the mapper and type-converter caches.
    pub fn clear_caches(&mut self) {
        self.cache.clear();
    }

    /// Current cache entry counts.
    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(json: &str) -> Value {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_parse_errors() {
        let mut parser = Parser::new();
        assert_eq!(parser.parse(&Value::Null), Err(Error::NullPayload));
        assert_eq!(parser.parse(&value("42")), Err(Error::InvalidFormat));
        assert_eq!(
            parser.parse(&value(r#"{"format": "standard", "fields": [], "rows": []}"#)),
            Err(Error::InvalidFormat)
        );
        assert_eq!(
            parser.parse(&value(r#"{"format": "compact", "fields": "x", "rows": []}"#)),
            Err(Error::InvalidFields)
        );
        assert_eq!(
            parser.parse(&value(r#"{"format": "compact", "fields": [3], "rows": []}"#)),
            Err(Error::InvalidFields)
        );
        assert_eq!(
            parser.parse(&value(r#"{"format": "compact", "fields": [], "rows": {}}"#)),
            Err(Error::InvalidRows)
        );
    }

    #[test]
    fn test_empty_fields_or_rows() {
        let mut parser = Parser::new();
        let empty = parser
            .parse(&value(r#"{"format": "compact", "fields": [], "rows": []}"#))
            .unwrap();
        assert!(empty.is_empty());

        let no_rows = parser
            .parse(&value(r#"{"format": "compact", "fields": ["a"], "rows": []}"#))
            .unwrap();
        assert!(no_rows.is_empty());

        let no_fields = parser
            .parse(&value(r#"{"format": "compact", "fields": [], "rows": [[1]]}"#))
            .unwrap();
        assert!(no_fields.is_empty());
    }

    #[test]
    fn test_non_array_row_degrades_to_nulls() {
        let mut parser = Parser::new();
        let records = parser
            .parse(&value(
                r#"{"format": "compact", "fields": ["a", "b"], "rows": ["oops"]}"#,
            ))
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("a"), Some(&Value::Null));
        assert_eq!(records[0].get("b"), Some(&Value::Null));
    }

    #[test]
    fn test_parse_with_meta() {
        let mut parser = Parser::new();
        let result = parser
            .parse_with_meta(&value(
                r#"{"format": "compact", "fields": ["a"], "rows": [[1]], "meta": {"total": 1}}"#,
            ))
            .unwrap();
        assert_eq!(result.data.len(), 1);
        let meta = result.meta.unwrap();
        assert_eq!(meta.as_object().unwrap().get("total"), Some(&Value::from(1)));

        let absent = parser
            .parse_with_meta(&value(r#"{"format": "compact", "fields": ["a"], "rows": [[1]]}"#))
            .unwrap();
        assert!(absent.meta.is_none());

        let null_meta = parser
            .parse_with_meta(&value(
                r#"{"format": "compact", "fields": ["a"], "rows": [[1]], "meta": null}"#,
            ))
            .unwrap();
        assert!(null_meta.meta.is_none());
    }

    #[test]
    fn test_parse_payload_typed() {
        let mut parser = Parser::new();
        let payload: CompactPayload = serde_json::from_str(
            r#"{"format": "compact", "fields": ["close_price"], "rows": [["15.68"]]}"#,
        )
        .unwrap();
        let records = parser.parse_payload(&payload).unwrap();
        assert_eq!(records[0].get("close_price"), Some(&Value::from(15.68)));

        let wrong = CompactPayload {
            format: "standard".to_string(),
            ..payload
        };
        assert_eq!(parser.parse_payload(&wrong), Err(Error::InvalidFormat));
    }

    #[test]
    fn test_mapper_identity_across_calls() {
        let mut parser = Parser::new();
        let fields = vec!["x".to_string()];
        let a = parser.get_mapper(&fields);
        let b = parser.get_mapper(&fields);
        assert!(Arc::ptr_eq(&a, &b));

        parser.clear_caches();
        let c = parser.get_mapper(&fields);
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[test]
    fn test_cache_grows_per_shape() {
        let mut parser = Parser::new();
        parser.convert(&["a".to_string()], &[vec![Value::from(1)]]);
        parser.convert(&["a".to_string()], &[vec![Value::from(2)]]);
        parser.convert(&["b".to_string()], &[vec![Value::from(3)]]);
        let stats = parser.cache_stats();
        assert_eq!(stats.mapper_cache_size, 2);
        assert_eq!(stats.type_converter_cache_size, 0);
    }
}
