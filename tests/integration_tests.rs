use chrono::{TimeZone, Utc};
use compact_rows::coerce::{coerce_date, coerce_numeric};
use compact_rows::{
    convert, is_valid, parse, parse_equity, parse_fund, parse_index, parse_with_meta, Error,
    Parser, Value,
};
use serde_json::json;
use std::sync::Arc;

fn payload(json: serde_json::Value) -> Value {
    serde_json::from_value(json).unwrap()
}

#[test]
fn test_empty_payloads_yield_no_records() {
    let cases = [
        json!({"format": "compact", "fields": [], "rows": []}),
        json!({"format": "compact", "fields": ["ts_code"], "rows": []}),
        json!({"format": "compact", "fields": [], "rows": [[1]]}),
    ];
    for case in cases {
        assert!(parse(&payload(case)).unwrap().is_empty());
    }
}

#[test]
fn test_record_keys_follow_field_order() {
    let records = parse(&payload(json!({
        "format": "compact",
        "fields": ["zeta", "alpha", "mid"],
        "rows": [[1, 2, 3], [4, 5, 6]]
    })))
    .unwrap();

    assert_eq!(records.len(), 2);
    for record in &records {
        assert_eq!(record.len(), 3);
        let keys: Vec<_> = record.keys().cloned().collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }
}

#[test]
fn test_mapper_cache_idempotence() {
    let mut parser = Parser::new();
    let fields = vec!["ts_code".to_string(), "close".to_string()];

    let first = parser.get_mapper(&fields);
    let second = parser.get_mapper(&fields.clone());
    assert!(Arc::ptr_eq(&first, &second));

    parser.clear_caches();
    let third = parser.get_mapper(&fields);
    assert!(!Arc::ptr_eq(&first, &third));
}

#[test]
fn test_convert_and_parse_round_trip() {
    let fields: Vec<String> = ["ts_code", "trade_date", "unit_nav"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let rows = vec![
        vec![Value::from("159915.SZ"), Value::from("20240101"), Value::from("1.234")],
        vec![Value::from("159916.SZ"), Value::Null, Value::from("abc")],
    ];

    let converted = convert(&fields, &rows);
    let parsed = parse(&payload(json!({
        "format": "compact",
        "fields": ["ts_code", "trade_date", "unit_nav"],
        "rows": [
            ["159915.SZ", "20240101", "1.234"],
            ["159916.SZ", null, "abc"]
        ]
    })))
    .unwrap();

    assert_eq!(converted, parsed);
    assert_eq!(converted[0].get("unit_nav"), Some(&Value::from(1.234)));
    assert_eq!(converted[1].get("unit_nav"), Some(&Value::Null));
}

#[test]
fn test_numeric_coercion_cases() {
    assert_eq!(coerce_numeric("15.68"), Value::from(15.68));
    assert_eq!(coerce_numeric(""), Value::Null);
    assert_eq!(coerce_numeric("abc"), Value::Null);
}

#[test]
fn test_date_coercion_cases() {
    let instant = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
    assert_eq!(coerce_date("1672531200"), Value::Date(instant));
    assert_eq!(coerce_date("1672531200000"), Value::Date(instant));
    assert_eq!(coerce_date("invalid-date"), Value::Null);
}

#[test]
fn test_validator_cases() {
    assert!(is_valid(&payload(
        json!({"format": "compact", "fields": [], "rows": []})
    )));
    assert!(!is_valid(&payload(
        json!({"format": "compact", "fields": ["a"], "rows": [["x", "y"]]})
    )));
}

#[test]
fn test_structural_errors() {
    assert_eq!(parse(&Value::Null), Err(Error::NullPayload));
    assert_eq!(
        parse(&payload(json!({"format": "standard", "fields": [], "rows": []}))),
        Err(Error::InvalidFormat)
    );
    assert_eq!(
        parse(&payload(json!({"format": "compact", "fields": 1, "rows": []}))),
        Err(Error::InvalidFields)
    );
    assert_eq!(
        parse(&payload(json!({"format": "compact", "fields": [], "rows": "x"}))),
        Err(Error::InvalidRows)
    );
}

#[test]
fn test_equity_and_fund_null_policies_diverge() {
    let equity = parse_equity(&payload(json!({
        "format": "compact",
        "fields": ["close"],
        "rows": [[null]]
    })))
    .unwrap();
    assert_eq!(equity[0].get("close"), Some(&Value::from(0.0)));

    let fund = parse_fund(&payload(json!({
        "format": "compact",
        "fields": ["unit_nav"],
        "rows": [[null]]
    })))
    .unwrap();
    assert_eq!(fund[0].get("unit_nav"), Some(&Value::Null));
}

#[test]
fn test_index_matches_equity_normalization() {
    let quote = json!({
        "format": "compact",
        "fields": ["ts_code", "trade_date", "open", "close", "vol"],
        "rows": [[399001, "20240105", "11.2", null, "1000000"]]
    });

    let from_equity = parse_equity(&payload(quote.clone())).unwrap();
    let from_index = parse_index(&payload(quote)).unwrap();
    assert_eq!(from_equity, from_index);

    let record = &from_index[0];
    assert_eq!(record.get("ts_code"), Some(&Value::from("399001")));
    assert_eq!(record.get("open"), Some(&Value::from(11.2)));
    assert_eq!(record.get("close"), Some(&Value::from(0.0)));
    assert_eq!(record.get("vol"), Some(&Value::from(1000000.0)));
    assert_eq!(
        record.get("trade_date"),
        Some(&Value::Date(
            Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap()
        ))
    );
}

#[test]
fn test_fund_payload_end_to_end() {
    let records = parse_fund(&payload(json!({
        "format": "compact",
        "fields": ["ts_code", "nav_date", "unit_nav", "accum_nav", "net_asset"],
        "rows": [
            ["159915.SZ", "20240315", "1.234", "2.456", ""],
            ["159916.SZ", null, null, "bad", "5000000"]
        ]
    })))
    .unwrap();

    let first = &records[0];
    assert_eq!(first.get("unit_nav"), Some(&Value::from(1.234)));
    assert_eq!(first.get("accum_nav"), Some(&Value::from(2.456)));
    // Empty string has no numeral; the fund profile is null-preserving.
    assert_eq!(first.get("net_asset"), Some(&Value::Null));
    assert_eq!(
        first.get("nav_date"),
        Some(&Value::Date(
            Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap()
        ))
    );

    let second = &records[1];
    assert_eq!(second.get("nav_date"), Some(&Value::Null));
    assert_eq!(second.get("unit_nav"), Some(&Value::Null));
    assert_eq!(second.get("accum_nav"), Some(&Value::Null));
    assert_eq!(second.get("net_asset"), Some(&Value::from(5000000.0)));
}

#[test]
fn test_parse_with_meta_passthrough() {
    let result = parse_with_meta(&payload(json!({
        "format": "compact",
        "fields": ["ts_code"],
        "rows": [["000001.SZ"]],
        "meta": {"total": 1, "page": 1}
    })))
    .unwrap();
    assert_eq!(result.data.len(), 1);
    let meta = result.meta.unwrap();
    assert_eq!(meta.as_object().unwrap().get("total"), Some(&Value::from(1)));

    let no_meta = parse_with_meta(&payload(json!({
        "format": "compact",
        "fields": ["ts_code"],
        "rows": [["000001.SZ"]]
    })))
    .unwrap();
    assert!(no_meta.meta.is_none());
}

#[test]
fn test_end_to_end_equity_example() {
    let records = parse(&payload(json!({
        "format": "compact",
        "fields": ["ts_code", "trade_date", "close"],
        "rows": [["000001.SZ", "20240101", 15.68]]
    })))
    .unwrap();

    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.get("ts_code"), Some(&Value::from("000001.SZ")));
    assert_eq!(
        record.get("trade_date"),
        Some(&Value::Date(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        ))
    );
    assert_eq!(record.get("close"), Some(&Value::from(15.68)));
}

#[test]
fn test_unmatched_fields_never_coerced() {
    // "remark" matches no rule, so a numeric-looking string stays a string.
    let records = parse(&payload(json!({
        "format": "compact",
        "fields": ["remark"],
        "rows": [["15.68"]]
    })))
    .unwrap();
    assert_eq!(records[0].get("remark"), Some(&Value::from("15.68")));
}

#[test]
fn test_nested_values_pass_through() {
    let records = parse(&payload(json!({
        "format": "compact",
        "fields": ["tags", "extra"],
        "rows": [[["a", "b"], {"k": 1}]]
    })))
    .unwrap();

    let tags = records[0].get("tags").unwrap();
    assert_eq!(
        tags,
        &Value::Array(vec![Value::from("a"), Value::from("b")])
    );
    let extra = records[0].get("extra").unwrap().as_object().unwrap();
    assert_eq!(extra.get("k"), Some(&Value::from(1)));
}
