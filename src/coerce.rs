//! Field-name-driven type coercion.
//!
//! The compact format carries no per-field type information, so typing is a
//! heuristic driven by the field *name*: a string cell in a field whose name
//! contains `date` becomes a [`Value::Date`], a string cell in a field whose
//! name contains `nav`, `price`, `amount`, `ratio` or `chg` becomes a
//! [`Value::Number`], and everything else passes through untouched. Non-string
//! cells are never coerced, and a cell that fails to parse becomes
//! [`Value::Null`] rather than an error.
//!
//! The dispatch is a declarative rule table ([`RULES`]) evaluated in order,
//! so the heuristic is visible and testable in one place.
//!
//! ## Examples
//!
//! ```rust
//! use compact_rows::coerce::{coerce, Coercion};
//! use compact_rows::Value;
//!
//! // "pct_chg" matches the numeric rule via the "chg" substring.
//! assert_eq!(coerce(&Value::from("5.12"), "pct_chg"), Value::from(5.12));
//!
//! // "remark" matches no rule: the string passes through even if numeric-looking.
//! assert_eq!(coerce(&Value::from("5.12"), "remark"), Value::from("5.12"));
//!
//! assert_eq!(Coercion::for_field("trade_date"), Coercion::Date);
//! ```

use crate::value::{Number, Value};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// A coercion strategy selected for a field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Coercion {
    /// String cells are parsed into [`Value::Date`]; failures become null.
    Date,
    /// String cells are parsed into [`Value::Number`]; failures become null.
    Numeric,
    /// Cells are returned unchanged.
    Passthrough,
}

/// One entry of the field-name dispatch table.
#[derive(Debug)]
pub struct Rule {
    /// Case-sensitive substrings; any match selects the strategy.
    pub patterns: &'static [&'static str],
    pub coercion: Coercion,
}

/// Field-name dispatch rules, evaluated in order, first match wins.
///
/// Both lowercase and capitalized forms are listed explicitly; matching is
/// case-sensitive, so e.g. `PRICE` matches neither.
pub const RULES: &[Rule] = &[
    Rule {
        patterns: &["date", "Date"],
        coercion: Coercion::Date,
    },
    Rule {
        patterns: &[
            "nav", "Nav", "price", "Price", "amount", "Amount", "ratio", "Ratio", "chg", "Chg",
        ],
        coercion: Coercion::Numeric,
    },
];

/// Epoch values above this are taken as milliseconds, at or below as seconds.
const MILLIS_THRESHOLD: i64 = 9_999_999_999;

impl Coercion {
    /// Selects the coercion strategy for a field name from [`RULES`].
    #[must_use]
    pub fn for_field(field_name: &str) -> Coercion {
        for rule in RULES {
            if rule.patterns.iter().any(|p| field_name.contains(p)) {
                return rule.coercion;
            }
        }
        Coercion::Passthrough
    }

    /// Applies this strategy to a raw cell value.
    ///
    /// Only string cells are candidates for coercion; numbers, booleans and
    /// nested structures pass through unchanged regardless of strategy.
    #[must_use]
    pub fn apply(&self, value: &Value) -> Value {
        match value {
            Value::String(s) => match self {
                Coercion::Date => coerce_date(s),
                Coercion::Numeric => coerce_numeric(s),
                Coercion::Passthrough => value.clone(),
            },
            other => other.clone(),
        }
    }
}

/// Coerces a raw cell value using the strategy selected by `field_name`.
///
/// This is the single-cell entry point of the engine; [`crate::RowMapper`]
/// precomputes the strategy per field instead of re-selecting it per cell.
#[must_use]
pub fn coerce(value: &Value, field_name: &str) -> Value {
    Coercion::for_field(field_name).apply(value)
}

/// Parses a date-field string into [`Value::Date`], or [`Value::Null`] on failure.
///
/// All-digit strings are timestamps, with one carve-out: an 8-digit string
/// that is a valid `YYYYMMDD` day is a calendar date ("20240101" is
/// 2024-01-01, not an epoch second count). Remaining digit strings are epoch
/// values, milliseconds above 9,999,999,999 and seconds otherwise. Anything
/// else goes through a fixed list of common calendar formats.
///
/// # Examples
///
/// ```rust
/// use compact_rows::coerce::coerce_date;
/// use compact_rows::Value;
/// use chrono::{TimeZone, Utc};
///
/// let instant = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
/// assert_eq!(coerce_date("1672531200"), Value::Date(instant));
/// assert_eq!(coerce_date("1672531200000"), Value::Date(instant));
/// assert_eq!(coerce_date("invalid-date"), Value::Null);
/// ```
#[must_use]
pub fn coerce_date(s: &str) -> Value {
    if s.is_empty() {
        return Value::Null;
    }

    if s.bytes().all(|b| b.is_ascii_digit()) {
        if s.len() == 8 {
            if let Ok(day) = NaiveDate::parse_from_str(s, "%Y%m%d") {
                return date_from_day(day);
            }
        }
        return match s.parse::<i64>() {
            Ok(ts) => {
                let millis = if ts > MILLIS_THRESHOLD { ts } else { ts * 1000 };
                match Utc.timestamp_millis_opt(millis).single() {
                    Some(dt) => Value::Date(dt),
                    None => Value::Null,
                }
            }
            Err(_) => Value::Null,
        };
    }

    match parse_calendar(s) {
        Some(dt) => Value::Date(dt),
        None => Value::Null,
    }
}

/// Parses a numeric-field string into [`Value::Number`], or [`Value::Null`].
///
/// Empty strings and the literal `"null"` map to null. Otherwise a leading
/// float is parsed with `parseFloat`-style tolerance: trailing non-numeric
/// content is ignored, and input with no leading numeral yields null.
///
/// # Examples
///
/// ```rust
/// use compact_rows::coerce::coerce_numeric;
/// use compact_rows::Value;
///
/// assert_eq!(coerce_numeric("15.68"), Value::from(15.68));
/// assert_eq!(coerce_numeric("15.68%"), Value::from(15.68));
/// assert_eq!(coerce_numeric(""), Value::Null);
/// assert_eq!(coerce_numeric("null"), Value::Null);
/// assert_eq!(coerce_numeric("abc"), Value::Null);
/// ```
#[must_use]
pub fn coerce_numeric(s: &str) -> Value {
    if s.is_empty() || s == "null" {
        return Value::Null;
    }
    match parse_leading_float(s) {
        Some(n) => Value::Number(Number::Float(n)),
        None => Value::Null,
    }
}

/// Re-runs date coercion over an already-converted value.
///
/// Used by the domain profiles, which may see values the generic pass
/// already touched: dates are kept, strings are re-parsed, integer cells
/// are routed through the digit-string rules, anything else is null.
#[must_use]
pub(crate) fn recoerce_date(value: &Value) -> Value {
    match value {
        Value::Date(dt) => Value::Date(*dt),
        Value::String(s) => coerce_date(s),
        Value::Number(n) => match n.as_i64() {
            Some(i) if i >= 0 => coerce_date(&i.to_string()),
            _ => Value::Null,
        },
        _ => Value::Null,
    }
}

fn date_from_day(day: NaiveDate) -> Value {
    match day.and_hms_opt(0, 0, 0) {
        Some(ndt) => Value::Date(Utc.from_utc_datetime(&ndt)),
        None => Value::Null,
    }
}

/// Calendar formats accepted for non-digit date strings, tried in order.
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];
const DAY_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

fn parse_calendar(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&ndt));
        }
    }
    for fmt in DAY_FORMATS {
        if let Ok(day) = NaiveDate::parse_from_str(s, fmt) {
            if let Some(ndt) = day.and_hms_opt(0, 0, 0) {
                return Some(Utc.from_utc_datetime(&ndt));
            }
        }
    }
    None
}

/// Parses the longest valid float prefix of `s`, ignoring leading whitespace
/// and trailing garbage. Returns `None` when no digit is found.
pub(crate) fn parse_leading_float(s: &str) -> Option<f64> {
    let t = s.trim_start();
    let bytes = t.as_bytes();
    let mut end = 0;

    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    let mut saw_digit = false;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
        saw_digit = true;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        let mut frac = end + 1;
        while frac < bytes.len() && bytes[frac].is_ascii_digit() {
            frac += 1;
            saw_digit = true;
        }
        // "1." and ".5" are valid prefixes; a bare "." is not.
        if saw_digit {
            end = frac;
        }
    }
    if !saw_digit {
        return None;
    }

    // Exponent only counts when at least one digit follows it.
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp = end + 1;
        if exp < bytes.len() && (bytes[exp] == b'+' || bytes[exp] == b'-') {
            exp += 1;
        }
        let exp_digits_start = exp;
        while exp < bytes.len() && bytes[exp].is_ascii_digit() {
            exp += 1;
        }
        if exp > exp_digits_start {
            end = exp;
        }
    }

    t[..end].parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc_date(y: i32, m: u32, d: u32) -> Value {
        Value::Date(Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap())
    }

    #[test]
    fn test_rule_dispatch() {
        assert_eq!(Coercion::for_field("trade_date"), Coercion::Date);
        assert_eq!(Coercion::for_field("endDate"), Coercion::Date);
        assert_eq!(Coercion::for_field("unit_nav"), Coercion::Numeric);
        assert_eq!(Coercion::for_field("pre_close"), Coercion::Passthrough);
        assert_eq!(Coercion::for_field("pct_chg"), Coercion::Numeric);
        assert_eq!(Coercion::for_field("totalAmount"), Coercion::Numeric);
        assert_eq!(Coercion::for_field("expense_ratio"), Coercion::Numeric);
        assert_eq!(Coercion::for_field("ts_code"), Coercion::Passthrough);
        // Matching is case-sensitive: only the two listed spellings count.
        assert_eq!(Coercion::for_field("PRICE"), Coercion::Passthrough);
    }

    #[test]
    fn test_date_rule_wins_over_numeric() {
        // "update_chg_date" matches both tables; the date rule is first.
        assert_eq!(Coercion::for_field("update_chg_date"), Coercion::Date);
    }

    #[test]
    fn test_non_strings_pass_through() {
        assert_eq!(coerce(&Value::from(15.68), "close_price"), Value::from(15.68));
        assert_eq!(coerce(&Value::Bool(true), "trade_date"), Value::Bool(true));
        let nested = Value::Array(vec![Value::from(1)]);
        assert_eq!(coerce(&nested, "amount"), nested);
    }

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(coerce_numeric("15.68"), Value::from(15.68));
        assert_eq!(coerce_numeric("-3.5"), Value::from(-3.5));
        assert_eq!(coerce_numeric("1e3"), Value::from(1000.0));
        assert_eq!(coerce_numeric("  42abc"), Value::from(42.0));
        assert_eq!(coerce_numeric(""), Value::Null);
        assert_eq!(coerce_numeric("null"), Value::Null);
        assert_eq!(coerce_numeric("abc"), Value::Null);
        assert_eq!(coerce_numeric("."), Value::Null);
    }

    #[test]
    fn test_leading_float_prefix() {
        assert_eq!(parse_leading_float("1.5%"), Some(1.5));
        assert_eq!(parse_leading_float(".5"), Some(0.5));
        assert_eq!(parse_leading_float("5."), Some(5.0));
        assert_eq!(parse_leading_float("1e"), Some(1.0));
        assert_eq!(parse_leading_float("1e+"), Some(1.0));
        assert_eq!(parse_leading_float("2E2x"), Some(200.0));
        assert_eq!(parse_leading_float("-"), None);
        assert_eq!(parse_leading_float("e5"), None);
    }

    #[test]
    fn test_epoch_seconds_and_millis_agree() {
        let expected = utc_date(2023, 1, 1);
        assert_eq!(coerce_date("1672531200"), expected);
        assert_eq!(coerce_date("1672531200000"), expected);
    }

    #[test]
    fn test_yyyymmdd_is_a_calendar_day() {
        assert_eq!(coerce_date("20240101"), utc_date(2024, 1, 1));
        // 8 digits that are not a valid day fall back to the epoch rules.
        assert!(matches!(coerce_date("99999999"), Value::Date(_)));
    }

    #[test]
    fn test_calendar_strings() {
        assert_eq!(coerce_date("2024-01-01"), utc_date(2024, 1, 1));
        assert_eq!(coerce_date("2024/01/01"), utc_date(2024, 1, 1));
        assert_eq!(
            coerce_date("2024-01-01T08:30:00"),
            Value::Date(Utc.with_ymd_and_hms(2024, 1, 1, 8, 30, 0).unwrap())
        );
        assert_eq!(
            coerce_date("2024-01-01T00:00:00Z"),
            utc_date(2024, 1, 1)
        );
    }

    #[test]
    fn test_date_failures_become_null() {
        assert_eq!(coerce_date(""), Value::Null);
        assert_eq!(coerce_date("invalid-date"), Value::Null);
        assert_eq!(coerce_date("2024-13-45"), Value::Null);
        // i64 overflow on an absurdly long digit string.
        assert_eq!(coerce_date("99999999999999999999999"), Value::Null);
    }

    #[test]
    fn test_recoerce_date() {
        let dt = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(recoerce_date(&Value::Date(dt)), Value::Date(dt));
        assert_eq!(recoerce_date(&Value::from("20240101")), utc_date(2024, 1, 1));
        assert_eq!(recoerce_date(&Value::from(20240101i64)), utc_date(2024, 1, 1));
        assert_eq!(recoerce_date(&Value::Null), Value::Null);
        assert_eq!(recoerce_date(&Value::Bool(true)), Value::Null);
    }
}
