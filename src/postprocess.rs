//! Domain post-processing profiles.
//!
//! Generic conversion is name-pattern driven and leaves anything unmatched
//! alone; the well-known market endpoints need a firmer hand. A [`Profile`]
//! re-normalizes specific field names after generic conversion: the
//! identifier is stringified, a fixed set of numeric fields is forced to
//! float, and date fields are re-run through date coercion so they are
//! guaranteed `Date`-typed (or null) regardless of what the wire carried.
//!
//! The profiles differ in one deliberate policy: equity and index quotes
//! default a missing or unparseable numeric to `0.0`
//! ([`NumericFallback::Zero`]), while fund NAV figures stay null
//! ([`NumericFallback::Null`]). The policy is part of the profile value, not
//! buried in per-field branches.
//!
//! ## Examples
//!
//! ```rust
//! use compact_rows::postprocess::EQUITY;
//! use compact_rows::{Record, Value};
//!
//! let mut record = Record::new();
//! record.insert("close".to_string(), Value::Null);
//! let processed = EQUITY.apply(&[record]);
//! assert_eq!(processed[0].get("close"), Some(&Value::from(0.0)));
//! ```

use crate::coerce::{parse_leading_float, recoerce_date};
use crate::value::{Number, Value};
use crate::Record;

/// What a forced-numeric field becomes when the value is null, missing or
/// unparseable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NumericFallback {
    /// Degrade to `0.0` (equity and index quotes).
    Zero,
    /// Degrade to null (fund NAV figures).
    Null,
}

/// How a profile treats its date fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DatePolicy {
    /// Re-coerce unconditionally; non-dates that cannot parse become null.
    Always,
    /// Re-coerce only truthy values; null and empty cells are left as-is.
    IfPresent,
}

/// A named re-normalization pass over generically converted records.
#[derive(Debug)]
pub struct Profile {
    pub name: &'static str,
    /// Identifier field kept as a string (stringified if the wire sent a number).
    pub id_field: &'static str,
    pub numeric_fields: &'static [&'static str],
    pub numeric_fallback: NumericFallback,
    pub date_fields: &'static [&'static str],
    pub date_policy: DatePolicy,
}

const QUOTE_NUMERIC_FIELDS: &[&str] = &[
    "open",
    "high",
    "low",
    "close",
    "pre_close",
    "change",
    "pct_chg",
    "vol",
    "amount",
];

/// Equity (stock) quote profile.
pub static EQUITY: Profile = Profile {
    name: "equity",
    id_field: "ts_code",
    numeric_fields: QUOTE_NUMERIC_FIELDS,
    numeric_fallback: NumericFallback::Zero,
    date_fields: &["trade_date"],
    date_policy: DatePolicy::Always,
};

/// Index quote profile; identical normalization to [`EQUITY`].
pub static INDEX: Profile = Profile {
    name: "index",
    id_field: "ts_code",
    numeric_fields: QUOTE_NUMERIC_FIELDS,
    numeric_fallback: NumericFallback::Zero,
    date_fields: &["trade_date"],
    date_policy: DatePolicy::Always,
};

/// Fund NAV profile; null-preserving numerics.
pub static FUND: Profile = Profile {
    name: "fund",
    id_field: "ts_code",
    numeric_fields: &["unit_nav", "accum_nav", "adj_nav", "net_asset", "total_net_asset"],
    numeric_fallback: NumericFallback::Null,
    date_fields: &["nav_date", "ann_date"],
    date_policy: DatePolicy::IfPresent,
};

impl Profile {
    /// Applies this profile to every record, producing new records.
    ///
    /// The input is never mutated. Fields a record does not contain are not
    /// added; only present fields are re-normalized.
    #[must_use]
    pub fn apply(&self, records: &[Record]) -> Vec<Record> {
        records.iter().map(|r| self.apply_record(r)).collect()
    }

    fn apply_record(&self, record: &Record) -> Record {
        let mut out = Record::with_capacity(record.len());
        for (key, value) in record.iter() {
            let normalized = if key == self.id_field {
                stringify_id(value)
            } else if self.numeric_fields.contains(&key.as_str()) {
                self.force_numeric(value)
            } else if self.date_fields.contains(&key.as_str()) {
                self.force_date(value)
            } else {
                value.clone()
            };
            out.insert(key.clone(), normalized);
        }
        out
    }

    fn force_numeric(&self, value: &Value) -> Value {
        let parsed = match value {
            Value::Number(n) => Some(n.as_f64()),
            Value::String(s) => parse_leading_float(s),
            _ => None,
        };
        match parsed {
            Some(n) => Value::Number(Number::Float(n)),
            None => match self.numeric_fallback {
                NumericFallback::Zero => Value::Number(Number::Float(0.0)),
                NumericFallback::Null => Value::Null,
            },
        }
    }

    fn force_date(&self, value: &Value) -> Value {
        if self.date_policy == DatePolicy::IfPresent && is_falsy(value) {
            return value.clone();
        }
        recoerce_date(value)
    }
}

/// Identifiers stay strings even when the wire sent them as numbers.
fn stringify_id(value: &Value) -> Value {
    match value {
        Value::String(_) | Value::Null => value.clone(),
        other => Value::String(other.to_string()),
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Number(n) => n.as_f64() == 0.0,
        _ => false,
    }
}
