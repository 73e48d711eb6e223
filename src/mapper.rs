//! Row-to-record mapping for a fixed field list.
//!
//! A [`RowMapper`] is built once per distinct field list and reused for every
//! row of that shape (see [`crate::MapperCache`]). Construction resolves the
//! coercion strategy for each field up front, so mapping a row is a single
//! pass with no per-cell rule lookups.

use crate::coerce::Coercion;
use crate::{Record, Value};

/// A pure row-to-record mapping function for one ordered field list.
///
/// Each call to [`map_row`](RowMapper::map_row) allocates a fresh [`Record`];
/// the mapper itself holds no mutable state and can be shared freely.
///
/// # Examples
///
/// ```rust
/// use compact_rows::{RowMapper, Value};
///
/// let fields = vec!["ts_code".to_string(), "close".to_string()];
/// let mapper = RowMapper::new(&fields);
///
/// let record = mapper.map_row(&[Value::from("000001.SZ"), Value::from(15.68)]);
/// assert_eq!(record.len(), 2);
/// assert_eq!(record.get("close"), Some(&Value::from(15.68)));
/// ```
#[derive(Debug)]
pub struct RowMapper {
    fields: Vec<String>,
    coercions: Vec<Coercion>,
}

impl RowMapper {
    /// Builds a mapper for the given ordered field list, resolving each
    /// field's coercion strategy once.
    #[must_use]
    pub fn new(fields: &[String]) -> Self {
        let coercions = fields
            .iter()
            .map(|name| Coercion::for_field(name))
            .collect();
        RowMapper {
            fields: fields.to_vec(),
            coercions,
        }
    }

    /// The ordered field list this mapper was built for.
    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Converts one positional row into a keyed record.
    ///
    /// The record always has exactly one key per field, in field-list order.
    /// A cell that is null, or a position beyond the row's length, maps to
    /// [`Value::Null`]; every other cell goes through the coercion strategy
    /// resolved for its field.
    #[must_use]
    pub fn map_row(&self, row: &[Value]) -> Record {
        let mut record = Record::with_capacity(self.fields.len());
        for (i, field) in self.fields.iter().enumerate() {
            let value = match row.get(i) {
                None | Some(Value::Null) => Value::Null,
                Some(cell) => self.coercions[i].apply(cell),
            };
            record.insert(field.clone(), value);
        }
        record
    }
}
