//! Ordered record type for converted rows.
//!
//! This module provides [`Record`], a wrapper around [`IndexMap`] that keeps
//! field insertion order. One `Record` is produced per input row, and its key
//! order follows the payload's `fields` list exactly, which keeps serialized
//! output and debug dumps predictable.
//!
//! ## Examples
//!
//! ```rust
//! use compact_rows::{Record, Value};
//!
//! let mut record = Record::new();
//! record.insert("ts_code".to_string(), Value::from("000001.SZ"));
//! record.insert("close".to_string(), Value::from(15.68));
//!
//! let keys: Vec<_> = record.keys().cloned().collect();
//! assert_eq!(keys, vec!["ts_code", "close"]);
//! ```

use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;

/// An insertion-ordered map of field names to values.
///
/// This is a thin wrapper around [`IndexMap`]; it backs both converted
/// records and nested objects inside payload cells.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record(IndexMap<String, crate::Value>);

impl Record {
    /// Creates an empty `Record`.
    #[must_use]
    pub fn new() -> Self {
        Record(IndexMap::new())
    }

    /// Creates an empty `Record` with the specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Record(IndexMap::with_capacity(capacity))
    }

    /// Inserts a key-value pair, returning the previous value for the key if any.
    pub fn insert(&mut self, key: String, value: crate::Value) -> Option<crate::Value> {
        self.0.insert(key, value)
    }

    /// Returns a reference to the value corresponding to the key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&crate::Value> {
        self.0.get(key)
    }

    /// Returns `true` if the record contains the key.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Returns the number of fields in the record.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the record contains no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an iterator over the field names, in insertion order.
    pub fn keys(&self) -> indexmap::map::Keys<'_, String, crate::Value> {
        self.0.keys()
    }

    /// Returns an iterator over the values, in insertion order.
    pub fn values(&self) -> indexmap::map::Values<'_, String, crate::Value> {
        self.0.values()
    }

    /// Returns an iterator over the field/value pairs, in insertion order.
    pub fn iter(&self) -> indexmap::map::Iter<'_, String, crate::Value> {
        self.0.iter()
    }
}

impl From<HashMap<String, crate::Value>> for Record {
    fn from(map: HashMap<String, crate::Value>) -> Self {
        Record(map.into_iter().collect())
    }
}

impl From<Record> for HashMap<String, crate::Value> {
    fn from(record: Record) -> Self {
        record.0.into_iter().collect()
    }
}

impl IntoIterator for Record {
    type Item = (String, crate::Value);
    type IntoIter = indexmap::map::IntoIter<String, crate::Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl FromIterator<(String, crate::Value)> for Record {
    fn from_iter<T: IntoIterator<Item = (String, crate::Value)>>(iter: T) -> Self {
        Record(IndexMap::from_iter(iter))
    }
}

impl Serialize for Record {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (k, v) in self.iter() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{MapAccess, Visitor};
        use std::fmt;

        struct RecordVisitor;

        impl<'de> Visitor<'de> for RecordVisitor {
            type Value = Record;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map of field names to values")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut record = Record::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry()? {
                    record.insert(key, value);
                }
                Ok(record)
            }
        }

        deserializer.deserialize_map(RecordVisitor)
    }
}
