//! Memoization of row mappers per distinct field list.
//!
//! Building a [`RowMapper`] walks the coercion rule table once per field;
//! responses from the same endpoint repeat the same field list for every
//! page, so the cache makes that work a one-time cost. The cache is an
//! explicit object owned by a [`crate::Parser`] (or whatever composes one),
//! not process-global state, so tests and multi-tenant hosts get isolated
//! lifetimes for free.
//!
//! Keys are the owned field lists themselves. Joining names into a single
//! string would make `["a,b", "c"]` and `["a", "b,c"]` collide; a collection
//! key cannot.
//!
//! There is no eviction: every distinct field-list shape seen over the
//! cache's lifetime adds one entry, removable only via
//! [`clear`](MapperCache::clear). [`stats`](MapperCache::stats) exposes entry
//! counts so the owner can decide when that matters.

use crate::coerce::Coercion;
use crate::RowMapper;
use std::collections::HashMap;
use std::sync::Arc;

/// An unbounded cache of [`RowMapper`]s keyed by ordered field list.
///
/// # Examples
///
/// ```rust
/// use compact_rows::MapperCache;
/// use std::sync::Arc;
///
/// let mut cache = MapperCache::new();
/// let fields = vec!["ts_code".to_string(), "close".to_string()];
///
/// let first = cache.get_or_create(&fields);
/// let second = cache.get_or_create(&fields);
/// assert!(Arc::ptr_eq(&first, &second));
/// assert_eq!(cache.stats().mapper_cache_size, 1);
/// ```
#[derive(Debug, Default)]
pub struct MapperCache {
    mappers: HashMap<Vec<String>, Arc<RowMapper>>,
    // Reserved for per-field converter memoization; counted and cleared but
    // not yet populated.
    converters: HashMap<String, Coercion>,
}

/// Entry counts for the caches, for diagnostic or memory-pressure decisions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheStats {
    pub mapper_cache_size: usize,
    pub type_converter_cache_size: usize,
}

impl MapperCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the mapper for this field list, building and storing one on
    /// first sight.
    ///
    /// The returned handle is reference-identical across calls with an equal
    /// field list, so callers may use [`Arc::ptr_eq`] as a cheap sameness
    /// check.
    #[must_use]
    pub fn get_or_create(&mut self, fields: &[String]) -> Arc<RowMapper> {
        if let Some(mapper) = self.mappers.get(fields) {
            return Arc::clone(mapper);
        }
        let mapper = Arc::new(RowMapper::new(fields));
        self.mappers.insert(fields.to_vec(), Arc::clone(&mapper));
        mapper
    }

    /// Removes all entries from both caches.
    pub fn clear(&mut self) {
        self.mappers.clear();
        self.converters.clear();
    }

    /// Current entry counts for both caches.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            mapper_cache_size: self.mappers.len(),
            type_converter_cache_size: self.converters.len(),
        }
    }
}
