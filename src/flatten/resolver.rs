//! Key lookup inside a nested record.
//!
//! Resolution is a pre-order depth-first search: the current object is
//! checked for the key before any child object is visited, and children are
//! visited in insertion order. The first non-null hit wins.
//!
//! When a key name occurs at more than one path, the traversal order alone
//! decides which value is returned. That is a property of the data, not
//! something this module tries to repair; `KeyDiscoverer` reports such
//! collisions so callers can decide whether to trust the column.

use crate::flatten::types::ExclusionSet;
use serde_json::{Map, Value};

/// Finds the value for a column name inside one record
pub struct ValueResolver<'a> {
    exclude: &'a ExclusionSet,
}

impl<'a> ValueResolver<'a> {
    pub fn new(exclude: &'a ExclusionSet) -> Self {
        ValueResolver { exclude }
    }

    /// Look up `key` anywhere in `record`.
    ///
    /// Returns `None` when the key is missing, excluded, or only bound to
    /// `null`. Never fails.
    pub fn resolve<'r>(&self, record: &'r Map<String, Value>, key: &str) -> Option<&'r Value> {
        if self.exclude.contains(key) {
            return None;
        }
        self.search(record, key)
    }

    fn search<'r>(&self, obj: &'r Map<String, Value>, key: &str) -> Option<&'r Value> {
        // A direct hit ends the search at this level, even when it is null;
        // the enclosing level then moves on to the next sibling.
        if let Some(value) = obj.get(key) {
            return match value {
                Value::Null => None,
                found => Some(found),
            };
        }

        obj.iter()
            .filter(|(k, _)| !self.exclude.contains(k))
            .find_map(|(_, v)| match v {
                Value::Object(child) => self.search(child, key),
                _ => None,
            })
    }
}
