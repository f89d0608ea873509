//! Column discovery
//!
//! A dataset is scanned once; every record contributes its terminal keys
//! (keys whose value is not an object) and those are folded into an
//! accumulator that keeps first-seen order. The resulting `HeaderSchema` is
//! therefore reproducible across runs over the same input.

use crate::error::FlattenError;
use crate::flatten::types::{ContainerKeys, ExclusionSet, HeaderSchema};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};

/// A key found in one record, with the object keys leading to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredKey {
    pub name: String,
    pub path: Vec<String>,
}

/// One key name reachable through two different paths.
///
/// Paths are rendered dotted; a segment that itself contains a dot is quoted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCollision {
    pub key: String,
    pub first: String,
    pub second: String,
}

impl From<KeyCollision> for FlattenError {
    fn from(c: KeyCollision) -> Self {
        FlattenError::KeyCollision {
            key: c.key,
            first: c.first,
            second: c.second,
        }
    }
}

/// Ordered union of every key seen so far in one dataset.
///
/// Each dataset starts from `KeyAccumulator::default()`; the value is never
/// shared between datasets.
#[derive(Debug, Clone, Default)]
pub struct KeyAccumulator {
    order: Vec<String>,
    first_path: HashMap<String, Vec<String>>,
    collided: HashSet<String>,
    collisions: Vec<KeyCollision>,
}

impl KeyAccumulator {
    /// Fold one record's keys into the accumulator and return it.
    #[must_use]
    pub fn merge(mut self, keys: Vec<DiscoveredKey>) -> Self {
        for DiscoveredKey { name, path } in keys {
            match self.first_path.get(&name) {
                None => {
                    self.order.push(name.clone());
                    self.first_path.insert(name, path);
                }
                Some(first) if *first != path => {
                    if self.collided.insert(name.clone()) {
                        self.collisions.push(KeyCollision {
                            first: display_path(first),
                            key: name,
                            second: display_path(&path),
                        });
                    }
                }
                Some(_) => {}
            }
        }
        self
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn finish(self) -> Discovery {
        Discovery {
            schema: HeaderSchema::from_unique(self.order),
            collisions: self.collisions,
        }
    }
}

fn display_path(segments: &[String]) -> String {
    segments
        .iter()
        .map(|s| {
            if s.contains('.') {
                format!("\"{}\"", s)
            } else {
                s.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(".")
}

/// Result of a discovery pass
#[derive(Debug, Clone)]
pub struct Discovery {
    pub schema: HeaderSchema,
    /// In the order they were detected, at most one per key
    pub collisions: Vec<KeyCollision>,
}

/// Walks records to find the keys that become columns
pub struct KeyDiscoverer<'a> {
    exclude: &'a ExclusionSet,
    container_keys: ContainerKeys,
}

impl<'a> KeyDiscoverer<'a> {
    pub fn new(exclude: &'a ExclusionSet, container_keys: ContainerKeys) -> Self {
        KeyDiscoverer {
            exclude,
            container_keys,
        }
    }

    /// Discover the schema of an in-memory dataset.
    pub fn discover<'r, I>(&self, records: I) -> Discovery
    where
        I: IntoIterator<Item = &'r Map<String, Value>>,
    {
        let mut acc = KeyAccumulator::default();
        for record in records {
            acc = acc.merge(self.record_keys(record));
        }
        acc.finish()
    }

    /// Keys of one record in pre-order, excluded subtrees skipped.
    pub fn record_keys(&self, record: &Map<String, Value>) -> Vec<DiscoveredKey> {
        let mut keys = Vec::new();
        let mut path = Vec::new();
        self.walk(record, &mut path, &mut keys);
        keys
    }

    fn walk(&self, obj: &Map<String, Value>, path: &mut Vec<String>, keys: &mut Vec<DiscoveredKey>) {
        for (key, value) in obj {
            if self.exclude.contains(key) {
                continue;
            }

            path.push(key.clone());
            match value {
                Value::Object(child) => {
                    if self.container_keys == ContainerKeys::Include {
                        keys.push(DiscoveredKey {
                            name: key.clone(),
                            path: path.clone(),
                        });
                    }
                    self.walk(child, path, keys);
                }
                _ => keys.push(DiscoveredKey {
                    name: key.clone(),
                    path: path.clone(),
                }),
            }
            path.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records(values: Vec<Value>) -> Vec<Map<String, Value>> {
        values
            .into_iter()
            .map(|v| match v {
                Value::Object(obj) => obj,
                _ => panic!("test record must be an object"),
            })
            .collect()
    }

    #[test]
    fn test_only_terminal_keys() {
        let data = records(vec![json!({"a": 1, "b": {"c": 2}})]);
        let exclude = ExclusionSet::new();
        let discovery = KeyDiscoverer::new(&exclude, ContainerKeys::Omit).discover(&data);

        assert_eq!(discovery.schema.columns(), ["a", "c"]);
        assert!(discovery.collisions.is_empty());
    }

    #[test]
    fn test_union_accumulates_across_all_records() {
        let data = records(vec![
            json!({"name": "a"}),
            json!({"name": "b", "stars": 4}),
            json!({"city": "Tempe", "name": "c", "extra": {"wifi": "free"}}),
        ]);
        let exclude = ExclusionSet::new();
        let discovery = KeyDiscoverer::new(&exclude, ContainerKeys::Omit).discover(&data);

        assert_eq!(discovery.schema.columns(), ["name", "stars", "city", "wifi"]);
    }

    #[test]
    fn test_excluded_subtree_is_skipped() {
        let data = records(vec![json!({"name": "x", "hours": {"mon": "9-5"}})]);
        let exclude: ExclusionSet = ["hours"].into_iter().collect();
        let discovery = KeyDiscoverer::new(&exclude, ContainerKeys::Omit).discover(&data);

        assert_eq!(discovery.schema.columns(), ["name"]);
        assert!(!discovery.schema.contains("hours"));
        assert!(!discovery.schema.contains("mon"));
    }

    #[test]
    fn test_nested_exclusion() {
        let data = records(vec![json!({
            "attributes": {"Parking": {"lot": true}, "WiFi": "free"}
        })]);
        let exclude: ExclusionSet = ["Parking"].into_iter().collect();
        let discovery = KeyDiscoverer::new(&exclude, ContainerKeys::Omit).discover(&data);

        assert_eq!(discovery.schema.columns(), ["WiFi"]);
    }

    #[test]
    fn test_container_keys_included_before_children() {
        let data = records(vec![json!({"a": 1, "b": {"c": 2}})]);
        let exclude = ExclusionSet::new();
        let discovery = KeyDiscoverer::new(&exclude, ContainerKeys::Include).discover(&data);

        assert_eq!(discovery.schema.columns(), ["a", "b", "c"]);
    }

    #[test]
    fn test_discovery_is_idempotent() {
        let data = records(vec![
            json!({"z": 1, "m": {"q": 1, "a": 2}}),
            json!({"b": [1, 2], "z": 3}),
        ]);
        let exclude = ExclusionSet::new();
        let discoverer = KeyDiscoverer::new(&exclude, ContainerKeys::Omit);

        let first = discoverer.discover(&data).schema;
        let second = discoverer.discover(&data).schema;
        assert_eq!(first, second);
        assert_eq!(first.columns(), ["z", "q", "a", "b"]);
    }

    #[test]
    fn test_collisions_reported_once_per_key() {
        let data = records(vec![
            json!({"id": 1, "meta": {"id": 2}}),
            json!({"user": {"id": 3}}),
        ]);
        let exclude = ExclusionSet::new();
        let discovery = KeyDiscoverer::new(&exclude, ContainerKeys::Omit).discover(&data);

        assert_eq!(discovery.schema.columns(), ["id"]);
        assert_eq!(
            discovery.collisions,
            vec![KeyCollision {
                key: "id".to_string(),
                first: "id".to_string(),
                second: "meta.id".to_string(),
            }]
        );
    }

    #[test]
    fn test_same_path_in_many_records_is_not_a_collision() {
        let data = records(vec![
            json!({"votes": {"funny": 1}}),
            json!({"votes": {"funny": 0}}),
        ]);
        let exclude = ExclusionSet::new();
        let discovery = KeyDiscoverer::new(&exclude, ContainerKeys::Omit).discover(&data);

        assert!(discovery.collisions.is_empty());
    }

    #[test]
    fn test_dotted_key_is_not_confused_with_nesting() {
        let data = records(vec![
            json!({"a.x": {"b": 1}}),
            json!({"a": {"x": {"b": 2}}}),
        ]);
        let exclude = ExclusionSet::new();
        let discovery = KeyDiscoverer::new(&exclude, ContainerKeys::Omit).discover(&data);

        assert_eq!(discovery.schema.columns(), ["b"]);
        assert_eq!(
            discovery.collisions,
            vec![KeyCollision {
                key: "b".to_string(),
                first: r#""a.x".b"#.to_string(),
                second: "a.x.b".to_string(),
            }]
        );
    }
}
