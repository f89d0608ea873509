use crate::error::{FlattenError, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// In-cell separator for multi-valued fields, chosen to be rare in real text.
pub const DEFAULT_DELIMITER: &str = "<+#+>";

/// Key names whose whole subtree is ignored for one dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExclusionSet(HashSet<String>);

impl ExclusionSet {
    pub fn new() -> Self {
        ExclusionSet(HashSet::new())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains(key)
    }

    pub fn insert(&mut self, key: impl Into<String>) -> bool {
        self.0.insert(key.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for ExclusionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        ExclusionSet(iter.into_iter().map(Into::into).collect())
    }
}

/// Ordered, duplicate-free list of column names for one dataset.
///
/// Built once (by discovery or from a caller-supplied list) and never
/// modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct HeaderSchema {
    columns: Vec<String>,
}

impl HeaderSchema {
    /// Build a schema from caller-supplied column names.
    ///
    /// Duplicate names are a configuration error, reported here so that it
    /// surfaces before any input is read.
    pub fn try_new<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        let mut seen = HashSet::with_capacity(columns.len());
        for column in &columns {
            if !seen.insert(column.as_str()) {
                return Err(FlattenError::DuplicateHeader(column.clone()));
            }
        }
        Ok(HeaderSchema { columns })
    }

    /// Columns produced by discovery are unique by construction.
    pub(crate) fn from_unique(columns: Vec<String>) -> Self {
        HeaderSchema { columns }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.columns.iter()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.columns.iter().any(|c| c == key)
    }
}

impl<'a> IntoIterator for &'a HeaderSchema {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.iter()
    }
}

/// One output line: a text cell per header column, in header order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FlattenedRow(Vec<String>);

impl FlattenedRow {
    pub(crate) fn new(cells: Vec<String>) -> Self {
        FlattenedRow(cells)
    }

    pub fn cells(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_cells(self) -> Vec<String> {
        self.0
    }
}

impl std::ops::Index<usize> for FlattenedRow {
    type Output = String;

    fn index(&self, idx: usize) -> &String {
        &self.0[idx]
    }
}

/// Whether a key holding a nested object becomes a column itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ContainerKeys {
    /// Only terminal keys become columns
    #[default]
    Omit,
    /// The container key is a column too, placed right before its children
    Include,
}

/// How a sequence made only of integer-like elements is rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum NumericListPolicy {
    /// Join with the delimiter token like any other sequence
    #[default]
    Join,
    /// Keep the sequence as its compact JSON text, e.g. `[1,2,3]`
    PassThrough,
}

/// What to do with a line that is not a JSON object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ParsePolicy {
    /// Abort the dataset on the first malformed line
    #[default]
    FailFast,
    /// Log the line number and carry on
    SkipAndWarn,
}

/// What to do when one key name is reachable through several paths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    #[default]
    Warn,
    Deny,
}

/// JSON parser used to decode each input line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum RecordParser {
    /// Numbers keep their source text exactly
    #[default]
    Serde,
    /// Faster, but numbers pass through `u64`/`i64`/`f64`: integers wider
    /// than 64 bits lose precision and out-of-range floats are rejected
    Simd,
}

/// Configuration for flattening one dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlattenConfig {
    /// Token placed between the elements of a multi-valued cell
    pub delimiter: String,

    /// CSV field separator
    pub field_separator: char,

    /// Subtrees to skip during discovery and resolution
    pub exclude: ExclusionSet,

    pub container_keys: ContainerKeys,

    pub numeric_lists: NumericListPolicy,

    pub on_parse_error: ParsePolicy,

    pub on_collision: CollisionPolicy,

    pub parser: RecordParser,
}

impl Default for FlattenConfig {
    fn default() -> Self {
        FlattenConfig {
            delimiter: String::from(DEFAULT_DELIMITER),
            field_separator: ',',
            exclude: ExclusionSet::new(),
            container_keys: ContainerKeys::default(),
            numeric_lists: NumericListPolicy::default(),
            on_parse_error: ParsePolicy::default(),
            on_collision: CollisionPolicy::default(),
            parser: RecordParser::default(),
        }
    }
}

impl FlattenConfig {
    pub fn with_exclusions(mut self, exclude: ExclusionSet) -> Self {
        self.exclude = exclude;
        self
    }

    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    /// Check the settings that would otherwise corrupt the output silently.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| FlattenError::InvalidDelimiter {
            token: self.delimiter.clone(),
            reason: reason.to_string(),
        };

        if !self.field_separator.is_ascii() || matches!(self.field_separator, '"' | '\n' | '\r') {
            return Err(FlattenError::InvalidDelimiter {
                token: self.field_separator.to_string(),
                reason: "field separator must be a single ASCII character other than a quote or line break".to_string(),
            });
        }
        if self.delimiter.is_empty() {
            return Err(invalid("must not be empty"));
        }
        if self.delimiter.contains(self.field_separator) {
            return Err(invalid("must not contain the CSV field separator"));
        }
        if self.delimiter.contains(['"', '\n', '\r']) {
            return Err(invalid("must not contain quotes or line breaks"));
        }
        Ok(())
    }
}

/// Counters reported after a dataset has been converted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConversionSummary {
    /// Records that produced a row
    pub records: usize,
    /// Malformed lines skipped under `ParsePolicy::SkipAndWarn`
    pub skipped: usize,
    pub columns: usize,
    /// Keys reachable through more than one path
    pub collisions: usize,
}
