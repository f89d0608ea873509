//! # Smelt - JSON lines to CSV
//!
//! Flattens newline-delimited JSON records with inconsistent nesting into
//! CSV files with one fixed column layout per dataset.
//!
//! ## Modules
//!
//! - **flatten**: column discovery, value resolution and cell coercion
//! - **batch**: convert a manifest of named datasets in one run
//! - **logging**: `tracing` subscriber setup for the binaries
//!
//! ## Quick Start
//!
//! ```rust
//! use smelt::flatten::{ContainerKeys, ExclusionSet, KeyDiscoverer, ValueCoercer, ValueResolver};
//! use smelt::flatten::{NumericListPolicy, DEFAULT_DELIMITER};
//! use serde_json::json;
//!
//! let record = json!({"id": 7, "tags": ["x", "y"], "hours": {"mon": "9-5"}});
//! let record = record.as_object().unwrap();
//!
//! let exclude: ExclusionSet = ["hours"].into_iter().collect();
//! let discovery = KeyDiscoverer::new(&exclude, ContainerKeys::Omit).discover([record]);
//! assert_eq!(discovery.schema.columns(), ["id", "tags"]);
//!
//! let resolver = ValueResolver::new(&exclude);
//! let coercer = ValueCoercer::new(DEFAULT_DELIMITER, NumericListPolicy::Join);
//! let cell = coercer.coerce(resolver.resolve(record, "tags"));
//! assert_eq!(cell, "x<+#+>y");
//! ```

use std::path::Path;

pub mod batch;
pub mod error;
pub mod flatten;
pub mod logging;

// Re-export commonly used types for convenience
pub use batch::{run_batch, BatchReport, DatasetSpec, Manifest};
pub use error::{FlattenError, Result};
pub use flatten::{
    ConversionSummary, ExclusionSet, FlattenConfig, FlattenedRow, FlatteningPipeline, HeaderSchema,
};

/// Main entry point: convert one JSON lines file into one CSV file
pub fn flatten_file<P, Q>(input: P, output: Q, config: FlattenConfig) -> Result<ConversionSummary>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    FlatteningPipeline::new(config)?.convert(input, output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_basic_flattening() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("business.json");
        let output = dir.path().join("business.csv");

        let mut file = std::fs::File::create(&input).unwrap();
        writeln!(file, r#"{{"business_id": "b1", "categories": ["Food", "Bars"], "hours": {{"mon": "9-5"}}}}"#).unwrap();
        writeln!(file, r#"{{"business_id": "b2", "attributes": {{"WiFi": "free"}}}}"#).unwrap();
        drop(file);

        let config = FlattenConfig::default().with_exclusions(["hours"].into_iter().collect());
        let summary = flatten_file(&input, &output, config).unwrap();

        assert_eq!(summary.records, 2);
        assert_eq!(summary.columns, 3);
        let csv = std::fs::read_to_string(&output).unwrap();
        assert_eq!(
            csv,
            "business_id,categories,WiFi\nb1,Food<+#+>Bars,\nb2,,free\n"
        );
    }
}
