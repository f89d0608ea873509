//! Batch conversion of several named datasets
//!
//! A `Manifest` lists the datasets, each with its own input, output and
//! exclusion set, plus one shared `FlattenConfig`. Datasets are converted one
//! after another; a failure in one is recorded and the rest still run.

use crate::error::{FlattenError, Result};
use crate::flatten::{ConversionSummary, ExclusionSet, FlattenConfig, FlatteningPipeline};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// One dataset to convert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSpec {
    pub name: String,
    pub input: PathBuf,
    pub output: PathBuf,
    /// Added to the manifest-wide exclusions for this dataset only
    #[serde(default)]
    pub exclude: ExclusionSet,
}

impl DatasetSpec {
    pub fn new(name: impl Into<String>, input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        DatasetSpec {
            name: name.into(),
            input: input.into(),
            output: output.into(),
            exclude: ExclusionSet::new(),
        }
    }

    pub fn with_exclusions<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude = keys.into_iter().collect();
        self
    }
}

/// A list of datasets plus the settings shared by all of them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub config: FlattenConfig,
    pub datasets: Vec<DatasetSpec>,
}

impl Manifest {
    /// The five Yelp academic datasets under `data_dir`.
    ///
    /// Inputs are read from `<data_dir>/json_origin/` and CSVs are written
    /// directly into `data_dir`.
    pub fn yelp<P: AsRef<Path>>(data_dir: P) -> Self {
        let dir = data_dir.as_ref();
        let dataset = |name: &str| {
            DatasetSpec::new(
                name,
                dir.join("json_origin")
                    .join(format!("yelp_academic_dataset_{}.json", name)),
                dir.join(format!("{}.csv", name)),
            )
        };

        Manifest {
            config: FlattenConfig::default(),
            datasets: vec![
                dataset("business").with_exclusions(["Ambience", "Good For", "hours", "Parking"]),
                dataset("checkin"),
                dataset("review"),
                dataset("tip"),
                dataset("user"),
            ],
        }
    }

    /// Load a manifest from a JSON file.
    ///
    /// Relative dataset paths are taken relative to the manifest's directory.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| FlattenError::io(path, e))?;
        let mut manifest: Manifest = serde_json::from_str(&text).map_err(|e| FlattenError::Manifest {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        if let Some(base) = path.parent() {
            for dataset in &mut manifest.datasets {
                dataset.input = base.join(&dataset.input);
                dataset.output = base.join(&dataset.output);
            }
        }
        manifest.validate(path)?;
        Ok(manifest)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        let invalid = |message: String| FlattenError::Manifest {
            path: path.to_path_buf(),
            message,
        };

        if self.datasets.is_empty() {
            return Err(invalid("no datasets listed".to_string()));
        }
        let mut names = std::collections::HashSet::new();
        for dataset in &self.datasets {
            if !names.insert(dataset.name.as_str()) {
                return Err(invalid(format!("dataset '{}' listed twice", dataset.name)));
            }
        }
        self.config.validate()
    }

    /// The configuration used for one dataset: shared settings plus its own
    /// exclusions.
    pub fn config_for(&self, dataset: &DatasetSpec) -> FlattenConfig {
        let mut config = self.config.clone();
        for key in dataset.exclude.iter() {
            config.exclude.insert(key);
        }
        config
    }
}

/// Result of converting one dataset
#[derive(Debug)]
pub struct DatasetOutcome {
    pub name: String,
    pub result: Result<ConversionSummary>,
}

/// Results of a whole batch, in manifest order
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<DatasetOutcome>,
}

impl BatchReport {
    pub fn failures(&self) -> impl Iterator<Item = &DatasetOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }

    pub fn all_succeeded(&self) -> bool {
        self.failures().next().is_none()
    }
}

/// Convert every dataset in the manifest.
///
/// Writes `Processing N json files:` and one `[i/N] Converting ...` line per
/// dataset to `progress` before that dataset starts, then `Done.`. An
/// invalid shared configuration is an error before anything is written.
pub fn run_batch<W: Write>(manifest: &Manifest, progress: &mut W) -> Result<BatchReport> {
    manifest.config.validate()?;

    let total = manifest.datasets.len();
    let mut report = BatchReport::default();

    writeln!(progress, "Processing {} json files:", total)?;
    for (idx, dataset) in manifest.datasets.iter().enumerate() {
        writeln!(
            progress,
            "[{}/{}] Converting '{}' json file to csv...",
            idx + 1,
            total,
            dataset.name
        )?;

        let _span = tracing::info_span!("batch", dataset = %dataset.name).entered();
        let result = FlatteningPipeline::new(manifest.config_for(dataset))
            .and_then(|pipeline| pipeline.convert(&dataset.input, &dataset.output));

        match &result {
            Ok(summary) => info!(
                records = summary.records,
                columns = summary.columns,
                "converted"
            ),
            Err(err) => error!(error = %err, "conversion failed"),
        }

        report.outcomes.push(DatasetOutcome {
            name: dataset.name.clone(),
            result,
        });
    }
    writeln!(progress, "\nDone.")?;

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yelp_manifest_layout() {
        let manifest = Manifest::yelp("data");
        let names: Vec<_> = manifest.datasets.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["business", "checkin", "review", "tip", "user"]);

        let business = &manifest.datasets[0];
        assert_eq!(
            business.input,
            Path::new("data/json_origin/yelp_academic_dataset_business.json")
        );
        assert_eq!(business.output, Path::new("data/business.csv"));

        let config = manifest.config_for(business);
        for key in ["Ambience", "Good For", "hours", "Parking"] {
            assert!(config.exclude.contains(key));
        }
        assert!(manifest.config_for(&manifest.datasets[1]).exclude.is_empty());
    }

    #[test]
    fn test_manifest_from_json_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        std::fs::write(
            &path,
            r#"{
                "config": {"delimiter": "|"},
                "datasets": [
                    {"name": "tip", "input": "in/tip.json", "output": "out/tip.csv", "exclude": ["likes"]}
                ]
            }"#,
        )
        .unwrap();

        let manifest = Manifest::from_path(&path).unwrap();
        assert_eq!(manifest.config.delimiter, "|");
        assert_eq!(manifest.datasets[0].input, dir.path().join("in/tip.json"));
        assert!(manifest.config_for(&manifest.datasets[0]).exclude.contains("likes"));
    }

    #[test]
    fn test_manifest_rejects_duplicate_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        std::fs::write(
            &path,
            r#"{"datasets": [
                {"name": "a", "input": "a.json", "output": "a.csv"},
                {"name": "a", "input": "b.json", "output": "b.csv"}
            ]}"#,
        )
        .unwrap();

        let err = Manifest::from_path(&path).unwrap_err();
        assert!(matches!(err, FlattenError::Manifest { .. }));
    }

    #[test]
    fn test_invalid_config_fails_before_progress() {
        let mut manifest = Manifest::yelp("data");
        manifest.config.delimiter = String::new();

        let mut progress = Vec::new();
        let err = run_batch(&manifest, &mut progress).unwrap_err();

        assert!(matches!(err, FlattenError::InvalidDelimiter { .. }));
        assert!(progress.is_empty());
    }
}
