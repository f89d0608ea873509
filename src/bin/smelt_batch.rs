//! smelt-batch: Convert a set of JSON lines datasets to CSV files
//!
//! Usage:
//!   # The five Yelp academic datasets under ./data
//!   smelt-batch
//!
//!   # Same layout somewhere else
//!   smelt-batch --data-dir /srv/yelp
//!
//!   # Datasets listed in a manifest file
//!   smelt-batch --manifest datasets.json

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use smelt::flatten::{NumericListPolicy, ParsePolicy};
use smelt::logging::{init_logging, LogConfig, LogFormat};
use smelt::{run_batch, Manifest};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "smelt-batch")]
#[command(about = "Convert several JSON lines datasets to CSV", long_about = None)]
struct Args {
    /// JSON manifest listing the datasets; the Yelp layout is used if omitted
    #[arg(long, short = 'm')]
    manifest: Option<PathBuf>,

    /// Data directory for the built-in Yelp layout
    #[arg(long, default_value = "data", conflicts_with = "manifest")]
    data_dir: PathBuf,

    /// Override the manifest's in-cell delimiter token
    #[arg(long)]
    delimiter: Option<String>,

    /// Override the manifest's numeric list policy
    #[arg(long, value_enum)]
    numeric_lists: Option<NumericListPolicy>,

    /// Override the manifest's malformed line policy
    #[arg(long, value_enum)]
    on_parse_error: Option<ParsePolicy>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&LogConfig::from_verbosity(args.verbose).with_format(args.log_format));

    let mut manifest = match &args.manifest {
        Some(path) => Manifest::from_path(path)
            .with_context(|| format!("Failed to load manifest {}", path.display()))?,
        None => Manifest::yelp(&args.data_dir),
    };

    if let Some(delimiter) = args.delimiter {
        manifest.config.delimiter = delimiter;
    }
    if let Some(policy) = args.numeric_lists {
        manifest.config.numeric_lists = policy;
    }
    if let Some(policy) = args.on_parse_error {
        manifest.config.on_parse_error = policy;
    }
    manifest.config.validate().context("Invalid configuration")?;

    let mut stdout = std::io::stdout().lock();
    let report = run_batch(&manifest, &mut stdout)?;

    if !report.all_succeeded() {
        for failed in report.failures() {
            if let Err(err) = &failed.result {
                eprintln!("✗ {}: {}", failed.name, err);
            }
        }
        bail!(
            "{} of {} datasets failed",
            report.failures().count(),
            report.outcomes.len()
        );
    }

    Ok(())
}
