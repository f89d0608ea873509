//! smelt-flatten: Flatten one JSON lines dataset into a CSV file
//!
//! Usage:
//!   # Write CSV to stdout
//!   smelt-flatten data/json_origin/yelp_academic_dataset_tip.json
//!
//!   # Write to a file, skipping two subtrees
//!   smelt-flatten business.json -o business.csv --exclude hours,Parking
//!
//!   # Only print the discovered columns
//!   smelt-flatten review.json --print-schema
//!
//!   # Use a fixed header instead of discovering one
//!   smelt-flatten user.json -o user.csv --columns user_id,name,review_count

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{Context, Result};
use clap::Parser;
use smelt::flatten::{
    CollisionPolicy, ContainerKeys, FlattenConfig, FlatteningPipeline, HeaderSchema,
    NumericListPolicy, ParsePolicy, RecordParser,
};
use smelt::logging::{init_logging, LogConfig, LogFormat};
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "smelt-flatten")]
#[command(about = "Flatten newline-delimited JSON into CSV", long_about = None)]
struct Args {
    /// Input file, one JSON object per line (read twice, so stdin is not supported)
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Output CSV file; stdout if omitted
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Comma-separated keys whose subtrees are ignored
    #[arg(long, short = 'x', value_delimiter = ',')]
    exclude: Vec<String>,

    /// Comma-separated column list to use instead of discovery
    #[arg(long, value_delimiter = ',')]
    columns: Option<Vec<String>>,

    /// Print the discovered columns, one per line, and exit
    #[arg(long, conflicts_with = "columns")]
    print_schema: bool,

    /// Token separating the elements of multi-valued cells (default: "<+#+>")
    #[arg(long)]
    delimiter: Option<String>,

    /// CSV field separator (default: ',')
    #[arg(long)]
    field_separator: Option<char>,

    /// Whether keys holding nested objects become columns too
    #[arg(long, value_enum)]
    container_keys: Option<ContainerKeys>,

    /// How lists of integer-like values are written
    #[arg(long, value_enum)]
    numeric_lists: Option<NumericListPolicy>,

    /// What to do with malformed lines
    #[arg(long, value_enum)]
    on_parse_error: Option<ParsePolicy>,

    /// What to do when a key name appears under several paths
    #[arg(long, value_enum)]
    on_collision: Option<CollisionPolicy>,

    /// JSON parser for input lines
    #[arg(long, value_enum)]
    parser: Option<RecordParser>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&LogConfig::from_verbosity(args.verbose).with_format(args.log_format));

    // Build config
    let mut config = FlattenConfig::default();
    config.exclude = args.exclude.iter().map(|s| s.trim()).collect();
    if let Some(delimiter) = args.delimiter {
        config.delimiter = delimiter;
    }
    if let Some(sep) = args.field_separator {
        config.field_separator = sep;
    }
    if let Some(policy) = args.container_keys {
        config.container_keys = policy;
    }
    if let Some(policy) = args.numeric_lists {
        config.numeric_lists = policy;
    }
    if let Some(policy) = args.on_parse_error {
        config.on_parse_error = policy;
    }
    if let Some(policy) = args.on_collision {
        config.on_collision = policy;
    }
    if let Some(parser) = args.parser {
        config.parser = parser;
    }

    let pipeline = FlatteningPipeline::new(config).context("Invalid configuration")?;

    // Caller-supplied columns are validated before the input is opened
    let schema = match args.columns {
        Some(columns) => HeaderSchema::try_new(columns.iter().map(|c| c.trim()))
            .context("Invalid --columns")?,
        None => {
            let discovery = pipeline
                .discover(&args.input)
                .with_context(|| format!("Failed to discover columns of {}", args.input.display()))?;
            discovery.schema
        }
    };

    if args.print_schema {
        let mut stdout = std::io::stdout().lock();
        for column in &schema {
            writeln!(stdout, "{}", column)?;
        }
        return Ok(());
    }

    let summary = match &args.output {
        Some(output) => pipeline.convert_with_schema(&args.input, output, &schema),
        None => pipeline.write_csv(&args.input, std::io::stdout().lock(), &schema),
    }
    .with_context(|| format!("Failed to convert {}", args.input.display()))?;

    if summary.skipped > 0 {
        eprintln!("⚠ Warning: skipped {} malformed line(s)", summary.skipped);
    }

    Ok(())
}
