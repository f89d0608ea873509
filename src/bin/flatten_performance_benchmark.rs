//! Benchmark comparing the serde_json and simd-json record parsers
//!
//! Runs both passes (discovery and row flattening) over the same generated
//! Yelp-like business records with each parser.

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use smelt::flatten::{FlattenConfig, FlatteningPipeline, RecordParser};
use serde_json::json;
use std::time::{Duration, Instant};

const RECORDS: usize = 20_000;

fn main() -> anyhow::Result<()> {
    println!("=== Smelt Flatten Performance Benchmark ===\n");

    // Generate test data
    let mut input = String::new();
    for i in 0..RECORDS {
        let record = json!({
            "business_id": format!("b{}", i),
            "name": format!("Business {}", i),
            "city": "Phoenix",
            "stars": (i % 10) as f64 / 2.0,
            "categories": ["Restaurants", "Pizza", format!("Tag {}", i % 7)],
            "neighborhoods": [],
            "attributes": {
                "Wi-Fi": "free",
                "Price Range": i % 4 + 1,
                "Parking": {"garage": false, "street": i % 2 == 0},
                "Good For": {"dinner": true, "lunch": i % 3 == 0}
            },
            "hours": {
                "Monday": {"open": "09:00", "close": "17:00"},
                "Friday": {"open": "09:00", "close": "22:00"}
            }
        });
        input.push_str(&serde_json::to_string(&record)?);
        input.push('\n');
    }
    println!("Generated {} records ({} bytes)\n", RECORDS, input.len());

    let mut timings = Vec::new();
    for parser in [RecordParser::Serde, RecordParser::Simd] {
        let config = FlattenConfig {
            parser,
            exclude: ["hours", "Parking", "Good For"].into_iter().collect(),
            ..FlattenConfig::default()
        };
        let pipeline = FlatteningPipeline::new(config)?;

        println!("=== Parser: {:?} ===", parser);

        let start = Instant::now();
        let (discovery, _) = pipeline.discover_reader(input.as_bytes())?;
        let discovery_duration = start.elapsed();

        let start = Instant::now();
        let mut cells = 0usize;
        let (rows, _) = pipeline.for_each_row(input.as_bytes(), &discovery.schema, |row| {
            cells += row.len();
            Ok(())
        })?;
        let rows_duration = start.elapsed();

        println!("Columns discovered: {}", discovery.schema.len());
        println!("Discovery pass:     {:?}", discovery_duration);
        println!("Row pass:           {:?} ({} rows, {} cells)", rows_duration, rows, cells);
        println!(
            "Average per record: {:.2}μs\n",
            (discovery_duration + rows_duration).as_micros() as f64 / RECORDS as f64
        );

        timings.push((parser, discovery_duration + rows_duration));
    }

    println!("=== Performance Analysis ===\n");
    let total = |p: RecordParser| -> Duration {
        timings
            .iter()
            .find(|(parser, _)| *parser == p)
            .map(|(_, d)| *d)
            .unwrap_or_default()
    };
    let serde = total(RecordParser::Serde);
    let simd = total(RecordParser::Simd);
    println!("serde_json total: {:?}", serde);
    println!("simd-json total:  {:?}", simd);

    if simd.as_secs_f64() > 0.0 {
        let speedup = serde.as_secs_f64() / simd.as_secs_f64();
        if speedup >= 1.2 {
            println!("\n✓ simd-json is {:.2}x faster on this data", speedup);
        } else {
            println!("\n⚠ Parser choice makes little difference here ({:.2}x)", speedup);
            println!("   Note: per-line parsing copies each line for simd-json");
        }
    }

    Ok(())
}
