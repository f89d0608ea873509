/// Quickstart example - flatten a few records in memory and print the CSV
use serde_json::json;
use smelt::flatten::{CsvRowWriter, FlattenConfig, FlatteningPipeline};

fn main() -> anyhow::Result<()> {
    println!("=== Smelt Quick Start ===\n");

    // Step 1: Your JSON lines
    let records = [
        json!({
            "business_id": "vcNAWiLM4dR7D2nwwJ7nCA",
            "name": "Eric Goldberg, MD",
            "categories": ["Doctors", "Health & Medical"],
            "hours": {"Tuesday": {"close": "17:00", "open": "08:00"}},
            "attributes": {"By Appointment Only": true}
        }),
        json!({
            "business_id": "JwUE5GmEO-sH1FuwJgKBlQ",
            "name": "Pine Cone Restaurant",
            "stars": 4.0,
            "attributes": {"Good For": {"dinner": true}, "Price Range": 1}
        }),
    ];
    let mut input = String::new();
    for record in &records {
        input.push_str(&serde_json::to_string(record)?);
        input.push('\n');
    }

    println!("Input:");
    println!("{}", input);

    // Step 2: Create a pipeline that ignores opening hours
    let config = FlattenConfig::default().with_exclusions(["hours", "Good For"].into_iter().collect());
    let pipeline = FlatteningPipeline::new(config)?;

    // Step 3: Pass 1 finds the columns
    let (discovery, _) = pipeline.discover_reader(input.as_bytes())?;
    println!("Columns: {:?}\n", discovery.schema.columns());

    // Step 4: Pass 2 writes one row per record
    let mut csv = CsvRowWriter::new(std::io::stdout().lock(), ',');
    csv.write_header(&discovery.schema)?;
    pipeline.for_each_row(input.as_bytes(), &discovery.schema, |row| csv.write_row(&row))?;
    csv.flush()?;

    println!("\n✓ Done! Try the CLI on a real file:");
    println!("  smelt-flatten business.json -o business.csv --exclude hours");

    Ok(())
}
