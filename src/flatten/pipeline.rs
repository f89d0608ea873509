//! Two-pass conversion of one dataset
//!
//! Pass 1 discovers the header schema over the whole file. Pass 2 reads the
//! file again and turns every record into a row aligned with that schema.
//! Both passes open their own handle, so nothing is held open between them.

use crate::error::{FlattenError, Result};
use crate::flatten::coercer::ValueCoercer;
use crate::flatten::discovery::{Discovery, KeyAccumulator, KeyDiscoverer};
use crate::flatten::parser::Records;
use crate::flatten::resolver::ValueResolver;
use crate::flatten::types::{
    CollisionPolicy, ConversionSummary, FlattenConfig, FlattenedRow, HeaderSchema,
};
use crate::flatten::writer::{CsvRowWriter, PartialFile};
use serde_json::{Map, Value};
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use tracing::{debug, info, warn};

/// Schema and rows of a dataset flattened in memory
#[derive(Debug, Clone)]
pub struct Flattened {
    pub schema: HeaderSchema,
    pub rows: Vec<FlattenedRow>,
    pub summary: ConversionSummary,
}

/// Converts newline-delimited JSON into rows with a fixed column layout
pub struct FlatteningPipeline {
    config: FlattenConfig,
    coercer: ValueCoercer,
}

impl FlatteningPipeline {
    /// Create a pipeline, rejecting configurations that would corrupt output.
    pub fn new(config: FlattenConfig) -> Result<Self> {
        config.validate()?;
        let coercer = ValueCoercer::new(config.delimiter.clone(), config.numeric_lists);
        Ok(FlatteningPipeline { config, coercer })
    }

    pub fn config(&self) -> &FlattenConfig {
        &self.config
    }

    /// Pass 1 over any reader. Returns the discovery and the skipped line count.
    pub fn discover_reader<R: BufRead>(&self, reader: R) -> Result<(Discovery, usize)> {
        let discoverer = KeyDiscoverer::new(&self.config.exclude, self.config.container_keys);
        let mut records = Records::new(reader, self.config.parser, self.config.on_parse_error);

        let mut acc = KeyAccumulator::default();
        let mut count = 0usize;
        for record in &mut records {
            acc = acc.merge(discoverer.record_keys(&record?));
            count += 1;
        }
        debug!(records = count, columns = acc.len(), "discovery pass complete");

        let discovery = acc.finish();
        self.check_collisions(&discovery)?;
        Ok((discovery, records.skipped()))
    }

    /// Pass 1 over a file.
    pub fn discover<P: AsRef<Path>>(&self, input: P) -> Result<Discovery> {
        let (discovery, _) = self.discover_reader(open(input.as_ref())?)?;
        Ok(discovery)
    }

    /// Resolve and coerce every header column for one record.
    pub fn flatten_row(&self, schema: &HeaderSchema, record: &Map<String, Value>) -> FlattenedRow {
        let resolver = ValueResolver::new(&self.config.exclude);
        let cells = schema
            .iter()
            .map(|key| self.coercer.coerce(resolver.resolve(record, key)))
            .collect();
        FlattenedRow::new(cells)
    }

    /// Pass 2 over any reader, handing each row to `sink` in input order.
    ///
    /// Returns `(records, skipped)`.
    pub fn for_each_row<R, F>(&self, reader: R, schema: &HeaderSchema, mut sink: F) -> Result<(usize, usize)>
    where
        R: BufRead,
        F: FnMut(FlattenedRow) -> Result<()>,
    {
        let mut records = Records::new(reader, self.config.parser, self.config.on_parse_error);
        let mut count = 0usize;
        for record in &mut records {
            sink(self.flatten_row(schema, &record?))?;
            count += 1;
        }
        Ok((count, records.skipped()))
    }

    /// Discover and flatten a whole file in memory.
    pub fn flatten<P: AsRef<Path>>(&self, input: P) -> Result<Flattened> {
        let input = input.as_ref();
        let (discovery, _) = self.discover_reader(open(input)?)?;
        let collisions = discovery.collisions.len();
        let mut flattened = self.flatten_with_schema(input, discovery.schema)?;
        flattened.summary.collisions = collisions;
        Ok(flattened)
    }

    /// Flatten a file against a caller-supplied schema, skipping discovery.
    pub fn flatten_with_schema<P: AsRef<Path>>(&self, input: P, schema: HeaderSchema) -> Result<Flattened> {
        let mut rows = Vec::new();
        let (records, skipped) = self.for_each_row(open(input.as_ref())?, &schema, |row| {
            rows.push(row);
            Ok(())
        })?;

        Ok(Flattened {
            summary: ConversionSummary {
                records,
                skipped,
                columns: schema.len(),
                collisions: 0,
            },
            schema,
            rows,
        })
    }

    /// Convert a dataset file into a CSV file.
    ///
    /// The CSV only appears at `output` when the whole dataset converted;
    /// on error nothing is left behind.
    pub fn convert<P, Q>(&self, input: P, output: Q) -> Result<ConversionSummary>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let input = input.as_ref();
        let _span = tracing::info_span!("dataset", input = %input.display()).entered();

        let (discovery, _) = self.discover_reader(open(input)?)?;
        info!(columns = discovery.schema.len(), "header schema discovered");

        let mut summary = self.convert_with_schema(input, output, &discovery.schema)?;
        summary.collisions = discovery.collisions.len();
        Ok(summary)
    }

    /// Convert a dataset file into a CSV file using a caller-supplied schema.
    pub fn convert_with_schema<P, Q>(&self, input: P, output: Q, schema: &HeaderSchema) -> Result<ConversionSummary>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let (partial, file) = PartialFile::create(output.as_ref())?;
        let summary = self.write_csv(input, file, schema)?;
        partial.commit()?;
        info!(
            output = %output.as_ref().display(),
            records = summary.records,
            skipped = summary.skipped,
            "dataset written"
        );
        Ok(summary)
    }

    /// Pass 2 from a file into any writer: header line, then one row per record.
    pub fn write_csv<P: AsRef<Path>, W: Write>(&self, input: P, writer: W, schema: &HeaderSchema) -> Result<ConversionSummary> {
        let mut csv = CsvRowWriter::new(writer, self.config.field_separator);
        csv.write_header(schema)?;
        let (records, skipped) = self.for_each_row(open(input.as_ref())?, schema, |row| csv.write_row(&row))?;
        csv.flush()?;

        Ok(ConversionSummary {
            records,
            skipped,
            columns: schema.len(),
            collisions: 0,
        })
    }

    fn check_collisions(&self, discovery: &Discovery) -> Result<()> {
        for collision in &discovery.collisions {
            warn!(
                key = %collision.key,
                first = %collision.first,
                second = %collision.second,
                "key reachable through more than one path; first match in traversal order wins"
            );
        }

        match (self.config.on_collision, discovery.collisions.first()) {
            (CollisionPolicy::Deny, Some(collision)) => Err(collision.clone().into()),
            _ => Ok(()),
        }
    }
}

fn open(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).map_err(|e| FlattenError::io(path, e))?;
    Ok(BufReader::new(file))
}
