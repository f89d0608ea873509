//! JSON flattening - turn nested JSON lines into fixed-layout CSV rows
//!
//! The engine has three parts:
//!
//! - `KeyDiscoverer` scans a dataset once and collects the terminal keys
//!   that become columns, in first-seen order.
//! - `ValueResolver` finds a column's value anywhere inside one record.
//! - `ValueCoercer` turns that value into a single text cell, packing lists
//!   with an in-cell delimiter token.
//!
//! `FlatteningPipeline` runs them as two passes over the input file.

pub mod types;
pub mod parser;
pub mod resolver;
pub mod coercer;
pub mod discovery;
pub mod writer;
pub mod pipeline;

pub use types::{
    CollisionPolicy, ContainerKeys, ConversionSummary, ExclusionSet, FlattenConfig, FlattenedRow,
    HeaderSchema, NumericListPolicy, ParsePolicy, RecordParser, DEFAULT_DELIMITER,
};
pub use parser::{parse_record, Records};
pub use resolver::ValueResolver;
pub use coercer::ValueCoercer;
pub use discovery::{DiscoveredKey, Discovery, KeyAccumulator, KeyCollision, KeyDiscoverer};
pub use writer::{CsvRowWriter, PartialFile};
pub use pipeline::{Flattened, FlatteningPipeline};
