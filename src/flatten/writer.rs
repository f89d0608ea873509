use crate::error::{FlattenError, Result};
use crate::flatten::types::{FlattenedRow, HeaderSchema};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Writes a header and flattened rows as CSV.
///
/// A schema with no columns writes nothing at all: an empty CSV record can
/// only be spelled `""`, which readers take as one unnamed column.
pub struct CsvRowWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> CsvRowWriter<W> {
    /// Fields are quoted only when they contain the separator, a quote or a
    /// line break.
    pub fn new(writer: W, field_separator: char) -> Self {
        let writer = csv::WriterBuilder::new()
            .delimiter(field_separator as u8)
            .quote_style(csv::QuoteStyle::Necessary)
            .from_writer(writer);
        CsvRowWriter { writer }
    }

    pub fn write_header(&mut self, schema: &HeaderSchema) -> Result<()> {
        if schema.is_empty() {
            return Ok(());
        }
        self.writer.write_record(schema.columns())?;
        Ok(())
    }

    pub fn write_row(&mut self, row: &FlattenedRow) -> Result<()> {
        if row.is_empty() {
            return Ok(());
        }
        self.writer.write_record(row.cells())?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// An output file that only appears at its final path once complete.
///
/// Rows go to `<name>.partial` next to the target. `commit` renames it into
/// place; dropping without committing removes it.
pub struct PartialFile {
    partial: PathBuf,
    target: PathBuf,
    committed: bool,
}

impl PartialFile {
    pub fn create<P: AsRef<Path>>(target: P) -> Result<(Self, File)> {
        let target = target.as_ref().to_path_buf();

        let Some(name) = target.file_name() else {
            return Err(FlattenError::io(
                &target,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "output path has no file name"),
            ));
        };
        let mut partial_name = name.to_os_string();
        partial_name.push(".partial");
        let partial = target.with_file_name(partial_name);

        if let Some(dir) = target.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|e| FlattenError::io(dir, e))?;
        }

        let file = File::create(&partial).map_err(|e| FlattenError::io(&partial, e))?;
        Ok((
            PartialFile {
                partial,
                target,
                committed: false,
            },
            file,
        ))
    }

    pub fn partial_path(&self) -> &Path {
        &self.partial
    }

    /// Move the finished file to its final path.
    pub fn commit(mut self) -> Result<()> {
        std::fs::rename(&self.partial, &self.target)
            .map_err(|e| FlattenError::io(&self.target, e))?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if !self.committed {
            let _ = std::fs::remove_file(&self.partial);
        }
    }
}
