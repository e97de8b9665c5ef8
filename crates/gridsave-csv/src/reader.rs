//! Document reader

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{CsvError, CsvResult};
use crate::options::DocumentReadOptions;
use gridsave_core::Grid;

/// Document reader
///
/// The first record is the header row and every following record is a data
/// row. Quote characters have no special meaning, mirroring the unescaped
/// format produced by [`DocumentWriter`](crate::DocumentWriter).
///
/// Blank lines are skipped. In a single-column document an empty cell is
/// written as a blank line, so such rows do not survive a write and read:
/// `A\n\n1` reads back as the single row `1`. Documents with two or more
/// columns round-trip, since an all-empty row still contains delimiters.
pub struct DocumentReader;

impl DocumentReader {
    /// Read a document from a file into a grid
    pub fn read_file<P: AsRef<Path>>(path: P, options: &DocumentReadOptions) -> CsvResult<Grid> {
        let path = path.as_ref();
        log::debug!("reading document from {}", path.display());
        let file = File::open(path)?;
        Self::read(file, options)
    }

    /// Read a document held in memory
    pub fn read_str(text: &str, options: &DocumentReadOptions) -> CsvResult<Grid> {
        Self::read(text.as_bytes(), options)
    }

    /// Read a document from a reader into a grid
    pub fn read<R: Read>(reader: R, options: &DocumentReadOptions) -> CsvResult<Grid> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(options.delimiter)
            .quoting(false)
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut records = csv_reader.records();

        let headers: Vec<String> = match records.next() {
            Some(record) => record?.iter().map(str::to_string).collect(),
            None => return Err(CsvError::MissingHeader),
        };

        let mut rows = Vec::new();
        for result in records {
            let record = result?;
            if record.len() != headers.len() {
                log::warn!(
                    "row {} has {} fields, header has {}",
                    rows.len() + 1,
                    record.len(),
                    headers.len()
                );
            }
            rows.push(record.iter().map(str::to_string).collect());
        }

        log::debug!(
            "read document with {} columns and {} rows",
            headers.len(),
            rows.len()
        );

        Ok(Grid::new(headers, rows)?)
    }
}
