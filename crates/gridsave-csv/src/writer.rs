//! Document writer

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::CsvResult;
use gridsave_core::Grid;
use gridsave_formula::EvaluationContext;

/// File name the document is uploaded under
pub const DOCUMENT_FILENAME: &str = "data.csv";

/// Content type the document is uploaded with
pub const DOCUMENT_CONTENT_TYPE: &str = "text/csv";

const FIELD_SEPARATOR: &str = ",";
const LINE_SEPARATOR: &str = "\n";

/// Document writer
///
/// Produces the header line followed by one line per row, with every formula
/// replaced by its evaluated value. Nothing is quoted or escaped and there is
/// no trailing newline.
pub struct DocumentWriter;

impl DocumentWriter {
    /// Serialize a grid to document text
    pub fn to_document(grid: &Grid) -> String {
        let mut ctx = EvaluationContext::new(grid);
        let mut lines = Vec::with_capacity(grid.row_count() + 1);
        lines.push(grid.headers().join(FIELD_SEPARATOR));

        for row in 0..grid.row_count() {
            let cells: Vec<String> = (0..grid.col_count())
                .map(|col| ctx.display_value(row, col))
                .collect();
            lines.push(cells.join(FIELD_SEPARATOR));
        }

        lines.join(LINE_SEPARATOR)
    }

    /// Write the serialized grid to a file
    pub fn write_file<P: AsRef<Path>>(grid: &Grid, path: P) -> CsvResult<()> {
        let file = File::create(path)?;
        Self::write(grid, file)
    }

    /// Write the serialized grid to a writer
    pub fn write<W: Write>(grid: &Grid, mut writer: W) -> CsvResult<()> {
        writer.write_all(Self::to_document(grid).as_bytes())?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_formulas_are_evaluated() {
        let grid = Grid::from_strs(
            &["A", "B", "C"],
            &[&["2", "=A1*3", "x"], &["=B1+1", "", "=Z9"]],
        )
        .unwrap();
        assert_eq!(DocumentWriter::to_document(&grid), "A,B,C\n2,6,x\n7,,0");
    }

    #[test]
    fn test_errors_stay_in_their_cell() {
        let grid = Grid::from_strs(&["A", "B"], &[&["=1+", "=2*2"]]).unwrap();
        assert_eq!(DocumentWriter::to_document(&grid), "A,B\nERROR,4");
    }

    #[test]
    fn test_no_escaping() {
        let grid = Grid::from_strs(&["A", "B"], &[&["a,b", "say \"hi\""]]).unwrap();
        assert_eq!(DocumentWriter::to_document(&grid), "A,B\na,b,say \"hi\"");
    }

    #[test]
    fn test_long_running_total() {
        let rows: Vec<Vec<String>> = std::iter::once("1".to_string())
            .chain((1..4000).map(|row| format!("=A{}+1", row)))
            .map(|cell| vec![cell])
            .collect();
        let grid = Grid::new(vec!["A".to_string()], rows).unwrap();

        let document = DocumentWriter::to_document(&grid);
        let lines: Vec<&str> = document.lines().collect();
        assert_eq!(lines.len(), 4001);
        assert_eq!(lines[1], "1");
        assert_eq!(lines[4000], "4000");
    }

    #[test]
    fn test_headers_only() {
        let grid = Grid::from_strs(&["A", "B"], &[]).unwrap();
        assert_eq!(DocumentWriter::to_document(&grid), "A,B");
    }

    #[test]
    fn test_write_to_buffer() {
        let grid = Grid::from_strs(&["A"], &[&["=1+1"]]).unwrap();
        let mut buf = Vec::new();
        DocumentWriter::write(&grid, &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "A\n2");
    }
}
