use std::io::Write;

use gridsave_csv::{CsvError, DocumentReadOptions, DocumentReader, DocumentWriter};
use pretty_assertions::assert_eq;
use tempfile::NamedTempFile;

#[test]
fn read_file_then_write_file_evaluates_formulas() {
    let mut input = NamedTempFile::new().unwrap();
    write!(input, "Name,Price,Qty,Total\nTea,3,4,=B2*C2\nCake,2.5,2,=B3*C3").unwrap();

    let grid = DocumentReader::read_file(input.path(), &DocumentReadOptions::default()).unwrap();
    assert_eq!(grid.row_count(), 2);

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.csv");
    DocumentWriter::write_file(&grid, &output).unwrap();

    let written = std::fs::read_to_string(&output).unwrap();
    assert_eq!(written, "Name,Price,Qty,Total\nTea,3,4,12\nCake,2.5,2,5");
}

#[test]
fn read_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result =
        DocumentReader::read_file(dir.path().join("nope.csv"), &DocumentReadOptions::default());
    assert!(matches!(result, Err(CsvError::Io(_))));
}

#[test]
fn literal_only_document_round_trips() {
    let text = "A,B\nx,1\n,y";
    let grid = DocumentReader::read_str(text, &DocumentReadOptions::default()).unwrap();
    assert_eq!(DocumentWriter::to_document(&grid), text);
}
