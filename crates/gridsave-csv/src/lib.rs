//! # gridsave-csv
//!
//! Converts between a [`Grid`](gridsave_core::Grid) and the comma-separated
//! document that is uploaded on every save.
//!
//! The document is deliberately unescaped: cells are joined with `,` and rows
//! with `\n` exactly as they are, so a cell containing a comma produces an
//! extra column on the receiving side.
//!
//! ```rust
//! use gridsave_core::Grid;
//! use gridsave_csv::{DocumentReader, DocumentReadOptions, DocumentWriter};
//!
//! let grid = DocumentReader::read_str("A,B\n2,=A1*3", &DocumentReadOptions::default()).unwrap();
//! assert_eq!(DocumentWriter::to_document(&grid), "A,B\n2,6");
//! ```

mod error;
mod options;
mod reader;
mod writer;

pub use error::{CsvError, CsvResult};
pub use options::DocumentReadOptions;
pub use reader::DocumentReader;
pub use writer::{DocumentWriter, DOCUMENT_CONTENT_TYPE, DOCUMENT_FILENAME};
