//! # gridsave
//!
//! Editable grids of text cells with arithmetic formulas, saved automatically
//! to a persistence service.
//!
//! A cell whose text starts with `=` is a formula: cell references (`A1`,
//! `B12`, `AA3`) are replaced by the referenced cells' values and the result
//! is evaluated as plain arithmetic. Anything that fails evaluates to
//! `ERROR`. Every edit regenerates the grid's comma-separated document, which
//! a [`SaveSession`] uploads without ever overlapping two uploads.
//!
//! ## Features
//!
//! - Formula evaluation with circular reference detection
//! - Reading and writing the comma-separated document
//! - Coalesced autosave with status polling (`sync` feature, on by default)
//!
//! ## Example
//!
//! ```rust
//! use gridsave::prelude::*;
//!
//! let mut grid = Grid::from_strs(
//!     &["Item", "Price", "Qty", "Total"],
//!     &[&["Tea", "3", "2", "=B1*C1"]],
//! ).unwrap();
//!
//! assert_eq!(evaluate_cell(&grid, 0, 3), "6");
//!
//! grid.set_cell(0, 2, "5").unwrap();
//! assert_eq!(grid.to_document(), "Item,Price,Qty,Total\nTea,3,5,15");
//! ```

pub mod calculation;
pub mod prelude;

use std::path::Path;

// Re-export calculation types
pub use calculation::{numeric_value, CalculationStats, GridCalculationExt};

// Re-export core types
pub use gridsave_core::{CellAddress, CellText, Error, Grid, Result, FORMULA_MARKER};

// Re-export formula types
pub use gridsave_formula::{
    evaluate, evaluate_cell, evaluate_expression, format_number, parse_expression,
    reference_tokens, referenced_cells, try_evaluate_expression, EvaluationContext, Expr,
    FormulaError, FormulaResult, ReferenceToken, ERROR_SENTINEL,
};

// Re-export document types
pub use gridsave_csv::{
    CsvError, CsvResult, DocumentReadOptions, DocumentReader, DocumentWriter,
    DOCUMENT_CONTENT_TYPE, DOCUMENT_FILENAME,
};

// Re-export save orchestration
#[cfg(feature = "sync")]
pub use gridsave_sync::{
    Action, PollPolicy, SaveEvent, SaveOrchestrator, SaveSession, SaveState, SessionConfig,
    SessionError, StatusResponse, SubmissionId, SubmissionStatus, Transport, TransportError,
    Upload,
};

/// Extension trait for Grid to add document I/O
pub trait GridExt: Sized {
    /// Open a grid from a document file
    fn open<P: AsRef<Path>>(path: P) -> CsvResult<Self>;

    /// Save the evaluated document to a file
    fn save<P: AsRef<Path>>(&self, path: P) -> CsvResult<()>;

    /// Serialize to the evaluated document
    fn to_document(&self) -> String;
}

impl GridExt for Grid {
    fn open<P: AsRef<Path>>(path: P) -> CsvResult<Grid> {
        DocumentReader::read_file(path, &DocumentReadOptions::default())
    }

    fn save<P: AsRef<Path>>(&self, path: P) -> CsvResult<()> {
        DocumentWriter::write_file(self, path)
    }

    fn to_document(&self) -> String {
        DocumentWriter::to_document(self)
    }
}
