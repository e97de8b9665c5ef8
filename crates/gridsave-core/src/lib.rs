//! # gridsave-core
//!
//! Core data structures for gridsave.
//!
//! This crate provides the fundamental types used throughout gridsave:
//! - [`Grid`] - Header labels plus a rectangular matrix of raw cell text
//! - [`CellAddress`] - A1-style cell addressing (`B12` → row 11, column 1)
//! - [`CellText`] - Classification of raw text into literals and formulas
//!
//! ## Example
//!
//! ```rust
//! use gridsave_core::{CellAddress, Grid};
//!
//! let mut grid = Grid::new(
//!     vec!["A".into(), "B".into()],
//!     vec![vec!["1".into(), "=A1*2".into()]],
//! )
//! .unwrap();
//!
//! assert_eq!(grid.get(0, 1), Some("=A1*2"));
//! assert!(grid.set_cell(0, 0, "5").unwrap());
//!
//! let addr = CellAddress::parse("B1").unwrap();
//! assert_eq!((addr.row, addr.col), (0, 1));
//! ```

pub mod cell;
pub mod error;
pub mod grid;

// Re-exports for convenience
pub use cell::{CellAddress, CellText, FORMULA_MARKER};
pub use error::{Error, Result};
pub use grid::Grid;
