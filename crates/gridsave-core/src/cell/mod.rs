//! Cell-related types and utilities
//!
//! This module contains:
//! - [`CellAddress`] - A cell's location (e.g., "A1")
//! - [`CellText`] - Raw cell text classified as a literal or a formula

mod address;
mod text;

pub use address::CellAddress;
pub use text::{CellText, FORMULA_MARKER};
