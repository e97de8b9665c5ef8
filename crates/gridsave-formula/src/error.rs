//! Formula error types

use gridsave_core::CellAddress;
use thiserror::Error;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Errors that can occur during formula parsing or evaluation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    /// The substituted expression is not valid arithmetic
    #[error("Parse error: {0}")]
    Parse(String),

    /// The expression evaluated to infinity or NaN
    #[error("Result is not a finite number")]
    NonFinite,

    /// A formula depends on itself, directly or through other cells
    #[error("Circular reference detected involving cell {0}")]
    CircularReference(CellAddress),

    /// Parentheses nested deeper than the parser accepts
    #[error("Parentheses nested deeper than {0} levels")]
    TooDeep(usize),

    /// More numbers and operators than the parser accepts
    #[error("Expression has more than {0} numbers and operators")]
    TooLarge(usize),
}
