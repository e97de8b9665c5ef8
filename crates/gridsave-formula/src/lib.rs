//! # gridsave-formula
//!
//! Formula evaluation for gridsave.
//!
//! This crate provides:
//! - Reference scanning (`B12` tokens → cell coordinates)
//! - Textual reference substitution with circular reference detection
//! - Arithmetic parsing (text → AST) and evaluation (AST → number)
//!
//! A formula is evaluated by replacing every reference token with the text of
//! the referenced cell (recursively evaluating referenced formulas first) and
//! then evaluating the resulting arithmetic. Any failure yields the
//! [`ERROR_SENTINEL`] for that cell only.
//!
//! ## Example
//!
//! ```rust
//! use gridsave_core::Grid;
//! use gridsave_formula::{evaluate, referenced_cells};
//!
//! let grid = Grid::from_strs(&["A", "B"], &[&["2", "=A1*3"]]).unwrap();
//!
//! assert_eq!(evaluate("=B1+1", &grid), "7");
//! assert_eq!(evaluate("=A1+", &grid), "ERROR");
//! assert_eq!(evaluate("plain text", &grid), "plain text");
//! assert_eq!(referenced_cells("A1+B1").len(), 2);
//! ```

pub mod ast;
pub mod error;
pub mod evaluator;
pub mod parser;
pub mod references;

pub use ast::{BinaryOperator, Expr, UnaryOperator};
pub use error::{FormulaError, FormulaResult};
pub use evaluator::{
    evaluate, evaluate_cell, evaluate_expression, format_number, try_evaluate_expression,
    EvaluationContext, ERROR_SENTINEL,
};
pub use parser::parse_expression;
pub use references::{reference_tokens, referenced_cells, ReferenceToken};
