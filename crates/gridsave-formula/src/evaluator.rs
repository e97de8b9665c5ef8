//! Formula evaluator
//!
//! Evaluation is textual: every reference token in a formula body is replaced
//! by the referenced cell's text (after evaluating it, if it is a formula
//! itself), and the resulting string is parsed as plain arithmetic.

use ahash::{AHashMap, AHashSet};
use gridsave_core::{CellAddress, CellText, Grid};

use crate::error::{FormulaError, FormulaResult};
use crate::parser::parse_expression;
use crate::references::{reference_tokens, ReferenceToken};

/// Display value of any formula that fails to evaluate
pub const ERROR_SENTINEL: &str = "ERROR";

/// Text substituted for references to empty or out-of-range cells
const MISSING_CELL_TEXT: &str = "0";

/// Context for formula evaluation
///
/// Tracks the formula cells on the current resolution path so that a formula
/// that depends on itself fails with [`FormulaError::CircularReference`]
/// instead of recursing forever. A cell may be referenced any number of times
/// as long as it does not appear twice on one path.
///
/// Every formula cell resolved through a context is remembered, so a context
/// reused across many cells (as when serializing a whole grid) evaluates each
/// formula once. Resolution walks reference chains with an explicit stack, so
/// long chains cannot overflow the call stack.
pub struct EvaluationContext<'a> {
    grid: &'a Grid,
    visiting: AHashSet<CellAddress>,
    resolved: AHashMap<CellAddress, f64>,
}

impl<'a> EvaluationContext<'a> {
    pub fn new(grid: &'a Grid) -> Self {
        Self {
            grid,
            visiting: AHashSet::new(),
            resolved: AHashMap::new(),
        }
    }

    /// Substitute references and evaluate the arithmetic of a formula body
    pub fn evaluate_expression(&mut self, expr: &str) -> FormulaResult<f64> {
        let mut path = Vec::new();
        let result = self.resolve(expr, &mut path);
        // Non-empty only after a failure
        for addr in path {
            self.visiting.remove(&addr);
        }
        result
    }

    /// Evaluate the formula stored at `addr`
    ///
    /// Returns `None` when the cell is out of range or not a formula.
    pub fn evaluate_formula_at(&mut self, addr: CellAddress) -> Option<FormulaResult<f64>> {
        let grid = self.grid;
        let body = grid.cell_text(addr.row, addr.col)?.formula_body()?;
        Some(self.resolve_cell(addr, body))
    }

    /// Display value of the cell at (`row`, `col`); empty when out of range
    pub fn display_value(&mut self, row: usize, col: usize) -> String {
        let grid = self.grid;
        match grid.cell_text(row, col) {
            None => String::new(),
            Some(CellText::Literal(literal)) => literal.to_string(),
            Some(CellText::Formula(body)) => {
                into_display(self.resolve_cell(CellAddress::new(row, col), body))
            }
        }
    }

    fn resolve_cell(&mut self, addr: CellAddress, body: &str) -> FormulaResult<f64> {
        if let Some(&value) = self.resolved.get(&addr) {
            return Ok(value);
        }
        if !self.visiting.insert(addr) {
            return Err(FormulaError::CircularReference(addr));
        }

        let result = self.evaluate_expression(body);
        self.visiting.remove(&addr);
        if let Ok(value) = result {
            self.resolved.insert(addr, value);
        }
        result
    }

    /// Resolve `expr` depth first without recursion
    ///
    /// Every formula cell entered is pushed onto `path` and popped once its
    /// value is known; on failure the entries left in `path` are still in
    /// `visiting`.
    fn resolve(&mut self, expr: &str, path: &mut Vec<CellAddress>) -> FormulaResult<f64> {
        let grid = self.grid;
        let mut current = Substitution::new(expr);
        let mut suspended = Vec::new();

        loop {
            let Some(token) = current.next_reference() else {
                let value = current.finish()?;
                let Some(parent) = suspended.pop() else {
                    return Ok(value);
                };
                current = parent;
                current.push(&format_number(value));
                if let Some(addr) = path.pop() {
                    self.visiting.remove(&addr);
                    self.resolved.insert(addr, value);
                }
                continue;
            };

            let Some(addr) = token.address else {
                current.push(MISSING_CELL_TEXT);
                continue;
            };

            match grid.cell_text(addr.row, addr.col) {
                None | Some(CellText::Literal("")) => current.push(MISSING_CELL_TEXT),
                Some(CellText::Literal(text)) => current.push(text),
                Some(CellText::Formula(body)) => {
                    if let Some(&value) = self.resolved.get(&addr) {
                        current.push(&format_number(value));
                    } else if self.visiting.insert(addr) {
                        path.push(addr);
                        suspended.push(std::mem::replace(&mut current, Substitution::new(body)));
                    } else {
                        return Err(FormulaError::CircularReference(addr));
                    }
                }
            }
        }
    }
}

/// One formula body being rewritten into plain arithmetic
struct Substitution<'e> {
    expr: &'e str,
    references: std::vec::IntoIter<ReferenceToken<'e>>,
    output: String,
    copied: usize,
}

impl<'e> Substitution<'e> {
    fn new(expr: &'e str) -> Self {
        Self {
            expr,
            references: reference_tokens(expr).collect::<Vec<_>>().into_iter(),
            output: String::with_capacity(expr.len()),
            copied: 0,
        }
    }

    /// Next reference token, copying the text in front of it to the output
    fn next_reference(&mut self) -> Option<ReferenceToken<'e>> {
        let token = self.references.next()?;
        self.output.push_str(&self.expr[self.copied..token.span.start]);
        self.copied = token.span.end;
        Some(token)
    }

    fn push(&mut self, text: &str) {
        self.output.push_str(text);
    }

    /// Copy the remaining text and evaluate the arithmetic
    fn finish(&mut self) -> FormulaResult<f64> {
        self.output.push_str(&self.expr[self.copied..]);
        self.copied = self.expr.len();

        let value = parse_expression(&self.output)?.eval();
        if value.is_finite() {
            Ok(value)
        } else {
            Err(FormulaError::NonFinite)
        }
    }
}

/// Evaluate raw cell text to its display value
///
/// Literals are returned unchanged. Formulas are evaluated against `grid`;
/// any failure yields [`ERROR_SENTINEL`].
pub fn evaluate(text: &str, grid: &Grid) -> String {
    match CellText::classify(text) {
        CellText::Literal(literal) => literal.to_string(),
        CellText::Formula(body) => evaluate_expression(body, grid),
    }
}

/// Evaluate a formula body (without the leading `=`) to its display value
pub fn evaluate_expression(expr: &str, grid: &Grid) -> String {
    into_display(try_evaluate_expression(expr, grid))
}

/// Evaluate a formula body, keeping the reason for a failure
pub fn try_evaluate_expression(expr: &str, grid: &Grid) -> FormulaResult<f64> {
    EvaluationContext::new(grid).evaluate_expression(expr)
}

/// Display value of the cell at (`row`, `col`)
///
/// Unlike [`evaluate`], the cell's own position is known, so a formula that
/// references itself is reported without an extra level of recursion.
/// Out-of-range coordinates yield an empty string. To evaluate many cells of
/// one grid, reuse an [`EvaluationContext`] instead.
pub fn evaluate_cell(grid: &Grid, row: usize, col: usize) -> String {
    EvaluationContext::new(grid).display_value(row, col)
}

/// Format a number as canonical decimal text
///
/// Integral values carry no fractional part and negative zero prints as `0`.
pub fn format_number(n: f64) -> String {
    if n == 0.0 {
        // Covers -0.0 as well
        return "0".to_string();
    }
    format!("{}", n)
}

fn into_display(result: FormulaResult<f64>) -> String {
    match result {
        Ok(n) => format_number(n),
        Err(_) => ERROR_SENTINEL.to_string(),
    }
}
