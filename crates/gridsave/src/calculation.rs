//! Whole-grid evaluation
//!
//! Evaluates every formula cell of a grid and reports what happened, without
//! modifying the grid.
//!
//! # Example
//!
//! ```rust
//! use gridsave::prelude::*;
//!
//! let grid = Grid::from_strs(&["A", "B"], &[&["=B1", "=A1"], &["4", "=A2/2"]]).unwrap();
//! let stats = grid.calculate();
//! assert_eq!(stats.formula_count, 3);
//! assert_eq!(stats.errors, 2);
//! assert_eq!(stats.circular_references, 2);
//! ```

use crate::{CellAddress, CellText, EvaluationContext, FormulaError, Grid, ERROR_SENTINEL};

/// Statistics from evaluating a grid
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CalculationStats {
    /// Total number of formula cells
    pub formula_count: usize,
    /// Number of formulas that evaluated to `ERROR`
    pub errors: usize,
    /// Number of formulas that failed because they depend on themselves
    pub circular_references: usize,
}

/// Extension trait for evaluating a whole grid
pub trait GridCalculationExt {
    /// Evaluate every formula and count failures
    fn calculate(&self) -> CalculationStats;

    /// Every row with formulas replaced by their evaluated values
    fn evaluated_rows(&self) -> Vec<Vec<String>>;

    /// Cells whose formula evaluates to `ERROR`, in row-major order
    fn error_cells(&self) -> Vec<CellAddress>;
}

impl GridCalculationExt for Grid {
    fn calculate(&self) -> CalculationStats {
        let mut stats = CalculationStats::default();
        let mut ctx = EvaluationContext::new(self);

        for (row, col, _) in self.formula_cells() {
            stats.formula_count += 1;
            match ctx.evaluate_formula_at(CellAddress::new(row, col)) {
                Some(Ok(_)) | None => {}
                Some(Err(FormulaError::CircularReference(_))) => {
                    stats.errors += 1;
                    stats.circular_references += 1;
                }
                Some(Err(_)) => stats.errors += 1,
            }
        }

        stats
    }

    fn evaluated_rows(&self) -> Vec<Vec<String>> {
        let mut ctx = EvaluationContext::new(self);
        (0..self.row_count())
            .map(|row| {
                (0..self.col_count())
                    .map(|col| ctx.display_value(row, col))
                    .collect()
            })
            .collect()
    }

    fn error_cells(&self) -> Vec<CellAddress> {
        let mut ctx = EvaluationContext::new(self);
        self.formula_cells()
            .filter(|&(row, col, _)| ctx.display_value(row, col) == ERROR_SENTINEL)
            .map(|(row, col, _)| CellAddress::new(row, col))
            .collect()
    }
}

/// Evaluated value of a formula cell as a number, if it evaluates
pub fn numeric_value(grid: &Grid, addr: CellAddress) -> Option<f64> {
    match grid.cell_text(addr.row, addr.col)? {
        CellText::Formula(_) => EvaluationContext::new(grid)
            .evaluate_formula_at(addr)?
            .ok(),
        CellText::Literal(text) => text.trim().parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_calculate_counts() {
        let grid = Grid::from_strs(
            &["A", "B", "C"],
            &[&["1", "=A1+1", "=C1"], &["=1+", "x", "=B1*2"]],
        )
        .unwrap();
        assert_eq!(
            grid.calculate(),
            CalculationStats {
                formula_count: 4,
                errors: 2,
                circular_references: 1,
            }
        );
    }

    #[test]
    fn test_evaluated_rows() {
        let grid = Grid::from_strs(&["A", "B"], &[&["2", "=A1*A1"]]).unwrap();
        assert_eq!(grid.evaluated_rows(), vec![vec!["2".to_string(), "4".to_string()]]);
    }

    #[test]
    fn test_error_cells() {
        let grid = Grid::from_strs(&["A", "B"], &[&["=1/0", "ok"], &["=2", "=B1+1"]]).unwrap();
        assert_eq!(
            grid.error_cells(),
            vec![CellAddress::new(0, 0), CellAddress::new(1, 1)]
        );
    }

    #[test]
    fn test_numeric_value() {
        let grid = Grid::from_strs(&["A", "B", "C"], &[&["2.5", "=A1*2", "text"]]).unwrap();
        assert_eq!(numeric_value(&grid, CellAddress::new(0, 0)), Some(2.5));
        assert_eq!(numeric_value(&grid, CellAddress::new(0, 1)), Some(5.0));
        assert_eq!(numeric_value(&grid, CellAddress::new(0, 2)), None);
        assert_eq!(numeric_value(&grid, CellAddress::new(3, 0)), None);
    }
}
