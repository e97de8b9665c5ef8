//! Grid type

use crate::cell::{CellAddress, CellText};
use crate::error::{Error, Result};

/// Header labels plus a rectangular matrix of raw cell text
///
/// Every row holds exactly one cell per header. The shape is fixed once the
/// grid is built; cells are only ever replaced one at a time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Grid {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Grid {
    /// Create a grid, checking that every row is as wide as the header row
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        let expected = headers.len();
        if let Some((row, cells)) = rows
            .iter()
            .enumerate()
            .find(|(_, cells)| cells.len() != expected)
        {
            return Err(Error::RaggedRow {
                row,
                expected,
                actual: cells.len(),
            });
        }

        Ok(Self { headers, rows })
    }

    /// Build a grid from string slices (convenient in tests and examples)
    pub fn from_strs(headers: &[&str], rows: &[&[&str]]) -> Result<Self> {
        Self::new(
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|row| row.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    /// Header labels, in column order
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// All rows, in order
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of data rows (the header row is not counted)
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns
    pub fn col_count(&self) -> usize {
        self.headers.len()
    }

    /// Check whether the coordinates address a cell of this grid
    pub fn contains(&self, row: usize, col: usize) -> bool {
        row < self.row_count() && col < self.col_count()
    }

    /// Get the raw text of a cell, or `None` when out of range
    pub fn get(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row)?.get(col).map(String::as_str)
    }

    /// Get the raw text of a cell by address
    pub fn get_address(&self, addr: CellAddress) -> Option<&str> {
        self.get(addr.row, addr.col)
    }

    /// Classify a cell's text, or `None` when out of range
    pub fn cell_text(&self, row: usize, col: usize) -> Option<CellText<'_>> {
        self.get(row, col).map(CellText::classify)
    }

    /// Check if a cell holds a formula
    pub fn is_formula(&self, row: usize, col: usize) -> bool {
        self.cell_text(row, col).is_some_and(|t| t.is_formula())
    }

    /// Iterate over every formula cell as `(row, col, text)`
    pub fn formula_cells(&self) -> impl Iterator<Item = (usize, usize, &str)> + '_ {
        self.rows.iter().enumerate().flat_map(|(row, cells)| {
            cells
                .iter()
                .enumerate()
                .filter(|(_, text)| CellText::classify(text).is_formula())
                .map(move |(col, text)| (row, col, text.as_str()))
        })
    }

    /// Replace the text of one cell
    ///
    /// Returns `Ok(false)` when the new value equals the current text, in
    /// which case nothing is modified.
    pub fn set_cell<S: Into<String>>(&mut self, row: usize, col: usize, value: S) -> Result<bool> {
        let (rows, cols) = (self.row_count(), self.col_count());
        let cell = self
            .rows
            .get_mut(row)
            .and_then(|cells| cells.get_mut(col))
            .ok_or(Error::IndexOutOfBounds {
                row,
                col,
                rows,
                cols,
            })?;

        let value = value.into();
        if *cell == value {
            return Ok(false);
        }

        *cell = value;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Grid {
        Grid::from_strs(&["A", "B"], &[&["1", "=A1*2"], &["x", ""]]).unwrap()
    }

    #[test]
    fn test_new_rejects_ragged_rows() {
        let err = Grid::from_strs(&["A", "B"], &[&["1", "2"], &["3"]]).unwrap_err();
        assert_eq!(
            err,
            Error::RaggedRow {
                row: 1,
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn test_dimensions() {
        let grid = sample();
        assert_eq!(grid.row_count(), 2);
        assert_eq!(grid.col_count(), 2);
        assert!(grid.contains(1, 1));
        assert!(!grid.contains(2, 0));
        assert!(!grid.contains(0, 2));
    }

    #[test]
    fn test_get() {
        let grid = sample();
        assert_eq!(grid.get(0, 1), Some("=A1*2"));
        assert_eq!(grid.get(1, 1), Some(""));
        assert_eq!(grid.get(5, 0), None);
        assert_eq!(grid.get_address(CellAddress::new(1, 0)), Some("x"));
    }

    #[test]
    fn test_formula_cells() {
        let grid = sample();
        let formulas: Vec<_> = grid.formula_cells().collect();
        assert_eq!(formulas, vec![(0, 1, "=A1*2")]);
        assert!(grid.is_formula(0, 1));
        assert!(!grid.is_formula(0, 0));
    }

    #[test]
    fn test_set_cell() {
        let mut grid = sample();
        assert!(grid.set_cell(1, 0, "7").unwrap());
        assert_eq!(grid.get(1, 0), Some("7"));

        // Same text is a no-op
        assert!(!grid.set_cell(1, 0, "7").unwrap());
    }

    #[test]
    fn test_set_cell_out_of_bounds() {
        let mut grid = sample();
        let err = grid.set_cell(2, 0, "1").unwrap_err();
        assert_eq!(
            err,
            Error::IndexOutOfBounds {
                row: 2,
                col: 0,
                rows: 2,
                cols: 2
            }
        );
        assert_eq!(grid, sample());
    }
}
