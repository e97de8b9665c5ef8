//! Cell reference scanning
//!
//! A reference token is one or more uppercase ASCII letters followed by one or
//! more ASCII digits (`A1`, `B12`, `AA3`). Tokens are found left to right
//! anywhere in the formula body, with no regard for surrounding characters.

use std::ops::Range;

use gridsave_core::CellAddress;
use lazy_regex::regex;

/// A reference token found in a formula body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceToken<'a> {
    /// The token text, e.g. `"B12"`
    pub text: &'a str,
    /// Byte range of the token within the scanned expression
    pub span: Range<usize>,
    /// Decoded 0-based coordinates; `None` for row `0` or coordinates too
    /// large to represent, which can never address a cell
    pub address: Option<CellAddress>,
}

/// Scan an expression for reference tokens, left to right
pub fn reference_tokens(expr: &str) -> impl Iterator<Item = ReferenceToken<'_>> + '_ {
    regex!(r"([A-Z]+)([0-9]+)")
        .captures_iter(expr)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let address = match (caps.get(1), caps.get(2)) {
                (Some(letters), Some(digits)) => decode(letters.as_str(), digits.as_str()),
                _ => None,
            };
            Some(ReferenceToken {
                text: whole.as_str(),
                span: whole.range(),
                address,
            })
        })
}

/// Coordinates referenced by an expression, in order of appearance
///
/// Duplicates are kept. Tokens that cannot address any cell (row `0`) are
/// skipped. Used for highlighting only; evaluation does its own scan.
///
/// ```rust
/// use gridsave_core::CellAddress;
/// use gridsave_formula::referenced_cells;
///
/// assert_eq!(
///     referenced_cells("B1*C1+B1"),
///     vec![CellAddress::new(0, 1), CellAddress::new(0, 2), CellAddress::new(0, 1)],
/// );
/// ```
pub fn referenced_cells(expr: &str) -> Vec<CellAddress> {
    reference_tokens(expr).filter_map(|t| t.address).collect()
}

fn decode(letters: &str, digits: &str) -> Option<CellAddress> {
    let col = CellAddress::letters_to_column(letters).ok()?;
    let row = CellAddress::row_number_to_index(digits)?;
    Some(CellAddress::new(row, col))
}
