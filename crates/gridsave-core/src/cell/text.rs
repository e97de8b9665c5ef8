//! Classification of raw cell text

/// Leading character that marks cell text as a formula
pub const FORMULA_MARKER: char = '=';

/// Raw cell text, classified as either a literal or a formula
///
/// Only the first character matters: `"=1+2"` is a formula with body `"1+2"`,
/// while `" =1+2"` is a literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellText<'a> {
    /// Text shown and serialized as-is
    Literal(&'a str),
    /// Formula body, without the leading marker
    Formula(&'a str),
}

impl<'a> CellText<'a> {
    /// Classify a raw cell string
    pub fn classify(text: &'a str) -> Self {
        match text.strip_prefix(FORMULA_MARKER) {
            Some(body) => CellText::Formula(body),
            None => CellText::Literal(text),
        }
    }

    /// Check if this is a formula
    pub fn is_formula(&self) -> bool {
        matches!(self, CellText::Formula(_))
    }

    /// Get the formula body, if this is a formula
    pub fn formula_body(&self) -> Option<&'a str> {
        match self {
            CellText::Formula(body) => Some(body),
            CellText::Literal(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(CellText::classify("=A1+1"), CellText::Formula("A1+1"));
        assert_eq!(CellText::classify("="), CellText::Formula(""));
        assert_eq!(CellText::classify("42"), CellText::Literal("42"));
        assert_eq!(CellText::classify(" =A1"), CellText::Literal(" =A1"));
        assert_eq!(CellText::classify(""), CellText::Literal(""));
    }

    #[test]
    fn test_formula_body() {
        assert_eq!(CellText::classify("=B2*3").formula_body(), Some("B2*3"));
        assert_eq!(CellText::classify("B2*3").formula_body(), None);
    }
}
