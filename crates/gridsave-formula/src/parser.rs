//! Arithmetic parser
//!
//! A recursive descent parser for the arithmetic left over once every cell
//! reference has been substituted, with standard operator precedence.

use crate::ast::{BinaryOperator, Expr, UnaryOperator};
use crate::error::{FormulaError, FormulaResult};

/// Deepest parenthesis nesting accepted
pub const MAX_NESTING_DEPTH: usize = 128;

/// Most AST nodes (numbers and operators) one expression may produce
pub const MAX_EXPRESSION_NODES: usize = 4096;

/// Parse an arithmetic expression into an AST
///
/// Supports `+ - * /`, parentheses, decimal numbers (with an optional
/// exponent) and prefix minus/plus. Anything else, including leftover
/// letters from text that was substituted into the expression, is an error.
///
/// Nesting beyond [`MAX_NESTING_DEPTH`] parentheses fails with
/// [`FormulaError::TooDeep`] and expressions with more than
/// [`MAX_EXPRESSION_NODES`] nodes fail with [`FormulaError::TooLarge`], so
/// neither parsing nor evaluating the AST can exhaust the stack. A run of
/// prefix signs folds into at most one negation.
///
/// # Example
/// ```rust
/// use gridsave_formula::parse_expression;
///
/// let ast = parse_expression("1+2*3").unwrap();
/// assert_eq!(ast.eval(), 7.0);
/// assert!(parse_expression("1+").is_err());
/// assert!(parse_expression("15%*150").is_err());
/// ```
pub fn parse_expression(input: &str) -> FormulaResult<Expr> {
    let mut parser = ExpressionParser::new(input);
    let expr = parser.parse_expression()?;

    // Make sure we consumed all input
    if !matches!(parser.current_token(), Token::Eof) {
        return Err(FormulaError::Parse(format!(
            "Unexpected {:?} after expression",
            parser.current_token()
        )));
    }

    Ok(expr)
}

/// Token types
#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),

    // Operators
    Plus,
    Minus,
    Star,
    Slash,

    // Delimiters
    LeftParen,
    RightParen,

    /// Text that cannot start any token (e.g. `%`, `$`, letters)
    Invalid(String),

    // End of input
    Eof,
}

/// Arithmetic expression parser
struct ExpressionParser<'a> {
    input: &'a str,
    pos: usize,
    current_token: Token,
    depth: usize,
    nodes: usize,
}

impl<'a> ExpressionParser<'a> {
    fn new(input: &'a str) -> Self {
        let mut parser = Self {
            input,
            pos: 0,
            current_token: Token::Eof,
            depth: 0,
            nodes: 0,
        };
        parser.advance_token();
        parser
    }

    // === Token scanning ===

    fn advance_token(&mut self) {
        self.current_token = self.scan_token();
    }

    fn scan_token(&mut self) -> Token {
        self.skip_whitespace();

        let Some(c) = self.peek_char() else {
            return Token::Eof;
        };

        let single = match c {
            '+' => Some(Token::Plus),
            '-' => Some(Token::Minus),
            '*' => Some(Token::Star),
            '/' => Some(Token::Slash),
            '(' => Some(Token::LeftParen),
            ')' => Some(Token::RightParen),
            _ => None,
        };
        if let Some(token) = single {
            self.advance();
            return token;
        }

        let starts_fraction = c == '.' && self.peek_char_at(1).is_some_and(|c| c.is_ascii_digit());
        if c.is_ascii_digit() || starts_fraction {
            return self.scan_number();
        }

        // Unknown character: swallow the rest of the word for the error message
        let start = self.pos;
        self.advance();
        while self.peek_char().is_some_and(|c| c.is_alphanumeric()) {
            self.advance();
        }
        Token::Invalid(self.input[start..self.pos].to_string())
    }

    fn scan_number(&mut self) -> Token {
        let start = self.pos;

        // Integer part
        while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }

        // Decimal part
        if self.peek_char() == Some('.') {
            self.advance();
            while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        // Exponent part
        if self.peek_char().is_some_and(|c| c == 'e' || c == 'E') {
            self.advance();
            if self.peek_char().is_some_and(|c| c == '+' || c == '-') {
                self.advance();
            }
            while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        let num_str = &self.input[start..self.pos];
        match num_str.parse::<f64>() {
            Ok(n) => Token::Number(n),
            Err(_) => Token::Invalid(num_str.to_string()),
        }
    }

    // === Helper methods ===

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().is_some_and(|c| c.is_whitespace()) {
            self.advance();
        }
    }

    fn current_token(&self) -> &Token {
        &self.current_token
    }

    fn consume(&mut self) -> Token {
        let token = std::mem::replace(&mut self.current_token, Token::Eof);
        self.advance_token();
        token
    }

    /// Count one more AST node against the size limit
    fn add_node(&mut self) -> FormulaResult<()> {
        self.nodes += 1;
        if self.nodes > MAX_EXPRESSION_NODES {
            return Err(FormulaError::TooLarge(MAX_EXPRESSION_NODES));
        }
        Ok(())
    }

    fn expect(&mut self, expected: &Token) -> FormulaResult<()> {
        if self.current_token() == expected {
            self.consume();
            Ok(())
        } else {
            Err(FormulaError::Parse(format!(
                "Expected {:?}, got {:?}",
                expected,
                self.current_token()
            )))
        }
    }

    // === Expression parsing with precedence ===
    // Precedence (lowest to highest):
    // 1. Addition/Subtraction: +, -
    // 2. Multiplication/Division: *, /
    // 3. Unary: -, +
    // 4. Primary: numbers, parentheses

    fn parse_expression(&mut self) -> FormulaResult<Expr> {
        self.parse_additive()
    }

    fn parse_additive(&mut self) -> FormulaResult<Expr> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.current_token() {
                Token::Plus => BinaryOperator::Add,
                Token::Minus => BinaryOperator::Subtract,
                _ => break,
            };

            self.consume();
            let right = self.parse_multiplicative()?;
            self.add_node()?;
            left = Expr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> FormulaResult<Expr> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match self.current_token() {
                Token::Star => BinaryOperator::Multiply,
                Token::Slash => BinaryOperator::Divide,
                _ => break,
            };

            self.consume();
            let right = self.parse_unary()?;
            self.add_node()?;
            left = Expr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> FormulaResult<Expr> {
        // Prefix signs: each minus flips, each plus is a no-op
        let mut negate = false;
        loop {
            match self.current_token() {
                Token::Minus => negate = !negate,
                Token::Plus => {}
                _ => break,
            }
            self.consume();
        }

        let operand = self.parse_primary()?;
        if !negate {
            return Ok(operand);
        }

        self.add_node()?;
        Ok(Expr::UnaryOp {
            op: UnaryOperator::Negate,
            operand: Box::new(operand),
        })
    }

    fn parse_primary(&mut self) -> FormulaResult<Expr> {
        match self.consume() {
            Token::Number(n) => {
                self.add_node()?;
                Ok(Expr::Number(n))
            }

            Token::LeftParen => {
                self.depth += 1;
                if self.depth > MAX_NESTING_DEPTH {
                    return Err(FormulaError::TooDeep(MAX_NESTING_DEPTH));
                }
                let expr = self.parse_expression()?;
                self.expect(&Token::RightParen)?;
                self.depth -= 1;
                Ok(expr)
            }

            Token::Eof => Err(FormulaError::Parse("Unexpected end of expression".into())),

            Token::Invalid(text) => Err(FormulaError::Parse(format!(
                "Unexpected '{}' in expression",
                text
            ))),

            other => Err(FormulaError::Parse(format!("Unexpected token: {:?}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(input: &str) -> f64 {
        parse_expression(input).unwrap().eval()
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_expression("42").unwrap(), Expr::Number(42.0));
        assert_eq!(parse_expression("3.25").unwrap(), Expr::Number(3.25));
        assert_eq!(parse_expression(".5").unwrap(), Expr::Number(0.5));
        assert_eq!(parse_expression("1e3").unwrap(), Expr::Number(1000.0));
        assert_eq!(parse_expression("  7  ").unwrap(), Expr::Number(7.0));
    }

    #[test]
    fn test_parse_arithmetic() {
        let ast = parse_expression("1+2*3").unwrap();
        // Should parse as 1+(2*3) due to precedence
        if let Expr::BinaryOp { op, left, right } = ast {
            assert_eq!(op, BinaryOperator::Add);
            assert_eq!(*left, Expr::Number(1.0));
            assert!(matches!(
                *right,
                Expr::BinaryOp {
                    op: BinaryOperator::Multiply,
                    ..
                }
            ));
        } else {
            panic!("Expected BinaryOp");
        }
    }

    #[test]
    fn test_precedence_and_associativity() {
        assert_eq!(eval("2+3*4-5"), 9.0);
        assert_eq!(eval("(1+2)*3"), 9.0);
        assert_eq!(eval("10-4-3"), 3.0);
        assert_eq!(eval("24/4/2"), 3.0);
        assert_eq!(eval("2*(3+(4-1))/3"), 4.0);
    }

    #[test]
    fn test_parse_unary() {
        assert!(matches!(
            parse_expression("-5").unwrap(),
            Expr::UnaryOp {
                op: UnaryOperator::Negate,
                ..
            }
        ));
        assert_eq!(eval("--5"), 5.0);
        assert_eq!(eval("2--3"), 5.0);
        assert_eq!(eval("+4"), 4.0);
        assert_eq!(eval("-(2+3)*2"), -10.0);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_expression("").is_err());
        assert!(parse_expression("1+").is_err());
        assert!(parse_expression("(1+2").is_err());
        assert!(parse_expression("1+2)").is_err());
        assert!(parse_expression("3 4").is_err());
        assert!(parse_expression("*2").is_err());
        assert!(parse_expression("1e").is_err());
    }

    #[test]
    fn test_sign_runs_fold() {
        assert_eq!(parse_expression("---5").unwrap(), parse_expression("-5").unwrap());
        assert_eq!(parse_expression("-+-5").unwrap(), Expr::Number(5.0));

        let many = format!("{}1", "-".repeat(200_001));
        assert_eq!(eval(&many), -1.0);
    }

    #[test]
    fn test_nesting_limit() {
        let nested = |n: usize| format!("{}1{}", "(".repeat(n), ")".repeat(n));
        assert_eq!(eval(&nested(MAX_NESTING_DEPTH)), 1.0);
        assert_eq!(
            parse_expression(&nested(MAX_NESTING_DEPTH + 1)),
            Err(FormulaError::TooDeep(MAX_NESTING_DEPTH))
        );
        assert_eq!(
            parse_expression(&nested(2000)),
            Err(FormulaError::TooDeep(MAX_NESTING_DEPTH))
        );
        // Sequential groups do not accumulate depth
        assert_eq!(eval(&vec!["(1)"; 500].join("+")), 500.0);
    }

    #[test]
    fn test_size_limit() {
        let sum = |terms: usize| vec!["1"; terms].join("+");
        assert_eq!(eval(&sum(1000)), 1000.0);
        assert_eq!(
            parse_expression(&sum(5000)),
            Err(FormulaError::TooLarge(MAX_EXPRESSION_NODES))
        );
    }

    #[test]
    fn test_parse_rejects_non_numeric_text() {
        assert!(parse_expression("$1000").is_err());
        assert!(parse_expression("15%*150").is_err());
        assert!(parse_expression("ERROR+1").is_err());
        assert!(parse_expression("A1+1").is_err());
        assert!(parse_expression("abc").is_err());
    }
}
