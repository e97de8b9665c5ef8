//! Arithmetic expression AST

/// Arithmetic expression AST
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Numeric literal
    Number(f64),
    /// Unary operation
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Expr>,
    },
    /// Binary operation
    BinaryOp {
        op: BinaryOperator,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Negate,
}

impl Expr {
    /// Evaluate the expression with IEEE-754 semantics.
    ///
    /// Division by zero produces an infinity or NaN rather than an error;
    /// callers decide whether a non-finite result is acceptable.
    pub fn eval(&self) -> f64 {
        match self {
            Expr::Number(n) => *n,
            Expr::UnaryOp {
                op: UnaryOperator::Negate,
                operand,
            } => -operand.eval(),
            Expr::BinaryOp { op, left, right } => {
                let (l, r) = (left.eval(), right.eval());
                match op {
                    BinaryOperator::Add => l + r,
                    BinaryOperator::Subtract => l - r,
                    BinaryOperator::Multiply => l * r,
                    BinaryOperator::Divide => l / r,
                }
            }
        }
    }
}
