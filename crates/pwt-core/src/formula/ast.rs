//! Expression AST nodes for formulas

use crate::lexer::Span;

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    /// Addition (+)
    Add,
    /// Subtraction (-)
    Sub,
    /// Multiplication (*)
    Mul,
    /// Division (/)
    Div,
    /// Exponentiation (**)
    Pow,
}

impl BinOp {
    /// Returns the precedence of the operator (higher = binds tighter)
    #[must_use]
    pub const fn precedence(self) -> u8 {
        match self {
            BinOp::Add | BinOp::Sub => 1,
            BinOp::Mul | BinOp::Div => 2,
            // Above unary minus: -2 ** 2 == -(2 ** 2)
            BinOp::Pow => 4,
        }
    }

    /// Returns true if the operator is left-associative
    #[must_use]
    pub const fn is_left_associative(self) -> bool {
        // 2 ** 3 ** 2 = 2 ** (3 ** 2)
        !matches!(self, BinOp::Pow)
    }

    /// Returns the symbol representation of the operator
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Pow => "**",
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// Negation (-)
    Neg,
    /// Identity (+)
    Pos,
}

impl UnaryOp {
    /// Binding power of the operand of a unary operator
    pub const PRECEDENCE: u8 = 3;

    /// Returns the symbol representation of the operator
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Pos => "+",
        }
    }
}

/// An identifier with its location
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    #[must_use]
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

/// An expression node with its location
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

/// The different kinds of formula expressions
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// Numeric literal
    Number(f64),

    /// Bare name: a column, or a function when used as a callee
    Name(String),

    /// Unary operation: -x
    Unary { op: UnaryOp, expr: Box<Expr> },

    /// Binary operation: a + b
    Binary {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },

    /// Attribute access: x.iloc
    Field { expr: Box<Expr>, field: Ident },

    /// Call: log(x), x.shift(1)
    Call { callee: Box<Expr>, args: Vec<Expr> },

    /// Indexing: x.iloc[0]
    Index { expr: Box<Expr>, index: Box<Expr> },
}

impl Expr {
    #[must_use]
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }
}
