//! Error types for formula parsing and evaluation

use thiserror::Error;

use crate::data::DataError;
use crate::lexer::{Span, TokenKind};

/// A parser error with location information
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    /// The kind of error
    pub kind: ParseErrorKind,
    /// Location in the formula where the error occurred
    pub span: Span,
    /// Optional hint for fixing the error
    pub hint: Option<String>,
}

impl ParseError {
    /// Create a new parse error
    #[must_use]
    pub fn new(kind: ParseErrorKind, span: Span) -> Self {
        Self {
            kind,
            span,
            hint: None,
        }
    }

    /// Add a hint to this error
    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at {}", self.kind, self.span)?;
        if let Some(hint) = &self.hint {
            write!(f, " (hint: {hint})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

/// The kind of parse error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseErrorKind {
    #[error("unexpected token: found {found}, expected {expected}")]
    UnexpectedToken { found: TokenKind, expected: String },

    #[error("unexpected character '{0}'")]
    UnexpectedCharacter(String),

    #[error("expected expression")]
    ExpectedExpression,

    #[error("expected identifier")]
    ExpectedIdentifier,

    #[error("invalid number literal: {0}")]
    InvalidNumber(String),

    #[error("formula is nested more than {0} levels deep")]
    TooDeeplyNested(u32),
}

/// Errors raised while evaluating a parsed formula against a table
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("name '{0}' is not defined")]
    UnknownColumn(String),

    #[error("column '{column}' is not numeric ({found})")]
    NonNumericColumn { column: String, found: String },

    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    #[error("unsupported method '.{0}()'")]
    UnknownMethod(String),

    #[error("unsupported attribute '.{0}'")]
    UnsupportedAttribute(String),

    #[error("invalid argument for {function}: {message}")]
    BadArgument { function: String, message: String },

    #[error("rolling window must be aggregated, e.g. .rolling(3).mean()")]
    UnaggregatedWindow,

    #[error("{0}")]
    Data(#[from] DataError),
}

impl From<arrow::error::ArrowError> for EvalError {
    fn from(err: arrow::error::ArrowError) -> Self {
        EvalError::Data(DataError::from(err))
    }
}

/// Any failure turning a formula string into a column
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormulaError {
    #[error("syntax error: {0}")]
    Parse(#[from] ParseError),

    #[error("{0}")]
    Eval(#[from] EvalError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_display_includes_span_and_hint() {
        let err = ParseError::new(ParseErrorKind::ExpectedExpression, Span::new(3, 4))
            .with_hint("formulas cannot end with an operator");
        assert_eq!(
            err.to_string(),
            "expected expression at 3..4 (hint: formulas cannot end with an operator)"
        );
    }

    #[test]
    fn eval_error_display() {
        let err = EvalError::UnknownColumn("gdp".to_string());
        assert_eq!(err.to_string(), "name 'gdp' is not defined");

        let err = FormulaError::from(err);
        assert_eq!(err.to_string(), "name 'gdp' is not defined");
    }
}
