//! Custom-variable formulas
//!
//! A formula is an arithmetic expression over column names, extended with
//! per-entity series operations:
//!
//! ```text
//! rgdpo / pop
//! (rgdpo - rgdpo.shift(1)) / rgdpo.shift(1) * 100
//! rgdpo.rolling(3).mean()
//! rgdpo / rgdpo.iloc[0] * 100
//! log(rgdpo) ** 2
//! ```

pub mod ast;
mod error;
mod eval;
mod parser;

pub use ast::{BinOp, Expr, ExprKind, Ident, UnaryOp};
pub use error::{EvalError, FormulaError, ParseError, ParseErrorKind};
pub use eval::{EvalResult, Evaluator, SeriesPartition};
pub use parser::{ParseResult, Parser, MAX_NESTING};

use arrow::array::Float64Array;

use crate::data::DataFrame;

/// Parse and evaluate a formula against a table
///
/// # Errors
/// Returns `FormulaError::Parse` for malformed input and
/// `FormulaError::Eval` when the formula cannot be computed on this table
pub fn evaluate_formula(
    source: &str,
    frame: &DataFrame,
    partition: &SeriesPartition,
) -> Result<Float64Array, FormulaError> {
    let expr = Parser::parse_formula(source)?;
    Ok(Evaluator::new(frame, partition).evaluate(&expr)?)
}
