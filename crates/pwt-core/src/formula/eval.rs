//! Vectorised formula evaluation over a DataFrame
//!
//! Every column is read as Float64. Missing values are Arrow nulls and
//! propagate through arithmetic; IEEE results of division (inf, NaN) are
//! ordinary values. Series operations (`shift`, `rolling`, `iloc`, ...)
//! run independently inside each entity series of a [`SeriesPartition`].

use std::cmp::Ordering;
use std::collections::HashMap;

use arrow::array::{Array, ArrayRef, Datum, Float64Array, Scalar};
use arrow::compute::kernels::{arity, numeric};
use arrow::datatypes::Float64Type;

use super::ast::{BinOp, Expr, ExprKind, UnaryOp};
use super::error::EvalError;
use crate::data::{DataError, DataFrame, DataResult};

/// Result type for evaluation
pub type EvalResult<T> = Result<T, EvalError>;

/// Row indices of each entity series, ordered by time within the series
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesPartition {
    groups: Vec<Vec<usize>>,
    num_rows: usize,
}

impl SeriesPartition {
    /// Treat the whole table as one series in row order
    #[must_use]
    pub fn whole(num_rows: usize) -> Self {
        Self {
            groups: vec![(0..num_rows).collect()],
            num_rows,
        }
    }

    /// Group rows by the entity column and order each group by the time column
    ///
    /// Missing columns fall back to a single group and to row order
    /// respectively. Groups are listed in order of first appearance; sorting
    /// is stable and puts missing times last.
    ///
    /// # Errors
    /// Returns error if the time column exists but is not numeric
    pub fn from_frame(
        frame: &DataFrame,
        entity_column: Option<&str>,
        time_column: Option<&str>,
    ) -> DataResult<Self> {
        let num_rows = frame.num_rows();

        let mut groups = match entity_column.filter(|name| frame.has_column(name)) {
            Some(name) => {
                let keys = frame.column(name)?.to_string_values()?;
                let mut slots: HashMap<Option<String>, usize> = HashMap::new();
                let mut groups: Vec<Vec<usize>> = Vec::new();
                for (row, key) in keys.into_iter().enumerate() {
                    let slot = *slots.entry(key).or_insert_with(|| {
                        groups.push(Vec::new());
                        groups.len() - 1
                    });
                    groups[slot].push(row);
                }
                groups
            }
            None => vec![(0..num_rows).collect()],
        };

        if let Some(name) = time_column.filter(|name| frame.has_column(name)) {
            let times = frame.column(name)?.to_float64()?;
            for group in &mut groups {
                group.sort_by(|&a, &b| compare_times(&times, a, b));
            }
        }

        Ok(Self { groups, num_rows })
    }

    /// Number of rows covered by the partition
    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// Row indices per entity series
    #[must_use]
    pub fn groups(&self) -> &[Vec<usize>] {
        &self.groups
    }
}

fn compare_times(times: &Float64Array, a: usize, b: usize) -> Ordering {
    match (times.is_valid(a), times.is_valid(b)) {
        (true, true) => times.value(a).total_cmp(&times.value(b)),
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => Ordering::Equal,
    }
}

/// Aggregation applied to a rolling window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WindowAgg {
    Mean,
    Sum,
}

/// Intermediate evaluation value
#[derive(Debug, Clone)]
enum Operand {
    Scalar(f64),
    Column(Float64Array),
    /// `x.rolling(n)` awaiting an aggregate
    Window { values: Float64Array, size: usize },
}

/// Evaluates parsed formulas against one table
pub struct Evaluator<'a> {
    frame: &'a DataFrame,
    partition: &'a SeriesPartition,
}

impl<'a> Evaluator<'a> {
    /// Create an evaluator over a table and its entity partition
    #[must_use]
    pub fn new(frame: &'a DataFrame, partition: &'a SeriesPartition) -> Self {
        Self { frame, partition }
    }

    /// Evaluate to a Float64 column with one value per table row
    ///
    /// Scalar-only formulas are broadcast to every row.
    ///
    /// # Errors
    /// Returns error for unknown names, non-numeric columns, unsupported
    /// methods or invalid arguments
    pub fn evaluate(&self, expr: &Expr) -> EvalResult<Float64Array> {
        match self.eval(expr)? {
            Operand::Scalar(value) => Ok(self.broadcast(value)),
            Operand::Column(values) => Ok(values),
            Operand::Window { .. } => Err(EvalError::UnaggregatedWindow),
        }
    }

    fn eval(&self, expr: &Expr) -> EvalResult<Operand> {
        match &expr.kind {
            ExprKind::Number(value) => Ok(Operand::Scalar(*value)),
            ExprKind::Name(name) => self.column(name).map(Operand::Column),
            ExprKind::Unary { op, expr } => {
                let operand = self.eval(expr)?;
                match op {
                    UnaryOp::Pos => match operand {
                        Operand::Scalar(value) => Ok(Operand::Scalar(value)),
                        other => self.numeric(other).map(Operand::Column),
                    },
                    UnaryOp::Neg => match operand {
                        Operand::Scalar(value) => Ok(Operand::Scalar(-value)),
                        other => {
                            let values = self.numeric(other)?;
                            Ok(Operand::Column(values.unary::<_, Float64Type>(|x| -x)))
                        }
                    },
                }
            }
            ExprKind::Binary { left, op, right } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                self.binary(*op, left, right)
            }
            ExprKind::Call { callee, args } => self.call(callee, args),
            ExprKind::Index { expr, index } => self.index(expr, index),
            ExprKind::Field { field, .. } => {
                Err(EvalError::UnsupportedAttribute(field.name.clone()))
            }
        }
    }

    fn column(&self, name: &str) -> EvalResult<Float64Array> {
        let series = self.frame.column(name).map_err(|e| match e {
            DataError::ColumnNotFound(_) => EvalError::UnknownColumn(name.to_string()),
            other => EvalError::Data(other),
        })?;
        if !series.is_numeric() {
            return Err(EvalError::NonNumericColumn {
                column: name.to_string(),
                found: series.data_type().to_string(),
            });
        }
        Ok(series.to_float64()?)
    }

    fn broadcast(&self, value: f64) -> Float64Array {
        Float64Array::from(vec![value; self.partition.num_rows()])
    }

    /// Coerce an operand to a column, broadcasting scalars
    fn numeric(&self, operand: Operand) -> EvalResult<Float64Array> {
        match operand {
            Operand::Scalar(value) => Ok(self.broadcast(value)),
            Operand::Column(values) => Ok(values),
            Operand::Window { .. } => Err(EvalError::UnaggregatedWindow),
        }
    }

    fn binary(&self, op: BinOp, left: Operand, right: Operand) -> EvalResult<Operand> {
        match (left, right) {
            (Operand::Scalar(a), Operand::Scalar(b)) => Ok(Operand::Scalar(apply_scalar(op, a, b))),
            (Operand::Column(a), Operand::Scalar(b)) => {
                let values = match op {
                    BinOp::Pow => a.unary::<_, Float64Type>(|x| x.powf(b)),
                    _ => kernel(op, &a, &Scalar::new(Float64Array::from(vec![b])))?,
                };
                Ok(Operand::Column(values))
            }
            (Operand::Scalar(a), Operand::Column(b)) => {
                let values = match op {
                    BinOp::Pow => b.unary::<_, Float64Type>(|x| a.powf(x)),
                    _ => kernel(op, &Scalar::new(Float64Array::from(vec![a])), &b)?,
                };
                Ok(Operand::Column(values))
            }
            (Operand::Column(a), Operand::Column(b)) => {
                let values = match op {
                    BinOp::Pow => arity::binary::<_, _, _, Float64Type>(&a, &b, f64::powf)?,
                    _ => kernel(op, &a, &b)?,
                };
                Ok(Operand::Column(values))
            }
            _ => Err(EvalError::UnaggregatedWindow),
        }
    }

    fn call(&self, callee: &Expr, args: &[Expr]) -> EvalResult<Operand> {
        match &callee.kind {
            ExprKind::Name(function) => self.function(function, args),
            ExprKind::Field { expr, field } => self.method(expr, &field.name, args),
            _ => Err(EvalError::BadArgument {
                function: "call".to_string(),
                message: "only functions and methods can be called".to_string(),
            }),
        }
    }

    fn function(&self, name: &str, args: &[Expr]) -> EvalResult<Operand> {
        let op: fn(f64) -> f64 = match name {
            "log" => f64::ln,
            "log10" => f64::log10,
            "exp" => f64::exp,
            "sqrt" => f64::sqrt,
            "abs" => f64::abs,
            _ => return Err(EvalError::UnknownFunction(name.to_string())),
        };
        let [arg] = args else {
            return Err(EvalError::BadArgument {
                function: format!("{name}()"),
                message: format!("expected 1 argument, got {}", args.len()),
            });
        };
        match self.eval(arg)? {
            Operand::Scalar(value) => Ok(Operand::Scalar(op(value))),
            other => {
                let values = self.numeric(other)?;
                Ok(Operand::Column(values.unary::<_, Float64Type>(op)))
            }
        }
    }

    fn method(&self, receiver: &Expr, name: &str, args: &[Expr]) -> EvalResult<Operand> {
        let receiver = self.eval(receiver)?;
        match name {
            "shift" => {
                let periods = self.optional_int_arg(name, args, 1)?;
                let values = self.numeric(receiver)?;
                Ok(Operand::Column(self.shift(&values, periods)))
            }
            "diff" => {
                let periods = self.optional_int_arg(name, args, 1)?;
                let values = self.numeric(receiver)?;
                let lagged = self.shift(&values, periods);
                Ok(Operand::Column(kernel(BinOp::Sub, &values, &lagged)?))
            }
            "pct_change" => {
                let periods = self.optional_int_arg(name, args, 1)?;
                let values = self.numeric(receiver)?;
                let lagged = self.shift(&values, periods);
                let ratio = kernel(BinOp::Div, &values, &lagged)?;
                Ok(Operand::Column(ratio.unary::<_, Float64Type>(|x| x - 1.0)))
            }
            "rolling" => {
                let size = self.required_int_arg(name, args)?;
                let size = usize::try_from(size).ok().filter(|s| *s >= 1).ok_or_else(|| {
                    EvalError::BadArgument {
                        function: "rolling()".to_string(),
                        message: format!("window must be at least 1, got {size}"),
                    }
                })?;
                let values = self.numeric(receiver)?;
                Ok(Operand::Window { values, size })
            }
            "mean" | "sum" => {
                let agg = if name == "mean" {
                    WindowAgg::Mean
                } else {
                    WindowAgg::Sum
                };
                if !args.is_empty() {
                    return Err(EvalError::BadArgument {
                        function: format!("{name}()"),
                        message: "takes no arguments".to_string(),
                    });
                }
                match receiver {
                    Operand::Window { values, size } => {
                        Ok(Operand::Column(self.rolling(&values, size, agg)))
                    }
                    _ => Err(EvalError::UnknownMethod(name.to_string())),
                }
            }
            other => Err(EvalError::UnknownMethod(other.to_string())),
        }
    }

    fn index(&self, expr: &Expr, index: &Expr) -> EvalResult<Operand> {
        let ExprKind::Field { expr: receiver, field } = &expr.kind else {
            return Err(EvalError::BadArgument {
                function: "[]".to_string(),
                message: "use .iloc[k] for positional access".to_string(),
            });
        };
        if field.name != "iloc" {
            return Err(EvalError::UnsupportedAttribute(field.name.clone()));
        }
        let position = self.int_value("iloc[]", index)?;
        let values = self.eval(receiver)?;
        let values = self.numeric(values)?;
        Ok(Operand::Column(self.positional(&values, position)))
    }

    // ==================== Arguments ====================

    fn int_value(&self, function: &str, arg: &Expr) -> EvalResult<i64> {
        match self.eval(arg)? {
            #[allow(clippy::cast_possible_truncation)]
            Operand::Scalar(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
                Ok(value as i64)
            }
            Operand::Scalar(value) => Err(EvalError::BadArgument {
                function: function.to_string(),
                message: format!("expected an integer, got {value}"),
            }),
            _ => Err(EvalError::BadArgument {
                function: function.to_string(),
                message: "expected an integer constant, got a column".to_string(),
            }),
        }
    }

    fn optional_int_arg(&self, name: &str, args: &[Expr], default: i64) -> EvalResult<i64> {
        match args {
            [] => Ok(default),
            [arg] => self.int_value(&format!("{name}()"), arg),
            _ => Err(EvalError::BadArgument {
                function: format!("{name}()"),
                message: format!("expected at most 1 argument, got {}", args.len()),
            }),
        }
    }

    fn required_int_arg(&self, name: &str, args: &[Expr]) -> EvalResult<i64> {
        match args {
            [arg] => self.int_value(&format!("{name}()"), arg),
            _ => Err(EvalError::BadArgument {
                function: format!("{name}()"),
                message: format!("expected 1 argument, got {}", args.len()),
            }),
        }
    }

    // ==================== Series operations ====================

    /// Lag (positive periods) or lead (negative periods) within each series
    fn shift(&self, values: &Float64Array, periods: i64) -> Float64Array {
        let mut out = vec![None; values.len()];
        for group in self.partition.groups() {
            for (pos, &row) in group.iter().enumerate() {
                let source = i64::try_from(pos)
                    .ok()
                    .and_then(|p| p.checked_sub(periods))
                    .and_then(|p| usize::try_from(p).ok())
                    .and_then(|p| group.get(p));
                if let Some(&src) = source {
                    if values.is_valid(src) {
                        out[row] = Some(values.value(src));
                    }
                }
            }
        }
        Float64Array::from(out)
    }

    /// Trailing window aggregate; missing until the window is full
    fn rolling(&self, values: &Float64Array, size: usize, agg: WindowAgg) -> Float64Array {
        let mut out = vec![None; values.len()];
        for group in self.partition.groups() {
            for (pos, &row) in group.iter().enumerate() {
                if pos + 1 < size {
                    continue;
                }
                let window = &group[pos + 1 - size..=pos];
                if window.iter().any(|&r| values.is_null(r)) {
                    continue;
                }
                let sum: f64 = window.iter().map(|&r| values.value(r)).sum();
                out[row] = Some(match agg {
                    WindowAgg::Sum => sum,
                    WindowAgg::Mean => sum / size as f64,
                });
            }
        }
        Float64Array::from(out)
    }

    /// Value at `position` of each series broadcast to the series' rows
    fn positional(&self, values: &Float64Array, position: i64) -> Float64Array {
        let mut out = vec![None; values.len()];
        for group in self.partition.groups() {
            let index = if position >= 0 {
                usize::try_from(position).ok()
            } else {
                usize::try_from(position.unsigned_abs())
                    .ok()
                    .and_then(|back| group.len().checked_sub(back))
            };
            let value = index
                .and_then(|i| group.get(i))
                .filter(|&&r| values.is_valid(r))
                .map(|&r| values.value(r));
            for &row in group {
                out[row] = value;
            }
        }
        Float64Array::from(out)
    }
}

fn apply_scalar(op: BinOp, a: f64, b: f64) -> f64 {
    match op {
        BinOp::Add => a + b,
        BinOp::Sub => a - b,
        BinOp::Mul => a * b,
        BinOp::Div => a / b,
        BinOp::Pow => a.powf(b),
    }
}

/// Run an Arrow arithmetic kernel and downcast the Float64 result
fn kernel(
    op: BinOp,
    left: &dyn Datum,
    right: &dyn Datum,
) -> EvalResult<Float64Array> {
    let result: ArrayRef = match op {
        BinOp::Add => numeric::add(left, right)?,
        BinOp::Sub => numeric::sub(left, right)?,
        BinOp::Mul => numeric::mul(left, right)?,
        BinOp::Div => numeric::div(left, right)?,
        BinOp::Pow => {
            return Err(EvalError::BadArgument {
                function: "**".to_string(),
                message: "power is not an arithmetic kernel".to_string(),
            })
        }
    };
    downcast_f64(&result)
}

fn downcast_f64(array: &ArrayRef) -> EvalResult<Float64Array> {
    array
        .as_any()
        .downcast_ref::<Float64Array>()
        .cloned()
        .ok_or_else(|| {
            EvalError::Data(DataError::TypeMismatch {
                expected: "Float64".to_string(),
                found: array.data_type().to_string(),
            })
        })
}
