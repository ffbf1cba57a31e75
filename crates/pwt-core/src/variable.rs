//! Custom variables: creation from formulas and removal
//!
//! Creation checks, in order: the name is valid, the name is free, the
//! formula is non-empty, the formula evaluates. The first failure wins and
//! leaves the table untouched. The whole sequence runs under the table's
//! write lock, so two concurrent creations of one name cannot both succeed.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::data::{DataError, Series};
use crate::formula::{Evaluator, FormulaError, Parser};
use crate::store::Table;

/// Reasons a custom variable cannot be created
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VariableError {
    #[error("invalid variable name '{0}': names must be non-empty and contain no spaces")]
    InvalidName(String),

    #[error("a column named '{0}' already exists")]
    NameCollision(String),

    #[error("formula is empty")]
    EmptyExpression,

    #[error("could not create variable: {source}")]
    Evaluation { source: FormulaError },

    #[error(transparent)]
    Data(#[from] DataError),
}

impl VariableError {
    /// Short machine-readable reason, used in log events
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            VariableError::InvalidName(_) => "invalid_name",
            VariableError::NameCollision(_) => "name_collision",
            VariableError::EmptyExpression => "empty_expression",
            VariableError::Evaluation { .. } => "evaluation",
            VariableError::Data(_) => "data",
        }
    }
}

fn validate_name(name: &str) -> Result<(), VariableError> {
    if name.trim().is_empty() || name.chars().any(char::is_whitespace) {
        return Err(VariableError::InvalidName(name.to_string()));
    }
    Ok(())
}

impl Table {
    /// Evaluate `expression` and append the result as custom column `name`
    ///
    /// # Errors
    /// See [`VariableError`]; on error the table and registry are unchanged
    pub fn create_variable(&self, name: &str, expression: &str) -> Result<(), VariableError> {
        let result = self.try_create_variable(name, expression);
        match &result {
            Ok(()) => info!(name, expression, "custom variable created"),
            Err(err) => debug!(name, expression, reason = err.reason(), %err, "custom variable rejected"),
        }
        result
    }

    fn try_create_variable(&self, name: &str, expression: &str) -> Result<(), VariableError> {
        validate_name(name)?;

        let mut state = self.write();
        if state.frame.has_column(name) {
            return Err(VariableError::NameCollision(name.to_string()));
        }
        if expression.trim().is_empty() {
            return Err(VariableError::EmptyExpression);
        }

        let expr = Parser::parse_formula(expression).map_err(|e| VariableError::Evaluation {
            source: FormulaError::Parse(e),
        })?;
        let partition = state.partition(self.config())?;
        let values = Evaluator::new(&state.frame, &partition)
            .evaluate(&expr)
            .map_err(|e| VariableError::Evaluation {
                source: FormulaError::Eval(e),
            })?;

        state.frame = state.frame.add_column(Series::new(name, Arc::new(values)))?;
        state.registry.register(name);
        Ok(())
    }

    /// Remove custom variables; returns the names actually removed
    ///
    /// A name is removed only when it is both a column and a registered
    /// custom variable. Anything else, including base columns, is skipped.
    pub fn remove_variables(&self, names: &[&str]) -> Vec<String> {
        let mut state = self.write();
        let removable: Vec<&str> = names
            .iter()
            .copied()
            .filter(|name| state.frame.has_column(name) && state.registry.is_custom(name))
            .fold(Vec::new(), |mut acc, name| {
                if !acc.contains(&name) {
                    acc.push(name);
                }
                acc
            });

        if !removable.is_empty() {
            match state.frame.drop(&removable) {
                Ok(frame) => {
                    state.frame = frame;
                    for name in &removable {
                        state.registry.unregister(name);
                    }
                }
                // Base columns are never registered, so some column always remains
                Err(err) => {
                    debug!(%err, "custom variable removal failed");
                    return Vec::new();
                }
            }
        }

        info!(
            requested = names.len(),
            removed = removable.len(),
            "custom variables removed"
        );
        removable.into_iter().map(ToString::to_string).collect()
    }
}
