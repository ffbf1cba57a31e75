//! Choices offered by the filter sidebar

use std::collections::BTreeSet;

use pwt_core::data::{DataFrame, DataResult};
use pwt_core::PanelConfig;

/// Distinct values of each filter dimension
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterOptions {
    /// Sorted
    pub countries: Vec<String>,
    /// First-appearance order
    pub regions: Vec<String>,
    /// First-appearance order
    pub income_groups: Vec<String>,
    /// Sorted
    pub years: Vec<i64>,
}

impl FilterOptions {
    /// Collect the options from a table; absent columns give no options
    ///
    /// # Errors
    /// Returns error if the time column is not an integer column
    pub fn from_frame(frame: &DataFrame, config: &PanelConfig) -> DataResult<Self> {
        let mut countries = distinct(frame, &config.entity_column)?;
        countries.sort();

        let years = if frame.has_column(&config.time_column) {
            let values = frame.column(&config.time_column)?.to_int64()?;
            values.iter().flatten().collect::<BTreeSet<_>>().into_iter().collect()
        } else {
            Vec::new()
        };

        Ok(Self {
            countries,
            regions: distinct(frame, &config.region_column)?,
            income_groups: distinct(frame, &config.income_group_column)?,
            years,
        })
    }

    #[must_use]
    pub fn min_year(&self) -> Option<i64> {
        self.years.first().copied()
    }

    #[must_use]
    pub fn max_year(&self) -> Option<i64> {
        self.years.last().copied()
    }
}

/// Non-null values of a column in first-appearance order
fn distinct(frame: &DataFrame, column: &str) -> DataResult<Vec<String>> {
    if !frame.has_column(column) {
        return Ok(Vec::new());
    }
    let mut seen = BTreeSet::new();
    Ok(frame
        .column(column)?
        .to_string_values()?
        .into_iter()
        .flatten()
        .filter(|v| seen.insert(v.clone()))
        .collect())
}
