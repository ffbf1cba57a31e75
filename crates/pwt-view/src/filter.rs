//! Row filters
//!
//! A `FilterSelection` is a conjunction of membership tests on the entity,
//! region, income-group and time columns. Each dimension is either
//! unrestricted or limited to a set of values.

use arrow::array::BooleanArray;
use pwt_core::data::{DataFrame, DataResult};
use pwt_core::PanelConfig;

/// Choice that stands for every option in a multiselect
pub const ALL: &str = "All";

/// Membership filter on one dimension
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection<T> {
    /// No restriction
    All,
    /// Only these values; an empty list means no restriction
    Only(Vec<T>),
}

impl<T> Default for Selection<T> {
    fn default() -> Self {
        Selection::All
    }
}

impl Selection<String> {
    /// True if the filter does not restrict anything
    ///
    /// An empty list, or one holding the [`ALL`] entry, restricts nothing.
    #[must_use]
    pub fn is_all(&self) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(values) => values.is_empty() || values.iter().any(|v| v == ALL),
        }
    }

    /// True if `value` passes the filter
    #[must_use]
    pub fn contains(&self, value: &str) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(values) => self.is_all() || values.iter().any(|v| v == value),
        }
    }

    /// Interpret raw multiselect choices
    ///
    /// Nothing selected, or the [`ALL`] entry selected, means no restriction.
    pub fn from_choices<I, S>(choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<String> = choices.into_iter().map(Into::into).collect();
        if values.is_empty() || values.iter().any(|v| v == ALL) {
            Selection::All
        } else {
            Selection::Only(values)
        }
    }

    /// Restrict to the given values
    pub fn only<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Selection::Only(values.into_iter().map(Into::into).collect())
    }
}

/// Filter on the time column
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum YearFilter {
    #[default]
    All,
    /// Inclusive range
    Range { start: i64, end: i64 },
    /// Only these years; an empty list means no restriction
    Only(Vec<i64>),
}

impl YearFilter {
    #[must_use]
    pub fn is_all(&self) -> bool {
        match self {
            YearFilter::All => true,
            YearFilter::Range { .. } => false,
            YearFilter::Only(years) => years.is_empty(),
        }
    }

    #[must_use]
    pub fn contains(&self, year: i64) -> bool {
        match self {
            YearFilter::All => true,
            YearFilter::Range { start, end } => (*start..=*end).contains(&year),
            YearFilter::Only(years) => years.is_empty() || years.contains(&year),
        }
    }
}

/// Filters of one view, recomputed on every render
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterSelection {
    pub countries: Selection<String>,
    pub regions: Selection<String>,
    pub income_groups: Selection<String>,
    pub years: YearFilter,
}

impl FilterSelection {
    /// Keep the rows that pass every filter, in their original order
    ///
    /// Unrestricted dimensions do not need their column to exist. Rows with
    /// a missing value in a restricted dimension are dropped.
    ///
    /// # Errors
    /// Returns error if a restricted dimension's column is absent
    pub fn apply(&self, frame: &DataFrame, config: &PanelConfig) -> DataResult<DataFrame> {
        let rows = frame.num_rows();
        let mut keep = vec![true; rows];

        let text_filters = [
            (&self.countries, config.entity_column.as_str()),
            (&self.regions, config.region_column.as_str()),
            (&self.income_groups, config.income_group_column.as_str()),
        ];
        for (selection, column) in text_filters {
            if selection.is_all() {
                continue;
            }
            let values = frame.column(column)?.to_string_values()?;
            for (row, value) in values.into_iter().enumerate() {
                keep[row] &= value.is_some_and(|v| selection.contains(&v));
            }
        }

        if !self.years.is_all() {
            let years = frame.column(&config.time_column)?.to_int64()?;
            for (row, year) in years.iter().enumerate() {
                keep[row] &= year.is_some_and(|y| self.years.contains(y));
            }
        }

        if keep.iter().all(|k| *k) {
            return Ok(frame.clone());
        }
        frame.filter(&BooleanArray::from(keep))
    }
}
