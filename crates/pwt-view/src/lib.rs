//! PWT View - filtering, chart data and CSV export for the explorer pages
//!
//! This crate provides one view contract shared by the line, scatter and
//! connected-scatter pages:
//! - Filter options and filter selections
//! - Variable choice through display labels
//! - Chart data (traces, titles, axes)
//! - CSV export of the plotted rows
//! - The variable catalog of the custom-variables page

pub mod catalog;
pub mod chart;
pub mod error;
pub mod export;
pub mod filter;
pub mod options;

use std::path::{Path, PathBuf};

use pwt_core::data::DataFrame;
use pwt_core::Table;

pub use catalog::{CatalogEntry, VariableCatalog};
pub use chart::{AxisScale, ChartData, ChartKind, ChartPoint, ChartVariables, Trace, VariableChoice};
pub use error::{ViewError, ViewResult};
pub use export::{export_columns, export_csv, write_csv_file};
pub use filter::{FilterSelection, Selection, YearFilter, ALL};
pub use options::FilterOptions;

/// Everything the user picked on a chart page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartRequest {
    pub filters: FilterSelection,
    pub variables: ChartVariables,
    pub x_scale: AxisScale,
    pub y_scale: AxisScale,
}

/// A chart page over the shared table
///
/// Every call reads the table afresh, so custom variables created through
/// any other handle show up immediately.
#[derive(Debug, Clone)]
pub struct ChartView {
    table: Table,
    kind: ChartKind,
}

impl ChartView {
    #[must_use]
    pub fn new(table: Table, kind: ChartKind) -> Self {
        Self { table, kind }
    }

    #[must_use]
    pub fn kind(&self) -> ChartKind {
        self.kind
    }

    #[must_use]
    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Sidebar filter choices
    ///
    /// # Errors
    /// Returns error if the time column is not an integer column
    pub fn filter_options(&self) -> ViewResult<FilterOptions> {
        Ok(FilterOptions::from_frame(
            &self.table.snapshot(),
            self.table.config(),
        )?)
    }

    #[must_use]
    pub fn variable_choice(&self) -> VariableChoice {
        VariableChoice::from_table(&self.table)
    }

    /// The request shown before the user changes anything
    ///
    /// # Errors
    /// Returns `NoVariables` if nothing can be plotted
    pub fn default_request(&self) -> ViewResult<ChartRequest> {
        let options = self.filter_options()?;
        Ok(ChartRequest {
            filters: self.kind.default_filters(&options),
            variables: self.variable_choice().default_variables(self.kind)?,
            x_scale: AxisScale::Linear,
            y_scale: AxisScale::Linear,
        })
    }

    /// Rows matching the filters
    ///
    /// # Errors
    /// Returns error if a restricted dimension's column is absent
    pub fn select(&self, filters: &FilterSelection) -> ViewResult<DataFrame> {
        Ok(filters.apply(&self.table.snapshot(), self.table.config())?)
    }

    /// Chart data for a request
    ///
    /// # Errors
    /// Returns `EmptySelection` if the filters match no rows
    pub fn chart(&self, request: &ChartRequest) -> ViewResult<ChartData> {
        let rows = self.select(&request.filters)?;
        Ok(ChartData::build(
            &rows,
            self.kind,
            &request.variables,
            self.table.labels(),
            self.table.config(),
        )?
        .with_scales(request.x_scale, request.y_scale))
    }

    /// CSV bytes of the plotted rows
    ///
    /// # Errors
    /// Returns error if a column is missing or serialization fails
    pub fn export(&self, request: &ChartRequest) -> ViewResult<Vec<u8>> {
        let rows = self.select(&request.filters)?;
        export_csv(&rows, self.kind, &request.variables, self.table.config())
    }

    /// Write the export into `dir` under the page's file name
    ///
    /// # Errors
    /// Returns error if the export fails or the file cannot be written
    pub fn export_to_dir(&self, request: &ChartRequest, dir: impl AsRef<Path>) -> ViewResult<PathBuf> {
        let path = dir.as_ref().join(self.kind.file_name());
        let rows = self.select(&request.filters)?;
        write_csv_file(&path, &rows, self.kind, &request.variables, self.table.config())?;
        Ok(path)
    }
}
