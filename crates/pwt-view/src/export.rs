//! CSV export of the plotted rows

use std::path::Path;

use pwt_core::data::{to_csv_bytes, DataFrame};
use pwt_core::PanelConfig;
use tracing::info;

use crate::chart::{complete_rows, ChartKind, ChartVariables};
use crate::error::ViewResult;

/// Columns written for a chart: country, (region,) year, then the variables
#[must_use]
pub fn export_columns(
    kind: ChartKind,
    variables: &ChartVariables,
    config: &PanelConfig,
) -> Vec<String> {
    let mut columns = vec![config.entity_column.clone()];
    if kind == ChartKind::Scatter {
        columns.push(config.region_column.clone());
    }
    columns.push(config.time_column.clone());
    for variable in selected_variables(kind, variables) {
        if !columns.iter().any(|c| c == variable) {
            columns.push(variable.to_string());
        }
    }
    columns
}

fn selected_variables(kind: ChartKind, variables: &ChartVariables) -> Vec<&str> {
    if kind.has_x_variable() {
        vec![variables.x.as_str(), variables.y.as_str()]
    } else {
        vec![variables.y.as_str()]
    }
}

/// Serialize the filtered rows of a chart as UTF-8 CSV with a header row
///
/// Rows missing a selected variable are left out. No index column is
/// written.
///
/// # Errors
/// Returns error if a column is missing or serialization fails
pub fn export_csv(
    frame: &DataFrame,
    kind: ChartKind,
    variables: &ChartVariables,
    config: &PanelConfig,
) -> ViewResult<Vec<u8>> {
    let columns = export_columns(kind, variables, config);
    let names: Vec<&str> = columns.iter().map(String::as_str).collect();
    let selected = frame.select(&names)?;
    let rows = complete_rows(&selected, &selected_variables(kind, variables))?;

    let bytes = to_csv_bytes(&rows)?;
    info!(
        file = kind.file_name(),
        rows = rows.num_rows(),
        columns = rows.num_columns(),
        "chart data exported"
    );
    Ok(bytes)
}

/// Write the export of [`export_csv`] to `path`
///
/// # Errors
/// Returns error if the export fails or the file cannot be written
pub fn write_csv_file(
    path: impl AsRef<Path>,
    frame: &DataFrame,
    kind: ChartKind,
    variables: &ChartVariables,
    config: &PanelConfig,
) -> ViewResult<()> {
    let bytes = export_csv(frame, kind, variables, config)?;
    std::fs::write(path, bytes)?;
    Ok(())
}
