//! Dataset sources
//!
//! A source yields two sections: the observation table and the variable
//! label table. Workbooks carry both as named sheets; the CSV source reads
//! them from two files; the memory source wraps data built in code.

#![allow(clippy::cast_possible_truncation)] // integral checks precede every f64 -> i64 cast

use std::path::{Path, PathBuf};

use arrow::array::Int64Array;
use arrow::datatypes::DataType;
use calamine::{open_workbook_auto, Data, Range, Reader};
use thiserror::Error;
use tracing::debug;

use crate::config::PanelConfig;
use crate::data::{read_csv, DataError, DataFrame, Series};
use crate::labels::LabelDictionary;

/// Largest magnitude at which every integer is exactly representable in f64
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

/// Errors raised while loading a dataset
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    #[error("failed to read dataset: {0}")]
    Io(String),

    #[error("failed to open workbook: {0}")]
    Workbook(String),

    #[error("dataset has no section named '{0}'")]
    MissingSection(String),

    #[error("section '{section}' is missing required column '{column}'")]
    MissingColumn { section: String, column: String },

    #[error("malformed dataset: {0}")]
    Malformed(String),
}

impl From<DataError> for LoadError {
    fn from(err: DataError) -> Self {
        match err {
            DataError::Io(message) => LoadError::Io(message),
            other => LoadError::Malformed(other.to_string()),
        }
    }
}

/// The observation table and its label dictionary
#[derive(Debug, Clone)]
pub struct LoadedDataset {
    pub frame: DataFrame,
    pub labels: LabelDictionary,
}

/// Something a dataset can be loaded from
pub trait DatasetSource {
    /// Human-readable origin, used in log events
    fn describe(&self) -> String;

    /// Read and validate both sections
    ///
    /// # Errors
    /// Returns `LoadError` if the source is unreadable or lacks the
    /// expected sections or columns
    fn load(&self, config: &PanelConfig) -> Result<LoadedDataset, LoadError>;
}

// ============================================================================
// Workbook
// ============================================================================

/// An `.xlsx`, `.xls` or `.ods` workbook with a data sheet and a label sheet
#[derive(Debug, Clone)]
pub struct WorkbookSource {
    path: PathBuf,
}

impl WorkbookSource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DatasetSource for WorkbookSource {
    fn describe(&self) -> String {
        format!("workbook {}", self.path.display())
    }

    fn load(&self, config: &PanelConfig) -> Result<LoadedDataset, LoadError> {
        let mut workbook = open_workbook_auto(&self.path).map_err(|e| match e {
            calamine::Error::Io(io) => {
                LoadError::Io(format!("failed to open '{}': {io}", self.path.display()))
            }
            other => LoadError::Workbook(other.to_string()),
        })?;

        let sheets = workbook.sheet_names();
        for sheet in [&config.data_sheet, &config.label_sheet] {
            if !sheets.iter().any(|s| s == sheet) {
                return Err(LoadError::MissingSection(sheet.clone()));
            }
        }

        let data = workbook
            .worksheet_range(&config.data_sheet)
            .map_err(|e| LoadError::Workbook(e.to_string()))?;
        let labels = workbook
            .worksheet_range(&config.label_sheet)
            .map_err(|e| LoadError::Workbook(e.to_string()))?;

        let frame = frame_from_range(&data, &config.data_sheet)?;
        let label_frame = frame_from_range(&labels, &config.label_sheet)?;
        assemble(frame, &config.data_sheet, &label_frame, &config.label_sheet, config)
    }
}

/// A cell value after blank and error cells are folded into nulls
#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl Cell {
    fn from_data(data: &Data) -> Self {
        match data {
            Data::Empty | Data::Error(_) => Cell::Null,
            Data::Int(v) => Cell::Int(*v),
            Data::Float(v) => Cell::Float(*v),
            Data::DateTime(v) => Cell::Float(v.as_f64()),
            Data::Bool(v) => Cell::Text(v.to_string()),
            Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => {
                if s.trim().is_empty() {
                    Cell::Null
                } else {
                    Cell::Text(s.clone())
                }
            }
        }
    }

    fn is_integral(&self) -> bool {
        match self {
            Cell::Null | Cell::Int(_) => true,
            Cell::Float(v) => is_integral(*v),
            Cell::Text(_) => false,
        }
    }
}

fn is_integral(value: f64) -> bool {
    value.fract() == 0.0 && value.abs() <= MAX_EXACT_INT
}

/// Build a DataFrame from a sheet whose first row is the header
///
/// Fully blank rows are skipped. Column types are inferred from the cells:
/// integers, then floats, then text.
fn frame_from_range(range: &Range<Data>, section: &str) -> Result<DataFrame, LoadError> {
    let mut rows = range.rows();
    let header = rows
        .next()
        .ok_or_else(|| LoadError::Malformed(format!("section '{section}' is empty")))?;

    let names = header
        .iter()
        .enumerate()
        .map(|(index, cell)| match Cell::from_data(cell) {
            Cell::Null => Err(LoadError::Malformed(format!(
                "section '{section}' has an empty header in column {}",
                index + 1
            ))),
            Cell::Int(v) => Ok(v.to_string()),
            Cell::Float(v) => Ok(v.to_string()),
            Cell::Text(s) => Ok(s.trim().to_string()),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut columns: Vec<Vec<Cell>> = vec![Vec::new(); names.len()];
    for row in rows {
        if row.iter().all(|c| matches!(c, Data::Empty)) {
            continue;
        }
        for (index, column) in columns.iter_mut().enumerate() {
            column.push(row.get(index).map_or(Cell::Null, Cell::from_data));
        }
    }

    let series = names
        .into_iter()
        .zip(columns)
        .map(|(name, cells)| build_series(name, cells))
        .collect();
    DataFrame::from_series(series)
        .map_err(|e| LoadError::Malformed(format!("section '{section}': {e}")))
}

fn build_series(name: String, cells: Vec<Cell>) -> Series {
    if cells.iter().all(Cell::is_integral) {
        let values = cells
            .into_iter()
            .map(|c| match c {
                Cell::Int(v) => Some(v),
                Cell::Float(v) => Some(v as i64),
                _ => None,
            })
            .collect();
        return Series::from_optional_ints(name, values);
    }

    if cells.iter().all(|c| !matches!(c, Cell::Text(_))) {
        let values = cells
            .into_iter()
            .map(|c| match c {
                Cell::Int(v) => Some(v as f64),
                Cell::Float(v) => Some(v),
                _ => None,
            })
            .collect();
        return Series::from_optional_floats(name, values);
    }

    let values = cells
        .into_iter()
        .map(|c| match c {
            Cell::Null => None,
            Cell::Int(v) => Some(v.to_string()),
            Cell::Float(v) => Some(v.to_string()),
            Cell::Text(s) => Some(s),
        })
        .collect();
    Series::from_optional_strings(name, values)
}

// ============================================================================
// CSV
// ============================================================================

/// Two CSV files: observations and variable labels
#[derive(Debug, Clone)]
pub struct CsvSource {
    data_path: PathBuf,
    labels_path: PathBuf,
}

impl CsvSource {
    #[must_use]
    pub fn new(data_path: impl Into<PathBuf>, labels_path: impl Into<PathBuf>) -> Self {
        Self {
            data_path: data_path.into(),
            labels_path: labels_path.into(),
        }
    }
}

impl DatasetSource for CsvSource {
    fn describe(&self) -> String {
        format!(
            "csv {} + {}",
            self.data_path.display(),
            self.labels_path.display()
        )
    }

    fn load(&self, config: &PanelConfig) -> Result<LoadedDataset, LoadError> {
        let frame = read_csv(&self.data_path)?;
        let label_frame = read_csv(&self.labels_path)?;
        let data_section = self.data_path.display().to_string();
        let label_section = self.labels_path.display().to_string();
        assemble(frame, &data_section, &label_frame, &label_section, config)
    }
}

// ============================================================================
// Memory
// ============================================================================

/// A dataset already held in memory
#[derive(Debug, Clone)]
pub struct MemorySource {
    frame: DataFrame,
    labels: LabelDictionary,
}

impl MemorySource {
    #[must_use]
    pub fn new(frame: DataFrame, labels: LabelDictionary) -> Self {
        Self { frame, labels }
    }
}

impl DatasetSource for MemorySource {
    fn describe(&self) -> String {
        "memory".to_string()
    }

    fn load(&self, config: &PanelConfig) -> Result<LoadedDataset, LoadError> {
        check_required(&self.frame, &config.data_sheet, config)?;
        Ok(LoadedDataset {
            frame: normalize_time(self.frame.clone(), config)?,
            labels: self.labels.clone(),
        })
    }
}

// ============================================================================
// Validation
// ============================================================================

fn assemble(
    frame: DataFrame,
    data_section: &str,
    label_frame: &DataFrame,
    label_section: &str,
    config: &PanelConfig,
) -> Result<LoadedDataset, LoadError> {
    check_required(&frame, data_section, config)?;
    let labels = labels_from_frame(label_frame, label_section, config)?;
    let frame = normalize_time(frame, config)?;
    debug!(
        rows = frame.num_rows(),
        columns = frame.num_columns(),
        labels = labels.len(),
        "dataset sections read"
    );
    Ok(LoadedDataset { frame, labels })
}

fn check_required(frame: &DataFrame, section: &str, config: &PanelConfig) -> Result<(), LoadError> {
    for column in &config.required_columns {
        if !frame.has_column(column) {
            return Err(LoadError::MissingColumn {
                section: section.to_string(),
                column: column.clone(),
            });
        }
    }
    Ok(())
}

/// Build the label dictionary, skipping rows with an empty variable or label
fn labels_from_frame(
    frame: &DataFrame,
    section: &str,
    config: &PanelConfig,
) -> Result<LabelDictionary, LoadError> {
    let mut columns = Vec::with_capacity(2);
    for name in [&config.label_variable_column, &config.label_text_column] {
        let series = frame.column(name).map_err(|_| LoadError::MissingColumn {
            section: section.to_string(),
            column: name.clone(),
        })?;
        columns.push(series.to_string_values()?);
    }
    let labels = columns.pop().unwrap_or_default();
    let variables = columns.pop().unwrap_or_default();

    Ok(LabelDictionary::from_pairs(
        variables
            .into_iter()
            .zip(labels)
            .filter_map(|(variable, label)| match (variable, label) {
                (Some(v), Some(l)) if !v.trim().is_empty() && !l.trim().is_empty() => {
                    Some((v.trim().to_string(), l.trim().to_string()))
                }
                _ => None,
            }),
    ))
}

/// Store the time column as Int64, rejecting fractional or textual years
fn normalize_time(frame: DataFrame, config: &PanelConfig) -> Result<DataFrame, LoadError> {
    let time = config.time_column.as_str();
    if !frame.has_column(time) {
        return Ok(frame);
    }
    let series = frame.column(time)?;
    if series.data_type() == &DataType::Int64 {
        return Ok(frame);
    }

    let years: Int64Array = if series.data_type().is_integer() {
        series.to_int64()?
    } else if series.is_numeric() {
        let floats = series.to_float64()?;
        floats
            .iter()
            .map(|v| match v {
                Some(v) if is_integral(v) => Ok(Some(v as i64)),
                Some(v) => Err(LoadError::Malformed(format!(
                    "time column '{time}' has non-integer value {v}"
                ))),
                None => Ok(None),
            })
            .collect::<Result<Int64Array, _>>()?
    } else {
        return Err(LoadError::Malformed(format!(
            "time column '{time}' must be numeric, found {}",
            series.data_type()
        )));
    };

    let replaced = Series::new(time, std::sync::Arc::new(years));
    let columns = frame
        .iter_columns()
        .map(|column| column.map(|s| if s.name() == time { replaced.clone() } else { s }))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(DataFrame::from_series(columns)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn sheet(cells: &[&[Data]]) -> Range<Data> {
        let rows = u32::try_from(cells.len()).unwrap();
        let cols = u32::try_from(cells[0].len()).unwrap();
        let mut range = Range::new((0, 0), (rows - 1, cols - 1));
        for (r, row) in cells.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                range.set_value((r as u32, c as u32), value.clone());
            }
        }
        range
    }

    fn text(s: &str) -> Data {
        Data::String(s.to_string())
    }

    #[test]
    fn sheet_types_are_inferred() {
        let range = sheet(&[
            &[text("country"), text("year"), text("pop"), text("note")],
            &[text("India"), Data::Float(2019.0), Data::Float(1366.4), Data::Int(1)],
            &[Data::Empty, Data::Empty, Data::Empty, Data::Empty],
            &[text("Pakistan"), Data::Float(2019.0), Data::Empty, text("n/a")],
        ]);
        let frame = frame_from_range(&range, "Sheet1").unwrap();

        assert_eq!(frame.num_rows(), 2);
        assert_eq!(frame.column("country").unwrap().data_type(), &DataType::Utf8);
        assert_eq!(frame.column("year").unwrap().data_type(), &DataType::Int64);
        assert_eq!(frame.column("pop").unwrap().data_type(), &DataType::Float64);
        assert!(frame.column("pop").unwrap().is_null(1));
        assert_eq!(
            frame.column("note").unwrap().to_string_values().unwrap(),
            vec![Some("1".to_string()), Some("n/a".to_string())]
        );
    }

    #[test]
    fn sheet_header_must_be_complete() {
        let range = sheet(&[&[text("country"), Data::Empty], &[text("India"), Data::Int(1)]]);
        assert!(matches!(
            frame_from_range(&range, "Sheet1"),
            Err(LoadError::Malformed(_))
        ));
    }

    #[test]
    fn label_rows_with_blanks_are_skipped() {
        let range = sheet(&[
            &[text("variable"), text("label")],
            &[text("pop"), text("Population")],
            &[text("emp"), Data::Empty],
            &[Data::Empty, text("Orphan")],
        ]);
        let frame = frame_from_range(&range, "VariableInfo").unwrap();
        let labels = labels_from_frame(&frame, "VariableInfo", &PanelConfig::default()).unwrap();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels.get("pop"), Some("Population"));
    }

    #[test]
    fn label_section_requires_columns() {
        let frame =
            DataFrame::from_series(vec![Series::from_strings("variable", vec!["pop"])]).unwrap();
        let err = labels_from_frame(&frame, "VariableInfo", &PanelConfig::default()).unwrap_err();
        assert_eq!(
            err,
            LoadError::MissingColumn {
                section: "VariableInfo".to_string(),
                column: "label".to_string()
            }
        );
    }

    #[test]
    fn csv_source_loads_both_sections() {
        let dir = tempdir().unwrap();
        let data = dir.path().join("data.csv");
        let labels = dir.path().join("labels.csv");
        fs::write(
            &data,
            "country,region,incgroup,year,pop\nIndia,South Asia,Lower middle,2019,1366.4\n",
        )
        .unwrap();
        fs::write(&labels, "variable,label\npop,Population\n").unwrap();

        let loaded = CsvSource::new(&data, &labels)
            .load(&PanelConfig::default())
            .unwrap();
        assert_eq!(loaded.frame.num_rows(), 1);
        assert_eq!(
            loaded.frame.column("year").unwrap().data_type(),
            &DataType::Int64
        );
        assert_eq!(loaded.labels.label_for("pop"), "Population");
    }

    #[test]
    fn csv_source_reports_missing_columns_and_files() {
        let dir = tempdir().unwrap();
        let data = dir.path().join("data.csv");
        let labels = dir.path().join("labels.csv");
        fs::write(&data, "country,year\nIndia,2019\n").unwrap();
        fs::write(&labels, "variable,label\npop,Population\n").unwrap();

        let err = CsvSource::new(&data, &labels)
            .load(&PanelConfig::default())
            .unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn { ref column, .. } if column == "region"));

        let err = CsvSource::new(dir.path().join("absent.csv"), &labels)
            .load(&PanelConfig::default())
            .unwrap_err();
        assert!(matches!(err, LoadError::Io(_)));
    }

    #[test]
    fn fractional_years_are_rejected() {
        let frame = DataFrame::from_series(vec![
            Series::from_strings("country", vec!["India"]),
            Series::from_strings("region", vec!["South Asia"]),
            Series::from_strings("incgroup", vec!["Lower middle"]),
            Series::from_floats("year", vec![2019.5]),
        ])
        .unwrap();
        let err = MemorySource::new(frame, LabelDictionary::new())
            .load(&PanelConfig::default())
            .unwrap_err();
        assert!(matches!(err, LoadError::Malformed(_)));
    }

    #[test]
    fn missing_workbook_is_an_error() {
        let dir = tempdir().unwrap();
        let err = WorkbookSource::new(dir.path().join("gdppaneldata.xlsx"))
            .load(&PanelConfig::default())
            .unwrap_err();
        assert!(matches!(err, LoadError::Io(_) | LoadError::Workbook(_)));
    }
}
