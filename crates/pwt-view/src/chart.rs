//! Chart data preparation
//!
//! The three chart pages differ only in their defaults, in how rows are
//! grouped into traces and in their titles. Everything else goes through
//! one code path parameterised by [`ChartKind`].

use std::collections::HashMap;

use arrow::array::{Array, Float64Array};
use pwt_core::data::{DataError, DataFrame, DataResult};
use pwt_core::{LabelDictionary, LabelResolver, PanelConfig, Table, UnknownLabelError};

use crate::error::{ViewError, ViewResult};
use crate::filter::{FilterSelection, Selection, YearFilter};
use crate::options::FilterOptions;

/// Countries preselected on the time-series pages
pub const DEFAULT_COUNTRIES: [&str; 3] = ["Pakistan", "India", "Bangladesh"];

/// Preferred x axis of two-variable charts
pub const DEFAULT_X: &str = "pop";
/// Preferred y axis of two-variable charts
pub const DEFAULT_Y: &str = "emp";

const SOURCE_NOTE: &str = "SOURCE: Penn World Table, Version 11";

/// The chart pages of the explorer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartKind {
    /// One variable over time, one line per country
    Line,
    /// Two variables, one marker per row, coloured by region
    Scatter,
    /// Two variables, one path per country labelled by year
    ConnectedScatter,
}

impl ChartKind {
    /// Suggested name of the exported CSV file
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            ChartKind::Line => "pwt_lineplot_data.csv",
            ChartKind::Scatter => "pwt_scatter_data.csv",
            ChartKind::ConnectedScatter => "pwt_connectedscatter_data.csv",
        }
    }

    /// True if the user picks both axes
    #[must_use]
    pub const fn has_x_variable(self) -> bool {
        !matches!(self, ChartKind::Line)
    }

    /// Initial filters for this page
    ///
    /// Time-series pages start with the default countries that exist and
    /// the full year range; the scatter page starts with every country in
    /// the latest year.
    #[must_use]
    pub fn default_filters(self, options: &FilterOptions) -> FilterSelection {
        match self {
            ChartKind::Line | ChartKind::ConnectedScatter => {
                let countries: Vec<String> = DEFAULT_COUNTRIES
                    .iter()
                    .filter(|c| options.countries.iter().any(|o| o == *c))
                    .map(ToString::to_string)
                    .collect();
                let years = match (options.min_year(), options.max_year()) {
                    (Some(start), Some(end)) => YearFilter::Range { start, end },
                    _ => YearFilter::All,
                };
                FilterSelection {
                    countries: Selection::Only(countries),
                    years,
                    ..FilterSelection::default()
                }
            }
            ChartKind::Scatter => FilterSelection {
                years: options
                    .max_year()
                    .map_or(YearFilter::All, |y| YearFilter::Only(vec![y])),
                ..FilterSelection::default()
            },
        }
    }
}

/// Axis scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AxisScale {
    #[default]
    Linear,
    Log,
}

/// Column ids plotted on each axis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartVariables {
    pub x: String,
    pub y: String,
}

/// Variable picker: numeric columns other than the time column
#[derive(Debug, Clone)]
pub struct VariableChoice {
    candidates: Vec<String>,
    columns: Vec<String>,
    labels: LabelDictionary,
    time_column: String,
}

impl VariableChoice {
    /// Candidates from the table's current columns, custom ones included
    #[must_use]
    pub fn from_table(table: &Table) -> Self {
        Self {
            candidates: table.selectable_columns(),
            columns: table.columns(),
            labels: table.labels().clone(),
            time_column: table.config().time_column.clone(),
        }
    }

    fn resolver(&self) -> LabelResolver<'_> {
        LabelResolver::new(&self.labels, &self.candidates).with_columns(&self.columns)
    }

    #[must_use]
    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    /// Display labels in candidate order
    #[must_use]
    pub fn options(&self) -> Vec<String> {
        self.resolver()
            .options()
            .into_iter()
            .map(ToString::to_string)
            .collect()
    }

    #[must_use]
    pub fn label_for(&self, column: &str) -> String {
        self.labels.label_for(column).to_string()
    }

    /// Column id of a selected label
    ///
    /// # Errors
    /// Returns `UnknownLabelError` rather than substituting another column
    pub fn column_for(&self, label: &str) -> Result<String, UnknownLabelError> {
        self.resolver().column_for(label)
    }

    /// Initial axes for a chart page
    ///
    /// # Errors
    /// Returns `NoVariables` when there is no candidate column
    pub fn default_variables(&self, kind: ChartKind) -> ViewResult<ChartVariables> {
        let first = self.candidates.first().ok_or(ViewError::NoVariables)?;
        let find = |name: &str| self.candidates.iter().find(|c| *c == name);

        match kind {
            ChartKind::Line => Ok(ChartVariables {
                x: self.time_column.clone(),
                y: first.clone(),
            }),
            ChartKind::Scatter | ChartKind::ConnectedScatter => {
                let x = find(DEFAULT_X).unwrap_or(first);
                let y = find(DEFAULT_Y)
                    .or_else(|| self.candidates.get(1))
                    .unwrap_or(first);
                Ok(ChartVariables {
                    x: x.clone(),
                    y: y.clone(),
                })
            }
        }
    }

    /// Resolve the labels picked in the sidebar
    ///
    /// Line charts ignore `x_label` and plot against time.
    ///
    /// # Errors
    /// Returns `UnknownLabel` if a label does not resolve
    pub fn resolve(
        &self,
        kind: ChartKind,
        x_label: Option<&str>,
        y_label: &str,
    ) -> ViewResult<ChartVariables> {
        let y = self.column_for(y_label)?;
        let x = match (kind, x_label) {
            (ChartKind::Line, _) | (_, None) => self.time_column.clone(),
            (_, Some(label)) => self.column_for(label)?,
        };
        Ok(ChartVariables { x, y })
    }
}

/// One plotted point
#[derive(Debug, Clone, PartialEq)]
pub struct ChartPoint {
    pub x: f64,
    pub y: f64,
    /// Year text on connected scatter paths, country on scatter hover
    pub text: Option<String>,
    /// Bubble size
    pub size: Option<f64>,
}

/// Points sharing a colour and legend entry
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    pub name: String,
    pub points: Vec<ChartPoint>,
}

/// Everything a renderer needs for one chart
#[derive(Debug, Clone, PartialEq)]
pub struct ChartData {
    pub kind: ChartKind,
    pub title: String,
    pub x_title: String,
    pub y_title: String,
    pub x_scale: AxisScale,
    pub y_scale: AxisScale,
    pub traces: Vec<Trace>,
    pub note: String,
}

impl ChartData {
    /// Build chart data from already filtered rows
    ///
    /// Rows missing either plotted value are skipped. Line and connected
    /// scatter traces are per country and ordered by year; scatter traces
    /// are per region.
    ///
    /// # Errors
    /// Returns `EmptySelection` if `frame` has no rows
    pub fn build(
        frame: &DataFrame,
        kind: ChartKind,
        variables: &ChartVariables,
        labels: &LabelDictionary,
        config: &PanelConfig,
    ) -> ViewResult<Self> {
        if frame.num_rows() == 0 {
            return Err(ViewError::EmptySelection);
        }

        let rows = complete_rows(frame, &[variables.x.as_str(), variables.y.as_str()])?;
        let x = rows.column(&variables.x)?.to_float64()?;
        let y = rows.column(&variables.y)?.to_float64()?;

        let group_column = match kind {
            ChartKind::Scatter => &config.region_column,
            ChartKind::Line | ChartKind::ConnectedScatter => &config.entity_column,
        };
        let groups = optional_strings(&rows, group_column)?;
        let countries = optional_strings(&rows, &config.entity_column)?;
        let years = optional_floats(&rows, &config.time_column)?;
        let sizes = match kind {
            ChartKind::Scatter => optional_floats(&rows, &config.size_column)?,
            _ => None,
        };

        let mut traces: Vec<Trace> = Vec::new();
        let mut slots: HashMap<String, usize> = HashMap::new();
        let mut order: Vec<Vec<(f64, ChartPoint)>> = Vec::new();

        for row in 0..rows.num_rows() {
            let name = groups
                .as_ref()
                .and_then(|g| g[row].clone())
                .unwrap_or_default();
            let year = years.as_ref().filter(|y| y.is_valid(row)).map(|y| y.value(row));

            let text = match kind {
                ChartKind::Line => None,
                ChartKind::ConnectedScatter => year.map(|y| format!("{y}")),
                ChartKind::Scatter => countries.as_ref().and_then(|c| c[row].clone()),
            };
            let size = sizes
                .as_ref()
                .filter(|s| s.is_valid(row))
                .map(|s| s.value(row));

            let slot = *slots.entry(name.clone()).or_insert_with(|| {
                traces.push(Trace {
                    name,
                    points: Vec::new(),
                });
                order.push(Vec::new());
                traces.len() - 1
            });
            order[slot].push((
                year.unwrap_or(f64::NAN),
                ChartPoint {
                    x: x.value(row),
                    y: y.value(row),
                    text,
                    size,
                },
            ));
        }

        for (trace, mut points) in traces.iter_mut().zip(order) {
            if kind != ChartKind::Scatter {
                points.sort_by(|a, b| a.0.total_cmp(&b.0));
            }
            trace.points = points.into_iter().map(|(_, p)| p).collect();
        }

        let label_x = labels.label_for(&variables.x).to_string();
        let label_y = labels.label_for(&variables.y).to_string();
        let (title, x_title, note) = match kind {
            ChartKind::Line => (
                format!("{label_y} over time"),
                String::new(),
                SOURCE_NOTE.to_string(),
            ),
            ChartKind::Scatter => (
                format!("{label_y} and {label_x}"),
                label_x,
                format!(
                    "{SOURCE_NOTE}. The size of the bubbles represents the population of the country."
                ),
            ),
            ChartKind::ConnectedScatter => (
                format!("{label_y} and {label_x}"),
                label_x,
                SOURCE_NOTE.to_string(),
            ),
        };

        Ok(Self {
            kind,
            title,
            x_title,
            y_title: label_y,
            x_scale: AxisScale::Linear,
            y_scale: AxisScale::Linear,
            traces,
            note,
        })
    }

    /// Set the axis scales
    #[must_use]
    pub fn with_scales(mut self, x_scale: AxisScale, y_scale: AxisScale) -> Self {
        self.x_scale = x_scale;
        self.y_scale = y_scale;
        self
    }

    /// Total number of plotted points
    #[must_use]
    pub fn num_points(&self) -> usize {
        self.traces.iter().map(|t| t.points.len()).sum()
    }
}

/// Rows whose values in `columns` are present and not NaN
///
/// # Errors
/// Returns error if a column is missing or not numeric
pub fn complete_rows(frame: &DataFrame, columns: &[&str]) -> DataResult<DataFrame> {
    for name in columns {
        let series = frame.column(name)?;
        if !series.is_numeric() {
            return Err(DataError::TypeMismatch {
                expected: "numeric column".to_string(),
                found: format!("{} ({:?})", name, series.data_type()),
            });
        }
    }
    frame.dropna_columns(columns)
}

fn optional_strings(frame: &DataFrame, column: &str) -> DataResult<Option<Vec<Option<String>>>> {
    if !frame.has_column(column) {
        return Ok(None);
    }
    Ok(Some(frame.column(column)?.to_string_values()?))
}

fn optional_floats(frame: &DataFrame, column: &str) -> DataResult<Option<Float64Array>> {
    if !frame.has_column(column) {
        return Ok(None);
    }
    let series = frame.column(column)?;
    if !series.is_numeric() {
        return Ok(None);
    }
    Ok(Some(series.to_float64()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::BooleanArray;
    use pwt_core::data::Series;
    use pwt_core::{DatasetStore, MemorySource};

    fn panel() -> DataFrame {
        DataFrame::from_series(vec![
            Series::from_strings(
                "country",
                vec!["India", "Pakistan", "India", "Pakistan", "Kenya"],
            ),
            Series::from_strings(
                "region",
                vec!["South Asia", "South Asia", "South Asia", "South Asia", "Africa"],
            ),
            Series::from_strings("incgroup", vec!["LM", "LM", "LM", "LM", "LM"]),
            Series::from_ints("year", vec![2019, 2019, 2018, 2018, 2019]),
            Series::from_floats("pop", vec![1366.0, 216.0, 1352.0, 212.0, 52.0]),
            Series::from_optional_floats(
                "emp",
                vec![Some(480.0), Some(70.0), Some(470.0), None, Some(20.0)],
            ),
        ])
        .unwrap()
    }

    fn labels() -> LabelDictionary {
        LabelDictionary::from_pairs([("pop", "Population"), ("emp", "Employment")])
    }

    fn table() -> Table {
        DatasetStore::default()
            .initialize(&MemorySource::new(panel(), labels()))
            .unwrap()
    }

    #[test]
    fn file_names() {
        assert_eq!(ChartKind::Line.file_name(), "pwt_lineplot_data.csv");
        assert_eq!(ChartKind::Scatter.file_name(), "pwt_scatter_data.csv");
        assert_eq!(
            ChartKind::ConnectedScatter.file_name(),
            "pwt_connectedscatter_data.csv"
        );
    }

    #[test]
    fn default_filters_per_kind() {
        let options = FilterOptions::from_frame(&panel(), &PanelConfig::default()).unwrap();

        let line = ChartKind::Line.default_filters(&options);
        assert_eq!(
            line.countries,
            Selection::Only(vec!["Pakistan".to_string(), "India".to_string()])
        );
        assert_eq!(
            line.years,
            YearFilter::Range {
                start: 2018,
                end: 2019
            }
        );

        let scatter = ChartKind::Scatter.default_filters(&options);
        assert!(scatter.countries.is_all());
        assert_eq!(scatter.years, YearFilter::Only(vec![2019]));
    }

    #[test]
    fn default_variables_prefer_pop_and_emp() {
        let choice = VariableChoice::from_table(&table());
        assert_eq!(choice.candidates(), &["pop".to_string(), "emp".to_string()]);

        let scatter = choice.default_variables(ChartKind::Scatter).unwrap();
        assert_eq!(scatter.x, "pop");
        assert_eq!(scatter.y, "emp");

        let line = choice.default_variables(ChartKind::Line).unwrap();
        assert_eq!(line.x, "year");
        assert_eq!(line.y, "pop");
    }

    #[test]
    fn strict_label_resolution() {
        let choice = VariableChoice::from_table(&table());
        assert_eq!(choice.options(), vec!["Population", "Employment"]);

        let vars = choice
            .resolve(ChartKind::Scatter, Some("Population"), "Employment")
            .unwrap();
        assert_eq!(vars, ChartVariables { x: "pop".into(), y: "emp".into() });

        let err = choice.resolve(ChartKind::Line, None, "GDP").unwrap_err();
        assert!(matches!(err, ViewError::UnknownLabel(_)));
    }

    #[test]
    fn line_traces_are_per_country_in_year_order() {
        let vars = ChartVariables {
            x: "year".into(),
            y: "pop".into(),
        };
        let chart =
            ChartData::build(&panel(), ChartKind::Line, &vars, &labels(), &PanelConfig::default())
                .unwrap();

        assert_eq!(chart.title, "Population over time");
        assert_eq!(chart.y_title, "Population");
        let names: Vec<&str> = chart.traces.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["India", "Pakistan", "Kenya"]);
        let india: Vec<f64> = chart.traces[0].points.iter().map(|p| p.x).collect();
        assert_eq!(india, vec![2018.0, 2019.0]);
    }

    #[test]
    fn scatter_traces_are_per_region_and_skip_missing() {
        let vars = ChartVariables {
            x: "pop".into(),
            y: "emp".into(),
        };
        let chart = ChartData::build(
            &panel(),
            ChartKind::Scatter,
            &vars,
            &labels(),
            &PanelConfig::default(),
        )
        .unwrap()
        .with_scales(AxisScale::Log, AxisScale::Linear);

        assert_eq!(chart.title, "Employment and Population");
        assert_eq!(chart.x_title, "Population");
        assert_eq!(chart.x_scale, AxisScale::Log);
        assert_eq!(chart.traces.len(), 2);
        assert_eq!(chart.num_points(), 4);
        let kenya = &chart.traces[1].points[0];
        assert_eq!(kenya.text.as_deref(), Some("Kenya"));
        assert_eq!(kenya.size, Some(52.0));
    }

    #[test]
    fn connected_scatter_labels_points_with_years() {
        let vars = ChartVariables {
            x: "pop".into(),
            y: "emp".into(),
        };
        let chart = ChartData::build(
            &panel(),
            ChartKind::ConnectedScatter,
            &vars,
            &labels(),
            &PanelConfig::default(),
        )
        .unwrap();
        let india = &chart.traces[0];
        let years: Vec<Option<&str>> = india.points.iter().map(|p| p.text.as_deref()).collect();
        assert_eq!(years, vec![Some("2018"), Some("2019")]);
    }

    #[test]
    fn empty_selection_is_an_error() {
        let empty = panel()
            .filter(&BooleanArray::from(vec![false; 5]))
            .unwrap();
        let vars = ChartVariables {
            x: "year".into(),
            y: "pop".into(),
        };
        let err = ChartData::build(&empty, ChartKind::Line, &vars, &labels(), &PanelConfig::default())
            .unwrap_err();
        assert_eq!(err, ViewError::EmptySelection);
    }

    #[test]
    fn complete_rows_drop_missing_and_nan() {
        let frame = DataFrame::from_series(vec![
            Series::from_strings("country", vec!["India", "Pakistan", "Kenya"]),
            Series::from_optional_floats("pop", vec![Some(1366.0), None, Some(52.0)]),
            Series::from_floats("ratio", vec![0.3, 0.3, f64::NAN]),
        ])
        .unwrap();

        let rows = complete_rows(&frame, &["pop", "ratio"]).unwrap();
        assert_eq!(rows.num_rows(), 1);
        assert_eq!(complete_rows(&frame, &["ratio"]).unwrap().num_rows(), 2);
        assert!(matches!(
            complete_rows(&frame, &["country"]).unwrap_err(),
            DataError::TypeMismatch { .. }
        ));
    }
}
