//! Integration tests for the chart pages over a shared table

use std::fs;

use pwt_core::data::{DataFrame, Series};
use pwt_core::{DatasetStore, LabelDictionary, MemorySource, Table};
use pwt_view::{
    AxisScale, ChartKind, ChartRequest, ChartView, FilterSelection, Selection, VariableCatalog,
    ViewError, YearFilter,
};
use tempfile::tempdir;

fn table() -> Table {
    let frame = DataFrame::from_series(vec![
        Series::from_strings(
            "country",
            vec!["Pakistan", "India", "Bangladesh", "Kenya", "Pakistan", "India", "Bangladesh", "Kenya"],
        ),
        Series::from_strings(
            "region",
            vec![
                "South Asia", "South Asia", "South Asia", "Sub-Saharan Africa",
                "South Asia", "South Asia", "South Asia", "Sub-Saharan Africa",
            ],
        ),
        Series::from_strings("incgroup", vec!["Lower middle"; 8]),
        Series::from_ints("year", vec![2018, 2018, 2018, 2018, 2019, 2019, 2019, 2019]),
        Series::from_floats(
            "rgdpo",
            vec![1100.0, 9000.0, 700.0, 230.0, 1150.0, 9500.0, 760.0, 240.0],
        ),
        Series::from_floats("pop", vec![212.0, 1352.0, 161.0, 51.0, 216.0, 1366.0, 163.0, 52.0]),
        Series::from_floats("emp", vec![68.0, 470.0, 63.0, 20.0, 70.0, 480.0, 64.0, 21.0]),
    ])
    .unwrap();
    let labels = LabelDictionary::from_pairs([
        ("rgdpo", "Real GDP"),
        ("pop", "Population"),
        ("emp", "Employment"),
    ]);
    DatasetStore::default()
        .initialize(&MemorySource::new(frame, labels))
        .unwrap()
}

#[test]
fn test_line_page_defaults() {
    let view = ChartView::new(table(), ChartKind::Line);
    let request = view.default_request().unwrap();

    assert_eq!(
        request.filters.countries,
        Selection::only(["Pakistan", "India", "Bangladesh"])
    );
    assert_eq!(request.variables.y, "rgdpo");

    let chart = view.chart(&request).unwrap();
    assert_eq!(chart.title, "Real GDP over time");
    assert_eq!(chart.traces.len(), 3);
    assert_eq!(chart.num_points(), 6);
}

#[test]
fn test_scatter_page_defaults_to_latest_year() {
    let view = ChartView::new(table(), ChartKind::Scatter);
    let request = view.default_request().unwrap();
    assert_eq!(request.filters.years, YearFilter::Only(vec![2019]));

    let chart = view.chart(&request).unwrap();
    assert_eq!(chart.title, "Employment and Population");
    assert_eq!(chart.num_points(), 4);
    assert_eq!(chart.traces[0].name, "South Asia");
}

#[test]
fn test_custom_variable_is_visible_to_views() {
    let table = table();
    let view = ChartView::new(table.clone(), ChartKind::ConnectedScatter);

    table.create_variable("gdp_pc", "rgdpo / pop").unwrap();

    let choice = view.variable_choice();
    assert!(choice.options().contains(&"gdp_pc".to_string()));

    let mut request = view.default_request().unwrap();
    request.variables = choice
        .resolve(ChartKind::ConnectedScatter, Some("Population"), "gdp_pc")
        .unwrap();
    request.y_scale = AxisScale::Log;

    let chart = view.chart(&request).unwrap();
    assert_eq!(chart.title, "gdp_pc and Population");
    assert_eq!(chart.y_scale, AxisScale::Log);

    let catalog = VariableCatalog::from_table(&table);
    assert_eq!(catalog.custom().len(), 1);
}

#[test]
fn test_unknown_label_propagates() {
    let view = ChartView::new(table(), ChartKind::Scatter);
    let err = view
        .variable_choice()
        .resolve(ChartKind::Scatter, Some("Population"), "Capital stock")
        .unwrap_err();
    assert!(matches!(err, ViewError::UnknownLabel(_)));
}

#[test]
fn test_empty_selection() {
    let view = ChartView::new(table(), ChartKind::Line);
    let mut request = view.default_request().unwrap();
    request.filters = FilterSelection {
        countries: Selection::only(["Atlantis"]),
        ..FilterSelection::default()
    };
    assert_eq!(view.chart(&request).unwrap_err(), ViewError::EmptySelection);
}

#[test]
fn test_export_to_dir() {
    let view = ChartView::new(table(), ChartKind::ConnectedScatter);
    let request: ChartRequest = view.default_request().unwrap();
    let dir = tempdir().unwrap();

    let path = view.export_to_dir(&request, dir.path()).unwrap();
    assert!(path.ends_with("pwt_connectedscatter_data.csv"));

    let text = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "country,year,pop,emp");
    assert_eq!(lines.len(), 7);
    assert_eq!(view.export(&request).unwrap(), text.into_bytes());
}
