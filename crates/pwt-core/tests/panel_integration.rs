//! Integration tests for the dataset store, labels and custom variables

use std::fs;
use std::thread;

use arrow::array::Array;

use pwt_core::data::{DataFrame, Series};
use pwt_core::formula::{ParseError, ParseErrorKind};
use pwt_core::{
    CsvSource, DatasetStore, FormulaError, LabelDictionary, LabelResolver, LoadError, MemorySource,
    PanelConfig, Table, VariableError,
};
use tempfile::tempdir;

fn two_row_source() -> MemorySource {
    let frame = DataFrame::from_series(vec![
        Series::from_strings("country", vec!["Pakistan", "Pakistan"]),
        Series::from_strings("region", vec!["South Asia", "South Asia"]),
        Series::from_strings("incgroup", vec!["Lower middle", "Lower middle"]),
        Series::from_ints("year", vec![2018, 2019]),
        Series::from_floats("rgdpo", vec![100.0, 50.0]),
        Series::from_floats("pop", vec![50.0, 25.0]),
    ])
    .unwrap();
    let labels = LabelDictionary::from_pairs([
        ("rgdpo", "Real GDP (output side)"),
        ("pop", "Population"),
    ]);
    MemorySource::new(frame, labels)
}

fn table() -> Table {
    DatasetStore::default().initialize(&two_row_source()).unwrap()
}

#[test]
fn test_gdp_per_capita_scenario() {
    let table = table();
    let columns_before = table.num_columns();

    table.create_variable("gdp_pc", "rgdpo / pop").unwrap();

    assert_eq!(table.num_columns(), columns_before + 1);
    assert_eq!(table.num_rows(), 2);
    assert!(table.is_custom("gdp_pc"));

    let values = table
        .snapshot()
        .column("gdp_pc")
        .unwrap()
        .to_float64()
        .unwrap();
    assert_eq!(values.value(0), 2.0);
    assert_eq!(values.value(1), 2.0);
}

#[test]
fn test_collision_with_base_and_custom_columns() {
    let table = table();
    let columns_before = table.num_columns();

    assert_eq!(
        table.create_variable("pop", "1+1").unwrap_err(),
        VariableError::NameCollision("pop".to_string())
    );
    assert_eq!(table.num_columns(), columns_before);

    table.create_variable("gdp_pc", "rgdpo / pop").unwrap();
    assert_eq!(
        table.create_variable("gdp_pc", "rgdpo").unwrap_err(),
        VariableError::NameCollision("gdp_pc".to_string())
    );
}

#[test]
fn test_empty_expression() {
    let table = table();
    assert_eq!(
        table.create_variable("x", "").unwrap_err(),
        VariableError::EmptyExpression
    );
    assert!(!table.has_column("x"));
}

#[test]
fn test_deeply_nested_formula_is_rejected() {
    let table = table();
    let columns_before = table.num_columns();
    let nested = format!("{}rgdpo{}", "(".repeat(1000), ")".repeat(1000));

    let err = table.create_variable("deep", &nested).unwrap_err();
    assert!(matches!(
        err,
        VariableError::Evaluation {
            source: FormulaError::Parse(ParseError {
                kind: ParseErrorKind::TooDeeplyNested(_),
                ..
            })
        }
    ));
    assert_eq!(table.num_columns(), columns_before);

    let shallow = format!("{}rgdpo{}", "(".repeat(100), ")".repeat(100));
    table.create_variable("shallow", &shallow).unwrap();
    assert!(table.is_custom("shallow"));
}

#[test]
fn test_unary_plus_and_trailing_dot_literals() {
    let table = table();
    table.create_variable("lag", "rgdpo.shift(+1)").unwrap();
    table.create_variable("scaled", "rgdpo * 5.").unwrap();

    let snapshot = table.snapshot();
    let lag = snapshot.column("lag").unwrap().to_float64().unwrap();
    assert!(lag.is_null(0));
    assert_eq!(lag.value(1), 100.0);
    let scaled = snapshot.column("scaled").unwrap().to_float64().unwrap();
    assert_eq!(scaled.value(1), 250.0);
}

#[test]
fn test_remove_twice() {
    let table = table();
    table.create_variable("gdp_pc", "rgdpo / pop").unwrap();

    assert_eq!(table.remove_variables(&["gdp_pc"]), vec!["gdp_pc"]);
    assert!(!table.has_column("gdp_pc"));
    assert!(table.remove_variables(&["gdp_pc"]).is_empty());
}

#[test]
fn test_base_columns_are_not_removable() {
    let table = table();
    let columns_before = table.columns();

    assert!(table.remove_variables(&["pop", "rgdpo"]).is_empty());
    assert_eq!(table.columns(), columns_before);
    assert_eq!(table.base_columns(), columns_before);
}

#[test]
fn test_initialize_twice_returns_same_table() {
    let store = DatasetStore::default();
    let first = store.initialize(&two_row_source()).unwrap();
    first.create_variable("gdp_pc", "rgdpo / pop").unwrap();

    // A different source on the second call is ignored
    let second = store.initialize(&MemorySource::new(
        DataFrame::from_series(vec![Series::from_ints("year", vec![1])]).unwrap(),
        LabelDictionary::new(),
    ));
    let second = second.unwrap();

    assert!(first.same_instance(&second));
    assert_eq!(second.num_columns(), first.num_columns());
    assert!(second.is_custom("gdp_pc"));
}

#[test]
fn test_label_round_trip_with_custom_columns() {
    let table = table();
    table.create_variable("gdp_pc", "rgdpo / pop").unwrap();

    let candidates = table.selectable_columns();
    let resolver = LabelResolver::new(table.labels(), &candidates);
    for column in &candidates {
        let label = resolver.label_for(column);
        assert_eq!(resolver.column_for(label).unwrap(), *column);
        assert_eq!(resolver.label_for(&resolver.column_for(label).unwrap()), label);
    }
    assert!(resolver.column_for("Employment").is_err());
}

#[test]
fn test_series_formulas_respect_entities() {
    let frame = DataFrame::from_series(vec![
        Series::from_strings("country", vec!["India", "Pakistan", "India", "Pakistan"]),
        Series::from_strings("region", vec!["South Asia"; 4]),
        Series::from_strings("incgroup", vec!["Lower middle"; 4]),
        Series::from_ints("year", vec![2019, 2018, 2018, 2019]),
        Series::from_floats("rgdpna", vec![110.0, 50.0, 100.0, 55.0]),
    ])
    .unwrap();
    let table = DatasetStore::default()
        .initialize(&MemorySource::new(frame, LabelDictionary::new()))
        .unwrap();

    table
        .create_variable(
            "gdp_growth",
            "(rgdpna - rgdpna.shift(1)) / rgdpna.shift(1) * 100",
        )
        .unwrap();
    let growth = table
        .snapshot()
        .column("gdp_growth")
        .unwrap()
        .to_float64()
        .unwrap();

    assert!((growth.value(0) - 10.0).abs() < 1e-9);
    assert!(growth.is_null(1));
    assert!(growth.is_null(2));
    assert!((growth.value(3) - 10.0).abs() < 1e-9);
}

#[test]
fn test_concurrent_creation_of_one_name() {
    let table = table();
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let table = table.clone();
            thread::spawn(move || table.create_variable("gdp_pc", "rgdpo / pop").is_ok())
        })
        .collect();

    let successes = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|ok| *ok)
        .count();
    assert_eq!(successes, 1);
    assert_eq!(table.custom_variables(), vec!["gdp_pc"]);
}

#[test]
fn test_csv_source_with_config_file() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("panel.csv");
    let labels = dir.path().join("labels.csv");
    let config = dir.path().join("pwt.toml");

    fs::write(
        &data,
        "country,region,incgroup,year,rgdpo,pop\n\
         India,South Asia,Lower middle,2018,9000.5,1352.6\n\
         India,South Asia,Lower middle,2019,9500.0,1366.4\n",
    )
    .unwrap();
    fs::write(
        &labels,
        "variable,label_short\nrgdpo,Real GDP\npop,Population\n",
    )
    .unwrap();
    fs::write(&config, "label_text_column = \"label_short\"\n").unwrap();

    let store = DatasetStore::new(PanelConfig::from_path(&config).unwrap());
    let table = store.initialize(&CsvSource::new(&data, &labels)).unwrap();

    assert_eq!(table.num_rows(), 2);
    assert_eq!(table.label_for("rgdpo"), "Real GDP");
    assert_eq!(table.label_for("year"), "year");
}

#[test]
fn test_csv_source_without_label_column() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("panel.csv");
    let labels = dir.path().join("labels.csv");
    fs::write(&data, "country,region,incgroup,year\nIndia,South Asia,Lower middle,2019\n").unwrap();
    fs::write(&labels, "variable,description\npop,Population\n").unwrap();

    let store = DatasetStore::default();
    let err = store
        .initialize(&CsvSource::new(&data, &labels))
        .unwrap_err();
    assert!(matches!(err, LoadError::MissingColumn { ref column, .. } if column == "label"));
    assert!(store.get().is_none());
}
