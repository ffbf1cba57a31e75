//! Listing of the variables currently in the table

use pwt_core::labels::describe;
use pwt_core::Table;

/// One row of the variable listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub variable: String,
    pub label: String,
    pub custom: bool,
    /// Glossary description for documented PWT variables
    pub description: Option<&'static str>,
}

/// Numeric columns of the table with their labels
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VariableCatalog {
    pub entries: Vec<CatalogEntry>,
}

impl VariableCatalog {
    #[must_use]
    pub fn from_table(table: &Table) -> Self {
        let entries = table
            .numeric_columns()
            .into_iter()
            .map(|variable| CatalogEntry {
                label: table.label_for(&variable),
                custom: table.is_custom(&variable),
                description: describe(&variable),
                variable,
            })
            .collect();
        Self { entries }
    }

    #[must_use]
    pub fn custom(&self) -> Vec<&CatalogEntry> {
        self.entries.iter().filter(|e| e.custom).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pwt_core::data::{DataFrame, Series};
    use pwt_core::{DatasetStore, LabelDictionary, MemorySource};

    #[test]
    fn catalog_marks_custom_variables() {
        let frame = DataFrame::from_series(vec![
            Series::from_strings("country", vec!["India"]),
            Series::from_strings("region", vec!["South Asia"]),
            Series::from_strings("incgroup", vec!["LM"]),
            Series::from_ints("year", vec![2019]),
            Series::from_floats("rgdpo", vec![9000.0]),
            Series::from_floats("pop", vec![1366.0]),
        ])
        .unwrap();
        let table = DatasetStore::default()
            .initialize(&MemorySource::new(
                frame,
                LabelDictionary::from_pairs([("pop", "Population")]),
            ))
            .unwrap();
        table.create_variable("gdp_pc", "rgdpo / pop").unwrap();

        let catalog = VariableCatalog::from_table(&table);
        let names: Vec<&str> = catalog.entries.iter().map(|e| e.variable.as_str()).collect();
        assert_eq!(names, vec!["year", "rgdpo", "pop", "gdp_pc"]);

        let pop = &catalog.entries[2];
        assert_eq!(pop.label, "Population");
        assert_eq!(pop.description, Some("Population (in millions)"));
        assert!(!pop.custom);

        let custom = catalog.custom();
        assert_eq!(custom.len(), 1);
        assert_eq!(custom[0].label, "gdp_pc");
        assert_eq!(custom[0].description, None);
    }
}
