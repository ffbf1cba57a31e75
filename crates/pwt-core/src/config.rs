//! Panel layout configuration (`pwt.toml`)
//!
//! Names the workbook sections and the columns that carry the entity,
//! time, region and income-group dimensions. Every field has a default
//! matching the Penn World Table extract, so an empty file is valid.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading a configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {field} cannot be empty")]
    EmptyField { field: &'static str },
}

/// Dataset layout and dimension columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PanelConfig {
    /// Workbook sheet holding the observations
    pub data_sheet: String,
    /// Workbook sheet holding the variable labels
    pub label_sheet: String,
    /// Label-sheet column with the variable identifier
    pub label_variable_column: String,
    /// Label-sheet column with the display label
    pub label_text_column: String,
    pub entity_column: String,
    pub time_column: String,
    pub region_column: String,
    pub income_group_column: String,
    /// Bubble size in scatter charts
    pub size_column: String,
    /// Columns the data sheet must contain
    pub required_columns: Vec<String>,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            data_sheet: "Sheet1".to_string(),
            label_sheet: "VariableInfo".to_string(),
            label_variable_column: "variable".to_string(),
            label_text_column: "label".to_string(),
            entity_column: "country".to_string(),
            time_column: "year".to_string(),
            region_column: "region".to_string(),
            income_group_column: "incgroup".to_string(),
            size_column: "pop".to_string(),
            required_columns: ["country", "region", "incgroup", "year"]
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

impl PanelConfig {
    /// Load a configuration from a TOML file
    ///
    /// # Errors
    /// Returns error if the file cannot be read, parsed or validated
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse a configuration from a TOML string
    ///
    /// # Errors
    /// Returns error if the TOML is malformed or a name is empty
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Render as TOML
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("data_sheet", &self.data_sheet),
            ("label_sheet", &self.label_sheet),
            ("label_variable_column", &self.label_variable_column),
            ("label_text_column", &self.label_text_column),
            ("entity_column", &self.entity_column),
            ("time_column", &self.time_column),
        ];
        for (field, value) in fields {
            if value.trim().is_empty() {
                return Err(ConfigError::EmptyField { field });
            }
        }
        Ok(())
    }
}
