//! Column labels
//!
//! The label dictionary maps column identifiers to short display labels.
//! It is loaded once with the dataset and never changes. The resolver
//! translates in both directions for one candidate set of columns.

use std::collections::HashMap;

use thiserror::Error;
use tracing::debug;

/// Variables documented for the Penn World Table panel, with descriptions
pub const DOCUMENTED_VARIABLES: &[(&str, &str)] = &[
    ("country", "Country name"),
    ("region", "Large geographical region"),
    (
        "incgroup",
        "Income groups according to 2008 GNI per capita (World Bank Atlas method)",
    ),
    ("year", "Year"),
    (
        "rgdpo",
        "Output-side real GDP at chained PPPs (million 2021 US dollars)",
    ),
    (
        "rgdpna",
        "Real GDP at constant 2021 national prices (million 2021 US dollars)",
    ),
    (
        "rconna",
        "Real consumption at constant 2021 national prices (million 2021 US dollars)",
    ),
    (
        "rnna",
        "Capital stock at constant 2021 national prices (million 2021 US dollars)",
    ),
    (
        "rtfpna",
        "Total factor productivity (TFP) at constant national prices (2021 = 1)",
    ),
    ("ctfp", "TFP level at current PPPs (USA = 1)"),
    ("pop", "Population (in millions)"),
    ("emp", "Number of persons engaged (in millions)"),
    (
        "avh",
        "Average annual hours worked by persons engaged (The Conference Board)",
    ),
    (
        "labsh",
        "Share of labour compensation in GDP at current national prices",
    ),
    ("hc", "Human capital index (see PWT documentation)"),
    ("csh_c", "Share of household consumption at current PPPs"),
    ("csh_i", "Share of gross capital formation at current PPPs"),
    ("csh_x", "Share of merchandise exports at current PPPs"),
    (
        "pl_gdpo",
        "Price level of CGDPo (PPP/XR), price level of US GDPo in 2021 = 1",
    ),
    (
        "pl_c",
        "Price level of household consumption, price level of US GDPo in 2021 = 1",
    ),
    (
        "pl_i",
        "Price level of capital formation, price level of US GDPo in 2021 = 1",
    ),
    (
        "pl_x",
        "Price level of exports, price level of US GDPo in 2021 = 1",
    ),
    (
        "pl_n",
        "Price level of the capital stock, price level of US in 2021 = 1",
    ),
    ("xr", "Exchange rate, national currency per US dollar"),
];

/// Description of a documented PWT variable
#[must_use]
pub fn describe(variable: &str) -> Option<&'static str> {
    DOCUMENTED_VARIABLES
        .iter()
        .find(|(name, _)| *name == variable)
        .map(|(_, description)| *description)
}

/// Reverse lookup found no column for a label
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("no variable is labelled '{label}'")]
pub struct UnknownLabelError {
    pub label: String,
}

/// Immutable mapping from column identifier to display label
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelDictionary {
    labels: HashMap<String, String>,
}

impl LabelDictionary {
    /// Create an empty dictionary
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from (variable, label) pairs; later duplicates replace earlier ones
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            labels: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// The mapped label, if any
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&str> {
        self.labels.get(column).map(String::as_str)
    }

    /// The mapped label, or the column id itself when unmapped
    #[must_use]
    pub fn label_for<'a>(&'a self, column: &'a str) -> &'a str {
        self.get(column).unwrap_or(column)
    }

    #[must_use]
    pub fn contains(&self, column: &str) -> bool {
        self.labels.contains_key(column)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Iterate over (variable, label) pairs in arbitrary order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.labels.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Bidirectional label lookup restricted to a candidate set
///
/// Within one candidate set distinct columns are expected to carry
/// distinct labels. When they do not, `column_for` returns the first
/// candidate in order whose label matches.
#[derive(Debug, Clone, Copy)]
pub struct LabelResolver<'a> {
    labels: &'a LabelDictionary,
    candidates: &'a [String],
    columns: &'a [String],
}

impl<'a> LabelResolver<'a> {
    /// Resolver over `candidates`, with no raw-column passthrough beyond them
    #[must_use]
    pub fn new(labels: &'a LabelDictionary, candidates: &'a [String]) -> Self {
        Self {
            labels,
            candidates,
            columns: candidates,
        }
    }

    /// Accept any of `columns` as a raw identifier when no label matches
    #[must_use]
    pub fn with_columns(mut self, columns: &'a [String]) -> Self {
        self.columns = columns;
        self
    }

    /// The candidate columns of this resolver
    #[must_use]
    pub fn candidates(&self) -> &'a [String] {
        self.candidates
    }

    /// Display label for a column; never fails
    #[must_use]
    pub fn label_for<'b>(&'b self, column: &'b str) -> &'b str {
        self.labels.label_for(column)
    }

    /// Display labels of every candidate, in candidate order
    #[must_use]
    pub fn options(&self) -> Vec<&'a str> {
        self.candidates
            .iter()
            .map(|c| self.labels.label_for(c.as_str()))
            .collect()
    }

    /// Column id for a display label
    ///
    /// Candidates are searched in order; a label that is itself a known
    /// column id is accepted as-is.
    ///
    /// # Errors
    /// Returns `UnknownLabelError` when neither lookup succeeds
    pub fn column_for(&self, label: &str) -> Result<String, UnknownLabelError> {
        if let Some(column) = self
            .candidates
            .iter()
            .find(|c| self.labels.label_for(c.as_str()) == label)
        {
            return Ok(column.clone());
        }

        if self.columns.iter().any(|c| c == label) {
            debug!(label, "label not found among candidates, using raw column id");
            return Ok(label.to_string());
        }

        Err(UnknownLabelError {
            label: label.to_string(),
        })
    }
}
