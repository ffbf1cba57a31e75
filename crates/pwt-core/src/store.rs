//! Dataset Store
//!
//! `DatasetStore` loads the panel once per session and hands out `Table`
//! handles. Every handle shares one state behind a read/write lock, so a
//! column added through one handle is visible through all others.

use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::info;

use crate::config::PanelConfig;
use crate::data::{DataFrame, DataResult, Series};
use crate::formula::SeriesPartition;
use crate::labels::{LabelDictionary, LabelResolver};
use crate::registry::CustomRegistry;
use crate::source::{DatasetSource, LoadError};

/// Mutable part of the table, guarded by the table lock
#[derive(Debug)]
pub(crate) struct PanelState {
    pub(crate) frame: DataFrame,
    pub(crate) registry: CustomRegistry,
    pub(crate) base_columns: Vec<String>,
}

impl PanelState {
    /// Entity series of the current frame, as configured
    pub(crate) fn partition(&self, config: &PanelConfig) -> DataResult<SeriesPartition> {
        SeriesPartition::from_frame(
            &self.frame,
            Some(config.entity_column.as_str()),
            Some(config.time_column.as_str()),
        )
    }
}

/// Shared handle to the session's panel dataset
#[derive(Debug, Clone)]
pub struct Table {
    state: Arc<RwLock<PanelState>>,
    labels: Arc<LabelDictionary>,
    config: Arc<PanelConfig>,
}

impl Table {
    fn new(frame: DataFrame, labels: LabelDictionary, config: Arc<PanelConfig>) -> Self {
        let base_columns = frame.columns();
        Self {
            state: Arc::new(RwLock::new(PanelState {
                frame,
                registry: CustomRegistry::new(),
                base_columns,
            })),
            labels: Arc::new(labels),
            config,
        }
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, PanelState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, PanelState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// True if both handles refer to the same loaded dataset
    #[must_use]
    pub fn same_instance(&self, other: &Table) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    /// The current table contents
    ///
    /// Arrow buffers are shared, so this does not copy column data.
    #[must_use]
    pub fn snapshot(&self) -> DataFrame {
        self.read().frame.clone()
    }

    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.read().frame.num_rows()
    }

    #[must_use]
    pub fn num_columns(&self) -> usize {
        self.read().frame.num_columns()
    }

    #[must_use]
    pub fn columns(&self) -> Vec<String> {
        self.read().frame.columns()
    }

    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.read().frame.has_column(name)
    }

    /// Numeric columns, base and custom, in table order
    #[must_use]
    pub fn numeric_columns(&self) -> Vec<String> {
        self.read().frame.numeric_columns()
    }

    /// Numeric columns offered for chart axes: everything but the time column
    #[must_use]
    pub fn selectable_columns(&self) -> Vec<String> {
        let mut columns = self.numeric_columns();
        columns.retain(|c| *c != self.config.time_column);
        columns
    }

    #[must_use]
    pub fn labels(&self) -> &LabelDictionary {
        &self.labels
    }

    /// Display label for a column, or the column id when unlabelled
    #[must_use]
    pub fn label_for(&self, column: &str) -> String {
        self.labels.label_for(column).to_string()
    }

    /// Resolve a display label among `candidates`, accepting raw column ids
    ///
    /// # Errors
    /// Returns `UnknownLabelError` when nothing matches
    pub fn column_for(
        &self,
        label: &str,
        candidates: &[String],
    ) -> Result<String, crate::labels::UnknownLabelError> {
        let columns = self.columns();
        LabelResolver::new(&self.labels, candidates)
            .with_columns(&columns)
            .column_for(label)
    }

    #[must_use]
    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    /// Columns present when the dataset was loaded
    #[must_use]
    pub fn base_columns(&self) -> Vec<String> {
        self.read().base_columns.clone()
    }

    #[must_use]
    pub fn is_custom(&self, name: &str) -> bool {
        self.read().registry.is_custom(name)
    }

    /// Custom variables in creation order
    #[must_use]
    pub fn custom_variables(&self) -> Vec<String> {
        self.read().registry.names().to_vec()
    }

    /// Append a column without registering it as custom
    ///
    /// # Errors
    /// Returns error on a duplicate name or a length mismatch
    pub fn add_column(&self, series: Series) -> DataResult<()> {
        let mut state = self.write();
        state.frame = state.frame.add_column(series)?;
        Ok(())
    }

    /// Drop the named columns that exist; returns the ones dropped
    ///
    /// Dropped names also leave the custom registry.
    ///
    /// # Errors
    /// Returns `EmptyData` if every column would be dropped
    pub fn remove_columns(&self, names: &[&str]) -> DataResult<Vec<String>> {
        let mut state = self.write();
        let mut present: Vec<&str> = Vec::new();
        for name in names.iter().copied() {
            if state.frame.has_column(name) && !present.contains(&name) {
                present.push(name);
            }
        }
        if present.is_empty() {
            return Ok(Vec::new());
        }
        state.frame = state.frame.drop(&present)?;
        for name in &present {
            state.registry.unregister(name);
        }
        Ok(present.into_iter().map(ToString::to_string).collect())
    }
}

/// Lazily initialised, process-wide holder of the panel dataset
///
/// Cloning the store clones the handle; all clones share one dataset.
#[derive(Debug, Clone)]
pub struct DatasetStore {
    config: Arc<PanelConfig>,
    cell: Arc<Mutex<Option<Table>>>,
}

impl Default for DatasetStore {
    fn default() -> Self {
        Self::new(PanelConfig::default())
    }
}

impl DatasetStore {
    #[must_use]
    pub fn new(config: PanelConfig) -> Self {
        Self {
            config: Arc::new(config),
            cell: Arc::new(Mutex::new(None)),
        }
    }

    #[must_use]
    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    /// Load the dataset on first call; later calls return the same table
    ///
    /// The source is not read again once a table exists.
    ///
    /// # Errors
    /// Returns `LoadError` if the first load fails. A failed load leaves the
    /// store uninitialised.
    pub fn initialize(&self, source: &dyn DatasetSource) -> Result<Table, LoadError> {
        let mut cell = self.cell.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(table) = cell.as_ref() {
            info!(source = %source.describe(), "dataset already initialised, reusing");
            return Ok(table.clone());
        }

        let loaded = source.load(&self.config)?;
        info!(
            source = %source.describe(),
            rows = loaded.frame.num_rows(),
            columns = loaded.frame.num_columns(),
            labels = loaded.labels.len(),
            "dataset initialised"
        );
        let table = Table::new(loaded.frame, loaded.labels, Arc::clone(&self.config));
        *cell = Some(table.clone());
        Ok(table)
    }

    /// The table, if initialised
    #[must_use]
    pub fn get(&self) -> Option<Table> {
        self.cell
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.get().is_some()
    }
}
