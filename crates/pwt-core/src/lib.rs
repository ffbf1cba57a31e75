//! PWT Core - dataset and custom-variable engine for the Penn World Table explorer
//!
//! This crate provides the core functionality:
//! - Dataset Store: one shared panel table per session
//! - Label Resolver: column ids to display labels and back
//! - Formula engine: lexer, parser and vectorised evaluator
//! - Custom Variable Registry: which columns the user derived
//! - Dataset sources: workbook, CSV and in-memory

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Data operations module - DataFrame, Series, and Arrow integration
pub mod data;

/// Lexer module - tokenization of formulas
pub mod lexer;

/// Formula AST, parser and evaluator
pub mod formula;

/// Variable labels and the documented PWT glossary
pub mod labels;

/// Registry of user-derived columns
pub mod registry;

/// Dataset Store and shared table handle
pub mod store;

/// Custom variable creation and removal
pub mod variable;

/// Dataset sources
pub mod source;

/// Panel layout configuration
pub mod config;

pub use config::{ConfigError, PanelConfig};
pub use data::{DataError, DataFrame, DataResult, Series};
pub use formula::{evaluate_formula, FormulaError, SeriesPartition};
pub use labels::{LabelDictionary, LabelResolver, UnknownLabelError};
pub use registry::CustomRegistry;
pub use source::{CsvSource, DatasetSource, LoadError, LoadedDataset, MemorySource, WorkbookSource};
pub use store::{DatasetStore, Table};
pub use variable::VariableError;
