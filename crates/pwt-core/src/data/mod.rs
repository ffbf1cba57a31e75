//! Data operations module
//!
//! This module provides:
//! - DataFrame: Apache Arrow-backed columnar table
//! - Series: Single column representation
//! - CSV reading and writing

mod dataframe;
mod error;
pub mod io;
mod series;

pub use dataframe::DataFrame;
pub use error::{DataError, DataResult};
pub use io::{read_csv, to_csv_bytes, write_csv, write_csv_to};
pub use series::Series;
