//! DataFrame: A columnar data structure backed by Apache Arrow

use std::fmt;
use std::sync::Arc;

use arrow::array::{Array, BooleanArray, Float64Array, RecordBatch};
use arrow::compute::{concat_batches, filter_record_batch};
use arrow::datatypes::{Field, Schema, SchemaRef};

use super::error::{DataError, DataResult};
use super::series::Series;

/// A DataFrame is a two-dimensional, column-oriented data structure
/// backed by Apache Arrow.
#[derive(Clone)]
pub struct DataFrame {
    /// The Arrow schema (column names and types)
    schema: SchemaRef,
    /// The data as Arrow RecordBatches
    batches: Vec<RecordBatch>,
}

impl DataFrame {
    /// Create an empty DataFrame with a schema
    #[must_use]
    pub fn empty(schema: SchemaRef) -> Self {
        Self {
            schema,
            batches: Vec::new(),
        }
    }

    /// Create a DataFrame from a single RecordBatch
    #[must_use]
    pub fn from_batch(batch: RecordBatch) -> Self {
        let schema = batch.schema();
        Self {
            schema,
            batches: vec![batch],
        }
    }

    /// Create a DataFrame from multiple RecordBatches
    ///
    /// # Errors
    /// Returns error if batches have incompatible schemas
    pub fn from_batches(schema: SchemaRef, batches: Vec<RecordBatch>) -> DataResult<Self> {
        for (i, batch) in batches.iter().enumerate() {
            if batch.schema() != schema {
                return Err(DataError::Arrow(format!(
                    "batch {i} has incompatible schema"
                )));
            }
        }
        Ok(Self { schema, batches })
    }

    /// Create a DataFrame from a vector of Series
    ///
    /// # Errors
    /// Returns error if series have different lengths or duplicate names
    pub fn from_series(columns: Vec<Series>) -> DataResult<Self> {
        if columns.is_empty() {
            let schema = Arc::new(Schema::empty());
            return Ok(Self::empty(schema));
        }

        let len = columns[0].len();
        for (i, col) in columns.iter().enumerate() {
            if col.len() != len {
                return Err(DataError::LengthMismatch {
                    column: col.name().to_string(),
                    expected: len,
                    found: col.len(),
                });
            }
            if columns[..i].iter().any(|other| other.name() == col.name()) {
                return Err(DataError::DuplicateColumn(col.name().to_string()));
            }
        }

        let fields: Vec<Field> = columns
            .iter()
            .map(|s| Field::new(s.name(), s.data_type().clone(), true))
            .collect();

        let schema = Arc::new(Schema::new(fields));

        let arrays: Vec<_> = columns.iter().map(|s| s.array().clone()).collect();

        let batch = RecordBatch::try_new(schema.clone(), arrays)?;

        Ok(Self {
            schema,
            batches: vec![batch],
        })
    }

    /// Get the schema
    #[must_use]
    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    /// Get column names
    #[must_use]
    pub fn columns(&self) -> Vec<String> {
        self.schema
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect()
    }

    /// Names of columns with a numeric Arrow type, in schema order
    #[must_use]
    pub fn numeric_columns(&self) -> Vec<String> {
        self.schema
            .fields()
            .iter()
            .filter(|f| f.data_type().is_numeric())
            .map(|f| f.name().clone())
            .collect()
    }

    /// Check whether a column exists
    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.schema.index_of(name).is_ok()
    }

    /// Get the number of columns
    #[must_use]
    pub fn num_columns(&self) -> usize {
        self.schema.fields().len()
    }

    /// Get the number of rows
    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.batches.iter().map(RecordBatch::num_rows).sum()
    }

    /// Check if the DataFrame has no rows
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }

    /// Get the underlying record batches
    #[must_use]
    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    /// Get a column by name as a Series
    ///
    /// # Errors
    /// Returns error if column not found
    pub fn column(&self, name: &str) -> DataResult<Series> {
        let idx = self
            .schema
            .index_of(name)
            .map_err(|_| DataError::ColumnNotFound(name.to_string()))?;
        self.column_by_index(idx)
    }

    /// Get a column by index as a Series
    ///
    /// # Errors
    /// Returns error if the column cannot be assembled from the batches
    pub fn column_by_index(&self, index: usize) -> DataResult<Series> {
        if index >= self.num_columns() {
            return Err(DataError::ColumnNotFound(format!("#{index}")));
        }

        let field = self.schema.field(index);
        let name = field.name().clone();

        if self.batches.is_empty() {
            let array = arrow::array::new_empty_array(field.data_type());
            return Ok(Series::new(name, array));
        }

        if self.batches.len() == 1 {
            let array = self.batches[0].column(index).clone();
            return Ok(Series::new(name, array));
        }

        let arrays: Vec<&dyn Array> = self
            .batches
            .iter()
            .map(|b| b.column(index).as_ref())
            .collect();
        let concatenated = arrow::compute::concat(&arrays)?;
        Ok(Series::new(name, concatenated))
    }

    /// Iterate over all columns as Series
    pub fn iter_columns(&self) -> impl Iterator<Item = DataResult<Series>> + '_ {
        (0..self.num_columns()).map(move |i| self.column_by_index(i))
    }

    /// Merge all batches into one RecordBatch
    ///
    /// # Errors
    /// Returns error if concatenation fails
    pub fn to_record_batch(&self) -> DataResult<RecordBatch> {
        Ok(concat_batches(&self.schema, &self.batches)?)
    }

    /// Select specific columns by name, in the given order
    ///
    /// # Errors
    /// Returns error if any column is not found
    pub fn select(&self, columns: &[&str]) -> DataResult<Self> {
        let series: Result<Vec<_>, _> = columns.iter().map(|name| self.column(name)).collect();
        DataFrame::from_series(series?)
    }

    /// Drop columns by name; unknown names are ignored
    ///
    /// # Errors
    /// Returns error if resulting DataFrame has no columns
    pub fn drop(&self, columns: &[&str]) -> DataResult<Self> {
        let all_columns = self.columns();
        let keep: Vec<&str> = all_columns
            .iter()
            .filter(|name| !columns.contains(&name.as_str()))
            .map(String::as_str)
            .collect();

        if keep.is_empty() {
            return Err(DataError::EmptyData);
        }

        self.select(&keep)
    }

    /// Add a new column from a Series
    ///
    /// The Series must have the same length as the DataFrame, unless the
    /// DataFrame has no columns yet.
    ///
    /// # Errors
    /// Returns error if the name is taken or the length differs
    pub fn add_column(&self, series: Series) -> DataResult<Self> {
        if self.has_column(series.name()) {
            return Err(DataError::DuplicateColumn(series.name().to_string()));
        }

        if self.num_columns() > 0 && series.len() != self.num_rows() {
            return Err(DataError::LengthMismatch {
                column: series.name().to_string(),
                expected: self.num_rows(),
                found: series.len(),
            });
        }

        let mut columns: Vec<Series> = self.iter_columns().collect::<DataResult<Vec<_>>>()?;
        columns.push(series);

        DataFrame::from_series(columns)
    }

    /// Keep rows where the mask is true; null mask entries drop the row
    ///
    /// # Errors
    /// Returns error if the mask length differs from the row count
    pub fn filter(&self, mask: &BooleanArray) -> DataResult<Self> {
        if mask.len() != self.num_rows() {
            return Err(DataError::LengthMismatch {
                column: "<filter mask>".to_string(),
                expected: self.num_rows(),
                found: mask.len(),
            });
        }
        let batch = self.to_record_batch()?;
        let filtered = filter_record_batch(&batch, mask)?;
        Ok(Self::from_batch(filtered))
    }

    /// Drop rows with a missing value in any of the specified columns
    ///
    /// Nulls are missing, and so is NaN in a float column.
    ///
    /// # Errors
    /// Returns error if any column is not found
    pub fn dropna_columns(&self, columns: &[&str]) -> DataResult<Self> {
        let check_series: Vec<Series> = columns
            .iter()
            .map(|name| self.column(name))
            .collect::<DataResult<Vec<_>>>()?;
        let floats: Vec<Float64Array> = check_series
            .iter()
            .filter(|s| s.data_type().is_floating())
            .map(Series::to_float64)
            .collect::<DataResult<Vec<_>>>()?;

        let mask: BooleanArray = (0..self.num_rows())
            .map(|row| {
                Some(
                    check_series.iter().all(|s| !s.is_null(row))
                        && floats.iter().all(|f| f.is_null(row) || !f.value(row).is_nan()),
                )
            })
            .collect();

        if mask.true_count() == self.num_rows() {
            return Ok(self.clone());
        }
        self.filter(&mask)
    }

    /// Render the first `max_rows` rows as an ASCII table
    #[must_use]
    pub fn to_pretty_string(&self, max_rows: usize) -> String {
        let batch = match self.to_record_batch() {
            Ok(batch) => batch,
            Err(e) => return format!("<unprintable DataFrame: {e}>"),
        };
        let head = batch.slice(0, max_rows.min(batch.num_rows()));
        match arrow::util::pretty::pretty_format_batches(&[head]) {
            Ok(table) => table.to_string(),
            Err(e) => format!("<unprintable DataFrame: {e}>"),
        }
    }
}

impl fmt::Debug for DataFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataFrame")
            .field("columns", &self.columns())
            .field("rows", &self.num_rows())
            .field("batches", &self.batches.len())
            .finish()
    }
}

impl fmt::Display for DataFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_pretty_string(20))
    }
}
