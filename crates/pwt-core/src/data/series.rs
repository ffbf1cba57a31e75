//! Series: A single column of data backed by Arrow arrays

use std::fmt;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::compute;
use arrow::datatypes::DataType;

use super::error::{DataError, DataResult};

/// A single column of homogeneous data backed by an Arrow array
#[derive(Clone)]
pub struct Series {
    /// Column name
    name: String,
    /// The underlying Arrow array (reference-counted for zero-copy)
    array: ArrayRef,
}

impl Series {
    /// Create a new Series from an Arrow array
    #[must_use]
    pub fn new(name: impl Into<String>, array: ArrayRef) -> Self {
        Self {
            name: name.into(),
            array,
        }
    }

    /// Create a Series from a vector of integers
    #[must_use]
    pub fn from_ints(name: impl Into<String>, values: Vec<i64>) -> Self {
        let array = Arc::new(Int64Array::from(values)) as ArrayRef;
        Self::new(name, array)
    }

    /// Create a Series from a vector of floats
    #[must_use]
    pub fn from_floats(name: impl Into<String>, values: Vec<f64>) -> Self {
        let array = Arc::new(Float64Array::from(values)) as ArrayRef;
        Self::new(name, array)
    }

    /// Create a Series from optional floats (None becomes null)
    #[must_use]
    pub fn from_optional_floats(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        let array = Arc::new(Float64Array::from(values)) as ArrayRef;
        Self::new(name, array)
    }

    /// Create a Series from optional integers (None becomes null)
    #[must_use]
    pub fn from_optional_ints(name: impl Into<String>, values: Vec<Option<i64>>) -> Self {
        let array = Arc::new(Int64Array::from(values)) as ArrayRef;
        Self::new(name, array)
    }

    /// Create a Series from a vector of strings
    #[must_use]
    pub fn from_strings(name: impl Into<String>, values: Vec<&str>) -> Self {
        let array = Arc::new(StringArray::from(values)) as ArrayRef;
        Self::new(name, array)
    }

    /// Create a Series from optional strings (None becomes null)
    #[must_use]
    pub fn from_optional_strings(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        let array = Arc::new(StringArray::from(values)) as ArrayRef;
        Self::new(name, array)
    }

    /// Get the series name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the number of elements
    #[must_use]
    pub fn len(&self) -> usize {
        self.array.len()
    }

    /// Check if the series is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.array.is_empty()
    }

    /// Get the Arrow data type
    #[must_use]
    pub fn data_type(&self) -> &DataType {
        self.array.data_type()
    }

    /// Get the underlying Arrow array
    #[must_use]
    pub fn array(&self) -> &ArrayRef {
        &self.array
    }

    /// Get the number of null values
    #[must_use]
    pub fn null_count(&self) -> usize {
        self.array.null_count()
    }

    /// Check if the value at an index is null
    #[must_use]
    pub fn is_null(&self, index: usize) -> bool {
        self.array.is_null(index)
    }

    /// Check if this is a numeric series (any integer or float width)
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        self.data_type().is_numeric()
    }

    /// Cast a numeric series to Float64
    ///
    /// # Errors
    /// Returns `TypeMismatch` for non-numeric series
    pub fn to_float64(&self) -> DataResult<Float64Array> {
        if !self.is_numeric() {
            return Err(DataError::TypeMismatch {
                expected: "numeric column".to_string(),
                found: format!("{} ({:?})", self.name, self.data_type()),
            });
        }
        let cast = compute::cast(&self.array, &DataType::Float64)?;
        cast.as_any()
            .downcast_ref::<Float64Array>()
            .cloned()
            .ok_or_else(|| DataError::TypeMismatch {
                expected: "Float64".to_string(),
                found: format!("{:?}", cast.data_type()),
            })
    }

    /// Cast an integer series to Int64
    ///
    /// # Errors
    /// Returns `TypeMismatch` for non-integer series
    pub fn to_int64(&self) -> DataResult<Int64Array> {
        if !self.data_type().is_integer() {
            return Err(DataError::TypeMismatch {
                expected: "integer column".to_string(),
                found: format!("{} ({:?})", self.name, self.data_type()),
            });
        }
        let cast = compute::cast(&self.array, &DataType::Int64)?;
        cast.as_any()
            .downcast_ref::<Int64Array>()
            .cloned()
            .ok_or_else(|| DataError::TypeMismatch {
                expected: "Int64".to_string(),
                found: format!("{:?}", cast.data_type()),
            })
    }

    /// Render every value as an optional string (numbers use their display form)
    ///
    /// # Errors
    /// Returns error if the cast to Utf8 is not supported
    pub fn to_string_values(&self) -> DataResult<Vec<Option<String>>> {
        let cast = compute::cast(&self.array, &DataType::Utf8)?;
        let strings = cast
            .as_any()
            .downcast_ref::<StringArray>()
            .ok_or_else(|| DataError::TypeMismatch {
                expected: "Utf8".to_string(),
                found: format!("{:?}", cast.data_type()),
            })?;
        Ok(strings.iter().map(|v| v.map(str::to_string)).collect())
    }
}

impl fmt::Debug for Series {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Series {{ name: {:?}, dtype: {:?}, len: {} }}",
            self.name,
            self.data_type(),
            self.len()
        )
    }
}
