//! CSV I/O for DataFrame
//!
//! Reading is used by the CSV dataset source, writing by the export surface.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use arrow::array::RecordBatch;
use arrow::datatypes::SchemaRef;
use arrow_csv::{ReaderBuilder as CsvReaderBuilder, WriterBuilder as CsvWriterBuilder};

use super::dataframe::DataFrame;
use super::error::{DataError, DataResult};

/// Number of rows sampled when inferring a CSV schema
const SCHEMA_INFERENCE_ROWS: usize = 1000;

/// Read a CSV file with a header row into a DataFrame
///
/// # Errors
/// Returns error if file cannot be read or is not valid CSV
pub fn read_csv<P: AsRef<Path>>(path: P) -> DataResult<DataFrame> {
    let path = path.as_ref();
    let open = || {
        File::open(path)
            .map_err(|e| DataError::Io(format!("failed to open file '{}': {}", path.display(), e)))
    };

    let (schema, _) = arrow_csv::reader::Format::default()
        .with_header(true)
        .infer_schema(BufReader::new(open()?), Some(SCHEMA_INFERENCE_ROWS))
        .map_err(|e| DataError::Csv(format!("failed to infer schema: {e}")))?;

    let schema_ref: SchemaRef = Arc::new(schema);

    let csv_reader = CsvReaderBuilder::new(schema_ref.clone())
        .with_header(true)
        .build(BufReader::new(open()?))
        .map_err(|e| DataError::Csv(format!("failed to build CSV reader: {e}")))?;

    let batches: Vec<RecordBatch> = csv_reader
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| DataError::Csv(format!("failed to read CSV batches: {e}")))?;

    DataFrame::from_batches(schema_ref, batches)
}

/// Write a DataFrame as comma-separated text with a header row
///
/// The header is written even when the DataFrame has no rows. Nulls become
/// empty fields.
///
/// # Errors
/// Returns error if a batch cannot be written
pub fn write_csv_to<W: Write>(df: &DataFrame, writer: W) -> DataResult<()> {
    let batch = df.to_record_batch()?;
    let mut csv_writer = CsvWriterBuilder::new().with_header(true).build(writer);
    csv_writer
        .write(&batch)
        .map_err(|e| DataError::Csv(format!("failed to write batch: {e}")))?;
    Ok(())
}

/// Serialize a DataFrame to UTF-8 CSV bytes
///
/// # Errors
/// Returns error if serialization fails
pub fn to_csv_bytes(df: &DataFrame) -> DataResult<Vec<u8>> {
    let mut buffer = Vec::new();
    write_csv_to(df, &mut buffer)?;
    Ok(buffer)
}

/// Write a DataFrame to a CSV file
///
/// # Errors
/// Returns error if file cannot be written
pub fn write_csv<P: AsRef<Path>>(df: &DataFrame, path: P) -> DataResult<()> {
    let file = File::create(path.as_ref()).map_err(|e| {
        DataError::Io(format!("failed to create file '{}': {}", path.as_ref().display(), e))
    })?;
    let mut writer = BufWriter::new(file);
    write_csv_to(df, &mut writer)?;
    writer.flush()?;
    Ok(())
}
