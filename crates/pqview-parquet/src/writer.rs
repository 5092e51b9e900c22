//! Parquet writer.
//!
//! Saving goes through a sibling temp file that is fsynced and then renamed
//! over the destination, so a crash or a failed save never leaves a partial file
//! in place of the original.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use arrow_array::{
    ArrayRef, BinaryArray, BooleanArray, Float64Array, Int64Array, NullArray, RecordBatch,
    StringArray, TimestampMicrosecondArray,
};
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

use pqview_core::Table;
use pqview_model::{Column, ColumnType, Value};

use crate::cancel::CancelToken;
use crate::error::{Result, StoreError};
use crate::schema::{TIMESTAMP_ZONE, table_schema};

/// Writer options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParquetWriteOptions {
    /// Rows handed to the encoder at a time; cancellation is checked in between.
    pub batch_rows: usize,
    /// Maximum rows per row group.
    pub max_row_group_rows: usize,
}

impl Default for ParquetWriteOptions {
    fn default() -> Self {
        Self {
            batch_rows: 8192,
            max_row_group_rows: 1024 * 1024,
        }
    }
}

impl ParquetWriteOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_batch_rows(mut self, rows: usize) -> Self {
        self.batch_rows = rows.max(1);
        self
    }
}

/// Encodes a table as Parquet into any writer.
pub struct ParquetTableWriter<W: Write + Send> {
    writer: W,
    options: ParquetWriteOptions,
    cancel: CancelToken,
}

impl<W: Write + Send> ParquetTableWriter<W> {
    pub fn new(writer: W) -> Self {
        Self::with_options(writer, ParquetWriteOptions::default())
    }

    pub fn with_options(writer: W, options: ParquetWriteOptions) -> Self {
        Self {
            writer,
            options,
            cancel: CancelToken::new(),
        }
    }

    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Encode the whole table and hand back the underlying writer.
    pub fn write_table(self, table: &Table) -> Result<W> {
        if table.column_count() == 0 {
            return Err(StoreError::EmptySchema);
        }
        let batch = table_to_record_batch(table)?;
        let props = WriterProperties::builder()
            .set_compression(Compression::UNCOMPRESSED)
            .set_max_row_group_size(self.options.max_row_group_rows.max(1))
            .build();
        let mut writer = ArrowWriter::try_new(self.writer, batch.schema(), Some(props))
            .map_err(StoreError::encode)?;

        let step = self.options.batch_rows.max(1);
        let mut offset = 0;
        while offset < batch.num_rows() {
            if self.cancel.is_cancelled() {
                return Err(StoreError::Cancelled);
            }
            let len = step.min(batch.num_rows() - offset);
            writer
                .write(&batch.slice(offset, len))
                .map_err(StoreError::encode)?;
            offset += len;
        }

        writer.into_inner().map_err(StoreError::encode)
    }
}

/// Convert a table into a single Arrow record batch.
pub fn table_to_record_batch(table: &Table) -> Result<RecordBatch> {
    let schema = Arc::new(table_schema(table));
    let arrays = table
        .iter_columns()
        .map(|(column, values)| column_array(column, values))
        .collect();
    RecordBatch::try_new(schema, arrays).map_err(StoreError::encode)
}

fn column_array(column: &Column, values: &[Value]) -> ArrayRef {
    match column.column_type() {
        ColumnType::Integer => Arc::new(Int64Array::from_iter(values.iter().map(|v| match v {
            Value::Integer(x) => Some(*x),
            _ => None,
        }))),
        ColumnType::Float => Arc::new(Float64Array::from_iter(values.iter().map(|v| match v {
            Value::Float(x) => Some(*x),
            _ => None,
        }))),
        ColumnType::Boolean => Arc::new(BooleanArray::from_iter(values.iter().map(|v| match v {
            Value::Boolean(x) => Some(*x),
            _ => None,
        }))),
        ColumnType::String => Arc::new(StringArray::from_iter(values.iter().map(Value::as_str))),
        ColumnType::Timestamp => Arc::new(
            TimestampMicrosecondArray::from_iter(values.iter().map(|v| match v {
                Value::Timestamp(x) => Some(*x),
                _ => None,
            }))
            .with_timezone(TIMESTAMP_ZONE),
        ),
        ColumnType::Binary => Arc::new(BinaryArray::from_iter(values.iter().map(|v| match v {
            Value::Binary(bytes) => Some(bytes.as_slice()),
            _ => None,
        }))),
        ColumnType::Null => Arc::new(NullArray::new(values.len())),
    }
}

/// Encode a table to Parquet bytes.
pub fn write_parquet_bytes(table: &Table) -> Result<Vec<u8>> {
    ParquetTableWriter::new(Vec::new()).write_table(table)
}

/// Save a table to `path`, replacing any existing file atomically.
pub fn write_parquet(path: &Path, table: &Table) -> Result<()> {
    write_parquet_with(path, table, &ParquetWriteOptions::default(), &CancelToken::new())
}

/// Save with explicit options and a cancellation token.
///
/// On any failure, including cancellation, the destination is untouched and the
/// temp file is removed.
pub fn write_parquet_with(
    path: &Path,
    table: &Table,
    options: &ParquetWriteOptions,
    cancel: &CancelToken,
) -> Result<()> {
    if table.column_count() == 0 {
        return Err(StoreError::EmptySchema);
    }
    let started = Instant::now();
    let temp_path = temp_path_for(path);

    if let Err(err) = write_then_rename(path, &temp_path, table, options, cancel) {
        if temp_path.exists() {
            let _ = fs::remove_file(&temp_path);
        }
        tracing::warn!(path = %path.display(), error = %err, "Save failed");
        return Err(err);
    }

    tracing::info!(
        path = %path.display(),
        rows = table.row_count(),
        columns = table.column_count(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Saved table"
    );
    Ok(())
}

fn write_then_rename(
    path: &Path,
    temp_path: &Path,
    table: &Table,
    options: &ParquetWriteOptions,
    cancel: &CancelToken,
) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| StoreError::Io {
            operation: "create directory",
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let file = File::create(temp_path).map_err(|e| StoreError::Io {
        operation: "create",
        path: temp_path.to_path_buf(),
        source: e,
    })?;

    let file = ParquetTableWriter::with_options(file, options.clone())
        .with_cancel(cancel.clone())
        .write_table(table)?;

    file.sync_all().map_err(|e| StoreError::Io {
        operation: "sync",
        path: temp_path.to_path_buf(),
        source: e,
    })?;
    drop(file);

    if cancel.is_cancelled() {
        return Err(StoreError::Cancelled);
    }

    fs::rename(temp_path, path).map_err(|e| StoreError::AtomicWriteFailed {
        temp_path: temp_path.to_path_buf(),
        target_path: path.to_path_buf(),
        source: e,
    })
}

/// `data.parquet` is staged as `data.parquet.tmp` in the same directory.
fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("table.parquet"));
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow_array::Array;

    #[test]
    fn test_temp_path_is_sibling() {
        assert_eq!(
            temp_path_for(Path::new("/data/scores.parquet")),
            PathBuf::from("/data/scores.parquet.tmp")
        );
    }

    #[test]
    fn test_empty_schema_rejected() {
        let table = Table::default();
        assert!(matches!(
            write_parquet_bytes(&table),
            Err(StoreError::EmptySchema)
        ));
    }

    #[test]
    fn test_record_batch_carries_nullability() {
        let table = Table::from_rows(
            vec![
                Column::required("id", ColumnType::Integer),
                Column::nullable("when", ColumnType::Timestamp),
            ],
            vec![vec![Value::Integer(1), Value::Null]],
        )
        .unwrap();
        let batch = table_to_record_batch(&table).unwrap();
        assert_eq!(batch.num_rows(), 1);
        assert!(!batch.schema().field(0).is_nullable());
        assert!(batch.schema().field(1).is_nullable());
        assert_eq!(batch.column(1).null_count(), 1);
    }

    #[test]
    fn test_cancelled_writer_stops() {
        let table = Table::from_rows(
            vec![Column::required("id", ColumnType::Integer)],
            vec![vec![Value::Integer(1)]],
        )
        .unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();
        let result = ParquetTableWriter::new(Vec::new())
            .with_cancel(cancel)
            .write_table(&table);
        assert!(matches!(result, Err(StoreError::Cancelled)));
    }
}
