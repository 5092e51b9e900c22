//! Parquet reader.
//!
//! Reconstructs a [`Table`] from a Parquet file through the Arrow record batch
//! reader. Either the whole table is returned or an error; partial tables are
//! never handed out.

use std::fs::File;
use std::path::Path;
use std::time::Instant;

use arrow_array::cast::AsArray;
use arrow_array::types::{
    Float32Type, Float64Type, Int8Type, Int16Type, Int32Type, Int64Type,
    TimestampMicrosecondType, TimestampMillisecondType, TimestampNanosecondType,
    TimestampSecondType, UInt8Type, UInt16Type, UInt32Type,
};
use arrow_array::{Array, ArrowPrimitiveType};
use arrow_schema::{DataType, TimeUnit};
use bytes::Bytes;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::file::reader::ChunkReader;

use pqview_core::Table;
use pqview_model::{Column, Value};

use crate::cancel::CancelToken;
use crate::error::{Result, StoreError};
use crate::schema::field_to_column;

/// Reader options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParquetReadOptions {
    /// Rows per decoded record batch; cancellation is checked between batches.
    pub batch_size: usize,
}

impl Default for ParquetReadOptions {
    fn default() -> Self {
        Self { batch_size: 8192 }
    }
}

/// Decodes a Parquet source into a table.
pub struct ParquetTableReader<T: ChunkReader + 'static> {
    input: T,
    options: ParquetReadOptions,
    cancel: CancelToken,
}

impl<T: ChunkReader + 'static> ParquetTableReader<T> {
    pub fn new(input: T) -> Self {
        Self::with_options(input, ParquetReadOptions::default())
    }

    pub fn with_options(input: T, options: ParquetReadOptions) -> Self {
        Self {
            input,
            options,
            cancel: CancelToken::new(),
        }
    }

    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn read_table(self) -> Result<Table> {
        let Self {
            input,
            options,
            cancel,
        } = self;
        Self::check_cancelled(&cancel)?;
        let builder =
            ParquetRecordBatchReaderBuilder::try_new(input).map_err(StoreError::corrupt)?;
        let columns = builder
            .schema()
            .fields()
            .iter()
            .map(|field| field_to_column(field))
            .collect::<Result<Vec<Column>>>()?;
        let reader = builder
            .with_batch_size(options.batch_size.max(1))
            .build()
            .map_err(StoreError::corrupt)?;

        let mut data: Vec<Vec<Value>> = vec![Vec::new(); columns.len()];
        for batch in reader {
            Self::check_cancelled(&cancel)?;
            let batch = batch.map_err(StoreError::corrupt)?;
            for ((array, column), values) in batch.columns().iter().zip(&columns).zip(&mut data) {
                append_values(array.as_ref(), column, values)?;
            }
        }
        Self::check_cancelled(&cancel)?;

        assemble(columns, data)
    }

    fn check_cancelled(cancel: &CancelToken) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(StoreError::Cancelled);
        }
        Ok(())
    }
}

impl ParquetTableReader<File> {
    /// Open a Parquet file for reading.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StoreError::FileNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                StoreError::Io {
                    operation: "open",
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;
        Ok(Self::new(file))
    }
}

/// Read a Parquet file from a path.
pub fn read_parquet(path: &Path) -> Result<Table> {
    read_parquet_with(path, &ParquetReadOptions::default(), &CancelToken::new())
}

/// Read with explicit options and a cancellation token.
pub fn read_parquet_with(
    path: &Path,
    options: &ParquetReadOptions,
    cancel: &CancelToken,
) -> Result<Table> {
    let started = Instant::now();
    let reader = ParquetTableReader::open(path)?;
    let table = ParquetTableReader::with_options(reader.input, options.clone())
        .with_cancel(cancel.clone())
        .read_table()?;
    tracing::info!(
        path = %path.display(),
        rows = table.row_count(),
        columns = table.column_count(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Loaded table"
    );
    Ok(table)
}

/// Decode Parquet bytes held in memory.
pub fn read_parquet_bytes(bytes: impl Into<Bytes>) -> Result<Table> {
    ParquetTableReader::new(bytes.into()).read_table()
}

/// Build the table, reporting any broken invariant (duplicate names, nulls in a
/// required column, ragged columns) as corrupt data.
fn assemble(columns: Vec<Column>, data: Vec<Vec<Value>>) -> Result<Table> {
    Table::from_columns(columns, data).map_err(StoreError::corrupt)
}

fn append_values(array: &dyn Array, column: &Column, out: &mut Vec<Value>) -> Result<()> {
    match array.data_type() {
        DataType::Int8 => push_primitive::<Int8Type>(array, out, |v| Ok(Value::Integer(v.into()))),
        DataType::Int16 => {
            push_primitive::<Int16Type>(array, out, |v| Ok(Value::Integer(v.into())))
        }
        DataType::Int32 => {
            push_primitive::<Int32Type>(array, out, |v| Ok(Value::Integer(v.into())))
        }
        DataType::Int64 => push_primitive::<Int64Type>(array, out, |v| Ok(Value::Integer(v))),
        DataType::UInt8 => {
            push_primitive::<UInt8Type>(array, out, |v| Ok(Value::Integer(v.into())))
        }
        DataType::UInt16 => {
            push_primitive::<UInt16Type>(array, out, |v| Ok(Value::Integer(v.into())))
        }
        DataType::UInt32 => {
            push_primitive::<UInt32Type>(array, out, |v| Ok(Value::Integer(v.into())))
        }
        DataType::Float32 => {
            push_primitive::<Float32Type>(array, out, |v| Ok(Value::Float(v.into())))
        }
        DataType::Float64 => push_primitive::<Float64Type>(array, out, |v| Ok(Value::Float(v))),
        DataType::Timestamp(TimeUnit::Second, _) => {
            push_primitive::<TimestampSecondType>(array, out, |v| scaled_timestamp(v, 1_000_000))
        }
        DataType::Timestamp(TimeUnit::Millisecond, _) => {
            push_primitive::<TimestampMillisecondType>(array, out, |v| scaled_timestamp(v, 1_000))
        }
        DataType::Timestamp(TimeUnit::Microsecond, _) => {
            push_primitive::<TimestampMicrosecondType>(array, out, |v| Ok(Value::Timestamp(v)))
        }
        // Sub-microsecond precision is dropped.
        DataType::Timestamp(TimeUnit::Nanosecond, _) => {
            push_primitive::<TimestampNanosecondType>(array, out, |v| {
                Ok(Value::Timestamp(v.div_euclid(1_000)))
            })
        }
        DataType::Boolean => {
            let array = array.as_boolean();
            out.extend(array.iter().map(Value::from));
            Ok(())
        }
        DataType::Utf8 => {
            out.extend(array.as_string::<i32>().iter().map(Value::from));
            Ok(())
        }
        DataType::LargeUtf8 => {
            out.extend(array.as_string::<i64>().iter().map(Value::from));
            Ok(())
        }
        DataType::Binary => {
            out.extend(
                array
                    .as_binary::<i32>()
                    .iter()
                    .map(|v| Value::from(v.map(<[u8]>::to_vec))),
            );
            Ok(())
        }
        DataType::LargeBinary => {
            out.extend(
                array
                    .as_binary::<i64>()
                    .iter()
                    .map(|v| Value::from(v.map(<[u8]>::to_vec))),
            );
            Ok(())
        }
        DataType::Null => {
            out.extend(std::iter::repeat_n(Value::Null, array.len()));
            Ok(())
        }
        other => Err(StoreError::UnsupportedType {
            column: column.name().to_string(),
            data_type: other.to_string(),
        }),
    }
}

fn push_primitive<P: ArrowPrimitiveType>(
    array: &dyn Array,
    out: &mut Vec<Value>,
    convert: impl Fn(P::Native) -> Result<Value>,
) -> Result<()> {
    let array = array.as_primitive::<P>();
    out.reserve(array.len());
    for index in 0..array.len() {
        if array.is_null(index) {
            out.push(Value::Null);
        } else {
            out.push(convert(array.value(index))?);
        }
    }
    Ok(())
}

fn scaled_timestamp(value: i64, factor: i64) -> Result<Value> {
    value
        .checked_mul(factor)
        .map(Value::Timestamp)
        .ok_or_else(|| StoreError::corrupt(format!("timestamp {value} overflows microseconds")))
}
