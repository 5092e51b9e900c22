//! Polars interop for exporting tables.

use std::fs::File;
use std::path::Path;

use polars::prelude::{
    Column as FrameColumn, CsvWriter, DataFrame, DataType, IntoColumn, NamedFrom, PolarsResult,
    SerWriter, Series, TimeUnit,
};

use pqview_core::Table;
use pqview_model::{Column, ColumnType, Value};

use crate::error::{Result, StoreError};

/// Convert a table into a Polars DataFrame.
///
/// Binary cells become `0x`-prefixed hex strings; timestamps become
/// microsecond datetimes.
pub fn table_to_dataframe(table: &Table) -> PolarsResult<DataFrame> {
    let columns = table
        .iter_columns()
        .map(|(column, values)| to_frame_column(column, values))
        .collect::<PolarsResult<Vec<_>>>()?;
    DataFrame::new(columns)
}

fn to_frame_column(column: &Column, values: &[Value]) -> PolarsResult<FrameColumn> {
    let name = column.name().into();
    let series = match column.column_type() {
        ColumnType::Integer => Series::new(
            name,
            values
                .iter()
                .map(|v| match v {
                    Value::Integer(x) => Some(*x),
                    _ => None,
                })
                .collect::<Vec<_>>(),
        ),
        ColumnType::Float => Series::new(
            name,
            values
                .iter()
                .map(|v| match v {
                    Value::Float(x) => Some(*x),
                    _ => None,
                })
                .collect::<Vec<_>>(),
        ),
        ColumnType::Boolean => Series::new(
            name,
            values
                .iter()
                .map(|v| match v {
                    Value::Boolean(x) => Some(*x),
                    _ => None,
                })
                .collect::<Vec<_>>(),
        ),
        ColumnType::String => Series::new(
            name,
            values.iter().map(Value::as_str).collect::<Vec<_>>(),
        ),
        ColumnType::Timestamp => Series::new(
            name,
            values
                .iter()
                .map(|v| match v {
                    Value::Timestamp(x) => Some(*x),
                    _ => None,
                })
                .collect::<Vec<_>>(),
        )
        .cast(&DataType::Datetime(TimeUnit::Microseconds, None))?,
        ColumnType::Binary => Series::new(
            name,
            values
                .iter()
                .map(|v| (!v.is_null()).then(|| v.to_string()))
                .collect::<Vec<_>>(),
        ),
        ColumnType::Null => Series::full_null(name, values.len(), &DataType::Null),
    };
    Ok(series.into_column())
}

/// Export a table as CSV with a header row.
pub fn write_csv(table: &Table, path: &Path) -> Result<()> {
    let mut frame = table_to_dataframe(table).map_err(StoreError::encode)?;
    let mut file = File::create(path).map_err(|e| StoreError::Io {
        operation: "create",
        path: path.to_path_buf(),
        source: e,
    })?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut frame)
        .map_err(StoreError::encode)?;
    tracing::info!(
        path = %path.display(),
        rows = table.row_count(),
        "Exported CSV"
    );
    Ok(())
}
