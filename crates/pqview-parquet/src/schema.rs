//! Mapping between table columns and Arrow fields.

use arrow_schema::{DataType, Field, Schema, TimeUnit};

use pqview_core::Table;
use pqview_model::{Column, ColumnType};

use crate::error::{Result, StoreError};

/// Timestamps are always written as UTC microseconds.
pub const TIMESTAMP_ZONE: &str = "UTC";

/// The Arrow type used when writing a column of this type.
pub fn arrow_type(column_type: ColumnType) -> DataType {
    match column_type {
        ColumnType::Integer => DataType::Int64,
        ColumnType::Float => DataType::Float64,
        ColumnType::Boolean => DataType::Boolean,
        ColumnType::String => DataType::Utf8,
        ColumnType::Timestamp => {
            DataType::Timestamp(TimeUnit::Microsecond, Some(TIMESTAMP_ZONE.into()))
        }
        ColumnType::Binary => DataType::Binary,
        ColumnType::Null => DataType::Null,
    }
}

pub fn column_to_field(column: &Column) -> Field {
    Field::new(
        column.name(),
        arrow_type(column.column_type()),
        column.is_nullable(),
    )
}

pub fn table_schema(table: &Table) -> Schema {
    Schema::new(
        table
            .columns()
            .iter()
            .map(column_to_field)
            .collect::<Vec<_>>(),
    )
}

/// The cell type an Arrow type is read as, if any.
pub fn column_type_for(data_type: &DataType) -> Option<ColumnType> {
    match data_type {
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32 => Some(ColumnType::Integer),
        DataType::Float32 | DataType::Float64 => Some(ColumnType::Float),
        DataType::Boolean => Some(ColumnType::Boolean),
        DataType::Utf8 | DataType::LargeUtf8 => Some(ColumnType::String),
        DataType::Timestamp(_, _) => Some(ColumnType::Timestamp),
        DataType::Binary | DataType::LargeBinary => Some(ColumnType::Binary),
        DataType::Null => Some(ColumnType::Null),
        _ => None,
    }
}

pub fn field_to_column(field: &Field) -> Result<Column> {
    let column_type =
        column_type_for(field.data_type()).ok_or_else(|| StoreError::UnsupportedType {
            column: field.name().clone(),
            data_type: field.data_type().to_string(),
        })?;
    Ok(Column::new(
        field.name().clone(),
        column_type,
        field.is_nullable(),
    ))
}
