use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::value::Value;

/// The closed set of column types a table can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Integer,
    Float,
    Boolean,
    String,
    /// Microseconds since the Unix epoch, UTC.
    Timestamp,
    Binary,
    /// Only ever holds nulls.
    Null,
}

impl ColumnType {
    pub const ALL: [ColumnType; 7] = [
        ColumnType::Integer,
        ColumnType::Float,
        ColumnType::Boolean,
        ColumnType::String,
        ColumnType::Timestamp,
        ColumnType::Binary,
        ColumnType::Null,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::Boolean => "boolean",
            ColumnType::String => "string",
            ColumnType::Timestamp => "timestamp",
            ColumnType::Binary => "binary",
            ColumnType::Null => "null",
        }
    }

    /// Returns true for types the numeric aggregates operate on.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Float)
    }

    /// The value a new non-null cell of this type starts with.
    pub fn default_value(&self) -> Value {
        match self {
            ColumnType::Integer => Value::Integer(0),
            ColumnType::Float => Value::Float(0.0),
            ColumnType::Boolean => Value::Boolean(false),
            ColumnType::String => Value::String(String::new()),
            ColumnType::Timestamp => Value::Timestamp(0),
            ColumnType::Binary => Value::Binary(Vec::new()),
            ColumnType::Null => Value::Null,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnType {
    type Err = String;

    /// Parse a type name, accepting the common aliases used by Parquet tooling.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "integer" | "int" | "int64" | "i64" | "long" => Ok(ColumnType::Integer),
            "float" | "float64" | "f64" | "double" => Ok(ColumnType::Float),
            "boolean" | "bool" => Ok(ColumnType::Boolean),
            "string" | "str" | "text" | "utf8" => Ok(ColumnType::String),
            "timestamp" | "datetime" => Ok(ColumnType::Timestamp),
            "binary" | "bytes" => Ok(ColumnType::Binary),
            "null" => Ok(ColumnType::Null),
            _ => Err(format!("Unknown column type: {}", s)),
        }
    }
}

/// A named, typed column definition.
///
/// Null-only columns are always nullable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Column {
    name: String,
    column_type: ColumnType,
    nullable: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: ColumnType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable: nullable || column_type == ColumnType::Null,
        }
    }

    /// A column that accepts nulls.
    pub fn nullable(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self::new(name, column_type, true)
    }

    /// A column that rejects nulls.
    pub fn required(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self::new(name, column_type, false)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Same column under a different name.
    #[must_use]
    pub fn with_name(&self, name: impl Into<String>) -> Self {
        Self::new(name, self.column_type, self.nullable)
    }

    /// Same column with a different declared type, keeping nullability.
    #[must_use]
    pub fn with_type(&self, column_type: ColumnType) -> Self {
        Self::new(self.name.clone(), column_type, self.nullable)
    }

    /// The value used to fill cells when a row or this column is added without data.
    pub fn default_fill(&self) -> Value {
        if self.nullable {
            Value::Null
        } else {
            self.column_type.default_value()
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.column_type)?;
        if self.nullable {
            f.write_str("?")?;
        }
        Ok(())
    }
}
