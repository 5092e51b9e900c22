//! Error types for table, edit and statistics operations.

use std::fmt;
use thiserror::Error;

use pqview_model::ValidationError;

use crate::stats::AggregateKind;

/// Which dimension an index refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Row,
    Column,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Row => f.write_str("row"),
            Axis::Column => f.write_str("column"),
        }
    }
}

/// Structural errors raised by the table itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("{axis} index {index} out of bounds (len {len})")]
    OutOfBounds { axis: Axis, index: usize, len: usize },

    #[error("duplicate column name: {name}")]
    DuplicateColumn { name: String },

    #[error("row has {actual} values, expected {expected}")]
    ArityMismatch { expected: usize, actual: usize },

    #[error("column name must not be empty")]
    InvalidColumnName,

    /// A column's data has a different length from the row count.
    #[error("column '{column}' has {actual} values, expected {expected}")]
    RaggedColumn {
        column: String,
        expected: usize,
        actual: usize,
    },

    /// A value does not match its column's declared type.
    #[error("value at row {row} does not conform to column '{column}'")]
    NonConforming { column: String, row: usize },
}

impl TableError {
    pub fn row_out_of_bounds(index: usize, len: usize) -> Self {
        Self::OutOfBounds {
            axis: Axis::Row,
            index,
            len,
        }
    }

    pub fn column_out_of_bounds(index: usize, len: usize) -> Self {
        Self::OutOfBounds {
            axis: Axis::Column,
            index,
            len,
        }
    }
}

/// Errors from the edit boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A multi-cell edit failed part way and was rolled back as a whole.
    #[error("edit rejected: {reason}")]
    ValidationRejected {
        reason: String,
        #[source]
        source: Box<EditError>,
    },

    #[error("nothing to undo")]
    NothingToUndo,

    #[error("nothing to redo")]
    NothingToRedo,
}

impl EditError {
    /// Create a ValidationRejected error.
    pub fn rejected(reason: impl Into<String>, source: impl Into<EditError>) -> Self {
        Self::ValidationRejected {
            reason: reason.into(),
            source: Box::new(source.into()),
        }
    }
}

/// Errors from the statistics engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatsError {
    #[error("{kind} needs at least one numeric cell")]
    NotApplicable { kind: AggregateKind },

    #[error("cell ({row}, {column}) is outside the table")]
    OutOfBounds { row: usize, column: usize },
}

pub type Result<T, E = TableError> = std::result::Result<T, E>;
