//! Validation errors.

use thiserror::Error;

use crate::column::ColumnType;

/// Why a value could not be converted to a column's type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MismatchReason {
    /// No enabled coercion rule covers this pair of types.
    #[error("no conversion allowed")]
    NoRule,

    /// Text did not parse as the target type.
    #[error("cannot parse '{input}'")]
    Unparseable { input: String },

    /// The value parsed but does not fit the target type.
    #[error("'{input}' is out of range")]
    OutOfRange { input: String },

    /// Conversion would lose information.
    #[error("conversion would lose precision")]
    Lossy,
}

/// A value rejected by the type validator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("column '{column}' expects {expected}, got {found}: {reason}")]
    TypeMismatch {
        column: String,
        expected: ColumnType,
        found: ColumnType,
        reason: MismatchReason,
    },

    #[error("column '{column}' does not accept null")]
    NullNotAllowed { column: String },
}

impl ValidationError {
    /// Create a TypeMismatch error.
    pub fn mismatch(
        column: impl Into<String>,
        expected: ColumnType,
        found: ColumnType,
        reason: MismatchReason,
    ) -> Self {
        Self::TypeMismatch {
            column: column.into(),
            expected,
            found,
            reason,
        }
    }

    /// Create a NullNotAllowed error.
    pub fn null_not_allowed(column: impl Into<String>) -> Self {
        Self::NullNotAllowed {
            column: column.into(),
        }
    }

    pub fn column(&self) -> &str {
        match self {
            Self::TypeMismatch { column, .. } | Self::NullNotAllowed { column } => column,
        }
    }
}
