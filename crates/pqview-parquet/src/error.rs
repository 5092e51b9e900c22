//! Persistence error types.
//!
//! Load and save return structured errors that carry a user-facing message
//! and, where one exists, a hint for fixing the problem.

use std::path::PathBuf;
use thiserror::Error;

/// Load or save failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// File I/O error.
    #[error("Failed to {operation} file: {path}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A column uses an Arrow type with no cell type equivalent.
    #[error("column '{column}' has unsupported type {data_type}")]
    UnsupportedType { column: String, data_type: String },

    /// The data is not a readable Parquet file or breaks table invariants.
    #[error("corrupt Parquet data: {message}")]
    Corrupt { message: String },

    #[error("cannot save a table without columns")]
    EmptySchema,

    #[error("failed to encode Parquet data: {message}")]
    Encode { message: String },

    /// The temp file could not be renamed over the destination.
    #[error("Failed to complete save operation")]
    AtomicWriteFailed {
        temp_path: PathBuf,
        target_path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("operation cancelled")]
    Cancelled,

    /// The worker thread panicked or was dropped without a result.
    #[error("background worker stopped without a result")]
    WorkerLost,
}

impl StoreError {
    /// Create a Corrupt error.
    pub fn corrupt(message: impl ToString) -> Self {
        Self::Corrupt {
            message: message.to_string(),
        }
    }

    /// Create an Encode error.
    pub fn encode(message: impl ToString) -> Self {
        Self::Encode {
            message: message.to_string(),
        }
    }

    /// Get a user-friendly message for this error.
    pub fn user_message(&self) -> String {
        match self {
            Self::FileNotFound { path } => {
                format!("The file {} could not be found.", path.display())
            }
            Self::Io {
                operation, path, ..
            } => {
                format!("Could not {} the file at {}", operation, path.display())
            }
            Self::UnsupportedType { column, data_type } => {
                format!("Column '{column}' uses the type {data_type}, which cannot be edited.")
            }
            Self::Corrupt { .. } => {
                "The file is not a valid Parquet file or is damaged.".to_string()
            }
            Self::EmptySchema => "A table needs at least one column to be saved.".to_string(),
            Self::Encode { .. } => "An error occurred while writing the table data.".to_string(),
            Self::AtomicWriteFailed { target_path, .. } => {
                format!(
                    "Could not save the file to {}. Please check disk space and permissions.",
                    target_path.display()
                )
            }
            Self::Cancelled => "The operation was cancelled.".to_string(),
            Self::WorkerLost => "The background task stopped unexpectedly.".to_string(),
        }
    }

    /// Get a suggestion for how to resolve this error.
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::FileNotFound { .. } => Some("Check the path and try again.".into()),
            Self::Io { operation, .. } => {
                if *operation == "open" || *operation == "read" {
                    Some("Check that the file exists and you have permission to read it.".into())
                } else {
                    Some("Check that you have permission to write to this location.".into())
                }
            }
            Self::EmptySchema => Some("Add a column before saving.".into()),
            Self::AtomicWriteFailed { .. } => {
                Some("Free up disk space or try saving to a different location.".into())
            }
            Self::UnsupportedType { .. }
            | Self::Corrupt { .. }
            | Self::Encode { .. }
            | Self::Cancelled
            | Self::WorkerLost => None,
        }
    }
}

/// Result type alias for persistence operations.
pub type Result<T> = std::result::Result<T, StoreError>;
