//! Schema and value model for the pqview table engine.
//!
//! This crate defines the closed set of column types, the tagged cell value,
//! selections over a grid, and the coercion whitelist that decides which
//! conversions between cell types are allowed.
//!
//! # Example
//!
//! ```
//! use pqview_model::{CoercionPolicy, Column, ColumnType, Value, conforms};
//!
//! let score = Column::nullable("score", ColumnType::Float);
//! assert!(conforms(&Value::Float(9.5), &score));
//! assert!(conforms(&Value::Null, &score));
//!
//! let policy = CoercionPolicy::default();
//! let coerced = policy.coerce(&Value::from("9.5"), ColumnType::Float).unwrap();
//! assert_eq!(coerced, Value::Float(9.5));
//! ```

mod coercion;
mod column;
mod error;
mod selection;
mod value;

pub use coercion::{CoercionPolicy, CoercionRule, parse_timestamp_micros};
pub use column::{Column, ColumnType};
pub use error::{MismatchReason, ValidationError};
pub use selection::{CellRef, Selection};
pub use value::{Value, conforms, format_timestamp};
