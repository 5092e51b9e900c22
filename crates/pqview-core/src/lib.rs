//! In-memory tabular edit engine.
//!
//! - [`Table`]: typed, column-major grid with structural invariants.
//! - [`Validator`]: the gate every written value passes through.
//! - [`History`]: reversible commands with multi-level undo/redo.
//! - [`aggregate`]: read-only statistics over a [`Selection`](pqview_model::Selection).
//! - [`Session`]: a table, its history and validator travelling together.

pub mod error;
pub mod history;
pub mod session;
pub mod stats;
pub mod table;
pub mod validate;
pub mod view;

pub use error::{Axis, EditError, StatsError, TableError};
pub use history::{Command, Edit, History};
pub use session::Session;
pub use stats::{Aggregate, AggregateKind, aggregate};
pub use table::Table;
pub use validate::Validator;
pub use view::{Filter, FilterOp, SortKey, filter_rows, sort_rows};
