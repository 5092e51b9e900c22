//! Parquet persistence for pqview tables.
//!
//! Loads a Parquet file into a [`Table`](pqview_core::Table) and saves a table
//! back, preserving column order, names, types, nullability and values.
//!
//! # Features
//!
//! - Arrow-based reader and writer (uncompressed output)
//! - Atomic save through a temp file and rename
//! - Cancellable load and save, on a worker thread or tokio's blocking pool
//! - Optional Polars integration for CSV export (with `polars` feature)
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use pqview_parquet::{read_parquet, write_parquet};
//!
//! let table = read_parquet(Path::new("scores.parquet")).unwrap();
//! println!("{} rows, {} columns", table.row_count(), table.column_count());
//! write_parquet(Path::new("scores_copy.parquet"), &table).unwrap();
//! ```

mod cancel;
mod error;
mod reader;
pub mod schema;
mod worker;
mod writer;

#[cfg(feature = "polars")]
mod polars_ext;

pub use cancel::CancelToken;
pub use error::{Result, StoreError};

pub use reader::{
    ParquetReadOptions, ParquetTableReader, read_parquet, read_parquet_bytes, read_parquet_with,
};
pub use writer::{
    ParquetTableWriter, ParquetWriteOptions, table_to_record_batch, write_parquet,
    write_parquet_bytes, write_parquet_with,
};

pub use worker::{JobHandle, read_parquet_async, spawn_load, spawn_save, write_parquet_async};

#[cfg(feature = "polars")]
pub use polars_ext::{table_to_dataframe, write_csv};
