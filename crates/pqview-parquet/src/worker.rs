//! Background load and save.

use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};

use pqview_core::Table;

use crate::cancel::CancelToken;
use crate::error::{Result, StoreError};
use crate::reader::{ParquetReadOptions, read_parquet, read_parquet_with};
use crate::writer::{ParquetWriteOptions, write_parquet, write_parquet_with};

/// A load or save running on its own thread.
///
/// The result is delivered exactly once, by [`JobHandle::join`].
#[derive(Debug)]
pub struct JobHandle<T> {
    handle: JoinHandle<Result<T>>,
    cancel: CancelToken,
    /// Drop a finished result if the job was cancelled before it was joined.
    discard_on_cancel: bool,
}

impl<T> JobHandle<T> {
    /// Ask the job to stop at its next checkpoint.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the job and take its result.
    ///
    /// A cancelled load yields `Cancelled` even if the worker had already
    /// finished reading. A save that already committed still reports success.
    pub fn join(self) -> Result<T> {
        let result = self.handle.join().map_err(|_| StoreError::WorkerLost)?;
        if self.discard_on_cancel && self.cancel.is_cancelled() {
            return Err(StoreError::Cancelled);
        }
        result
    }
}

fn spawn_job<T, F>(
    name: &str,
    path: &Path,
    discard_on_cancel: bool,
    job: F,
) -> Result<JobHandle<T>>
where
    T: Send + 'static,
    F: FnOnce(CancelToken) -> Result<T> + Send + 'static,
{
    let cancel = CancelToken::new();
    let token = cancel.clone();
    let handle = thread::Builder::new()
        .name(name.to_string())
        .spawn(move || job(token))
        .map_err(|e| StoreError::Io {
            operation: "start worker for",
            path: path.to_path_buf(),
            source: e,
        })?;
    Ok(JobHandle {
        handle,
        cancel,
        discard_on_cancel,
    })
}

/// Load a table on a worker thread.
pub fn spawn_load(path: PathBuf) -> Result<JobHandle<Table>> {
    let target = path.clone();
    spawn_job("pqview-load", &target, true, move |cancel| {
        read_parquet_with(&path, &ParquetReadOptions::default(), &cancel)
    })
}

/// Save a table on a worker thread. The table is moved to the worker.
pub fn spawn_save(path: PathBuf, table: Table) -> Result<JobHandle<()>> {
    let target = path.clone();
    spawn_job("pqview-save", &target, false, move |cancel| {
        write_parquet_with(&path, &table, &ParquetWriteOptions::default(), &cancel)
    })
}

/// Load on tokio's blocking pool.
pub async fn read_parquet_async(path: PathBuf) -> Result<Table> {
    tokio::task::spawn_blocking(move || read_parquet(&path))
        .await
        .map_err(|_| StoreError::WorkerLost)?
}

/// Save on tokio's blocking pool.
pub async fn write_parquet_async(path: PathBuf, table: Table) -> Result<()> {
    tokio::task::spawn_blocking(move || write_parquet(&path, &table))
        .await
        .map_err(|_| StoreError::WorkerLost)?
}
