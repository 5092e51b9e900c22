//! Atomic save, cancellation and background workers.

use std::fs;

use pqview_core::Table;
use pqview_model::{Column, ColumnType, Value};
use pqview_parquet::{
    CancelToken, ParquetReadOptions, ParquetWriteOptions, StoreError, read_parquet,
    read_parquet_async, read_parquet_with, spawn_load, spawn_save, write_parquet,
    write_parquet_async, write_parquet_with,
};
use tempfile::tempdir;

fn numbers(n: i64) -> Table {
    Table::from_rows(
        vec![Column::required("n", ColumnType::Integer)],
        (0..n).map(|i| vec![Value::Integer(i)]).collect(),
    )
    .unwrap()
}

fn entries(dir: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn save_replaces_existing_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("data.parquet");

    write_parquet(&path, &numbers(3)).unwrap();
    write_parquet(&path, &numbers(5)).unwrap();

    assert_eq!(read_parquet(&path).unwrap(), numbers(5));
    assert_eq!(entries(dir.path()), vec!["data.parquet"]);
}

#[test]
fn save_creates_missing_parent_directories() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("deeper").join("data.parquet");
    write_parquet(&path, &numbers(1)).unwrap();
    assert!(path.exists());
}

#[test]
fn cancelled_save_leaves_destination_untouched() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("data.parquet");
    write_parquet(&path, &numbers(3)).unwrap();
    let before = fs::read(&path).unwrap();

    let cancel = CancelToken::new();
    cancel.cancel();
    let result = write_parquet_with(&path, &numbers(10), &ParquetWriteOptions::default(), &cancel);

    assert!(matches!(result, Err(StoreError::Cancelled)));
    assert_eq!(fs::read(&path).unwrap(), before);
    assert_eq!(entries(dir.path()), vec!["data.parquet"]);
}

#[test]
fn cancelled_load_returns_no_table() {
    let dir = tempdir().unwrap();
    let cancel = CancelToken::new();
    cancel.cancel();

    for rows in [10, 0] {
        let path = dir.path().join(format!("rows_{rows}.parquet"));
        write_parquet(&path, &numbers(rows)).unwrap();
        let options = ParquetReadOptions { batch_size: 3 };
        assert!(matches!(
            read_parquet_with(&path, &options, &cancel),
            Err(StoreError::Cancelled)
        ));
    }
}

#[test]
fn cancelled_worker_load_never_yields_a_table() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("data.parquet");
    write_parquet(&path, &numbers(50)).unwrap();

    let job = spawn_load(path.clone()).unwrap();
    job.cancel();
    assert!(matches!(job.join(), Err(StoreError::Cancelled)));

    // A finished load is discarded too once cancelled.
    let job = spawn_load(path).unwrap();
    while !job.is_finished() {
        std::thread::yield_now();
    }
    job.cancel();
    assert!(matches!(job.join(), Err(StoreError::Cancelled)));
}

#[test]
fn empty_schema_is_not_saved() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("empty.parquet");
    let result = write_parquet(&path, &Table::default());
    assert!(matches!(result, Err(StoreError::EmptySchema)));
    assert!(!path.exists());
}

#[test]
fn worker_threads_report_once() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("worker.parquet");

    spawn_save(path.clone(), numbers(4)).unwrap().join().unwrap();
    let job = spawn_load(path).unwrap();
    assert_eq!(job.join().unwrap(), numbers(4));
}

#[test]
fn missing_file_from_worker() {
    let dir = tempdir().unwrap();
    let job = spawn_load(dir.path().join("absent.parquet")).unwrap();
    assert!(matches!(job.join(), Err(StoreError::FileNotFound { .. })));
}

#[tokio::test]
async fn async_save_then_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("async.parquet");

    write_parquet_async(path.clone(), numbers(2)).await.unwrap();
    let table = read_parquet_async(path).await.unwrap();
    assert_eq!(table, numbers(2));
}
