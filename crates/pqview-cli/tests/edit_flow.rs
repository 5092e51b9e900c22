//! Load, edit through parsed operations, save, reload.

use pqview_cli::ops::{EditOp, FilterSpec, SortSpec, resolve_filters, resolve_sorts};
use pqview_core::{EditError, Session, Table};
use pqview_model::{Column, ColumnType, Value};
use pqview_parquet::{read_parquet, write_parquet};
use tempfile::tempdir;

fn scores() -> Table {
    Table::from_rows(
        vec![
            Column::required("id", ColumnType::Integer),
            Column::nullable("name", ColumnType::String),
            Column::nullable("score", ColumnType::Float),
        ],
        vec![
            vec![Value::Integer(1), Value::from("ada"), Value::Float(9.5)],
            vec![Value::Integer(2), Value::from("bob"), Value::Float(7.0)],
            vec![Value::Integer(3), Value::Null, Value::Float(8.25)],
        ],
    )
    .unwrap()
}

fn apply_all(session: &mut Session, ops: &[&str]) -> anyhow::Result<Vec<String>> {
    ops.iter()
        .map(|op| op.parse::<EditOp>().map_err(anyhow::Error::msg)?.apply(session))
        .collect()
}

#[test]
fn edits_survive_save_and_reload() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("scores.parquet");
    write_parquet(&path, &scores()).unwrap();

    let mut session = Session::new(read_parquet(&path).unwrap());
    let labels = apply_all(
        &mut session,
        &[
            "set 2 name carol",
            "insert-column 3 passed boolean",
            "paste 0 passed true;false;yes",
            "rename score points",
            "delete-row 1",
        ],
    )
    .unwrap();
    assert_eq!(labels[2], "Paste");
    assert!(session.is_dirty());

    write_parquet(&path, session.table()).unwrap();
    let reloaded = read_parquet(&path).unwrap();

    assert_eq!(&reloaded, session.table());
    assert_eq!(reloaded.row_count(), 2);
    assert_eq!(reloaded.column_index("points"), Some(2));
    assert_eq!(reloaded.get(1, 1).unwrap(), &Value::from("carol"));
    assert_eq!(reloaded.get(1, 3).unwrap(), &Value::Boolean(true));
}

#[test]
fn failed_op_leaves_table_untouched() {
    let mut session = Session::new(scores());
    let before = session.table().clone();

    let err = apply_all(&mut session, &["retype name integer"]).unwrap_err();

    assert!(matches!(
        err.downcast_ref::<EditError>(),
        Some(EditError::ValidationRejected { .. })
    ));
    assert_eq!(session.table(), &before);
    assert!(!session.can_undo());
}

#[test]
fn undo_back_to_save_point_is_clean() {
    let mut session = Session::new(scores());
    apply_all(&mut session, &["null 0 score", "delete-column id", "undo", "undo"]).unwrap();
    assert!(!session.is_dirty());
    assert_eq!(session.table(), &scores());

    let labels = apply_all(&mut session, &["redo"]).unwrap();
    assert_eq!(labels, vec!["Redo: Edit cell (0, 2)"]);
}

#[test]
fn sorted_filtered_preview_order() {
    let session = Session::new(scores());
    let sorts: Vec<SortSpec> = vec!["score:desc".parse().unwrap()];
    let filters: Vec<FilterSpec> = vec!["name not null".parse().unwrap()];

    let sorts = resolve_sorts(&sorts, session.table()).unwrap();
    let filters = resolve_filters(&filters, session.table()).unwrap();
    let keep = session.filtered_rows(&filters).unwrap();
    let order: Vec<usize> = session
        .sorted_rows(&sorts)
        .unwrap()
        .into_iter()
        .filter(|row| keep.contains(row))
        .collect();

    assert_eq!(order, vec![0, 1]);
}

#[test]
fn insert_column_with_fill_value() {
    let mut session = Session::new(scores());
    apply_all(&mut session, &["insert-column 1 unit string required kg"]).unwrap();
    assert_eq!(session.table().get(2, 1).unwrap(), &Value::from("kg"));
    assert!(!session.table().column(1).unwrap().is_nullable());

    let before = session.table().clone();
    let err = apply_all(&mut session, &["insert-column 0 rank integer required first"]).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<EditError>(),
        Some(EditError::Validation(_))
    ));
    assert_eq!(session.table(), &before);
}
