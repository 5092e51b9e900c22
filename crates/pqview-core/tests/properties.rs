// Property-based tests for the edit history.
// Case count can be raised with PROPTEST_CASES.

use std::collections::HashSet;

use pqview_core::{Session, Table};
use pqview_model::{Column, ColumnType, Value, conforms};
use proptest::prelude::*;

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(128),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

fn base_table() -> Table {
    Table::from_rows(
        vec![
            Column::required("id", ColumnType::Integer),
            Column::nullable("name", ColumnType::String),
            Column::nullable("score", ColumnType::Float),
        ],
        vec![
            vec![Value::Integer(1), Value::from("ann"), Value::Float(1.5)],
            vec![Value::Integer(2), Value::Null, Value::Null],
            vec![Value::Integer(3), Value::from("7"), Value::Float(-4.0)],
        ],
    )
    .unwrap()
}

#[derive(Debug, Clone)]
enum Op {
    Set(usize, usize, String),
    InsertRow(usize),
    DeleteRow(usize),
    InsertColumn(usize, String, ColumnType, bool),
    DeleteColumn(usize),
    Rename(usize, String),
    Retype(usize, ColumnType),
    Paste(usize, usize, Vec<Vec<String>>),
}

fn arb_text() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => r"-?[0-9]{1,4}(\.[0-9]{1,2})?",
        2 => r"[a-z]{0,5}",
        1 => Just(String::new()),
        1 => prop::sample::select(vec!["true", "no", "2024-01-31", "0xff"]).prop_map(String::from),
    ]
}

fn arb_name() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["id", "name", "x", "y", "z"]).prop_map(String::from)
}

fn arb_type() -> impl Strategy<Value = ColumnType> {
    prop::sample::select(ColumnType::ALL.to_vec())
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0..5usize, 0..5usize, arb_text()).prop_map(|(r, c, t)| Op::Set(r, c, t)),
        2 => (0..5usize).prop_map(Op::InsertRow),
        2 => (0..5usize).prop_map(Op::DeleteRow),
        1 => (0..5usize, arb_name(), arb_type(), any::<bool>())
            .prop_map(|(i, n, t, nullable)| Op::InsertColumn(i, n, t, nullable)),
        1 => (0..5usize).prop_map(Op::DeleteColumn),
        1 => (0..5usize, arb_name()).prop_map(|(i, n)| Op::Rename(i, n)),
        1 => (0..5usize, arb_type()).prop_map(|(i, t)| Op::Retype(i, t)),
        1 => (0..4usize, 0..4usize, prop::collection::vec(prop::collection::vec(arb_text(), 1..3), 1..3))
            .prop_map(|(r, c, grid)| Op::Paste(r, c, grid)),
    ]
}

fn apply(session: &mut Session, op: Op) -> Result<(), pqview_core::EditError> {
    match op {
        Op::Set(r, c, text) => session.request_set_cell(r, c, &text),
        Op::InsertRow(i) => session.request_insert_row(i, Vec::new()),
        Op::DeleteRow(i) => session.request_delete_row(i),
        Op::InsertColumn(i, name, ty, nullable) => {
            session.request_insert_column(i, Column::new(name, ty, nullable), None)
        }
        Op::DeleteColumn(i) => session.request_delete_column(i),
        Op::Rename(i, name) => session.request_rename_column(i, &name),
        Op::Retype(i, ty) => session.request_retype_column(i, ty),
        Op::Paste(r, c, grid) => session.request_paste(r, c, &grid),
    }
}

fn check_consistent(table: &Table) -> Result<(), TestCaseError> {
    let mut names = HashSet::new();
    for (index, column) in table.columns().iter().enumerate() {
        prop_assert!(names.insert(column.name().to_string()), "duplicate column");
        let values = table.column_values(index).unwrap();
        prop_assert_eq!(values.len(), table.row_count());
        prop_assert!(values.iter().all(|v| conforms(v, column)));
    }
    Ok(())
}

proptest! {
    #![proptest_config(config())]

    #[test]
    fn undo_all_then_redo_all_replays_every_state(ops in prop::collection::vec(arb_op(), 1..24)) {
        let mut session = Session::new(base_table());
        let mut states = vec![session.table().clone()];

        for op in ops {
            let before = session.table().clone();
            match apply(&mut session, op) {
                Ok(()) => states.push(session.table().clone()),
                // Rejected edits must leave the table exactly as it was.
                Err(_) => prop_assert_eq!(session.table(), &before),
            }
            check_consistent(session.table())?;
        }

        for expected in states.iter().rev().skip(1) {
            session.undo().unwrap();
            prop_assert_eq!(session.table(), expected);
            check_consistent(session.table())?;
        }
        prop_assert!(session.undo().is_err());
        prop_assert!(!session.is_dirty());

        for expected in states.iter().skip(1) {
            session.redo().unwrap();
            prop_assert_eq!(session.table(), expected);
        }
        prop_assert!(session.redo().is_err());
    }

    #[test]
    fn new_edit_after_undo_discards_redo(ops in prop::collection::vec(arb_op(), 1..12)) {
        let mut session = Session::new(base_table());
        for op in ops {
            let _ = apply(&mut session, op);
        }
        if session.can_undo() {
            session.undo().unwrap();
            prop_assert!(session.can_redo());
            // Appending a row is always valid.
            let rows = session.table().row_count();
            session.request_insert_row(rows, Vec::new()).unwrap();
            prop_assert!(!session.can_redo());
        }
    }
}
