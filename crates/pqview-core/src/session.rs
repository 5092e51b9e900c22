//! One open table together with its history and validator.

use pqview_model::{CoercionPolicy, Column, ColumnType, Selection, Value};

use crate::error::{EditError, StatsError, TableError};
use crate::history::{Edit, History};
use crate::stats::{Aggregate, AggregateKind, aggregate};
use crate::table::Table;
use crate::validate::Validator;
use crate::view::{Filter, SortKey, filter_rows, sort_rows};

/// The editing context for one open file.
///
/// All mutations go through the `request_*` methods so they are validated and
/// recorded for undo.
#[derive(Debug, Clone, Default)]
pub struct Session {
    table: Table,
    history: History,
    validator: Validator,
}

impl Session {
    pub fn new(table: Table) -> Self {
        Self {
            table,
            history: History::new(),
            validator: Validator::default(),
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: CoercionPolicy) -> Self {
        self.validator.set_policy(policy);
        self
    }

    /// Limit how many edits can be undone.
    #[must_use]
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history = History::with_limit(limit);
        self
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    pub fn into_table(self) -> Table {
        self.table
    }

    /// Swap in a freshly loaded table. History starts over.
    pub fn replace_table(&mut self, table: Table) {
        self.table = table;
        self.history.clear();
    }

    pub fn execute(&mut self, edit: Edit) -> Result<(), EditError> {
        self.history
            .execute(&mut self.table, &self.validator, edit)
            .map(|_| ())
    }

    /// Set a cell from user-typed text.
    pub fn request_set_cell(&mut self, row: usize, column: usize, raw: &str) -> Result<(), EditError> {
        self.request_set_value(row, column, Value::from(raw))
    }

    pub fn request_set_value(
        &mut self,
        row: usize,
        column: usize,
        value: Value,
    ) -> Result<(), EditError> {
        self.execute(Edit::SetCell { row, column, value })
    }

    /// Insert a row. Missing trailing values take each column's default fill.
    pub fn request_insert_row(&mut self, index: usize, values: Vec<Value>) -> Result<(), EditError> {
        let columns = self.table.columns();
        if values.len() > columns.len() {
            return Err(TableError::ArityMismatch {
                expected: columns.len(),
                actual: values.len(),
            }
            .into());
        }
        let mut values = values;
        values.extend(columns[values.len()..].iter().map(Column::default_fill));
        self.execute(Edit::InsertRow { index, values })
    }

    pub fn request_delete_row(&mut self, index: usize) -> Result<(), EditError> {
        self.execute(Edit::DeleteRow { index })
    }

    /// Insert a column. Existing rows get `fill`, validated against the new
    /// column, or the column's default fill when `fill` is `None`.
    pub fn request_insert_column(
        &mut self,
        index: usize,
        column: Column,
        fill: Option<Value>,
    ) -> Result<(), EditError> {
        self.execute(Edit::InsertColumn {
            index,
            column,
            fill,
        })
    }

    pub fn request_delete_column(&mut self, index: usize) -> Result<(), EditError> {
        self.execute(Edit::DeleteColumn { index })
    }

    pub fn request_rename_column(&mut self, index: usize, name: &str) -> Result<(), EditError> {
        self.execute(Edit::RenameColumn {
            index,
            name: name.to_string(),
        })
    }

    pub fn request_retype_column(
        &mut self,
        index: usize,
        target: ColumnType,
    ) -> Result<(), EditError> {
        self.execute(Edit::RetypeColumn { index, target })
    }

    /// Paste a block of text with its top-left corner at `(top, left)`.
    ///
    /// The whole block is one undoable step; if any cell is rejected nothing changes.
    pub fn request_paste(
        &mut self,
        top: usize,
        left: usize,
        grid: &[Vec<String>],
    ) -> Result<(), EditError> {
        let (rows, columns) = (self.table.row_count(), self.table.column_count());
        let mut edits = Vec::new();
        for (r, line) in grid.iter().enumerate() {
            let row = top
                .checked_add(r)
                .ok_or_else(|| TableError::row_out_of_bounds(top, rows))?;
            for (c, raw) in line.iter().enumerate() {
                let column = left
                    .checked_add(c)
                    .ok_or_else(|| TableError::column_out_of_bounds(left, columns))?;
                edits.push(Edit::SetCell {
                    row,
                    column,
                    value: Value::from(raw.as_str()),
                });
            }
        }
        self.execute(Edit::Composite {
            label: "Paste".to_string(),
            edits,
        })
    }

    pub fn undo(&mut self) -> Result<String, EditError> {
        self.history.undo(&mut self.table)
    }

    pub fn redo(&mut self) -> Result<String, EditError> {
        self.history.redo(&mut self.table)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn mark_saved(&mut self) {
        self.history.mark_saved();
    }

    pub fn is_dirty(&self) -> bool {
        self.history.is_dirty()
    }

    pub fn aggregate(
        &self,
        selection: &Selection,
        kind: AggregateKind,
    ) -> Result<Aggregate, StatsError> {
        aggregate(&self.table, selection, kind)
    }

    pub fn column_total(&self, column: usize) -> Result<Value, StatsError> {
        self.table.column_total(column)
    }

    pub fn sorted_rows(&self, keys: &[SortKey]) -> Result<Vec<usize>, TableError> {
        sort_rows(&self.table, keys)
    }

    pub fn filtered_rows(&self, filters: &[Filter]) -> Result<Vec<usize>, TableError> {
        filter_rows(&self.table, filters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        let table = Table::from_rows(
            vec![
                Column::required("id", ColumnType::Integer),
                Column::nullable("name", ColumnType::String),
            ],
            vec![vec![Value::Integer(1), Value::from("a")]],
        )
        .unwrap();
        Session::new(table)
    }

    #[test]
    fn test_insert_row_pads_missing_values() {
        let mut s = session();
        s.request_insert_row(1, vec![Value::from("5")]).unwrap();
        assert_eq!(s.table().row(1).unwrap(), vec![Value::Integer(5), Value::Null]);

        s.request_insert_row(0, vec![]).unwrap();
        assert_eq!(s.table().row(0).unwrap(), vec![Value::Integer(0), Value::Null]);
    }

    #[test]
    fn test_paste_is_one_step() {
        let mut s = session();
        s.request_insert_row(1, vec![Value::Integer(2)]).unwrap();
        s.request_paste(0, 0, &[vec!["10".into(), "x".into()], vec!["20".into(), "y".into()]])
            .unwrap();
        assert_eq!(s.table().get(1, 1), Ok(&Value::from("y")));
        assert_eq!(s.history().undo_label().as_deref(), Some("Paste"));

        s.undo().unwrap();
        assert_eq!(s.table().get(0, 0), Ok(&Value::Integer(1)));
        assert_eq!(s.table().get(1, 1), Ok(&Value::Null));
    }

    #[test]
    fn test_paste_outside_table_is_rejected() {
        let mut s = session();
        let before = s.table().clone();
        let err = s.request_paste(0, 1, &[vec!["b".into(), "extra".into()]]);
        assert!(matches!(err, Err(EditError::ValidationRejected { .. })));
        assert_eq!(s.table(), &before);
    }

    #[test]
    fn test_paste_anchor_overflow_is_out_of_bounds() {
        let mut s = session();
        let before = s.table().clone();
        let grid = [vec!["x".to_string()], vec!["y".to_string()]];
        assert_eq!(
            s.request_paste(usize::MAX, 0, &grid),
            Err(EditError::Table(TableError::row_out_of_bounds(usize::MAX, 1)))
        );
        assert_eq!(
            s.request_paste(0, usize::MAX, &[vec!["1".into(), "2".into()]]),
            Err(EditError::Table(TableError::column_out_of_bounds(usize::MAX, 2)))
        );
        assert_eq!(s.table(), &before);
        assert!(!s.can_undo());
    }

    #[test]
    fn test_replace_table_resets_history() {
        let mut s = session().with_history_limit(5);
        s.request_set_cell(0, 1, "b").unwrap();
        assert!(s.is_dirty());
        s.replace_table(Table::default());
        assert!(!s.can_undo());
        assert!(!s.is_dirty());
        assert_eq!(s.history().limit(), Some(5));
    }

    #[test]
    fn test_strict_policy_rejects_text() {
        let mut s = session().with_policy(CoercionPolicy::none());
        assert!(matches!(
            s.request_set_cell(0, 0, "2"),
            Err(EditError::Validation(_))
        ));
        s.request_set_value(0, 0, Value::Integer(2)).unwrap();
    }
}
