//! The columnar table.
//!
//! Data is stored column-major: one `Vec<Value>` per column, each exactly
//! `row_count` long. The row count is kept separately so a table whose columns
//! have all been deleted still knows how many rows it has.
//!
//! Mutators are crate-internal and never record history; all user-driven
//! changes go through [`crate::history::History`].

use std::collections::HashSet;

use pqview_model::{Column, ColumnType, Selection, Value, conforms};

use crate::error::{Result, StatsError, TableError};
use crate::stats::{AggregateKind, aggregate};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    columns: Vec<Column>,
    data: Vec<Vec<Value>>,
    rows: usize,
}

impl Table {
    /// An empty table with the given schema.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let data = vec![Vec::new(); columns.len()];
        Self::from_columns(columns, data)
    }

    /// Build a table from column definitions and column-major data.
    ///
    /// Every column must have the same length, names must be unique and
    /// non-empty, and every value must conform to its column.
    pub fn from_columns(columns: Vec<Column>, data: Vec<Vec<Value>>) -> Result<Self> {
        if columns.len() != data.len() {
            return Err(TableError::ArityMismatch {
                expected: columns.len(),
                actual: data.len(),
            });
        }

        let mut seen = HashSet::new();
        for column in &columns {
            if column.name().is_empty() {
                return Err(TableError::InvalidColumnName);
            }
            if !seen.insert(column.name()) {
                return Err(TableError::DuplicateColumn {
                    name: column.name().to_string(),
                });
            }
        }

        let rows = data.first().map_or(0, Vec::len);
        for (column, values) in columns.iter().zip(&data) {
            if values.len() != rows {
                return Err(TableError::RaggedColumn {
                    column: column.name().to_string(),
                    expected: rows,
                    actual: values.len(),
                });
            }
            if let Some(row) = values.iter().position(|v| !conforms(v, column)) {
                return Err(TableError::NonConforming {
                    column: column.name().to_string(),
                    row,
                });
            }
        }

        Ok(Self {
            columns,
            data,
            rows,
        })
    }

    /// Build a table from row-major data.
    pub fn from_rows(columns: Vec<Column>, rows: Vec<Vec<Value>>) -> Result<Self> {
        let mut data: Vec<Vec<Value>> = columns
            .iter()
            .map(|_| Vec::with_capacity(rows.len()))
            .collect();
        for row in rows {
            if row.len() != columns.len() {
                return Err(TableError::ArityMismatch {
                    expected: columns.len(),
                    actual: row.len(),
                });
            }
            for (column_data, value) in data.iter_mut().zip(row) {
                column_data.push(value);
            }
        }
        Self::from_columns(columns, data)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn column(&self, index: usize) -> Result<&Column> {
        self.columns
            .get(index)
            .ok_or_else(|| TableError::column_out_of_bounds(index, self.columns.len()))
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name() == name)
    }

    pub fn column_values(&self, index: usize) -> Result<&[Value]> {
        self.data
            .get(index)
            .map(Vec::as_slice)
            .ok_or_else(|| TableError::column_out_of_bounds(index, self.columns.len()))
    }

    /// Column definitions paired with their data.
    pub fn iter_columns(&self) -> impl Iterator<Item = (&Column, &[Value])> {
        self.columns
            .iter()
            .zip(self.data.iter().map(Vec::as_slice))
    }

    pub fn get(&self, row: usize, column: usize) -> Result<&Value> {
        let values = self.column_values(column)?;
        values
            .get(row)
            .ok_or_else(|| TableError::row_out_of_bounds(row, self.rows))
    }

    /// Clone one row out of the grid.
    pub fn row(&self, index: usize) -> Result<Vec<Value>> {
        self.check_row(index)?;
        Ok(self.data.iter().map(|col| col[index].clone()).collect())
    }

    /// Sum for numeric columns, non-null count for everything else.
    ///
    /// A numeric column without any numeric data totals to zero of its type.
    pub fn column_total(&self, column: usize) -> Result<Value, StatsError> {
        let column_type = self
            .column(column)
            .map_err(|_| StatsError::OutOfBounds { row: 0, column })?
            .column_type();
        let selection = Selection::column(column, self.rows);
        if column_type.is_numeric() {
            match aggregate(self, &selection, AggregateKind::Sum) {
                Ok(total) => Ok(total.value),
                Err(StatsError::NotApplicable { .. }) => Ok(zero_of(column_type)),
                Err(err) => Err(err),
            }
        } else {
            aggregate(self, &selection, AggregateKind::Count).map(|total| total.value)
        }
    }

    pub(crate) fn set_raw(&mut self, row: usize, column: usize, value: Value) -> Result<Value> {
        self.get(row, column)?;
        Ok(std::mem::replace(&mut self.data[column][row], value))
    }

    pub(crate) fn insert_row(&mut self, index: usize, values: Vec<Value>) -> Result<()> {
        if index > self.rows {
            return Err(TableError::row_out_of_bounds(index, self.rows));
        }
        self.check_arity(values.len())?;
        for (column_data, value) in self.data.iter_mut().zip(values) {
            column_data.insert(index, value);
        }
        self.rows += 1;
        Ok(())
    }

    pub(crate) fn delete_row(&mut self, index: usize) -> Result<Vec<Value>> {
        self.check_row(index)?;
        let removed = self
            .data
            .iter_mut()
            .map(|column_data| column_data.remove(index))
            .collect();
        self.rows -= 1;
        Ok(removed)
    }

    pub(crate) fn insert_column(&mut self, index: usize, column: Column, fill: Value) -> Result<()> {
        let values = vec![fill; self.rows];
        self.insert_column_values(index, column, values)
    }

    pub(crate) fn insert_column_values(
        &mut self,
        index: usize,
        column: Column,
        values: Vec<Value>,
    ) -> Result<()> {
        if index > self.columns.len() {
            return Err(TableError::column_out_of_bounds(index, self.columns.len()));
        }
        self.check_name(column.name(), None)?;
        if values.len() != self.rows {
            return Err(TableError::RaggedColumn {
                column: column.name().to_string(),
                expected: self.rows,
                actual: values.len(),
            });
        }
        self.columns.insert(index, column);
        self.data.insert(index, values);
        Ok(())
    }

    pub(crate) fn delete_column(&mut self, index: usize) -> Result<(Column, Vec<Value>)> {
        self.column(index)?;
        Ok((self.columns.remove(index), self.data.remove(index)))
    }

    /// Returns the previous name.
    pub(crate) fn rename_column(&mut self, index: usize, name: &str) -> Result<String> {
        let current = self.column(index)?;
        self.check_name(name, Some(index))?;
        let renamed = current.with_name(name);
        let old = std::mem::replace(&mut self.columns[index], renamed);
        Ok(old.name().to_string())
    }

    /// Swap a column's definition and data wholesale, returning the old pair.
    pub(crate) fn replace_column(
        &mut self,
        index: usize,
        column: Column,
        values: Vec<Value>,
    ) -> Result<(Column, Vec<Value>)> {
        self.column(index)?;
        self.check_name(column.name(), Some(index))?;
        if values.len() != self.rows {
            return Err(TableError::RaggedColumn {
                column: column.name().to_string(),
                expected: self.rows,
                actual: values.len(),
            });
        }
        let old_column = std::mem::replace(&mut self.columns[index], column);
        let old_values = std::mem::replace(&mut self.data[index], values);
        Ok((old_column, old_values))
    }

    fn check_row(&self, index: usize) -> Result<()> {
        if index < self.rows {
            Ok(())
        } else {
            Err(TableError::row_out_of_bounds(index, self.rows))
        }
    }

    fn check_arity(&self, actual: usize) -> Result<()> {
        if actual == self.columns.len() {
            Ok(())
        } else {
            Err(TableError::ArityMismatch {
                expected: self.columns.len(),
                actual,
            })
        }
    }

    fn check_name(&self, name: &str, skip: Option<usize>) -> Result<()> {
        if name.is_empty() {
            return Err(TableError::InvalidColumnName);
        }
        let clash = self
            .columns
            .iter()
            .enumerate()
            .any(|(i, c)| Some(i) != skip && c.name() == name);
        if clash {
            return Err(TableError::DuplicateColumn {
                name: name.to_string(),
            });
        }
        Ok(())
    }
}

fn zero_of(column_type: ColumnType) -> Value {
    match column_type {
        ColumnType::Float => Value::Float(0.0),
        _ => Value::Integer(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::from_rows(
            vec![
                Column::required("id", ColumnType::Integer),
                Column::nullable("name", ColumnType::String),
            ],
            vec![
                vec![Value::Integer(1), Value::from("a")],
                vec![Value::Integer(2), Value::Null],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_from_rows_transposes() {
        let table = sample();
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.get(1, 0), Ok(&Value::Integer(2)));
        assert_eq!(table.row(0).unwrap(), vec![Value::Integer(1), Value::from("a")]);
    }

    #[test]
    fn test_from_columns_rejects_bad_input() {
        let id = Column::required("id", ColumnType::Integer);
        assert_eq!(
            Table::from_columns(vec![id.clone(), id.clone()], vec![vec![], vec![]]),
            Err(TableError::DuplicateColumn { name: "id".into() })
        );
        assert!(matches!(
            Table::from_columns(
                vec![id.clone(), id.with_name("other")],
                vec![vec![Value::Integer(1)], vec![]]
            ),
            Err(TableError::RaggedColumn { .. })
        ));
        assert_eq!(
            Table::from_columns(vec![id], vec![vec![Value::Null]]),
            Err(TableError::NonConforming {
                column: "id".into(),
                row: 0
            })
        );
    }

    #[test]
    fn test_get_out_of_bounds() {
        let table = sample();
        assert_eq!(table.get(2, 0), Err(TableError::row_out_of_bounds(2, 2)));
        assert_eq!(table.get(0, 5), Err(TableError::column_out_of_bounds(5, 2)));
    }

    #[test]
    fn test_insert_and_delete_row_shift() {
        let mut table = sample();
        table
            .insert_row(1, vec![Value::Integer(9), Value::from("z")])
            .unwrap();
        assert_eq!(table.get(1, 0), Ok(&Value::Integer(9)));
        assert_eq!(table.get(2, 0), Ok(&Value::Integer(2)));

        let removed = table.delete_row(0).unwrap();
        assert_eq!(removed, vec![Value::Integer(1), Value::from("a")]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(
            table.insert_row(5, vec![Value::Integer(0), Value::Null]),
            Err(TableError::row_out_of_bounds(5, 2))
        );
        assert_eq!(
            table.insert_row(0, vec![Value::Integer(0)]),
            Err(TableError::ArityMismatch {
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn test_row_count_survives_deleting_every_column() {
        let mut table = sample();
        table.delete_column(1).unwrap();
        table.delete_column(0).unwrap();
        assert_eq!(table.column_count(), 0);
        assert_eq!(table.row_count(), 2);
        table
            .insert_column(0, Column::nullable("x", ColumnType::Float), Value::Null)
            .unwrap();
        assert_eq!(table.column_values(0).unwrap().len(), 2);
    }

    #[test]
    fn test_rename_rejects_duplicates() {
        let mut table = sample();
        assert_eq!(
            table.rename_column(1, "id"),
            Err(TableError::DuplicateColumn { name: "id".into() })
        );
        assert_eq!(table.rename_column(1, "name"), Ok("name".to_string()));
        assert_eq!(table.rename_column(1, ""), Err(TableError::InvalidColumnName));
    }

    #[test]
    fn test_column_total() {
        let table = sample();
        assert_eq!(table.column_total(0), Ok(Value::Integer(3)));
        assert_eq!(table.column_total(1), Ok(Value::Integer(1)));

        let empty = Table::new(vec![Column::nullable("f", ColumnType::Float)]).unwrap();
        assert_eq!(empty.column_total(0), Ok(Value::Float(0.0)));
    }
}
