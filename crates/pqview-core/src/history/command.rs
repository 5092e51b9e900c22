//! Edit requests and the reversible commands they produce.

use pqview_model::{Column, ColumnType, Value};

use crate::error::{EditError, TableError};
use crate::table::Table;
use crate::validate::Validator;

/// A change a caller asks for. Nothing is validated until it is executed.
#[derive(Debug, Clone, PartialEq)]
pub enum Edit {
    SetCell {
        row: usize,
        column: usize,
        value: Value,
    },
    /// `values` must hold one value per column.
    InsertRow {
        index: usize,
        values: Vec<Value>,
    },
    DeleteRow {
        index: usize,
    },
    /// New cells take `fill`, or the column's default when it is `None`.
    InsertColumn {
        index: usize,
        column: Column,
        fill: Option<Value>,
    },
    DeleteColumn {
        index: usize,
    },
    RenameColumn {
        index: usize,
        name: String,
    },
    RetypeColumn {
        index: usize,
        target: ColumnType,
    },
    /// Applied in order as one undoable unit.
    Composite {
        label: String,
        edits: Vec<Edit>,
    },
}

/// An applied edit together with the prior state needed to reverse it.
///
/// Commands hold indices and values, never references into the table.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetCell {
        row: usize,
        column: usize,
        old: Value,
        new: Value,
    },
    InsertRow {
        index: usize,
        values: Vec<Value>,
    },
    DeleteRow {
        index: usize,
        values: Vec<Value>,
    },
    InsertColumn {
        index: usize,
        column: Column,
        values: Vec<Value>,
    },
    DeleteColumn {
        index: usize,
        column: Column,
        values: Vec<Value>,
    },
    RenameColumn {
        index: usize,
        old: String,
        new: String,
    },
    RetypeColumn {
        index: usize,
        old_column: Column,
        old_values: Vec<Value>,
        new_column: Column,
        new_values: Vec<Value>,
    },
    Composite {
        label: String,
        commands: Vec<Command>,
    },
}

impl Edit {
    /// Validate against the current table and apply, returning the command
    /// that records the change. The table is unchanged on error.
    pub(crate) fn execute(self, table: &mut Table, validator: &Validator) -> Result<Command, EditError> {
        match self {
            Edit::SetCell { row, column, value } => {
                let old = table.get(row, column)?.clone();
                let new = validator.validate(value, table.column(column)?)?;
                table.set_raw(row, column, new.clone())?;
                Ok(Command::SetCell {
                    row,
                    column,
                    old,
                    new,
                })
            }
            Edit::InsertRow { index, values } => {
                if index > table.row_count() {
                    return Err(TableError::row_out_of_bounds(index, table.row_count()).into());
                }
                if values.len() != table.column_count() {
                    return Err(TableError::ArityMismatch {
                        expected: table.column_count(),
                        actual: values.len(),
                    }
                    .into());
                }
                let values = validator.validate_row(values, table.columns())?;
                table.insert_row(index, values.clone())?;
                Ok(Command::InsertRow { index, values })
            }
            Edit::DeleteRow { index } => {
                let values = table.delete_row(index)?;
                Ok(Command::DeleteRow { index, values })
            }
            Edit::InsertColumn {
                index,
                column,
                fill,
            } => {
                let fill = match fill {
                    Some(value) => validator.validate(value, &column)?,
                    None => column.default_fill(),
                };
                table.insert_column(index, column.clone(), fill)?;
                let values = table.column_values(index)?.to_vec();
                Ok(Command::InsertColumn {
                    index,
                    column,
                    values,
                })
            }
            Edit::DeleteColumn { index } => {
                let (column, values) = table.delete_column(index)?;
                Ok(Command::DeleteColumn {
                    index,
                    column,
                    values,
                })
            }
            Edit::RenameColumn { index, name } => {
                let old = table.rename_column(index, &name)?;
                Ok(Command::RenameColumn {
                    index,
                    old,
                    new: name,
                })
            }
            Edit::RetypeColumn { index, target } => {
                let current = table.column(index)?;
                let new_values =
                    validator.validate_retype(current, table.column_values(index)?, target)?;
                let new_column = current.with_type(target);
                let (old_column, old_values) =
                    table.replace_column(index, new_column.clone(), new_values.clone())?;
                Ok(Command::RetypeColumn {
                    index,
                    old_column,
                    old_values,
                    new_column,
                    new_values,
                })
            }
            Edit::Composite { label, edits } => {
                let mut commands: Vec<Command> = Vec::with_capacity(edits.len());
                for (step, edit) in edits.into_iter().enumerate() {
                    match edit.execute(table, validator) {
                        Ok(command) => commands.push(command),
                        Err(err) => {
                            for command in commands.iter().rev() {
                                command.revert(table)?;
                            }
                            return Err(EditError::rejected(
                                format!("{label} failed at step {}", step + 1),
                                err,
                            ));
                        }
                    }
                }
                Ok(Command::Composite { label, commands })
            }
        }
    }
}

impl Command {
    /// Re-apply a command that was previously reverted.
    pub(crate) fn apply(&self, table: &mut Table) -> Result<(), TableError> {
        match self {
            Command::SetCell {
                row, column, new, ..
            } => {
                table.set_raw(*row, *column, new.clone())?;
            }
            Command::InsertRow { index, values } => {
                table.insert_row(*index, values.clone())?;
            }
            Command::DeleteRow { index, .. } => {
                table.delete_row(*index)?;
            }
            Command::InsertColumn {
                index,
                column,
                values,
            } => {
                table.insert_column_values(*index, column.clone(), values.clone())?;
            }
            Command::DeleteColumn { index, .. } => {
                table.delete_column(*index)?;
            }
            Command::RenameColumn { index, new, .. } => {
                table.rename_column(*index, new)?;
            }
            Command::RetypeColumn {
                index,
                new_column,
                new_values,
                ..
            } => {
                table.replace_column(*index, new_column.clone(), new_values.clone())?;
            }
            Command::Composite { commands, .. } => {
                for command in commands {
                    command.apply(table)?;
                }
            }
        }
        Ok(())
    }

    /// Restore the table to its state before this command.
    pub(crate) fn revert(&self, table: &mut Table) -> Result<(), TableError> {
        match self {
            Command::SetCell {
                row, column, old, ..
            } => {
                table.set_raw(*row, *column, old.clone())?;
            }
            Command::InsertRow { index, .. } => {
                table.delete_row(*index)?;
            }
            Command::DeleteRow { index, values } => {
                table.insert_row(*index, values.clone())?;
            }
            Command::InsertColumn { index, .. } => {
                table.delete_column(*index)?;
            }
            Command::DeleteColumn {
                index,
                column,
                values,
            } => {
                table.insert_column_values(*index, column.clone(), values.clone())?;
            }
            Command::RenameColumn { index, old, .. } => {
                table.rename_column(*index, old)?;
            }
            Command::RetypeColumn {
                index,
                old_column,
                old_values,
                ..
            } => {
                table.replace_column(*index, old_column.clone(), old_values.clone())?;
            }
            Command::Composite { commands, .. } => {
                for command in commands.iter().rev() {
                    command.revert(table)?;
                }
            }
        }
        Ok(())
    }

    /// Short description for undo/redo menus and logs.
    pub fn label(&self) -> String {
        match self {
            Command::SetCell { row, column, .. } => format!("Edit cell ({row}, {column})"),
            Command::InsertRow { index, .. } => format!("Insert row {index}"),
            Command::DeleteRow { index, .. } => format!("Delete row {index}"),
            Command::InsertColumn { column, .. } => format!("Insert column '{}'", column.name()),
            Command::DeleteColumn { column, .. } => format!("Delete column '{}'", column.name()),
            Command::RenameColumn { old, new, .. } => format!("Rename '{old}' to '{new}'"),
            Command::RetypeColumn { new_column, .. } => format!(
                "Change '{}' to {}",
                new_column.name(),
                new_column.column_type()
            ),
            Command::Composite { label, .. } => label.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Table {
        Table::from_rows(
            vec![
                Column::required("id", ColumnType::Integer),
                Column::nullable("note", ColumnType::String),
            ],
            vec![
                vec![Value::Integer(1), Value::from("one")],
                vec![Value::Integer(2), Value::Null],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_set_cell_records_old_value() {
        let mut t = table();
        let command = Edit::SetCell {
            row: 0,
            column: 0,
            value: Value::from("7"),
        }
        .execute(&mut t, &Validator::default())
        .unwrap();
        assert_eq!(
            command,
            Command::SetCell {
                row: 0,
                column: 0,
                old: Value::Integer(1),
                new: Value::Integer(7),
            }
        );
        command.revert(&mut t).unwrap();
        assert_eq!(t, table());
    }

    #[test]
    fn test_composite_rolls_back_on_failure() {
        let mut t = table();
        let err = Edit::Composite {
            label: "Paste".into(),
            edits: vec![
                Edit::SetCell {
                    row: 0,
                    column: 1,
                    value: Value::from("changed"),
                },
                Edit::SetCell {
                    row: 1,
                    column: 0,
                    value: Value::from("not a number"),
                },
            ],
        }
        .execute(&mut t, &Validator::default())
        .unwrap_err();
        assert!(matches!(err, EditError::ValidationRejected { .. }));
        assert_eq!(t, table());
    }

    #[test]
    fn test_delete_column_revert_restores_position() {
        let mut t = table();
        let command = Edit::DeleteColumn { index: 0 }
            .execute(&mut t, &Validator::default())
            .unwrap();
        assert_eq!(t.column_count(), 1);
        command.revert(&mut t).unwrap();
        assert_eq!(t, table());
        assert_eq!(command.label(), "Delete column 'id'");
    }

    #[test]
    fn test_insert_column_fills_defaults() {
        let mut t = table();
        Edit::InsertColumn {
            index: 1,
            column: Column::required("flag", ColumnType::Boolean),
            fill: None,
        }
        .execute(&mut t, &Validator::default())
        .unwrap();
        assert_eq!(
            t.column_values(1).unwrap(),
            &[Value::Boolean(false), Value::Boolean(false)]
        );
    }

    #[test]
    fn test_insert_column_with_fill_is_validated() {
        let mut t = table();
        let command = Edit::InsertColumn {
            index: 2,
            column: Column::required("qty", ColumnType::Integer),
            fill: Some(Value::from("3")),
        }
        .execute(&mut t, &Validator::default())
        .unwrap();
        assert_eq!(
            t.column_values(2).unwrap(),
            &[Value::Integer(3), Value::Integer(3)]
        );
        command.revert(&mut t).unwrap();
        assert_eq!(t, table());

        let err = Edit::InsertColumn {
            index: 0,
            column: Column::required("qty", ColumnType::Integer),
            fill: Some(Value::from("three")),
        }
        .execute(&mut t, &Validator::default())
        .unwrap_err();
        assert!(matches!(err, EditError::Validation(_)));
        assert_eq!(t, table());
    }
}
