//! Sorted and filtered row orders.
//!
//! Views never touch the table or its history; they return row indices that a
//! front end can use to present the data.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use pqview_model::Value;

use crate::error::{Result, TableError};
use crate::table::Table;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub column: usize,
    pub descending: bool,
}

impl SortKey {
    pub fn ascending(column: usize) -> Self {
        Self {
            column,
            descending: false,
        }
    }

    pub fn descending(column: usize) -> Self {
        Self {
            column,
            descending: true,
        }
    }
}

/// Stable row order by the given keys. Nulls go last in either direction.
pub fn sort_rows(table: &Table, keys: &[SortKey]) -> Result<Vec<usize>> {
    let columns = keys
        .iter()
        .map(|key| table.column_values(key.column).map(|values| (values, key.descending)))
        .collect::<Result<Vec<_>>>()?;

    let mut order: Vec<usize> = (0..table.row_count()).collect();
    order.sort_by(|&a, &b| {
        columns
            .iter()
            .map(|(values, descending)| compare_cells(&values[a], &values[b], *descending))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    });
    Ok(order)
}

fn compare_cells(a: &Value, b: &Value, descending: bool) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        _ if descending => b.total_cmp(a),
        _ => a.total_cmp(b),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    /// Case-insensitive substring match on the displayed value.
    Contains,
    IsNull,
    NotNull,
}

impl FilterOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOp::Eq => "=",
            FilterOp::Ne => "!=",
            FilterOp::Lt => "<",
            FilterOp::Le => "<=",
            FilterOp::Gt => ">",
            FilterOp::Ge => ">=",
            FilterOp::Contains => "~",
            FilterOp::IsNull => "is null",
            FilterOp::NotNull => "not null",
        }
    }

    /// True for operators that ignore their operand.
    pub fn is_unary(&self) -> bool {
        matches!(self, FilterOp::IsNull | FilterOp::NotNull)
    }
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterOp {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "=" | "==" | "eq" => Ok(FilterOp::Eq),
            "!=" | "<>" | "ne" => Ok(FilterOp::Ne),
            "<" | "lt" => Ok(FilterOp::Lt),
            "<=" | "le" => Ok(FilterOp::Le),
            ">" | "gt" => Ok(FilterOp::Gt),
            ">=" | "ge" => Ok(FilterOp::Ge),
            "~" | "contains" => Ok(FilterOp::Contains),
            "is null" | "is_null" => Ok(FilterOp::IsNull),
            "not null" | "not_null" => Ok(FilterOp::NotNull),
            _ => Err(format!("Unknown filter operator: {}", s)),
        }
    }
}

/// A predicate on one column.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: usize,
    pub op: FilterOp,
    pub operand: Value,
}

impl Filter {
    pub fn new(column: usize, op: FilterOp, operand: Value) -> Self {
        Self {
            column,
            op,
            operand,
        }
    }

    pub fn matches(&self, cell: &Value) -> bool {
        match self.op {
            FilterOp::IsNull => cell.is_null(),
            FilterOp::NotNull => !cell.is_null(),
            _ if cell.is_null() => false,
            FilterOp::Contains => cell
                .to_string()
                .to_lowercase()
                .contains(&self.operand.to_string().to_lowercase()),
            op => {
                let ordering = compare_operand(cell, &self.operand);
                match op {
                    FilterOp::Eq => ordering.is_eq(),
                    FilterOp::Ne => ordering.is_ne(),
                    FilterOp::Lt => ordering.is_lt(),
                    FilterOp::Le => ordering.is_le(),
                    FilterOp::Gt => ordering.is_gt(),
                    _ => ordering.is_ge(),
                }
            }
        }
    }
}

/// Same-kind values compare by value; anything else compares by display text.
fn compare_operand(cell: &Value, operand: &Value) -> Ordering {
    let comparable = cell.column_type() == operand.column_type()
        || (cell.as_f64().is_some() && operand.as_f64().is_some());
    if comparable {
        cell.total_cmp(operand)
    } else {
        cell.to_string().cmp(&operand.to_string())
    }
}

/// Indices of rows matching every filter, in table order.
pub fn filter_rows(table: &Table, filters: &[Filter]) -> Result<Vec<usize>> {
    let columns = filters
        .iter()
        .map(|filter| table.column_values(filter.column).map(|values| (values, filter)))
        .collect::<std::result::Result<Vec<_>, TableError>>()?;

    Ok((0..table.row_count())
        .filter(|&row| columns.iter().all(|(values, filter)| filter.matches(&values[row])))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pqview_model::{Column, ColumnType};

    fn table() -> Table {
        Table::from_columns(
            vec![
                Column::nullable("n", ColumnType::Integer),
                Column::required("s", ColumnType::String),
            ],
            vec![
                vec![
                    Value::Integer(2),
                    Value::Null,
                    Value::Integer(1),
                    Value::Integer(2),
                ],
                vec![
                    Value::from("b"),
                    Value::from("Apple"),
                    Value::from("c"),
                    Value::from("a"),
                ],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_sort_is_stable_with_nulls_last() {
        let t = table();
        assert_eq!(sort_rows(&t, &[SortKey::ascending(0)]).unwrap(), vec![2, 0, 3, 1]);
        assert_eq!(sort_rows(&t, &[SortKey::descending(0)]).unwrap(), vec![0, 3, 2, 1]);
        assert_eq!(
            sort_rows(&t, &[SortKey::ascending(0), SortKey::ascending(1)]).unwrap(),
            vec![2, 3, 0, 1]
        );
    }

    #[test]
    fn test_sort_unknown_column() {
        assert_eq!(
            sort_rows(&table(), &[SortKey::ascending(7)]),
            Err(TableError::column_out_of_bounds(7, 2))
        );
    }

    #[test]
    fn test_filters() {
        let t = table();
        let ge = Filter::new(0, FilterOp::Ge, Value::Float(2.0));
        assert_eq!(filter_rows(&t, &[ge.clone()]).unwrap(), vec![0, 3]);

        let null = Filter::new(0, FilterOp::IsNull, Value::Null);
        assert_eq!(filter_rows(&t, &[null]).unwrap(), vec![1]);

        let contains = Filter::new(1, FilterOp::Contains, Value::from("a"));
        assert_eq!(filter_rows(&t, &[contains.clone()]).unwrap(), vec![1, 3]);
        assert_eq!(filter_rows(&t, &[ge, contains]).unwrap(), vec![3]);
    }

    #[test]
    fn test_parse_filter_op() {
        assert_eq!("<=".parse::<FilterOp>(), Ok(FilterOp::Le));
        assert_eq!("IS NULL".parse::<FilterOp>(), Ok(FilterOp::IsNull));
        assert!("=~".parse::<FilterOp>().is_err());
    }
}
