//! Aggregates over selections.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use pqview_model::{CellRef, Selection, Value};

use crate::error::StatsError;
use crate::table::Table;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateKind {
    Sum,
    Mean,
    Min,
    Max,
    Count,
    CountDistinct,
}

impl AggregateKind {
    pub const ALL: [AggregateKind; 6] = [
        AggregateKind::Sum,
        AggregateKind::Mean,
        AggregateKind::Min,
        AggregateKind::Max,
        AggregateKind::Count,
        AggregateKind::CountDistinct,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateKind::Sum => "sum",
            AggregateKind::Mean => "mean",
            AggregateKind::Min => "min",
            AggregateKind::Max => "max",
            AggregateKind::Count => "count",
            AggregateKind::CountDistinct => "count-distinct",
        }
    }

    /// Kinds that only look at integer and float cells.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            AggregateKind::Sum | AggregateKind::Mean | AggregateKind::Min | AggregateKind::Max
        )
    }
}

impl fmt::Display for AggregateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AggregateKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sum" => Ok(AggregateKind::Sum),
            "mean" | "avg" | "average" => Ok(AggregateKind::Mean),
            "min" => Ok(AggregateKind::Min),
            "max" => Ok(AggregateKind::Max),
            "count" => Ok(AggregateKind::Count),
            "count-distinct" | "count_distinct" | "distinct" => Ok(AggregateKind::CountDistinct),
            _ => Err(format!("Unknown aggregate: {}", s)),
        }
    }
}

/// Result of an aggregate.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub kind: AggregateKind,
    pub value: Value,
    /// Cells that contributed to the value.
    pub counted: usize,
    /// Cells in the selection that were ignored (nulls, and non-numeric cells
    /// for numeric kinds).
    pub skipped: usize,
}

/// Compute an aggregate over the selected cells.
///
/// Read-only. Fails with `OutOfBounds` if any coordinate lies outside the table,
/// and with `NotApplicable` if a numeric kind finds no numeric cell.
pub fn aggregate(
    table: &Table,
    selection: &Selection,
    kind: AggregateKind,
) -> Result<Aggregate, StatsError> {
    check_bounds(table, selection)?;
    let cells = selection.iter().filter_map(|cell| table.get(cell.row, cell.column).ok());

    let (value, counted, skipped) = match kind {
        AggregateKind::Count => {
            let (mut counted, mut skipped) = (0, 0);
            for value in cells {
                if value.is_null() {
                    skipped += 1;
                } else {
                    counted += 1;
                }
            }
            (Value::Integer(counted as i64), counted, skipped)
        }
        AggregateKind::CountDistinct => {
            let mut distinct = HashSet::new();
            let (mut counted, mut skipped) = (0, 0);
            for value in cells {
                if value.is_null() {
                    skipped += 1;
                } else {
                    counted += 1;
                    distinct.insert(value);
                }
            }
            (Value::Integer(distinct.len() as i64), counted, skipped)
        }
        AggregateKind::Sum | AggregateKind::Mean | AggregateKind::Min | AggregateKind::Max => {
            let mut acc = NumericAccumulator::default();
            for value in cells {
                acc.push(value);
            }
            if acc.counted == 0 {
                return Err(StatsError::NotApplicable { kind });
            }
            let value = match kind {
                AggregateKind::Sum => acc.sum(),
                AggregateKind::Mean => Value::Float(acc.float_sum / acc.counted as f64),
                AggregateKind::Min => acc.min.cloned().unwrap_or(Value::Null),
                _ => acc.max.cloned().unwrap_or(Value::Null),
            };
            (value, acc.counted, acc.skipped)
        }
    };

    Ok(Aggregate {
        kind,
        value,
        counted,
        skipped,
    })
}

fn check_bounds(table: &Table, selection: &Selection) -> Result<(), StatsError> {
    let Some((rows, columns)) = selection.extent() else {
        return Ok(());
    };
    if rows <= table.row_count() && columns <= table.column_count() {
        return Ok(());
    }
    let outside = selection
        .iter()
        .find(|c| c.row >= table.row_count() || c.column >= table.column_count())
        .unwrap_or(CellRef::new(rows - 1, columns - 1));
    Err(StatsError::OutOfBounds {
        row: outside.row,
        column: outside.column,
    })
}

#[derive(Default)]
struct NumericAccumulator<'a> {
    /// Exact integer sum, `None` once it overflows.
    int_sum: Option<i64>,
    float_sum: f64,
    saw_float: bool,
    min: Option<&'a Value>,
    max: Option<&'a Value>,
    counted: usize,
    skipped: usize,
}

impl<'a> NumericAccumulator<'a> {
    fn push(&mut self, value: &'a Value) {
        let Some(number) = value.as_f64() else {
            self.skipped += 1;
            return;
        };
        if self.counted == 0 {
            self.int_sum = Some(0);
        }
        self.counted += 1;
        self.float_sum += number;
        match value {
            Value::Integer(v) => self.int_sum = self.int_sum.and_then(|sum| sum.checked_add(*v)),
            _ => self.saw_float = true,
        }
        if self.min.is_none_or(|current| value.total_cmp(current).is_lt()) {
            self.min = Some(value);
        }
        if self.max.is_none_or(|current| value.total_cmp(current).is_gt()) {
            self.max = Some(value);
        }
    }

    fn sum(&self) -> Value {
        match self.int_sum {
            Some(sum) if !self.saw_float => Value::Integer(sum),
            _ => Value::Float(self.float_sum),
        }
    }
}
