//! Parsing of edit operations, cell ranges, sort keys and filters given on the
//! command line.
//!
//! Columns may be named or given by position; a bare number is always a
//! position.

use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result};
use pqview_core::{Filter, FilterOp, Session, SortKey, Table};
use pqview_model::{CoercionPolicy, Column, ColumnType, Selection, Value};

/// A column by position or by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnRef {
    Index(usize),
    Name(String),
}

impl ColumnRef {
    /// Position of the column in `table`.
    ///
    /// Positions are passed through unchecked so the engine reports bounds errors.
    pub fn resolve(&self, table: &Table) -> Result<usize, String> {
        match self {
            ColumnRef::Index(index) => Ok(*index),
            ColumnRef::Name(name) => table
                .column_index(name)
                .ok_or_else(|| format!("no column named '{name}'")),
        }
    }
}

impl FromStr for ColumnRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("empty column reference".to_string());
        }
        Ok(s.parse::<usize>()
            .map_or_else(|_| ColumnRef::Name(s.to_string()), ColumnRef::Index))
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnRef::Index(index) => write!(f, "{index}"),
            ColumnRef::Name(name) => f.write_str(name),
        }
    }
}

/// Split on whitespace, keeping double-quoted runs together. `""` is an empty word.
pub fn split_words(input: &str) -> Result<Vec<String>, String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut started = false;
    for ch in input.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                started = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if started {
                    words.push(std::mem::take(&mut current));
                    started = false;
                }
            }
            c => {
                current.push(c);
                started = true;
            }
        }
    }
    if in_quotes {
        return Err(format!("unterminated quote in '{input}'"));
    }
    if started {
        words.push(current);
    }
    Ok(words)
}

/// One step of an `edit` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOp {
    Set {
        row: usize,
        column: ColumnRef,
        raw: String,
    },
    Null {
        row: usize,
        column: ColumnRef,
    },
    InsertRow {
        index: usize,
        raw: Vec<String>,
    },
    DeleteRow {
        index: usize,
    },
    InsertColumn {
        index: usize,
        name: String,
        column_type: ColumnType,
        nullable: bool,
        fill: Option<String>,
    },
    DeleteColumn {
        column: ColumnRef,
    },
    Rename {
        column: ColumnRef,
        name: String,
    },
    Retype {
        column: ColumnRef,
        target: ColumnType,
    },
    /// `paste R C a,b;c,d`: rows separated by `;`, cells by `,`.
    Paste {
        row: usize,
        column: ColumnRef,
        grid: Vec<Vec<String>>,
    },
    Undo,
    Redo,
}

fn parse_index(word: &str, what: &str) -> Result<usize, String> {
    word.parse()
        .map_err(|_| format!("{what} must be a non-negative integer, got '{word}'"))
}

fn expect_args(op: &str, args: &[String], usage: &str, min: usize, max: usize) -> Result<(), String> {
    if args.len() < min || args.len() > max {
        return Err(format!("usage: {op} {usage}"));
    }
    Ok(())
}

impl FromStr for EditOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let words = split_words(s)?;
        let Some((op, args)) = words.split_first() else {
            return Err("empty operation".to_string());
        };
        let op = op.to_ascii_lowercase();
        match op.as_str() {
            "set" => {
                expect_args(&op, args, "ROW COLUMN VALUE", 3, 3)?;
                Ok(EditOp::Set {
                    row: parse_index(&args[0], "row")?,
                    column: args[1].parse()?,
                    raw: args[2].clone(),
                })
            }
            "null" => {
                expect_args(&op, args, "ROW COLUMN", 2, 2)?;
                Ok(EditOp::Null {
                    row: parse_index(&args[0], "row")?,
                    column: args[1].parse()?,
                })
            }
            "insert-row" => {
                expect_args(&op, args, "ROW [VALUE...]", 1, usize::MAX)?;
                Ok(EditOp::InsertRow {
                    index: parse_index(&args[0], "row")?,
                    raw: args[1..].to_vec(),
                })
            }
            "delete-row" => {
                expect_args(&op, args, "ROW", 1, 1)?;
                Ok(EditOp::DeleteRow {
                    index: parse_index(&args[0], "row")?,
                })
            }
            "insert-column" => {
                expect_args(&op, args, "INDEX NAME TYPE [nullable|required] [FILL]", 3, 5)?;
                let nullable = match args.get(3).map(|w| w.to_ascii_lowercase()).as_deref() {
                    None | Some("nullable") => true,
                    Some("required") => false,
                    Some(other) => return Err(format!("expected nullable or required, got '{other}'")),
                };
                Ok(EditOp::InsertColumn {
                    index: parse_index(&args[0], "column index")?,
                    name: args[1].clone(),
                    column_type: args[2].parse()?,
                    nullable,
                    fill: args.get(4).cloned(),
                })
            }
            "delete-column" => {
                expect_args(&op, args, "COLUMN", 1, 1)?;
                Ok(EditOp::DeleteColumn {
                    column: args[0].parse()?,
                })
            }
            "rename" => {
                expect_args(&op, args, "COLUMN NAME", 2, 2)?;
                Ok(EditOp::Rename {
                    column: args[0].parse()?,
                    name: args[1].clone(),
                })
            }
            "retype" => {
                expect_args(&op, args, "COLUMN TYPE", 2, 2)?;
                Ok(EditOp::Retype {
                    column: args[0].parse()?,
                    target: args[1].parse()?,
                })
            }
            "paste" => {
                expect_args(&op, args, "ROW COLUMN CELLS", 3, 3)?;
                let grid = args[2]
                    .split(';')
                    .map(|line| line.split(',').map(str::to_string).collect())
                    .collect();
                Ok(EditOp::Paste {
                    row: parse_index(&args[0], "row")?,
                    column: args[1].parse()?,
                    grid,
                })
            }
            "undo" => {
                expect_args(&op, args, "", 0, 0)?;
                Ok(EditOp::Undo)
            }
            "redo" => {
                expect_args(&op, args, "", 0, 0)?;
                Ok(EditOp::Redo)
            }
            other => Err(format!("unknown operation '{other}'")),
        }
    }
}

impl EditOp {
    /// Run against `session`, returning a one-line description of what happened.
    pub fn apply(&self, session: &mut Session) -> Result<String> {
        let resolve = |column: &ColumnRef, session: &Session| -> Result<usize> {
            column.resolve(session.table()).map_err(anyhow::Error::msg)
        };
        match self {
            EditOp::Set { row, column, raw } => {
                let column = resolve(column, session)?;
                session.request_set_cell(*row, column, raw)?;
            }
            EditOp::Null { row, column } => {
                let column = resolve(column, session)?;
                session.request_set_value(*row, column, Value::Null)?;
            }
            EditOp::InsertRow { index, raw } => {
                let values = raw.iter().map(|r| Value::from(r.as_str())).collect();
                session.request_insert_row(*index, values)?;
            }
            EditOp::DeleteRow { index } => session.request_delete_row(*index)?,
            EditOp::InsertColumn {
                index,
                name,
                column_type,
                nullable,
                fill,
            } => {
                let column = Column::new(name.as_str(), *column_type, *nullable);
                let fill = fill.as_deref().map(Value::from);
                session.request_insert_column(*index, column, fill)?;
            }
            EditOp::DeleteColumn { column } => {
                let column = resolve(column, session)?;
                session.request_delete_column(column)?;
            }
            EditOp::Rename { column, name } => {
                let column = resolve(column, session)?;
                session.request_rename_column(column, name)?;
            }
            EditOp::Retype { column, target } => {
                let column = resolve(column, session)?;
                session.request_retype_column(column, *target)?;
            }
            EditOp::Paste { row, column, grid } => {
                let column = resolve(column, session)?;
                session.request_paste(*row, column, grid)?;
            }
            EditOp::Undo => return Ok(format!("Undo: {}", session.undo()?)),
            EditOp::Redo => return Ok(format!("Redo: {}", session.redo()?)),
        }
        Ok(session
            .history()
            .undo_label()
            .unwrap_or_default())
    }
}

/// An inclusive rectangle `R0:C0-R1:C1`, or a single cell `R:C`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub top: usize,
    pub left: usize,
    pub bottom: usize,
    pub right: usize,
}

impl CellRange {
    pub fn to_selection(self) -> Selection {
        Selection::rect(self.top..self.bottom + 1, self.left..self.right + 1)
    }
}

fn parse_cell(s: &str) -> Result<(usize, usize), String> {
    let (row, column) = s
        .split_once(':')
        .ok_or_else(|| format!("expected ROW:COLUMN, got '{s}'"))?;
    Ok((
        parse_index(row.trim(), "row")?,
        parse_index(column.trim(), "column")?,
    ))
}

impl FromStr for CellRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = match s.split_once('-') {
            Some((start, end)) => (parse_cell(start)?, parse_cell(end)?),
            None => {
                let cell = parse_cell(s)?;
                (cell, cell)
            }
        };
        let (bottom, right) = (start.0.max(end.0), start.1.max(end.1));
        if bottom == usize::MAX || right == usize::MAX {
            return Err(format!("range '{s}' is too large"));
        }
        Ok(CellRange {
            top: start.0.min(end.0),
            left: start.1.min(end.1),
            bottom,
            right,
        })
    }
}

/// `COLUMN[:asc|:desc]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub column: ColumnRef,
    pub descending: bool,
}

impl FromStr for SortSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (column, descending) = match s.rsplit_once(':') {
            Some((column, dir)) if dir.eq_ignore_ascii_case("desc") => (column, true),
            Some((column, dir)) if dir.eq_ignore_ascii_case("asc") => (column, false),
            _ => (s, false),
        };
        Ok(SortSpec {
            column: column.parse()?,
            descending,
        })
    }
}

impl SortSpec {
    pub fn resolve(&self, table: &Table) -> Result<SortKey, String> {
        let column = self.column.resolve(table)?;
        Ok(if self.descending {
            SortKey::descending(column)
        } else {
            SortKey::ascending(column)
        })
    }
}

/// `COLUMN OP [VALUE]`, e.g. `score >= 10`, `name contains ad`, `note is null`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    pub column: ColumnRef,
    pub op: FilterOp,
    pub operand: String,
}

impl FromStr for FilterSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let words = split_words(s)?;
        if words.len() < 2 {
            return Err(format!("expected COLUMN OP [VALUE], got '{s}'"));
        }
        let column = words[0].parse()?;

        let two_word = words
            .get(2)
            .and_then(|second| format!("{} {second}", words[1]).parse::<FilterOp>().ok());
        let (op, rest) = match two_word {
            Some(op) => (op, &words[3..]),
            None => (words[1].parse::<FilterOp>()?, &words[2..]),
        };

        if op.is_unary() {
            if !rest.is_empty() {
                return Err(format!("'{op}' takes no value"));
            }
        } else if rest.is_empty() {
            return Err(format!("'{op}' needs a value"));
        }
        Ok(FilterSpec {
            column,
            op,
            operand: rest.join(" "),
        })
    }
}

impl FilterSpec {
    /// Build the filter, converting the operand to the column's type when it can.
    pub fn resolve(&self, table: &Table) -> Result<Filter, String> {
        let index = self.column.resolve(table)?;
        let column_type = table
            .column(index)
            .map_err(|e| e.to_string())?
            .column_type();
        let raw = Value::from(self.operand.as_str());
        let operand = CoercionPolicy::all()
            .coerce(&raw, column_type)
            .unwrap_or(raw);
        Ok(Filter::new(index, self.op, operand))
    }
}

/// Resolve every sort key, failing on the first unknown column.
pub fn resolve_sorts(specs: &[SortSpec], table: &Table) -> Result<Vec<SortKey>> {
    specs
        .iter()
        .map(|spec| {
            spec.resolve(table)
                .map_err(anyhow::Error::msg)
                .with_context(|| format!("sort by {}", spec.column))
        })
        .collect()
}

pub fn resolve_filters(specs: &[FilterSpec], table: &Table) -> Result<Vec<Filter>> {
    specs
        .iter()
        .map(|spec| {
            spec.resolve(table)
                .map_err(anyhow::Error::msg)
                .with_context(|| format!("filter on {}", spec.column))
        })
        .collect()
}
