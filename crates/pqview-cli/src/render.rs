//! Terminal tables for previews, schemas, statistics and settings.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use pqview_config::Settings;
use pqview_core::{Aggregate, Table as DataTable};
use pqview_model::Value;

/// Longest cell text shown before truncation.
const MAX_CELL_CHARS: usize = 40;

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
}

fn header_cell(text: impl Into<String>) -> Cell {
    Cell::new(text.into())
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell(text: &str) -> Cell {
    Cell::new(text).add_attribute(Attribute::Dim)
}

fn value_cell(value: &Value) -> Cell {
    if value.is_null() {
        return dim_cell("null");
    }
    let text = value.to_string();
    let cell = if text.chars().count() > MAX_CELL_CHARS {
        let cut: String = text.chars().take(MAX_CELL_CHARS - 1).collect();
        Cell::new(format!("{cut}…"))
    } else {
        Cell::new(text)
    };
    if value.as_f64().is_some() {
        cell.set_alignment(CellAlignment::Right)
    } else {
        cell
    }
}

/// The given rows of `data`, in the given order, with a leading row-number column.
pub fn preview_table(data: &DataTable, rows: &[usize]) -> Table {
    let mut table = Table::new();
    let mut header = vec![header_cell("#")];
    header.extend(
        data.columns()
            .iter()
            .map(|c| header_cell(format!("{}\n{}", c.name(), c.column_type()))),
    );
    table.set_header(header);
    apply_table_style(&mut table);

    for &row in rows {
        let Ok(values) = data.row(row) else {
            continue;
        };
        let mut cells = vec![dim_cell(&row.to_string())];
        cells.extend(values.iter().map(value_cell));
        table.add_row(cells);
    }
    table
}

/// One line per column: position, name, type, nullability and null count.
pub fn schema_table(data: &DataTable) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("#"),
        header_cell("Column"),
        header_cell("Type"),
        header_cell("Nullable"),
        header_cell("Nulls"),
    ]);
    apply_table_style(&mut table);

    for (index, (column, values)) in data.iter_columns().enumerate() {
        let nulls = values.iter().filter(|v| v.is_null()).count();
        table.add_row(vec![
            Cell::new(index),
            Cell::new(column.name()),
            Cell::new(column.column_type()),
            if column.is_nullable() {
                Cell::new("yes")
            } else {
                dim_cell("no")
            },
            Cell::new(nulls).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

pub fn aggregate_table(result: &Aggregate) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Aggregate"),
        header_cell("Value"),
        header_cell("Counted"),
        header_cell("Skipped"),
    ]);
    apply_table_style(&mut table);
    table.add_row(vec![
        Cell::new(result.kind),
        value_cell(&result.value),
        Cell::new(result.counted),
        Cell::new(result.skipped),
    ]);
    table
}

pub fn settings_table(settings: &Settings) -> Table {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Setting"), header_cell("Value")]);
    apply_table_style(&mut table);

    let rules: Vec<String> = settings
        .coercion
        .rules()
        .map(|rule| format!("{rule:?}"))
        .collect();
    table.add_row(vec![
        Cell::new("dark_mode"),
        Cell::new(if settings.dark_mode { "on" } else { "off" }),
    ]);
    table.add_row(vec![
        Cell::new("history_limit"),
        Cell::new(
            settings
                .history_limit
                .map_or_else(|| "unlimited".to_string(), |n| n.to_string()),
        ),
    ]);
    table.add_row(vec![Cell::new("preview_rows"), Cell::new(settings.preview_rows)]);
    table.add_row(vec![
        Cell::new("coercion"),
        Cell::new(if rules.is_empty() {
            "(none)".to_string()
        } else {
            rules.join("\n")
        }),
    ]);
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use pqview_core::AggregateKind;
    use pqview_model::{Column, ColumnType};

    fn plain(mut table: Table) -> String {
        table.force_no_tty();
        table.to_string()
    }

    fn data() -> DataTable {
        DataTable::from_rows(
            vec![
                Column::required("id", ColumnType::Integer),
                Column::nullable("name", ColumnType::String),
            ],
            vec![
                vec![Value::Integer(7), Value::from("x".repeat(60))],
                vec![Value::Integer(8), Value::Null],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_preview_follows_row_order() {
        let text = plain(preview_table(&data(), &[1, 0]));
        let eight = text.find(" 8 ").unwrap();
        let seven = text.find(" 7 ").unwrap();
        assert!(eight < seven);
        assert!(text.contains("null"));
        assert!(text.contains('…'));
        assert!(!text.contains(&"x".repeat(41)));
    }

    #[test]
    fn test_preview_skips_missing_rows() {
        let text = plain(preview_table(&data(), &[5]));
        assert!(text.contains("integer"));
        assert!(!text.contains(" 5 "));
    }

    #[test]
    fn test_schema_counts_nulls() {
        let text = plain(schema_table(&data()));
        assert!(text.contains("name"));
        assert!(text.contains("string"));
        assert!(text.contains("yes"));
    }

    #[test]
    fn test_aggregate_row() {
        let result = Aggregate {
            kind: AggregateKind::Sum,
            value: Value::Integer(15),
            counted: 2,
            skipped: 1,
        };
        let text = plain(aggregate_table(&result));
        assert!(text.contains("sum"));
        assert!(text.contains("15"));
    }

    #[test]
    fn test_settings_lists_rules() {
        let text = plain(settings_table(&Settings::default()));
        assert!(text.contains("EmptyTextToNull"));
        assert!(text.contains("1000"));
    }
}
