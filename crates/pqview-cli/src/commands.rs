use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tracing::{info, info_span};

use pqview_cli::ops::{ColumnRef, resolve_filters, resolve_sorts};
use pqview_cli::render::{aggregate_table, preview_table, schema_table, settings_table};
use pqview_config::{Settings, settings_path};
use pqview_core::{Session, Table};
use pqview_model::Selection;
use pqview_parquet::{JobHandle, StoreError, spawn_load, spawn_save, write_csv};

use crate::cli::{EditArgs, SettingsArgs, ShowArgs, StatsArgs, Toggle};

/// Keep the typed error in the chain but lead with the friendly message.
fn store_error(error: StoreError) -> anyhow::Error {
    let message = match error.suggestion() {
        Some(hint) => format!("{}\n  hint: {hint}", error.user_message()),
        None => error.user_message(),
    };
    anyhow::Error::new(error).context(message)
}

fn load(path: &Path) -> Result<Table> {
    spawn_load(path.to_path_buf())
        .and_then(JobHandle::join)
        .map_err(store_error)
}

pub fn run_show(args: &ShowArgs, settings: &Settings) -> Result<()> {
    let session = Session::new(load(&args.file)?);
    let sorts = resolve_sorts(&args.sort, session.table())?;
    let filters = resolve_filters(&args.filter, session.table())?;

    let keep: HashSet<usize> = session.filtered_rows(&filters)?.into_iter().collect();
    let rows: Vec<usize> = session
        .sorted_rows(&sorts)?
        .into_iter()
        .filter(|row| keep.contains(row))
        .collect();
    let limit = args.rows.unwrap_or(settings.preview_rows);
    let shown = &rows[..rows.len().min(limit)];

    println!("{}", preview_table(session.table(), shown));
    println!(
        "{} of {} rows shown ({} total)",
        shown.len(),
        rows.len(),
        session.table().row_count()
    );
    Ok(())
}

pub fn run_schema(file: &Path) -> Result<()> {
    let table = load(file)?;
    println!("{}", schema_table(&table));
    println!("{} rows, {} columns", table.row_count(), table.column_count());
    Ok(())
}

pub fn run_stats(args: &StatsArgs) -> Result<()> {
    let session = Session::new(load(&args.file)?);
    let selection = match (&args.column, args.range) {
        (Some(column), _) => {
            let index = column
                .parse::<ColumnRef>()
                .and_then(|c| c.resolve(session.table()))
                .map_err(anyhow::Error::msg)?;
            Selection::column(index, session.table().row_count())
        }
        (None, Some(range)) => range.to_selection(),
        (None, None) => return Err(anyhow!("either --column or --range is required")),
    };
    let result = session
        .aggregate(&selection, args.kind)
        .with_context(|| format!("compute {}", args.kind))?;
    println!("{}", aggregate_table(&result));
    Ok(())
}

pub fn run_edit(args: &EditArgs, settings: &Settings) -> Result<()> {
    let span = info_span!("edit", file = %args.file.display());
    let _guard = span.enter();

    let mut session = Session::new(load(&args.file)?).with_policy(settings.coercion.clone());
    if let Some(limit) = settings.history_limit {
        session = session.with_history_limit(limit);
    }

    for (step, op) in args.ops.iter().enumerate() {
        let label = op
            .apply(&mut session)
            .with_context(|| format!("operation {} failed; nothing was saved", step + 1))?;
        println!("{:>3}. {label}", step + 1);
    }

    let Some(destination) = save_target(args, session.is_dirty()) else {
        println!("No changes to save");
        return Ok(());
    };
    if args.dry_run {
        let rows: Vec<usize> = (0..session.table().row_count().min(settings.preview_rows)).collect();
        println!("{}", preview_table(session.table(), &rows));
        println!("Dry run: changes not saved");
        return Ok(());
    }

    let (rows, columns) = (session.table().row_count(), session.table().column_count());
    spawn_save(destination.clone(), session.into_table())
        .and_then(JobHandle::join)
        .map_err(store_error)?;
    info!(rows, columns, "Edits saved");
    println!(
        "Saved {rows} rows × {columns} columns to {}",
        destination.display()
    );
    Ok(())
}

/// Where an edit run is written. An explicit output is always written, even
/// when the edits cancel out.
fn save_target(args: &EditArgs, dirty: bool) -> Option<PathBuf> {
    match &args.output {
        Some(output) => Some(output.clone()),
        None if dirty => Some(args.file.clone()),
        None => None,
    }
}

pub fn run_export(file: &Path, csv: &Path) -> Result<()> {
    let table = load(file)?;
    write_csv(&table, csv).map_err(store_error)?;
    println!("Exported {} rows to {}", table.row_count(), csv.display());
    Ok(())
}

pub fn run_settings(args: &SettingsArgs) -> Result<()> {
    let path = settings_path();
    let mut settings = Settings::load_from(&path).context("load settings")?;
    let before = settings.clone();

    if let Some(toggle) = args.dark_mode {
        settings.dark_mode = matches!(toggle, Toggle::On);
    }
    if let Some(limit) = args.history_limit {
        settings.history_limit = (limit > 0).then_some(limit);
    }
    if let Some(rows) = args.preview_rows {
        settings.preview_rows = rows;
    }
    if settings != before {
        settings.save_to(&path).context("save settings")?;
        info!(path = %path.display(), "Settings updated");
    }

    println!("{}", settings_table(&settings));
    println!("Settings file: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edit_args(output: Option<&str>) -> EditArgs {
        EditArgs {
            file: PathBuf::from("in.parquet"),
            ops: vec!["undo".parse().unwrap()],
            output: output.map(PathBuf::from),
            dry_run: false,
        }
    }

    #[test]
    fn test_clean_edit_without_output_is_not_saved() {
        assert_eq!(save_target(&edit_args(None), false), None);
        assert_eq!(
            save_target(&edit_args(None), true),
            Some(PathBuf::from("in.parquet"))
        );
    }

    #[test]
    fn test_explicit_output_is_always_written() {
        assert_eq!(
            save_target(&edit_args(Some("out.parquet")), false),
            Some(PathBuf::from("out.parquet"))
        );
        assert_eq!(
            save_target(&edit_args(Some("out.parquet")), true),
            Some(PathBuf::from("out.parquet"))
        );
    }
}
