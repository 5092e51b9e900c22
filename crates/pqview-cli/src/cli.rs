//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

use pqview_cli::ops::{CellRange, EditOp, FilterSpec, SortSpec};
use pqview_core::AggregateKind;

#[derive(Parser)]
#[command(
    name = "pqview",
    version,
    about = "View, query and edit Parquet files",
    long_about = "View, query and edit Parquet files.\n\n\
                  Edits are validated against each column's type and can be undone.\n\
                  Saves go through a temporary file, so a failed save never damages\n\
                  the original."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format.
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the first rows of a file.
    Show(ShowArgs),

    /// Print column names, types and nullability.
    Schema {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Compute an aggregate over a column or a cell range.
    Stats(StatsArgs),

    /// Apply edits and save the result.
    Edit(EditArgs),

    /// Export a file as CSV.
    Export {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Destination CSV file.
        #[arg(long = "csv", value_name = "PATH")]
        csv: PathBuf,
    },

    /// Show or change user settings.
    Settings(SettingsArgs),
}

#[derive(Args)]
pub struct ShowArgs {
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Number of rows to print (default: the preview_rows setting).
    #[arg(long = "rows", short = 'n', value_name = "N")]
    pub rows: Option<usize>,

    /// Sort by a column, e.g. `score:desc`. Repeat for tie-breakers.
    #[arg(long = "sort", value_name = "COL[:desc]")]
    pub sort: Vec<SortSpec>,

    /// Keep rows matching an expression, e.g. `score >= 10`. Repeat to combine.
    #[arg(long = "filter", value_name = "EXPR")]
    pub filter: Vec<FilterSpec>,
}

#[derive(Args)]
pub struct StatsArgs {
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Aggregate to compute.
    #[arg(long = "kind", value_name = "KIND")]
    pub kind: AggregateKind,

    /// Aggregate a whole column, by name or position.
    #[arg(long = "column", value_name = "COL", conflicts_with = "range")]
    pub column: Option<String>,

    /// Aggregate an inclusive cell range `R0:C0-R1:C1`.
    #[arg(long = "range", value_name = "RANGE", required_unless_present = "column")]
    pub range: Option<CellRange>,
}

#[derive(Args)]
pub struct EditArgs {
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// An edit, e.g. `set 0 score 1.5`. Applied in order; repeat as needed.
    #[arg(long = "op", value_name = "OP", required = true)]
    pub ops: Vec<EditOp>,

    /// Save here instead of overwriting FILE.
    #[arg(long = "output", short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Apply and report without saving.
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct SettingsArgs {
    #[arg(long = "dark-mode", value_enum, value_name = "on|off")]
    pub dark_mode: Option<Toggle>,

    /// Maximum undo depth; 0 for unlimited.
    #[arg(long = "history-limit", value_name = "N")]
    pub history_limit: Option<usize>,

    #[arg(long = "preview-rows", value_name = "N")]
    pub preview_rows: Option<usize>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
