//! pqview command-line tool.

use std::io::{self, IsTerminal};

use clap::{ColorChoice, Parser};
use pqview_cli::logging::{LogConfig, LogFormat, init_logging};
use pqview_config::Settings;
use tracing::level_filters::LevelFilter;

mod cli;
mod commands;

use crate::cli::{Cli, Command, LogFormatArg, LogLevelArg};
use crate::commands::{run_edit, run_export, run_schema, run_settings, run_show, run_stats};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }

    let result = match &cli.command {
        Command::Show(args) => run_show(args, &user_settings()),
        Command::Schema { file } => run_schema(file),
        Command::Stats(args) => run_stats(args),
        Command::Edit(args) => run_edit(args, &user_settings()),
        Command::Export { file, csv } => run_export(file, csv),
        Command::Settings(args) => run_settings(args),
    };
    if let Err(error) = result {
        tracing::error!(error = %format!("{error:#}"), "Command failed");
        eprintln!("error: {error:#}");
        std::process::exit(1);
    }
}

/// Settings are optional for read and edit commands; fall back to defaults.
fn user_settings() -> Settings {
    Settings::load().unwrap_or_else(|error| {
        tracing::warn!(%error, "Using default settings");
        Settings::default()
    })
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let level = match cli.log_level {
        Some(LogLevelArg::Error) => LevelFilter::ERROR,
        Some(LogLevelArg::Warn) => LevelFilter::WARN,
        Some(LogLevelArg::Info) => LevelFilter::INFO,
        Some(LogLevelArg::Debug) => LevelFilter::DEBUG,
        Some(LogLevelArg::Trace) => LevelFilter::TRACE,
        None => cli.verbosity.tracing_level_filter(),
    };
    let format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    let mut config = LogConfig::default()
        .with_level(level)
        .with_format(format)
        .with_log_file(cli.log_file.clone());
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
