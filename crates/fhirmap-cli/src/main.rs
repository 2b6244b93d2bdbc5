//! Clinical bundle to relational table mapper CLI.

use clap::{ColorChoice, CommandFactory, Parser};
use fhirmap_cli::cli::{Cli, Command, LogFormatArg, LogLevelArg};
use fhirmap_cli::logging::{LogConfig, LogFormat, init_logging};
use std::io::{self, IsTerminal};
use tracing::level_filters::LevelFilter;

mod commands;
mod summary;
mod types;

use crate::commands::{run_map, run_tables};
use crate::summary::print_summary;

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let exit_code = match (&cli.command, cli.map_args()) {
        (_, Some(args)) => match run_map(args) {
            Ok(result) => {
                print_summary(&result);
                0
            }
            Err(error) => {
                print_error_banner(&error);
                1
            }
        },
        (Some(Command::Tables), None) => match run_tables() {
            Ok(()) => 0,
            Err(error) => {
                print_error_banner(&error);
                1
            }
        },
        (Some(Command::Map(_)) | None, None) => {
            let _ = Cli::command().print_help();
            2
        }
    };
    std::process::exit(exit_code);
}

fn print_error_banner(error: &anyhow::Error) {
    eprintln!();
    eprintln!("==================== fhirmap failed ====================");
    eprintln!("error: {error}");
    for cause in error.chain().skip(1) {
        eprintln!("  caused by: {cause}");
    }
    eprintln!("Output files written before the failure were left in place.");
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
