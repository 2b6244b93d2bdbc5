//! CLI argument definitions for the bundle mapper.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

use fhirmap_model::TableKind;

#[derive(Parser)]
#[command(
    name = "fhirmap",
    version,
    subcommand_negates_reqs = true,
    about = "Map clinical resource bundles to relational TSV tables",
    long_about = "Map a folder of FHIR bundles to six tab-separated tables.\n\n\
                  Writes patients, encounters, observations, medication administrations,\n\
                  locations and encounter stay segments with sequential surrogate keys.\n\n\
                  `fhirmap <INPUT_DIR> <OUTPUT_DIR>` runs `map` with default options."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// `fhirmap <INPUT_DIR> <OUTPUT_DIR>` is shorthand for `fhirmap map`.
    #[command(flatten)]
    pub map: Option<MapArgs>,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
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
    /// Map a folder of bundles to TSV tables.
    Map(MapArgs),

    /// List the output tables and their columns.
    Tables,
}

#[derive(Args)]
pub struct MapArgs {
    /// Folder containing one JSON bundle per file.
    #[arg(value_name = "INPUT_DIR")]
    pub input_dir: PathBuf,

    /// Folder the TSV tables are written to (created if missing).
    #[arg(value_name = "OUTPUT_DIR")]
    pub output_dir: PathBuf,

    /// TOML mapping configuration; flags below override its values.
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Built-in configuration to start from.
    #[arg(long = "preset", value_enum, conflicts_with = "config")]
    pub preset: Option<PresetArg>,

    /// Maximum number of patients.
    #[arg(long = "max-patients", value_name = "N")]
    pub max_patients: Option<usize>,

    /// Maximum number of encounters per patient.
    #[arg(long = "max-encounters", value_name = "N")]
    pub max_encounters: Option<usize>,

    /// Maximum number of observations per encounter.
    #[arg(long = "max-observations", value_name = "N")]
    pub max_observations: Option<usize>,

    /// Maximum number of medication administrations per encounter.
    #[arg(long = "max-medications", value_name = "N")]
    pub max_medications: Option<usize>,

    /// How encounter stay segments are derived.
    #[arg(long = "location-policy", value_enum)]
    pub location_policy: Option<LocationPolicyArg>,

    /// What to do with rows whose parent reference does not resolve.
    #[arg(long = "dangling", value_enum)]
    pub dangling: Option<DanglingArg>,

    /// Comma-separated tables to write (default: all).
    #[arg(long = "tables", value_name = "TABLE", value_delimiter = ',')]
    pub tables: Vec<TableKind>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum PresetArg {
    /// Every table, no caps.
    Full,
    /// 5 patients, 10 encounters each, 10 children per encounter.
    Reduced,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LocationPolicyArg {
    Direct,
    DurationHeuristic,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum DanglingArg {
    NullFill,
    ExcludeRow,
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

impl Cli {
    /// The map arguments, from either the `map` subcommand or the bare
    /// positional form. `None` for other subcommands or an empty command
    /// line.
    pub fn map_args(&self) -> Option<&MapArgs> {
        match &self.command {
            Some(Command::Map(args)) => Some(args),
            Some(Command::Tables) => None,
            None => self.map.as_ref(),
        }
    }
}
