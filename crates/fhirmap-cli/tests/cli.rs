//! Integration tests for argument parsing and config resolution.

use clap::Parser;
use tempfile::TempDir;

use fhirmap_cli::cli::{Cli, Command, MapArgs, PresetArg};
use fhirmap_cli::config::resolve_config;
use fhirmap_model::{Cap, DanglingPolicy, LocationPolicy, MappingConfig, TableKind};

fn parse_map(args: &[&str]) -> MapArgs {
    let cli = Cli::try_parse_from(args).expect("parse");
    match (cli.command, cli.map) {
        (Some(Command::Map(args)), _) | (None, Some(args)) => args,
        _ => panic!("expected map arguments"),
    }
}

#[test]
fn test_map_defaults_to_full_config() {
    let args = parse_map(&["fhirmap", "map", "in", "out"]);
    assert_eq!(args.input_dir.to_str(), Some("in"));
    assert_eq!(args.output_dir.to_str(), Some("out"));
    assert!(args.tables.is_empty());

    let config = resolve_config(&args).expect("resolve");
    assert_eq!(config, MappingConfig::full());
}

#[test]
fn test_bare_positional_form_maps() {
    let cli = Cli::try_parse_from(["fhirmap", "in", "out", "--max-patients", "4"]).expect("parse");
    assert!(cli.command.is_none());
    let args = cli.map_args().expect("map arguments");
    assert_eq!(args.input_dir.to_str(), Some("in"));
    assert_eq!(args.output_dir.to_str(), Some("out"));

    let config = resolve_config(args).expect("resolve");
    assert_eq!(config.caps.patients, Cap::AtMost(4));
}

#[test]
fn test_subcommand_name_wins_over_positional() {
    let cli = Cli::try_parse_from(["fhirmap", "tables"]).expect("parse");
    assert!(matches!(cli.command, Some(Command::Tables)));
    assert!(cli.map.is_none());
}

#[test]
fn test_reduced_preset_with_override() {
    let args = parse_map(&[
        "fhirmap",
        "map",
        "in",
        "out",
        "--preset",
        "reduced",
        "--max-patients",
        "2",
    ]);
    assert_eq!(args.preset, Some(PresetArg::Reduced));

    let config = resolve_config(&args).expect("resolve");
    assert_eq!(config.caps.patients, Cap::AtMost(2));
    assert_eq!(config.caps.encounters_per_patient, Cap::AtMost(10));
    assert_eq!(config.caps.observations_per_encounter, Cap::AtMost(10));
}

#[test]
fn test_policies_and_tables_from_flags() {
    let args = parse_map(&[
        "fhirmap",
        "map",
        "in",
        "out",
        "--location-policy",
        "direct",
        "--dangling",
        "exclude-row",
        "--tables",
        "patients,encounter_locations.tsv",
    ]);

    let config = resolve_config(&args).expect("resolve");
    assert_eq!(config.location_policy, LocationPolicy::Direct);
    assert_eq!(config.dangling, DanglingPolicy::ExcludeRow);
    assert_eq!(
        config.tables,
        vec![TableKind::Patients, TableKind::EncounterLocations]
    );
}

#[test]
fn test_unknown_table_is_rejected() {
    let result = Cli::try_parse_from(["fhirmap", "map", "in", "out", "--tables", "claims"]);
    assert!(result.is_err());
}

#[test]
fn test_preset_conflicts_with_config() {
    let result = Cli::try_parse_from([
        "fhirmap",
        "map",
        "in",
        "out",
        "--config",
        "mapping.toml",
        "--preset",
        "full",
    ]);
    assert!(result.is_err());
}

#[test]
fn test_config_file_with_flag_override() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("mapping.toml");
    std::fs::write(
        &path,
        r#"
tables = ["patients", "encounters"]
dangling = "exclude-row"

[caps]
patients = 3
encounters_per_patient = 4
"#,
    )
    .expect("write config");
    let path = path.to_str().expect("utf-8 path");

    let args = parse_map(&[
        "fhirmap",
        "map",
        "in",
        "out",
        "--config",
        path,
        "--max-encounters",
        "1",
    ]);
    let config = resolve_config(&args).expect("resolve");
    assert_eq!(config.caps.patients, Cap::AtMost(3));
    assert_eq!(config.caps.encounters_per_patient, Cap::AtMost(1));
    assert_eq!(config.caps.observations_per_encounter, Cap::Unbounded);
    assert_eq!(config.dangling, DanglingPolicy::ExcludeRow);
    assert_eq!(config.location_policy, LocationPolicy::DurationHeuristic);
    assert_eq!(config.tables, vec![TableKind::Patients, TableKind::Encounters]);
}

#[test]
fn test_missing_config_file_is_reported() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("absent.toml");
    let path = path.to_str().expect("utf-8 path");

    let args = parse_map(&["fhirmap", "map", "in", "out", "--config", path]);
    let error = resolve_config(&args).expect_err("missing file");
    assert!(error.to_string().contains("absent.toml"));
}

#[test]
fn test_global_log_flags_after_subcommand() {
    let cli = Cli::try_parse_from([
        "fhirmap",
        "tables",
        "--log-format",
        "json",
        "--log-level",
        "debug",
    ])
    .expect("parse");
    assert!(matches!(cli.command, Some(Command::Tables)));
    assert!(cli.map_args().is_none());
    assert!(cli.log_level.is_some());
}
