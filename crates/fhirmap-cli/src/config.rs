//! Builds the effective [`MappingConfig`] from a file, a preset, and flags.

use anyhow::{Context, Result};

use fhirmap_model::{Cap, DanglingPolicy, LocationPolicy, MappingConfig};

use crate::cli::{DanglingArg, LocationPolicyArg, MapArgs, PresetArg};

/// Starts from `--config` or `--preset` (default: full) and applies every
/// explicit flag on top.
pub fn resolve_config(args: &MapArgs) -> Result<MappingConfig> {
    let mut config = match (&args.config, args.preset) {
        (Some(path), _) => MappingConfig::load(path)
            .with_context(|| format!("load config {}", path.display()))?,
        (None, Some(PresetArg::Reduced)) => MappingConfig::reduced(),
        (None, Some(PresetArg::Full) | None) => MappingConfig::full(),
    };

    if let Some(max) = args.max_patients {
        config.caps.patients = Cap::AtMost(max);
    }
    if let Some(max) = args.max_encounters {
        config.caps.encounters_per_patient = Cap::AtMost(max);
    }
    if let Some(max) = args.max_observations {
        config.caps.observations_per_encounter = Cap::AtMost(max);
    }
    if let Some(max) = args.max_medications {
        config.caps.medications_per_encounter = Cap::AtMost(max);
    }
    if let Some(policy) = args.location_policy {
        config.location_policy = match policy {
            LocationPolicyArg::Direct => LocationPolicy::Direct,
            LocationPolicyArg::DurationHeuristic => LocationPolicy::DurationHeuristic,
        };
    }
    if let Some(policy) = args.dangling {
        config.dangling = match policy {
            DanglingArg::NullFill => DanglingPolicy::NullFill,
            DanglingArg::ExcludeRow => DanglingPolicy::ExcludeRow,
        };
    }
    if !args.tables.is_empty() {
        config.tables.clone_from(&args.tables);
    }

    config.validate().context("invalid mapping configuration")?;
    Ok(config)
}
