use std::time::Instant;

use anyhow::{Context, Result};
use comfy_table::Table;
use tracing::{info, info_span};

use fhirmap_core::{run_mapping, schema};
use fhirmap_model::TableKind;

use fhirmap_cli::cli::MapArgs;
use fhirmap_cli::config::resolve_config;

use crate::summary::apply_table_style;
use crate::types::MapResult;

pub fn run_tables() -> Result<()> {
    let mut table = Table::new();
    table.set_header(vec!["Table", "File", "Columns"]);
    apply_table_style(&mut table);
    for kind in TableKind::ALL {
        table.add_row(vec![
            kind.name().to_string(),
            kind.file_name(),
            schema::columns(kind).join(", "),
        ]);
    }
    println!("{table}");
    Ok(())
}

pub fn run_map(args: &MapArgs) -> Result<MapResult> {
    let config = resolve_config(args)?;
    let span = info_span!("map", input_dir = %args.input_dir.display());
    let _guard = span.enter();
    info!(
        patients = %config.caps.patients,
        encounters_per_patient = %config.caps.encounters_per_patient,
        observations_per_encounter = %config.caps.observations_per_encounter,
        medications_per_encounter = %config.caps.medications_per_encounter,
        location_policy = ?config.location_policy,
        dangling = ?config.dangling,
        "mapping configuration"
    );

    let start = Instant::now();
    let report = run_mapping(&args.input_dir, &args.output_dir, &config).with_context(|| {
        format!(
            "map {} into {}",
            args.input_dir.display(),
            args.output_dir.display()
        )
    })?;
    info!(
        dangling = report.dangling.len(),
        duration_ms = start.elapsed().as_millis(),
        "run complete"
    );

    Ok(MapResult {
        input_dir: args.input_dir.clone(),
        output_dir: args.output_dir.clone(),
        config,
        report,
    })
}
