//! End-to-end run: read bundles, index, map, write.

use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{info, info_span, warn};

use fhirmap_ingest::{list_bundle_files, read_bundle};
use fhirmap_model::{MappingConfig, TableKind};

use crate::engine::{MappedTables, map_index};
use crate::error::Result;
use crate::index::{GraphIndex, IndexStats};
use crate::registry::DanglingReference;
use crate::writer::TsvWriter;

/// What a run read and wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub input_files: Vec<PathBuf>,
    pub index: IndexStats,
    /// Row counts of the written tables, in write order.
    pub tables: Vec<(TableKind, usize)>,
    pub written: Vec<PathBuf>,
    pub dangling: Vec<DanglingReference>,
}

impl RunReport {
    pub fn row_count(&self, table: TableKind) -> Option<usize> {
        self.tables
            .iter()
            .find(|(kind, _)| *kind == table)
            .map(|(_, rows)| *rows)
    }
}

/// Maps every bundle in `input_dir` into TSV tables under `output_dir`.
///
/// Bundles are read one at a time in file-name order. Any read, parse or
/// write failure aborts the run; files already written are left in place.
pub fn run_mapping(
    input_dir: &Path,
    output_dir: &Path,
    config: &MappingConfig,
) -> Result<RunReport> {
    config.validate()?;

    // =========================================================================
    // Stage 1: Ingest and index
    // =========================================================================
    let ingest_span = info_span!("ingest", input_dir = %input_dir.display());
    let ingest_start = Instant::now();
    let (input_files, index) = ingest_span.in_scope(|| -> Result<_> {
        let files = list_bundle_files(input_dir)?;
        let mut index = GraphIndex::new();
        for path in &files {
            let bundle = read_bundle(path)?;
            index.add_bundle(bundle);
        }
        Ok((files, index))
    })?;
    let stats = index.stats();
    info!(
        bundle_count = stats.bundles,
        patients = stats.patients,
        encounters = stats.encounters,
        observations = stats.observations,
        medication_administrations = stats.medication_administrations,
        organizations = stats.organizations,
        duration_ms = ingest_start.elapsed().as_millis(),
        "ingest complete"
    );
    if input_files.is_empty() {
        warn!(input_dir = %input_dir.display(), "no bundle files found");
    }

    // =========================================================================
    // Stage 2: Project
    // =========================================================================
    let project_span = info_span!("project");
    let project_start = Instant::now();
    let output = project_span.in_scope(|| map_index(&index, config));
    info!(
        dangling = output.registry.dangling().len(),
        duration_ms = project_start.elapsed().as_millis(),
        "projection complete"
    );

    // =========================================================================
    // Stage 3: Write
    // =========================================================================
    let tables = config.included_tables();
    let write_span = info_span!("write", output_dir = %output_dir.display());
    let write_start = Instant::now();
    let written = write_span.in_scope(|| write_tables(output_dir, &output.tables, &tables))?;
    info!(
        table_count = written.len(),
        duration_ms = write_start.elapsed().as_millis(),
        "write complete"
    );

    Ok(RunReport {
        input_files,
        index: stats,
        tables: tables
            .iter()
            .map(|&table| (table, output.tables.rows(table).len()))
            .collect(),
        written,
        dangling: output.registry.dangling().to_vec(),
    })
}

fn write_tables(
    output_dir: &Path,
    mapped: &MappedTables,
    tables: &[TableKind],
) -> Result<Vec<PathBuf>> {
    let mut writer = TsvWriter::create(output_dir)?;
    mapped.write_to(&mut writer, tables)?;
    Ok(writer.written().to_vec())
}
