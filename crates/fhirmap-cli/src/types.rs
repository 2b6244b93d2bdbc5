use std::path::PathBuf;

use fhirmap_core::RunReport;
use fhirmap_model::MappingConfig;

#[derive(Debug)]
pub struct MapResult {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub config: MappingConfig,
    pub report: RunReport,
}
