//! Resource-graph to relational mapping engine.
//!
//! The engine consumes [`ParsedBundle`](fhirmap_model::ParsedBundle)s,
//! indexes the references between their resources, assigns sequential
//! surrogate keys, applies the configured sampling caps, derives encounter
//! stay segments, and projects everything into six fixed tables handed to a
//! [`RelationalWriter`].
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use fhirmap_core::run_mapping;
//! use fhirmap_model::MappingConfig;
//!
//! let report = run_mapping(Path::new("fhir"), Path::new("out"), &MappingConfig::reduced())?;
//! println!("{} dangling references", report.dangling.len());
//! ```

pub mod engine;
pub mod error;
pub mod format;
pub mod index;
pub mod location;
pub mod pipeline;
pub mod projector;
pub mod reference;
pub mod registry;
pub mod sampling;
pub mod schema;
pub mod writer;

pub use engine::{MappedTables, MappingOutput, map_index};
pub use error::{MapError, Result};
pub use index::{GraphIndex, IndexStats};
pub use location::{StayLocation, StaySegment, SyntheticLocation, synthesize_stay};
pub use pipeline::{RunReport, run_mapping};
pub use projector::Row;
pub use reference::normalize_reference;
pub use registry::{DanglingReference, SurrogateRegistry};
pub use sampling::limit;
pub use writer::{MemoryWriter, RelationalWriter, TsvWriter};
