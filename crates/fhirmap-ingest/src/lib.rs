//! Bundle ingestion utilities.
//!
//! This crate finds bundle documents in an input folder and turns each one
//! into a [`ParsedBundle`](fhirmap_model::ParsedBundle) of typed resource
//! records.
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use fhirmap_ingest::{list_bundle_files, read_bundle};
//!
//! for path in list_bundle_files(Path::new("synthea/fhir"))? {
//!     let bundle = read_bundle(&path)?;
//!     println!("{}: {} resources", path.display(), bundle.resources.len());
//! }
//! ```

mod bundle;
mod datetime;
mod discovery;
mod error;

// === Error Types ===
pub use error::{IngestError, Result};

// === Bundle Parsing ===
pub use bundle::{parse_bundle, read_bundle};
pub use datetime::{parse_date, parse_date_time};

// === File Discovery ===
pub use discovery::list_bundle_files;
