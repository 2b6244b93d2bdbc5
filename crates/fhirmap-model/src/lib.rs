//! Data model for the clinical bundle mapper.
//!
//! Holds the typed resource records produced by bundle parsing, the entity
//! kinds and surrogate identifiers used in the output tables, and the
//! [`MappingConfig`] that parameterizes a mapping run.

pub mod error;
pub mod ids;
pub mod options;
pub mod resources;

pub use error::{ModelError, Result};
pub use ids::{EntityKind, SurrogateId};
pub use options::{Cap, DanglingPolicy, LocationPolicy, MappingCaps, MappingConfig, TableKind};
pub use resources::{
    Address, Coding, Encounter, HumanName, MedicationAdministration, Observation, Organization,
    ParsedBundle, Patient, Quantity, Resource,
};
