//! Typed resource records read from a bundle.
//!
//! These are the engine's view of a parsed document: only the fields that
//! feed the output tables are kept. Identifiers and references are stored
//! exactly as they appeared in the source; normalization happens in the
//! engine.

use std::path::PathBuf;

use chrono::{DateTime, FixedOffset, NaiveDate};

/// A code/system/display triple (first coding of a codeable concept).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Coding {
    pub system: Option<String>,
    pub code: Option<String>,
    pub display: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Address {
    /// Free-text address, or the first address line when no text is given.
    pub line: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HumanName {
    pub family: Option<String>,
    /// First given name.
    pub given: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Quantity {
    /// Decimal text exactly as written in the source, e.g. `70.00`.
    pub value: String,
    pub unit: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Patient {
    pub id: String,
    pub birth_date: Option<NaiveDate>,
    pub name: HumanName,
    pub gender: Option<String>,
    pub address: Address,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Encounter {
    pub id: String,
    pub start: Option<DateTime<FixedOffset>>,
    pub end: Option<DateTime<FixedOffset>>,
    pub patient_ref: Option<String>,
    pub visit_type: Option<Coding>,
    pub reason: Option<Coding>,
    /// Reference to the organization providing the service.
    pub service_provider_ref: Option<String>,
    pub service_provider_display: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub id: String,
    pub effective: Option<DateTime<FixedOffset>>,
    pub patient_ref: Option<String>,
    pub encounter_ref: Option<String>,
    pub code: Option<Coding>,
    /// Present only for quantity-typed results.
    pub value: Option<Quantity>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MedicationAdministration {
    pub id: String,
    pub status: Option<String>,
    pub effective: Option<DateTime<FixedOffset>>,
    pub patient_ref: Option<String>,
    pub encounter_ref: Option<String>,
    pub medication: Option<Coding>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Organization {
    pub id: String,
    pub name: Option<String>,
    pub address: Address,
    pub org_type: Option<Coding>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resource {
    Patient(Patient),
    Encounter(Encounter),
    Observation(Observation),
    MedicationAdministration(MedicationAdministration),
    Organization(Organization),
}

impl Resource {
    pub fn id(&self) -> &str {
        match self {
            Resource::Patient(patient) => &patient.id,
            Resource::Encounter(encounter) => &encounter.id,
            Resource::Observation(observation) => &observation.id,
            Resource::MedicationAdministration(medication) => &medication.id,
            Resource::Organization(organization) => &organization.id,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Resource::Patient(_) => "Patient",
            Resource::Encounter(_) => "Encounter",
            Resource::Observation(_) => "Observation",
            Resource::MedicationAdministration(_) => "MedicationAdministration",
            Resource::Organization(_) => "Organization",
        }
    }
}

/// One input document reduced to the resources the mapper understands.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedBundle {
    /// Where the bundle was read from, for diagnostics.
    pub source: PathBuf,
    /// Resources in document order.
    pub resources: Vec<Resource>,
}

impl ParsedBundle {
    pub fn new(source: impl Into<PathBuf>, resources: Vec<Resource>) -> Self {
        Self {
            source: source.into(),
            resources,
        }
    }

    pub fn patients(&self) -> impl Iterator<Item = &Patient> {
        self.resources.iter().filter_map(|resource| match resource {
            Resource::Patient(patient) => Some(patient),
            _ => None,
        })
    }

    pub fn encounters(&self) -> impl Iterator<Item = &Encounter> {
        self.resources.iter().filter_map(|resource| match resource {
            Resource::Encounter(encounter) => Some(encounter),
            _ => None,
        })
    }

    pub fn observations(&self) -> impl Iterator<Item = &Observation> {
        self.resources.iter().filter_map(|resource| match resource {
            Resource::Observation(observation) => Some(observation),
            _ => None,
        })
    }

    pub fn medication_administrations(&self) -> impl Iterator<Item = &MedicationAdministration> {
        self.resources.iter().filter_map(|resource| match resource {
            Resource::MedicationAdministration(medication) => Some(medication),
            _ => None,
        })
    }

    pub fn organizations(&self) -> impl Iterator<Item = &Organization> {
        self.resources.iter().filter_map(|resource| match resource {
            Resource::Organization(organization) => Some(organization),
            _ => None,
        })
    }
}
