#![deny(unsafe_code)]

use std::fmt;
use std::str::FromStr;

use crate::ModelError;

/// Entity types that receive their own surrogate key sequence.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum EntityKind {
    Patient,
    Encounter,
    Observation,
    MedicationAdministration,
    Location,
}

impl EntityKind {
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Patient,
        EntityKind::Encounter,
        EntityKind::Observation,
        EntityKind::MedicationAdministration,
        EntityKind::Location,
    ];

    /// Prefix used when formatting surrogate keys of this kind.
    pub fn prefix(self) -> &'static str {
        match self {
            EntityKind::Patient => "pat",
            EntityKind::Encounter => "enc",
            EntityKind::Observation => "obs",
            EntityKind::MedicationAdministration => "med",
            EntityKind::Location => "loc",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Patient => "Patient",
            EntityKind::Encounter => "Encounter",
            EntityKind::Observation => "Observation",
            EntityKind::MedicationAdministration => "MedicationAdministration",
            EntityKind::Location => "Location",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = ModelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        EntityKind::ALL
            .into_iter()
            .find(|kind| {
                kind.as_str().eq_ignore_ascii_case(trimmed) || kind.prefix() == trimmed
            })
            .ok_or_else(|| ModelError::UnknownEntityKind(value.to_string()))
    }
}

/// A sequentially assigned, human-readable key such as `enc_3`.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct SurrogateId(String);

impl SurrogateId {
    pub fn new(kind: EntityKind, sequence: u64) -> Self {
        Self(format!("{}_{sequence}", kind.prefix()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SurrogateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SurrogateId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
