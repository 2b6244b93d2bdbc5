//! Configuration for a mapping run.
//!
//! One engine serves every sampling variant; the variants differ only in
//! the caps, the tables written, and the stay-location policy.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{ModelError, Result};

/// Maximum cardinality for one relationship edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<usize>", into = "Option<usize>")]
pub enum Cap {
    /// No trimming.
    #[default]
    Unbounded,
    /// Keep at most this many items.
    AtMost(usize),
}

impl Cap {
    pub fn is_unbounded(&self) -> bool {
        matches!(self, Cap::Unbounded)
    }

    /// Number of items kept out of `len`.
    pub fn allowance(self, len: usize) -> usize {
        match self {
            Cap::Unbounded => len,
            Cap::AtMost(max) => max.min(len),
        }
    }
}

impl From<Option<usize>> for Cap {
    fn from(value: Option<usize>) -> Self {
        value.map_or(Cap::Unbounded, Cap::AtMost)
    }
}

impl From<Cap> for Option<usize> {
    fn from(value: Cap) -> Self {
        match value {
            Cap::Unbounded => None,
            Cap::AtMost(max) => Some(max),
        }
    }
}

impl fmt::Display for Cap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cap::Unbounded => f.write_str("unbounded"),
            Cap::AtMost(max) => write!(f, "{max}"),
        }
    }
}

/// Per-relationship caps applied by the sampling limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingCaps {
    #[serde(skip_serializing_if = "Cap::is_unbounded")]
    pub patients: Cap,
    #[serde(skip_serializing_if = "Cap::is_unbounded")]
    pub encounters_per_patient: Cap,
    #[serde(skip_serializing_if = "Cap::is_unbounded")]
    pub observations_per_encounter: Cap,
    #[serde(skip_serializing_if = "Cap::is_unbounded")]
    pub medications_per_encounter: Cap,
}

/// The six output tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Patients,
    Encounters,
    Observations,
    MedicationAdministrations,
    Locations,
    EncounterLocations,
}

impl TableKind {
    pub const ALL: [TableKind; 6] = [
        TableKind::Patients,
        TableKind::Encounters,
        TableKind::Observations,
        TableKind::MedicationAdministrations,
        TableKind::Locations,
        TableKind::EncounterLocations,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TableKind::Patients => "patients",
            TableKind::Encounters => "encounters",
            TableKind::Observations => "observations",
            TableKind::MedicationAdministrations => "medication_administrations",
            TableKind::Locations => "locations",
            TableKind::EncounterLocations => "encounter_locations",
        }
    }

    pub fn file_name(self) -> String {
        format!("{}.tsv", self.name())
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TableKind {
    type Err = ModelError;

    fn from_str(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        let name = trimmed.strip_suffix(".tsv").unwrap_or(trimmed);
        TableKind::ALL
            .into_iter()
            .find(|table| table.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| ModelError::UnknownTable(value.to_string()))
    }
}

/// How encounter stay segments are derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LocationPolicy {
    /// One segment per encounter at its service-provider organization.
    Direct,
    /// Segments chosen from the total stay duration.
    #[default]
    DurationHeuristic,
}

/// What to do with a row whose foreign key does not resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DanglingPolicy {
    /// Emit the row with a blank cell; the reference is reported.
    #[default]
    NullFill,
    /// Drop the row; the reference is reported.
    ExcludeRow,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingConfig {
    pub caps: MappingCaps,
    pub tables: Vec<TableKind>,
    pub location_policy: LocationPolicy,
    pub dangling: DanglingPolicy,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self::full()
    }
}

impl MappingConfig {
    /// Every table, no caps.
    pub fn full() -> Self {
        Self {
            caps: MappingCaps::default(),
            tables: TableKind::ALL.to_vec(),
            location_policy: LocationPolicy::default(),
            dangling: DanglingPolicy::default(),
        }
    }

    /// Small demo extract: 5 patients, 10 encounters each, 10 children per
    /// encounter.
    pub fn reduced() -> Self {
        Self {
            caps: MappingCaps {
                patients: Cap::AtMost(5),
                encounters_per_patient: Cap::AtMost(10),
                observations_per_encounter: Cap::AtMost(10),
                medications_per_encounter: Cap::AtMost(10),
            },
            ..Self::full()
        }
    }

    pub fn with_caps(mut self, caps: MappingCaps) -> Self {
        self.caps = caps;
        self
    }

    pub fn with_tables(mut self, tables: Vec<TableKind>) -> Self {
        self.tables = tables;
        self
    }

    pub fn with_location_policy(mut self, policy: LocationPolicy) -> Self {
        self.location_policy = policy;
        self
    }

    pub fn with_dangling(mut self, policy: DanglingPolicy) -> Self {
        self.dangling = policy;
        self
    }

    pub fn includes(&self, table: TableKind) -> bool {
        self.tables.contains(&table)
    }

    /// Included tables in canonical order, without duplicates.
    pub fn included_tables(&self) -> Vec<TableKind> {
        TableKind::ALL
            .into_iter()
            .filter(|table| self.includes(*table))
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        if self.tables.is_empty() {
            return Err(ModelError::InvalidConfig(
                "at least one output table must be selected".to_string(),
            ));
        }
        Ok(())
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| ModelError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a TOML config file. Missing keys keep their full-run defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ModelError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&text).map_err(|source| ModelError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }
}
