//! JSON bundle parsing.
//!
//! Only the FHIR R4 elements that feed the output tables are modelled. The
//! wire structs mirror the JSON shape and are converted into the model's
//! resource records; resource types the mapper does not use are skipped.

use std::path::Path;

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use fhirmap_model::{
    Address, Coding, Encounter, HumanName, MedicationAdministration, Observation, Organization,
    ParsedBundle, Patient, Quantity, Resource,
};

use crate::datetime::{parse_date, parse_date_time};
use crate::error::{IngestError, Result};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireBundle {
    resource_type: Option<String>,
    #[serde(default)]
    entry: Vec<WireEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireEntry {
    full_url: Option<String>,
    resource: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct WireReference {
    reference: Option<String>,
    display: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct WireCoding {
    system: Option<String>,
    code: Option<String>,
    display: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct WireCodeableConcept {
    #[serde(default)]
    coding: Vec<WireCoding>,
}

#[derive(Debug, Default, Deserialize)]
struct WireHumanName {
    family: Option<String>,
    #[serde(default)]
    given: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireAddress {
    text: Option<String>,
    #[serde(default)]
    line: Vec<String>,
    city: Option<String>,
    state: Option<String>,
    postal_code: Option<String>,
    country: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct WirePeriod {
    start: Option<String>,
    end: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct WireQuantity {
    value: Option<serde_json::Number>,
    unit: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePatient {
    id: Option<String>,
    birth_date: Option<String>,
    #[serde(default)]
    name: Vec<WireHumanName>,
    gender: Option<String>,
    #[serde(default)]
    address: Vec<WireAddress>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireEncounter {
    id: Option<String>,
    period: Option<WirePeriod>,
    subject: Option<WireReference>,
    #[serde(default, rename = "type")]
    encounter_type: Vec<WireCodeableConcept>,
    #[serde(default)]
    reason_code: Vec<WireCodeableConcept>,
    service_provider: Option<WireReference>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireObservation {
    id: Option<String>,
    effective_date_time: Option<String>,
    issued: Option<String>,
    subject: Option<WireReference>,
    encounter: Option<WireReference>,
    code: Option<WireCodeableConcept>,
    value_quantity: Option<WireQuantity>,
    #[serde(default)]
    category: Vec<WireCodeableConcept>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireMedicationAdministration {
    id: Option<String>,
    status: Option<String>,
    effective_date_time: Option<String>,
    effective_period: Option<WirePeriod>,
    subject: Option<WireReference>,
    /// R4 carries the encounter in `context`.
    context: Option<WireReference>,
    medication_codeable_concept: Option<WireCodeableConcept>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireOrganization {
    id: Option<String>,
    name: Option<String>,
    #[serde(default)]
    address: Vec<WireAddress>,
    #[serde(default, rename = "type")]
    organization_type: Vec<WireCodeableConcept>,
}

/// Reads and parses one bundle file.
pub fn read_bundle(path: &Path) -> Result<ParsedBundle> {
    let text = std::fs::read_to_string(path).map_err(|source| IngestError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    parse_bundle(&text, path)
}

/// Parses bundle JSON. `source` is only used for diagnostics.
pub fn parse_bundle(text: &str, source: &Path) -> Result<ParsedBundle> {
    let wire: WireBundle = serde_json::from_str(text)
        .map_err(|e| IngestError::malformed(source, e.to_string()))?;

    match wire.resource_type.as_deref() {
        Some("Bundle") => {}
        Some(other) => {
            return Err(IngestError::UnsupportedDocument {
                path: source.to_path_buf(),
                resource_type: other.to_string(),
            });
        }
        None => return Err(IngestError::malformed(source, "missing resourceType")),
    }

    let mut resources = Vec::with_capacity(wire.entry.len());
    let mut skipped = 0usize;
    for (index, entry) in wire.entry.into_iter().enumerate() {
        let Some(value) = entry.resource else {
            skipped += 1;
            continue;
        };
        let parser = EntryParser {
            source,
            index,
            full_url: entry.full_url.as_deref(),
        };
        match parser.parse(value)? {
            Some(resource) => resources.push(resource),
            None => skipped += 1,
        }
    }

    debug!(
        source = %source.display(),
        resource_count = resources.len(),
        skipped,
        "parsed bundle"
    );

    Ok(ParsedBundle::new(source, resources))
}

struct EntryParser<'a> {
    source: &'a Path,
    index: usize,
    full_url: Option<&'a str>,
}

impl EntryParser<'_> {
    fn parse(&self, value: Value) -> Result<Option<Resource>> {
        let resource_type = value
            .get("resourceType")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| self.error("resource without resourceType"))?;

        let resource = match resource_type.as_str() {
            "Patient" => Resource::Patient(self.patient(self.decode(value)?)?),
            "Encounter" => Resource::Encounter(self.encounter(self.decode(value)?)?),
            "Observation" => Resource::Observation(self.observation(self.decode(value)?)?),
            "MedicationAdministration" => {
                Resource::MedicationAdministration(self.medication(self.decode(value)?)?)
            }
            "Organization" => Resource::Organization(self.organization(self.decode(value)?)?),
            _ => return Ok(None),
        };
        Ok(Some(resource))
    }

    fn decode<T: DeserializeOwned>(&self, value: Value) -> Result<T> {
        serde_json::from_value(value).map_err(|e| self.error(e.to_string()))
    }

    fn error(&self, message: impl AsRef<str>) -> IngestError {
        IngestError::malformed(
            self.source,
            format!("entry {}: {}", self.index, message.as_ref()),
        )
    }

    /// Resource id, falling back to the entry's full URL.
    fn id(&self, id: Option<String>) -> Result<String> {
        id.filter(|value| !value.trim().is_empty())
            .or_else(|| self.full_url.map(str::to_string))
            .ok_or_else(|| self.error("resource without id or fullUrl"))
    }

    fn date_time(&self, raw: Option<&str>) -> Result<Option<DateTime<FixedOffset>>> {
        match raw {
            None => Ok(None),
            Some(raw) => parse_date_time(raw)
                .map(Some)
                .ok_or_else(|| self.error(format!("invalid dateTime '{raw}'"))),
        }
    }

    fn date(&self, raw: Option<&str>) -> Result<Option<NaiveDate>> {
        match raw {
            None => Ok(None),
            Some(raw) => parse_date(raw)
                .map(Some)
                .ok_or_else(|| self.error(format!("invalid date '{raw}'"))),
        }
    }

    fn patient(&self, wire: WirePatient) -> Result<Patient> {
        let name = wire
            .name
            .into_iter()
            .next()
            .map(|name| HumanName {
                family: name.family,
                given: name.given.into_iter().next(),
            })
            .unwrap_or_default();
        Ok(Patient {
            id: self.id(wire.id)?,
            birth_date: self.date(wire.birth_date.as_deref())?,
            name,
            gender: wire.gender,
            address: first_address(wire.address),
        })
    }

    fn encounter(&self, wire: WireEncounter) -> Result<Encounter> {
        let period = wire.period.unwrap_or_default();
        let provider = wire.service_provider.unwrap_or_default();
        Ok(Encounter {
            id: self.id(wire.id)?,
            start: self.date_time(period.start.as_deref())?,
            end: self.date_time(period.end.as_deref())?,
            patient_ref: wire.subject.and_then(|subject| subject.reference),
            visit_type: first_coding(wire.encounter_type),
            reason: first_coding(wire.reason_code),
            service_provider_ref: provider.reference,
            service_provider_display: provider.display,
        })
    }

    fn observation(&self, wire: WireObservation) -> Result<Observation> {
        let effective = match wire.effective_date_time.as_deref() {
            Some(raw) => self.date_time(Some(raw))?,
            None => self.date_time(wire.issued.as_deref())?,
        };
        let value = wire.value_quantity.and_then(|quantity| {
            quantity.value.map(|value| Quantity {
                value: value.to_string(),
                unit: quantity.unit,
            })
        });
        Ok(Observation {
            id: self.id(wire.id)?,
            effective,
            patient_ref: wire.subject.and_then(|subject| subject.reference),
            encounter_ref: wire.encounter.and_then(|encounter| encounter.reference),
            code: wire.code.and_then(concept_coding),
            value,
            category: first_coding(wire.category).and_then(|coding| coding.code),
        })
    }

    fn medication(&self, wire: WireMedicationAdministration) -> Result<MedicationAdministration> {
        let effective = match wire.effective_date_time.as_deref() {
            Some(raw) => self.date_time(Some(raw))?,
            None => self.date_time(
                wire.effective_period
                    .as_ref()
                    .and_then(|period| period.start.as_deref()),
            )?,
        };
        Ok(MedicationAdministration {
            id: self.id(wire.id)?,
            status: wire.status,
            effective,
            patient_ref: wire.subject.and_then(|subject| subject.reference),
            encounter_ref: wire.context.and_then(|context| context.reference),
            medication: wire.medication_codeable_concept.and_then(concept_coding),
        })
    }

    fn organization(&self, wire: WireOrganization) -> Result<Organization> {
        Ok(Organization {
            id: self.id(wire.id)?,
            name: wire.name,
            address: first_address(wire.address),
            org_type: first_coding(wire.organization_type),
        })
    }
}

fn concept_coding(concept: WireCodeableConcept) -> Option<Coding> {
    concept.coding.into_iter().next().map(|coding| Coding {
        system: coding.system,
        code: coding.code,
        display: coding.display,
    })
}

fn first_coding(concepts: Vec<WireCodeableConcept>) -> Option<Coding> {
    concepts.into_iter().next().and_then(concept_coding)
}

fn first_address(addresses: Vec<WireAddress>) -> Address {
    let Some(address) = addresses.into_iter().next() else {
        return Address::default();
    };
    let line = address
        .text
        .filter(|text| !text.trim().is_empty())
        .or_else(|| address.line.into_iter().next());
    Address {
        line,
        city: address.city,
        state: address.state,
        postal_code: address.postal_code,
        country: address.country,
    }
}
