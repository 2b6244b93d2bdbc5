//! Row projection.
//!
//! Each function turns one resolved record into the cells of its table, in
//! the column order of [`crate::schema`]. Blank optional fields take the
//! literals in [`defaults`]; foreign keys that did not resolve become empty
//! cells. Records are never modified.

use fhirmap_model::{
    Address, Coding, Encounter, MedicationAdministration, Observation, Organization, Patient,
    SurrogateId,
};

use crate::format::{date, date_time, or_blank, or_default};
use crate::location::{ROLE_CODE_SYSTEM, StaySegment, SyntheticLocation};

/// One output row.
pub type Row = Vec<String>;

/// Literals substituted for blank source fields.
pub mod defaults {
    pub const GENDER: &str = "female";
    pub const ADDRESS: &str = "4200 Fifth Ave";
    pub const CITY: &str = "Pittsburgh";
    pub const STATE: &str = "Pennsylvania";
    pub const ZIP_CODE: &str = "15260";
    pub const COUNTRY: &str = "US";

    pub const ENCOUNTER_TYPE_CODE: &str = "394656005";
    pub const ENCOUNTER_TYPE_DISPLAY: &str = "Inpatient";
    pub const REASON_CODE: &str = "126598008";
    pub const REASON_DISPLAY: &str = "Neoplasm of connective tissues disorder";

    pub const OBSERVATION_CATEGORY: &str = "laboratory";
    /// `component_type` of a quantity-valued observation.
    pub const NUMERIC: &str = "numeric";

    pub const LOCATION_STATUS: &str = "active";
    pub const LOCATION_TYPE_CODE: &str = "prov";
    pub const LOCATION_TYPE_SYSTEM: &str =
        "http://terminology.hl7.org/CodeSystem/organization-type";
    pub const LOCATION_TYPE_DISPLAY: &str = "Healthcare Provider";
}

/// Resolved keys of a child row.
#[derive(Debug, Clone, Copy)]
pub struct RowKeys<'a> {
    pub id: &'a SurrogateId,
    pub patient_id: Option<&'a SurrogateId>,
    pub encounter_id: Option<&'a SurrogateId>,
}

fn key(id: Option<&SurrogateId>) -> String {
    id.map(ToString::to_string).unwrap_or_default()
}

fn coding_parts(coding: Option<&Coding>) -> (Option<&str>, Option<&str>, Option<&str>) {
    coding.map_or((None, None, None), |coding| {
        (
            coding.code.as_deref(),
            coding.system.as_deref(),
            coding.display.as_deref(),
        )
    })
}

fn address_cells(address: &Address) -> [String; 4] {
    [
        or_default(address.line.as_deref(), defaults::ADDRESS).to_string(),
        or_default(address.city.as_deref(), defaults::CITY).to_string(),
        or_default(address.state.as_deref(), defaults::STATE).to_string(),
        or_default(address.postal_code.as_deref(), defaults::ZIP_CODE).to_string(),
    ]
}

pub fn project_patient(id: &SurrogateId, patient: &Patient) -> Row {
    let [address, city, state, zip_code] = address_cells(&patient.address);
    vec![
        id.to_string(),
        date(patient.birth_date),
        or_blank(patient.name.family.as_deref()).to_string(),
        or_blank(patient.name.given.as_deref()).to_string(),
        or_default(patient.gender.as_deref(), defaults::GENDER).to_string(),
        address,
        city,
        state,
        zip_code,
        or_default(patient.address.country.as_deref(), defaults::COUNTRY).to_string(),
    ]
}

/// Resolved keys of an encounter row.
#[derive(Debug, Clone, Copy)]
pub struct EncounterKeys<'a> {
    pub id: &'a SurrogateId,
    pub patient_id: Option<&'a SurrogateId>,
    pub location_id: Option<&'a SurrogateId>,
    pub service_provider_display: Option<&'a str>,
}

pub fn project_encounter(encounter: &Encounter, keys: EncounterKeys<'_>) -> Row {
    let (type_code, _, type_display) = coding_parts(encounter.visit_type.as_ref());
    let (reason_code, _, reason_display) = coding_parts(encounter.reason.as_ref());
    vec![
        keys.id.to_string(),
        date_time(encounter.start),
        date_time(encounter.end),
        key(keys.patient_id),
        or_default(type_code, defaults::ENCOUNTER_TYPE_CODE).to_string(),
        or_default(type_display, defaults::ENCOUNTER_TYPE_DISPLAY).to_string(),
        or_default(reason_code, defaults::REASON_CODE).to_string(),
        or_default(reason_display, defaults::REASON_DISPLAY).to_string(),
        key(keys.location_id),
        or_blank(keys.service_provider_display).to_string(),
    ]
}

/// Quantity results fill value, unit and `numeric`; anything else leaves
/// the three cells empty.
pub fn project_observation(observation: &Observation, keys: RowKeys<'_>) -> Row {
    let (code, _, display) = coding_parts(observation.code.as_ref());
    let [value, unit, kind] = match &observation.value {
        Some(quantity) => [
            quantity.value.clone(),
            or_blank(quantity.unit.as_deref()).to_string(),
            defaults::NUMERIC.to_string(),
        ],
        None => Default::default(),
    };
    vec![
        keys.id.to_string(),
        date_time(observation.effective),
        key(keys.patient_id),
        key(keys.encounter_id),
        or_blank(code).to_string(),
        or_blank(display).to_string(),
        value,
        unit,
        kind,
        or_default(
            observation.category.as_deref(),
            defaults::OBSERVATION_CATEGORY,
        )
        .to_string(),
    ]
}

pub fn project_medication(medication: &MedicationAdministration, keys: RowKeys<'_>) -> Row {
    let (code, system, display) = coding_parts(medication.medication.as_ref());
    vec![
        keys.id.to_string(),
        or_blank(medication.status.as_deref()).to_string(),
        date_time(medication.effective),
        key(keys.patient_id),
        key(keys.encounter_id),
        or_blank(code).to_string(),
        or_blank(system).to_string(),
        or_blank(display).to_string(),
    ]
}

/// A location row derived from a service-provider organization.
pub fn project_organization(id: &SurrogateId, organization: &Organization) -> Row {
    let [address, city, state, zip_code] = address_cells(&organization.address);
    let (code, system, display) = coding_parts(organization.org_type.as_ref());
    vec![
        id.to_string(),
        or_blank(organization.name.as_deref()).to_string(),
        address,
        city,
        state,
        zip_code,
        defaults::LOCATION_STATUS.to_string(),
        or_default(code, defaults::LOCATION_TYPE_CODE).to_string(),
        or_default(system, defaults::LOCATION_TYPE_SYSTEM).to_string(),
        or_default(display, defaults::LOCATION_TYPE_DISPLAY).to_string(),
    ]
}

/// A location row for a ward produced by the duration heuristic.
pub fn project_synthetic_location(id: &SurrogateId, location: &SyntheticLocation) -> Row {
    let [address, city, state, zip_code] = address_cells(&Address::default());
    vec![
        id.to_string(),
        location.name.to_string(),
        address,
        city,
        state,
        zip_code,
        defaults::LOCATION_STATUS.to_string(),
        location.type_code.to_string(),
        ROLE_CODE_SYSTEM.to_string(),
        location.type_display.to_string(),
    ]
}

pub fn project_encounter_location(
    encounter_id: &SurrogateId,
    segment: &StaySegment,
    location_id: Option<&SurrogateId>,
) -> Row {
    vec![
        encounter_id.to_string(),
        date_time(Some(segment.start)),
        date_time(Some(segment.end)),
        key(location_id),
    ]
}
