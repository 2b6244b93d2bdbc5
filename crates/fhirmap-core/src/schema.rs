//! Fixed column layouts of the output tables.

use fhirmap_model::TableKind;

pub const PATIENT_COLUMNS: [&str; 10] = [
    "id",
    "birth_date",
    "last_name",
    "first_name",
    "gender",
    "address",
    "city",
    "state",
    "zip_code",
    "country",
];

pub const ENCOUNTER_COLUMNS: [&str; 10] = [
    "id",
    "start",
    "end",
    "patient_id",
    "type_code",
    "type_display",
    "reason_code",
    "reason_display",
    "location_id",
    "service_provider_display",
];

pub const OBSERVATION_COLUMNS: [&str; 10] = [
    "id",
    "effective",
    "patient_id",
    "encounter_id",
    "code",
    "code_display",
    "component_value",
    "component_unit",
    "component_type",
    "category",
];

pub const MEDICATION_ADMINISTRATION_COLUMNS: [&str; 8] = [
    "id",
    "status",
    "effective",
    "patient_id",
    "encounter_id",
    "medication_code",
    "medication_system",
    "medication_display",
];

pub const LOCATION_COLUMNS: [&str; 10] = [
    "id",
    "name",
    "address",
    "city",
    "state",
    "zip_code",
    "status",
    "type_code",
    "type_system",
    "type_display",
];

pub const ENCOUNTER_LOCATION_COLUMNS: [&str; 4] = ["encounter_id", "start", "end", "location_id"];

/// Header row of `table`.
pub fn columns(table: TableKind) -> &'static [&'static str] {
    match table {
        TableKind::Patients => &PATIENT_COLUMNS,
        TableKind::Encounters => &ENCOUNTER_COLUMNS,
        TableKind::Observations => &OBSERVATION_COLUMNS,
        TableKind::MedicationAdministrations => &MEDICATION_ADMINISTRATION_COLUMNS,
        TableKind::Locations => &LOCATION_COLUMNS,
        TableKind::EncounterLocations => &ENCOUNTER_LOCATION_COLUMNS,
    }
}
