//! Cross-reference normalization.
//!
//! Bundles point at each other with several spellings of the same id:
//! `urn:uuid:<id>`, conditional references such as
//! `Organization?identifier=https://github.com/synthetichealth/synthea|<id>`,
//! and relative literals like `Patient/<id>`. All of them reduce to the bare
//! `<id>`. Anything else is returned unchanged.

const URN_PREFIXES: [&str; 2] = ["urn:uuid:", "urn:oid:"];

const RESOURCE_TYPES: [&str; 7] = [
    "Patient",
    "Encounter",
    "Observation",
    "MedicationAdministration",
    "Organization",
    "Location",
    "Practitioner",
];

/// Strips known scheme prefixes from a raw reference. Never fails.
pub fn normalize_reference(raw: &str) -> &str {
    let trimmed = raw.trim();

    if let Some((_, value)) = trimmed.rsplit_once('|')
        && !value.is_empty()
    {
        return value;
    }

    for prefix in URN_PREFIXES {
        if let Some(rest) = trimmed.strip_prefix(prefix) {
            return rest;
        }
    }

    if let Some((resource_type, id)) = trimmed.split_once('/')
        && RESOURCE_TYPES.contains(&resource_type)
        && !id.is_empty()
        && !id.contains('/')
    {
        return id;
    }

    trimmed
}
