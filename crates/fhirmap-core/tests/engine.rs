//! Engine behavior on small hand-built graphs.

use chrono::{DateTime, FixedOffset};

use fhirmap_core::{GraphIndex, MemoryWriter, map_index};
use fhirmap_model::{
    Cap, Coding, DanglingPolicy, Encounter, EntityKind, LocationPolicy, MappingCaps,
    MappingConfig, MedicationAdministration, Observation, Organization, ParsedBundle, Patient,
    Quantity, Resource, SurrogateId, TableKind,
};

fn at(text: &str) -> Option<DateTime<FixedOffset>> {
    Some(DateTime::parse_from_rfc3339(text).expect("timestamp"))
}

fn patient(id: &str) -> Resource {
    Resource::Patient(Patient {
        id: id.to_string(),
        birth_date: None,
        name: Default::default(),
        gender: Some("male".to_string()),
        address: Default::default(),
    })
}

fn encounter(id: &str, patient: &str, hours: i64) -> Resource {
    let start = at("2020-05-01T08:00:00Z");
    Resource::Encounter(Encounter {
        id: id.to_string(),
        start,
        end: start.map(|start| start + chrono::TimeDelta::hours(hours)),
        patient_ref: Some(format!("urn:uuid:{patient}")),
        visit_type: None,
        reason: None,
        service_provider_ref: Some("urn:uuid:org-1".to_string()),
        service_provider_display: None,
    })
}

fn observation(id: &str, patient: &str, encounter: &str) -> Resource {
    Resource::Observation(Observation {
        id: id.to_string(),
        effective: at("2020-05-01T09:00:00Z"),
        patient_ref: Some(format!("urn:uuid:{patient}")),
        encounter_ref: Some(format!("urn:uuid:{encounter}")),
        code: Some(Coding {
            system: Some("http://loinc.org".to_string()),
            code: Some("8867-4".to_string()),
            display: Some("Heart rate".to_string()),
        }),
        value: Some(Quantity {
            value: "72".to_string(),
            unit: Some("/min".to_string()),
        }),
        category: None,
    })
}

fn medication(id: &str, encounter: &str) -> Resource {
    Resource::MedicationAdministration(MedicationAdministration {
        id: id.to_string(),
        status: Some("completed".to_string()),
        effective: at("2020-05-01T10:00:00Z"),
        patient_ref: None,
        encounter_ref: Some(format!("urn:uuid:{encounter}")),
        medication: None,
    })
}

fn organization() -> Resource {
    Resource::Organization(Organization {
        id: "org-1".to_string(),
        name: Some("General Hospital".to_string()),
        address: Default::default(),
        org_type: None,
    })
}

/// Indexes `resources` behind the organization every encounter points at.
fn index(resources: Vec<Resource>) -> GraphIndex {
    let mut all = vec![organization()];
    all.extend(resources);
    GraphIndex::from_bundles([ParsedBundle::new("bundle.json", all)])
}

fn column(rows: &[Vec<String>], position: usize) -> Vec<&str> {
    rows.iter().map(|row| row[position].as_str()).collect()
}

#[test]
fn observation_cap_keeps_first_rows_of_first_encounter() {
    let graph = index(vec![
        patient("nat_p1"),
        encounter("nat_e1", "nat_p1", 2),
        encounter("nat_e2", "nat_p1", 2),
        observation("nat_o1", "nat_p1", "nat_e1"),
        observation("nat_o2", "nat_p1", "nat_e1"),
        observation("nat_o3", "nat_p1", "nat_e1"),
    ]);
    let config = MappingConfig::full().with_caps(MappingCaps {
        observations_per_encounter: Cap::AtMost(2),
        ..MappingCaps::default()
    });

    let output = map_index(&graph, &config);
    let observations = &output.tables.observations;
    assert_eq!(observations.len(), 2);
    assert_eq!(column(observations, 0), ["obs_1", "obs_2"]);
    assert_eq!(column(observations, 2), ["pat_1", "pat_1"]);
    assert_eq!(column(observations, 3), ["enc_1", "enc_1"]);
    assert_eq!(
        output.registry.get(EntityKind::Encounter, "nat_e1").map(SurrogateId::as_str),
        Some("enc_1")
    );
    assert!(output.registry.dangling().is_empty());
}

#[test]
fn dangling_encounter_reference_null_fills_the_row() {
    let graph = index(vec![
        patient("p1"),
        encounter("e1", "p1", 2),
        observation("o1", "p1", "never-indexed"),
    ]);

    let output = map_index(&graph, &MappingConfig::full());
    let dangling = output.registry.dangling();
    assert_eq!(dangling.len(), 1);
    assert_eq!(dangling[0].kind, EntityKind::Encounter);
    assert_eq!(dangling[0].natural_id, "never-indexed");
    assert_eq!(dangling[0].referenced_from, "Observation o1");

    let observations = &output.tables.observations;
    assert_eq!(observations.len(), 1);
    assert_eq!(observations[0][2], "pat_1");
    assert_eq!(observations[0][3], "");
    assert_eq!(output.registry.assigned(EntityKind::Encounter), 1);
}

#[test]
fn exclude_row_policy_drops_dangling_rows() {
    let graph = index(vec![
        patient("p1"),
        encounter("e1", "p1", 2),
        encounter("e2", "ghost", 2),
        observation("o1", "p1", "e1"),
        observation("o2", "p1", "never-indexed"),
    ]);
    let config = MappingConfig::full().with_dangling(DanglingPolicy::ExcludeRow);

    let output = map_index(&graph, &config);
    assert_eq!(column(&output.tables.encounters, 0), ["enc_1"]);
    assert_eq!(column(&output.tables.observations, 0), ["obs_1"]);
    assert_eq!(output.registry.dangling().len(), 2);
}

#[test]
fn orphan_encounters_follow_retained_patients() {
    let graph = index(vec![
        encounter("e-orphan", "ghost", 2),
        patient("p1"),
        encounter("e1", "p1", 2),
    ]);

    let output = map_index(&graph, &MappingConfig::full());
    let encounters = &output.tables.encounters;
    assert_eq!(column(encounters, 0), ["enc_1", "enc_2"]);
    assert_eq!(column(encounters, 3), ["pat_1", ""]);
    assert_eq!(output.registry.dangling()[0].natural_id, "ghost");
}

#[test]
fn encounters_with_medications_survive_the_encounter_cap() {
    let graph = index(vec![
        patient("p1"),
        encounter("bare", "p1", 2),
        encounter("observed", "p1", 2),
        encounter("medicated", "p1", 2),
        observation("o1", "p1", "observed"),
        medication("m1", "medicated"),
        observation("o2", "p1", "bare-never"),
    ]);
    let config = MappingConfig::full().with_caps(MappingCaps {
        encounters_per_patient: Cap::AtMost(2),
        ..MappingCaps::default()
    });

    let output = map_index(&graph, &config);
    assert_eq!(output.tables.encounters.len(), 2);
    assert_eq!(
        output.registry.get(EntityKind::Encounter, "medicated").map(SurrogateId::as_str),
        Some("enc_1")
    );
    assert_eq!(
        output.registry.get(EntityKind::Encounter, "observed").map(SurrogateId::as_str),
        Some("enc_2")
    );
    assert!(output.registry.get(EntityKind::Encounter, "bare").is_none());

    let medications = &output.tables.medication_administrations;
    assert_eq!(medications.len(), 1);
    assert_eq!(medications[0][3], "pat_1");
    assert_eq!(medications[0][4], "enc_1");
}

#[test]
fn children_of_sampled_out_patients_are_skipped() {
    let graph = index(vec![
        patient("p1"),
        patient("p2"),
        encounter("e1", "p1", 2),
        encounter("e2", "p2", 2),
        observation("o1", "p2", "e2"),
        observation("o2", "p2", "missing"),
    ]);
    let config = MappingConfig::full().with_caps(MappingCaps {
        patients: Cap::AtMost(1),
        ..MappingCaps::default()
    });

    let output = map_index(&graph, &config);
    assert_eq!(output.tables.patients.len(), 1);
    assert_eq!(output.tables.encounters.len(), 1);
    assert!(output.tables.observations.is_empty());
    assert!(output.registry.dangling().is_empty());
}

#[test]
fn duration_heuristic_routes_long_stays_through_wards() {
    let graph = index(vec![
        patient("p1"),
        encounter("long", "p1", 12),
        encounter("medium", "p1", 6),
        encounter("short", "p1", 3),
    ]);

    let output = map_index(&graph, &MappingConfig::full());
    let stays = &output.tables.encounter_locations;
    assert_eq!(
        column(stays, 0),
        ["enc_1", "enc_1", "enc_1", "enc_2", "enc_2", "enc_3"]
    );
    assert_eq!(
        column(stays, 3),
        ["loc_2", "loc_3", "loc_4", "loc_5", "loc_6", "loc_1"]
    );
    assert_eq!(stays[0][1], "05/01/2020 08:00:00 AM");
    assert_eq!(stays[0][2], "05/01/2020 10:00:00 AM");
    assert_eq!(stays[2][1], "05/01/2020 03:00:00 PM");
    assert_eq!(stays[2][2], "05/01/2020 08:00:00 PM");

    let locations = &output.tables.locations;
    assert_eq!(
        column(locations, 1),
        [
            "General Hospital",
            "Emergency room",
            "Intensive care unit",
            "Hospital unit",
            "Emergency trauma unit",
            "Rehabilitation hospital unit"
        ]
    );
    assert!(locations.iter().all(|row| row[6] == "active"));
}

#[test]
fn direct_policy_maps_each_encounter_to_its_provider() {
    let graph = index(vec![
        patient("p1"),
        encounter("long", "p1", 12),
        encounter("short", "p1", 3),
    ]);
    let config = MappingConfig::full().with_location_policy(LocationPolicy::Direct);

    let output = map_index(&graph, &config);
    let stays = &output.tables.encounter_locations;
    assert_eq!(column(stays, 0), ["enc_1", "enc_2"]);
    assert_eq!(column(stays, 3), ["loc_1", "loc_1"]);
    assert_eq!(output.tables.locations.len(), 1);
    assert_eq!(output.tables.encounters[0][8], "loc_1");
    assert_eq!(output.tables.encounters[0][9], "General Hospital");
}

#[test]
fn stay_without_service_provider_is_reported() {
    let mut graph_resources = vec![patient("p1"), encounter("e1", "p1", 2)];
    if let Resource::Encounter(encounter) = &mut graph_resources[1] {
        encounter.service_provider_ref = None;
    }
    let graph = index(graph_resources);
    let config = MappingConfig::full().with_location_policy(LocationPolicy::Direct);

    let output = map_index(&graph, &config);
    let stays = &output.tables.encounter_locations;
    assert_eq!(column(stays, 0), ["enc_1"]);
    assert_eq!(column(stays, 3), [""]);
    assert_eq!(output.tables.encounters[0][8], "");

    let dangling = output.registry.dangling();
    assert_eq!(dangling.len(), 1);
    assert_eq!(dangling[0].kind, EntityKind::Location);
    assert_eq!(dangling[0].natural_id, "");
    assert_eq!(dangling[0].referenced_from, "Encounter e1");

    let excluded = map_index(&graph, &config.with_dangling(DanglingPolicy::ExcludeRow));
    assert!(excluded.tables.encounter_locations.is_empty());
    assert_eq!(excluded.tables.encounters.len(), 1);
    assert_eq!(excluded.registry.dangling().len(), 1);
}

#[test]
fn long_stay_without_service_provider_needs_no_provider() {
    let mut graph_resources = vec![patient("p1"), encounter("e1", "p1", 12)];
    if let Resource::Encounter(encounter) = &mut graph_resources[1] {
        encounter.service_provider_ref = None;
    }
    let graph = index(graph_resources);

    let output = map_index(&graph, &MappingConfig::full());
    assert_eq!(output.tables.encounter_locations.len(), 3);
    assert!(output.registry.dangling().is_empty());
}

#[test]
fn unknown_service_provider_is_reported() {
    let graph = GraphIndex::from_bundles([ParsedBundle::new(
        "bundle.json",
        vec![patient("p1"), encounter("e1", "p1", 2)],
    )]);

    let output = map_index(&graph, &MappingConfig::full());
    assert_eq!(output.tables.encounters[0][8], "");
    let dangling = output.registry.dangling();
    assert_eq!(dangling.len(), 1);
    assert_eq!(dangling[0].kind, EntityKind::Location);
    assert_eq!(dangling[0].natural_id, "org-1");
}

#[test]
fn table_selection_does_not_change_keys() {
    let graph = index(vec![
        patient("p1"),
        encounter("e1", "p1", 12),
        observation("o1", "p1", "e1"),
    ]);
    let full = map_index(&graph, &MappingConfig::full());
    let config = MappingConfig::full().with_tables(vec![TableKind::EncounterLocations]);
    let partial = map_index(&graph, &config);
    assert_eq!(full.tables, partial.tables);

    let mut writer = MemoryWriter::new();
    partial
        .tables
        .write_to(&mut writer, &config.included_tables())
        .expect("write tables");
    assert_eq!(
        writer.tables().collect::<Vec<_>>(),
        [TableKind::EncounterLocations]
    );
    assert_eq!(
        writer.header(TableKind::EncounterLocations).map(<[String]>::len),
        Some(4)
    );
    assert_eq!(
        writer.rows(TableKind::EncounterLocations).map(<[Vec<String>]>::len),
        Some(3)
    );
}
