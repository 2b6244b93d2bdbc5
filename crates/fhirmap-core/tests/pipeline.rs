//! Runs the full pipeline over bundle files on disk.

use std::path::Path;

use tempfile::TempDir;

use fhirmap_core::{MapError, run_mapping};
use fhirmap_ingest::IngestError;
use fhirmap_model::{MappingConfig, TableKind};

const BUNDLE: &str = r#"{
  "resourceType": "Bundle",
  "type": "transaction",
  "entry": [
    {
      "fullUrl": "urn:uuid:org-1",
      "resource": {
        "resourceType": "Organization",
        "id": "org-1",
        "name": "UPMC Presbyterian",
        "type": [{"coding": [{"system": "http://terminology.hl7.org/CodeSystem/organization-type", "code": "prov", "display": "Healthcare Provider"}]}],
        "address": [{"line": ["200 Lothrop St"], "city": "Pittsburgh", "state": "PA", "postalCode": "15213"}]
      }
    },
    {
      "fullUrl": "urn:uuid:pat-1",
      "resource": {
        "resourceType": "Patient",
        "id": "pat-1",
        "name": [{"family": "Rowe", "given": ["Jalisa"]}],
        "gender": "female",
        "birthDate": "1987-06-03",
        "address": [{"line": ["881 Kuhn Way"], "city": "Erie", "state": "Pennsylvania", "postalCode": "16501", "country": "US"}]
      }
    },
    {
      "fullUrl": "urn:uuid:enc-2",
      "resource": {
        "resourceType": "Encounter",
        "id": "enc-2",
        "subject": {"reference": "urn:uuid:pat-1"},
        "period": {"start": "2019-03-01T10:00:00-05:00", "end": "2019-03-01T13:00:00-05:00"},
        "serviceProvider": {"reference": "urn:uuid:org-1"}
      }
    },
    {
      "fullUrl": "urn:uuid:enc-1",
      "resource": {
        "resourceType": "Encounter",
        "id": "enc-1",
        "type": [{"coding": [{"system": "http://snomed.info/sct", "code": "185345009", "display": "Encounter for symptom"}]}],
        "subject": {"reference": "urn:uuid:pat-1"},
        "period": {"start": "2019-02-17T07:22:05-05:00", "end": "2019-02-17T19:22:05-05:00"},
        "reasonCode": [{"coding": [{"system": "http://snomed.info/sct", "code": "444814009", "display": "Viral sinusitis"}]}],
        "serviceProvider": {"reference": "Organization?identifier=https://github.com/synthetichealth/synthea|org-1", "display": "UPMC Presbyterian"}
      }
    },
    {
      "fullUrl": "urn:uuid:obs-1",
      "resource": {
        "resourceType": "Observation",
        "id": "obs-1",
        "category": [{"coding": [{"code": "vital-signs"}]}],
        "code": {"coding": [{"system": "http://loinc.org", "code": "8302-2", "display": "Body Height"}]},
        "subject": {"reference": "urn:uuid:pat-1"},
        "encounter": {"reference": "urn:uuid:enc-1"},
        "effectiveDateTime": "2019-02-17T07:22:05-05:00",
        "valueQuantity": {"value": 162.5, "unit": "cm"}
      }
    },
    {
      "fullUrl": "urn:uuid:obs-2",
      "resource": {
        "resourceType": "Observation",
        "id": "obs-2",
        "code": {"coding": [{"system": "http://loinc.org", "code": "72166-2", "display": "Tobacco smoking status"}]},
        "subject": {"reference": "urn:uuid:pat-1"},
        "encounter": {"reference": "urn:uuid:enc-2"},
        "effectiveDateTime": "2019-03-01T10:30:00-05:00",
        "valueCodeableConcept": {"coding": [{"system": "http://snomed.info/sct", "code": "266919005", "display": "Never smoker"}]}
      }
    },
    {
      "fullUrl": "urn:uuid:med-1",
      "resource": {
        "resourceType": "MedicationAdministration",
        "id": "med-1",
        "status": "completed",
        "medicationCodeableConcept": {"coding": [{"system": "http://www.nlm.nih.gov/research/umls/rxnorm", "code": "313782", "display": "Acetaminophen 325 MG Oral Tablet"}]},
        "subject": {"reference": "urn:uuid:pat-1"},
        "context": {"reference": "urn:uuid:enc-1"},
        "effectiveDateTime": "2019-02-17T08:00:00-05:00"
      }
    }
  ]
}"#;

fn input_dir() -> TempDir {
    let dir = TempDir::new().expect("temp dir");
    std::fs::write(dir.path().join("a-patient.json"), BUNDLE).expect("write bundle");
    std::fs::write(dir.path().join("b-empty.json"), r#"{"resourceType": "Bundle"}"#)
        .expect("write empty bundle");
    std::fs::write(dir.path().join("README.txt"), "not a bundle").expect("write readme");
    dir
}

fn read_table(dir: &Path, table: TableKind) -> String {
    std::fs::read_to_string(dir.join(table.file_name())).expect("read table")
}

#[test]
fn maps_bundle_directory_to_tsv_tables() {
    let input = input_dir();
    let output = TempDir::new().expect("temp dir");
    let out_dir = output.path().join("tables");

    let report = run_mapping(input.path(), &out_dir, &MappingConfig::full()).expect("run");
    assert_eq!(report.input_files.len(), 2);
    assert_eq!(report.written.len(), 6);
    assert!(report.dangling.is_empty());
    assert_eq!(report.index.patients, 1);
    assert_eq!(report.row_count(TableKind::Observations), Some(2));
    assert_eq!(report.row_count(TableKind::Locations), Some(4));

    assert_eq!(
        read_table(&out_dir, TableKind::Patients),
        "id\tbirth_date\tlast_name\tfirst_name\tgender\taddress\tcity\tstate\tzip_code\tcountry\n\
         pat_1\t06/03/1987\tRowe\tJalisa\tfemale\t881 Kuhn Way\tErie\tPennsylvania\t16501\tUS\n"
    );
    assert_eq!(
        read_table(&out_dir, TableKind::MedicationAdministrations)
            .lines()
            .nth(1),
        Some(
            "med_1\tcompleted\t02/17/2019 08:00:00 AM\tpat_1\tenc_1\t313782\t\
             http://www.nlm.nih.gov/research/umls/rxnorm\tAcetaminophen 325 MG Oral Tablet"
        )
    );
    let locations = read_table(&out_dir, TableKind::Locations);
    assert_eq!(
        locations.lines().nth(1),
        Some(
            "loc_1\tUPMC Presbyterian\t200 Lothrop St\tPittsburgh\tPA\t15213\tactive\tprov\t\
             http://terminology.hl7.org/CodeSystem/organization-type\tHealthcare Provider"
        )
    );

    insta::assert_snapshot!(read_table(&out_dir, TableKind::Encounters), @r"
id	start	end	patient_id	type_code	type_display	reason_code	reason_display	location_id	service_provider_display
enc_1	02/17/2019 07:22:05 AM	02/17/2019 07:22:05 PM	pat_1	185345009	Encounter for symptom	444814009	Viral sinusitis	loc_1	UPMC Presbyterian
enc_2	03/01/2019 10:00:00 AM	03/01/2019 01:00:00 PM	pat_1	394656005	Inpatient	126598008	Neoplasm of connective tissues disorder	loc_1	UPMC Presbyterian
");
    insta::assert_snapshot!(read_table(&out_dir, TableKind::Observations), @r"
id	effective	patient_id	encounter_id	code	code_display	component_value	component_unit	component_type	category
obs_1	02/17/2019 07:22:05 AM	pat_1	enc_1	8302-2	Body Height	162.5	cm	numeric	vital-signs
obs_2	03/01/2019 10:30:00 AM	pat_1	enc_2	72166-2	Tobacco smoking status				laboratory
");
    insta::assert_snapshot!(read_table(&out_dir, TableKind::EncounterLocations), @r"
encounter_id	start	end	location_id
enc_1	02/17/2019 07:22:05 AM	02/17/2019 09:22:05 AM	loc_2
enc_1	02/17/2019 10:22:05 AM	02/17/2019 01:22:05 PM	loc_3
enc_1	02/17/2019 02:22:05 PM	02/17/2019 07:22:05 PM	loc_4
enc_2	03/01/2019 10:00:00 AM	03/01/2019 01:00:00 PM	loc_1
");
}

#[test]
fn reduced_table_set_writes_only_selected_files() {
    let input = input_dir();
    let output = TempDir::new().expect("temp dir");
    let config = MappingConfig::reduced().with_tables(vec![TableKind::Patients]);

    let report = run_mapping(input.path(), output.path(), &config).expect("run");
    assert_eq!(report.written, [output.path().join("patients.tsv")]);
    assert!(!output.path().join("encounters.tsv").exists());
}

#[test]
fn missing_input_directory_is_fatal() {
    let output = TempDir::new().expect("temp dir");
    let error = run_mapping(
        &output.path().join("missing"),
        output.path(),
        &MappingConfig::full(),
    )
    .unwrap_err();
    assert!(matches!(
        error,
        MapError::Ingest(IngestError::DirectoryNotFound { .. })
    ));
}

#[test]
fn malformed_bundle_aborts_the_run() {
    let input = input_dir();
    std::fs::write(input.path().join("c-broken.json"), "{\"resourceType\": ").expect("write");
    let output = TempDir::new().expect("temp dir");

    let error = run_mapping(input.path(), &output.path().join("out"), &MappingConfig::full())
        .unwrap_err();
    assert!(matches!(
        error,
        MapError::Ingest(IngestError::MalformedBundle { .. })
    ));
    assert!(!output.path().join("out").exists());
}
