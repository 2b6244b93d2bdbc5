//! The mapping engine.
//!
//! [`map_index`] walks an indexed graph top-down and produces every output
//! table in one pass:
//!
//! 1. retained patients (patient cap)
//! 2. their prioritized encounters (encounter cap per patient), then
//!    encounters whose patient was never indexed
//! 3. observations and medication administrations of every emitted
//!    encounter (per-encounter caps), then children whose encounter was
//!    never indexed
//! 4. stay segments of every emitted encounter
//!
//! Location rows are emitted in the order their keys are first assigned.
//! Every table is computed even when it will not be written, so keys and
//! diagnostics do not depend on the table selection.

use tracing::debug;

use fhirmap_model::{
    DanglingPolicy, Encounter, EntityKind, MappingConfig, Observation, SurrogateId, TableKind,
};

use crate::error::Result;
use crate::index::GraphIndex;
use crate::location::{StayLocation, synthesize_stay};
use crate::projector::{
    EncounterKeys, Row, RowKeys, project_encounter, project_encounter_location,
    project_medication, project_observation, project_organization, project_patient,
    project_synthetic_location,
};
use crate::registry::SurrogateRegistry;
use crate::sampling::limit;
use crate::schema;
use crate::writer::RelationalWriter;

/// Rows of all six tables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappedTables {
    pub patients: Vec<Row>,
    pub encounters: Vec<Row>,
    pub observations: Vec<Row>,
    pub medication_administrations: Vec<Row>,
    pub locations: Vec<Row>,
    pub encounter_locations: Vec<Row>,
}

impl MappedTables {
    pub fn rows(&self, table: TableKind) -> &[Row] {
        match table {
            TableKind::Patients => &self.patients,
            TableKind::Encounters => &self.encounters,
            TableKind::Observations => &self.observations,
            TableKind::MedicationAdministrations => &self.medication_administrations,
            TableKind::Locations => &self.locations,
            TableKind::EncounterLocations => &self.encounter_locations,
        }
    }

    /// Hands each of `tables` with its header to `writer`.
    pub fn write_to(&self, writer: &mut dyn RelationalWriter, tables: &[TableKind]) -> Result<()> {
        for &table in tables {
            writer.write_table(table, schema::columns(table), self.rows(table))?;
        }
        Ok(())
    }
}

/// Result of one mapping run.
#[derive(Debug)]
pub struct MappingOutput {
    pub tables: MappedTables,
    /// Final key assignments and every dangling reference seen.
    pub registry: SurrogateRegistry,
}

/// An encounter that made it into the encounters table.
struct EmittedEncounter<'a> {
    encounter: &'a Encounter,
    id: SurrogateId,
    patient_id: Option<SurrogateId>,
    location_id: Option<SurrogateId>,
}

struct Mapper<'a> {
    index: &'a GraphIndex,
    config: &'a MappingConfig,
    registry: SurrogateRegistry,
    tables: MappedTables,
}

/// Maps an indexed graph to relational rows.
pub fn map_index(index: &GraphIndex, config: &MappingConfig) -> MappingOutput {
    let mut mapper = Mapper {
        index,
        config,
        registry: SurrogateRegistry::new(),
        tables: MappedTables::default(),
    };

    let encounters = mapper.select_encounters();
    let emitted = mapper.map_encounters(&encounters);
    mapper.map_observations(&emitted);
    mapper.map_medications(&emitted);
    mapper.map_stays(&emitted);

    debug!(
        patients = mapper.tables.patients.len(),
        encounters = mapper.tables.encounters.len(),
        observations = mapper.tables.observations.len(),
        medication_administrations = mapper.tables.medication_administrations.len(),
        locations = mapper.tables.locations.len(),
        encounter_locations = mapper.tables.encounter_locations.len(),
        dangling = mapper.registry.dangling().len(),
        "mapping complete"
    );

    MappingOutput {
        tables: mapper.tables,
        registry: mapper.registry,
    }
}

impl<'a> Mapper<'a> {
    fn excludes_dangling(&self) -> bool {
        self.config.dangling == DanglingPolicy::ExcludeRow
    }

    /// Emits the retained patients and returns the encounters to map, in
    /// output order.
    fn select_encounters(&mut self) -> Vec<&'a Encounter> {
        let index = self.index;
        let caps = self.config.caps;
        let mut selected = Vec::new();

        let patients = limit(index.patients(), caps.patients);
        for patient in patients {
            let id = self.registry.resolve(EntityKind::Patient, &patient.id);
            self.tables.patients.push(project_patient(&id, patient));
        }
        for patient in patients {
            let encounters = index.prioritized_encounters(&patient.id);
            selected.extend_from_slice(limit(&encounters, caps.encounters_per_patient));
        }
        for key in index.orphan_patient_keys() {
            let encounters = index.prioritized_encounters(key);
            selected.extend_from_slice(limit(&encounters, caps.encounters_per_patient));
        }
        selected
    }

    fn map_encounters(&mut self, encounters: &[&'a Encounter]) -> Vec<EmittedEncounter<'a>> {
        let mut emitted = Vec::with_capacity(encounters.len());
        for &encounter in encounters {
            let referrer = format!("Encounter {}", encounter.id);
            let patient_id = self.registry.lookup(
                EntityKind::Patient,
                encounter.patient_ref.as_deref().unwrap_or_default(),
                &referrer,
            );
            if patient_id.is_none() && self.excludes_dangling() {
                continue;
            }

            let id = self.registry.resolve(EntityKind::Encounter, &encounter.id);
            let (location_id, organization_name) = self.service_provider(encounter, &referrer);
            let display = encounter
                .service_provider_display
                .as_deref()
                .filter(|display| !display.trim().is_empty())
                .or(organization_name);
            let keys = EncounterKeys {
                id: &id,
                patient_id: patient_id.as_ref(),
                location_id: location_id.as_ref(),
                service_provider_display: display,
            };
            self.tables
                .encounters
                .push(project_encounter(encounter, keys));

            emitted.push(EmittedEncounter {
                encounter,
                id,
                patient_id,
                location_id,
            });
        }
        emitted
    }

    /// Location key and organization name of the encounter's service
    /// provider. An absent reference is not a dangling one.
    fn service_provider(
        &mut self,
        encounter: &Encounter,
        referrer: &str,
    ) -> (Option<SurrogateId>, Option<&'a str>) {
        let Some(reference) = encounter
            .service_provider_ref
            .as_deref()
            .filter(|reference| !reference.trim().is_empty())
        else {
            return (None, None);
        };
        let index = self.index;
        match index.organization(reference) {
            Some(organization) => {
                let id = self.register_location(&organization.id, |id| {
                    project_organization(id, organization)
                });
                (Some(id), organization.name.as_deref())
            }
            None => (
                self.registry
                    .lookup(EntityKind::Location, reference, referrer),
                None,
            ),
        }
    }

    /// Assigns a location key, emitting its row the first time.
    fn register_location(
        &mut self,
        natural_id: &str,
        project: impl FnOnce(&SurrogateId) -> Row,
    ) -> SurrogateId {
        if let Some(existing) = self.registry.get(EntityKind::Location, natural_id) {
            return existing.clone();
        }
        let id = self.registry.resolve(EntityKind::Location, natural_id);
        self.tables.locations.push(project(&id));
        id
    }

    /// Patient key for a child whose encounter was never indexed, or
    /// `None` when the child should be skipped because its patient was
    /// sampled out.
    fn orphan_patient(
        &mut self,
        subject: Option<&str>,
        referrer: &str,
    ) -> Option<Option<SurrogateId>> {
        let Some(subject) = subject.filter(|subject| !subject.trim().is_empty()) else {
            return Some(None);
        };
        if self.index.has_patient(subject)
            && self.registry.get(EntityKind::Patient, subject).is_none()
        {
            return None;
        }
        Some(self.registry.lookup(EntityKind::Patient, subject, referrer))
    }

    fn observation_row(
        &mut self,
        observation: &Observation,
        patient_id: Option<SurrogateId>,
        encounter_id: Option<SurrogateId>,
    ) {
        if (patient_id.is_none() || encounter_id.is_none()) && self.excludes_dangling() {
            return;
        }
        let id = self
            .registry
            .resolve(EntityKind::Observation, &observation.id);
        let keys = RowKeys {
            id: &id,
            patient_id: patient_id.as_ref(),
            encounter_id: encounter_id.as_ref(),
        };
        self.tables
            .observations
            .push(project_observation(observation, keys));
    }

    fn map_observations(&mut self, emitted: &[EmittedEncounter<'a>]) {
        let index = self.index;
        let cap = self.config.caps.observations_per_encounter;

        for parent in emitted {
            for observation in limit(index.observations_for(&parent.encounter.id), cap) {
                let patient_id = match observation.patient_ref.as_deref() {
                    Some(subject) if !subject.trim().is_empty() => self.registry.lookup(
                        EntityKind::Patient,
                        subject,
                        &format!("Observation {}", observation.id),
                    ),
                    _ => parent.patient_id.clone(),
                };
                self.observation_row(observation, patient_id, Some(parent.id.clone()));
            }
        }

        for key in index.orphan_observation_keys() {
            for observation in limit(index.observations_for(key), cap) {
                let referrer = format!("Observation {}", observation.id);
                let Some(patient_id) =
                    self.orphan_patient(observation.patient_ref.as_deref(), &referrer)
                else {
                    continue;
                };
                let encounter_id = self.registry.lookup(EntityKind::Encounter, key, &referrer);
                self.observation_row(observation, patient_id, encounter_id);
            }
        }
    }

    /// Medication administrations take their patient from their encounter.
    fn map_medications(&mut self, emitted: &[EmittedEncounter<'a>]) {
        let index = self.index;
        let cap = self.config.caps.medications_per_encounter;

        let mut rows = Vec::new();
        for parent in emitted {
            for medication in limit(index.medications_for(&parent.encounter.id), cap) {
                rows.push((medication, parent.patient_id.clone(), Some(parent.id.clone())));
            }
        }
        for key in index.orphan_medication_keys() {
            for medication in limit(index.medications_for(key), cap) {
                let referrer = format!("MedicationAdministration {}", medication.id);
                let Some(patient_id) =
                    self.orphan_patient(medication.patient_ref.as_deref(), &referrer)
                else {
                    continue;
                };
                let encounter_id = self.registry.lookup(EntityKind::Encounter, key, &referrer);
                rows.push((medication, patient_id, encounter_id));
            }
        }

        for (medication, patient_id, encounter_id) in rows {
            if (patient_id.is_none() || encounter_id.is_none()) && self.excludes_dangling() {
                continue;
            }
            let id = self
                .registry
                .resolve(EntityKind::MedicationAdministration, &medication.id);
            let keys = RowKeys {
                id: &id,
                patient_id: patient_id.as_ref(),
                encounter_id: encounter_id.as_ref(),
            };
            self.tables
                .medication_administrations
                .push(project_medication(medication, keys));
        }
    }

    /// A stay at the service provider of an encounter that names none is
    /// recorded as a missing location reference. A reference that failed to
    /// resolve was already recorded when the encounter was mapped.
    fn report_missing_provider(&mut self, encounter: &Encounter) -> Option<SurrogateId> {
        let named = encounter
            .service_provider_ref
            .as_deref()
            .is_some_and(|reference| !reference.trim().is_empty());
        if named {
            return None;
        }
        self.registry.lookup(
            EntityKind::Location,
            "",
            &format!("Encounter {}", encounter.id),
        )
    }

    fn map_stays(&mut self, emitted: &[EmittedEncounter<'a>]) {
        let policy = self.config.location_policy;
        for parent in emitted {
            let segments =
                synthesize_stay(policy, parent.encounter.start, parent.encounter.end);
            for segment in &segments {
                let location_id = match segment.location {
                    StayLocation::ServiceProvider => match &parent.location_id {
                        Some(id) => Some(id.clone()),
                        None => self.report_missing_provider(parent.encounter),
                    },
                    StayLocation::Synthetic(ward) => Some(
                        self.register_location(ward.natural_id, |id| {
                            project_synthetic_location(id, &ward)
                        }),
                    ),
                };
                if location_id.is_none() && self.excludes_dangling() {
                    continue;
                }
                self.tables.encounter_locations.push(project_encounter_location(
                    &parent.id,
                    segment,
                    location_id.as_ref(),
                ));
            }
        }
    }
}
