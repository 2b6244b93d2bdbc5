//! Parent to children adjacency built from parsed bundles.
//!
//! All keys are normalized references, so a child pointing at
//! `urn:uuid:abc` lands in the same group as the parent with id `abc`.
//! Insertion order is bundle order, then resource order inside a bundle;
//! nothing is ever re-sorted. The first occurrence of a duplicate id wins.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use fhirmap_model::{
    Encounter, MedicationAdministration, Observation, Organization, ParsedBundle, Patient,
    Resource,
};

use crate::reference::normalize_reference;

/// Ordered lists grouped by parent key, remembering the order in which
/// parent keys were first seen.
#[derive(Debug)]
struct Grouped<T> {
    order: Vec<String>,
    groups: HashMap<String, Vec<T>>,
}

impl<T> Default for Grouped<T> {
    fn default() -> Self {
        Self {
            order: Vec::new(),
            groups: HashMap::new(),
        }
    }
}

impl<T> Grouped<T> {
    fn push(&mut self, key: &str, item: T) {
        match self.groups.get_mut(key) {
            Some(group) => group.push(item),
            None => {
                self.order.push(key.to_string());
                self.groups.insert(key.to_string(), vec![item]);
            }
        }
    }

    fn get(&self, key: &str) -> &[T] {
        self.groups.get(key).map_or(&[], Vec::as_slice)
    }

    fn keys(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    fn item_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }
}

fn key_of(reference: Option<&str>) -> &str {
    reference.map_or("", normalize_reference)
}

#[derive(Debug, Default)]
pub struct GraphIndex {
    patients: Vec<Patient>,
    patient_keys: HashSet<String>,
    encounters: HashMap<String, Encounter>,
    encounters_by_patient: Grouped<String>,
    observations_by_encounter: Grouped<Observation>,
    medications_by_encounter: Grouped<MedicationAdministration>,
    observation_keys: HashSet<String>,
    medication_keys: HashSet<String>,
    organizations: HashMap<String, Organization>,
    bundles: usize,
}

impl GraphIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bundles(bundles: impl IntoIterator<Item = ParsedBundle>) -> Self {
        let mut index = Self::new();
        for bundle in bundles {
            index.add_bundle(bundle);
        }
        index
    }

    /// Indexes every resource of one bundle in a single linear scan.
    pub fn add_bundle(&mut self, bundle: ParsedBundle) {
        let mut duplicates = 0usize;
        for resource in bundle.resources {
            let inserted = match resource {
                Resource::Patient(patient) => self.add_patient(patient),
                Resource::Encounter(encounter) => self.add_encounter(encounter),
                Resource::Observation(observation) => self.add_observation(observation),
                Resource::MedicationAdministration(medication) => self.add_medication(medication),
                Resource::Organization(organization) => self.add_organization(organization),
            };
            if !inserted {
                duplicates += 1;
            }
        }
        self.bundles += 1;
        if duplicates > 0 {
            debug!(
                source = %bundle.source.display(),
                duplicates,
                "skipped resources whose id was already indexed"
            );
        }
    }

    fn add_patient(&mut self, patient: Patient) -> bool {
        let key = normalize_reference(&patient.id).to_string();
        if !self.patient_keys.insert(key) {
            return false;
        }
        self.patients.push(patient);
        true
    }

    fn add_encounter(&mut self, encounter: Encounter) -> bool {
        let key = normalize_reference(&encounter.id).to_string();
        if self.encounters.contains_key(&key) {
            return false;
        }
        let patient_key = key_of(encounter.patient_ref.as_deref()).to_string();
        self.encounters_by_patient.push(&patient_key, key.clone());
        self.encounters.insert(key, encounter);
        true
    }

    fn add_observation(&mut self, observation: Observation) -> bool {
        let key = normalize_reference(&observation.id).to_string();
        if !self.observation_keys.insert(key) {
            return false;
        }
        let encounter_key = key_of(observation.encounter_ref.as_deref()).to_string();
        self.observations_by_encounter
            .push(&encounter_key, observation);
        true
    }

    fn add_medication(&mut self, medication: MedicationAdministration) -> bool {
        let key = normalize_reference(&medication.id).to_string();
        if !self.medication_keys.insert(key) {
            return false;
        }
        let encounter_key = key_of(medication.encounter_ref.as_deref()).to_string();
        self.medications_by_encounter
            .push(&encounter_key, medication);
        true
    }

    fn add_organization(&mut self, organization: Organization) -> bool {
        let key = normalize_reference(&organization.id).to_string();
        if self.organizations.contains_key(&key) {
            return false;
        }
        self.organizations.insert(key, organization);
        true
    }

    /// Patients in first-seen order.
    pub fn patients(&self) -> &[Patient] {
        &self.patients
    }

    pub fn has_patient(&self, reference: &str) -> bool {
        self.patient_keys.contains(normalize_reference(reference))
    }

    pub fn has_encounter(&self, reference: &str) -> bool {
        self.encounters.contains_key(normalize_reference(reference))
    }

    pub fn encounter(&self, reference: &str) -> Option<&Encounter> {
        self.encounters.get(normalize_reference(reference))
    }

    pub fn organization(&self, reference: &str) -> Option<&Organization> {
        self.organizations.get(normalize_reference(reference))
    }

    /// Encounters whose subject is `patient`, in source order.
    pub fn encounters_for(&self, patient: &str) -> Vec<&Encounter> {
        self.encounters_by_patient
            .get(normalize_reference(patient))
            .iter()
            .filter_map(|key| self.encounters.get(key))
            .collect()
    }

    /// Encounters of `patient` ordered for sampling: those with medication
    /// administrations first, then those with observations, then the rest.
    /// Source order is kept inside each tier.
    pub fn prioritized_encounters(&self, patient: &str) -> Vec<&Encounter> {
        let mut with_medications = Vec::new();
        let mut with_observations = Vec::new();
        let mut rest = Vec::new();
        for encounter in self.encounters_for(patient) {
            if !self.medications_for(&encounter.id).is_empty() {
                with_medications.push(encounter);
            } else if !self.observations_for(&encounter.id).is_empty() {
                with_observations.push(encounter);
            } else {
                rest.push(encounter);
            }
        }
        with_medications.extend(with_observations);
        with_medications.extend(rest);
        with_medications
    }

    pub fn observations_for(&self, encounter: &str) -> &[Observation] {
        self.observations_by_encounter
            .get(normalize_reference(encounter))
    }

    pub fn medications_for(&self, encounter: &str) -> &[MedicationAdministration] {
        self.medications_by_encounter
            .get(normalize_reference(encounter))
    }

    /// Subject keys of encounters whose patient was never indexed, in
    /// first-seen order. An empty key groups encounters with no subject.
    pub fn orphan_patient_keys(&self) -> Vec<&str> {
        self.encounters_by_patient
            .keys()
            .filter(|key| !self.patient_keys.contains(*key))
            .collect()
    }

    /// Encounter keys referenced by observations but never indexed.
    pub fn orphan_observation_keys(&self) -> Vec<&str> {
        self.observations_by_encounter
            .keys()
            .filter(|key| !self.encounters.contains_key(*key))
            .collect()
    }

    /// Encounter keys referenced by medication administrations but never
    /// indexed.
    pub fn orphan_medication_keys(&self) -> Vec<&str> {
        self.medications_by_encounter
            .keys()
            .filter(|key| !self.encounters.contains_key(*key))
            .collect()
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            bundles: self.bundles,
            patients: self.patients.len(),
            encounters: self.encounters.len(),
            observations: self.observations_by_encounter.item_count(),
            medication_administrations: self.medications_by_encounter.item_count(),
            organizations: self.organizations.len(),
        }
    }
}

/// Resource counts held by a [`GraphIndex`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexStats {
    pub bundles: usize,
    pub patients: usize,
    pub encounters: usize,
    pub observations: usize,
    pub medication_administrations: usize,
    pub organizations: usize,
}
