//! Surrogate key registry.
//!
//! Each [`EntityKind`] has its own sequence. A natural id receives a key the
//! first time it is resolved and keeps it for the rest of the run; keys are
//! never reassigned or reused. The registry is owned by one run and passed
//! by reference to every stage, so assignment order is exactly the order in
//! which stages ask for keys.

use std::collections::{BTreeMap, HashMap};

use tracing::warn;

use fhirmap_model::{EntityKind, SurrogateId};

use crate::reference::normalize_reference;

/// A reference to a natural id that was never registered as a primary
/// entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingReference {
    pub kind: EntityKind,
    /// Normalized id; empty when the child carried no reference at all.
    pub natural_id: String,
    /// The record holding the reference, e.g. `Observation obs-1`.
    pub referenced_from: String,
}

#[derive(Debug, Default)]
struct Sequence {
    last: u64,
    assigned: HashMap<String, SurrogateId>,
}

#[derive(Debug, Default)]
pub struct SurrogateRegistry {
    sequences: BTreeMap<EntityKind, Sequence>,
    dangling: Vec<DanglingReference>,
}

impl SurrogateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the key for `natural_id`, assigning the next one in the
    /// kind's sequence on first sight.
    pub fn resolve(&mut self, kind: EntityKind, natural_id: &str) -> SurrogateId {
        let id = normalize_reference(natural_id);
        let sequence = self.sequences.entry(kind).or_default();
        if let Some(existing) = sequence.assigned.get(id) {
            return existing.clone();
        }
        sequence.last += 1;
        let surrogate = SurrogateId::new(kind, sequence.last);
        sequence.assigned.insert(id.to_string(), surrogate.clone());
        surrogate
    }

    /// Like [`resolve`](Self::resolve) but never assigns. A miss is logged
    /// and recorded as a [`DanglingReference`].
    pub fn lookup(
        &mut self,
        kind: EntityKind,
        natural_id: &str,
        referrer: &str,
    ) -> Option<SurrogateId> {
        if let Some(found) = self.get(kind, natural_id) {
            return Some(found.clone());
        }
        let id = normalize_reference(natural_id);
        if id.is_empty() {
            warn!(kind = %kind, referrer, "missing reference");
        } else {
            warn!(
                kind = %kind,
                natural_id = %id,
                referrer,
                "dangling reference: id was never registered as a primary entity"
            );
        }
        self.dangling.push(DanglingReference {
            kind,
            natural_id: id.to_string(),
            referenced_from: referrer.to_string(),
        });
        None
    }

    /// Looks up an existing key without logging or recording anything.
    pub fn get(&self, kind: EntityKind, natural_id: &str) -> Option<&SurrogateId> {
        let id = normalize_reference(natural_id);
        self.sequences
            .get(&kind)
            .and_then(|sequence| sequence.assigned.get(id))
    }

    /// Number of keys assigned so far for `kind`.
    pub fn assigned(&self, kind: EntityKind) -> usize {
        self.sequences
            .get(&kind)
            .map_or(0, |sequence| sequence.assigned.len())
    }

    /// Every failed lookup, in the order they happened.
    pub fn dangling(&self) -> &[DanglingReference] {
        &self.dangling
    }
}
