//! C7 (therapy half): immutable therapy definitions. Drug type definitions live in
//! `person::drug`; the drug mutation/resistance database built from them is referenced by id
//! here rather than duplicated.
use crate::person::DrugId;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct TherapyId(pub u32);

/// An ordered sequence of drug dosings, applied together as a single course of treatment.
/// Therapies are loaded once from `Config::therapy_db` and never mutated afterward.
#[derive(Clone, Debug)]
pub struct Therapy {
    pub id: TherapyId,
    pub drug_ids: Vec<DrugId>,
    pub dosing_days: u32,
}

/// The full, immutable set of therapies a run was configured with, indexed by `TherapyId`.
#[derive(Clone, Debug, Default)]
pub struct TherapyDb {
    therapies: Vec<Therapy>,
}

impl TherapyDb {
    #[must_use]
    pub fn new(therapies: Vec<Therapy>) -> Self {
        TherapyDb { therapies }
    }

    #[must_use]
    pub fn get(&self, id: TherapyId) -> &Therapy {
        &self.therapies[id.0 as usize]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.therapies.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.therapies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_id() {
        let db = TherapyDb::new(vec![Therapy {
            id: TherapyId(0),
            drug_ids: vec![DrugId(0)],
            dosing_days: 3,
        }]);
        assert_eq!(db.get(TherapyId(0)).dosing_days, 3);
    }
}
