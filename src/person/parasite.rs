//! Parasite clones: the within-host unit of infection, and the genotype interning table they
//! reference.
use crate::HashMap;

/// Which closed-form density-update rule a clone is currently subject to. Corresponds directly
/// to the state-machine transitions in the person module: a clone's `update_fn` changes as its
/// owning person moves between host states.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum UpdateFn {
    Liver,
    ClinicalProgression,
    Clinical,
    ImmunityClearance,
    Drug,
}

/// A stable, interned identifier for a genotype (a vector of per-locus allele ids). Cheap to
/// copy and compare; the actual allele vector lives in `GenotypeDb`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct GenotypeId(pub u32);

/// Append-only interning table mapping a per-locus allele vector to a stable `GenotypeId`, so
/// clones can carry a cheap copyable id instead of repeating the allele vector everywhere.
#[derive(Default)]
pub struct GenotypeDb {
    genotypes: Vec<Vec<u8>>,
    lookup: HashMap<Vec<u8>, GenotypeId>,
}

impl GenotypeDb {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the existing id for `alleles` if already interned, otherwise interns it.
    pub fn intern(&mut self, alleles: Vec<u8>) -> GenotypeId {
        if let Some(&id) = self.lookup.get(&alleles) {
            return id;
        }
        let id = GenotypeId(self.genotypes.len() as u32);
        self.lookup.insert(alleles.clone(), id);
        self.genotypes.push(alleles);
        id
    }

    #[must_use]
    pub fn alleles(&self, id: GenotypeId) -> &[u8] {
        &self.genotypes[id.0 as usize]
    }

    /// Flips the allele at `locus` for the genotype `id`'s allele vector and re-interns the
    /// result, returning the (possibly new) id. Used by the drug-mutation hook.
    pub fn mutate_locus(&mut self, id: GenotypeId, locus: u8, new_allele: u8) -> GenotypeId {
        let mut alleles = self.alleles(id).to_vec();
        alleles[locus as usize] = new_allele;
        self.intern(alleles)
    }
}

/// A single parasite clone resident in a person's bloodstream.
///
/// `last_update_log10_density` is the log10 parasite density as of `last_update_day`; the
/// owning person's daily update advances it by applying `update_fn`'s closed-form step once
/// per day.
#[derive(Clone, Debug)]
pub struct ParasiteClone {
    pub genotype: GenotypeId,
    pub last_update_log10_density: f64,
    pub first_update_day: i32,
    pub last_update_day: i32,
    pub update_fn: UpdateFn,
    /// Consecutive days this clone's net growth rate has stayed positive under a `Drug`
    /// update despite active treatment — once this reaches the configured threshold the clone
    /// is flagged drug-resistant-surviving (see `population::daily_update`).
    pub resistant_escape_days: u32,
}

impl ParasiteClone {
    #[must_use]
    pub fn new(genotype: GenotypeId, log10_density: f64, day: i32, update_fn: UpdateFn) -> Self {
        ParasiteClone {
            genotype,
            last_update_log10_density: log10_density,
            first_update_day: day,
            last_update_day: day,
            update_fn,
            resistant_escape_days: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_deduplicated() {
        let mut db = GenotypeDb::new();
        let a = db.intern(vec![0, 1, 0]);
        let b = db.intern(vec![0, 1, 0]);
        let c = db.intern(vec![1, 1, 0]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn mutate_locus_produces_distinct_genotype() {
        let mut db = GenotypeDb::new();
        let original = db.intern(vec![0, 0]);
        let mutated = db.mutate_locus(original, 1, 1);
        assert_ne!(original, mutated);
        assert_eq!(db.alleles(mutated), &[0, 1]);
    }
}
