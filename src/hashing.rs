//! Deterministic hash map / hash set aliases.
//!
//! The standard library's `HashMap` is randomly seeded per-process, which makes iteration
//! order (and therefore anything derived from it, such as genotype interning or index
//! iteration) non-reproducible across runs with the same PRNG seed. We use `rustc_hash`'s
//! `FxHash*` instead, which is fast and, crucially, has no per-process random seed.
//!
//! `HashMap::new()` is not available on `HashMap<K, V, S>` for a non-default `S`; the
//! `HashMapExt`/`HashSetExt` traits restore that convenience.

pub use rustc_hash::FxHashMap as HashMap;
pub use rustc_hash::FxHashSet as HashSet;
use std::hash::{Hash, Hasher};

/// Provides API parity with `std::collections::HashMap`.
pub trait HashMapExt {
    fn new() -> Self;
}

impl<K, V> HashMapExt for HashMap<K, V> {
    fn new() -> Self {
        HashMap::default()
    }
}

/// Provides API parity with `std::collections::HashSet`.
pub trait HashSetExt {
    type Item;

    fn new() -> Self;
}

impl<T> HashSetExt for HashSet<T> {
    type Item = T;

    fn new() -> Self {
        HashSet::default()
    }
}

/// Computes the hash of a `&str`. Used to derive a per-named-stream seed offset in
/// `random::context_ext`.
pub fn hash_str(data: &str) -> u64 {
    let mut hasher = rustc_hash::FxHasher::default();
    hasher.write(data.as_bytes());
    hasher.finish()
}

/// Computes the hash of any `Hash` value. Used to derive a stable `GenotypeId` from a
/// locus-allele vector in `person::parasite::GenotypeDb`.
pub fn hash_value<T: Hash>(value: &T) -> u64 {
    let mut hasher = rustc_hash::FxHasher::default();
    value.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_str_is_deterministic() {
        assert_eq!(hash_str("hello"), hash_str("hello"));
        assert_ne!(hash_str("hello"), hash_str("world"));
    }

    #[test]
    fn hash_value_distinguishes_structs() {
        #[derive(Hash)]
        struct Pair(u32, u32);
        assert_eq!(hash_value(&Pair(1, 2)), hash_value(&Pair(1, 2)));
        assert_ne!(hash_value(&Pair(1, 2)), hash_value(&Pair(2, 1)));
    }
}
