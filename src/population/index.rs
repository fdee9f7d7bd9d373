//! C5: auxiliary slot-tracking indices over `Population::persons`.
//!
//! The original model stores each index's slot offset directly on the person object it
//! indexes (a generic, type-erased `people::index::Index<T>` storing a reverse pointer per
//! indexed type). This crate has a fixed, small set of indices known at compile time, so each
//! index instead owns its own `HashMap<PersonId, (key, slot)>` mapping — no reverse pointers on
//! `Person` itself, and no type erasure.
use crate::person::PersonId;
use crate::HashMap;
use std::hash::Hash;

/// A bucket index keyed by `K`, supporting O(1) insert/remove/change via a stored `(key, slot)`
/// per member. `remove` uses swap-removal so it never shifts more than one element, and fixes
/// up the swapped-in member's recorded slot.
pub struct BucketIndex<K: Eq + Hash + Clone> {
    buckets: HashMap<K, Vec<PersonId>>,
    slots: HashMap<PersonId, (K, usize)>,
}

impl<K: Eq + Hash + Clone> Default for BucketIndex<K> {
    fn default() -> Self {
        BucketIndex {
            buckets: HashMap::default(),
            slots: HashMap::default(),
        }
    }
}

impl<K: Eq + Hash + Clone> BucketIndex<K> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: K, person_id: PersonId) {
        let bucket = self.buckets.entry(key.clone()).or_default();
        let slot = bucket.len();
        bucket.push(person_id);
        self.slots.insert(person_id, (key, slot));
    }

    /// Removes `person_id` from whichever bucket it currently occupies. A no-op if it isn't
    /// indexed (e.g. a DEAD person already removed by a prior pass).
    pub fn remove(&mut self, person_id: PersonId) {
        let Some((key, slot)) = self.slots.remove(&person_id) else {
            return;
        };
        let bucket = self.buckets.get_mut(&key).expect("bucket must exist for a tracked slot");
        bucket.swap_remove(slot);
        if let Some(&moved) = bucket.get(slot) {
            self.slots.get_mut(&moved).expect("swapped member must be tracked").1 = slot;
        }
    }

    /// Moves `person_id` from its current bucket (if any) to `new_key`.
    pub fn change(&mut self, person_id: PersonId, new_key: K) {
        self.remove(person_id);
        self.insert(new_key, person_id);
    }

    #[must_use]
    pub fn bucket(&self, key: &K) -> &[PersonId] {
        self.buckets.get(key).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn slot_of(&self, person_id: PersonId) -> Option<&(K, usize)> {
        self.slots.get(&person_id)
    }
}

/// The all-persons index: every currently-living person, in no particular order. A `DEAD`
/// person is removed from it (Invariant 3's "all-index removal pass"); every other index simply
/// never re-inserts a dead person.
#[derive(Default)]
pub struct AllIndex {
    members: Vec<PersonId>,
    slots: HashMap<PersonId, usize>,
}

impl AllIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, person_id: PersonId) {
        let slot = self.members.len();
        self.members.push(person_id);
        self.slots.insert(person_id, slot);
    }

    pub fn remove(&mut self, person_id: PersonId) {
        let Some(slot) = self.slots.remove(&person_id) else {
            return;
        };
        self.members.swap_remove(slot);
        if let Some(&moved) = self.members.get(slot) {
            *self.slots.get_mut(&moved).expect("swapped member must be tracked") = slot;
        }
    }

    #[must_use]
    pub fn members(&self) -> &[PersonId] {
        &self.members
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_index_tracks_membership_through_swap_remove() {
        let mut index: BucketIndex<u32> = BucketIndex::new();
        index.insert(1, PersonId(0));
        index.insert(1, PersonId(1));
        index.insert(1, PersonId(2));
        assert_eq!(index.bucket(&1), &[PersonId(0), PersonId(1), PersonId(2)]);

        index.remove(PersonId(0));
        assert_eq!(index.bucket(&1).len(), 2);
        assert!(index.bucket(&1).contains(&PersonId(1)));
        assert!(index.bucket(&1).contains(&PersonId(2)));
    }

    #[test]
    fn change_moves_between_buckets() {
        let mut index: BucketIndex<u32> = BucketIndex::new();
        index.insert(1, PersonId(0));
        index.change(PersonId(0), 2);
        assert!(index.bucket(&1).is_empty());
        assert_eq!(index.bucket(&2), &[PersonId(0)]);
    }

    #[test]
    fn all_index_removal_shrinks_membership() {
        let mut all = AllIndex::new();
        all.insert(PersonId(0));
        all.insert(PersonId(1));
        all.remove(PersonId(0));
        assert_eq!(all.len(), 1);
        assert_eq!(all.members(), &[PersonId(1)]);
    }
}
