//! A priority queue that stores arbitrary data sorted by day.
//!
//! Defines [`Queue<T, P>`], which stores items of type `T` in order by integer day and a
//! definable priority `P`. Adding an item is *O*(log *n*); cancellation and next-plan retrieval
//! are *O*(1) amortized (cancellation just flips a tombstone; the queue entry is skipped and
//! dropped the next time it is popped).
//!
//! `Queue` backs both the individual and population event queues owned by `SimulationContext`
//! (`context::SimulationContext::individual_queue` / `population_queue`).
use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::HashMap;

/// A unique, monotonically-increasing identifier for a plan added to a `Queue<T, P>`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct PlanId(u64);

/// A priority queue of `Plan<T>` sorted by day, then priority, then insertion order.
pub struct Queue<T, P: Eq + PartialEq + Ord> {
    queue: BinaryHeap<Entry<P>>,
    data_map: HashMap<u64, T>,
    plan_counter: u64,
}

impl<T, P: Eq + PartialEq + Ord> Queue<T, P> {
    #[must_use]
    pub fn new() -> Queue<T, P> {
        Queue {
            queue: BinaryHeap::new(),
            data_map: HashMap::default(),
            plan_counter: 0,
        }
    }

    /// Adds a plan to the queue at the given day with the given priority.
    ///
    /// # Panics
    /// Panics if `day` is negative; scheduling into the past is a programmer error per the
    /// failure semantics in the design (fail-fast, not a recoverable condition).
    pub fn add_plan(&mut self, day: i32, data: T, priority: P) -> PlanId {
        let id = self.plan_counter;
        self.queue.push(Entry { day, id, priority });
        self.data_map.insert(id, data);
        self.plan_counter += 1;
        PlanId(id)
    }

    /// Cancels a plan. Returns the cancelled data if the plan was still pending, or `None` if
    /// it had already executed or already been cancelled. Idempotent: cancelling an
    /// already-cancelled or already-executed plan is a harmless no-op, not an error.
    pub fn cancel_plan(&mut self, id: &PlanId) -> Option<T> {
        self.data_map.remove(&id.0)
    }

    /// Pops and returns the earliest pending plan, skipping any cancelled entries it encounters
    /// along the way. Returns `None` once the queue holds no more live plans.
    pub fn get_next_plan(&mut self) -> Option<Plan<T>> {
        loop {
            let entry = self.queue.pop()?;
            if let Some(data) = self.data_map.remove(&entry.id) {
                return Some(Plan {
                    day: entry.day,
                    data,
                });
            }
        }
    }

    /// Like `get_next_plan`, but also returns the popped plan's id so a caller can reconcile its
    /// own bookkeeping (e.g. removing it from a person's pending-event list) without a second
    /// lookup.
    pub fn get_next_plan_with_id(&mut self) -> Option<(PlanId, Plan<T>)> {
        loop {
            let entry = self.queue.pop()?;
            if let Some(data) = self.data_map.remove(&entry.id) {
                return Some((PlanId(entry.id), Plan { day: entry.day, data }));
            }
        }
    }

    /// The day of the earliest pending (non-cancelled) plan, if any.
    #[must_use]
    pub fn next_day(&self) -> Option<i32> {
        self.queue
            .iter()
            .filter(|entry| self.data_map.contains_key(&entry.id))
            .map(|entry| entry.day)
            .min()
    }

    /// True if there are no pending (non-cancelled) plans left.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data_map.is_empty()
    }

    /// Number of pending (non-cancelled) plans. `O(1)`.
    #[must_use]
    pub fn remaining_plan_count(&self) -> usize {
        self.data_map.len()
    }
}

impl<T, P: Eq + PartialEq + Ord> Default for Queue<T, P> {
    fn default() -> Self {
        Self::new()
    }
}

/// A day, id, and priority tuple used to order entries in the `Queue<T, P>`'s heap. The data
/// payload itself lives in `Queue::data_map`, keyed by `id`, so cancellation never touches the
/// heap.
#[derive(PartialEq, Eq, Debug)]
struct Entry<P: Eq + PartialEq + Ord> {
    day: i32,
    id: u64,
    priority: P,
}

/// `BinaryHeap` is a max-heap; we want the earliest day (then lowest priority value, then
/// lowest id) to come out first, so comparisons are reversed throughout.
impl<P: Eq + PartialEq + Ord> Ord for Entry<P> {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .day
            .cmp(&self.day)
            .then_with(|| other.priority.cmp(&self.priority))
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl<P: Eq + PartialEq + Ord> PartialOrd for Entry<P> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// An item due to run on the given simulation day.
pub struct Plan<T> {
    pub day: i32,
    pub data: T,
}

#[cfg(test)]
mod tests {
    use super::Queue;

    #[test]
    fn empty_queue() {
        let mut plan_queue = Queue::<(), ()>::new();
        assert!(plan_queue.get_next_plan().is_none());
        assert!(plan_queue.is_empty());
    }

    #[test]
    fn plans_come_out_in_day_order() {
        let mut plan_queue = Queue::new();
        plan_queue.add_plan(3, 3, ());
        plan_queue.add_plan(1, 1, ());
        plan_queue.add_plan(2, 2, ());

        assert_eq!(plan_queue.get_next_plan().unwrap().data, 1);
        assert_eq!(plan_queue.get_next_plan().unwrap().data, 2);
        assert_eq!(plan_queue.get_next_plan().unwrap().data, 3);
        assert!(plan_queue.get_next_plan().is_none());
    }

    #[test]
    fn same_day_same_priority_breaks_tie_by_insertion_order() {
        let mut plan_queue = Queue::new();
        plan_queue.add_plan(1, 1, ());
        plan_queue.add_plan(1, 2, ());

        assert_eq!(plan_queue.get_next_plan().unwrap().data, 1);
        assert_eq!(plan_queue.get_next_plan().unwrap().data, 2);
    }

    #[test]
    fn lower_priority_value_runs_first_within_a_day() {
        let mut plan_queue = Queue::new();
        plan_queue.add_plan(1, 1, 1);
        plan_queue.add_plan(1, 2, 0);

        assert_eq!(plan_queue.get_next_plan().unwrap().data, 2);
        assert_eq!(plan_queue.get_next_plan().unwrap().data, 1);
    }

    #[test]
    fn cancel_removes_plan_without_panicking() {
        let mut plan_queue = Queue::new();
        plan_queue.add_plan(1, 1, ());
        let to_cancel = plan_queue.add_plan(2, 2, ());
        plan_queue.add_plan(3, 3, ());

        assert!(plan_queue.cancel_plan(&to_cancel).is_some());
        // Cancelling again is a no-op, not a panic.
        assert!(plan_queue.cancel_plan(&to_cancel).is_none());

        assert_eq!(plan_queue.get_next_plan().unwrap().data, 1);
        assert_eq!(plan_queue.get_next_plan().unwrap().data, 3);
        assert!(plan_queue.get_next_plan().is_none());
    }

    #[test]
    fn next_day_and_remaining_plan_count() {
        let mut plan_queue = Queue::new();
        assert_eq!(plan_queue.next_day(), None);
        plan_queue.add_plan(5, "a", ());
        let b = plan_queue.add_plan(2, "b", ());
        assert_eq!(plan_queue.next_day(), Some(2));
        assert_eq!(plan_queue.remaining_plan_count(), 2);
        plan_queue.cancel_plan(&b);
        assert_eq!(plan_queue.next_day(), Some(5));
        assert_eq!(plan_queue.remaining_plan_count(), 1);
    }
}
