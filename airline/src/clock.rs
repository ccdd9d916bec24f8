//! Vector clock used to causally order coordination events between nodes.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A vector clock: one monotonic counter per known peer, keyed by node id.
///
/// Entries are never removed once created; a peer that hasn't been heard
/// from yet is treated as having counter `0`, whether or not it has an
/// entry in the map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorClock(HashMap<Uuid, u64>);

/// Result of comparing two vector clocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ordering {
    Equal,
    /// The right-hand side happened after the left-hand side.
    Newer,
    /// The right-hand side happened before the left-hand side.
    Older,
    /// Neither clock is an ancestor of the other.
    Concurrent,
}

impl VectorClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &Uuid) -> u64 {
        self.0.get(id).copied().unwrap_or(0)
    }

    /// Increment this node's own counter. Called before every outbound
    /// coordination message and on receipt of certain events.
    pub fn increment(&mut self, id: Uuid) {
        *self.0.entry(id).or_insert(0) += 1;
    }

    /// Ensure a freshly-seen peer has an entry (defaults to `0`).
    pub fn observe(&mut self, id: Uuid) {
        self.0.entry(id).or_insert(0);
    }

    /// Merge a received clock into this one: pointwise maximum.
    pub fn merge(&mut self, received: &VectorClock) {
        for (id, &value) in received.0.iter() {
            let entry = self.0.entry(*id).or_insert(0);
            if value > *entry {
                *entry = value;
            }
        }
    }

    /// Compare two clocks. `compare(a, b)` describes how `b` relates to `a`.
    pub fn compare(a: &VectorClock, b: &VectorClock) -> Ordering {
        let mut is_less = false;
        let mut is_greater = false;

        let keys = a.0.keys().chain(b.0.keys());
        for id in keys {
            let x = a.get(id);
            let y = b.get(id);

            if x < y {
                is_less = true;
            } else if x > y {
                is_greater = true;
            }
            if is_less && is_greater {
                return Ordering::Concurrent;
            }
        }

        match (is_less, is_greater) {
            (false, false) => Ordering::Equal,
            (true, false) => Ordering::Newer,
            (false, true) => Ordering::Older,
            (true, true) => Ordering::Concurrent,
        }
    }

    pub fn as_map(&self) -> &HashMap<Uuid, u64> {
        &self.0
    }
}

impl From<HashMap<Uuid, u64>> for VectorClock {
    fn from(map: HashMap<Uuid, u64>) -> Self {
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock(pairs: &[(Uuid, u64)]) -> VectorClock {
        VectorClock(pairs.iter().copied().collect())
    }

    #[test]
    fn equal_clocks_compare_equal() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let vc_a = clock(&[(a, 3), (b, 5)]);
        let vc_b = clock(&[(a, 3), (b, 5)]);

        assert_eq!(VectorClock::compare(&vc_a, &vc_b), Ordering::Equal);
    }

    #[test]
    fn disagreeing_coordinates_are_concurrent() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let vc_a = clock(&[(a, 2), (b, 1)]);
        let vc_b = clock(&[(a, 1), (b, 2)]);

        assert_eq!(VectorClock::compare(&vc_a, &vc_b), Ordering::Concurrent);
    }

    #[test]
    fn compare_is_reflexive() {
        let a = Uuid::new_v4();
        let vc = clock(&[(a, 7)]);
        assert_eq!(VectorClock::compare(&vc, &vc), Ordering::Equal);
    }

    #[test]
    fn newer_iff_other_side_is_older() {
        let a = Uuid::new_v4();
        let older = clock(&[(a, 1)]);
        let newer = clock(&[(a, 2)]);

        assert_eq!(VectorClock::compare(&older, &newer), Ordering::Newer);
        assert_eq!(VectorClock::compare(&newer, &older), Ordering::Older);
    }

    #[test]
    fn missing_keys_are_treated_as_zero() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let vc_a = clock(&[(a, 0)]);
        let vc_b = clock(&[(b, 0)]);

        // Both sides are all-zero in effect: equal.
        assert_eq!(VectorClock::compare(&vc_a, &vc_b), Ordering::Equal);
    }

    #[test]
    fn merge_is_idempotent_and_commutative() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut x = clock(&[(a, 2), (b, 1)]);
        let y = clock(&[(a, 1), (b, 3)]);

        x.merge(&y);
        let once = x.clone();
        x.merge(&y);
        assert_eq!(x, once, "merge(merge(a,b),b) must equal merge(a,b)");

        let mut p = clock(&[(a, 2), (b, 1)]);
        let mut q = y.clone();
        p.merge(&y);
        q.merge(&clock(&[(a, 2), (b, 1)]));
        assert_eq!(p, q, "merge must be commutative pointwise");
    }

    #[test]
    fn increment_is_monotonically_nondecreasing() {
        let id = Uuid::new_v4();
        let mut vc = VectorClock::new();
        let mut last = vc.get(&id);
        for _ in 0..5 {
            vc.increment(id);
            let next = vc.get(&id);
            assert!(next > last);
            last = next;
        }
    }
}
