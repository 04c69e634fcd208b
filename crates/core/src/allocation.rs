//! Slot distribution across an exhibit roster
//!
//! Slots are dealt as contiguous ascending blocks, owner first.
//! With n slots and k participants everyone receives floor(n/k);
//! the remainder goes to the earliest participants in roster order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Assignment of every slot in an environment to one participant
///
/// Rebuilt from scratch whenever the roster or the environment
/// changes, never patched in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotPlan {
    #[serde(deserialize_with = "deserialize_slot_map")]
    slots: BTreeMap<u32, Uuid>,
}

/// Deserialize a slot-number-keyed map from the string keys JSON uses
///
/// JSON object keys are always strings, and the internally tagged
/// protocol enums buffer their content before deserializing, which
/// bypasses serde_json's own string-to-integer key conversion. Parsing
/// the keys here keeps slot maps round-trippable inside those enums.
pub(crate) fn deserialize_slot_map<'de, D>(
    deserializer: D,
) -> std::result::Result<BTreeMap<u32, Uuid>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{Error, Unexpected};

    BTreeMap::<String, Uuid>::deserialize(deserializer)?
        .into_iter()
        .map(|(key, value)| {
            key.parse::<u32>()
                .map(|slot| (slot, value))
                .map_err(|_| Error::invalid_value(Unexpected::Str(&key), &"a slot number"))
        })
        .collect()
}

impl SlotPlan {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn owner_of(&self, slot: u32) -> Option<Uuid> {
        self.slots.get(&slot).copied()
    }

    /// Slots held by one participant, ascending
    pub fn slots_of(&self, participant: Uuid) -> Vec<u32> {
        self.slots
            .iter()
            .filter(|(_, &p)| p == participant)
            .map(|(&slot, _)| slot)
            .collect()
    }

    /// All assignments in slot order
    pub fn iter(&self) -> impl Iterator<Item = (u32, Uuid)> + '_ {
        self.slots.iter().map(|(&slot, &p)| (slot, p))
    }
}

/// Deal `slot_count` slots to `participants` in allocation order.
///
/// Pure and deterministic. When slots are scarcer than participants
/// the later participants receive none; whether that is acceptable
/// is the caller's decision.
pub fn allocate_slots(slot_count: u32, participants: &[Uuid]) -> SlotPlan {
    let mut slots = BTreeMap::new();
    if participants.is_empty() {
        return SlotPlan { slots };
    }

    let k = participants.len() as u32;
    let base = slot_count / k;
    let remainder = slot_count % k;

    let mut next = 1u32;
    for (idx, &participant) in participants.iter().enumerate() {
        let share = base + u32::from((idx as u32) < remainder);
        for _ in 0..share {
            slots.insert(next, participant);
            next += 1;
        }
    }

    SlotPlan { slots }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    #[test]
    fn test_nine_slots_three_participants() {
        let ps = ids(3);
        let plan = allocate_slots(9, &ps);

        assert_eq!(plan.slots_of(ps[0]), vec![1, 2, 3]);
        assert_eq!(plan.slots_of(ps[1]), vec![4, 5, 6]);
        assert_eq!(plan.slots_of(ps[2]), vec![7, 8, 9]);
    }

    #[test]
    fn test_four_slots_two_participants() {
        let ps = ids(2);
        let plan = allocate_slots(4, &ps);

        assert_eq!(plan.slots_of(ps[0]), vec![1, 2]);
        assert_eq!(plan.slots_of(ps[1]), vec![3, 4]);
    }

    #[test]
    fn test_six_slots_three_participants() {
        let ps = ids(3);
        let plan = allocate_slots(6, &ps);

        for &p in &ps {
            assert_eq!(plan.slots_of(p).len(), 2);
        }
    }

    #[test]
    fn test_remainder_goes_to_earliest() {
        let ps = ids(3);
        let plan = allocate_slots(7, &ps);

        assert_eq!(plan.slots_of(ps[0]), vec![1, 2, 3]);
        assert_eq!(plan.slots_of(ps[1]), vec![4, 5]);
        assert_eq!(plan.slots_of(ps[2]), vec![6, 7]);
    }

    #[test]
    fn test_solo_owner_takes_everything() {
        let ps = ids(1);
        let plan = allocate_slots(6, &ps);

        assert_eq!(plan.slots_of(ps[0]), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_more_participants_than_slots() {
        let ps = ids(3);
        let plan = allocate_slots(2, &ps);

        assert_eq!(plan.slots_of(ps[0]), vec![1]);
        assert_eq!(plan.slots_of(ps[1]), vec![2]);
        assert!(plan.slots_of(ps[2]).is_empty());
    }

    #[test]
    fn test_every_slot_assigned_exactly_once() {
        for k in 1..=3usize {
            for n in 1..=12u32 {
                let ps = ids(k);
                let plan = allocate_slots(n, &ps);

                assert_eq!(plan.len() as u32, n);
                for slot in 1..=n {
                    assert!(plan.owner_of(slot).is_some(), "slot {slot} unassigned");
                }
            }
        }
    }

    #[test]
    fn test_fairness_bound() {
        for k in 1..=3usize {
            for n in 1..=12u32 {
                let ps = ids(k);
                let plan = allocate_slots(n, &ps);

                let counts: Vec<usize> = ps.iter().map(|&p| plan.slots_of(p).len()).collect();
                let max = counts.iter().max().unwrap();
                let min = counts.iter().min().unwrap();
                assert!(max - min <= 1, "unfair split for n={n} k={k}: {counts:?}");
            }
        }
    }

    #[test]
    fn test_blocks_are_contiguous() {
        for k in 1..=3usize {
            for n in 1..=12u32 {
                let ps = ids(k);
                let plan = allocate_slots(n, &ps);

                for &p in &ps {
                    let slots = plan.slots_of(p);
                    for pair in slots.windows(2) {
                        assert_eq!(pair[1], pair[0] + 1, "gap in block for n={n} k={k}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_deterministic() {
        let ps = ids(3);
        assert_eq!(allocate_slots(9, &ps), allocate_slots(9, &ps));
    }

    #[test]
    fn test_no_participants_yields_empty_plan() {
        assert!(allocate_slots(5, &[]).is_empty());
    }
}
