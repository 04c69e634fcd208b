//! Per-participant submission progress

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::allocation::SlotPlan;

/// How far a participant has come filling their slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionStatus {
    pub total: u32,
    pub filled: u32,
    pub percentage: u8,
}

impl SubmissionStatus {
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.filled == self.total
    }
}

/// Count a participant's slots and how many carry an artwork.
///
/// The percentage is rounded to the nearest whole number. A
/// participant with no slots reports zero across the board.
pub fn submission_status(
    participant: Uuid,
    plan: &SlotPlan,
    bindings: &BTreeMap<u32, Uuid>,
) -> SubmissionStatus {
    let owned = plan.slots_of(participant);
    let total = owned.len() as u32;
    let filled = owned
        .iter()
        .filter(|slot| bindings.contains_key(slot))
        .count() as u32;

    let percentage = if total == 0 {
        0
    } else {
        ((filled as f64 / total as f64) * 100.0).round() as u8
    };

    SubmissionStatus {
        total,
        filled,
        percentage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::allocate_slots;

    #[test]
    fn test_empty_bindings_reports_zero() {
        let ps: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        let plan = allocate_slots(9, &ps);
        let bindings = BTreeMap::new();

        let mut total_sum = 0;
        for &p in &ps {
            let status = submission_status(p, &plan, &bindings);
            assert_eq!(status.filled, 0);
            assert_eq!(status.percentage, 0);
            total_sum += status.total;
        }
        assert_eq!(total_sum, 9);
    }

    #[test]
    fn test_rounding_matches_nearest() {
        let p = Uuid::new_v4();
        let plan = allocate_slots(3, &[p]);

        let mut bindings = BTreeMap::new();
        bindings.insert(1, Uuid::new_v4());
        assert_eq!(submission_status(p, &plan, &bindings).percentage, 33);

        bindings.insert(2, Uuid::new_v4());
        assert_eq!(submission_status(p, &plan, &bindings).percentage, 67);

        bindings.insert(3, Uuid::new_v4());
        let status = submission_status(p, &plan, &bindings);
        assert_eq!(status.percentage, 100);
        assert!(status.is_complete());
    }

    #[test]
    fn test_only_own_slots_counted() {
        let ps: Vec<Uuid> = (0..2).map(|_| Uuid::new_v4()).collect();
        let plan = allocate_slots(4, &ps);

        // Fill both of the second participant's slots only
        let mut bindings = BTreeMap::new();
        bindings.insert(3, Uuid::new_v4());
        bindings.insert(4, Uuid::new_v4());

        let first = submission_status(ps[0], &plan, &bindings);
        assert_eq!((first.filled, first.percentage), (0, 0));

        let second = submission_status(ps[1], &plan, &bindings);
        assert_eq!((second.filled, second.percentage), (2, 100));
    }

    #[test]
    fn test_participant_without_slots() {
        let ps: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        let plan = allocate_slots(2, &ps);
        let bindings = BTreeMap::new();

        let status = submission_status(ps[2], &plan, &bindings);
        assert_eq!(status, SubmissionStatus { total: 0, filled: 0, percentage: 0 });
        assert!(!status.is_complete());
    }

    #[test]
    fn test_progress_never_decreases_as_bindings_grow() {
        let p = Uuid::new_v4();
        let plan = allocate_slots(9, &[p]);
        let mut bindings = BTreeMap::new();

        let mut last = submission_status(p, &plan, &bindings);
        for slot in 1..=9 {
            bindings.insert(slot, Uuid::new_v4());
            let next = submission_status(p, &plan, &bindings);
            assert!(next.filled >= last.filled);
            assert!(next.percentage >= last.percentage);
            assert!(next.percentage <= 100);
            last = next;
        }
        assert_eq!(last.percentage, 100);
    }
}
