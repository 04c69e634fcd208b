//! Developer guardrails and invariants
//!
//! Debug assertions for detecting impossible states during development.
//! These checks are compiled out in release builds.

use std::collections::{BTreeMap, HashSet};

use uuid::Uuid;

use crate::allocation::SlotPlan;
use crate::draft::ExhibitDraft;
use crate::models::{ParticipantRoster, MAX_COLLABORATORS};

/// Validate that a plan fully and fairly covers an environment
pub fn assert_plan_invariants(plan: &SlotPlan, slot_count: u32, participants: &[Uuid]) {
    debug_assert_eq!(
        plan.len() as u32,
        slot_count,
        "plan covers {} slots, environment has {}",
        plan.len(),
        slot_count
    );

    for slot in 1..=slot_count {
        let owner = plan.owner_of(slot);
        debug_assert!(owner.is_some(), "slot {} has no owner", slot);
        debug_assert!(
            owner.map(|o| participants.contains(&o)).unwrap_or(false),
            "slot {} owned by someone outside the roster",
            slot
        );
    }

    let counts: Vec<usize> = participants.iter().map(|&p| plan.slots_of(p).len()).collect();
    if let (Some(max), Some(min)) = (counts.iter().max(), counts.iter().min()) {
        debug_assert!(
            max - min <= 1,
            "unfair split: shares {:?} for {} slots",
            counts,
            slot_count
        );
    }

    for &p in participants {
        let slots = plan.slots_of(p);
        for pair in slots.windows(2) {
            debug_assert_eq!(
                pair[1],
                pair[0] + 1,
                "participant {} holds a fragmented block {:?}",
                p,
                slots
            );
        }
    }
}

/// Validate that bindings only touch planned slots and that no
/// participant shows the same artwork twice
pub fn assert_binding_invariants(plan: &SlotPlan, bindings: &BTreeMap<u32, Uuid>) {
    for (&slot, &artwork) in bindings {
        debug_assert!(
            plan.owner_of(slot).is_some(),
            "binding of artwork {} on slot {} outside the plan",
            artwork,
            slot
        );
    }

    let mut seen: HashSet<(Uuid, Uuid)> = HashSet::new();
    for (&slot, &artwork) in bindings {
        if let Some(owner) = plan.owner_of(slot) {
            debug_assert!(
                seen.insert((owner, artwork)),
                "participant {} shows artwork {} in more than one slot",
                owner,
                artwork
            );
        }
    }
}

/// Validate that a roster is within bounds and free of duplicates
pub fn assert_roster_invariants(roster: &ParticipantRoster) {
    debug_assert!(
        roster.collaborators().len() <= MAX_COLLABORATORS,
        "roster carries {} collaborators",
        roster.collaborators().len()
    );

    let mut ids = HashSet::new();
    for p in roster.members() {
        debug_assert!(ids.insert(p.id), "participant {} appears twice", p.id);
    }
}

/// Validate a draft's combined state
pub fn assert_draft_invariants(draft: &ExhibitDraft) {
    assert_roster_invariants(draft.roster());

    match draft.environment() {
        Some(env) => {
            assert_plan_invariants(draft.plan(), env.slot_count, &draft.roster().ids());
        }
        None => {
            debug_assert!(
                draft.plan().is_empty(),
                "draft {} has a plan but no environment",
                draft.id
            );
        }
    }

    assert_binding_invariants(draft.plan(), draft.bindings());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::allocate_slots;
    use crate::models::{Environment, ExhibitKind, Participant};

    fn draft_with_environment() -> ExhibitDraft {
        let owner = Participant::new("ada".into());
        let mut draft = ExhibitDraft::new("Salon".into(), owner, ExhibitKind::Solo);
        draft
            .select_environment(Environment::by_id(Uuid::from_u128(1)).unwrap())
            .unwrap();
        draft
    }

    #[test]
    fn test_valid_plan() {
        let ps: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        let plan = allocate_slots(9, &ps);
        assert_plan_invariants(&plan, 9, &ps);
    }

    #[test]
    fn test_valid_draft() {
        let draft = draft_with_environment();
        assert_draft_invariants(&draft);
    }

    #[test]
    #[should_panic(expected = "outside the plan")]
    fn test_binding_outside_plan_panics() {
        let mut draft = draft_with_environment();
        draft.bindings.insert(99, Uuid::new_v4());
        assert_draft_invariants(&draft);
    }

    #[test]
    #[should_panic(expected = "more than one slot")]
    fn test_duplicate_artwork_panics() {
        let mut draft = draft_with_environment();
        let artwork = Uuid::new_v4();
        draft.bindings.insert(1, artwork);
        draft.bindings.insert(2, artwork);
        assert_draft_invariants(&draft);
    }

    #[test]
    #[should_panic(expected = "no environment")]
    fn test_plan_without_environment_panics() {
        let owner = Participant::new("ada".into());
        let mut draft = ExhibitDraft::new("Salon".into(), owner.clone(), ExhibitKind::Solo);
        draft.plan = allocate_slots(4, &[owner.id]);
        assert_draft_invariants(&draft);
    }
}
