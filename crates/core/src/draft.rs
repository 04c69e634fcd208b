//! Exhibit draft state machine
//!
//! A draft owns the roster, the chosen environment, the slot plan and
//! the artwork bindings, and keeps them consistent: any change to the
//! roster or the environment rebuilds the plan and drops every binding
//! in the same step.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::allocation::{allocate_slots, SlotPlan};
use crate::error::{Error, Result};
use crate::invariants;
use crate::models::{
    Artwork, Environment, ExhibitKind, ExhibitStatus, ExhibitSummary, Participant,
    ParticipantRoster,
};
use crate::progress::{submission_status, SubmissionStatus};
use crate::view_mode::{CapabilityMatrix, DraftAction, ViewMode};

/// A work-in-progress exhibit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExhibitDraft {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub kind: ExhibitKind,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub status: ExhibitStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub(crate) environment: Option<Environment>,
    pub(crate) roster: ParticipantRoster,
    pub(crate) plan: SlotPlan,
    #[serde(deserialize_with = "crate::allocation::deserialize_slot_map")]
    pub(crate) bindings: BTreeMap<u32, Uuid>,
}

impl ExhibitDraft {
    pub fn new(title: String, owner: Participant, kind: ExhibitKind) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title,
            description: None,
            tags: Vec::new(),
            kind,
            starts_at: None,
            ends_at: None,
            status: ExhibitStatus::Draft,
            created_at: now,
            updated_at: now,
            environment: None,
            roster: ParticipantRoster::solo(owner),
            plan: SlotPlan::empty(),
            bindings: BTreeMap::new(),
        }
    }

    pub fn with_description(mut self, description: String) -> Self {
        self.description = Some(description);
        self
    }

    pub fn environment(&self) -> Option<&Environment> {
        self.environment.as_ref()
    }

    pub fn roster(&self) -> &ParticipantRoster {
        &self.roster
    }

    pub fn plan(&self) -> &SlotPlan {
        &self.plan
    }

    pub fn bindings(&self) -> &BTreeMap<u32, Uuid> {
        &self.bindings
    }

    pub fn artwork_in_slot(&self, slot: u32) -> Option<Uuid> {
        self.bindings.get(&slot).copied()
    }

    pub fn status_of(&self, participant: Uuid) -> SubmissionStatus {
        submission_status(participant, &self.plan, &self.bindings)
    }

    /// Submission progress for the whole roster, allocation order
    pub fn all_statuses(&self) -> Vec<(Participant, SubmissionStatus)> {
        self.roster
            .members()
            .map(|p| (p.clone(), self.status_of(p.id)))
            .collect()
    }

    pub fn summary(&self) -> ExhibitSummary {
        ExhibitSummary {
            id: self.id,
            title: self.title.clone(),
            kind: self.kind,
            status: self.status,
            owner_id: self.roster.owner().id,
            environment_name: self.environment.as_ref().map(|e| e.name.clone()),
            updated_at: self.updated_at,
        }
    }

    pub fn set_title(&mut self, title: String) {
        self.title = title;
        self.touch();
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description;
        self.touch();
    }

    pub fn set_tags(&mut self, tags: Vec<String>) {
        self.tags = tags;
        self.touch();
    }

    pub fn set_schedule(
        &mut self,
        starts_at: Option<DateTime<Utc>>,
        ends_at: Option<DateTime<Utc>>,
    ) {
        self.starts_at = starts_at;
        self.ends_at = ends_at;
        self.touch();
    }

    /// Switch between solo and collaborative curation.
    /// Dropping to solo removes all collaborators and their slots.
    pub fn set_kind(&mut self, kind: ExhibitKind) {
        if self.kind == kind {
            return;
        }
        self.kind = kind;
        if kind == ExhibitKind::Solo && !self.roster.is_solo() {
            self.roster.clear_collaborators();
            self.reallocate();
        } else {
            self.touch();
        }
    }

    /// Pick a gallery layout. Refused when it has fewer slots than
    /// the roster has participants; otherwise the plan is rebuilt and
    /// all bindings are dropped.
    pub fn select_environment(&mut self, environment: Environment) -> Result<()> {
        let participants = self.roster.len() as u32;
        if environment.slot_count < participants {
            return Err(Error::EnvironmentTooSmall {
                slots: environment.slot_count,
                participants,
            });
        }
        self.environment = Some(environment);
        self.reallocate();
        Ok(())
    }

    pub fn add_collaborator(&mut self, participant: Participant) -> Result<()> {
        if self.kind == ExhibitKind::Solo {
            return Err(Error::InvalidOperation(
                "solo exhibits do not take collaborators".into(),
            ));
        }
        self.roster.add_collaborator(participant)?;
        self.reallocate();
        Ok(())
    }

    pub fn remove_collaborator(&mut self, id: Uuid) -> Result<Participant> {
        let removed = self.roster.remove_collaborator(id)?;
        self.reallocate();
        Ok(removed)
    }

    /// Place an artwork into the actor's first free slot.
    /// Returns the slot number it landed in.
    pub fn assign_artwork(&mut self, actor: Uuid, artwork: &Artwork) -> Result<u32> {
        if !self.roster.contains(actor) {
            return Err(Error::NoSuchParticipant(actor));
        }
        if artwork.artist_id != actor {
            return Err(Error::ArtworkNotOwned {
                artwork: artwork.id,
                participant: actor,
            });
        }

        let owned = self.plan.slots_of(actor);
        if owned
            .iter()
            .any(|slot| self.bindings.get(slot) == Some(&artwork.id))
        {
            return Err(Error::DuplicateArtwork(artwork.id));
        }

        let slot = owned
            .into_iter()
            .find(|slot| !self.bindings.contains_key(slot))
            .ok_or(Error::NoAvailableSlot { participant: actor })?;

        self.bindings.insert(slot, artwork.id);
        self.touch();
        invariants::assert_draft_invariants(self);
        Ok(slot)
    }

    /// Take the artwork out of a slot the actor owns.
    /// Returns the removed artwork id.
    pub fn clear_slot(&mut self, actor: Uuid, slot: u32) -> Result<Uuid> {
        if self.plan.owner_of(slot) != Some(actor) {
            return Err(Error::SlotAccessDenied {
                slot,
                participant: actor,
            });
        }
        let artwork = self
            .bindings
            .remove(&slot)
            .ok_or(Error::SlotNotBound(slot))?;
        self.touch();
        Ok(artwork)
    }

    pub fn publish(&mut self) -> Result<()> {
        if self.status == ExhibitStatus::Published {
            return Err(Error::Publish("exhibit is already published".into()));
        }
        if self.title.trim().is_empty() {
            return Err(Error::Publish("title is required".into()));
        }
        if self.environment.is_none() {
            return Err(Error::Publish("no environment selected".into()));
        }
        if let (Some(starts), Some(ends)) = (self.starts_at, self.ends_at) {
            if starts >= ends {
                return Err(Error::Publish("exhibit ends before it starts".into()));
            }
        }
        invariants::assert_draft_invariants(self);
        self.status = ExhibitStatus::Published;
        self.touch();
        Ok(())
    }

    /// Rebuild the plan and drop every binding, as one step.
    fn reallocate(&mut self) {
        self.plan = match &self.environment {
            Some(env) => allocate_slots(env.slot_count, &self.roster.ids()),
            None => SlotPlan::empty(),
        };
        self.bindings.clear();
        self.touch();
        invariants::assert_draft_invariants(self);
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// A draft opened in a fixed view mode
///
/// All mutations pass the capability matrix first, then run as the
/// participant the mode resolves to. The mode does not change for
/// the life of the session; reopening is the only way to switch.
#[derive(Debug)]
pub struct DraftSession {
    draft: ExhibitDraft,
    mode: ViewMode,
}

impl DraftSession {
    pub fn open(draft: ExhibitDraft, mode: ViewMode) -> Result<Self> {
        if let ViewMode::Collaborator { participant_id } = mode {
            if !draft.roster().contains(participant_id) {
                return Err(Error::NoSuchParticipant(participant_id));
            }
        }
        Ok(Self { draft, mode })
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn draft(&self) -> &ExhibitDraft {
        &self.draft
    }

    pub fn into_draft(self) -> ExhibitDraft {
        self.draft
    }

    pub fn set_title(&mut self, title: String) -> Result<()> {
        self.ensure(DraftAction::EditDetails)?;
        self.draft.set_title(title);
        Ok(())
    }

    pub fn set_description(&mut self, description: Option<String>) -> Result<()> {
        self.ensure(DraftAction::EditDetails)?;
        self.draft.set_description(description);
        Ok(())
    }

    pub fn set_tags(&mut self, tags: Vec<String>) -> Result<()> {
        self.ensure(DraftAction::EditDetails)?;
        self.draft.set_tags(tags);
        Ok(())
    }

    pub fn set_schedule(
        &mut self,
        starts_at: Option<DateTime<Utc>>,
        ends_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        self.ensure(DraftAction::EditDetails)?;
        self.draft.set_schedule(starts_at, ends_at);
        Ok(())
    }

    pub fn set_kind(&mut self, kind: ExhibitKind) -> Result<()> {
        self.ensure(DraftAction::EditDetails)?;
        self.draft.set_kind(kind);
        Ok(())
    }

    pub fn select_environment(&mut self, environment: Environment) -> Result<()> {
        self.ensure(DraftAction::SelectEnvironment)?;
        self.draft.select_environment(environment)
    }

    pub fn add_collaborator(&mut self, participant: Participant) -> Result<()> {
        self.ensure(DraftAction::ManageRoster)?;
        self.draft.add_collaborator(participant)
    }

    pub fn remove_collaborator(&mut self, id: Uuid) -> Result<Participant> {
        self.ensure(DraftAction::ManageRoster)?;
        self.draft.remove_collaborator(id)
    }

    pub fn assign_artwork(&mut self, artwork: &Artwork) -> Result<u32> {
        self.ensure(DraftAction::AssignArtwork)?;
        let actor = self.acting_participant()?;
        self.draft.assign_artwork(actor, artwork)
    }

    pub fn clear_slot(&mut self, slot: u32) -> Result<Uuid> {
        self.ensure(DraftAction::ClearSlot)?;
        let actor = self.acting_participant()?;
        self.draft.clear_slot(actor, slot)
    }

    /// The monitoring panel: progress for the whole roster
    pub fn progress(&self) -> Result<Vec<(Participant, SubmissionStatus)>> {
        self.ensure(DraftAction::ViewProgress)?;
        Ok(self.draft.all_statuses())
    }

    pub fn publish(&mut self) -> Result<()> {
        self.ensure(DraftAction::Publish)?;
        self.draft.publish()
    }

    fn ensure(&self, action: DraftAction) -> Result<()> {
        if CapabilityMatrix::can_perform(&self.mode, action) {
            Ok(())
        } else {
            Err(Error::PermissionDenied(format!(
                "{} view does not allow {:?}",
                self.mode, action
            )))
        }
    }

    fn acting_participant(&self) -> Result<Uuid> {
        match self.mode {
            ViewMode::Owner => Ok(self.draft.roster().owner().id),
            ViewMode::Collaborator { participant_id } => Ok(participant_id),
            _ => Err(Error::PermissionDenied(format!(
                "{} view has no acting participant",
                self.mode
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grand_salon() -> Environment {
        Environment::by_id(Uuid::from_u128(3)).unwrap()
    }

    fn atrium() -> Environment {
        Environment::by_id(Uuid::from_u128(1)).unwrap()
    }

    fn collaborative_draft() -> (ExhibitDraft, Participant, Participant) {
        let owner = Participant::new("ada".into());
        let collab = Participant::new("bela".into());
        let mut draft = ExhibitDraft::new(
            "Spring Salon".into(),
            owner.clone(),
            ExhibitKind::Collaborative,
        );
        draft.add_collaborator(collab.clone()).unwrap();
        (draft, owner, collab)
    }

    fn piece_by(artist: &Participant) -> Artwork {
        Artwork::new(artist.id, "Untitled".into())
    }

    #[test]
    fn test_select_environment_builds_plan() {
        let (mut draft, owner, collab) = collaborative_draft();
        draft.select_environment(grand_salon()).unwrap();

        assert_eq!(draft.plan().len(), 9);
        assert_eq!(draft.plan().slots_of(owner.id).len(), 5);
        assert_eq!(draft.plan().slots_of(collab.id).len(), 4);
        assert!(draft.bindings().is_empty());
    }

    #[test]
    fn test_changing_environment_drops_bindings() {
        let (mut draft, owner, _) = collaborative_draft();
        draft.select_environment(grand_salon()).unwrap();
        draft.assign_artwork(owner.id, &piece_by(&owner)).unwrap();
        assert_eq!(draft.bindings().len(), 1);

        draft.select_environment(atrium()).unwrap();
        assert_eq!(draft.plan().len(), 4);
        assert!(draft.bindings().is_empty());
    }

    #[test]
    fn test_environment_too_small_is_refused() {
        let (mut draft, _, _) = collaborative_draft();
        draft.select_environment(atrium()).unwrap();

        let cramped = Environment {
            id: Uuid::new_v4(),
            name: "Closet".into(),
            slot_count: 1,
        };
        let err = draft.select_environment(cramped).unwrap_err();
        assert!(matches!(
            err,
            Error::EnvironmentTooSmall {
                slots: 1,
                participants: 2
            }
        ));

        // Refusal leaves the previous choice in place
        assert_eq!(draft.environment().unwrap().slot_count, 4);
        assert_eq!(draft.plan().len(), 4);
    }

    #[test]
    fn test_roster_change_resets_plan_and_bindings() {
        let owner = Participant::new("ada".into());
        let mut draft = ExhibitDraft::new(
            "Spring Salon".into(),
            owner.clone(),
            ExhibitKind::Collaborative,
        );
        draft.select_environment(grand_salon()).unwrap();
        draft.assign_artwork(owner.id, &piece_by(&owner)).unwrap();

        let collab = Participant::new("bela".into());
        draft.add_collaborator(collab.clone()).unwrap();

        assert!(draft.bindings().is_empty());
        assert_eq!(draft.plan().slots_of(owner.id), vec![1, 2, 3, 4, 5]);
        assert_eq!(draft.plan().slots_of(collab.id), vec![6, 7, 8, 9]);

        draft.remove_collaborator(collab.id).unwrap();
        assert_eq!(draft.plan().slots_of(owner.id).len(), 9);
        assert!(draft.bindings().is_empty());
    }

    #[test]
    fn test_assign_fills_first_free_owned_slot() {
        let owner = Participant::new("ada".into());
        let mut draft = ExhibitDraft::new("Solo show".into(), owner.clone(), ExhibitKind::Solo);
        draft.select_environment(atrium()).unwrap();

        assert_eq!(draft.assign_artwork(owner.id, &piece_by(&owner)).unwrap(), 1);
        assert_eq!(draft.assign_artwork(owner.id, &piece_by(&owner)).unwrap(), 2);

        draft.clear_slot(owner.id, 1).unwrap();
        assert_eq!(draft.assign_artwork(owner.id, &piece_by(&owner)).unwrap(), 1);
    }

    #[test]
    fn test_collaborator_assigns_into_own_block() {
        let (mut draft, _, collab) = collaborative_draft();
        draft.select_environment(grand_salon()).unwrap();

        let slot = draft.assign_artwork(collab.id, &piece_by(&collab)).unwrap();
        assert_eq!(slot, 6);
    }

    #[test]
    fn test_assign_rejects_foreign_artwork() {
        let (mut draft, owner, collab) = collaborative_draft();
        draft.select_environment(grand_salon()).unwrap();

        let err = draft
            .assign_artwork(owner.id, &piece_by(&collab))
            .unwrap_err();
        assert!(matches!(err, Error::ArtworkNotOwned { .. }));
    }

    #[test]
    fn test_assign_same_artwork_twice_rejected() {
        let owner = Participant::new("ada".into());
        let mut draft = ExhibitDraft::new("Solo show".into(), owner.clone(), ExhibitKind::Solo);
        draft.select_environment(atrium()).unwrap();

        let piece = piece_by(&owner);
        draft.assign_artwork(owner.id, &piece).unwrap();
        let err = draft.assign_artwork(owner.id, &piece).unwrap_err();
        assert!(matches!(err, Error::DuplicateArtwork(_)));
        assert_eq!(draft.bindings().len(), 1);
    }

    #[test]
    fn test_assign_with_no_free_slot() {
        let (mut draft, _, collab) = collaborative_draft();
        draft.select_environment(atrium()).unwrap();

        // The collaborator holds slots 3 and 4
        draft.assign_artwork(collab.id, &piece_by(&collab)).unwrap();
        draft.assign_artwork(collab.id, &piece_by(&collab)).unwrap();

        let before = draft.bindings().clone();
        let err = draft
            .assign_artwork(collab.id, &piece_by(&collab))
            .unwrap_err();
        assert!(matches!(err, Error::NoAvailableSlot { .. }));
        assert_eq!(draft.bindings(), &before);
    }

    #[test]
    fn test_touching_unowned_slot_is_denied_both_ways() {
        let (mut draft, owner, collab) = collaborative_draft();
        draft.select_environment(atrium()).unwrap();
        draft.assign_artwork(owner.id, &piece_by(&owner)).unwrap();

        // Collaborator cannot clear the owner's slot
        let err = draft.clear_slot(collab.id, 1).unwrap_err();
        assert!(matches!(err, Error::SlotAccessDenied { slot: 1, .. }));

        // Nor can the owner reach into the collaborator's block
        let err = draft.clear_slot(owner.id, 3).unwrap_err();
        assert!(matches!(err, Error::SlotAccessDenied { slot: 3, .. }));
    }

    #[test]
    fn test_clear_unbound_slot() {
        let (mut draft, owner, _) = collaborative_draft();
        draft.select_environment(atrium()).unwrap();

        let err = draft.clear_slot(owner.id, 1).unwrap_err();
        assert!(matches!(err, Error::SlotNotBound(1)));
    }

    #[test]
    fn test_switching_to_solo_drops_collaborators() {
        let (mut draft, owner, _) = collaborative_draft();
        draft.select_environment(grand_salon()).unwrap();

        draft.set_kind(ExhibitKind::Solo);
        assert!(draft.roster().is_solo());
        assert_eq!(draft.plan().slots_of(owner.id).len(), 9);
        assert!(draft.bindings().is_empty());
    }

    #[test]
    fn test_solo_draft_refuses_collaborators() {
        let owner = Participant::new("ada".into());
        let mut draft = ExhibitDraft::new("Solo show".into(), owner, ExhibitKind::Solo);

        let err = draft
            .add_collaborator(Participant::new("bela".into()))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidOperation(_)));
    }

    #[test]
    fn test_publish_validation() {
        let owner = Participant::new("ada".into());
        let mut draft = ExhibitDraft::new("".into(), owner, ExhibitKind::Solo);

        assert!(matches!(draft.publish(), Err(Error::Publish(_))));

        draft.set_title("Solo show".into());
        assert!(matches!(draft.publish(), Err(Error::Publish(_))));

        draft.select_environment(atrium()).unwrap();
        draft.set_schedule(
            Some(Utc::now() + chrono::Duration::days(2)),
            Some(Utc::now() + chrono::Duration::days(1)),
        );
        assert!(matches!(draft.publish(), Err(Error::Publish(_))));

        draft.set_schedule(
            Some(Utc::now() + chrono::Duration::days(1)),
            Some(Utc::now() + chrono::Duration::days(2)),
        );
        draft.publish().unwrap();
        assert_eq!(draft.status, ExhibitStatus::Published);

        assert!(matches!(draft.publish(), Err(Error::Publish(_))));
    }

    #[test]
    fn test_session_collaborator_must_be_on_roster() {
        let (draft, _, _) = collaborative_draft();
        let err = DraftSession::open(
            draft,
            ViewMode::Collaborator {
                participant_id: Uuid::new_v4(),
            },
        )
        .unwrap_err();
        assert!(matches!(err, Error::NoSuchParticipant(_)));
    }

    #[test]
    fn test_review_session_rejects_mutation() {
        let (mut draft, _, _) = collaborative_draft();
        draft.select_environment(grand_salon()).unwrap();

        let mut session = DraftSession::open(draft, ViewMode::Review).unwrap();
        let owner = session.draft().roster().owner().clone();
        let err = session.assign_artwork(&piece_by(&owner)).unwrap_err();
        assert!(matches!(err, Error::PermissionDenied(_)));
    }

    #[test]
    fn test_collaborator_session_acts_as_collaborator() {
        let (mut draft, _, collab) = collaborative_draft();
        draft.select_environment(grand_salon()).unwrap();

        let mut session = DraftSession::open(
            draft,
            ViewMode::Collaborator {
                participant_id: collab.id,
            },
        )
        .unwrap();

        // Lands in the collaborator's block, not the owner's
        let slot = session.assign_artwork(&piece_by(&collab)).unwrap();
        assert_eq!(slot, 6);

        let err = session
            .add_collaborator(Participant::new("chen".into()))
            .unwrap_err();
        assert!(matches!(err, Error::PermissionDenied(_)));
        assert!(session.progress().is_err());
    }

    #[test]
    fn test_monitoring_session_reads_progress() {
        let (mut draft, owner, collab) = collaborative_draft();
        draft.select_environment(grand_salon()).unwrap();
        draft.assign_artwork(owner.id, &piece_by(&owner)).unwrap();

        let session = DraftSession::open(draft, ViewMode::Monitoring).unwrap();
        let progress = session.progress().unwrap();
        assert_eq!(progress.len(), 2);
        assert_eq!(progress[0].1.filled, 1);
        assert_eq!(progress[1].0.id, collab.id);
        assert_eq!(progress[1].1.percentage, 0);
    }
}
