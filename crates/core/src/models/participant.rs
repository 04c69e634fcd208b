//! Participant and roster models

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Maximum number of collaborators on a single exhibit (owner excluded)
pub const MAX_COLLABORATORS: usize = 2;

/// Someone who holds slots in an exhibit: the owner or a collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: Uuid,
    pub display_name: String,
}

impl Participant {
    pub fn new(display_name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            display_name,
        }
    }
}

/// The ordered set of people sharing an exhibit
///
/// The owner always comes first; collaborators follow in join order.
/// Order matters: remainder slots go to the earliest participants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantRoster {
    owner: Participant,
    collaborators: Vec<Participant>,
}

impl ParticipantRoster {
    pub fn solo(owner: Participant) -> Self {
        Self {
            owner,
            collaborators: Vec::new(),
        }
    }

    pub fn owner(&self) -> &Participant {
        &self.owner
    }

    pub fn collaborators(&self) -> &[Participant] {
        &self.collaborators
    }

    pub fn is_solo(&self) -> bool {
        self.collaborators.is_empty()
    }

    /// Total participant count, owner included
    pub fn len(&self) -> usize {
        1 + self.collaborators.len()
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.owner.id == id || self.collaborators.iter().any(|c| c.id == id)
    }

    pub fn get(&self, id: Uuid) -> Option<&Participant> {
        if self.owner.id == id {
            return Some(&self.owner);
        }
        self.collaborators.iter().find(|c| c.id == id)
    }

    /// Participants in allocation order: owner first, then join order
    pub fn members(&self) -> impl Iterator<Item = &Participant> {
        std::iter::once(&self.owner).chain(self.collaborators.iter())
    }

    /// Participant ids in allocation order
    pub fn ids(&self) -> Vec<Uuid> {
        self.members().map(|p| p.id).collect()
    }

    pub fn add_collaborator(&mut self, participant: Participant) -> Result<()> {
        if self.contains(participant.id) {
            return Err(Error::AlreadyParticipant(participant.id));
        }
        if self.collaborators.len() >= MAX_COLLABORATORS {
            return Err(Error::RosterFull(self.collaborators.len()));
        }
        self.collaborators.push(participant);
        Ok(())
    }

    pub fn remove_collaborator(&mut self, id: Uuid) -> Result<Participant> {
        let pos = self
            .collaborators
            .iter()
            .position(|c| c.id == id)
            .ok_or(Error::NoSuchParticipant(id))?;
        Ok(self.collaborators.remove(pos))
    }

    pub fn clear_collaborators(&mut self) {
        self.collaborators.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> ParticipantRoster {
        ParticipantRoster::solo(Participant::new("ada".into()))
    }

    #[test]
    fn test_owner_comes_first() {
        let mut r = roster();
        let collab = Participant::new("bela".into());
        r.add_collaborator(collab.clone()).unwrap();

        let ids = r.ids();
        assert_eq!(ids[0], r.owner().id);
        assert_eq!(ids[1], collab.id);
    }

    #[test]
    fn test_roster_caps_at_two_collaborators() {
        let mut r = roster();
        r.add_collaborator(Participant::new("bela".into())).unwrap();
        r.add_collaborator(Participant::new("chen".into())).unwrap();

        let err = r
            .add_collaborator(Participant::new("dina".into()))
            .unwrap_err();
        assert!(matches!(err, Error::RosterFull(2)));
        assert_eq!(r.len(), 3);
    }

    #[test]
    fn test_owner_cannot_join_as_collaborator() {
        let mut r = roster();
        let owner = r.owner().clone();
        let err = r.add_collaborator(owner).unwrap_err();
        assert!(matches!(err, Error::AlreadyParticipant(_)));
    }

    #[test]
    fn test_duplicate_collaborator_rejected() {
        let mut r = roster();
        let collab = Participant::new("bela".into());
        r.add_collaborator(collab.clone()).unwrap();
        let err = r.add_collaborator(collab).unwrap_err();
        assert!(matches!(err, Error::AlreadyParticipant(_)));
    }

    #[test]
    fn test_remove_missing_collaborator() {
        let mut r = roster();
        let err = r.remove_collaborator(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, Error::NoSuchParticipant(_)));
    }

    #[test]
    fn test_remove_preserves_join_order() {
        let mut r = roster();
        let b = Participant::new("bela".into());
        let c = Participant::new("chen".into());
        r.add_collaborator(b.clone()).unwrap();
        r.add_collaborator(c.clone()).unwrap();
        r.remove_collaborator(b.id).unwrap();

        assert_eq!(r.ids(), vec![r.owner().id, c.id]);
    }
}
