//! View modes and the draft capability matrix

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a draft was opened, fixed for the life of the session
///
/// The mode is decided by the load path (owner fetch, join link,
/// explicit read-only request) and never changes afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewMode {
    /// The exhibit owner, full control
    Owner,
    /// An invited collaborator, restricted to their own slots
    Collaborator { participant_id: Uuid },
    /// Owner proof-reading the draft before publishing
    Review,
    /// Owner watching collaborator submission progress
    Monitoring,
    /// Walkthrough of the final layout
    Preview,
}

impl ViewMode {
    pub fn name(&self) -> &'static str {
        match self {
            ViewMode::Owner => "owner",
            ViewMode::Collaborator { .. } => "collaborator",
            ViewMode::Review => "review",
            ViewMode::Monitoring => "monitoring",
            ViewMode::Preview => "preview",
        }
    }
}

impl std::fmt::Display for ViewMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Read-only inspection modes an owner may explicitly request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InspectionMode {
    Review,
    Monitoring,
    Preview,
}

impl From<InspectionMode> for ViewMode {
    fn from(mode: InspectionMode) -> Self {
        match mode {
            InspectionMode::Review => ViewMode::Review,
            InspectionMode::Monitoring => ViewMode::Monitoring,
            InspectionMode::Preview => ViewMode::Preview,
        }
    }
}

/// Actions that can be performed on an exhibit draft
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftAction {
    // Draft management
    EditDetails,
    SelectEnvironment,
    ManageRoster,
    Publish,

    // Slot work
    AssignArtwork,
    ClearSlot,

    // Inspection
    ViewLayout,
    ViewProgress,
}

/// Capability matrix for view modes
pub struct CapabilityMatrix;

impl CapabilityMatrix {
    /// Check whether a mode permits an action
    pub fn can_perform(mode: &ViewMode, action: DraftAction) -> bool {
        match action {
            // Structure changes belong to the owner
            DraftAction::EditDetails
            | DraftAction::SelectEnvironment
            | DraftAction::ManageRoster
            | DraftAction::Publish => matches!(mode, ViewMode::Owner),

            // Slot work is open to whoever owns the slot
            DraftAction::AssignArtwork | DraftAction::ClearSlot => {
                matches!(mode, ViewMode::Owner | ViewMode::Collaborator { .. })
            }

            // Everyone may look at the walls
            DraftAction::ViewLayout => true,

            // Progress is an owner-side concern
            DraftAction::ViewProgress => {
                matches!(mode, ViewMode::Owner | ViewMode::Monitoring)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_permissions() {
        let mode = ViewMode::Owner;
        assert!(CapabilityMatrix::can_perform(&mode, DraftAction::SelectEnvironment));
        assert!(CapabilityMatrix::can_perform(&mode, DraftAction::ManageRoster));
        assert!(CapabilityMatrix::can_perform(&mode, DraftAction::Publish));
        assert!(CapabilityMatrix::can_perform(&mode, DraftAction::AssignArtwork));
        assert!(CapabilityMatrix::can_perform(&mode, DraftAction::ViewProgress));
    }

    #[test]
    fn test_collaborator_permissions() {
        let mode = ViewMode::Collaborator {
            participant_id: Uuid::new_v4(),
        };
        assert!(CapabilityMatrix::can_perform(&mode, DraftAction::AssignArtwork));
        assert!(CapabilityMatrix::can_perform(&mode, DraftAction::ClearSlot));
        assert!(CapabilityMatrix::can_perform(&mode, DraftAction::ViewLayout));
        assert!(!CapabilityMatrix::can_perform(&mode, DraftAction::SelectEnvironment));
        assert!(!CapabilityMatrix::can_perform(&mode, DraftAction::ManageRoster));
        assert!(!CapabilityMatrix::can_perform(&mode, DraftAction::Publish));
        assert!(!CapabilityMatrix::can_perform(&mode, DraftAction::ViewProgress));
    }

    #[test]
    fn test_review_and_preview_are_read_only() {
        for mode in [ViewMode::Review, ViewMode::Preview] {
            assert!(CapabilityMatrix::can_perform(&mode, DraftAction::ViewLayout));
            assert!(!CapabilityMatrix::can_perform(&mode, DraftAction::AssignArtwork));
            assert!(!CapabilityMatrix::can_perform(&mode, DraftAction::ClearSlot));
            assert!(!CapabilityMatrix::can_perform(&mode, DraftAction::ViewProgress));
        }
    }

    #[test]
    fn test_monitoring_sees_progress_but_cannot_touch() {
        let mode = ViewMode::Monitoring;
        assert!(CapabilityMatrix::can_perform(&mode, DraftAction::ViewProgress));
        assert!(!CapabilityMatrix::can_perform(&mode, DraftAction::AssignArtwork));
        assert!(!CapabilityMatrix::can_perform(&mode, DraftAction::Publish));
    }
}
