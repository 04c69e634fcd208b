//! Network protocol message types
//!
//! All messages are JSON-serialized and length-prefixed on the wire.
//! Every request gets exactly one response on the same connection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use salon_core::models::{Artwork, ExhibitKind, ExhibitSummary, Invitation, InvitationStatus};
use salon_core::progress::SubmissionStatus;
use salon_core::view_mode::{InspectionMode, ViewMode};
use salon_core::ExhibitDraft;

/// Error categories carried in error responses
///
/// `AuthExpired` is the only retryable one: the client refreshes its
/// token pair and replays the request once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    AuthExpired,
    AuthInvalid,
    Denied,
    NotFound,
    Conflict,
    Invalid,
}

/// A draft edit shipped to the server
///
/// All detail fields are optional: `None` leaves the stored value
/// alone. Slot changes travel as ops so the server replays them
/// through the draft under the requester's own identity instead of
/// trusting a client-built slot map.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DraftPayload {
    /// `None` creates a new draft owned by the requester
    pub exhibit_id: Option<Uuid>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub kind: Option<ExhibitKind>,
    pub schedule: Option<SchedulePayload>,
    pub environment_id: Option<Uuid>,
    #[serde(default)]
    pub remove_collaborators: Vec<Uuid>,
    #[serde(default)]
    pub slot_ops: Vec<SlotOp>,
}

/// Start/end pair, replaced together
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SchedulePayload {
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
}

/// A single slot change
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op")]
pub enum SlotOp {
    /// Place an artwork into the actor's first free slot
    Assign { artwork_id: Uuid },
    /// Empty a slot the actor owns
    Clear { slot: u32 },
}

/// Per-participant submission progress
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantProgress {
    pub participant_id: Uuid,
    pub display_name: String,
    pub status: SubmissionStatus,
}

/// A fetched draft with its server-resolved view mode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftView {
    pub draft: ExhibitDraft,
    pub mode: ViewMode,
    /// Populated only when the resolved mode may see progress
    pub progress: Vec<ParticipantProgress>,
}

/// Client-to-server requests
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    Register {
        username: String,
        password: String,
    },

    Login {
        username: String,
        password: String,
    },

    Refresh {
        refresh_token: String,
    },

    Logout {
        access_token: String,
    },

    ListExhibits {
        access_token: String,
    },

    /// Fetch a draft; the server resolves the view mode
    FetchDraft {
        access_token: String,
        exhibit_id: Uuid,
        /// Owner-only request for a read-only inspection mode
        mode: Option<InspectionMode>,
        /// Invitation token when arriving through a join link
        join_token: Option<String>,
    },

    SaveDraft {
        access_token: String,
        payload: DraftPayload,
    },

    PublishDraft {
        access_token: String,
        exhibit_id: Uuid,
    },

    RegisterArtwork {
        access_token: String,
        title: String,
    },

    ListArtworks {
        access_token: String,
    },

    InviteCollaborator {
        access_token: String,
        exhibit_id: Uuid,
        invitee_username: String,
    },

    RespondInvitation {
        access_token: String,
        token: String,
        accept: bool,
    },
}

/// Server-to-client responses
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Response {
    Registered {
        user_id: Uuid,
    },

    /// Fresh token pair, from login or refresh
    Tokens {
        user_id: Uuid,
        username: String,
        access_token: String,
        refresh_token: String,
    },

    LoggedOut,

    Exhibits {
        exhibits: Vec<ExhibitSummary>,
    },

    Draft(DraftView),

    Saved {
        draft: ExhibitDraft,
    },

    Published {
        exhibit_id: Uuid,
    },

    Artwork {
        artwork: Artwork,
    },

    Artworks {
        artworks: Vec<Artwork>,
    },

    Invited {
        invitation: Invitation,
        join_link: String,
    },

    InvitationResponded {
        exhibit_id: Uuid,
        status: InvitationStatus,
    },

    Error {
        code: ErrorCode,
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_roundtrip() {
        let req = Request::FetchDraft {
            access_token: "tok".into(),
            exhibit_id: Uuid::new_v4(),
            mode: Some(InspectionMode::Monitoring),
            join_token: None,
        };

        let bytes = serde_json::to_vec(&req).unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.contains("\"type\":\"FetchDraft\""));

        let decoded: Request = serde_json::from_slice(&bytes).unwrap();
        match decoded {
            Request::FetchDraft { mode, .. } => {
                assert_eq!(mode, Some(InspectionMode::Monitoring));
            }
            _ => panic!("Wrong request type"),
        }
    }

    #[test]
    fn test_error_response_roundtrip() {
        let resp = Response::Error {
            code: ErrorCode::AuthExpired,
            message: "Access token expired".into(),
        };

        let bytes = serde_json::to_vec(&resp).unwrap();
        let decoded: Response = serde_json::from_slice(&bytes).unwrap();

        match decoded {
            Response::Error { code, .. } => assert_eq!(code, ErrorCode::AuthExpired),
            _ => panic!("Wrong response type"),
        }
    }

    #[test]
    fn test_slot_ops_tagged() {
        let payload = DraftPayload {
            slot_ops: vec![
                SlotOp::Assign {
                    artwork_id: Uuid::new_v4(),
                },
                SlotOp::Clear { slot: 3 },
            ],
            ..Default::default()
        };

        let text = serde_json::to_string(&payload).unwrap();
        assert!(text.contains("\"op\":\"Assign\""));
        assert!(text.contains("\"op\":\"Clear\""));
    }
}
