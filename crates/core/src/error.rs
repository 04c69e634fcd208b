//! Error types for Salon Core

use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Invitation error: {0}")]
    Invitation(String),

    #[error("No available slot for participant {participant}")]
    NoAvailableSlot { participant: Uuid },

    #[error("Slot {slot} is not owned by participant {participant}")]
    SlotAccessDenied { slot: u32, participant: Uuid },

    #[error("Slot {0} has no artwork bound")]
    SlotNotBound(u32),

    #[error("Artwork {0} is already placed by this participant")]
    DuplicateArtwork(Uuid),

    #[error("Artwork {artwork} does not belong to participant {participant}")]
    ArtworkNotOwned { artwork: Uuid, participant: Uuid },

    #[error("Environment offers {slots} slots for {participants} participants")]
    EnvironmentTooSmall { slots: u32, participants: u32 },

    #[error("Roster already has {0} collaborators")]
    RosterFull(usize),

    #[error("Participant {0} is already on the roster")]
    AlreadyParticipant(Uuid),

    #[error("No participant {0} on the roster")]
    NoSuchParticipant(Uuid),

    #[error("Publish rejected: {0}")]
    Publish(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
