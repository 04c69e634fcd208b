//! Salon Core Library
//!
//! Core models, slot allocation, draft editing, and storage for the Salon platform.

pub mod allocation;
pub mod auth;
pub mod draft;
pub mod error;
pub mod invariants;
pub mod models;
pub mod progress;
pub mod storage;
pub mod view_mode;

pub use allocation::{allocate_slots, SlotPlan};
pub use draft::{DraftSession, ExhibitDraft};
pub use error::{Error, Result};
pub use models::*;
pub use progress::{submission_status, SubmissionStatus};
pub use storage::{
    ArtworkRepository, Database, ExhibitRepository, InvitationRepository, Storage, UserRepository,
};
pub use view_mode::{CapabilityMatrix, DraftAction, InspectionMode, ViewMode};
