//! Storage repository traits
//!
//! These traits define the storage interface, allowing for different
//! implementations (SQLite, mock, future network backend).

use uuid::Uuid;

use crate::draft::ExhibitDraft;
use crate::error::Result;
use crate::models::{Artwork, AuthSession, ExhibitSummary, Invitation, InvitationStatus, User};

/// User and session repository operations
pub trait UserRepository {
    /// Create a new user
    fn create_user(&self, user: &User) -> Result<()>;

    /// Find user by ID
    fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>>;

    /// Find user by username
    fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Update user's last login time
    fn update_last_login(&self, user_id: Uuid) -> Result<()>;

    /// Create an auth session
    fn create_session(&self, session: &AuthSession) -> Result<()>;

    /// Find the session holding an access token
    fn find_session_by_access_token(&self, token: &str) -> Result<Option<AuthSession>>;

    /// Find the session holding a refresh token
    fn find_session_by_refresh_token(&self, token: &str) -> Result<Option<AuthSession>>;

    /// Persist a rotated token pair
    fn update_session(&self, session: &AuthSession) -> Result<()>;

    /// Delete a session
    fn delete_session(&self, session_id: Uuid) -> Result<()>;

    /// Delete all sessions for a user
    fn delete_user_sessions(&self, user_id: Uuid) -> Result<()>;

    /// Clean up sessions past their refresh deadline
    fn cleanup_expired_sessions(&self) -> Result<u64>;
}

/// Artwork repository operations
pub trait ArtworkRepository {
    /// Register a new artwork
    fn create_artwork(&self, artwork: &Artwork) -> Result<()>;

    /// Find artwork by ID
    fn find_artwork_by_id(&self, id: Uuid) -> Result<Option<Artwork>>;

    /// List an artist's pieces
    fn list_artworks_by_artist(&self, artist_id: Uuid) -> Result<Vec<Artwork>>;

    /// Delete an artwork
    fn delete_artwork(&self, id: Uuid) -> Result<()>;
}

/// Exhibit repository operations
pub trait ExhibitRepository {
    /// Write a draft with its roster and bindings
    fn save_exhibit(&self, draft: &ExhibitDraft) -> Result<()>;

    /// Load a draft, rebuilding its slot plan
    fn load_exhibit(&self, id: Uuid) -> Result<Option<ExhibitDraft>>;

    /// Exhibits a user owns or collaborates on
    fn list_exhibits_for_user(&self, user_id: Uuid) -> Result<Vec<ExhibitSummary>>;

    /// Delete an exhibit
    fn delete_exhibit(&self, id: Uuid) -> Result<()>;
}

/// Invitation repository operations
pub trait InvitationRepository {
    /// Create a new invitation
    fn create_invitation(&self, invitation: &Invitation) -> Result<()>;

    /// Find invitation by its link token
    fn find_invitation_by_token(&self, token: &str) -> Result<Option<Invitation>>;

    /// Find the invitation for an exhibit and invitee
    fn find_invitation_for_invitee(
        &self,
        exhibit_id: Uuid,
        invitee_id: Uuid,
    ) -> Result<Option<Invitation>>;

    /// List invitations for an exhibit
    fn list_invitations_for_exhibit(&self, exhibit_id: Uuid) -> Result<Vec<Invitation>>;

    /// Record a status transition
    fn update_invitation_status(&self, invitation_id: Uuid, status: InvitationStatus)
        -> Result<()>;

    /// Expire stale pending invitations
    fn expire_stale_invitations(&self) -> Result<u64>;

    /// Delete an invitation
    fn delete_invitation(&self, invitation_id: Uuid) -> Result<()>;
}

/// Combined storage interface
///
/// Provides access to all repository operations.
/// Implementations may be backed by SQLite, mocks, or network.
pub trait Storage:
    UserRepository + ArtworkRepository + ExhibitRepository + InvitationRepository
{
}

// Blanket implementation: any type implementing all traits implements Storage
impl<T> Storage for T where
    T: UserRepository + ArtworkRepository + ExhibitRepository + InvitationRepository
{
}
