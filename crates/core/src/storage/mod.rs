//! SQLite storage layer for Salon

mod artworks;
mod exhibits;
mod invitations;
mod migrations;
mod parse;
mod traits;
mod users;

use std::path::Path;

use rusqlite::Connection;
use tracing::instrument;
use uuid::Uuid;

use crate::draft::ExhibitDraft;
use crate::error::Result;
use crate::models::{Artwork, AuthSession, ExhibitSummary, Invitation, InvitationStatus, User};

pub use artworks::ArtworkStore;
pub use exhibits::ExhibitStore;
pub use invitations::InvitationStore;
pub use traits::{
    ArtworkRepository, ExhibitRepository, InvitationRepository, Storage, UserRepository,
};
pub use users::UserStore;

/// Main database handle
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database at the given path
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON")?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Open in-memory database (for testing)
    #[instrument]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON")?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initialize database schema via migrations
    fn init(&self) -> Result<()> {
        migrations::run_migrations(&self.conn)?;
        Ok(())
    }

    /// Get current schema version
    pub fn schema_version(&self) -> u32 {
        self.conn
            .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap_or(0)
    }

    /// Get user store
    pub fn users(&self) -> UserStore<'_> {
        UserStore::new(&self.conn)
    }

    /// Get artwork store
    pub fn artworks(&self) -> ArtworkStore<'_> {
        ArtworkStore::new(&self.conn)
    }

    /// Get exhibit store
    pub fn exhibits(&self) -> ExhibitStore<'_> {
        ExhibitStore::new(&self.conn)
    }

    /// Get invitation store
    pub fn invitations(&self) -> InvitationStore<'_> {
        InvitationStore::new(&self.conn)
    }
}

// Implement repository traits for Database
// This enables using Database through the trait interface

impl UserRepository for Database {
    fn create_user(&self, user: &User) -> Result<()> {
        self.users().create(user)
    }

    fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        self.users().find_by_id(id)
    }

    fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.users().find_by_username(username)
    }

    fn update_last_login(&self, user_id: Uuid) -> Result<()> {
        self.users().update_last_login(user_id)
    }

    fn create_session(&self, session: &AuthSession) -> Result<()> {
        self.users().create_session(session)
    }

    fn find_session_by_access_token(&self, token: &str) -> Result<Option<AuthSession>> {
        self.users().find_session_by_access_token(token)
    }

    fn find_session_by_refresh_token(&self, token: &str) -> Result<Option<AuthSession>> {
        self.users().find_session_by_refresh_token(token)
    }

    fn update_session(&self, session: &AuthSession) -> Result<()> {
        self.users().update_session(session)
    }

    fn delete_session(&self, session_id: Uuid) -> Result<()> {
        self.users().delete_session(session_id)
    }

    fn delete_user_sessions(&self, user_id: Uuid) -> Result<()> {
        self.users().delete_user_sessions(user_id)
    }

    fn cleanup_expired_sessions(&self) -> Result<u64> {
        self.users().cleanup_expired_sessions()
    }
}

impl ArtworkRepository for Database {
    fn create_artwork(&self, artwork: &Artwork) -> Result<()> {
        self.artworks().create(artwork)
    }

    fn find_artwork_by_id(&self, id: Uuid) -> Result<Option<Artwork>> {
        self.artworks().find_by_id(id)
    }

    fn list_artworks_by_artist(&self, artist_id: Uuid) -> Result<Vec<Artwork>> {
        self.artworks().list_by_artist(artist_id)
    }

    fn delete_artwork(&self, id: Uuid) -> Result<()> {
        self.artworks().delete(id)
    }
}

impl ExhibitRepository for Database {
    fn save_exhibit(&self, draft: &ExhibitDraft) -> Result<()> {
        self.exhibits().save(draft)
    }

    fn load_exhibit(&self, id: Uuid) -> Result<Option<ExhibitDraft>> {
        self.exhibits().load(id)
    }

    fn list_exhibits_for_user(&self, user_id: Uuid) -> Result<Vec<ExhibitSummary>> {
        self.exhibits().list_for_user(user_id)
    }

    fn delete_exhibit(&self, id: Uuid) -> Result<()> {
        self.exhibits().delete(id)
    }
}

impl InvitationRepository for Database {
    fn create_invitation(&self, invitation: &Invitation) -> Result<()> {
        self.invitations().create(invitation)
    }

    fn find_invitation_by_token(&self, token: &str) -> Result<Option<Invitation>> {
        self.invitations().find_by_token(token)
    }

    fn find_invitation_for_invitee(
        &self,
        exhibit_id: Uuid,
        invitee_id: Uuid,
    ) -> Result<Option<Invitation>> {
        self.invitations().find_for_invitee(exhibit_id, invitee_id)
    }

    fn list_invitations_for_exhibit(&self, exhibit_id: Uuid) -> Result<Vec<Invitation>> {
        self.invitations().list_for_exhibit(exhibit_id)
    }

    fn update_invitation_status(
        &self,
        invitation_id: Uuid,
        status: InvitationStatus,
    ) -> Result<()> {
        self.invitations().update_status(invitation_id, status)
    }

    fn expire_stale_invitations(&self) -> Result<u64> {
        self.invitations().expire_stale()
    }

    fn delete_invitation(&self, invitation_id: Uuid) -> Result<()> {
        self.invitations().delete(invitation_id)
    }
}
