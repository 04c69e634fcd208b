//! User and session storage operations

use chrono::Utc;
use rusqlite::{params, Connection};
use tracing::instrument;
use uuid::Uuid;

use super::parse::{parse_datetime, parse_datetime_opt, parse_uuid, OptionalExt};
use crate::error::Result;
use crate::models::{AuthSession, User};

pub struct UserStore<'a> {
    conn: &'a Connection,
}

impl<'a> UserStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Create a new user
    #[instrument(skip(self, user), fields(username = %user.username))]
    pub fn create(&self, user: &User) -> Result<()> {
        self.conn.execute(
            "INSERT INTO users (id, username, password_hash, created_at, last_login) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                user.id.to_string(),
                user.username,
                user.password_hash,
                user.created_at.to_rfc3339(),
                user.last_login.map(|t| t.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    /// Find user by ID
    #[instrument(skip(self))]
    pub fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, username, password_hash, created_at, last_login FROM users WHERE id = ?1",
        )?;

        let user = stmt
            .query_row(params![id.to_string()], Self::user_from_row)
            .optional()?;

        Ok(user)
    }

    /// Find user by username
    #[instrument(skip(self))]
    pub fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, username, password_hash, created_at, last_login FROM users WHERE username = ?1",
        )?;

        let user = stmt
            .query_row(params![username], Self::user_from_row)
            .optional()?;

        Ok(user)
    }

    /// Update last login time
    pub fn update_last_login(&self, user_id: Uuid) -> Result<()> {
        self.conn.execute(
            "UPDATE users SET last_login = ?1 WHERE id = ?2",
            params![Utc::now().to_rfc3339(), user_id.to_string()],
        )?;
        Ok(())
    }

    /// Create an auth session
    #[instrument(skip(self, session), fields(user_id = %session.user_id))]
    pub fn create_session(&self, session: &AuthSession) -> Result<()> {
        self.conn.execute(
            "INSERT INTO auth_sessions
             (id, user_id, access_token, refresh_token, access_expires_at, refresh_expires_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                session.id.to_string(),
                session.user_id.to_string(),
                session.access_token,
                session.refresh_token,
                session.access_expires_at.to_rfc3339(),
                session.refresh_expires_at.to_rfc3339(),
                session.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Find the session a bearer token belongs to, expired or not.
    /// The caller decides what an expired access token means.
    #[instrument(skip(self, token))]
    pub fn find_session_by_access_token(&self, token: &str) -> Result<Option<AuthSession>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, access_token, refresh_token, access_expires_at, refresh_expires_at, created_at
             FROM auth_sessions WHERE access_token = ?1",
        )?;

        let session = stmt
            .query_row(params![token], Self::session_from_row)
            .optional()?;

        Ok(session)
    }

    /// Find the session a refresh token belongs to
    #[instrument(skip(self, token))]
    pub fn find_session_by_refresh_token(&self, token: &str) -> Result<Option<AuthSession>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, access_token, refresh_token, access_expires_at, refresh_expires_at, created_at
             FROM auth_sessions WHERE refresh_token = ?1",
        )?;

        let session = stmt
            .query_row(params![token], Self::session_from_row)
            .optional()?;

        Ok(session)
    }

    /// Persist a rotated token pair
    #[instrument(skip(self, session), fields(user_id = %session.user_id))]
    pub fn update_session(&self, session: &AuthSession) -> Result<()> {
        self.conn.execute(
            "UPDATE auth_sessions
             SET access_token = ?1, refresh_token = ?2, access_expires_at = ?3, refresh_expires_at = ?4
             WHERE id = ?5",
            params![
                session.access_token,
                session.refresh_token,
                session.access_expires_at.to_rfc3339(),
                session.refresh_expires_at.to_rfc3339(),
                session.id.to_string(),
            ],
        )?;
        Ok(())
    }

    /// Delete a session (logout)
    pub fn delete_session(&self, session_id: Uuid) -> Result<()> {
        self.conn.execute(
            "DELETE FROM auth_sessions WHERE id = ?1",
            params![session_id.to_string()],
        )?;
        Ok(())
    }

    /// Delete all sessions for a user
    pub fn delete_user_sessions(&self, user_id: Uuid) -> Result<()> {
        self.conn.execute(
            "DELETE FROM auth_sessions WHERE user_id = ?1",
            params![user_id.to_string()],
        )?;
        Ok(())
    }

    /// Remove sessions whose refresh token can no longer be used
    #[instrument(skip(self))]
    pub fn cleanup_expired_sessions(&self) -> Result<u64> {
        let deleted = self.conn.execute(
            "DELETE FROM auth_sessions WHERE refresh_expires_at < ?1",
            params![Utc::now().to_rfc3339()],
        )?;
        Ok(deleted as u64)
    }

    fn user_from_row(row: &rusqlite::Row<'_>) -> std::result::Result<User, rusqlite::Error> {
        Ok(User {
            id: parse_uuid(&row.get::<_, String>(0)?)?,
            username: row.get(1)?,
            password_hash: row.get(2)?,
            created_at: parse_datetime(&row.get::<_, String>(3)?)?,
            last_login: parse_datetime_opt(row.get::<_, Option<String>>(4)?)?,
        })
    }

    fn session_from_row(
        row: &rusqlite::Row<'_>,
    ) -> std::result::Result<AuthSession, rusqlite::Error> {
        Ok(AuthSession {
            id: parse_uuid(&row.get::<_, String>(0)?)?,
            user_id: parse_uuid(&row.get::<_, String>(1)?)?,
            access_token: row.get(2)?,
            refresh_token: row.get(3)?,
            access_expires_at: parse_datetime(&row.get::<_, String>(4)?)?,
            refresh_expires_at: parse_datetime(&row.get::<_, String>(5)?)?,
            created_at: parse_datetime(&row.get::<_, String>(6)?)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::Database;
    use crate::auth;
    use crate::models::{AuthSession, User};

    fn user(db: &Database, name: &str) -> User {
        let user = User::new(name.into(), "hash".into());
        db.users().create(&user).unwrap();
        user
    }

    #[test]
    fn test_create_and_find_user() {
        let db = Database::open_in_memory().unwrap();
        let created = user(&db, "ada");

        let found = db.users().find_by_username("ada").unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert!(db.users().find_by_username("noone").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_username_rejected() {
        let db = Database::open_in_memory().unwrap();
        user(&db, "ada");

        let dup = User::new("ada".into(), "hash".into());
        assert!(db.users().create(&dup).is_err());
    }

    #[test]
    fn test_session_lookup_by_both_tokens() {
        let db = Database::open_in_memory().unwrap();
        let owner = user(&db, "ada");

        let session = AuthSession::new(
            owner.id,
            auth::generate_token(),
            auth::generate_token(),
            15,
            24,
        );
        db.users().create_session(&session).unwrap();

        let by_access = db
            .users()
            .find_session_by_access_token(&session.access_token)
            .unwrap()
            .unwrap();
        assert_eq!(by_access.id, session.id);

        let by_refresh = db
            .users()
            .find_session_by_refresh_token(&session.refresh_token)
            .unwrap()
            .unwrap();
        assert_eq!(by_refresh.id, session.id);
    }

    #[test]
    fn test_rotation_persists() {
        let db = Database::open_in_memory().unwrap();
        let owner = user(&db, "ada");

        let mut session = AuthSession::new(
            owner.id,
            auth::generate_token(),
            auth::generate_token(),
            15,
            24,
        );
        db.users().create_session(&session).unwrap();

        let old_access = session.access_token.clone();
        session.rotate(auth::generate_token(), auth::generate_token(), 15, 24);
        db.users().update_session(&session).unwrap();

        assert!(db
            .users()
            .find_session_by_access_token(&old_access)
            .unwrap()
            .is_none());
        assert!(db
            .users()
            .find_session_by_access_token(&session.access_token)
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_cleanup_expired_sessions() {
        let db = Database::open_in_memory().unwrap();
        let owner = user(&db, "ada");

        let dead = AuthSession::new(owner.id, "a1".into(), "r1".into(), -10, -1);
        let live = AuthSession::new(owner.id, "a2".into(), "r2".into(), 15, 24);
        db.users().create_session(&dead).unwrap();
        db.users().create_session(&live).unwrap();

        assert_eq!(db.users().cleanup_expired_sessions().unwrap(), 1);
        assert!(db
            .users()
            .find_session_by_access_token("a2")
            .unwrap()
            .is_some());
    }
}
