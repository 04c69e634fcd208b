//! User account and session models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered user account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    pub fn new(username: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            username,
            password_hash,
            created_at: Utc::now(),
            last_login: None,
        }
    }
}

/// An authenticated session holding a rotating token pair
///
/// Created at login, destroyed at logout or when a refresh fails.
/// The access token is short-lived; a refresh rotates both tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub access_token: String,
    pub refresh_token: String,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl AuthSession {
    pub fn new(
        user_id: Uuid,
        access_token: String,
        refresh_token: String,
        access_ttl_minutes: i64,
        refresh_ttl_hours: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            access_token,
            refresh_token,
            access_expires_at: now + chrono::Duration::minutes(access_ttl_minutes),
            refresh_expires_at: now + chrono::Duration::hours(refresh_ttl_hours),
            created_at: now,
        }
    }

    pub fn access_is_valid(&self) -> bool {
        Utc::now() < self.access_expires_at
    }

    pub fn refresh_is_valid(&self) -> bool {
        Utc::now() < self.refresh_expires_at
    }

    /// Replace both tokens and restart their lifetimes
    pub fn rotate(
        &mut self,
        access_token: String,
        refresh_token: String,
        access_ttl_minutes: i64,
        refresh_ttl_hours: i64,
    ) {
        let now = Utc::now();
        self.access_token = access_token;
        self.refresh_token = refresh_token;
        self.access_expires_at = now + chrono::Duration::minutes(access_ttl_minutes);
        self.refresh_expires_at = now + chrono::Duration::hours(refresh_ttl_hours);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_valid() {
        let session = AuthSession::new(Uuid::new_v4(), "a".into(), "r".into(), 15, 24);
        assert!(session.access_is_valid());
        assert!(session.refresh_is_valid());
    }

    #[test]
    fn test_expired_access_token() {
        let session = AuthSession::new(Uuid::new_v4(), "a".into(), "r".into(), -1, 24);
        assert!(!session.access_is_valid());
        assert!(session.refresh_is_valid());
    }

    #[test]
    fn test_rotate_replaces_tokens() {
        let mut session = AuthSession::new(Uuid::new_v4(), "a".into(), "r".into(), -1, 24);
        session.rotate("a2".into(), "r2".into(), 15, 24);
        assert_eq!(session.access_token, "a2");
        assert_eq!(session.refresh_token, "r2");
        assert!(session.access_is_valid());
    }
}
