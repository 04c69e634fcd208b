//! Invitation storage operations

use chrono::Utc;
use rusqlite::{params, Connection};
use tracing::instrument;
use uuid::Uuid;

use super::parse::{invitation_status_from_str, parse_datetime, parse_uuid, OptionalExt};
use crate::error::Result;
use crate::models::{Invitation, InvitationStatus};

pub struct InvitationStore<'a> {
    conn: &'a Connection,
}

impl<'a> InvitationStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Create a new invitation
    #[instrument(skip(self, invitation), fields(exhibit_id = %invitation.exhibit_id, invitee_id = %invitation.invitee_id))]
    pub fn create(&self, invitation: &Invitation) -> Result<()> {
        self.conn.execute(
            "INSERT INTO invitations
             (id, exhibit_id, inviter_id, invitee_id, token, status, sent_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                invitation.id.to_string(),
                invitation.exhibit_id.to_string(),
                invitation.inviter_id.to_string(),
                invitation.invitee_id.to_string(),
                invitation.token,
                invitation.status.as_str(),
                invitation.sent_at.to_rfc3339(),
                invitation.expires_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Find invitation by its link token
    pub fn find_by_token(&self, token: &str) -> Result<Option<Invitation>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, exhibit_id, inviter_id, invitee_id, token, status, sent_at, expires_at
             FROM invitations WHERE token = ?1",
        )?;

        let invitation = stmt
            .query_row(params![token], Self::from_row)
            .optional()?;

        Ok(invitation)
    }

    /// Find the invitation for a given exhibit and invitee, if any
    pub fn find_for_invitee(
        &self,
        exhibit_id: Uuid,
        invitee_id: Uuid,
    ) -> Result<Option<Invitation>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, exhibit_id, inviter_id, invitee_id, token, status, sent_at, expires_at
             FROM invitations WHERE exhibit_id = ?1 AND invitee_id = ?2",
        )?;

        let invitation = stmt
            .query_row(
                params![exhibit_id.to_string(), invitee_id.to_string()],
                Self::from_row,
            )
            .optional()?;

        Ok(invitation)
    }

    /// List invitations for an exhibit, newest first
    pub fn list_for_exhibit(&self, exhibit_id: Uuid) -> Result<Vec<Invitation>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, exhibit_id, inviter_id, invitee_id, token, status, sent_at, expires_at
             FROM invitations WHERE exhibit_id = ?1 ORDER BY sent_at DESC",
        )?;

        let invitations = stmt
            .query_map(params![exhibit_id.to_string()], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(invitations)
    }

    /// Record a status transition
    #[instrument(skip(self))]
    pub fn update_status(&self, invitation_id: Uuid, status: InvitationStatus) -> Result<()> {
        self.conn.execute(
            "UPDATE invitations SET status = ?1 WHERE id = ?2",
            params![status.as_str(), invitation_id.to_string()],
        )?;
        Ok(())
    }

    /// Mark pending invitations past their deadline as expired
    #[instrument(skip(self))]
    pub fn expire_stale(&self) -> Result<u64> {
        let changed = self.conn.execute(
            "UPDATE invitations SET status = 'expired'
             WHERE status = 'pending' AND expires_at < ?1",
            params![Utc::now().to_rfc3339()],
        )?;
        Ok(changed as u64)
    }

    /// Delete an invitation
    pub fn delete(&self, invitation_id: Uuid) -> Result<()> {
        self.conn.execute(
            "DELETE FROM invitations WHERE id = ?1",
            params![invitation_id.to_string()],
        )?;
        Ok(())
    }

    fn from_row(row: &rusqlite::Row<'_>) -> std::result::Result<Invitation, rusqlite::Error> {
        Ok(Invitation {
            id: parse_uuid(&row.get::<_, String>(0)?)?,
            exhibit_id: parse_uuid(&row.get::<_, String>(1)?)?,
            inviter_id: parse_uuid(&row.get::<_, String>(2)?)?,
            invitee_id: parse_uuid(&row.get::<_, String>(3)?)?,
            token: row.get(4)?,
            status: invitation_status_from_str(&row.get::<_, String>(5)?),
            sent_at: parse_datetime(&row.get::<_, String>(6)?)?,
            expires_at: parse_datetime(&row.get::<_, String>(7)?)?,
        })
    }
}
