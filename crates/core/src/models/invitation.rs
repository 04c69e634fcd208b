//! Collaboration invitation model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default invitation lifetime
pub const INVITATION_TTL_DAYS: i64 = 7;

/// Lifecycle of an invitation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Declined,
    Expired,
}

impl InvitationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvitationStatus::Pending => "pending",
            InvitationStatus::Accepted => "accepted",
            InvitationStatus::Declined => "declined",
            InvitationStatus::Expired => "expired",
        }
    }
}

/// An owner's request for another user to join an exhibit roster
///
/// One invitation per (exhibit, invitee). Expiry is lazy: a pending
/// invitation past its deadline reads as expired without a write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invitation {
    pub id: Uuid,
    pub exhibit_id: Uuid,
    pub inviter_id: Uuid,
    pub invitee_id: Uuid,
    pub token: String,
    pub status: InvitationStatus,
    pub sent_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Invitation {
    pub fn new(exhibit_id: Uuid, inviter_id: Uuid, invitee_id: Uuid, token: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            exhibit_id,
            inviter_id,
            invitee_id,
            token,
            status: InvitationStatus::Pending,
            sent_at: now,
            expires_at: now + chrono::Duration::days(INVITATION_TTL_DAYS),
        }
    }

    pub fn with_expiry(mut self, days: i64) -> Self {
        self.expires_at = self.sent_at + chrono::Duration::days(days);
        self
    }

    /// Stored status adjusted for the deadline
    pub fn effective_status(&self) -> InvitationStatus {
        if self.status == InvitationStatus::Pending && Utc::now() > self.expires_at {
            InvitationStatus::Expired
        } else {
            self.status
        }
    }

    /// Can this invitation still be accepted or declined?
    pub fn is_open(&self) -> bool {
        self.effective_status() == InvitationStatus::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invitation() -> Invitation {
        Invitation::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            "token".into(),
        )
    }

    #[test]
    fn test_fresh_invitation_is_open() {
        let inv = invitation();
        assert!(inv.is_open());
        assert_eq!(inv.effective_status(), InvitationStatus::Pending);
    }

    #[test]
    fn test_past_deadline_reads_expired() {
        let inv = invitation().with_expiry(-1);
        assert!(!inv.is_open());
        assert_eq!(inv.effective_status(), InvitationStatus::Expired);
    }

    #[test]
    fn test_declined_stays_declined_after_deadline() {
        let mut inv = invitation().with_expiry(-1);
        inv.status = InvitationStatus::Declined;
        assert_eq!(inv.effective_status(), InvitationStatus::Declined);
    }
}
