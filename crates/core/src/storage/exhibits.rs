//! Exhibit storage operations
//!
//! Exhibits persist as a header row plus join-ordered collaborator
//! rows and slot binding rows. The slot plan is never written: it is
//! a deterministic function of (environment, roster) and is rebuilt
//! on load, which keeps stored bindings valid.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use tracing::instrument;
use uuid::Uuid;

use super::parse::{
    kind_from_str, parse_datetime, parse_datetime_opt, parse_uuid, parse_uuid_opt, status_from_str,
    OptionalExt,
};
use crate::allocation::{allocate_slots, SlotPlan};
use crate::draft::ExhibitDraft;
use crate::error::{Error, Result};
use crate::invariants;
use crate::models::{
    Environment, ExhibitKind, ExhibitStatus, ExhibitSummary, Participant, ParticipantRoster,
};

pub struct ExhibitStore<'a> {
    conn: &'a Connection,
}

struct ExhibitRow {
    title: String,
    description: Option<String>,
    tags_json: String,
    kind: ExhibitKind,
    status: ExhibitStatus,
    owner_id: Uuid,
    owner_name: String,
    environment_id: Option<Uuid>,
    starts_at: Option<DateTime<Utc>>,
    ends_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'a> ExhibitStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Write a draft, replacing collaborator and binding rows
    #[instrument(skip(self, draft), fields(exhibit_id = %draft.id))]
    pub fn save(&self, draft: &ExhibitDraft) -> Result<()> {
        let tags_json = serde_json::to_string(&draft.tags)?;
        let tx = self.conn.unchecked_transaction()?;

        tx.execute(
            "INSERT INTO exhibits
             (id, title, description, tags, kind, status, owner_id, environment_id, starts_at, ends_at, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
             ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                tags = excluded.tags,
                kind = excluded.kind,
                status = excluded.status,
                environment_id = excluded.environment_id,
                starts_at = excluded.starts_at,
                ends_at = excluded.ends_at,
                updated_at = excluded.updated_at",
            params![
                draft.id.to_string(),
                draft.title,
                draft.description,
                tags_json,
                draft.kind.as_str(),
                draft.status.as_str(),
                draft.roster().owner().id.to_string(),
                draft.environment().map(|e| e.id.to_string()),
                draft.starts_at.map(|t| t.to_rfc3339()),
                draft.ends_at.map(|t| t.to_rfc3339()),
                draft.created_at.to_rfc3339(),
                draft.updated_at.to_rfc3339(),
            ],
        )?;

        tx.execute(
            "DELETE FROM exhibit_collaborators WHERE exhibit_id = ?1",
            params![draft.id.to_string()],
        )?;
        for (position, collab) in draft.roster().collaborators().iter().enumerate() {
            tx.execute(
                "INSERT INTO exhibit_collaborators (exhibit_id, user_id, position, joined_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    draft.id.to_string(),
                    collab.id.to_string(),
                    position as u32,
                    Utc::now().to_rfc3339(),
                ],
            )?;
        }

        tx.execute(
            "DELETE FROM slot_bindings WHERE exhibit_id = ?1",
            params![draft.id.to_string()],
        )?;
        for (&slot, &artwork) in draft.bindings() {
            tx.execute(
                "INSERT INTO slot_bindings (exhibit_id, slot, artwork_id) VALUES (?1, ?2, ?3)",
                params![draft.id.to_string(), slot, artwork.to_string()],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    /// Load a draft, rebuilding roster, plan and bindings
    #[instrument(skip(self))]
    pub fn load(&self, id: Uuid) -> Result<Option<ExhibitDraft>> {
        let mut stmt = self.conn.prepare(
            "SELECT e.title, e.description, e.tags, e.kind, e.status, e.owner_id, u.username,
                    e.environment_id, e.starts_at, e.ends_at, e.created_at, e.updated_at
             FROM exhibits e
             INNER JOIN users u ON u.id = e.owner_id
             WHERE e.id = ?1",
        )?;

        let row = stmt
            .query_row(params![id.to_string()], |row| {
                Ok(ExhibitRow {
                    title: row.get(0)?,
                    description: row.get(1)?,
                    tags_json: row.get(2)?,
                    kind: kind_from_str(&row.get::<_, String>(3)?),
                    status: status_from_str(&row.get::<_, String>(4)?),
                    owner_id: parse_uuid(&row.get::<_, String>(5)?)?,
                    owner_name: row.get(6)?,
                    environment_id: parse_uuid_opt(row.get::<_, Option<String>>(7)?)?,
                    starts_at: parse_datetime_opt(row.get::<_, Option<String>>(8)?)?,
                    ends_at: parse_datetime_opt(row.get::<_, Option<String>>(9)?)?,
                    created_at: parse_datetime(&row.get::<_, String>(10)?)?,
                    updated_at: parse_datetime(&row.get::<_, String>(11)?)?,
                })
            })
            .optional()?;

        let Some(row) = row else {
            return Ok(None);
        };

        let tags: Vec<String> = serde_json::from_str(&row.tags_json)?;

        let environment = match row.environment_id {
            Some(eid) => Some(Environment::by_id(eid).ok_or_else(|| {
                Error::NotFound(format!("Environment {} is not in the catalog", eid))
            })?),
            None => None,
        };

        let mut roster = ParticipantRoster::solo(Participant {
            id: row.owner_id,
            display_name: row.owner_name,
        });
        for participant in self.collaborators_of(id)? {
            roster.add_collaborator(participant)?;
        }

        let plan = match &environment {
            Some(env) => allocate_slots(env.slot_count, &roster.ids()),
            None => SlotPlan::empty(),
        };

        let mut bindings = BTreeMap::new();
        let mut stmt = self.conn.prepare(
            "SELECT slot, artwork_id FROM slot_bindings WHERE exhibit_id = ?1 ORDER BY slot",
        )?;
        let rows = stmt.query_map(params![id.to_string()], |row| {
            Ok((row.get::<_, u32>(0)?, parse_uuid(&row.get::<_, String>(1)?)?))
        })?;
        for entry in rows {
            let (slot, artwork) = entry?;
            bindings.insert(slot, artwork);
        }

        let draft = ExhibitDraft {
            id,
            title: row.title,
            description: row.description,
            tags,
            kind: row.kind,
            starts_at: row.starts_at,
            ends_at: row.ends_at,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
            environment,
            roster,
            plan,
            bindings,
        };
        invariants::assert_draft_invariants(&draft);

        Ok(Some(draft))
    }

    /// Exhibits a user owns or collaborates on, newest first
    pub fn list_for_user(&self, user_id: Uuid) -> Result<Vec<ExhibitSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT e.id, e.title, e.kind, e.status, e.owner_id, e.environment_id, e.updated_at
             FROM exhibits e
             WHERE e.owner_id = ?1
                OR e.id IN (SELECT exhibit_id FROM exhibit_collaborators WHERE user_id = ?1)
             ORDER BY e.updated_at DESC",
        )?;

        let summaries = stmt
            .query_map(params![user_id.to_string()], |row| {
                let environment_id = parse_uuid_opt(row.get::<_, Option<String>>(5)?)?;
                Ok(ExhibitSummary {
                    id: parse_uuid(&row.get::<_, String>(0)?)?,
                    title: row.get(1)?,
                    kind: kind_from_str(&row.get::<_, String>(2)?),
                    status: status_from_str(&row.get::<_, String>(3)?),
                    owner_id: parse_uuid(&row.get::<_, String>(4)?)?,
                    environment_name: environment_id
                        .and_then(Environment::by_id)
                        .map(|e| e.name),
                    updated_at: parse_datetime(&row.get::<_, String>(6)?)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(summaries)
    }

    /// Delete an exhibit; collaborators and bindings cascade
    pub fn delete(&self, id: Uuid) -> Result<()> {
        self.conn.execute(
            "DELETE FROM exhibits WHERE id = ?1",
            params![id.to_string()],
        )?;
        Ok(())
    }

    fn collaborators_of(&self, exhibit_id: Uuid) -> Result<Vec<Participant>> {
        let mut stmt = self.conn.prepare(
            "SELECT c.user_id, u.username
             FROM exhibit_collaborators c
             INNER JOIN users u ON u.id = c.user_id
             WHERE c.exhibit_id = ?1
             ORDER BY c.position",
        )?;

        let participants = stmt
            .query_map(params![exhibit_id.to_string()], |row| {
                Ok(Participant {
                    id: parse_uuid(&row.get::<_, String>(0)?)?,
                    display_name: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(participants)
    }
}
