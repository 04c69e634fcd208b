//! Shared exhibit vocabulary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Whether an exhibit is curated alone or with collaborators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExhibitKind {
    Solo,
    Collaborative,
}

impl ExhibitKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExhibitKind::Solo => "solo",
            ExhibitKind::Collaborative => "collaborative",
        }
    }
}

/// Publication state of an exhibit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExhibitStatus {
    Draft,
    Published,
}

impl ExhibitStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExhibitStatus::Draft => "draft",
            ExhibitStatus::Published => "published",
        }
    }
}

/// Listing line for an exhibit, without roster or bindings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExhibitSummary {
    pub id: Uuid,
    pub title: String,
    pub kind: ExhibitKind,
    pub status: ExhibitStatus,
    pub owner_id: Uuid,
    pub environment_name: Option<String>,
    pub updated_at: DateTime<Utc>,
}
