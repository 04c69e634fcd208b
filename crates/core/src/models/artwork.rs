//! Artwork model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A piece registered by an artist, placeable in exhibit slots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artwork {
    pub id: Uuid,
    pub artist_id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

impl Artwork {
    pub fn new(artist_id: Uuid, title: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            artist_id,
            title,
            created_at: Utc::now(),
        }
    }
}
