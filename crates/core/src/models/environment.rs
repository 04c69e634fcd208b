//! Gallery environment catalog

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A virtual gallery layout with a fixed number of display slots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    pub id: Uuid,
    pub name: String,
    pub slot_count: u32,
}

impl Environment {
    /// The built-in layouts. Ids are stable so stored drafts can
    /// reference catalog entries across runs.
    pub fn catalog() -> Vec<Environment> {
        vec![
            Environment {
                id: Uuid::from_u128(1),
                name: "Atrium".to_string(),
                slot_count: 4,
            },
            Environment {
                id: Uuid::from_u128(2),
                name: "Long Gallery".to_string(),
                slot_count: 6,
            },
            Environment {
                id: Uuid::from_u128(3),
                name: "Grand Salon".to_string(),
                slot_count: 9,
            },
        ]
    }

    pub fn by_id(id: Uuid) -> Option<Environment> {
        Self::catalog().into_iter().find(|e| e.id == id)
    }
}
