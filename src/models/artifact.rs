//! Immutable task artifacts.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::message::Part;

/// An immutable output emitted during task execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    pub artifact_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub parts: Vec<Part>,
}

impl Artifact {
    pub fn new(name: Option<String>, parts: Vec<Part>) -> Self {
        Self {
            artifact_id: Uuid::new_v4(),
            name,
            parts,
        }
    }
}
