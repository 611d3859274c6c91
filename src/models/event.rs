//! Push events delivered to webhooks.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::artifact::Artifact;
use super::task::TaskState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusPayload {
    pub state: TaskState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum EventPayload {
    StatusUpdate { status: StatusPayload },
    ArtifactUpdate { artifact: Artifact },
}

/// One event dispatched to a task's effective webhook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushEvent {
    pub event_id: Uuid,
    pub sequence: u64,
    pub task_id: Uuid,
    pub context_id: Uuid,
    #[serde(rename = "final")]
    pub final_: bool,
    #[serde(flatten)]
    pub payload: EventPayload,
}

impl PushEvent {
    pub fn status(
        task_id: Uuid,
        context_id: Uuid,
        sequence: u64,
        state: TaskState,
        final_: bool,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            sequence,
            task_id,
            context_id,
            final_,
            payload: EventPayload::StatusUpdate {
                status: StatusPayload { state },
            },
        }
    }

    pub fn artifact(task_id: Uuid, context_id: Uuid, sequence: u64, artifact: Artifact) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            sequence,
            task_id,
            context_id,
            final_: false,
            payload: EventPayload::ArtifactUpdate { artifact },
        }
    }

    /// Render the authoritative wire body.
    pub fn to_wire_json(&self) -> serde_json::Value {
        serde_json::to_value(self).expect("PushEvent always serializes")
    }

    pub fn payload_kind(&self) -> &'static str {
        match self.payload {
            EventPayload::StatusUpdate { .. } => "status-update",
            EventPayload::ArtifactUpdate { .. } => "artifact-update",
        }
    }
}
