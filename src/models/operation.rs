//! Task operations carried through the Scheduler.
//!
//! The tag is a closed Rust enum and every field's type is declared up
//! front; nothing is recovered by probing string fields to see if they
//! happen to parse as a UUID.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::message::Message;
use super::webhook::WebhookConfig;

/// Parameters carried by a `run` operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSendParams {
    pub task_id: Uuid,
    pub context_id: Uuid,
    pub messages: Vec<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook: Option<WebhookConfig>,
    #[serde(default)]
    pub long_running: bool,
}

/// A tagged, typed request flowing through the Scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "operation", content = "params", rename_all = "lowercase")]
pub enum TaskOperation {
    Run(TaskSendParams),
    Cancel { task_id: Uuid },
    Pause { task_id: Uuid },
    Resume { task_id: Uuid },
}

impl TaskOperation {
    pub fn task_id(&self) -> Uuid {
        match self {
            TaskOperation::Run(params) => params.task_id,
            TaskOperation::Cancel { task_id }
            | TaskOperation::Pause { task_id }
            | TaskOperation::Resume { task_id } => *task_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            TaskOperation::Run(_) => "run",
            TaskOperation::Cancel { .. } => "cancel",
            TaskOperation::Pause { .. } => "pause",
            TaskOperation::Resume { .. } => "resume",
        }
    }
}

/// Wire envelope pushed onto the Redis list transport.
///
/// `span_id`/`trace_id` are advisory only: the worker may use them to
/// reconstruct a remote span link but must not depend on the originating
/// span object surviving serialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueEnvelope {
    #[serde(flatten)]
    pub operation: TaskOperation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
}

impl QueueEnvelope {
    pub fn new(operation: TaskOperation) -> Self {
        Self {
            operation,
            span_id: None,
            trace_id: None,
        }
    }
}
